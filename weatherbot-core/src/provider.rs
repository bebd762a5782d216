use crate::{
    Config,
    model::{CurrentWeather, ForecastDay, LocationRef},
    provider::{accuweather::AccuWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};
use thiserror::Error;

pub mod accuweather;
pub mod weatherapi;

/// Classified upstream failure. Every fault a provider can hit — bad status,
/// refused connection, malformed body — maps into exactly one variant; raw
/// reqwest/serde errors never cross this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("city could not be resolved")]
    NotFound,
    #[error("upstream request quota exhausted")]
    RateLimited,
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    AccuWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::AccuWeather => "accuweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::AccuWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "accuweather" => Ok(ProviderId::AccuWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: accuweather, weatherapi."
            )),
        }
    }
}

/// Capability interface over the two upstream API shapes.
///
/// AccuWeather resolves a city to a location key once and reuses it;
/// WeatherAPI looks everything up by name on every call. Callers stay
/// ignorant of which shape is configured: they pass the cached key when they
/// have one and `None` otherwise.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Validate a city and, for two-step providers, return its location
    /// reference. `Ok(None)` means the provider resolves by name on every
    /// call and nothing needs caching. A provider that caches references
    /// reports quota exhaustion as `Ok(Some(LocationRef::RateLimited))` so
    /// the sentinel lands in the subscriber record.
    async fn resolve_location(&self, city: &str) -> Result<Option<LocationRef>, WeatherError>;

    async fn current_weather(
        &self,
        city: &str,
        location_key: Option<&str>,
    ) -> Result<CurrentWeather, WeatherError>;

    /// Fetch up to `days` daily forecast entries, in upstream order.
    async fn forecast(
        &self,
        city: &str,
        location_key: Option<&str>,
        days: u8,
    ) -> Result<Vec<ForecastDay>, WeatherError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weatherbot configure {id}` and enter your API key."
        )
    })?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::AccuWeather => Box::new(AccuWeatherProvider::new(api_key.to_owned())),
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(api_key.to_owned())),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::AccuWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let err = default_provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `weatherbot configure"));
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::AccuWeather, "KEY".to_string());

        let provider = default_provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
