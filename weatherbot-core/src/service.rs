//! Error degradation boundary between the provider client and everything
//! that talks to subscribers. Callers of this module always get displayable
//! text, never a raw fault.

use crate::{
    Config, format,
    model::Subscriber,
    provider::{WeatherError, WeatherProvider, default_provider_from_config},
};

/// Outcome of a "set city" action.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// City accepted; the record (including a possible rate-limit sentinel)
    /// is ready to be stored.
    Saved(Subscriber),
    /// City unresolvable; nothing to store.
    NotFound,
    /// Quota hit on a provider with nothing to cache; nothing to store.
    RateLimited,
}

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(default_provider_from_config(config)?))
    }

    /// Resolve a free-text city into a storable record.
    ///
    /// A quota hit during reference resolution still yields `Saved`: the
    /// sentinel goes into the record and stays until the subscriber
    /// re-registers, exactly like the legacy data files.
    pub async fn register_city(&self, city: &str) -> Registration {
        match self.provider.resolve_location(city).await {
            Ok(location) => Registration::Saved(Subscriber::new(city, location)),
            Err(WeatherError::RateLimited) => Registration::RateLimited,
            Err(_) => Registration::NotFound,
        }
    }

    /// Current conditions for one subscriber, as displayable text.
    ///
    /// A record flagged with the rate-limit sentinel short-circuits to the
    /// fixed message without touching the provider.
    pub async fn current_text(&self, subscriber: &Subscriber) -> String {
        if subscriber.is_rate_limited() {
            return format::RATE_LIMIT_TEXT.to_string();
        }

        match self
            .provider
            .current_weather(&subscriber.city_name, subscriber.location_key())
            .await
        {
            Ok(weather) => format::current_message(&subscriber.city_name, &weather),
            Err(err) => format::current_error_text(&err),
        }
    }

    /// Multi-day forecast for one subscriber, as displayable text. Same
    /// short-circuit policy as [`current_text`](Self::current_text).
    pub async fn forecast_text(&self, subscriber: &Subscriber, days: u8) -> String {
        if subscriber.is_rate_limited() {
            return format::RATE_LIMIT_TEXT.to_string();
        }

        match self
            .provider
            .forecast(&subscriber.city_name, subscriber.location_key(), days)
            .await
        {
            Ok(entries) => format::forecast_message(&subscriber.city_name, &entries),
            Err(err) => format::forecast_error_text(&err),
        }
    }
}
