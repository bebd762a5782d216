use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    icons,
    model::{CurrentWeather, ForecastDay, LocationRef},
};

use super::{WeatherError, WeatherProvider};

const BASE_URL: &str = "http://api.weatherapi.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Name-based provider: every request carries the free-text city, so no
/// location reference is cached and quota exhaustion is detected per request
/// rather than being flagged on the subscriber record.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    fn with_base_url(api_key: String, base_url: String) -> Self {
        // Same panic contract as `Client::new`, but the timeout stays in place.
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("HTTP client construction failed");
        Self { api_key, base_url, http }
    }

    async fn fetch_current(&self, city: &str) -> Result<WaCurrentResponse, WeatherError> {
        let url = format!("{}/current.json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("lang", "ru")])
            .send()
            .await
            .map_err(|_| WeatherError::NotFound)?;

        let status = res.status();
        let body = res.text().await.map_err(|_| WeatherError::NotFound)?;

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(WeatherError::RateLimited);
        }
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|_| WeatherError::Upstream("malformed current.json payload".to_string()))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn resolve_location(&self, city: &str) -> Result<Option<LocationRef>, WeatherError> {
        // No reference to cache; a probe request validates the city name.
        // Anything except quota exhaustion counts as an unresolvable city.
        match self.fetch_current(city).await {
            Ok(_) => Ok(None),
            Err(WeatherError::RateLimited) => Err(WeatherError::RateLimited),
            Err(_) => Err(WeatherError::NotFound),
        }
    }

    async fn current_weather(
        &self,
        city: &str,
        _location_key: Option<&str>,
    ) -> Result<CurrentWeather, WeatherError> {
        let parsed = self.fetch_current(city).await?;
        let is_day = parsed.current.is_day.map(|flag| flag == 1);

        Ok(CurrentWeather {
            temperature_c: parsed.current.temp_c,
            condition: parsed.current.condition.text,
            icon: icons::weatherapi(parsed.current.condition.code, is_day),
            is_day,
        })
    }

    async fn forecast(
        &self,
        city: &str,
        _location_key: Option<&str>,
        days: u8,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        let url = format!("{}/forecast.json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", city),
                ("days", &days.to_string()),
                ("lang", "ru"),
            ])
            .send()
            .await
            .map_err(|_| WeatherError::NotFound)?;

        let status = res.status();
        let body = res.text().await.map_err(|_| WeatherError::NotFound)?;

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(WeatherError::RateLimited);
        }
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: WaForecastResponse = serde_json::from_str(&body)
            .map_err(|_| WeatherError::Upstream("malformed forecast.json payload".to_string()))?;

        let out: Vec<ForecastDay> = parsed
            .forecast
            .forecastday
            .into_iter()
            .take(days as usize)
            .map(|entry| ForecastDay {
                date: entry.date,
                temp_min_c: entry.day.mintemp_c,
                temp_max_c: entry.day.maxtemp_c,
                icon: icons::weatherapi(entry.day.condition.code, None),
                condition: entry.day.condition.text,
            })
            .collect();

        if out.is_empty() {
            return Err(WeatherError::NotFound);
        }
        Ok(out)
    }
}

/// WeatherAPI reports failures as `{"error": {"code", "message"}}`.
fn classify_failure(status: StatusCode, body: &str) -> WeatherError {
    if status.is_client_error() {
        if let Ok(err) = serde_json::from_str::<WaErrorResponse>(body) {
            return WeatherError::Upstream(err.error.message);
        }
    }
    WeatherError::NotFound
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: u16,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    is_day: Option<u8>,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    mintemp_c: f64,
    maxtemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaErrorBody,
}
