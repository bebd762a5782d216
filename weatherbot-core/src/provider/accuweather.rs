use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    icons,
    model::{CurrentWeather, ForecastDay, LocationRef},
};

use super::{WeatherError, WeatherProvider};

const BASE_URL: &str = "http://dataservice.accuweather.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reference-based provider: a city is resolved to a location key once and
/// the key is reused for every subsequent conditions/forecast request.
#[derive(Debug, Clone)]
pub struct AccuWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AccuWeatherProvider {
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
}

#[async_trait]
impl WeatherProvider for AccuWeatherProvider {
    async fn resolve_location(&self, city: &str) -> Result<Option<LocationRef>, WeatherError> {
        let url = format!("{}/locations/v1/cities/search", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("q", city), ("language", "ru")])
            .send()
            .await
            .map_err(|_| WeatherError::NotFound)?;

        // Quota exhaustion during resolution is cached on the subscriber
        // record, not reported as an error.
        if res.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(Some(LocationRef::RateLimited));
        }
        if !res.status().is_success() {
            return Err(WeatherError::NotFound);
        }

        let matches: Vec<AwLocation> = res.json().await.map_err(|_| WeatherError::NotFound)?;
        match matches.into_iter().next() {
            Some(found) => Ok(Some(LocationRef::Key(found.key))),
            None => Err(WeatherError::NotFound),
        }
    }

    async fn current_weather(
        &self,
        _city: &str,
        location_key: Option<&str>,
    ) -> Result<CurrentWeather, WeatherError> {
        let key = location_key.ok_or(WeatherError::NotFound)?;
        let url = format!("{}/currentconditions/v1/{key}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("language", "ru"), ("details", "false")])
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

        let observations: Vec<AwCurrent> = serde_json::from_str(&body)
            .map_err(|_| WeatherError::Upstream("malformed currentconditions payload".to_string()))?;
        let obs = observations.into_iter().next().ok_or(WeatherError::NotFound)?;

        Ok(CurrentWeather {
            temperature_c: obs.temperature.metric.value,
            condition: obs.weather_text,
            icon: icons::accuweather(obs.weather_icon),
            is_day: None,
        })
    }

    async fn forecast(
        &self,
        _city: &str,
        location_key: Option<&str>,
        days: u8,
    ) -> Result<Vec<ForecastDay>, WeatherError> {
        let key = location_key.ok_or(WeatherError::NotFound)?;
        let url = format!("{}/forecasts/v1/daily/{days}day/{key}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("language", "ru"),
                ("details", "false"),
                ("metric", "true"),
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

        let parsed: AwForecastResponse = serde_json::from_str(&body)
            .map_err(|_| WeatherError::Upstream("malformed forecast payload".to_string()))?;

        let mut out = Vec::new();
        for item in parsed.daily_forecasts.into_iter().take(days as usize) {
            let date = DateTime::parse_from_rfc3339(&item.date)
                .map_err(|_| WeatherError::Upstream("malformed forecast date".to_string()))?
                .date_naive();

            out.push(ForecastDay {
                date,
                temp_min_c: item.temperature.minimum.value,
                temp_max_c: item.temperature.maximum.value,
                condition: item.day.icon_phrase,
                icon: icons::accuweather(item.day.icon),
            });
        }

        if out.is_empty() {
            return Err(WeatherError::NotFound);
        }
        Ok(out)
    }
}

/// 4xx responses carry a `Message` field worth surfacing; everything else
/// degrades to the generic "check the city name" outcome.
fn classify_failure(status: StatusCode, body: &str) -> WeatherError {
    if status.is_client_error() {
        if let Ok(err) = serde_json::from_str::<AwErrorBody>(body) {
            return WeatherError::Upstream(err.message);
        }
    }
    WeatherError::NotFound
}

#[derive(Debug, Deserialize)]
struct AwLocation {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
struct AwValue {
    #[serde(rename = "Value")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct AwMetric {
    #[serde(rename = "Metric")]
    metric: AwValue,
}

#[derive(Debug, Deserialize)]
struct AwCurrent {
    #[serde(rename = "Temperature")]
    temperature: AwMetric,
    #[serde(rename = "WeatherText")]
    weather_text: String,
    #[serde(rename = "WeatherIcon")]
    weather_icon: u16,
}

#[derive(Debug, Deserialize)]
struct AwMinMax {
    #[serde(rename = "Minimum")]
    minimum: AwValue,
    #[serde(rename = "Maximum")]
    maximum: AwValue,
}

#[derive(Debug, Deserialize)]
struct AwDayPart {
    #[serde(rename = "IconPhrase")]
    icon_phrase: String,
    #[serde(rename = "Icon")]
    icon: u16,
}

#[derive(Debug, Deserialize)]
struct AwDailyForecast {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Temperature")]
    temperature: AwMinMax,
    #[serde(rename = "Day")]
    day: AwDayPart,
}

#[derive(Debug, Deserialize)]
struct AwForecastResponse {
    #[serde(rename = "DailyForecasts")]
    daily_forecasts: Vec<AwDailyForecast>,
}

#[derive(Debug, Deserialize)]
struct AwErrorBody {
    #[serde(rename = "Message")]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AccuWeatherProvider {
        AccuWeatherProvider::with_base_url("TESTKEY".to_string(), server.uri())
    }

    #[tokio::test]
    async fn resolve_extracts_first_match_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/v1/cities/search"))
            .and(query_param("q", "Москва"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"Key": "294021", "LocalizedName": "Москва"},
                {"Key": "999999", "LocalizedName": "Москва (обл.)"}
            ])))
            .mount(&server)
            .await;

        let resolved = provider(&server).resolve_location("Москва").await;
        assert_eq!(resolved, Ok(Some(LocationRef::Key("294021".to_string()))));
    }

    #[tokio::test]
    async fn resolve_maps_quota_status_to_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/v1/cities/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let resolved = provider(&server).resolve_location("Москва").await;
        assert_eq!(resolved, Ok(Some(LocationRef::RateLimited)));
    }

    #[tokio::test]
    async fn resolve_empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/v1/cities/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let resolved = provider(&server).resolve_location("Нигде").await;
        assert_eq!(resolved, Err(WeatherError::NotFound));
    }

    #[tokio::test]
    async fn current_weather_parses_observation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currentconditions/v1/294021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "WeatherText": "Облачно",
                "WeatherIcon": 7,
                "Temperature": {"Metric": {"Value": 10.0, "Unit": "C"}}
            }])))
            .mount(&server)
            .await;

        let weather = provider(&server)
            .current_weather("Москва", Some("294021"))
            .await
            .expect("current weather");
        assert_eq!(weather.temperature_c, 10.0);
        assert_eq!(weather.condition, "Облачно");
        assert_eq!(weather.icon, "☁️");
        assert_eq!(weather.is_day, None);
    }

    #[tokio::test]
    async fn current_weather_maps_quota_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currentconditions/v1/294021"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider(&server).current_weather("Москва", Some("294021")).await;
        assert_eq!(err, Err(WeatherError::RateLimited));
    }

    #[tokio::test]
    async fn current_weather_surfaces_client_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currentconditions/v1/294021"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "Code": "Unauthorized",
                "Message": "Api Authorization failed"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).current_weather("Москва", Some("294021")).await;
        assert_eq!(err, Err(WeatherError::Upstream("Api Authorization failed".to_string())));
    }

    #[tokio::test]
    async fn current_weather_rejects_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currentconditions/v1/294021"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).current_weather("Москва", Some("294021")).await;
        assert!(matches!(err, Err(WeatherError::Upstream(_))));
    }

    #[tokio::test]
    async fn forecast_preserves_upstream_order() {
        let server = MockServer::start().await;
        let day = |d: &str, min: f64, max: f64| {
            serde_json::json!({
                "Date": format!("{d}T07:00:00+03:00"),
                "Temperature": {
                    "Minimum": {"Value": min, "Unit": "C"},
                    "Maximum": {"Value": max, "Unit": "C"}
                },
                "Day": {"Icon": 12, "IconPhrase": "Дождь"}
            })
        };
        Mock::given(method("GET"))
            .and(path("/forecasts/v1/daily/5day/294021"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "DailyForecasts": [
                    day("2025-06-02", 11.0, 19.0),
                    day("2025-06-01", 10.0, 18.0),
                    day("2025-06-03", 12.0, 20.0),
                    day("2025-06-04", 13.0, 21.0),
                    day("2025-06-05", 14.0, 22.0),
                ]
            })))
            .mount(&server)
            .await;

        let days = provider(&server)
            .forecast("Москва", Some("294021"), 5)
            .await
            .expect("forecast");
        assert_eq!(days.len(), 5);
        // First two deliberately out of order; the client must not re-sort.
        assert_eq!(days[0].date.to_string(), "2025-06-02");
        assert_eq!(days[1].date.to_string(), "2025-06-01");
        assert_eq!(days[0].icon, "🌧️");
        assert_eq!(days[0].condition, "Дождь");
    }

    #[tokio::test]
    async fn missing_location_key_short_circuits() {
        let server = MockServer::start().await;
        let err = provider(&server).current_weather("Москва", None).await;
        assert_eq!(err, Err(WeatherError::NotFound));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
