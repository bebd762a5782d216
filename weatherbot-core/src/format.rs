//! User-facing message rendering.
//!
//! Message shapes are fixed for compatibility with the existing subscriber
//! base and must not be reworded. The formatter is pure and infallible: it
//! only ever sees well-formed data, because the provider client degrades
//! every upstream failure to one of the fixed error strings before this
//! module is reached.

use crate::model::{CurrentWeather, ForecastDay};
use crate::provider::WeatherError;

pub const RATE_LIMIT_TEXT: &str =
    "К сожалению, лимит запросов к API погоды превышен. Пожалуйста, попробуйте позже.";

pub const CURRENT_UNAVAILABLE_TEXT: &str = "Не удалось получить погоду. Проверь название города.";

pub const FORECAST_UNAVAILABLE_TEXT: &str =
    "Ошибка при получении прогноза. Проверь название города.";

pub const CITY_NOT_FOUND_TEXT: &str = "Не удалось найти такой город. Попробуй снова.";

/// Appended to every daily broadcast message.
pub const DAILY_FOOTER: &str = "\n\n© 2025 Сергей Сергиенко";

/// One-shot notice sent to every subscriber when the process starts.
pub const STARTUP_NOTICE_TEXT: &str = "🔄 Бот обновлён! Теперь более точная погода на 5 дней с пиктограммами.\nНажмите /start, и введите название вашего города занового, чтобы изменения вступили в силу.";

pub fn city_saved_message(city: &str) -> String {
    format!("Город сохранён: {city}")
}

pub fn current_message(city: &str, weather: &CurrentWeather) -> String {
    format!(
        "Погода в {city}: {} {}, {}°C",
        weather.icon,
        weather.condition,
        format_temp(weather.temperature_c)
    )
}

pub fn forecast_message(city: &str, days: &[ForecastDay]) -> String {
    let mut out = format!("Прогноз погоды в {city} ({} дней):\n", days.len());
    for day in days {
        out.push_str(&format!(
            "{}: {} {}, от {}°C до {}°C\n",
            day.date,
            day.icon,
            day.condition,
            format_temp(day.temp_min_c),
            format_temp(day.temp_max_c)
        ));
    }
    out
}

pub fn current_error_text(err: &WeatherError) -> String {
    match err {
        WeatherError::RateLimited => RATE_LIMIT_TEXT.to_string(),
        WeatherError::Upstream(msg) => format!("Не удалось получить погоду: {msg}"),
        WeatherError::NotFound => CURRENT_UNAVAILABLE_TEXT.to_string(),
    }
}

pub fn forecast_error_text(err: &WeatherError) -> String {
    match err {
        WeatherError::RateLimited => RATE_LIMIT_TEXT.to_string(),
        WeatherError::Upstream(msg) => format!("Ошибка при получении прогноза: {msg}"),
        WeatherError::NotFound => FORECAST_UNAVAILABLE_TEXT.to_string(),
    }
}

/// Render a temperature the way the upstream JSON numbers read: integral
/// values without a decimal point, everything else as-is.
fn format_temp(value: f64) -> String {
    if value.fract() == 0.0 { format!("{}", value as i64) } else { format!("{value}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_day(date: &str, min: f64, max: f64) -> ForecastDay {
        ForecastDay {
            date: date.parse().expect("valid date"),
            temp_min_c: min,
            temp_max_c: max,
            condition: "Облачно".to_string(),
            icon: "☁️",
        }
    }

    #[test]
    fn current_message_shape() {
        let weather = CurrentWeather {
            temperature_c: 10.0,
            condition: "Облачно".to_string(),
            icon: "☁️",
            is_day: None,
        };
        assert_eq!(current_message("Москва", &weather), "Погода в Москва: ☁️ Облачно, 10°C");
    }

    #[test]
    fn current_message_keeps_fractional_temp() {
        let weather = CurrentWeather {
            temperature_c: -3.5,
            condition: "Снег".to_string(),
            icon: "❄️",
            is_day: Some(false),
        };
        assert_eq!(current_message("Осло", &weather), "Погода в Осло: ❄️ Снег, -3.5°C");
    }

    #[test]
    fn forecast_message_one_line_per_day_in_given_order() {
        let days = vec![
            sample_day("2025-06-02", 11.0, 19.0),
            sample_day("2025-06-01", 10.0, 18.0),
            sample_day("2025-06-03", 12.5, 20.0),
        ];
        let text = forecast_message("Минск", &days);

        assert!(text.starts_with("Прогноз погоды в Минск (3 дней):\n"));
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        // Order is whatever the provider supplied; no re-sorting happens.
        assert_eq!(lines[0], "2025-06-02: ☁️ Облачно, от 11°C до 19°C");
        assert_eq!(lines[1], "2025-06-01: ☁️ Облачно, от 10°C до 18°C");
        assert_eq!(lines[2], "2025-06-03: ☁️ Облачно, от 12.5°C до 20°C");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn error_texts_cover_the_taxonomy() {
        assert_eq!(current_error_text(&WeatherError::RateLimited), RATE_LIMIT_TEXT);
        assert_eq!(current_error_text(&WeatherError::NotFound), CURRENT_UNAVAILABLE_TEXT);
        assert_eq!(
            current_error_text(&WeatherError::Upstream("api key invalid".into())),
            "Не удалось получить погоду: api key invalid"
        );
        assert_eq!(forecast_error_text(&WeatherError::NotFound), FORECAST_UNAVAILABLE_TEXT);
    }
}
