//! Mapping from provider weather codes to display glyphs.
//!
//! Two code families are supported:
//! - AccuWeather icon numbers (1–44), one glyph per code; night conditions
//!   have their own codes (33, 34, ...).
//! - WeatherAPI condition codes (1000+), where a subset of codes renders
//!   differently by day and by night.
//!
//! Both lookups are total: codes outside the known set resolve to [`UNKNOWN`].

/// Reserved glyph for codes the mapper does not know.
pub const UNKNOWN: &str = "❔";

/// Resolve an AccuWeather icon number to a glyph.
pub fn accuweather(code: u16) -> &'static str {
    match code {
        1 | 2 => "☀️",
        3..=5 => "🌤️",
        6 => "🌥️",
        7 | 8 | 35..=38 => "☁️",
        11 => "🌫️",
        12..=14 | 18 | 25 | 26 | 29 | 39 | 40 => "🌧️",
        15..=17 | 41 | 42 => "⛈️",
        19..=21 => "🌨️",
        22 | 23 | 43 | 44 => "❄️",
        24 => "🧊",
        30 => "🥵",
        31 => "🥶",
        32 => "💨",
        33 | 34 => "🌙",
        _ => UNKNOWN,
    }
}

/// Resolve a WeatherAPI condition code to a glyph.
///
/// `is_day` left unset is treated as daytime, matching the upstream payloads
/// where the flag is only present on current-conditions responses.
pub fn weatherapi(code: u16, is_day: Option<bool>) -> &'static str {
    let day = is_day.unwrap_or(true);
    match code {
        1000 => {
            if day {
                "☀️"
            } else {
                "🌙"
            }
        }
        1003 => {
            if day {
                "🌤️"
            } else {
                "☁️"
            }
        }
        1006 | 1009 => "☁️",
        1030 | 1135 | 1147 => "🌫️",
        1063 | 1180 | 1240 => {
            if day {
                "🌦️"
            } else {
                "🌧️"
            }
        }
        1066 | 1069 | 1114 | 1204 | 1207 | 1210..=1219 | 1249 | 1252 | 1255 | 1258 => "🌨️",
        1087 | 1273 | 1276 | 1279 | 1282 => "⛈️",
        1117 | 1222 | 1225 => "❄️",
        1150 | 1153 | 1168 | 1171 | 1183..=1201 | 1243 | 1246 => "🌧️",
        1237 | 1261 | 1264 => "🧊",
        _ => UNKNOWN,
    }
}
