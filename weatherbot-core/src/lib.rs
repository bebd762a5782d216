//! Core library for the weather broadcast bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers (reference-based and name-based)
//! - The durable subscriber registry
//! - Message formatting and the scheduled broadcast jobs
//!
//! It is used by `weatherbot-cli`, but can also be reused by other binaries
//! or services (e.g., a Telegram front end).

pub mod broadcast;
pub mod config;
pub mod format;
pub mod icons;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

pub use broadcast::{Broadcaster, Transport};
pub use config::{Config, ProviderConfig};
pub use model::{CurrentWeather, ForecastDay, LocationRef, Subscriber};
pub use provider::{ProviderId, WeatherError, WeatherProvider};
pub use service::{Registration, WeatherService};
pub use store::SubscriptionStore;
