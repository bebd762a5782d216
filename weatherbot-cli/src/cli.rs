use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use weatherbot_core::{
    Broadcaster, Config, ProviderId, Registration, Subscriber, SubscriptionStore, Transport,
    WeatherService, format,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Weather broadcast bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "accuweather" or "weatherapi".
        provider: String,
    },

    /// Register or change the city for a subscriber.
    SetCity {
        /// Subscriber identifier from the messaging transport.
        subscriber: String,

        /// Free-text city name.
        city: String,
    },

    /// Show current weather for a subscriber's registered city.
    Current {
        subscriber: String,
    },

    /// Show the multi-day forecast for a subscriber's registered city.
    Forecast {
        subscriber: String,

        #[arg(long, default_value_t = 5)]
        days: u8,
    },

    /// Run the broadcast scheduler: startup notice now, weather push daily.
    Run,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                let api_key = inquire::Password::new(&format!("API key for {id}:"))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let mut cfg = Config::load()?;
                cfg.upsert_provider_api_key(id, api_key);

                // Offer to switch when another provider is currently default.
                if cfg.default_provider_id().map(|current| current != id).unwrap_or(false) {
                    let make_default =
                        inquire::Confirm::new(&format!("Make {id} the default provider?"))
                            .with_default(true)
                            .prompt()
                            .context("Failed to read answer")?;
                    if make_default {
                        cfg.set_default_provider(id);
                    }
                }

                cfg.save()?;
                println!("Saved credentials for {id}.");
            }

            Command::SetCity { subscriber, city } => {
                let cfg = Config::load()?;
                let service = WeatherService::from_config(&cfg)?;
                let mut store = SubscriptionStore::load(cfg.subscribers_file_path()?)?;

                match service.register_city(&city).await {
                    Registration::Saved(record) => {
                        store.put(subscriber, record)?;
                        println!("{}", format::city_saved_message(&city));
                    }
                    Registration::NotFound => println!("{}", format::CITY_NOT_FOUND_TEXT),
                    Registration::RateLimited => println!("{}", format::RATE_LIMIT_TEXT),
                }
            }

            Command::Current { subscriber } => {
                let (service, record) = load_subscriber(&subscriber)?;
                println!("{}", service.current_text(&record).await);
            }

            Command::Forecast { subscriber, days } => {
                let (service, record) = load_subscriber(&subscriber)?;
                println!("{}", service.forecast_text(&record, days).await);
            }

            Command::Run => {
                let cfg = Config::load()?;
                let service = Arc::new(WeatherService::from_config(&cfg)?);
                let store = Arc::new(SubscriptionStore::load(cfg.subscribers_file_path()?)?);
                let transport: Arc<dyn Transport> = Arc::new(LogTransport);

                tracing::info!("loaded {} subscribers", store.len());

                let broadcaster = Arc::new(Broadcaster::new(store, service, transport));
                broadcaster.start(cfg.broadcast.daily_time()?);

                tracing::info!("broadcast scheduler running; press Ctrl-C to stop");
                tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
            }
        }

        Ok(())
    }
}

fn load_subscriber(subscriber: &str) -> anyhow::Result<(WeatherService, Subscriber)> {
    let cfg = Config::load()?;
    let service = WeatherService::from_config(&cfg)?;
    let store = SubscriptionStore::load(cfg.subscribers_file_path()?)?;

    let record = store
        .get(subscriber)
        .cloned()
        .with_context(|| format!("Subscriber '{subscriber}' has no city registered yet"))?;

    Ok((service, record))
}

/// Stand-in outbound transport: logs each delivery instead of sending it
/// through a messaging service.
struct LogTransport;

#[async_trait::async_trait]
impl Transport for LogTransport {
    async fn send(&self, subscriber_id: &str, text: &str) -> anyhow::Result<()> {
        println!("→ {subscriber_id}:\n{text}\n");
        Ok(())
    }
}
