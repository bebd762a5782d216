//! Scheduled fan-out to all subscribers.
//!
//! Two jobs run on the tokio timer facility: a one-shot startup notice and a
//! recurring daily weather push at a fixed wall-clock time (host-local).
//! The central invariant is per-subscriber isolation: a failed send is
//! logged and the iteration moves on to the next subscriber.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use std::{sync::Arc, time::Duration};

use crate::{format, service::WeatherService, store::SubscriptionStore};

/// Outbound messaging collaborator. Failures are scoped to one subscriber.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<()>;
}

pub struct Broadcaster {
    store: Arc<SubscriptionStore>,
    service: Arc<WeatherService>,
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    pub fn new(
        store: Arc<SubscriptionStore>,
        service: Arc<WeatherService>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self { store, service, transport }
    }

    /// Register both jobs with the runtime and return immediately. The
    /// startup notice fires as soon as the executor gets to it; the daily
    /// push fires every day at `daily_at`.
    pub fn start(self: &Arc<Self>, daily_at: NaiveTime) {
        let startup = Arc::clone(self);
        tokio::spawn(async move {
            startup.send_startup_notice().await;
        });

        let daily = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let delay = next_fire_delay(Local::now().naive_local(), daily_at);
                tracing::debug!("next daily broadcast in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
                daily.send_daily_weather().await;
            }
        });
    }

    /// One-shot changelog notice to every current subscriber.
    pub async fn send_startup_notice(&self) {
        for (id, _) in self.store.snapshot() {
            if let Err(err) = self.transport.send(&id, format::STARTUP_NOTICE_TEXT).await {
                tracing::error!("startup notice to subscriber {id} failed: {err}");
            }
        }
    }

    /// Daily weather push over a snapshot of the registry taken at job
    /// start; subscribers registered mid-run wait until tomorrow.
    pub async fn send_daily_weather(&self) {
        let snapshot = self.store.snapshot();
        tracing::info!("daily broadcast started for {} subscribers", snapshot.len());

        for (id, subscriber) in snapshot {
            if subscriber.city_name.is_empty() {
                continue;
            }

            let mut text = self.service.current_text(&subscriber).await;
            text.push_str(format::DAILY_FOOTER);

            if let Err(err) = self.transport.send(&id, &text).await {
                tracing::error!("daily weather to subscriber {id} failed: {err}");
            }
        }
    }
}

/// Time until the next `at` on the host-local clock, never zero-negative.
fn next_fire_delay(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let mut next = now.date().and_time(at);
    if next <= now {
        next += TimeDelta::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
