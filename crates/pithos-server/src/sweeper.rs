//! Background task that closes expired motions

use std::sync::Arc;
use std::time::Duration;

use pithos_bot::Bot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::startup::ShutdownSignal;

/// Run [`Bot::close_expired_motions`] every `period` until shutdown.
pub fn spawn_sweeper(bot: Arc<Bot>, period: Duration, shutdown: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Motion sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match bot.close_expired_motions(bot.now()).await {
                        Ok(0) => debug!("No expired motions"),
                        Ok(closed) => info!(closed, "Closed expired motions"),
                        Err(e) => error!("Motion sweep failed: {:#}", e),
                    }
                }
                _ = shutdown.wait() => {
                    info!("Motion sweeper stopped");
                    break;
                }
            }
        }
    })
}
