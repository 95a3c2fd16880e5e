use crate::prelude::*;

use crate::coordinator::{ChannelData, Coordinator};
use std::time::Duration;

/// Host tick cadence. The coordinator self-times against the configured
/// refresh interval, so this only bounds retry granularity after a failed
/// poll.
const TICK_SECS: u64 = 10;

pub struct Scheduler {
    channels: Channels,
}

impl Scheduler {
    pub fn new(channels: Channels) -> Self {
        Self { channels }
    }

    pub async fn start(&self, mut coordinator: Coordinator) -> Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(TICK_SECS));
        let mut receiver = self.channels.readings.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => coordinator.on_tick().await,
                message = receiver.recv() => match message {
                    Ok(ChannelData::Shutdown) => break,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(_) => break,
                },
            }
        }

        info!("scheduler stopped");
        Ok(())
    }
}
