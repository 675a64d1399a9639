//! Periodic sensor reads
//! Each polled characteristic gets its own task. Tasks stop when the shared
//! cancellation token fires and are joined as a group.

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::gatt::GattCharacteristic;
use crate::core::sensor::SensorChannel;

/// Spawns polling tasks that share one interval and one cancellation token
#[derive(Clone)]
pub struct SensorPoller {
    interval: Duration,
    cancel_token: CancellationToken,
}

impl SensorPoller {
    pub fn new(interval: Duration, cancel_token: CancellationToken) -> Self {
        Self {
            interval,
            cancel_token,
        }
    }

    /// Starts polling `characteristic` and adds the task to `group`
    pub fn spawn<C: GattCharacteristic>(
        &self,
        group: &mut PollingGroup,
        characteristic: C,
        channel: SensorChannel,
    ) {
        info!(
            "Polling {} from characteristic {} every {:?}",
            channel.label,
            characteristic.uuid(),
            self.interval
        );
        let interval = self.interval;
        let cancel_token = self.cancel_token.clone();
        let handle = tokio::spawn(async move {
            Self::poll_characteristic(characteristic, channel, interval, cancel_token).await
        });
        group.tasks.push((channel.label, handle));
    }

    /// Reads until cancelled and returns the number of successful reads
    async fn poll_characteristic<C: GattCharacteristic>(
        characteristic: C,
        channel: SensorChannel,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> usize {
        let mut reads = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                result = characteristic.read_value() => result,
            };

            match result {
                Ok(value) => {
                    debug!("Received {} data: {:02x?}", channel.label, value);
                    if value.len() % 2 != 0 {
                        warn!(
                            "{} value has a trailing byte, ignoring it: {:02x?}",
                            channel.label, value
                        );
                    }
                    for reading in channel.readings(&value) {
                        println!("{} Decimal----- {}", channel.label, reading.raw);
                        println!("{}----- {}", channel.label, reading.scaled);
                    }
                    reads += 1;
                }
                Err(e) => {
                    error!("Failed to read {}: {}", channel.label, e);
                }
            }

            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
        info!("{} polling stopped after {} reads", channel.label, reads);
        reads
    }
}

/// Handles of the running polling tasks
#[derive(Default)]
pub struct PollingGroup {
    tasks: Vec<(&'static str, JoinHandle<usize>)>,
}

impl PollingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task and returns the read count per channel label
    pub async fn join(self) -> Vec<(&'static str, usize)> {
        let mut finished = Vec::with_capacity(self.tasks.len());
        for (label, handle) in self.tasks {
            match handle.await {
                Ok(reads) => finished.push((label, reads)),
                Err(e) => error!("{} polling task finished with a join error: {:?}", label, e),
            }
        }
        finished
    }
}
