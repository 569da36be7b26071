use crate::core::CloudProvider;
use crate::domain::model::ModificationState;
use crate::utils::error::{MigrationError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Polls a volume's modification at a fixed interval until EC2 reports it completed.
#[derive(Debug, Clone, Copy)]
pub struct ModificationWaiter {
    interval: Duration,
    max_wait: Option<Duration>,
}

impl ModificationWaiter {
    pub fn new(interval: Duration, max_wait: Option<Duration>) -> Self {
        Self { interval, max_wait }
    }

    /// Returns the time spent waiting.
    ///
    /// Without `max_wait` this only returns on `completed`, `failed`, or a
    /// provider error. A provider error is reported as `WaiterError`.
    pub async fn wait<P>(&self, provider: &P, volume_id: &str) -> Result<Duration>
    where
        P: CloudProvider + ?Sized,
    {
        let start = Instant::now();

        loop {
            let modification = provider.volume_modification(volume_id).await.map_err(|source| {
                MigrationError::WaiterError {
                    volume_id: volume_id.to_string(),
                    source,
                }
            })?;

            let elapsed = start.elapsed();
            tracing::info!(
                "⏳ Volume {} modification progressing ({}, {}%) after {:?}",
                volume_id,
                modification.state,
                modification.progress.unwrap_or(0),
                elapsed
            );

            match modification.state {
                ModificationState::Completed => {
                    tracing::info!("✅ Modification of {} completed after {:?}", volume_id, elapsed);
                    return Ok(elapsed);
                }
                ModificationState::Failed => {
                    return Err(MigrationError::ModificationFailedError {
                        volume_id: volume_id.to_string(),
                        state: modification.state.to_string(),
                    });
                }
                ref state => {
                    if let Some(max_wait) = self.max_wait {
                        if elapsed >= max_wait {
                            return Err(MigrationError::WaitTimeoutError {
                                volume_id: volume_id.to_string(),
                                state: state.to_string(),
                                waited_secs: elapsed.as_secs(),
                            });
                        }
                    }
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
