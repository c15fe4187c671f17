use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant as StdInstant};
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use log::{debug, info};

use crate::logging::LogContext;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Shutdown requested")]
    Shutdown,
}

/// Per-cycle context handed to the cycle function.
///
/// Carries no cancellation handle: cancelling the scheduler never interrupts a
/// cycle that has already started.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    /// 1-based cycle counter
    pub sequence: u64,
    pub started_at: StdInstant,
}

/// Drives a polling cycle on a fixed interval until cancelled
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `cycle` once per interval, the first time one interval after start.
    ///
    /// Cycles run strictly one after another on this task; a slow cycle delays
    /// the next tick instead of overlapping it. Cycle errors are logged and the
    /// loop carries on. Returns [`SchedulerError::Shutdown`] once `shutdown` fires.
    pub async fn run<F, Fut, E>(&self, shutdown: CancellationToken, mut cycle: F) -> Result<(), SchedulerError>
    where
        F: FnMut(CycleContext) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        info!("Starting poller with {:?} interval", self.interval);

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Poller stopped");
                    return Err(SchedulerError::Shutdown);
                }
                _ = ticker.tick() => {
                    sequence += 1;
                    let context = CycleContext { sequence, started_at: StdInstant::now() };
                    debug!("Starting poll cycle {}", sequence);

                    // Arm bodies are not raced, so shutdown cannot abort a running cycle
                    if let Err(e) = cycle(context).await {
                        LogContext::new("scheduler", "cycle")
                            .with_metadata("sequence", serde_json::json!(sequence))
                            .warn(&format!("Error polling: {}", e));
                    }
                }
            }
        }
    }
}
