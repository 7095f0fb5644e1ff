//! Background pump for the discovery service's event processing.
//!
//! Every tick forwards one event step to the service and nothing else; any
//! table work it causes arrives at the keeper as a change notification.
//! Stopping interrupts the wait between ticks, so shutdown waits for at most
//! one in-flight event step.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::backend::DiscoveryBackend;

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct EventTicker {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventTicker {
    pub fn spawn(backend: Arc<dyn DiscoveryBackend>, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let period = period.max(MIN_PERIOD);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stopped => break,
                    _ = interval.tick() => backend.process_events(),
                }
            }
            debug!("event ticker stopped");
        });

        Self {
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Stops ticking and waits until the task has exited.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "event ticker ended abnormally");
            }
        }
    }
}

impl Drop for EventTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
