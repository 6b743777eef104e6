use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Fires a callback every `interval` on a background tokio task.
///
/// The next deadline is armed before the callback runs, so a slow callback
/// does not stretch the period. Ticks missed while the process is suspended
/// are delayed, never replayed. Must be started from inside a tokio runtime.
pub struct RepeatingTimer {
    interval: Duration,
    callback: Callback,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTimer {
    pub fn new(interval: Duration, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            interval,
            callback: Arc::new(callback),
            handle: None,
        }
    }

    /// Schedule ticking. No-op while already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let interval = self.interval;
        let callback = Arc::clone(&self.callback);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        }));
        debug!("Repeating timer started ({interval:?})");
    }

    /// Cancel the pending tick. Stopping an idle timer is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Repeating timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
