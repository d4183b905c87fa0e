use log::trace;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Polls a closure at a fixed interval until it yields a value.
///
/// There is no deadline. Callers that want one abort the returned task.
pub struct RetryTimer {
    interval: Duration,
}

impl RetryTimer {
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Polls `poll` once per tick, the first tick being immediate.
    pub async fn until<T, F>(&self, mut poll: F) -> T
    where
        F: FnMut() -> Option<T>,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempt: u64 = 0;
        loop {
            ticker.tick().await;
            if let Some(value) = poll() {
                return value;
            }
            attempt += 1;
            trace!("Retry attempt {attempt} found nothing, waiting {:?}", self.interval);
        }
    }

    /// Like [`RetryTimer::until`], but runs on its own task.
    pub fn spawn<T, F>(self, poll: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnMut() -> Option<T> + Send + 'static,
    {
        tokio::spawn(async move { self.until(poll).await })
    }
}
