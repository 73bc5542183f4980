//! Cancellable one-tick-per-period source.
//!
//! A [`Ticker`] owns a spawned tokio task that pushes a tick into a channel
//! every period. Dropping or cancelling the ticker stops that task, so the
//! owner never ends up with two overlapping tick streams.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub struct Ticker {
    run_id: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

impl Ticker {
    /// Spawn a tick stream for timer run `run_id`. The first tick arrives
    /// one full `period` after this call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(run_id: u64, period: Duration) -> Self {
        let token = CancellationToken::new();
        let (tx, ticks) = mpsc::channel(1);
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            trace!(run_id, "Tick stream stopped");
        });

        trace!(run_id, ?period, "Tick stream started");
        Self {
            run_id,
            token,
            handle,
            ticks,
        }
    }

    /// The timer run this ticker was created for.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Wait for the next tick. `None` once the stream has stopped.
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the tick stream.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut ticker = Ticker::spawn(1, Duration::from_secs(1));
        let started = Instant::now();
        for n in 1..=3 {
            ticker.tick().await.unwrap();
            assert_eq!(started.elapsed(), Duration::from_secs(n));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_stream() {
        let ticker = Ticker::spawn(1, Duration::from_secs(1));
        let token = ticker.token.clone();
        drop(ticker);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let mut ticker = Ticker::spawn(7, Duration::from_secs(1));
        let early = tokio::time::timeout(Duration::from_millis(999), ticker.tick()).await;
        assert!(early.is_err());
        assert_eq!(ticker.run_id(), 7);
        assert!(!ticker.is_cancelled());
    }
}
