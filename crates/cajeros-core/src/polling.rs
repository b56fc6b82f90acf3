// ── Polling fallback ──
//
// Periodic full refetch for views without a realtime feed. The refresh is
// awaited in place and ticks that elapse meanwhile are skipped, so at most
// one invocation is in flight. The first invocation happens one period
// after start.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use crate::config::DEFAULT_POLLING_INTERVAL;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running poller. Dropping it stops future invocations.
pub struct PollingHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl PollingHandle {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop polling and wait for an in-flight invocation to be abandoned.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Invoke `op` every `interval` until the returned handle is stopped or
/// dropped. Intervals shorter than a millisecond are rounded up.
pub fn start_polling<F, Fut>(mut op: F, interval: Duration) -> PollingHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = interval.max(MIN_INTERVAL);
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let mut next = Instant::now() + period;

        loop {
            tokio::select! {
                biased;
                () = task_cancel.cancelled() => break,
                () = tokio::time::sleep_until(next) => {}
            }
            debug!("polling refresh");
            tokio::select! {
                biased;
                () = task_cancel.cancelled() => break,
                () = op() => {}
            }

            // Skip every tick that elapsed while the refresh ran.
            let now = Instant::now();
            next += period;
            while next <= now {
                next += period;
            }
        }
        debug!("polling stopped");
    });

    PollingHandle {
        cancel,
        task: Some(task),
        interval: period,
    }
}

/// Cancel future invocations of a poller.
pub fn stop_polling(handle: PollingHandle) {
    handle.cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<()> + Send + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        (calls, move || {
            c.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_one_period_after_start() {
        let (calls, op) = counter();
        let _handle = start_polling(op, Duration::from_millis(30));

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_invocations() {
        let (calls, op) = counter();
        let handle = start_polling(op, Duration::from_millis(30));

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        stop_polling(handle);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let (calls, op) = counter();
        let handle = start_polling(op, Duration::from_millis(30));
        drop(handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_refresh_skips_ticks_and_never_overlaps() {
        let started = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let (s, f, m) = (started.clone(), in_flight.clone(), max_in_flight.clone());
        let handle = start_polling(
            move || {
                let (s, f, m) = (s.clone(), f.clone(), m.clone());
                async move {
                    s.fetch_add(1, Ordering::SeqCst);
                    let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                    m.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(70)).await;
                    f.fetch_sub(1, Ordering::SeqCst);
                }
            },
            Duration::from_millis(30),
        );

        // Starts at 30ms and 120ms; the ticks at 60ms and 90ms are skipped.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }
}
