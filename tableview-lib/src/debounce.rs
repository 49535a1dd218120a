//! Cancellable-timer debouncer.

use std::future::Future;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coalesces bursts of calls into the last one.
///
/// Every [`call`](Debouncer::call) cancels the timer armed by the previous
/// call and arms a new one for the quiescence window. When a timer fires its
/// action runs to completion; later calls no longer affect it.
///
/// Must be used from within a Tokio runtime.
///
/// # Example
///
/// ```ignore
/// let debouncer = Debouncer::new(Duration::from_millis(300));
/// debouncer.call(|| async { println!("dropped") });
/// debouncer.call(|| async { println!("runs once, 300ms later") }).await?;
/// ```
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Returns the quiescence window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules `action`, superseding any call still waiting for its timer.
    ///
    /// The returned handle resolves once the action finished, or right away
    /// if a later call superseded this one.
    pub fn call<F, Fut>(&self, action: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => action().await,
            }
        })
    }

    /// Cancels the pending call, if any.
    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = pending {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_call_once() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));

        let mut handles = Vec::new();
        for i in 0..5 {
            let runs = runs.clone();
            let last = last.clone();
            handles.push(debouncer.call(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = Some(i);
            }));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock().unwrap(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_outside_window_each_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let runs = runs.clone();
            debouncer
                .call(move || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_quiescence() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        let handle = debouncer.call(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_millis(299)).await;
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_call() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        let handle = debouncer.call(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        handle.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_superseded_call_never_runs_once_timer_is_due() {
        for _ in 0..50 {
            let debouncer = Debouncer::new(Duration::ZERO);
            let ran = Arc::new(Mutex::new(Vec::new()));

            let log = ran.clone();
            let first = debouncer.call(move || async move { log.lock().unwrap().push("first") });
            let log = ran.clone();
            let second = debouncer.call(move || async move { log.lock().unwrap().push("second") });
            first.await.unwrap();
            second.await.unwrap();

            assert_eq!(*ran.lock().unwrap(), vec!["second"]);
        }
    }
}
