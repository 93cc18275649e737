use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::session::{TurnOutcome, TutorSession};

/// Quiet period before a quiz answer is submitted.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Trailing-edge debouncer.
///
/// Each call restarts the window; only the last call made within a quiet
/// window runs. Superseded calls resolve to `None`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    latest: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `f` to run once the window passes without another call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn call<F, Fut, T>(&self, f: F) -> JoinHandle<Option<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if latest.load(Ordering::SeqCst) != ticket {
                debug!(ticket, "debounced call superseded");
                return None;
            }
            Some(f().await)
        })
    }
}

/// Debounced quiz-answer submission for one session.
#[derive(Clone)]
pub struct AnswerSubmitter {
    session: Arc<TutorSession>,
    debouncer: Debouncer,
}

impl AnswerSubmitter {
    #[must_use]
    pub fn new(session: Arc<TutorSession>) -> Self {
        Self::with_debouncer(session, Debouncer::default())
    }

    #[must_use]
    pub fn with_debouncer(session: Arc<TutorSession>, debouncer: Debouncer) -> Self {
        Self { session, debouncer }
    }

    /// Trigger a submission of `answer`.
    ///
    /// Rapid repeated triggers collapse into one submission of the last
    /// answer; earlier handles resolve to `None`.
    pub fn submit(&self, answer: impl Into<String>) -> JoinHandle<Option<TurnOutcome>> {
        let session = Arc::clone(&self.session);
        let answer = answer.into();
        self.debouncer
            .call(move || async move { session.submit_answer(&answer).await })
    }
}
