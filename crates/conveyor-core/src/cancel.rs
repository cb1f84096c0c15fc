use std::fmt;
use std::sync::{Arc, Mutex};

/// Callback invoked when cancellation is requested.
type CancelCallback = Box<dyn FnOnce() + Send>;

/// Cooperative one-way cancellation signal.
///
/// A token starts active and transitions to cancelled at most once; repeat
/// [`cancel`](CancellationToken::cancel) calls are no-ops. One token is
/// created per queued job invocation and shared by reference between the
/// queue layer, the dispatcher, and the executor. Long-running executors
/// either poll [`is_cancelled`](CancellationToken::is_cancelled) or register
/// a callback to abort promptly.
///
/// Deliberately built on std primitives only, so executors running on any
/// runtime can hold it.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Mutex<TokenState>>,
}

#[derive(Default)]
struct TokenState {
    cancelled: bool,
    callbacks: Vec<CancelCallback>,
}

impl CancellationToken {
    /// Create a new active token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Runs all registered callbacks exactly once each, in registration
    /// order. Subsequent calls do nothing.
    pub fn cancel(&self) {
        let callbacks = {
            let mut state = self.inner.lock().expect("cancellation state poisoned");
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.callbacks)
        };

        // Callbacks run outside the lock so they may query the token.
        for callback in callbacks {
            callback();
        }
    }

    /// Register a callback to run on cancellation.
    ///
    /// If the token is already cancelled the callback runs immediately on
    /// the calling thread rather than losing the notification.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.lock().expect("cancellation state poisoned");
            if !state.cancelled {
                state.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().expect("cancellation state poisoned").cancelled
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
