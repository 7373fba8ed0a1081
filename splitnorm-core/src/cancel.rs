use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and the workers of
/// a normalize run. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// A token that fires when either `self` or the returned child is cancelled.
    ///
    /// Used per phase: a failing worker cancels the phase-local child so its
    /// siblings stop early, without cancelling the caller's token.
    pub fn child(&self) -> ChildToken {
        ChildToken { parent: self.clone(), own: CancelToken::new() }
    }
}

/// Phase-local token linked to a parent `CancelToken`.
#[derive(Debug, Clone)]
pub struct ChildToken {
    parent: CancelToken,
    own: CancelToken,
}

impl ChildToken {
    pub fn cancel(&self) {
        self.own.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.is_cancelled() || self.parent.is_cancelled()
    }
}
