use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-side abort signal for a hung exchange.
///
/// Checked on every poll iteration and while settling. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
