//! The global export-in-progress lock.
//!
//! Set before either export path begins work and cleared
//! unconditionally when the guard drops, guaranteeing release on
//! every exit path. The input controller shares the underlying flag
//! and refuses gestures while it is held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide export lock.
#[derive(Debug, Clone, Default)]
pub struct ExportLock {
    flag: Arc<AtomicBool>,
}

impl ExportLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw flag, shared with the input controller.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Acquire the lock if free. The returned guard releases it on
    /// drop.
    pub fn try_acquire(&self) -> Option<ExportGuard> {
        if self
            .flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(ExportGuard {
                flag: Arc::clone(&self.flag),
            })
        } else {
            None
        }
    }
}

/// RAII guard for the export lock.
#[derive(Debug)]
pub struct ExportGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
