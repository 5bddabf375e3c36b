use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Window management collaborator. Creation must be idempotent: asking for a
/// window while one already exists is a no-op.
pub trait WindowManager: Send + Sync {
    fn create_if_not_there(&self, http_port: u16);

    fn has_window(&self) -> bool;
}

/// Window manager for headless and `--noUi` runs. Tracks the request so that
/// activation stays idempotent, but never opens anything.
pub struct HeadlessWindows {
    requested: AtomicBool,
}

impl HeadlessWindows {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }
}

impl WindowManager for HeadlessWindows {
    fn create_if_not_there(&self, http_port: u16) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Window requested for port {} (headless, not opening)", http_port);
    }

    fn has_window(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
