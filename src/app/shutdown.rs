use super::AppContext;
use tracing::{error, info};

impl AppContext {
    /// Ordered, blocking cleanup of shared resources.
    ///
    /// Invoked synchronously from the will-quit transition: once the runtime
    /// begins tearing down, asynchronous work is not guaranteed to complete,
    /// so the database close must not be awaited. Idempotent; a second call
    /// after shutdown has started is a no-op.
    pub fn shutdown(&mut self) {
        if self.shutdown_started {
            return;
        }
        self.shutdown_started = true;

        // Internal teardown handlers first, best-effort and independent of
        // the resource state.
        for handler in self.teardown_handlers.drain(..) {
            handler();
        }

        if let Some(mut database) = self.database.take() {
            match database.close_sync() {
                Ok(()) => info!("Database closed, shutting down."),
                Err(e) => error!("Failed to close database: {}", e),
            }
        }
    }
}
