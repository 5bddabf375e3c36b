use crate::args::LaunchOptions;
use crate::config::{RunMode, ZapConfig};
use crate::db::DbConnection;

pub type TeardownHandler = Box<dyn FnOnce() + Send>;

/// Process-wide runtime context, created once at startup and threaded through
/// the coordinator, lifecycle dispatch, and shutdown sequencer as an owned
/// parameter instead of ambient globals.
pub struct AppContext {
    pub mode: RunMode,
    pub config: ZapConfig,
    pub options: LaunchOptions,

    pub(super) database: Option<Box<dyn DbConnection>>,
    pub(super) teardown_handlers: Vec<TeardownHandler>,
    pub(super) shutdown_started: bool,
}

impl AppContext {
    pub fn new(mode: RunMode, config: ZapConfig, options: LaunchOptions) -> Self {
        Self {
            mode,
            config,
            options,
            database: None,
            teardown_handlers: Vec::new(),
            shutdown_started: false,
        }
    }

    /// Install the shared database handle. The handle is owned by the context
    /// from here on and released exactly once during shutdown.
    pub fn set_database(&mut self, handle: Box<dyn DbConnection>) {
        self.database = Some(handle);
    }

    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }

    /// Register a teardown handler to run ahead of the database close during
    /// shutdown. Handlers run in registration order, best-effort.
    pub fn on_teardown(&mut self, handler: TeardownHandler) {
        self.teardown_handlers.push(handler);
    }

    pub fn shutdown_started(&self) -> bool {
        self.shutdown_started
    }
}
