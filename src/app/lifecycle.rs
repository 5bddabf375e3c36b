use super::AppContext;
use crate::startup::Startup;
use crate::window::WindowManager;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Process lifecycle states. Terminal state means the process has exited (or
/// is about to, once the runtime observes the exit flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Ready,
    Active,
    ShuttingDown,
    Terminated,
}

/// Host-runtime signals bound to lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Ready,
    Activate,
    WindowAllClosed,
    WillQuit,
    SecondInstance(Vec<String>),
}

/// What the runtime loop should do after dispatching an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Request full termination; the runtime follows up with `WillQuit`.
    Quit,
    Exit(i32),
}

/// Lifecycle hook registry: an explicit state machine with a single dispatch
/// point, so transition legality is checked in one place instead of being
/// scattered across callback bodies.
pub struct AppLifecycle {
    state: LifecycleState,
    ctx: AppContext,
    startup: Arc<dyn Startup>,
    windows: Arc<dyn WindowManager>,
}

impl AppLifecycle {
    pub fn new(ctx: AppContext, startup: Arc<dyn Startup>, windows: Arc<dyn WindowManager>) -> Self {
        Self {
            state: LifecycleState::Initializing,
            ctx,
            startup,
            windows,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    /// Dispatch one host event against the current state.
    pub async fn dispatch(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Ready => self.on_ready().await,
            HostEvent::Activate => self.on_activate(),
            HostEvent::WindowAllClosed => {
                window_all_closed_flow(cfg!(target_os = "macos"))
            }
            HostEvent::WillQuit => self.on_will_quit(),
            HostEvent::SecondInstance(command_line) => {
                // Advisory only: another process tried to start while this
                // one holds the lock.
                info!("New instance: {}", command_line.join(" "));
                Flow::Continue
            }
        }
    }

    async fn on_ready(&mut self) -> Flow {
        if self.state != LifecycleState::Initializing {
            debug!("Ignoring ready signal in state {:?}", self.state);
            return Flow::Continue;
        }
        match self.startup.start_up(&mut self.ctx, true).await {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                Flow::Continue
            }
            Err(e) => {
                // Startup failure is fatal and not retried.
                error!("Startup failed: {}", e);
                self.state = LifecycleState::Terminated;
                Flow::Exit(1)
            }
        }
    }

    fn on_activate(&mut self) -> Flow {
        match self.state {
            LifecycleState::Ready | LifecycleState::Active => {
                info!("Activate...");
                self.windows.create_if_not_there(self.ctx.options.http_port);
                self.state = LifecycleState::Active;
            }
            _ => debug!("Ignoring activate signal in state {:?}", self.state),
        }
        Flow::Continue
    }

    fn on_will_quit(&mut self) -> Flow {
        if matches!(
            self.state,
            LifecycleState::ShuttingDown | LifecycleState::Terminated
        ) {
            debug!("Shutdown already started, ignoring will-quit");
            return Flow::Continue;
        }
        self.state = LifecycleState::ShuttingDown;
        self.ctx.shutdown();
        self.state = LifecycleState::Terminated;
        Flow::Exit(0)
    }
}

/// All user-facing windows have closed. Platforms that keep background apps
/// alive after window close stay resident; everywhere else this requests full
/// termination.
pub fn window_all_closed_flow(keeps_background_apps: bool) -> Flow {
    if keeps_background_apps {
        Flow::Continue
    } else {
        Flow::Quit
    }
}
