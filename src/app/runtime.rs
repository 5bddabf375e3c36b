use super::lifecycle::{AppLifecycle, Flow, HostEvent};
use super::InstanceLock;
use crate::error::{Result, ZapError};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Event-driven runtime for the interactive path.
///
/// Owns the lifecycle state machine and the instance lock, wires OS signals
/// and second-instance notifications onto the event channel, and loops until
/// a dispatch yields an exit flow. The lock must be acquired before this is
/// constructed; it is held until the process exits.
pub struct AppRuntime {
    lifecycle: AppLifecycle,
    _lock: InstanceLock,
    events_tx: mpsc::Sender<HostEvent>,
    events_rx: mpsc::Receiver<HostEvent>,
    cancellation_token: CancellationToken,
}

impl AppRuntime {
    pub fn new(lifecycle: AppLifecycle, lock: InstanceLock) -> Self {
        let (events_tx, events_rx) = mpsc::channel(16);
        Self {
            lifecycle,
            _lock: lock,
            events_tx,
            events_rx,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Sender half of the event channel, for host adapters.
    pub fn events(&self) -> mpsc::Sender<HostEvent> {
        self.events_tx.clone()
    }

    /// Run the main application loop until an exit flow is reached.
    pub async fn run(mut self) -> Result<i32> {
        let socket_path = self.lifecycle.context().config.socket_path();

        self.setup_signal_handlers();
        self.setup_second_instance_listener(socket_path.clone());

        // The readiness signal fires exactly once, before any other event is
        // serviced.
        if let Some(code) = self.handle_flow(HostEvent::Ready).await {
            self.finish(&socket_path);
            return Ok(code);
        }
        info!("Zap is running");

        loop {
            let event = self
                .events_rx
                .recv()
                .await
                .ok_or_else(|| ZapError::system("Event channel closed unexpectedly"))?;
            if let Some(code) = self.handle_flow(event).await {
                self.finish(&socket_path);
                return Ok(code);
            }
        }
    }

    /// Dispatch one event, following a quit request with the will-quit
    /// signal. Returns the exit code once the lifecycle terminates.
    async fn handle_flow(&mut self, event: HostEvent) -> Option<i32> {
        match self.lifecycle.dispatch(event).await {
            Flow::Continue => None,
            Flow::Quit => match self.lifecycle.dispatch(HostEvent::WillQuit).await {
                Flow::Exit(code) => Some(code),
                _ => None,
            },
            Flow::Exit(code) => Some(code),
        }
    }

    fn finish(&self, socket_path: &std::path::Path) {
        self.cancellation_token.cancel();
        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(socket_path);
        }
        #[cfg(not(unix))]
        let _ = socket_path;
    }

    /// Map termination signals onto the will-quit transition and, on Unix,
    /// SIGHUP onto activation.
    fn setup_signal_handlers(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let events = self.events_tx.clone();
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                tokio::select! {
                    _ = token.cancelled() => {}
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        let _ = events.send(HostEvent::WillQuit).await;
                    }
                }
            });

            let events = self.events_tx.clone();
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                let mut sighup = match signal(SignalKind::hangup()) {
                    Ok(sighup) => sighup,
                    Err(e) => {
                        error!("Failed to register SIGHUP handler: {}", e);
                        return;
                    }
                };
                loop {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        recv = sighup.recv() => {
                            if recv.is_none() {
                                return;
                            }
                            let _ = events.send(HostEvent::Activate).await;
                        }
                    }
                }
            });
        }

        let events = self.events_tx.clone();
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("Received SIGINT signal (Ctrl+C)");
                        let _ = events.send(HostEvent::WillQuit).await;
                    }
                }
            }
        });
    }

    /// Listen for deferring processes and surface their command lines as
    /// advisory second-instance events. Listener failures are logged and
    /// never fatal.
    #[cfg(unix)]
    fn setup_second_instance_listener(&self, socket_path: PathBuf) {
        use tokio::io::AsyncReadExt;
        use tokio::net::UnixListener;

        let events = self.events_tx.clone();
        let token = self.cancellation_token.clone();
        tokio::spawn(async move {
            // A stale socket from a crashed run would block the bind.
            let _ = std::fs::remove_file(&socket_path);
            let listener = match UnixListener::bind(&socket_path) {
                Ok(listener) => listener,
                Err(e) => {
                    warn!(
                        "Second-instance notifications unavailable ({}): {}",
                        socket_path.display(),
                        e
                    );
                    return;
                }
            };
            debug!(
                "Listening for second instances on {}",
                socket_path.display()
            );

            loop {
                let mut stream = tokio::select! {
                    _ = token.cancelled() => return,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _)) => stream,
                        Err(e) => {
                            warn!("Second-instance accept failed: {}", e);
                            continue;
                        }
                    }
                };

                let mut payload = Vec::new();
                if let Err(e) = stream.read_to_end(&mut payload).await {
                    warn!("Second-instance read failed: {}", e);
                    continue;
                }
                match serde_json::from_slice::<Vec<String>>(&payload) {
                    Ok(command_line) => {
                        let _ = events.send(HostEvent::SecondInstance(command_line)).await;
                    }
                    Err(e) => warn!("Malformed second-instance payload: {}", e),
                }
            }
        });
    }

    #[cfg(not(unix))]
    fn setup_second_instance_listener(&self, _socket_path: PathBuf) {}
}
