mod context;
mod instance;
mod lifecycle;
mod runtime;
mod shutdown;


pub use context::{AppContext, TeardownHandler};
pub use instance::{decide, notify_primary, InstanceLock, InstanceLockResult, LifecycleDecision};
pub use lifecycle::{window_all_closed_flow, AppLifecycle, Flow, HostEvent, LifecycleState};
pub use runtime::AppRuntime;
