pub mod app;
pub mod args;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod startup;
pub mod version;
pub mod window;

pub use app::{
    decide, AppContext, AppLifecycle, AppRuntime, Flow, HostEvent, InstanceLock,
    InstanceLockResult, LifecycleDecision, LifecycleState,
};
pub use args::LaunchOptions;
pub use config::{RunMode, ZapConfig};
pub use convert::{ChildInvocationSpec, ConvertArgs, ConvertOptions, OsProcessRunner};
pub use db::DbConnection;
pub use error::{Result, ZapError};
pub use startup::{AppStartup, Startup};
pub use window::{HeadlessWindows, WindowManager};
