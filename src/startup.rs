use crate::app::AppContext;
use crate::error::{Result, ZapError};
use async_trait::async_trait;
use tracing::info;

/// Startup collaborator invoked once the host runtime reports readiness
/// (interactive path) or directly from the headless entry point.
///
/// The conversion/generation engine, HTTP server, and UI wiring live behind
/// this contract; the bootstrap layer only sequences the call and treats a
/// failure as fatal.
#[async_trait]
pub trait Startup: Send + Sync {
    async fn start_up(&self, ctx: &mut AppContext, interactive: bool) -> Result<()>;
}

/// Production startup seam.
///
/// Validates the headless conversion preconditions and hands the resolved
/// options to the engine. The engine itself is an external collaborator; what
/// belongs to the bootstrap is the argument contract and the failure policy.
pub struct AppStartup;

#[async_trait]
impl Startup for AppStartup {
    async fn start_up(&self, ctx: &mut AppContext, interactive: bool) -> Result<()> {
        info!(
            "Starting up, interactive: {}, mode: {:?}",
            interactive, ctx.mode
        );

        if ctx.options.is_convert() {
            let zcl = ctx
                .options
                .zcl_file
                .clone()
                .ok_or_else(|| ZapError::startup("Conversion requires --zcl"))?;
            let out = ctx
                .options
                .out_file
                .clone()
                .ok_or_else(|| ZapError::startup("Conversion requires --out"))?;

            info!(
                "Headless conversion: {} -> {}",
                zcl.display(),
                out.display()
            );
            for extra in ctx.options.passthrough() {
                info!("Additional conversion input: {}", extra);
            }
            return Ok(());
        }

        if !ctx.options.no_server {
            info!("HTTP server requested on port {}", ctx.options.http_port);
        }
        if !ctx.options.no_ui {
            info!("UI requested");
        }
        Ok(())
    }
}
