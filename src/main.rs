use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

use zap::app::notify_primary;
use zap::startup::Startup;
use zap::{
    AppContext, AppLifecycle, AppRuntime, AppStartup, HeadlessWindows, InstanceLock,
    LaunchOptions, LifecycleDecision, RunMode, ZapConfig,
};

const CONFIG_FILE: &str = "zap.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let options = LaunchOptions::from_process_args();
    let mode = RunMode::from_env();

    if options.dump_config {
        print!("{}", ZapConfig::default().to_toml()?);
        return Ok(());
    }

    let config = ZapConfig::load_from_file(CONFIG_FILE)?;
    config.validate()?;

    let log_guard = init_logging(mode, &config)?;
    info!("Starting zap v{} ({:?})", env!("CARGO_PKG_VERSION"), mode);
    info!("Configuration file: {}", CONFIG_FILE);

    let exit_code = run(mode, config, options).await;

    // The appender worker must flush before the process terminates, so the
    // guard is dropped ahead of the exit call.
    drop(log_guard);
    std::process::exit(exit_code?);
}

/// Full application flow, returning the process exit code instead of exiting
/// so callers can release resources first.
async fn run(mode: RunMode, config: ZapConfig, options: LaunchOptions) -> Result<i32> {
    if options.is_convert() {
        // Headless conversion mode: no instance lock, no lifecycle hooks.
        // This is the child process the conversion launcher spawns.
        return Ok(run_headless(mode, config, options).await);
    }

    // The lock attempt happens exactly once, before any hook is registered,
    // regardless of whether the result is binding.
    let lock = InstanceLock::acquire(config.lock_path())?;
    match zap::decide(options.reuse_instance, lock.result()) {
        LifecycleDecision::Proceed => {}
        LifecycleDecision::DeferAndExit => {
            let argv: Vec<String> = std::env::args().collect();
            if let Err(e) = notify_primary(config.socket_path(), &argv).await {
                debug!("Could not notify primary instance: {}", e);
            }
            println!("🧐 Existing instance of zap will service this request.");
            // Deferring is not an error.
            return Ok(0);
        }
    }

    let ctx = AppContext::new(mode, config, options);
    let lifecycle = AppLifecycle::new(ctx, Arc::new(AppStartup), Arc::new(HeadlessWindows::new()));
    let runtime = AppRuntime::new(lifecycle, lock);

    let exit_code = runtime.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("Zap exited with code: {}", exit_code);
    Ok(exit_code)
}

/// Non-interactive run: invoke the startup collaborator directly, then run
/// the shutdown sequencer and report the exit code.
async fn run_headless(mode: RunMode, config: ZapConfig, options: LaunchOptions) -> i32 {
    let mut ctx = AppContext::new(mode, config, options);

    let exit_code = match AppStartup.start_up(&mut ctx, false).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Startup failed: {}", e);
            1
        }
    };

    ctx.shutdown();
    exit_code
}

fn init_logging(
    mode: RunMode,
    config: &ZapConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zap={}", mode.default_log_level())));

    std::fs::create_dir_all(config.state_dir())?;
    let log_path = config.log_path();
    let file_appender = tracing_appender::rolling::never(
        config.state_dir(),
        log_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "zap.log".to_string()),
    );
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let layers = vec![
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(mode == RunMode::Development)
            .boxed(),
        fmt::layer().with_ansi(false).with_writer(file_writer).boxed(),
    ];

    tracing_subscriber::registry().with(layers).with(env_filter).init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn options(argv: &[&str]) -> LaunchOptions {
        let mut full = vec!["zap"];
        full.extend_from_slice(argv);
        LaunchOptions::try_parse_from(full).unwrap()
    }

    #[tokio::test]
    async fn test_headless_success_returns_zero() {
        let options = options(&[
            "convert",
            "--noUi",
            "--noServer",
            "--zcl",
            "model.xml",
            "--out",
            "out.json",
        ]);
        let code = run_headless(RunMode::Production, ZapConfig::default(), options).await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_headless_startup_failure_returns_one() {
        // Missing --zcl/--out fails startup; the code comes back to the
        // caller so cleanup can happen before the process exits.
        let options = options(&["convert", "--noUi", "--noServer"]);
        let code = run_headless(RunMode::Production, ZapConfig::default(), options).await;
        assert_eq!(code, 1);
    }
}
