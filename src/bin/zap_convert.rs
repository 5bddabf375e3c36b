use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zap::convert::{self, ConvertArgs, OsProcessRunner};
use zap::ZapError;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zap=info")),
        )
        .init();

    let args = ConvertArgs::parse();
    let entry = convert::default_entry()?;
    let stamp_dir = std::env::current_dir()?;

    let mut runner = OsProcessRunner;
    match convert::launch(args, &entry, &stamp_dir, &mut runner).await {
        Ok(code) => std::process::exit(code),
        Err(ZapError::Usage { message }) => {
            eprintln!("{}", message);
            eprintln!("Please provide required options!");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
