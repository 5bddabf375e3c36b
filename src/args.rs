use clap::Parser;
use std::path::PathBuf;

/// Mode marker selecting headless conversion mode.
pub const CONVERT_COMMAND: &str = "convert";

/// Resolved command-line options for the main entry point.
///
/// Immutable once parsed; created once per process start and owned by the
/// process for its lifetime. The long option names keep the camelCase surface
/// the tool has always exposed.
#[derive(Parser, Debug, Clone)]
#[command(name = "zap")]
#[command(about = "ZCL configuration tool")]
#[command(version)]
pub struct LaunchOptions {
    /// Commands selecting the run mode ("convert" runs a headless conversion
    /// and exits); remaining positionals are passed through to the startup
    /// collaborator in their original order
    pub commands: Vec<String>,

    /// HTTP server port
    #[arg(long = "httpPort", value_name = "PORT", default_value_t = 9070)]
    pub http_port: u16,

    /// Defer to an already-running instance instead of starting a new one
    #[arg(long = "reuseInstance")]
    pub reuse_instance: bool,

    /// Do not open any user interface
    #[arg(long = "noUi")]
    pub no_ui: bool,

    /// Do not start the HTTP server
    #[arg(long = "noServer")]
    pub no_server: bool,

    /// ZCL metafile to be used
    #[arg(short = 'z', long = "zcl", value_name = "FILE")]
    pub zcl_file: Option<PathBuf>,

    /// Output file for the converted result
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub out_file: Option<PathBuf>,

    /// Print the default configuration in TOML format and exit
    #[arg(long = "dumpConfig")]
    pub dump_config: bool,
}

impl LaunchOptions {
    /// Parse the current process arguments.
    pub fn from_process_args() -> Self {
        Self::parse()
    }

    /// True when the headless conversion mode marker is present.
    pub fn is_convert(&self) -> bool {
        self.commands.first().map(String::as_str) == Some(CONVERT_COMMAND)
    }

    /// Positional arguments following the mode marker, in original order.
    pub fn passthrough(&self) -> &[String] {
        if self.is_convert() {
            &self.commands[1..]
        } else {
            &self.commands
        }
    }
}
