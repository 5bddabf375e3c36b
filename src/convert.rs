use crate::args::CONVERT_COMMAND;
use crate::error::{Result, ZapError};
use crate::version;
use async_trait::async_trait;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tracing::{error, info};

/// Exit code when the child process could not be started at all.
pub const SPAWN_FAILURE_CODE: i32 = 1;

/// Command-line surface of the conversion launcher.
#[derive(Parser, Debug)]
#[command(name = "zap-convert")]
#[command(about = "Run a headless zap conversion and report its outcome")]
#[command(version)]
pub struct ConvertArgs {
    /// Specifies zcl metafile file to be used
    #[arg(short = 'z', long, value_name = "FILE")]
    pub zcl: Option<PathBuf>,

    /// Output filename where the converted file goes
    #[arg(short = 'o', long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Extra positional arguments forwarded verbatim to the child
    pub extra: Vec<String>,
}

/// Validated launcher options. Both paths are required; validation happens
/// before any version stamping or spawning.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub zcl: PathBuf,
    pub out: PathBuf,
    pub extra: Vec<String>,
}

impl TryFrom<ConvertArgs> for ConvertOptions {
    type Error = ZapError;

    fn try_from(args: ConvertArgs) -> Result<Self> {
        let zcl = args
            .zcl
            .ok_or_else(|| ZapError::usage("Missing required option: --zcl"))?;
        let out = args
            .out
            .ok_or_else(|| ZapError::usage("Missing required option: --out"))?;
        Ok(Self {
            zcl,
            out,
            extra: args.extra,
        })
    }
}

/// Deterministic child-process invocation: program path plus ordered
/// arguments. Built once per launcher run, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInvocationSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl ChildInvocationSpec {
    /// Build the headless conversion invocation: the application entry point,
    /// the conversion mode marker, fixed flags disabling UI and server, the
    /// input and output paths, then the extra positionals in original order.
    pub fn for_conversion(entry: &Path, options: &ConvertOptions) -> Self {
        let mut args = vec![
            CONVERT_COMMAND.to_string(),
            "--noUi".to_string(),
            "--noServer".to_string(),
            "--zcl".to_string(),
            options.zcl.to_string_lossy().into_owned(),
            "--out".to_string(),
            options.out.to_string_lossy().into_owned(),
        ];
        args.extend(options.extra.iter().cloned());
        Self {
            program: entry.to_path_buf(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Seam between the launcher and the operating system.
#[async_trait]
pub trait ProcessRunner: Send {
    /// Run the invocation to completion and return its exit code.
    async fn run(&mut self, spec: &ChildInvocationSpec) -> Result<i32>;
}

/// Spawns the child as an independent OS process inheriting the standard
/// streams, then awaits its termination. No cancellation: once launched, the
/// child runs to completion.
pub struct OsProcessRunner;

#[async_trait]
impl ProcessRunner for OsProcessRunner {
    async fn run(&mut self, spec: &ChildInvocationSpec) -> Result<i32> {
        let status = tokio::process::Command::new(spec.program())
            .args(spec.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        // A signal death carries no code; report it as the fixed failure.
        Ok(status.code().unwrap_or(SPAWN_FAILURE_CODE))
    }
}

/// Entry point of the application the launcher supervises: the `zap` binary
/// installed next to this executable.
pub fn default_entry() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.with_file_name("zap"))
}

/// Full launcher flow: validate, stamp the version, spawn, time, and map the
/// child's outcome to this process's exit code.
pub async fn launch<R: ProcessRunner>(
    args: ConvertArgs,
    entry: &Path,
    stamp_dir: &Path,
    runner: &mut R,
) -> Result<i32> {
    // Usage errors surface before any work starts.
    let options = ConvertOptions::try_from(args)?;
    run_conversion(entry, stamp_dir, &options, runner).await
}

pub async fn run_conversion<R: ProcessRunner>(
    entry: &Path,
    stamp_dir: &Path,
    options: &ConvertOptions,
    runner: &mut R,
) -> Result<i32> {
    // The child may depend on the stamp output, so this is awaited, not raced.
    version::stamp_version(stamp_dir).await?;

    let spec = ChildInvocationSpec::for_conversion(entry, options);
    info!(
        "Launching {} {}",
        spec.program().display(),
        spec.args().join(" ")
    );

    let start = Instant::now();
    match runner.run(&spec).await {
        Ok(0) => {
            let elapsed = start.elapsed();
            println!(
                "😎 All done: {}s, {}ms.",
                elapsed.as_secs(),
                elapsed.subsec_millis()
            );
            Ok(0)
        }
        Ok(code) => Ok(code),
        Err(e) => {
            error!("Failed to run conversion child: {}", e);
            Ok(SPAWN_FAILURE_CODE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct RecordingRunner {
        specs: Vec<ChildInvocationSpec>,
        exit_code: i32,
    }

    impl RecordingRunner {
        fn exiting_with(exit_code: i32) -> Self {
            Self {
                specs: Vec::new(),
                exit_code,
            }
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(&mut self, spec: &ChildInvocationSpec) -> Result<i32> {
            self.specs.push(spec.clone());
            Ok(self.exit_code)
        }
    }

    fn convert_options(zcl: &str, out: &str, extra: &[&str]) -> ConvertOptions {
        ConvertOptions {
            zcl: PathBuf::from(zcl),
            out: PathBuf::from(out),
            extra: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_child_invocation_vector_is_exact() {
        let options = convert_options("model.xml", "out.json", &[]);
        let spec = ChildInvocationSpec::for_conversion(Path::new("zap"), &options);
        assert_eq!(spec.program(), Path::new("zap"));
        assert_eq!(
            spec.args(),
            [
                "convert",
                "--noUi",
                "--noServer",
                "--zcl",
                "model.xml",
                "--out",
                "out.json"
            ]
        );
    }

    #[test]
    fn test_extra_positionals_keep_their_order() {
        let options = convert_options("model.xml", "out.json", &["a.xml", "b.xml"]);
        let spec = ChildInvocationSpec::for_conversion(Path::new("zap"), &options);
        assert_eq!(&spec.args()[7..], ["a.xml", "b.xml"]);
    }

    #[tokio::test]
    async fn test_missing_out_is_a_usage_error_with_zero_spawns() {
        let args = ConvertArgs {
            zcl: Some(PathBuf::from("model.xml")),
            out: None,
            extra: Vec::new(),
        };
        let dir = tempdir().unwrap();
        let mut runner = RecordingRunner::exiting_with(0);

        let result = launch(args, Path::new("zap"), dir.path(), &mut runner).await;
        assert!(matches!(result, Err(ZapError::Usage { .. })));
        assert!(runner.specs.is_empty());
    }

    #[tokio::test]
    async fn test_successful_child_maps_to_zero() {
        let options = convert_options("model.xml", "out.json", &[]);
        let dir = tempdir().unwrap();
        let mut runner = RecordingRunner::exiting_with(0);

        let code = run_conversion(Path::new("zap"), dir.path(), &options, &mut runner)
            .await
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(runner.specs.len(), 1);
        // The stamp is written before the spawn.
        assert!(dir.path().join(version::STAMP_FILE).exists());
    }

    #[tokio::test]
    async fn test_child_failure_code_propagates_unchanged() {
        let options = convert_options("model.xml", "out.json", &[]);
        let dir = tempdir().unwrap();
        let mut runner = RecordingRunner::exiting_with(3);

        let code = run_conversion(Path::new("zap"), dir.path(), &options, &mut runner)
            .await
            .unwrap();
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_runner_reports_real_exit_codes() {
        let dir = tempdir().unwrap();
        let mut runner = OsProcessRunner;

        let ok = ChildInvocationSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), "exit 0".to_string()],
        };
        assert_eq!(runner.run(&ok).await.unwrap(), 0);

        let failing = ChildInvocationSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };
        assert_eq!(runner.run(&failing).await.unwrap(), 3);

        // An unstartable program maps to the fixed failure code.
        let missing = ChildInvocationSpec {
            program: dir.path().join("does-not-exist"),
            args: Vec::new(),
        };
        let options = convert_options("model.xml", "out.json", &[]);
        let spec_dir = tempdir().unwrap();
        let code = run_conversion(&missing.program, spec_dir.path(), &options, &mut runner)
            .await
            .unwrap();
        assert_eq!(code, SPAWN_FAILURE_CODE);
    }

    #[test]
    fn test_args_require_both_paths() {
        let args = ConvertArgs::try_parse_from(["zap-convert", "--zcl", "model.xml"]).unwrap();
        assert!(ConvertOptions::try_from(args).is_err());

        let args = ConvertArgs::try_parse_from([
            "zap-convert",
            "-z",
            "model.xml",
            "-o",
            "out.json",
            "extra.xml",
        ])
        .unwrap();
        let options = ConvertOptions::try_from(args).unwrap();
        assert_eq!(options.extra, ["extra.xml"]);
    }
}
