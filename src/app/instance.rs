use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of the single lock-acquisition attempt made at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceLockResult {
    AcquiredNewLock,
    LockHeldByOther,
}

/// Whether this process may become the running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleDecision {
    Proceed,
    DeferAndExit,
}

/// Decide whether this process proceeds or defers to an existing instance.
///
/// With `reuse_instance` unset the lock result is observed but not binding:
/// multiple concurrent instances are permitted. With it set, only the lock
/// holder proceeds.
pub fn decide(reuse_instance: bool, lock_result: InstanceLockResult) -> LifecycleDecision {
    if !reuse_instance {
        return LifecycleDecision::Proceed;
    }
    match lock_result {
        InstanceLockResult::AcquiredNewLock => LifecycleDecision::Proceed,
        InstanceLockResult::LockHeldByOther => LifecycleDecision::DeferAndExit,
    }
}

/// OS-level single-instance lock over a well-known file.
///
/// Acquisition is a single non-blocking `flock` attempt; the lock is held for
/// the process lifetime by keeping the descriptor open and is released by the
/// OS when the process exits.
pub struct InstanceLock {
    path: PathBuf,
    // Held open to keep the flock; never read or written.
    _file: File,
    result: InstanceLockResult,
}

impl InstanceLock {
    /// Attempt to acquire the lock at `path`, exactly once, without blocking.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        let result = if try_flock(&file)? {
            info!("Acquired single-instance lock: {}", path.display());
            InstanceLockResult::AcquiredNewLock
        } else {
            debug!(
                "Single-instance lock already held: {}",
                path.display()
            );
            InstanceLockResult::LockHeldByOther
        };

        Ok(Self {
            path,
            _file: file,
            result,
        })
    }

    pub fn result(&self) -> InstanceLockResult {
        self.result
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_flock(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> std::io::Result<bool> {
    // No advisory lock support; every instance proceeds as the primary.
    Ok(true)
}

/// Notify the primary instance that another process attempted to start,
/// passing this process's command line for observability. Best-effort: the
/// primary may have exited between the lock check and this call.
#[cfg(unix)]
pub async fn notify_primary<P: AsRef<Path>>(socket_path: P, argv: &[String]) -> Result<()> {
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;

    let mut stream = UnixStream::connect(socket_path.as_ref()).await?;
    let mut payload = serde_json::to_vec(argv)?;
    payload.push(b'\n');
    stream.write_all(&payload).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(not(unix))]
pub async fn notify_primary<P: AsRef<Path>>(_socket_path: P, _argv: &[String]) -> Result<()> {
    Ok(())
}
