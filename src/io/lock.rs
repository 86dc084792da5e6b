use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";
const DEFAULT_WAIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error type for the data directory write lock
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("data directory is busy ({path} held for {waited:?}); another tc is writing")]
    Busy { path: PathBuf, waited: Duration },
    #[error("flock on {path} failed: {source}")]
    Flock {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Exclusive advisory lock on `<data-dir>/.lock`, held by write commands
/// for as long as they read, modify and rewrite the store.
///
/// The lock file is never removed. Every process locks the same inode, and
/// the flock is released when the handle closes.
#[derive(Debug)]
pub struct WriteLock {
    _file: File,
    path: PathBuf,
}

impl WriteLock {
    /// Take the lock, polling until `patience` runs out.
    pub fn acquire(data_dir: &Path, patience: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = open_lock_file(&path)?;

        let started = Instant::now();
        while !try_flock(&file).map_err(|source| LockError::Flock {
            path: path.clone(),
            source,
        })? {
            let waited = started.elapsed();
            if waited >= patience {
                return Err(LockError::Busy { path, waited });
            }
            thread::sleep(POLL_INTERVAL);
        }

        tracing::debug!(
            path = %path.display(),
            waited_ms = started.elapsed().as_millis() as u64,
            "write lock taken"
        );
        Ok(WriteLock { _file: file, path })
    }

    /// Take the lock, waiting up to five seconds.
    pub fn wait(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    let open = || {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
    };
    open().map_err(|source| LockError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// `Ok(false)` while another handle holds the lock.
#[cfg(unix)]
fn try_flock(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    // SAFETY: the descriptor belongs to `file`, which outlives the call.
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    match err.kind() {
        ErrorKind::WouldBlock => Ok(false),
        _ => Err(err),
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> std::io::Result<bool> {
    Ok(true)
}
