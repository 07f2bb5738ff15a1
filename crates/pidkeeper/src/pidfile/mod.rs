//! PID file store.
//!
//! A PID file holds the decimal identifier of one process on its first line
//! and nothing else. The store performs no locking: concurrent writers to the
//! same path race and the last rename wins. An empty path is treated as "no
//! PID file" by every operation, which lets callers thread an optional path
//! through without branching.

mod files;

use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use files::{check_writable_dir, replace_file};

const PIDFILE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pidfile");

/// Errors raised while reading, writing, or removing a PID file.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The PID file exists but could not be read.
    #[error("failed to read pid file '{path}': {source}")]
    Read {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The first line of the PID file is not a decimal process identifier.
    #[error("failed to parse pid file '{path}': {content:?} is not a process id")]
    Parse {
        /// PID file path.
        path: PathBuf,
        /// Offending first line, trimmed.
        content: String,
        /// Underlying parse error.
        #[source]
        source: ParseIntError,
    },
    /// Creating or replacing the PID file failed.
    #[error("failed to write pid file '{path}': {source}")]
    Write {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Deleting the PID file failed for a reason other than it being absent.
    #[error("failed to remove pid file '{path}': {source}")]
    Remove {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Handle on a PID file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Wraps `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the PID file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Returns true when the path is empty and all operations are no-ops.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Reads the recorded PID.
    ///
    /// Returns `Ok(None)` when the path is empty, does not name a regular
    /// file, or the first line is blank or `0`.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Read`] when the file cannot be read and
    /// [`PidFileError::Parse`] when its first line is not a base-10 integer.
    pub fn load(&self) -> Result<Option<u32>, PidFileError> {
        if self.is_unset() {
            return Ok(None);
        }
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Ok(None),
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PidFileError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        }
        let content = fs::read_to_string(&self.path).map_err(|source| PidFileError::Read {
            path: self.path.clone(),
            source,
        })?;
        let first_line = content.lines().next().unwrap_or_default().trim();
        if first_line.is_empty() {
            return Ok(None);
        }
        let pid = first_line
            .parse::<u32>()
            .map_err(|source| PidFileError::Parse {
                path: self.path.clone(),
                content: first_line.to_owned(),
                source,
            })?;
        debug!(
            target: PIDFILE_TARGET,
            pid,
            file = %self.path.display(),
            "loaded pid file"
        );
        Ok((pid != 0).then_some(pid))
    }

    /// Records the calling process's identifier and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Write`] when the file cannot be replaced.
    pub fn write(&self) -> Result<u32, PidFileError> {
        let pid = std::process::id();
        self.write_pid(pid)?;
        Ok(pid)
    }

    /// Records an arbitrary PID.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Write`] when the file cannot be replaced.
    pub fn write_pid(&self, pid: u32) -> Result<(), PidFileError> {
        if self.is_unset() {
            return Ok(());
        }
        replace_file(&self.path, pid.to_string().as_bytes()).map_err(|source| {
            PidFileError::Write {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(
            target: PIDFILE_TARGET,
            pid,
            file = %self.path.display(),
            "pid file written"
        );
        Ok(())
    }

    /// Confirms that the PID file's directory accepts new files.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Write`] when the directory is missing or not
    /// writable.
    pub fn ensure_writable(&self) -> Result<(), PidFileError> {
        if self.is_unset() {
            return Ok(());
        }
        check_writable_dir(&self.path).map_err(|source| PidFileError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Deletes the PID file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Remove`] for any failure other than the file
    /// being absent.
    pub fn clean(&self) -> Result<(), PidFileError> {
        if self.is_unset() {
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(
                    target: PIDFILE_TARGET,
                    file = %self.path.display(),
                    "pid file removed"
                );
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PidFileError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Scoped ownership of a PID file.
///
/// The file is removed by [`PidFileGuard::release`] or, failing that, when the
/// guard is dropped. Dropping covers early returns and unwinding panics.
#[derive(Debug)]
pub struct PidFileGuard {
    pid_file: Option<PidFile>,
    pid: u32,
}

impl PidFileGuard {
    /// Writes the current PID to `pid_file` and takes ownership of it.
    ///
    /// Without a PID file the guard only records the PID.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Write`] when the file cannot be written.
    pub fn acquire(pid_file: Option<PidFile>) -> Result<Self, PidFileError> {
        let pid = match pid_file.as_ref() {
            Some(file) => file.write()?,
            None => std::process::id(),
        };
        Ok(Self { pid_file, pid })
    }

    /// Takes ownership of a PID file that another party already wrote.
    #[must_use]
    pub fn adopt(pid_file: PidFile) -> Self {
        Self {
            pid_file: Some(pid_file),
            pid: std::process::id(),
        }
    }

    /// PID of the owning process.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Removes the PID file now, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError::Remove`] when the file cannot be deleted.
    pub fn release(mut self) -> Result<(), PidFileError> {
        match self.pid_file.take() {
            Some(file) => file.clean(),
            None => Ok(()),
        }
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Some(file) = self.pid_file.take()
            && let Err(error) = file.clean()
        {
            warn!(
                target: PIDFILE_TARGET,
                file = %file.path().display(),
                error = %error,
                "failed to remove pid file"
            );
        }
    }
}
