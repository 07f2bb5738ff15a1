//! Serialises tests that depend on the process working directory.

use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Holds the working-directory lock and restores the directory on drop.
pub struct CwdGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl CwdGuard {
    pub fn lock() -> Self {
        let lock = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            original: env::current_dir().expect("current dir should resolve"),
            _lock: lock,
        }
    }

    pub fn original(&self) -> &PathBuf {
        &self.original
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.original);
    }
}
