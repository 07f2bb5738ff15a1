//! Observable stand-ins for the application's main routine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

/// Temporary directory holding the PID file under test.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir should be created"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.path().join("service.pid")
    }

    pub fn write_pid_text(&self, content: &str) {
        fs::write(self.pid_path(), content).expect("pid fixture should be written");
    }

    pub fn read_pid_text(&self) -> Option<String> {
        fs::read_to_string(self.pid_path()).ok()
    }
}

/// Records invocations of a main routine and what it saw on disk.
#[derive(Clone, Default)]
pub struct MainRecorder {
    calls: Arc<AtomicUsize>,
    observed: Arc<Mutex<Option<String>>>,
}

impl MainRecorder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// PID file contents observed while the routine was running.
    pub fn observed(&self) -> Option<String> {
        self.observed.lock().expect("recorder poisoned").clone()
    }

    /// Main routine that records the PID file content and succeeds.
    pub fn succeeding(&self, pid_path: &Path) -> impl FnOnce() -> Result<(), io::Error> + use<> {
        let recorder = self.clone();
        let path = pid_path.to_path_buf();
        move || {
            recorder.record(&path);
            Ok(())
        }
    }

    /// Main routine that records the PID file content and then fails.
    pub fn failing(&self, pid_path: &Path) -> impl FnOnce() -> Result<(), io::Error> + use<> {
        let recorder = self.clone();
        let path = pid_path.to_path_buf();
        move || {
            recorder.record(&path);
            Err(io::Error::other("main routine failed"))
        }
    }

    fn record(&self, pid_path: &Path) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.observed.lock().expect("recorder poisoned") = fs::read_to_string(pid_path).ok();
    }
}
