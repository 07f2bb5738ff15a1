//! Daemoniser double that stays in the current process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{DaemonContext, DaemonizeError, Daemonizer, DetachPlan};

/// PID the double writes, standing in for the detached child's identifier.
pub const FACILITY_PID: u32 = 424_242;

#[derive(Clone)]
pub struct TestDaemonizer {
    supported: bool,
    fail: bool,
    calls: Arc<AtomicUsize>,
    workspaces: Arc<Mutex<Vec<PathBuf>>>,
}

impl TestDaemonizer {
    pub fn supported() -> Self {
        Self {
            supported: true,
            fail: false,
            calls: Arc::default(),
            workspaces: Arc::default(),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::supported()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::supported()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.workspaces
            .lock()
            .expect("workspace log poisoned")
            .clone()
    }
}

impl Daemonizer for TestDaemonizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn daemonize(&self, plan: &DetachPlan<'_>) -> Result<DaemonContext, DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.workspaces
            .lock()
            .expect("workspace log poisoned")
            .push(plan.workspace().to_path_buf());
        if self.fail {
            return Err(DaemonizeError::Unsupported);
        }
        plan.pid_file()
            .write_pid(FACILITY_PID)
            .expect("facility double should write the pid file");
        Ok(DaemonContext::new(plan.pid_file().clone()))
    }
}
