//! `mockall` double for the process table.

use mockall::mock;

use crate::{LifecycleError, ProcessControl, StopSignal};

mock! {
    pub Process {}
    impl ProcessControl for Process {
        fn is_running(&self, pid: u32) -> Result<bool, LifecycleError>;
        fn signal(&self, pid: u32, signal: StopSignal) -> Result<(), LifecycleError>;
    }
}
