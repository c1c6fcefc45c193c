// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::{Result, SupervisorError};
use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;
use sysinfo::{Pid as SysPid, ProcessesToUpdate, System};

/// A process found in the OS process table.
#[derive(Debug, Clone)]
pub struct OsProcess {
    /// Executable name as reported by the OS (short name, not the full path).
    pub name: String,
}

/// Look up `pid` in the OS process table.
///
/// `Ok(None)` means no such process; a `Query` error is reserved for a
/// genuine probe failure and never stands in for "not found".
pub fn find_process(pid: u32) -> Result<Option<OsProcess>> {
    // Signal 0 probes existence without delivering anything. EPERM still
    // means the pid is live, just owned by someone else.
    match signal::kill(Pid::from_raw(pid as i32), None) {
        Err(Errno::ESRCH) => return Ok(None),
        Ok(()) | Err(Errno::EPERM) => {}
        Err(e) => {
            return Err(SupervisorError::Query {
                pid,
                reason: e.to_string(),
            });
        }
    }

    let sys_pid = SysPid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);

    // The process can exit between the probe and the refresh; that is a
    // plain "not found", not an error.
    Ok(sys.process(sys_pid).map(|p| OsProcess {
        name: p.name().to_string_lossy().into_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_own_process() {
        let found = find_process(std::process::id()).unwrap();
        let proc = found.expect("own pid should be in the process table");
        assert!(!proc.name.is_empty());
    }

    #[test]
    fn test_find_nonexistent_pid() {
        // Linux pid_max defaults stay well below this.
        let found = find_process(4_000_000).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_init_name() {
        // pid 1 always exists; we may not own it, which exercises the EPERM
        // branch of the probe.
        let found = find_process(1).unwrap();
        assert!(found.is_some());
    }
}
