// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use dd_procsup::{SupervisedProcess, SupervisorDirs};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::Once;
use std::time::{Duration, Instant};

static INIT_LOGGER: Once = Once::new();

pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = simple_logger::init_with_level(log::Level::Debug);
    });
}

/// A shell child that writes its own pid marker the way real supervised
/// binaries do, then runs `script_tail` (default `sleep 300`).
///
/// The command is `sh` so that the executable-name check in `check_alive`
/// matches ("dash" and "bash" both contain "sh").
pub fn shell_child(dirs: &SupervisorDirs, kind: &str, script_tail: &str) -> SupervisedProcess {
    let mut proc = SupervisedProcess::new(dirs, "sh", kind);
    let script = format!("echo $$ > {}; {script_tail}", proc.pid_path().display());
    proc.add_args(["-c", &script]);
    proc
}

pub fn sleeper_child(dirs: &SupervisorDirs, kind: &str) -> SupervisedProcess {
    shell_child(dirs, kind, "sleep 300")
}

pub fn pid_is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

pub fn kill_pid(pid: u32) {
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

/// Wait until a PID is no longer alive, or timeout.
pub fn wait_for_pid_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !pid_is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
