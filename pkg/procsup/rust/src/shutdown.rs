// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::warn;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep, timeout};

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(300);

/// Window between SIGTERM and SIGKILL on the default stop path.
const TERM_GRACE: Duration = Duration::from_secs(5);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn pid_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

pub(crate) fn send_signal(name: &str, pid: u32, sig: Signal) {
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), sig) {
        warn!("[{name}] failed to send {sig} to pid {pid}: {e}");
    }
}

/// Default termination path: SIGTERM, a short grace window, then SIGKILL if
/// the process is still around.
pub(crate) async fn terminate(name: &str, pid: u32) {
    send_signal(name, pid, Signal::SIGTERM);
    if wait_for_exit(pid, TERM_GRACE).await {
        return;
    }
    warn!(
        "[{name}] pid {pid} still alive {}s after SIGTERM, sending SIGKILL",
        TERM_GRACE.as_secs()
    );
    send_signal(name, pid, Signal::SIGKILL);
}

/// Block until `pid` leaves the process table or `stop_timeout` elapses.
///
/// A detached watcher reports the exit through a oneshot channel; that
/// notification is raced against the timer. On timeout the process is
/// forcefully killed.
pub(crate) async fn await_exit_or_kill(name: &str, pid: u32, stop_timeout: Duration) {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        while pid_alive(pid) {
            sleep(EXIT_POLL_INTERVAL).await;
        }
        let _ = tx.send(());
    });

    if timeout(stop_timeout, rx).await.is_err() {
        warn!(
            "[{name}] wait for pid {pid} to stop timed out ({}s), force kill",
            stop_timeout.as_secs()
        );
        send_signal(name, pid, Signal::SIGKILL);
    }
}

async fn wait_for_exit(pid: u32, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while pid_alive(pid) {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        sleep(EXIT_POLL_INTERVAL).await;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    async fn spawn_sleeper() -> (u32, tokio::process::Child) {
        let child = Command::new("sleep")
            .arg("60")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        (pid, child)
    }

    #[tokio::test]
    async fn test_pid_alive() {
        let (pid, mut child) = spawn_sleeper().await;
        assert!(pid_alive(pid));
        child.kill().await.unwrap();
        child.wait().await.unwrap();
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn test_terminate_graceful() {
        let (pid, mut child) = spawn_sleeper().await;
        terminate("t", pid).await;
        child.wait().await.unwrap();
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn test_terminate_escalates_to_sigkill() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 60"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        // Give the shell a moment to install the trap.
        sleep(Duration::from_millis(200)).await;

        terminate("stubborn", pid).await;
        child.wait().await.unwrap();
        assert!(!pid_alive(pid));
    }

    #[tokio::test]
    async fn test_await_exit_notification_wins() {
        let (pid, mut child) = spawn_sleeper().await;
        let waiter = await_exit_or_kill("t", pid, Duration::from_secs(30));
        let killer = async {
            sleep(Duration::from_millis(300)).await;
            child.kill().await.unwrap();
            child.wait().await.unwrap();
        };
        let start = std::time::Instant::now();
        tokio::join!(waiter, killer);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_await_exit_timeout_force_kills() {
        let (pid, mut child) = spawn_sleeper().await;
        await_exit_or_kill("t", pid, Duration::from_millis(300)).await;
        child.wait().await.unwrap();
        assert!(!pid_alive(pid));
    }
}
