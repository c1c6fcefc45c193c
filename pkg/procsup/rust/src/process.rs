// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::SupervisorDirs;
use crate::error::{Result, SupervisorError};
use crate::hooks::LifecycleHook;
use crate::inspect::find_process;
use crate::persist::write_file_atomic;
use crate::shutdown::{DEFAULT_STOP_TIMEOUT, await_exit_or_kill, terminate};
use log::{debug, info, warn};
use scopeguard::defer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, sleep};

/// How long a freshly spawned child gets to write its own pid marker before
/// we read it back.
pub const START_GRACE: Duration = Duration::from_secs(3);

/// A single supervised child process.
///
/// The entity owns identity and launch configuration; the child's pid is
/// volatile state re-derived from the pid marker file, which the child
/// writes itself (it may fork or daemonize after spawn). The data marker
/// holds everything except the pid.
#[derive(Serialize, Deserialize)]
pub struct SupervisedProcess {
    pub id: String,

    /// Free-form tag ("proxy", "cache", ...) used for naming and logging only.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "name")]
    pub command: String,

    pub args: Vec<String>,

    /// Caller metadata, opaque to the supervisor.
    pub ctx: HashMap<String, String>,

    // Never persisted: the pid marker file is the single source of truth.
    #[serde(skip)]
    pid: Option<u32>,

    #[serde(skip)]
    dirs: SupervisorDirs,

    #[serde(skip)]
    post_start_hook: Option<Box<dyn LifecycleHook>>,

    #[serde(skip)]
    stop_hook: Option<Box<dyn LifecycleHook>>,

    #[serde(skip)]
    stop_timeout: Option<Duration>,
}

impl SupervisedProcess {
    /// Fresh entity with a newly generated id, empty args and ctx, no hooks.
    pub fn new(dirs: &SupervisorDirs, command: &str, kind: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind: kind.to_string(),
            command: command.to_string(),
            args: Vec::new(),
            ctx: HashMap::new(),
            pid: None,
            dirs: dirs.clone(),
            post_start_hook: None,
            stop_hook: None,
            stop_timeout: None,
        }
    }

    /// Rehydrate an entity from its data marker.
    ///
    /// A data marker without a pid marker is an orphaned record: there is no
    /// live process to track, so the data marker is deleted and `Ok(None)`
    /// is returned. A pid marker that cannot be read or parsed is
    /// `CorruptState`.
    pub fn load(dirs: &SupervisorDirs, data_path: &Path) -> Result<Option<Self>> {
        let raw =
            std::fs::read_to_string(data_path).map_err(|e| SupervisorError::CorruptState {
                path: data_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let mut proc: Self =
            serde_json::from_str(&raw).map_err(|e| SupervisorError::CorruptState {
                path: data_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        proc.dirs = dirs.clone();

        if !proc.pid_path().exists() {
            info!(
                "[{}] pid file {} does not exist, dropping stale record",
                proc.base_name(),
                proc.pid_path().display()
            );
            let _ = std::fs::remove_file(data_path);
            return Ok(None);
        }

        let pid = proc
            .read_pid_file()
            .map_err(|reason| SupervisorError::CorruptState {
                path: proc.pid_path(),
                reason,
            })?;
        proc.pid = Some(pid);
        Ok(Some(proc))
    }

    /// Scan the data directory for `*.dat` markers and load each, dropping
    /// orphans and skipping corrupt entries with a warning.
    pub fn load_all(dirs: &SupervisorDirs) -> anyhow::Result<Vec<Self>> {
        use anyhow::Context;

        let entries = std::fs::read_dir(&dirs.data_dir).with_context(|| {
            format!("failed to read data directory: {}", dirs.data_dir.display())
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "dat"))
            .collect();
        paths.sort();

        let mut procs = Vec::new();
        for path in paths {
            match Self::load(dirs, &path) {
                Ok(Some(proc)) => procs.push(proc),
                Ok(None) => {}
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(procs)
    }

    /// Launch the child and run the startup handshake.
    ///
    /// The child is expected to write its own pid to the pid marker path
    /// within [`START_GRACE`]; only after the pid reads back and the process
    /// verifies alive (and the post-start hook, if any, succeeds) is state
    /// persisted.
    pub async fn start(&mut self) -> Result<()> {
        if self.command.is_empty() {
            return Err(SupervisorError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let mut child = cmd.spawn().map_err(|e| SupervisorError::Spawn {
            command: self.command.clone(),
            source: e,
        })?;

        // Detached reaper: releases the process table entry when the child
        // eventually exits. The result is deliberately discarded; liveness
        // is judged from the pid marker and the process table, not from this
        // handle.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        info!(
            "[{}] waiting {}s for {} to write its pid file",
            self.base_name(),
            START_GRACE.as_secs(),
            self.kind
        );
        sleep(START_GRACE).await;

        let pid =
            self.read_pid_file()
                .map_err(|reason| SupervisorError::StartupVerification {
                    path: self.pid_path(),
                    reason,
                })?;
        self.pid = Some(pid);

        if !self.check_alive()? {
            return Err(SupervisorError::NotAlive {
                pid,
                kind: self.kind.clone(),
            });
        }

        if let Some(hook) = &self.post_start_hook {
            hook.run(self)
                .map_err(|source| SupervisorError::PostStartHook {
                    pid,
                    kind: self.kind.clone(),
                    source,
                })?;
        }

        self.persist()?;
        info!("[{}] started (pid={pid})", self.base_name());
        Ok(())
    }

    /// Best-effort, idempotent termination. Marker cleanup runs on every
    /// exit path; only the initial liveness query can fail.
    pub async fn stop(&self) -> Result<()> {
        let alive = self.check_alive()?;
        let name = self.base_name();

        defer! {
            self.clear();
        }

        if !alive {
            debug!("[{name}] not alive, clearing markers");
            return Ok(());
        }
        let Some(pid) = self.pid else {
            return Ok(());
        };

        if let Some(hook) = &self.stop_hook {
            if let Err(e) = hook.run(self) {
                warn!("[{name}] stop hook failed for pid {pid}: {e:#}, falling back to signals");
                terminate(&name, pid).await;
            }
        } else {
            terminate(&name, pid).await;
        }

        await_exit_or_kill(&name, pid, self.stop_timeout()).await;
        info!("[{name}] stopped (pid={pid})");
        Ok(())
    }

    /// Is the recorded pid a live process whose executable name matches the
    /// configured command? A live pid with a non-matching executable name is
    /// reported dead: the pid has been reused by an unrelated process.
    pub fn check_alive(&self) -> Result<bool> {
        let Some(pid) = self.pid else {
            return Ok(false);
        };
        match find_process(pid)? {
            None => Ok(false),
            Some(proc) => {
                if proc.name.contains(self.command.as_str()) {
                    Ok(true)
                } else {
                    warn!(
                        "[{}] pid {pid} exists but executable is {}, not {} (pid reuse)",
                        self.base_name(),
                        proc.name,
                        self.command
                    );
                    Ok(false)
                }
            }
        }
    }

    /// A pid marker left on disk means the process was started and never
    /// cleanly stopped; if it is not alive anymore, the orchestrator should
    /// relaunch it.
    pub fn needs_restart(&self) -> bool {
        self.pid_path().exists()
    }

    /// Serialize everything except the pid to the data marker, atomically.
    pub fn persist(&self) -> Result<()> {
        let data = serde_json::to_vec(self).map_err(|e| SupervisorError::Persistence {
            path: self.data_path(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        write_file_atomic(&self.data_path(), &data).map_err(|source| {
            SupervisorError::Persistence {
                path: self.data_path(),
                source,
            }
        })?;
        debug!("[{}] persisted to {}", self.base_name(), self.data_path().display());
        Ok(())
    }

    /// Remove pid and data markers, ignoring errors.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(self.pid_path());
        let _ = std::fs::remove_file(self.data_path());
    }

    pub fn add_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    pub fn insert_ctx(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ctx.insert(key.into(), value.into());
    }

    pub fn set_post_start_hook(&mut self, hook: impl LifecycleHook + 'static) {
        self.post_start_hook = Some(Box::new(hook));
    }

    pub fn set_stop_hook(&mut self, hook: impl LifecycleHook + 'static) {
        self.stop_hook = Some(Box::new(hook));
    }

    pub fn set_stop_timeout(&mut self, timeout: Duration) {
        self.stop_timeout = Some(timeout);
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn base_name(&self) -> String {
        format!("{}_{}", self.kind, self.id)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dirs.data_dir.join(format!("{}.pid", self.base_name()))
    }

    pub fn data_path(&self) -> PathBuf {
        self.dirs.data_dir.join(format!("{}.dat", self.base_name()))
    }

    /// Where the child should send its output; the supervisor itself never
    /// writes here.
    pub fn log_path(&self) -> PathBuf {
        self.dirs.log_dir.join(format!("{}.log", self.base_name()))
    }

    fn stop_timeout(&self) -> Duration {
        self.stop_timeout.unwrap_or(DEFAULT_STOP_TIMEOUT)
    }

    fn read_pid_file(&self) -> std::result::Result<u32, String> {
        let path = self.pid_path();
        let raw = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
        raw.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid pid {:?}: {e}", raw.trim()))
    }

    #[cfg(test)]
    pub(crate) fn set_pid(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }
}
