// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The OS refused to launch the child (missing binary, permissions, ...).
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The pid marker could not be read back after the start grace period.
    #[error("startup verification failed, pid file {path}: {reason}")]
    StartupVerification { path: PathBuf, reason: String },

    /// The child spawned and wrote a pid, but that pid is not alive.
    #[error("started pid {pid} ({kind}) but it is not alive")]
    NotAlive { pid: u32, kind: String },

    /// A caller-supplied post-start hook failed; start aborts unpersisted.
    #[error("post-start hook failed for pid {pid} ({kind}): {source}")]
    PostStartHook {
        pid: u32,
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    /// Writing the data marker failed. The process itself is left as-is.
    #[error("persisting state to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// On-disk data or pid marker content is unreadable or malformed.
    #[error("corrupt state in {path}: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    /// The OS process table could not be queried. Distinct from "not found".
    #[error("process table query for pid {pid} failed: {reason}")]
    Query { pid: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
