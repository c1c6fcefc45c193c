// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Per-process supervisor primitive.
//!
//! Launches an external command, tracks its pid through an on-disk pid
//! marker written by the child itself, verifies liveness against the OS
//! process table, and tears the process down with a bounded escalation to
//! SIGKILL. A data marker persisted next to the pid marker lets a
//! supervising program reload its bookkeeping after its own restart and
//! decide, via [`SupervisedProcess::needs_restart`], which children died
//! while it was away.

pub mod config;
pub mod error;
pub mod hooks;
pub mod inspect;
mod persist;
pub mod process;
pub mod shutdown;

pub use config::SupervisorDirs;
pub use error::{Result, SupervisorError};
pub use hooks::LifecycleHook;
pub use process::{START_GRACE, SupervisedProcess};
pub use shutdown::DEFAULT_STOP_TIMEOUT;
