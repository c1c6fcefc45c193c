// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::process::SupervisedProcess;

/// Caller-injected behavior run against a supervised process: after a
/// verified start, or in place of the default signal-based stop. Absence of
/// a hook means "use the default behavior".
pub trait LifecycleHook: Send + Sync {
    fn run(&self, proc: &SupervisedProcess) -> anyhow::Result<()>;
}

impl<F> LifecycleHook for F
where
    F: Fn(&SupervisedProcess) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, proc: &SupervisedProcess) -> anyhow::Result<()> {
        self(proc)
    }
}
