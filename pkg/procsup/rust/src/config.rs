// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "/opt/datadog-agent/run";
const DEFAULT_LOG_DIR: &str = "/var/log/datadog";

/// The two directories a supervisor set works out of: one for pid and data
/// marker files, one for child log files. Fixed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorDirs {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl SupervisorDirs {
    pub fn new(data_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Resolve directories from `DD_PS_DATA_DIR` / `DD_PS_LOG_DIR`, falling
    /// back to the packaged defaults.
    pub fn from_env() -> Self {
        Self {
            data_dir: env_path("DD_PS_DATA_DIR", DEFAULT_DATA_DIR),
            log_dir: env_path("DD_PS_LOG_DIR", DEFAULT_LOG_DIR),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_paths() {
        let dirs = SupervisorDirs::new("/tmp/run", "/tmp/log");
        assert_eq!(dirs.data_dir(), Path::new("/tmp/run"));
        assert_eq!(dirs.log_dir(), Path::new("/tmp/log"));
    }

    #[test]
    fn test_default_is_empty() {
        let dirs = SupervisorDirs::default();
        assert_eq!(dirs.data_dir(), Path::new(""));
    }

    #[test]
    fn test_env_path_fallback() {
        assert_eq!(
            env_path("DD_PS_TEST_UNSET_VAR", "/fallback"),
            PathBuf::from("/fallback")
        );
    }
}
