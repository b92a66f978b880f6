//! Runner module - Execution abstraction layer
//!
//! This module provides a unified interface for running the native runtime
//! against untrusted submissions:
//! - `SandboxedRunner`: isolated child process with rlimits and a hard kill
//!
//! The runner module does NOT:
//! - Compare outputs or compute scores
//! - Know about the harness protocol or entry points

pub mod sandboxed;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Environment variables visible to the program; everything else is cleared
    pub env: Vec<(String, String)>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    #[cfg(test)]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Resource limits for execution
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Wall-clock limit in milliseconds; the process is killed past it
    pub wall_time_ms: u64,
    /// Memory limit in MB
    pub memory_mb: u32,
    /// Maximum open file descriptors
    pub open_files: u64,
}

impl RunLimits {
    pub fn new(wall_time_ms: u64, memory_mb: u32) -> Self {
        Self {
            wall_time_ms,
            memory_mb,
            ..Self::default()
        }
    }

    /// CPU-seconds rlimit derived from the wall budget, never below one second
    pub fn cpu_secs(&self) -> u64 {
        self.wall_time_ms.div_ceil(1000).max(1)
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            wall_time_ms: 10_000,
            memory_mb: 256,
            open_files: 64,
        }
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Wall-clock limit exceeded, process was killed
    TimeLimitExceeded,
    /// Killed by signal
    Signaled(i32),
    /// System/internal error
    SystemError,
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug)]
pub struct RunOutcome {
    /// Wall-clock time in milliseconds
    pub time_ms: u64,
    /// Stdout content
    pub stdout: String,
    /// Stderr content
    pub stderr: String,
    /// Execution status
    pub status: RunStatus,
}

impl RunOutcome {
    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get exit code from status (-1 if not applicable)
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Exited(code) => code,
            _ => -1,
        }
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits and optional stdin
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome>;
}

// Re-exports
pub use sandboxed::SandboxedRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_secs_rounds_up() {
        assert_eq!(RunLimits::new(1, 64).cpu_secs(), 1);
        assert_eq!(RunLimits::new(1000, 64).cpu_secs(), 1);
        assert_eq!(RunLimits::new(1001, 64).cpu_secs(), 2);
        assert_eq!(RunLimits::new(0, 64).cpu_secs(), 1);
    }

    #[test]
    fn test_command_to_vec() {
        let cmd = CommandSpec::new("node").with_args(["--a", "b.js"]);
        assert_eq!(cmd.to_vec(), vec!["node", "--a", "b.js"]);
    }

    #[test]
    fn test_exit_code() {
        let outcome = RunOutcome {
            time_ms: 0,
            stdout: String::new(),
            stderr: String::new(),
            status: RunStatus::TimeLimitExceeded,
        };
        assert_eq!(outcome.exit_code(), -1);
        assert!(!outcome.is_success());
    }
}
