//! Sandboxed runner implementation
//!
//! Executes the native runtime as a short-lived child process with a cleared
//! environment, rlimits applied before exec, and a wall-clock kill.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// Runner that executes untrusted code in an isolated child process
#[derive(Debug, Default, Clone)]
pub struct SandboxedRunner;

impl SandboxedRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a command in a fresh child process
    pub async fn execute(
        &self,
        spec: &CommandSpec,
        limits: &RunLimits,
        stdin_content: Option<&str>,
    ) -> Result<RunOutcome> {
        debug!(
            "Running sandboxed command: {:?} (wall {} ms, heap {} MB)",
            spec.to_vec(),
            limits.wall_time_ms,
            limits.memory_mb
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .env_clear()
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &spec.work_dir {
            cmd.current_dir(dir);
        }

        apply_rlimits(&mut cmd, limits);

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", spec.program))?;

        let stdin = child.stdin.take();
        let payload = stdin_content.map(str::to_owned);
        let run = async move {
            if let (Some(mut stdin), Some(input)) = (stdin, payload) {
                // A child that exits early closes the pipe; its exit status
                // carries the real failure.
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!("Failed to write stdin to child: {}", e);
                }
            }
            child.wait_with_output().await
        };

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(Duration::from_millis(limits.wall_time_ms), run).await
        {
            Ok(output) => output.context("Failed to wait for sandboxed program")?,
            Err(_) => {
                warn!(
                    "Sandboxed program exceeded wall time of {} ms, killed",
                    limits.wall_time_ms
                );
                return Ok(RunOutcome {
                    time_ms: elapsed_ms(started),
                    stdout: String::new(),
                    stderr: String::new(),
                    status: RunStatus::TimeLimitExceeded,
                });
            }
        };

        let time_ms = elapsed_ms(started);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let status = match output.status.code() {
            Some(code) => RunStatus::Exited(code),
            None => {
                use std::os::unix::process::ExitStatusExt;
                match output.status.signal() {
                    // SIGXCPU: CPU rlimit reached before the wall clock
                    Some(sig) if sig == nix::sys::signal::Signal::SIGXCPU as i32 => {
                        RunStatus::TimeLimitExceeded
                    }
                    Some(sig) => RunStatus::Signaled(sig),
                    None => RunStatus::SystemError,
                }
            }
        };

        debug!(
            "Sandboxed program finished: status={:?}, time_ms={}",
            status, time_ms
        );

        Ok(RunOutcome {
            time_ms,
            stdout,
            stderr,
            status,
        })
    }
}

#[async_trait]
impl Runner for SandboxedRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome> {
        self.execute(cmd, limits, stdin).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Install rlimits in the child between fork and exec
fn apply_rlimits(cmd: &mut Command, limits: &RunLimits) {
    let cpu_secs = limits.cpu_secs();
    let open_files = limits.open_files;

    // SAFETY: the closure only calls setrlimit, which is async-signal-safe.
    unsafe {
        cmd.pre_exec(move || {
            use nix::sys::resource::{setrlimit, Resource};

            let to_io = |e: nix::errno::Errno| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("setrlimit failed: {}", e))
            };

            setrlimit(Resource::RLIMIT_CPU, cpu_secs, cpu_secs).map_err(to_io)?;
            setrlimit(Resource::RLIMIT_FSIZE, 0, 0).map_err(to_io)?;
            setrlimit(Resource::RLIMIT_CORE, 0, 0).map_err(to_io)?;
            setrlimit(Resource::RLIMIT_NOFILE, open_files, open_files).map_err(to_io)?;
            Ok(())
        });
    }
}
