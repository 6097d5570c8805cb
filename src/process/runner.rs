// Process runner - bounded execution of external binaries

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default cap on captured stdout + stderr (10 MiB, matching what a chatty
/// Blender run can produce before the useful lines drown).
pub const DEFAULT_OUTPUT_CAP: usize = 10 * 1024 * 1024;

/// How long to keep draining pipes after the direct child has exited. A
/// surviving grandchild can hold the write ends open indefinitely; past this
/// grace its remaining output is abandoned.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// One external process launch: program, arguments, time budget, environment
/// overrides and output cap. Constructed per call, consumed by [`run`].
#[derive(Debug, Clone)]
pub struct ProcessInvocation {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    env: Vec<(String, String)>,
    output_cap: usize,
}

impl ProcessInvocation {
    pub fn new(program: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            timeout,
            env: Vec::new(),
            output_cap: DEFAULT_OUTPUT_CAP,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override an environment variable for the child only; the calling
    /// process environment is never touched.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn output_cap(mut self, cap: usize) -> Self {
        self.output_cap = cap;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Classified result of one process launch.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// Zero exit within the time budget.
    Success { stdout: String, stderr: String },
    /// Deadline elapsed; the child was killed and reaped.
    TimedOut { timeout: Duration },
    /// Non-zero exit (not caused by the timeout).
    Failed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success { .. })
    }
}

/// Launch the process and wait for it, enforcing the timeout.
///
/// stdout and stderr are drained concurrently (so a full pipe can never
/// wedge the child) and each is truncated at the invocation's output cap.
/// On timeout the child is killed and reaped - no orphaned process.
pub async fn run(invocation: &ProcessInvocation) -> Result<ProcessOutcome> {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &invocation.env {
        command.env(key, value);
    }

    debug!(
        program = %invocation.program.display(),
        args = ?invocation.args,
        timeout_secs = invocation.timeout.as_secs(),
        "Spawning external process"
    );

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {}", invocation.program.display()))?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    let cap = invocation.output_cap;
    // Readers fill shared buffers so whatever arrived before an abort is
    // still available to the caller.
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = tokio::spawn(read_capped(stdout, cap, stdout_buf.clone()));
    let stderr_task = tokio::spawn(read_capped(stderr, cap, stderr_buf.clone()));

    let status = match tokio::time::timeout(invocation.timeout, child.wait()).await {
        Ok(status) => status.context("Failed to wait for child process")?,
        Err(_) => {
            warn!(
                program = %invocation.program.display(),
                "Process exceeded {}s budget, killing",
                invocation.timeout.as_secs()
            );
            child.start_kill().ok();
            // Reap so the pid is not orphaned. The reader tasks are aborted,
            // not awaited: a grandchild that survives the kill can hold the
            // pipe write ends open and the captured output is discarded on
            // this path anyway.
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            return Ok(ProcessOutcome::TimedOut {
                timeout: invocation.timeout,
            });
        }
    };

    let stdout = finish_capture(stdout_task, &stdout_buf).await;
    let mut stderr = finish_capture(stderr_task, &stderr_buf).await;
    // The cap is a total budget across both streams; stdout wins ties.
    if stdout.len() + stderr.len() > cap {
        let keep = cap.saturating_sub(stdout.len());
        stderr = truncate_lossy(&stderr, keep);
    }

    if status.success() {
        Ok(ProcessOutcome::Success { stdout, stderr })
    } else {
        Ok(ProcessOutcome::Failed {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

/// Wait for a reader task, giving up after [`DRAIN_GRACE`]. The direct child
/// has already exited here; only a detached grandchild keeping the pipe open
/// can still be feeding the reader. Whatever reached the shared buffer is
/// returned either way.
async fn finish_capture(
    mut task: tokio::task::JoinHandle<()>,
    buf: &Arc<Mutex<Vec<u8>>>,
) -> String {
    if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
        task.abort();
    }
    let bytes = buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Read a stream into the shared buffer, keeping at most `cap` bytes. The
/// stream is drained past the cap so the child never blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize, buf: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let mut buf = buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if buf.len() < cap {
                    let take = n.min(cap - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
            }
            Err(_) => break,
        }
    }
}

fn truncate_lossy(s: &str, len: usize) -> String {
    if s.len() <= len {
        return s.to_string();
    }
    let mut end = len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success_captures_stdout() {
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_secs(5))
            .arg("-c")
            .arg("echo hello");
        let outcome = run(&invocation).await.unwrap();
        match outcome {
            ProcessOutcome::Success { stdout, .. } => assert_eq!(stdout.trim(), "hello"),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_failed_with_stderr() {
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_secs(5))
            .arg("-c")
            .arg("echo oops >&2; exit 3");
        let outcome = run(&invocation).await.unwrap();
        match outcome {
            ProcessOutcome::Failed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_timeout_kills_child() {
        // The shell forks `sleep` as its own child; killing the shell leaves
        // that grandchild alive and holding the pipe write ends, so the
        // caller must not wait on the pipes to close.
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_millis(200))
            .arg("-c")
            .arg("sleep 30");
        let start = std::time::Instant::now();
        let outcome = run(&invocation).await.unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut { .. }));
        // The call must return promptly, not after the grandchild's 30s.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_returns_despite_grandchild_holding_pipe() {
        // The child exits immediately but leaves a background grandchild
        // that inherited stdout; the drain grace bounds how long a clean
        // run can be held hostage, and the output produced before the
        // child exited is still captured.
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_secs(30))
            .arg("-c")
            .arg("sleep 30 & echo fast");
        let start = std::time::Instant::now();
        let outcome = run(&invocation).await.unwrap();
        match outcome {
            ProcessOutcome::Success { stdout, .. } => assert!(stdout.contains("fast")),
            other => panic!("expected success, got {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_output_cap_truncates_instead_of_failing() {
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_secs(10))
            .arg("-c")
            .arg("yes x | head -c 100000")
            .output_cap(1024);
        let outcome = run(&invocation).await.unwrap();
        match outcome {
            ProcessOutcome::Success { stdout, .. } => assert!(stdout.len() <= 1024),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_env_override_applies_to_child_only() {
        let invocation = ProcessInvocation::new("/bin/sh", Duration::from_secs(5))
            .arg("-c")
            .arg("echo \"display=[$NOVA_TEST_DISPLAY]\"")
            .env("NOVA_TEST_DISPLAY", "headless");
        let outcome = run(&invocation).await.unwrap();
        match outcome {
            ProcessOutcome::Success { stdout, .. } => {
                assert!(stdout.contains("display=[headless]"))
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(std::env::var("NOVA_TEST_DISPLAY").is_err());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_error() {
        let invocation =
            ProcessInvocation::new("/nonexistent/binary", Duration::from_secs(1)).arg("--version");
        let result = run(&invocation).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to spawn"));
    }
}
