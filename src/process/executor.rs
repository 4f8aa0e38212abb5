//! Process execution with a hard timeout.
//!
//! [`TokioExecutor`] spawns a [`PreparedCommand`] in its own process group,
//! drains its stdout and stderr concurrently, and races process exit against
//! the phase timeout. When the process is done the whole group is killed, so
//! background children cannot keep touching the workspace afterwards.
//! Once spawned, every outcome (clean exit, non-zero exit, timeout) is
//! normalized into an [`ExecutionResult`]; only a failure to start the
//! process is reported as an error.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::result::ExecutionResult;
use crate::error::ExecError;
use crate::execution::PreparedCommand;

/// Exit code reported for a process that was killed on timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How long output readers may keep draining after the process is gone.
const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Runs prepared commands.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Runs `command` to completion or until `timeout` elapses.
    async fn execute(
        &self,
        command: &PreparedCommand,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, ExecError>;
}

/// [`ProcessExecutor`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    kill_grace: Duration,
}

impl Default for TokioExecutor {
    fn default() -> Self {
        Self {
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}

impl TokioExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to keep collecting output after the process exits.
    ///
    /// Grandchildren can hold the pipes open after the direct child is
    /// gone; readers still running after this window are aborted.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

#[async_trait]
impl ProcessExecutor for TokioExecutor {
    async fn execute(
        &self,
        command: &PreparedCommand,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, ExecError> {
        let (program, args) = command.argv.split_first().ok_or(ExecError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(cwd) = &command.options.cwd {
            cmd.current_dir(cwd);
        }
        if let Some(env) = &command.options.env {
            cmd.envs(env);
        }

        debug!(program = %program, cwd = ?command.options.cwd, "Spawning process");
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();

        let stdout = OutputPipe::capture(child.stdout.take());
        let stderr = OutputPipe::capture(child.stderr.take());

        let limit = timeout.filter(|t| !t.is_zero());
        let waited = match limit {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };
        let (status, timed_out): (io::Result<ExitStatus>, bool) = match waited {
            Some(status) => (status, false),
            None => {
                warn!(
                    program = %program,
                    timeout_secs = %limit.map(format_secs).unwrap_or_default(),
                    "Process timed out, killing"
                );
                kill_process_group(pid);
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "Kill signal not delivered");
                }
                (child.wait().await, true)
            }
        };

        // stragglers from a clean exit go too
        kill_process_group(pid);

        let (stdout, stderr) = collect_output(stdout, stderr, self.kill_grace).await;
        let mut stderr = filter_noise(&stderr);

        let mut exit_code = match &status {
            Ok(status) => status.code(),
            Err(e) => {
                append_line(&mut stderr, &format!("Failed to wait for process: {}", e));
                None
            }
        };

        if timed_out {
            // a killed run never counts as success, even if it reported 0
            if matches!(exit_code, None | Some(0)) {
                exit_code = Some(TIMEOUT_EXIT_CODE);
            }
            if let Some(limit) = limit {
                append_line(
                    &mut stderr,
                    &format!("Execution timed out after {} seconds", format_secs(limit)),
                );
            }
        }

        debug!(
            program = %program,
            exit_code = ?exit_code,
            timed_out,
            "Process finished"
        );

        Ok(ExecutionResult {
            exit_code,
            stdout: filter_noise(&stdout),
            stderr,
            timed_out,
        })
    }
}

/// Removes package-manager informational lines (`YN0000 ...`) from output.
pub fn filter_noise(output: &str) -> String {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let re = NOISE.get_or_init(|| Regex::new(r"YN0000.*\n").expect("Invalid regex for yarn noise"));
    re.replace_all(output, "").into_owned()
}

fn append_line(buf: &mut String, line: &str) {
    if !buf.is_empty() && !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(line);
}

/// Formats a duration as whole seconds, or with one decimal when it has a
/// fractional part.
pub(crate) fn format_secs(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        d.as_secs().to_string()
    } else {
        format!("{:.1}", d.as_secs_f64())
    }
}

/// Sends `SIGKILL` to the process group led by `pid`.
///
/// A group that is already gone is not an error.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => debug!(pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Drains both pipes at once under a single grace deadline.
async fn collect_output(stdout: OutputPipe, stderr: OutputPipe, grace: Duration) -> (String, String) {
    let deadline = Instant::now() + grace;
    tokio::join!(stdout.collect(deadline), stderr.collect(deadline))
}

/// A pipe drained by a background task into a shared buffer.
///
/// The buffer survives the task being aborted, so partial output from a
/// killed process is still reported.
struct OutputPipe {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl OutputPipe {
    fn capture<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let handle = tokio::spawn(async move {
            let Some(mut reader) = reader else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        sink.lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]);
                    }
                    Err(e) => {
                        debug!(error = %e, "Output pipe read failed");
                        break;
                    }
                }
            }
        });
        Self { buf, handle }
    }

    async fn collect(self, deadline: Instant) -> String {
        let OutputPipe { buf, mut handle } = self;
        if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
            debug!("Output pipe still open after grace period, abandoning");
            handle.abort();
        }
        let bytes = std::mem::take(&mut *buf.lock().unwrap_or_else(PoisonError::into_inner));
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}
