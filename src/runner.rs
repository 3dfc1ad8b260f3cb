//! External command execution that cannot deadlock on OS pipe buffers.
//!
//! A child that fills one pipe while the parent blocks reading the other
//! deadlocks both. The runner therefore spawns two independent drain tasks
//! before blocking on either stream, awaits the stdout drain, then gives the
//! stderr drain a short grace period and cancels it. Failures are values in
//! the returned [`CommandResult`], never errors past this boundary.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error::LookupError;
use crate::model::{CommandResult, ExitReason};
use log::{debug, warn};

/// Bound on waiting for the stderr drain once stdout hit EOF. By then the
/// child has closed stdout (normally: exited), so stderr only has buffered
/// bytes left.
const STDERR_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner with the historical no-timeout behavior.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Runner that bounds each whole run. Success-path semantics are
    /// unchanged; an elapsed bound reports `Interrupted`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Run an external command line (whitespace-tokenized) and capture its
    /// combined output, stdout before stderr.
    pub async fn run(&self, command_line: &str) -> CommandResult {
        let mut parts = command_line.split_whitespace();
        let Some(program) = parts.next() else {
            warn!("empty command line");
            return CommandResult::failed(ExitReason::IoFailure);
        };

        let mut command = Command::new(program);
        command
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to launch {program}: {e}");
                return CommandResult::failed(ExitReason::IoFailure);
            }
        };

        // Both drains must be running before anything blocks on either
        // stream; draining sequentially deadlocks once the child fills the
        // undrained pipe.
        let stdout_task = spawn_drain(child.stdout.take());
        let mut stderr_task = spawn_drain(child.stderr.take());

        let drained = async move {
            let stdout = match stdout_task.await {
                Ok(stdout) => stdout,
                Err(e) => {
                    debug!("stdout drain interrupted: {e}");
                    return CommandResult::failed(ExitReason::Interrupted);
                }
            };
            let stderr = match tokio::time::timeout(STDERR_GRACE, &mut stderr_task).await {
                Ok(Ok(stderr)) => stderr,
                Ok(Err(e)) => {
                    debug!("stderr drain interrupted: {e}");
                    String::new()
                }
                Err(_) => {
                    stderr_task.abort();
                    String::new()
                }
            };
            let exit_reason = match child.wait().await {
                Ok(status) => {
                    debug!("{program} exited with {status}");
                    ExitReason::Completed
                }
                Err(e) => {
                    warn!("failed to wait for {program}: {e}");
                    ExitReason::IoFailure
                }
            };
            CommandResult {
                stdout,
                stderr,
                exit_reason,
            }
        };

        match self.timeout {
            None => drained.await,
            Some(timeout) => match tokio::time::timeout(timeout, drained).await {
                Ok(result) => result,
                // Dropping the drain future kills the child (kill_on_drop).
                Err(_) => CommandResult::failed(ExitReason::Interrupted),
            },
        }
    }

    /// Resolve the PID of `name` via the system process listing.
    ///
    /// The parser is deliberately narrow: second line of the listing, first
    /// column after the leading field. It ties this tool to one `ps` output
    /// format; a known fragility kept for compatibility.
    pub async fn resolve_process_id(&self, name: &str) -> Result<u32, LookupError> {
        let result = self.run(&format!("ps {name}")).await;
        if result.exit_reason != ExitReason::Completed {
            return Err(LookupError::NotFound);
        }
        parse_pid_from_listing(&result.stdout)
    }
}

fn spawn_drain<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buf).await {
                debug!("pipe drain ended early: {e}");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Expects a header line followed by data lines of space-separated columns,
/// PID in the second column.
fn parse_pid_from_listing(output: &str) -> Result<u32, LookupError> {
    let second_line = output.split('\n').nth(1).ok_or(LookupError::NotFound)?;
    let mut columns = second_line.split(' ');
    columns.next(); // leading field (or empty slot from indentation)
    for token in columns {
        if token.is_empty() {
            continue;
        }
        return token.parse().map_err(|_| LookupError::NotFound);
    }
    Err(LookupError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pid_from_indented_listing() {
        assert_eq!(parse_pid_from_listing("PID CMD\n  42 myproc\n"), Ok(42));
    }

    #[test]
    fn parses_pid_from_user_column_listing() {
        assert_eq!(
            parse_pid_from_listing("USER PID PPID CMD\nroot 456 1 myproc\n"),
            Ok(456)
        );
    }

    #[test]
    fn single_line_listing_is_not_found() {
        assert_eq!(
            parse_pid_from_listing("PID CMD"),
            Err(LookupError::NotFound)
        );
        assert_eq!(
            parse_pid_from_listing("PID CMD\n"),
            Err(LookupError::NotFound)
        );
    }

    #[test]
    fn non_numeric_pid_column_is_not_found() {
        assert_eq!(
            parse_pid_from_listing("PID CMD\nabc myproc\n"),
            Err(LookupError::NotFound)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_of_a_simple_command() {
        let result = ProcessRunner::new().run("echo hello").await;
        assert_eq!(result.exit_reason, ExitReason::Completed);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "");
        assert_eq!(result.combined_output(), "hello\n");
    }

    #[tokio::test]
    async fn launch_failure_yields_empty_result_with_reason() {
        let result = ProcessRunner::new()
            .run("definitely-not-a-real-binary-7b3e")
            .await;
        assert_eq!(result.exit_reason, ExitReason::IoFailure);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn empty_command_line_is_an_io_failure() {
        let result = ProcessRunner::new().run("   ").await;
        assert_eq!(result.exit_reason, ExitReason::IoFailure);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_reports_interrupted() {
        let result = ProcessRunner::with_timeout(Duration::from_millis(100))
            .run("sleep 5")
            .await;
        assert_eq!(result.exit_reason, ExitReason::Interrupted);
        assert!(result.stdout.is_empty());
    }
}
