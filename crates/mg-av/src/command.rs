//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// The aggregated log: stderr (where ffmpeg writes its diagnostics)
    /// followed by any stdout text.
    pub fn log(&self) -> String {
        if self.stdout.trim().is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stderr, self.stdout)
        }
    }
}

/// A running process whose stderr is consumed as log records.
pub struct LoggedProcess {
    pub child: Child,
    pub records: LogRecords<BufReader<ChildStderr>>,
}

/// A builder for constructing and executing external tool invocations.
///
/// Arguments are kept as a discrete list and handed straight to the process
/// primitive; they are never joined into a shell string.
///
/// # Example
///
/// ```no_run
/// use mg_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mg_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .args(["-hide_banner", "-i", "/path/to/video.mov"])
///     .run()
///     .await?;
/// println!("exit={:?}\n{}", output.status.code(), output.log());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The configured timeout.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Name used in error messages and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        // Dropping the child (e.g. when the timeout future wins) kills it.
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit status is *not* an error here: the caller receives the
    /// status alongside the captured text and decides what it means.
    ///
    /// # Errors
    ///
    /// - [`mg_core::Error::Tool`] if spawning the process fails.
    /// - [`mg_core::Error::Tool`] if the process times out (message includes
    ///   the timeout duration); the child is killed.
    pub async fn run(&self) -> mg_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("spawning {} {:?}", program_name, self.args);

        let child = cmd.spawn().map_err(|e| {
            mg_core::Error::tool(program_name.clone(), format!("failed to spawn: {e}"))
        })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(mg_core::Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(mg_core::Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Spawn the command with stderr exposed as a stream of log records.
    ///
    /// Stdout is discarded. The caller owns the child and must wait on it.
    pub fn spawn_logged(&self) -> mg_core::Result<LoggedProcess> {
        let program_name = self.program_name();

        let mut cmd = self.command();
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        tracing::debug!("spawning {} {:?} (streaming log)", program_name, self.args);

        let mut child = cmd.spawn().map_err(|e| {
            mg_core::Error::tool(program_name.clone(), format!("failed to spawn: {e}"))
        })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| mg_core::Error::tool(program_name, "stderr was not captured"))?;

        Ok(LoggedProcess {
            child,
            records: LogRecords::new(BufReader::new(stderr)),
        })
    }
}

/// Splits a byte stream into log records.
///
/// ffmpeg terminates ordinary log lines with `\n` but rewrites its status
/// line in place with `\r`, so both count as record terminators. Empty
/// records (such as the gap in `\r\n`) are skipped.
pub struct LogRecords<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> LogRecords<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the next record, or `None` at end of stream.
    pub async fn next_record(&mut self) -> std::io::Result<Option<String>> {
        let mut record = Vec::new();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(if record.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(&record).into_owned())
                });
            }

            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(i) => {
                    record.extend_from_slice(&available[..i]);
                    self.reader.consume(i + 1);
                    if !record.is_empty() {
                        return Ok(Some(String::from_utf8_lossy(&record).into_owned()));
                    }
                }
                None => {
                    let n = available.len();
                    record.extend_from_slice(available);
                    self.reader.consume(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_echo() {
        // `echo` should be universally available.
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .run()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
                assert!(out.log().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn run_reports_nonzero_status_without_error() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo boom >&2; exit 3"])
            .run()
            .await;

        if let Ok(out) = output {
            assert_eq!(out.status.code(), Some(3));
            assert!(out.log().contains("boom"));
        }
    }

    #[tokio::test]
    async fn run_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .run()
            .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("failed to spawn"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn timeout_fires() {
        // `sleep 10` should be killed well before 10 seconds.
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .run()
            .await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("timed out") || err.contains("failed to spawn"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn program_name_is_file_name() {
        let cmd = ToolCommand::new(PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(cmd.program_name(), "ffmpeg");
    }

    #[test]
    fn log_joins_streams() {
        let out = ToolOutput {
            status: ok_status(),
            stdout: "out".into(),
            stderr: "err".into(),
        };
        assert_eq!(out.log(), "err\nout");

        let out = ToolOutput {
            status: ok_status(),
            stdout: "  \n".into(),
            stderr: "err only".into(),
        };
        assert_eq!(out.log(), "err only");
    }

    #[cfg(unix)]
    fn ok_status() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(0)
    }

    #[cfg(windows)]
    fn ok_status() -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(0)
    }

    async fn collect(input: &[u8]) -> Vec<String> {
        let mut records = LogRecords::new(input);
        let mut out = Vec::new();
        while let Some(r) = records.next_record().await.unwrap() {
            out.push(r);
        }
        out
    }

    #[tokio::test]
    async fn records_split_on_newline_and_carriage_return() {
        let log = b"Input #0, mov\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\r\nend";
        assert_eq!(
            collect(log).await,
            vec![
                "Input #0, mov",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00",
                "end",
            ]
        );
    }

    #[tokio::test]
    async fn records_empty_stream() {
        assert!(collect(b"").await.is_empty());
        assert!(collect(b"\n\r\n").await.is_empty());
    }

    #[tokio::test]
    async fn records_span_buffer_boundaries() {
        let reader = BufReader::with_capacity(4, &b"abcdefgh\nij"[..]);
        let mut records = LogRecords::new(reader);
        assert_eq!(records.next_record().await.unwrap().as_deref(), Some("abcdefgh"));
        assert_eq!(records.next_record().await.unwrap().as_deref(), Some("ij"));
        assert_eq!(records.next_record().await.unwrap(), None);
    }
}
