use crate::error::{Error, Result};
use crate::hop::TraceOutput;
use crate::parse::parse_output;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use std::io::Read;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::instrument;

/// How often to poll for the exit of the trace command once its output has closed.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The external command used to trace a route.
///
/// The target is appended as the final argument.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TraceCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TraceCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Runs the external trace command and parses its output.
#[derive(Debug, Clone)]
pub struct TraceRunner {
    command: TraceCommand,
    timeout: Duration,
}

impl TraceRunner {
    #[must_use]
    pub const fn new(command: TraceCommand, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    #[must_use]
    pub const fn command(&self) -> &TraceCommand {
        &self.command
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Trace the route to `target`.
    ///
    /// A single child process is spawned and killed if it does not complete
    /// within the timeout.  Output from a command which exits with a failure
    /// status is still used if it contains at least one hop.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self, target: &str) -> Result<TraceOutput> {
        let deadline = Instant::now()
            .checked_add(self.timeout)
            .ok_or(Error::InvalidTimeout(self.timeout))?;
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::TraceUnavailable(self.command.program.clone(), err))?;
        tracing::debug!(pid = child.id(), program = %self.command.program, "spawned trace command");
        let stderr_reader = child.stderr.take().map(spawn_stderr_reader);
        let (tx, rx) = bounded(1);
        if let Some(mut stdout) = child.stdout.take() {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let res = stdout.read_to_end(&mut buf).map(|_| buf);
                // the receiver is gone if the trace timed out
                let _ = tx.send(res);
            });
        }
        let stdout = match rx.recv_deadline(deadline) {
            Ok(res) => String::from_utf8_lossy(&res?).into_owned(),
            Err(RecvTimeoutError::Timeout) => return Err(self.kill(child)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(Error::TraceFailed(String::from("trace output unavailable")));
            }
        };
        let Some(status) = wait_until(&mut child, deadline)? else {
            return Err(self.kill(child));
        };
        // a descendant of the command may still hold the stderr pipe open
        let stderr = stderr_reader
            .and_then(|rx| rx.recv_deadline(deadline).ok())
            .unwrap_or_default();
        self.evaluate(status, &stdout, stderr.trim())
    }

    fn evaluate(&self, status: ExitStatus, stdout: &str, stderr: &str) -> Result<TraceOutput> {
        if !status.success() && stdout.trim().is_empty() {
            return Err(Error::TraceFailed(format!(
                "`{}` exited with {status}: {stderr}",
                self.command.program
            )));
        }
        let output = parse_output(stdout);
        if output.hops.is_empty() {
            return Err(Error::TraceFailed(String::from(
                "no hops found in trace output",
            )));
        }
        if !status.success() {
            tracing::warn!(%status, hops = output.hops.len(), "using partial trace output");
        }
        Ok(output)
    }

    fn kill(&self, mut child: Child) -> Error {
        tracing::warn!(pid = child.id(), timeout = ?self.timeout, "killing trace command");
        if let Err(err) = child.kill() {
            tracing::warn!(%err, "failed to kill trace command");
        }
        if let Err(err) = child.wait() {
            tracing::warn!(%err, "failed to reap trace command");
        }
        Error::TraceTimeout(self.timeout)
    }
}

fn spawn_stderr_reader(mut stderr: ChildStderr) -> Receiver<String> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let text = match stderr.read_to_end(&mut buf) {
            Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => String::new(),
        };
        let _ = tx.send(text);
    });
    rx
}

/// Wait for `child` to exit, returning `None` if `deadline` passes first.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}
