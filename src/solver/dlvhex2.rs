//! Driver for the dlvhex2 solver subprocess.
//!
//! The program text reaches the solver through a filesystem IPC channel
//! (named pipe where available). Answer sets arrive one per line on stdout;
//! `--waitonmodel` makes the solver pause after each one until a newline
//! arrives on stdin, so the stream computes answer sets only as fast as the
//! consumer pulls them.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::asp::RawAnswerSet;
use crate::error::{SeshResult, SolverError};
use crate::parser::parse_answer_set;
use crate::solver::capture::StderrCapture;
use crate::solver::ipc::{IpcChannel, IpcKind};
use crate::solver::{AnswerStream, Solver, SolverOptions, WriteInput};

/// How long to wait for the solver to exit on its own after SIGTERM before
/// killing it outright.
const TERMINATE_DEADLINE: Duration = Duration::from_millis(100);

/// Grace period for the solver to exit after closing stdout.
const EXIT_GRACE: Duration = Duration::from_millis(5);

/// Interface to the dlvhex2 solver.
#[derive(Debug, Clone)]
pub struct Dlvhex2Solver {
    executable: PathBuf,
}

impl Default for Dlvhex2Solver {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("dlvhex2"),
        }
    }
}

impl Dlvhex2Solver {
    /// A solver that looks for `dlvhex2` on `$PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A solver using an explicit executable path.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn write_through(
        &self,
        ipc: &IpcChannel,
        write_input: WriteInput<'_>,
    ) -> SeshResult<()> {
        let file = File::create(ipc.path()).map_err(|source| SolverError::Io { source })?;
        let mut writer = BufWriter::new(file);
        write_input(&mut writer)?;
        writer
            .flush()
            .map_err(|source| SolverError::Io { source })?;
        Ok(())
    }
}

impl Solver for Dlvhex2Solver {
    fn run(
        &self,
        write_input: WriteInput<'_>,
        capture_predicates: &BTreeSet<String>,
        file_args: &[PathBuf],
        options: Option<&SolverOptions>,
    ) -> SeshResult<Box<dyn AnswerStream>> {
        let ipc = IpcChannel::new()?;

        let mut filter: Vec<&str> = capture_predicates.iter().map(String::as_str).collect();
        if let Some(options) = options {
            filter.extend(options.capture.iter().map(String::as_str));
        }

        let mut command = Command::new(&self.executable);
        command
            // only print the answer sets themselves
            .arg("--silent")
            // only keep the capture predicates in the output
            .arg(format!("--filter={}", filter.join(",")))
            // pause for a newline on stdin between answer sets
            .arg("--waitonmodel");
        if let Some(options) = options {
            if let Some(n) = options.max_answer_sets {
                command.arg(format!("--number={n}"));
            }
            if let Some(n) = options.max_int {
                command.arg(format!("--maxint={n}"));
            }
            command.args(&options.custom);
        }
        command.arg(ipc.path());
        command.args(file_args);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // A plain file must carry the program before the solver starts.
        if ipc.kind() == IpcKind::File {
            self.write_through(&ipc, write_input)?;
            debug!(path = %ipc.path().display(), "wrote solver input file");
            return spawn_stream(command, &self.executable, ipc, None);
        }

        // A pipe is written after the spawn: opening it blocks until the
        // solver opens the read end, and writing first would deadlock once
        // the pipe buffer fills.
        spawn_stream(command, &self.executable, ipc, Some((self, write_input)))
    }
}

fn spawn_stream(
    mut command: Command,
    executable: &std::path::Path,
    ipc: IpcChannel,
    pipe_write: Option<(&Dlvhex2Solver, WriteInput<'_>)>,
) -> SeshResult<Box<dyn AnswerStream>> {
    let mut child = command.spawn().map_err(|source| SolverError::Spawn {
        executable: executable.display().to_string(),
        source,
    })?;
    debug!(pid = child.id(), "spawned solver");

    if let Some((solver, write_input)) = pipe_write {
        if let Err(e) = solver.write_through(&ipc, write_input) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    }

    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .map(BufReader::new)
        .ok_or_else(|| SolverError::Ipc {
            message: "solver stdout was not captured".into(),
        })?;
    let stderr = child.stderr.take().ok_or_else(|| SolverError::Ipc {
        message: "solver stderr was not captured".into(),
    })?;

    Ok(Box::new(AnswerSetStream {
        child,
        stdin,
        stdout: Some(stdout),
        stderr: StderrCapture::spawn(stderr),
        ipc: Some(ipc),
        closed: false,
        error_reported: false,
        pending_ack: false,
    }))
}

/// The running solver viewed as a stream of answer sets.
struct AnswerSetStream {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: StderrCapture,
    ipc: Option<IpcChannel>,
    closed: bool,
    error_reported: bool,
    /// An answer set was delivered; the solver waits for a newline on stdin
    /// before computing the next one.
    pending_ack: bool,
}

impl AnswerSetStream {
    /// Ask the solver for the next answer set.
    fn ack(&mut self) {
        if let Some(stdin) = &mut self.stdin {
            // Write errors mean the solver already exited; the following
            // read sees EOF and close() classifies the exit.
            let _ = stdin.write_all(b"\n");
            let _ = stdin.flush();
        }
    }
}

impl Iterator for AnswerSetStream {
    type Item = SeshResult<RawAnswerSet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        if self.pending_ack {
            self.pending_ack = false;
            self.ack();
        }

        let mut line = String::new();
        let read = match &mut self.stdout {
            Some(stdout) => stdout.read_line(&mut line),
            None => return None,
        };
        match read {
            Ok(0) => {
                // Stdout exhausted: all answer sets received, or the solver
                // failed. Give it a moment to exit, then classify.
                std::thread::sleep(EXIT_GRACE);
                match self.close() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']);
                match parse_answer_set(trimmed) {
                    Ok(set) => {
                        self.pending_ack = true;
                        Some(Ok(set))
                    }
                    Err(parse) => {
                        debug!(error = %parse, "discarding solver output line");
                        let _ = self.close();
                        Some(Err(SolverError::Wire {
                            line: trimmed.to_string(),
                        }
                        .into()))
                    }
                }
            }
            Err(source) => {
                let _ = self.close();
                Some(Err(SolverError::Io { source }.into()))
            }
        }
    }
}

impl AnswerStream for AnswerSetStream {
    /// Terminate the solver if it is still running and release the IPC
    /// channel. Returns an error if the solver exited abnormally, at most
    /// once per stream.
    fn close(&mut self) -> SeshResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut driver_terminated = false;
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) => {
                driver_terminated = true;
                terminate(&mut self.child);
            }
            Err(source) => {
                self.error_reported = true;
                return Err(SolverError::Io { source }.into());
            }
        }
        let status = self
            .child
            .wait()
            .map_err(|source| SolverError::Io { source })?;
        let code = exit_code(status);

        // Close stdin only after the solver has stopped; closing it earlier
        // makes the solver emit all remaining answer sets at once.
        self.stdin = None;
        self.stdout = None;
        let stderr = self.stderr.join();
        self.ipc = None;

        // When this driver initiated the termination, several exits are
        // normal: a handled SIGTERM (code 2, with a message on stderr), the
        // default SIGTERM handler, the SIGKILL escalation, and a known
        // SIGTERM-time crash under SIGABRT.
        let benign = driver_terminated && matches!(code, 2 | -15 | -9 | -6);
        if code != 0 && !benign && !self.error_reported {
            self.error_reported = true;
            warn!(code, "solver exited abnormally");
            return Err(SolverError::Subprocess { code, stderr }.into());
        }
        Ok(())
    }
}

impl Drop for AnswerSetStream {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

fn terminate(child: &mut Child) {
    #[cfg(unix)]
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
    #[cfg(not(unix))]
    let _ = child.kill();

    let deadline = Instant::now() + TERMINATE_DEADLINE;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) if Instant::now() >= deadline => {
                // It hangs; kill unconditionally. Error messages on stderr
                // may be lost at this point.
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(1)),
            Err(_) => return,
        }
    }
}

/// Exit code of a finished solver; signal terminations map to the negated
/// signal number.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(0)
}
