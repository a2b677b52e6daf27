//! External process invocation shared by package detection and metadata
//! probes.
//!
//! Everything that shells out goes through [`CommandRunner`], so backends
//! and probes only deal with "run this, give me whatever came back". The
//! [`SystemRunner`] implementation bounds every invocation with a timeout;
//! tests substitute a canned runner.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }

    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }

    /// True when the process wrote nothing to either stream.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Runs external programs.
///
/// Implementations never fail loudly: a program that cannot be spawned or
/// that exceeds its time budget yields `None`.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Option<CommandOutput>;
}

/// Runs real processes with an inherited environment and a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<CommandOutput> {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program, error = %e, "failed to spawn");
                return None;
            }
        };

        // The wait and both pipe reads share one deadline.
        let deadline = Instant::now() + self.timeout;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On timeout the reader threads are left detached.
        let Some(success) = wait_until(&mut child, deadline) else {
            tracing::debug!(program, ?args, timeout = ?self.timeout, "timed out");
            return None;
        };

        // A background grandchild can keep the pipes open after the child
        // itself has exited.
        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline))
        else {
            tracing::debug!(program, ?args, timeout = ?self.timeout, "output still open at timeout");
            return None;
        };

        Some(CommandOutput {
            stdout,
            stderr,
            success,
        })
    }
}

/// Reads `pipe` to the end on its own thread and sends the bytes back once.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Waits for a reader's bytes until `deadline`.
///
/// Returns `None` when the deadline passes first. A missing pipe or a reader
/// that died yields an empty string.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Polls the child until it exits or `deadline` passes.
///
/// Returns `Some(success)` on exit and `None` after killing a child that ran
/// too long.
fn wait_until(child: &mut Child, deadline: Instant) -> Option<bool> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status.success()),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }
}
