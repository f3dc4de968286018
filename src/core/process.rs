//! Running external programs with a deadline.
//!
//! The media tools lean on `ffmpeg`, `ffprobe`, `exiftool` and a HEIC
//! converter. Each call gets its own timeout; a program that overruns it is
//! killed and reported as [`ToolError::Timeout`].

use crate::error::ToolError;
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// An external program plus the time it is allowed to run
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    timeout: Duration,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion, failing on spawn errors, timeouts and non-zero exit
    pub fn run<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty program cannot
        // block on a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;
        let output = ToolOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: stderr.chars().take(200).collect(),
            });
        }

        Ok(output)
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<std::process::ExitStatus, ToolError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(program = %self.program, elapsed_ms = started.elapsed().as_millis() as u64, "tool finished");
                    return Ok(status);
                }
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::Timeout {
                        program: self.program.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(ToolError::Spawn {
                        program: self.program.clone(),
                        source,
                    })
                }
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}
