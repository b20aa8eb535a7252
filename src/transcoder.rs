use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::error::SessionError;

/// One transcoder invocation: decode `input` in real time and stream it
/// to `target_sink` on the audio server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub program: String,
    pub input: PathBuf,
    pub target_sink: String,
    pub channels: u8,
}

impl TranscodeJob {
    /// Argument list passed to the transcoder. The target sink is always last.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-re".into(),
            "-i".into(),
            self.input.clone().into_os_string(),
            "-f".into(),
            "pulse".into(),
            "-device".into(),
            self.target_sink.clone().into(),
            "-ac".into(),
            self.channels.to_string().into(),
            self.target_sink.clone().into(),
        ]
    }
}

/// How a single pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl From<ExitStatus> for PassOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run one pass to completion.
    ///
    /// Dropping the returned future must stop the pass.
    async fn run(&self, job: &TranscodeJob) -> Result<PassOutcome, SessionError>;
}

/// Runs the transcoder as a child process.
pub struct ProcessTranscoder;

#[async_trait]
impl Transcoder for ProcessTranscoder {
    async fn run(&self, job: &TranscodeJob) -> Result<PassOutcome, SessionError> {
        log::debug!("Spawning {} {:?}", job.program, job.args());

        let mut child = Command::new(&job.program)
            .args(job.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SessionError::Spawn {
                program: job.program.clone(),
                source,
            })?;

        let status = child
            .wait()
            .await
            .map_err(|source| wait_error(&job.program, source))?;

        Ok(PassOutcome::from(status))
    }
}

fn wait_error(program: &str, source: std::io::Error) -> SessionError {
    SessionError::Wait {
        program: program.to_string(),
        source,
    }
}
