//! # Code Runner
//!
//! Executes a code message and streams its output back as [`RunChunk`]s.
//! The TUI loop forwards chunks into `Action::OutputReceived` and closes the
//! run with `Action::RunFinished`.

use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::Sender;

use crate::core::chat::{GroupId, MessageId, OutputKind};

/// Everything a runner needs to execute one code message.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub group_id: GroupId,
    pub message_id: MessageId,
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunChunk {
    Output { kind: OutputKind, payload: String },
}

#[derive(Debug)]
pub enum RunnerError {
    /// No interpreter configured for the language.
    UnsupportedLanguage(String),
    /// The interpreter process could not be started.
    Spawn(std::io::Error),
    /// Reading output or waiting on the process failed.
    Io(std::io::Error),
    /// The receiving side dropped the channel.
    ChannelClosed,
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::UnsupportedLanguage(lang) => {
                write!(f, "no interpreter configured for '{lang}'")
            }
            RunnerError::Spawn(e) => write!(f, "failed to start interpreter: {e}"),
            RunnerError::Io(e) => write!(f, "I/O error: {e}"),
            RunnerError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for RunnerError {}

#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Streams the request's output to `sender`. Returns once the run is over.
    async fn run(&self, request: &RunRequest, sender: Sender<RunChunk>) -> Result<(), RunnerError>;
}

/// Runs code by handing it to a local interpreter process.
///
/// `interpreters` maps a lowercase language tag to a command line; the code
/// is appended as the final argument (`python3 -c <code>`).
pub struct ProcessRunner {
    interpreters: HashMap<String, Vec<String>>,
}

impl ProcessRunner {
    pub fn new(interpreters: HashMap<String, Vec<String>>) -> Self {
        Self { interpreters }
    }

    fn command_for(&self, request: &RunRequest) -> Result<Command, RunnerError> {
        let argv = self
            .interpreters
            .get(&request.language.to_lowercase())
            .filter(|argv| !argv.is_empty())
            .ok_or_else(|| RunnerError::UnsupportedLanguage(request.language.clone()))?;
        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .arg(&request.code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl CodeRunner for ProcessRunner {
    async fn run(&self, request: &RunRequest, sender: Sender<RunChunk>) -> Result<(), RunnerError> {
        let mut child = self.command_for(request)?.spawn().map_err(RunnerError::Spawn)?;
        info!(
            "Started {} run for {}/{}",
            request.language, request.group_id, request.message_id
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out_lines, err_lines) = futures::future::join(
            forward_lines(stdout, OutputKind::Stdout, sender.clone()),
            forward_lines(stderr, OutputKind::Stderr, sender.clone()),
        )
        .await;
        let produced = out_lines? + err_lines?;

        let status = child.wait().await.map_err(RunnerError::Io)?;
        debug!("Run {} exited with {status}", request.message_id);

        let closing = if !status.success() {
            Some(RunChunk::Output {
                kind: OutputKind::Error,
                payload: format!("Process exited with {status}"),
            })
        } else if produced == 0 {
            Some(RunChunk::Output {
                kind: OutputKind::Result,
                payload: String::from("(no output)"),
            })
        } else {
            None
        };
        if let Some(chunk) = closing {
            sender
                .send(chunk)
                .await
                .map_err(|_| RunnerError::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Send each line of a child stream as an output chunk. Returns the line count.
///
/// Bytes that are not UTF-8 are replaced with U+FFFD, so binary output does
/// not end the run.
async fn forward_lines<R>(
    stream: Option<R>,
    kind: OutputKind,
    sender: Sender<RunChunk>,
) -> Result<usize, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(0);
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(RunnerError::Io)?;
        if read == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        count += 1;
        sender
            .send(RunChunk::Output {
                kind,
                payload: format!("{line}\n"),
            })
            .await
            .map_err(|_| RunnerError::ChannelClosed)?;
    }
    Ok(count)
}
