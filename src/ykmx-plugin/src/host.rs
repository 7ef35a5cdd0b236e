//! Exec-based host side of the protocol: spawns a plugin process, feeds it
//! events on stdin and reads validated actions from its stdout.

use crate::protocol::{encode_event, validate_action_line, ActionMessage, Event, ProtocolError};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use thiserror::Error;

/// Errors from plugin host operations.
#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("failed to spawn plugin process: {0}")]
    SpawnFailed(std::io::Error),
    #[error("plugin process has no stdin")]
    NoStdin,
    #[error("plugin process has no stdout")]
    NoStdout,
    #[error("failed to write to plugin: {0}")]
    WriteError(std::io::Error),
    #[error("failed to read from plugin: {0}")]
    ReadError(std::io::Error),
    #[error("failed to encode event: {0}")]
    EncodeError(ProtocolError),
    #[error("plugin emitted an invalid action {line:?}: {source}")]
    InvalidAction {
        line: String,
        #[source]
        source: ProtocolError,
    },
    #[error("failed to wait for plugin process: {0}")]
    WaitFailed(std::io::Error),
    #[error("plugin process terminated unexpectedly")]
    ProcessTerminated,
}

/// Configuration for an external plugin.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Path to the plugin executable.
    pub executable: PathBuf,
    /// Arguments to pass to the plugin.
    pub args: Vec<String>,
    /// Working directory for the plugin process.
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set for the plugin.
    pub env: Vec<(String, String)>,
}

impl PluginConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// What was left once the plugin's stdin was closed.
#[derive(Debug)]
pub struct PluginExit {
    /// Actions emitted after the last [`ExecPluginHost::recv_action`] call.
    pub actions: Vec<ActionMessage>,
    pub status: ExitStatus,
}

/// Host for an external plugin process.
pub struct ExecPluginHost {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ExecPluginHost {
    /// Start the plugin process with piped stdio.
    pub fn spawn(config: &PluginConfig) -> Result<Self, PluginHostError> {
        let mut cmd = Command::new(&config.executable);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(PluginHostError::SpawnFailed)?;
        let stdin = child.stdin.take().ok_or(PluginHostError::NoStdin)?;
        let stdout = child.stdout.take().ok_or(PluginHostError::NoStdout)?;

        tracing::debug!(executable = %config.executable.display(), "spawned plugin");
        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }

    pub fn send_event(&mut self, event: &Event) -> Result<(), PluginHostError> {
        let line = encode_event(event).map_err(PluginHostError::EncodeError)?;
        self.send_lines(&[line.as_str()])
    }

    /// Write raw lines in a single write, so they reach the plugin together
    /// even if it exits part way through them.
    pub fn send_lines(&mut self, lines: &[&str]) -> Result<(), PluginHostError> {
        let mut payload = String::new();
        for line in lines {
            payload.push_str(line);
            payload.push('\n');
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or(PluginHostError::ProcessTerminated)?;
        stdin
            .write_all(payload.as_bytes())
            .map_err(PluginHostError::WriteError)?;
        stdin.flush().map_err(PluginHostError::WriteError)
    }

    /// Block until the plugin emits its next action.
    pub fn recv_action(&mut self) -> Result<ActionMessage, PluginHostError> {
        self.read_action()?.ok_or(PluginHostError::ProcessTerminated)
    }

    /// Close the plugin's stdin, collect everything it still emits and wait
    /// for it to exit.
    pub fn finish(mut self) -> Result<PluginExit, PluginHostError> {
        drop(self.stdin.take());

        let mut actions = Vec::new();
        while let Some(action) = self.read_action()? {
            actions.push(action);
        }

        let mut child = self.child.take().ok_or(PluginHostError::ProcessTerminated)?;
        let status = child.wait().map_err(PluginHostError::WaitFailed)?;
        Ok(PluginExit { actions, status })
    }

    fn read_action(&mut self) -> Result<Option<ActionMessage>, PluginHostError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(PluginHostError::ReadError)?;
        if read == 0 {
            return Ok(None);
        }
        validate_action_line(&line)
            .map(Some)
            .map_err(|source| PluginHostError::InvalidAction {
                line: line.trim_end().to_string(),
                source,
            })
    }
}

impl Drop for ExecPluginHost {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
