//! The single-threaded read -> handle -> emit loop that drives a plugin.

use crate::emitter::ActionEmitter;
use crate::protocol::{Action, ActionKind, Event, ProtocolError};
use crate::reader::EventReader;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Plugin logic: a function of the incoming event and the plugin's own state.
///
/// Returned actions are emitted in order before the next event is read.
pub trait Plugin {
    fn handle(&mut self, event: &Event) -> Vec<Action>;
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `on_shutdown` was handled; remaining input was left unread.
    Shutdown,
    /// The host closed the input stream.
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub events: u64,
    pub actions: u64,
    pub malformed_lines: u64,
    pub exit: ExitReason,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to read event: {0}")]
    Read(#[source] ProtocolError),
    #[error("failed to emit {action}: {source}")]
    Emit {
        action: ActionKind,
        #[source]
        source: ProtocolError,
    },
}

pub struct PluginRuntime<R, W> {
    reader: EventReader<R>,
    emitter: ActionEmitter<W>,
}

impl<R: BufRead, W: Write> PluginRuntime<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            reader: EventReader::new(input),
            emitter: ActionEmitter::new(output),
        }
    }

    /// Drive `plugin` until shutdown or end of input.
    ///
    /// A failed write ends the run immediately; there is no retry.
    pub fn run<P: Plugin + ?Sized>(&mut self, plugin: &mut P) -> Result<RunSummary, RuntimeError> {
        let mut events = 0;
        let exit = loop {
            let Some(event) = self.reader.next_event().map_err(RuntimeError::Read)? else {
                break ExitReason::EndOfInput;
            };
            events += 1;
            tracing::debug!(event = event.kind(), "dispatching event");

            for action in plugin.handle(&event) {
                self.emitter
                    .emit(&action)
                    .map_err(|source| RuntimeError::Emit {
                        action: action.kind(),
                        source,
                    })?;
            }

            if event == Event::OnShutdown {
                break ExitReason::Shutdown;
            }
        };

        let summary = RunSummary {
            events,
            actions: self.emitter.emitted(),
            malformed_lines: self.reader.malformed_lines(),
            exit,
        };
        tracing::info!(
            events = summary.events,
            actions = summary.actions,
            malformed_lines = summary.malformed_lines,
            exit = ?summary.exit,
            "plugin loop finished"
        );
        Ok(summary)
    }

    pub fn into_parts(self) -> (EventReader<R>, ActionEmitter<W>) {
        (self.reader, self.emitter)
    }
}

/// Run `plugin` over this process's stdin and stdout.
pub fn run_stdio<P: Plugin + ?Sized>(plugin: &mut P) -> Result<RunSummary, RuntimeError> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    PluginRuntime::new(stdin.lock(), stdout.lock()).run(plugin)
}
