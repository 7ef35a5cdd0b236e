//! Line-oriented action encoding for the plugin -> host direction.

use crate::protocol::{encode_action, Action, ProtocolError};
use std::io::Write;

/// Writes one action per line and flushes after each, so the host sees every
/// action as soon as it is emitted.
pub struct ActionEmitter<W> {
    output: W,
    emitted: u64,
}

impl<W: Write> ActionEmitter<W> {
    pub fn new(output: W) -> Self {
        Self { output, emitted: 0 }
    }

    pub fn emit(&mut self, action: &Action) -> Result<(), ProtocolError> {
        let mut line = encode_action(action)?;
        line.push('\n');
        self.output
            .write_all(line.as_bytes())
            .map_err(ProtocolError::Write)?;
        self.output.flush().map_err(ProtocolError::Write)?;
        self.emitted += 1;
        tracing::trace!(action = %action.kind(), "emitted action");
        Ok(())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}
