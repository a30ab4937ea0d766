// SPDX-License-Identifier: MIT
//
// Input loop: render, read a byte, dispatch, repeat.
//
// Input is read a single raw byte at a time; there is no escape-sequence
// parsing. The only command is Ctrl-Q. Everything else is ignored for now
// and is where key bindings will hook in.

use tracing::{debug, trace};

use crate::device::Device;
use crate::error::Result;
use crate::session::Session;

/// The byte a terminal sends for Ctrl+`key`.
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1f
}

/// Ctrl-Q.
pub const QUIT: u8 = ctrl(b'q');

/// What a keystroke asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the loop normally.
    Quit,
    /// No binding.
    Ignore,
}

/// Map one input byte to a command.
#[must_use]
pub const fn dispatch(byte: u8) -> Command {
    match byte {
        QUIT => Command::Quit,
        _ => Command::Ignore,
    }
}

/// Run the editor loop until Ctrl-Q.
///
/// Each iteration renders a frame, then blocks for one byte. Returns `Ok`
/// on quit; teardown is the caller's job (see [`Session::finish`]).
///
/// # Errors
///
/// [`TermError::ReadFailed`](crate::error::TermError::ReadFailed) if reading
/// fails, or a write error from rendering.
pub fn run<D: Device>(session: &mut Session<D>) -> Result<()> {
    loop {
        session.screen()?.render_frame()?;

        let byte = session.read_byte()?;
        trace!(byte, "key");

        match dispatch(byte) {
            Command::Quit => {
                debug!("quit requested");
                return Ok(());
            }
            Command::Ignore => {}
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
