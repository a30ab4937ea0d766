// SPDX-License-Identifier: MIT
//
// ANSI/VT100 escape sequences.
//
// Fixed sequences are byte constants. Parameterized ones are formatted into
// a `Sequence`, a small stack buffer with a hard size limit: formatting that
// would overrun it is an error, never a truncation. The limit covers the
// widest cursor-position command any `u16` row and column can produce.
//
// Cursor positions are 0-indexed in our API and converted to the terminal's
// 1-indexed convention here, nowhere else.

use std::fmt;
use std::io::Write;

use crate::error::{Result, TermError};

/// Control Sequence Introducer.
pub const CSI: &[u8] = b"\x1b[";

/// Erase the entire display (ED 2).
pub const ERASE_DISPLAY: &[u8] = b"\x1b[2J";

/// Erase the whole line the cursor is on (EL 2).
pub const ERASE_LINE: &[u8] = b"\x1b[2K";

/// Switch to the alternate screen buffer (DEC private mode 1049).
pub const ENTER_ALT_SCREEN: &[u8] = b"\x1b[?1049h";

/// Return to the main screen buffer.
pub const LEAVE_ALT_SCREEN: &[u8] = b"\x1b[?1049l";

/// Scratch size for one formatted sequence.
pub const SEQUENCE_MAX: usize = 16;

// `ESC [ 65536 ; 65536 H`: five digits each once converted to 1-based.
const CURSOR_POSITION_MAX: usize = CSI.len() + 5 + 1 + 5 + 1;
const _: () = assert!(CURSOR_POSITION_MAX <= SEQUENCE_MAX);

// ─── Sequence ────────────────────────────────────────────────────────────────

/// One formatted escape sequence, at most [`SEQUENCE_MAX`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    bytes: [u8; SEQUENCE_MAX],
    len: usize,
}

impl Sequence {
    /// Format `args` into a fresh sequence.
    ///
    /// # Errors
    ///
    /// [`TermError::SequenceTooLong`] if the output exceeds the scratch size.
    pub fn format(args: fmt::Arguments<'_>) -> Result<Self> {
        let mut bytes = [0u8; SEQUENCE_MAX];
        let mut rest: &mut [u8] = &mut bytes;
        // Writing into a slice fails with WriteZero once it's full.
        rest.write_fmt(args)
            .map_err(|_| TermError::SequenceTooLong {
                limit: SEQUENCE_MAX,
            })?;
        let len = SEQUENCE_MAX - rest.len();
        Ok(Self { bytes, len })
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Cursor Position (CUP) to zero-based `(row, col)`.
///
/// # Errors
///
/// Never for `u16` coordinates; the scratch size is checked at compile time.
/// Still returns the formatting guard's error rather than assuming it.
#[inline]
pub fn cursor_position(row: u16, col: u16) -> Result<Sequence> {
    Sequence::format(format_args!(
        "\x1b[{};{}H",
        u32::from(row) + 1,
        u32::from(col) + 1
    ))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
