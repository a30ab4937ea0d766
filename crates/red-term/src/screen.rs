// SPDX-License-Identifier: MIT
//
// Screen rendering.
//
// A `Screen` is a short-lived view pairing the output buffer with the device
// it drains into. Each method emits one escape sequence through the buffer;
// nothing reaches the device until a flush, explicit or forced by overflow.

use std::io::Write;

use crate::ansi;
use crate::config::Geometry;
use crate::error::Result;
use crate::output::OutputBuffer;

/// Escape-sequence emitter over an [`OutputBuffer`].
pub struct Screen<'a, W: Write> {
    output: &'a mut OutputBuffer,
    out: &'a mut W,
}

impl<'a, W: Write> Screen<'a, W> {
    pub const fn new(output: &'a mut OutputBuffer, out: &'a mut W) -> Self {
        Self { output, out }
    }

    /// Erase the entire display.
    ///
    /// # Errors
    ///
    /// Propagates a failed overflow flush.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.output.append(self.out, ansi::ERASE_DISPLAY)
    }

    /// Move the cursor to zero-based `(row, col)`.
    ///
    /// # Errors
    ///
    /// Propagates a failed overflow flush.
    pub fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        let seq = ansi::cursor_position(row, col)?;
        self.output.append(self.out, seq.as_bytes())
    }

    /// Erase the line the cursor is on.
    ///
    /// # Errors
    ///
    /// Propagates a failed overflow flush.
    pub fn clear_line(&mut self) -> Result<()> {
        self.output.append(self.out, ansi::ERASE_LINE)
    }

    /// Emit raw bytes (mode switches and the like).
    ///
    /// # Errors
    ///
    /// Propagates a failed overflow flush.
    pub fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.append(self.out, bytes)
    }

    /// Push everything buffered to the device.
    ///
    /// # Errors
    ///
    /// [`TermError::WriteFailed`](crate::error::TermError::WriteFailed) if
    /// the write fails.
    pub fn flush(&mut self) -> Result<usize> {
        self.output.flush(self.out)
    }

    /// Draw one frame: blank screen, cursor home.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn render_frame(&mut self) -> Result<()> {
        self.clear_screen()?;
        self.move_cursor(0, 0)?;
        self.flush()?;
        Ok(())
    }

    /// Leave the screen tidy for the shell: cursor at the bottom-left on a
    /// blank line.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn tidy(&mut self, geometry: Geometry) -> Result<()> {
        self.move_cursor(geometry.last_row(), 0)?;
        self.clear_line()?;
        self.flush()?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
