// SPDX-License-Identifier: MIT
//
// Terminal session lifecycle and failure handling.
//
// A `Session` owns everything with process lifetime: the device handle, the
// raw-mode controller holding the saved attributes, and the output buffer.
// Its phase moves one way only:
//
//   Running ──(quit │ fatal error │ drop)──▶ TearingDown ──(finish)──▶ Exited
//
// Teardown runs on the first trigger and never again. The order is fixed:
//
//   1. cursor to the bottom-left, clear that line   (tidy screen)
//   2. flush the output buffer
//   3. restore the saved attributes                  (leave raw mode)
//   4. close the device                              (drop the handle)
//
// Diagnostics are printed only after step 4, by `finish`. Printing earlier
// would land in a raw terminal and garble the user's shell.
//
// `Drop` calls the same teardown, so an early return or a panic unwinding
// through the session still restores the terminal. When `finish` already
// ran, the drop is a no-op.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::ansi;
use crate::config::Geometry;
use crate::device::{Device, LineMode};
use crate::error::{Result, TermError};
use crate::mode::ModeController;
use crate::output::OutputBuffer;
use crate::screen::Screen;

/// Program name that prefixes every diagnostic.
pub const PROGRAM: &str = "red";

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Normal operation.
    Running,
    /// Teardown has started. Further triggers are ignored.
    TearingDown,
    /// Teardown done and the outcome reported.
    Exited,
}

// ─── Exit ────────────────────────────────────────────────────────────────────

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Normal quit, status 0.
    Success,
    /// Fatal condition, status 1.
    Failure,
}

impl Exit {
    /// The process exit status.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

impl From<Exit> for std::process::ExitCode {
    fn from(exit: Exit) -> Self {
        Self::from(exit.code())
    }
}

/// Write `err` as a one-line diagnostic: `red: <message>`.
///
/// Errors writing the diagnostic itself are ignored; there is nowhere left
/// to report them.
pub fn report(diagnostics: &mut impl Write, err: &TermError) {
    let _ = writeln!(diagnostics, "{PROGRAM}: {err}");
    let _ = diagnostics.flush();
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Exclusive owner of the terminal for the life of the editor.
pub struct Session<D: Device> {
    /// `None` once teardown has closed it.
    device: Option<D>,
    mode: ModeController<D::Attributes>,
    output: OutputBuffer,
    geometry: Geometry,
    phase: Phase,
    /// Whether the alternate screen was entered and must be left.
    alternate_screen: bool,
}

impl<D: Device> Session<D> {
    /// Take ownership of `device` and allocate the output buffer for
    /// `geometry`. The device is not modified.
    ///
    /// # Errors
    ///
    /// [`TermError::AllocationFailed`] if the buffer can't be allocated. The
    /// device is closed (dropped) and was never changed.
    pub fn new(device: D, geometry: Geometry) -> Result<Self> {
        let output = OutputBuffer::for_geometry(geometry)?;
        debug!(
            rows = geometry.rows,
            cols = geometry.cols,
            capacity = output.capacity(),
            "session started"
        );
        Ok(Self {
            device: Some(device),
            mode: ModeController::new(),
            output,
            geometry,
            phase: Phase::Running,
            alternate_screen: false,
        })
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether raw mode is in effect.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.mode.is_raw()
    }

    #[inline]
    #[must_use]
    pub const fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Switch the device to raw mode, disabling the features in `disable`.
    ///
    /// # Errors
    ///
    /// [`TermError::AttributeQueryFailed`] or
    /// [`TermError::AttributeApplyFailed`]; in both cases the device is left
    /// as it was. [`TermError::RawModeHeld`] if another session already
    /// holds the terminal raw. [`TermError::DeviceClosed`] after teardown.
    pub fn enter_raw_mode(&mut self, disable: LineMode) -> Result<()> {
        self.mode.enter_raw_mode(live_device(&mut self.device)?, disable)
    }

    /// Switch to the alternate screen. Teardown switches back.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn enter_alternate_screen(&mut self) -> Result<()> {
        if self.alternate_screen {
            return Ok(());
        }
        let mut screen = self.screen()?;
        screen.emit(ansi::ENTER_ALT_SCREEN)?;
        screen.flush()?;
        self.alternate_screen = true;
        Ok(())
    }

    /// A renderer over this session's buffer and device.
    ///
    /// # Errors
    ///
    /// [`TermError::DeviceClosed`] after teardown.
    pub fn screen(&mut self) -> Result<Screen<'_, D>> {
        Ok(Screen::new(&mut self.output, live_device(&mut self.device)?))
    }

    /// Block until one byte arrives from the device.
    ///
    /// Reads interrupted by a signal are re-issued. End of file means the
    /// terminal hung up, and is an error like any other read failure.
    ///
    /// # Errors
    ///
    /// [`TermError::ReadFailed`] if the read fails or hits end of file.
    pub fn read_byte(&mut self) -> Result<u8> {
        let device = live_device(&mut self.device)?;
        let mut byte = [0u8; 1];
        loop {
            match device.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => {
                    return Err(TermError::ReadFailed(io::Error::from(
                        io::ErrorKind::UnexpectedEof,
                    )));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TermError::ReadFailed(e)),
            }
        }
    }

    /// Restore the terminal and release the device. Runs once; later calls
    /// return `Ok(())` without touching anything.
    ///
    /// Every step is attempted even if an earlier one fails, so a broken
    /// screen write never keeps the attributes from being restored.
    ///
    /// # Errors
    ///
    /// The restore error if restoring failed, otherwise the first screen
    /// write error.
    pub fn teardown(&mut self) -> Result<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }
        self.phase = Phase::TearingDown;

        let Some(mut device) = self.device.take() else {
            return Ok(());
        };

        let mut screen = Screen::new(&mut self.output, &mut device);
        let mut tidied = screen.tidy(self.geometry);
        if self.alternate_screen {
            let left = screen
                .emit(ansi::LEAVE_ALT_SCREEN)
                .and_then(|()| screen.flush().map(drop));
            tidied = tidied.and(left);
            self.alternate_screen = false;
        }

        let restored = self.mode.restore(&mut device);
        drop(device);

        debug!(
            tidied = tidied.is_ok(),
            restored = restored.is_ok(),
            "terminal released"
        );
        restored.and(tidied)
    }

    /// Tear down (if not already done), report the outcome and say how to
    /// exit.
    ///
    /// `outcome` is the result of the editor's run. A teardown failure
    /// after a successful run is itself fatal; after a failed run it's
    /// logged and the original error is the one reported.
    pub fn finish(mut self, outcome: Result<()>, diagnostics: &mut impl Write) -> Exit {
        let released = self.teardown();
        self.phase = Phase::Exited;

        let failure = match (outcome, released) {
            (Ok(()), Ok(())) => None,
            (Ok(()), Err(e)) | (Err(e), Ok(())) => Some(e),
            (Err(e), Err(teardown)) => {
                warn!(error = %teardown, "teardown failed after a fatal error");
                Some(e)
            }
        };

        match failure {
            None => {
                info!("exiting normally");
                Exit::Success
            }
            Some(err) => {
                warn!(error = %err, "exiting after fatal error");
                report(diagnostics, &err);
                Exit::Failure
            }
        }
    }
}

/// The device, unless teardown already closed it.
fn live_device<D>(device: &mut Option<D>) -> Result<&mut D> {
    device.as_mut().ok_or(TermError::DeviceClosed)
}

impl<D: Device> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "teardown on drop failed");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
