// SPDX-License-Identifier: MIT
//
// Error kinds for terminal control.
//
// Every variant is fatal to the editor: nothing in this crate retries. The
// `Display` text doubles as the user-facing diagnostic, so each message names
// the failing operation first and the OS error text after a colon, the same
// shape `err(3)` prints.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A terminal control failure.
#[derive(Debug, Error)]
pub enum TermError {
    /// The terminal device could not be opened (missing device, permission,
    /// no controlling terminal).
    #[error("{}: {source}", .path.display())]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the current line-discipline attributes failed.
    #[error("get terminal attributes: {0}")]
    AttributeQueryFailed(#[source] io::Error),

    /// Applying the raw attribute set failed. Raw mode was not entered.
    #[error("enter raw mode: {0}")]
    AttributeApplyFailed(#[source] io::Error),

    /// Re-applying the saved attributes during teardown failed.
    #[error("restore terminal attributes: {0}")]
    AttributeRestoreFailed(#[source] io::Error),

    /// Another session in this process already holds the terminal in raw
    /// mode.
    #[error("enter raw mode: terminal already in raw mode")]
    RawModeHeld,

    /// The output buffer could not be allocated.
    #[error("allocate output buffer of {capacity} bytes")]
    AllocationFailed { capacity: usize },

    /// Reading a key from the device failed.
    #[error("read key: {0}")]
    ReadFailed(#[source] io::Error),

    /// Writing buffered output to the device failed.
    #[error("write to terminal: {0}")]
    WriteFailed(#[source] io::Error),

    /// A formatted escape sequence did not fit the scratch buffer.
    #[error("escape sequence exceeds {limit} bytes")]
    SequenceTooLong { limit: usize },

    /// The device handle was used after teardown closed it.
    #[error("terminal device already closed")]
    DeviceClosed,
}

/// Result alias for terminal control operations.
pub type Result<T> = std::result::Result<T, TermError>;

// ─── Tests ───────────────────────────────────────────────────────────────────
