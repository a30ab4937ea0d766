// SPDX-License-Identifier: MIT
//
// red-term: terminal control for the red editor.
//
// Takes exclusive hold of the controlling terminal, puts it in raw mode so
// every keystroke arrives as one unprocessed byte, draws with ANSI escape
// sequences through a single-write output buffer, and puts the terminal back
// exactly as it was on every way out: quit, fatal error, or panic.
//
// Layering, leaves first:
//
//   device   → the terminal handle and its line-discipline attributes
//   mode     → raw mode entry and idempotent restore
//   output   → fixed-capacity coalescing buffer
//   ansi     → escape sequences
//   screen   → clear / move / frame drawing through the buffer
//   session  → lifecycle, ordered teardown, diagnostics
//   input    → one byte, one dispatch
//   editor   → the whole run, start to exit status

pub mod ansi;
pub mod config;
pub mod device;
pub mod editor;
pub mod error;
pub mod input;
pub mod mode;
pub mod output;
pub mod panic;
pub mod screen;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{Config, Geometry};
pub use error::{Result, TermError};
pub use session::{Exit, Session};
