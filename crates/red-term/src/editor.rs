// SPDX-License-Identifier: MIT
//
// The editor's whole life, start to exit status.
//
// open device → allocate buffer → raw mode → [alternate screen] → input loop
//
// Every failure after the device is open goes through `Session::finish`, so
// the terminal is restored before the diagnostic is printed. A failure to
// open the device has nothing to restore and is reported directly.

use std::io::Write;

use tracing::info;

use crate::config::Config;
use crate::device::Device;
use crate::error::Result;
use crate::input;
use crate::session::{self, Exit, Session};

/// Open the configured terminal and run the editor on it.
#[cfg(unix)]
pub fn run(config: &Config, diagnostics: &mut impl Write) -> Exit {
    match crate::device::TtyDevice::open(&config.device) {
        Ok(device) => run_on(device, config, diagnostics),
        Err(err) => {
            session::report(diagnostics, &err);
            Exit::Failure
        }
    }
}

/// Run the editor on an already-open `device`.
pub fn run_on<D: Device>(device: D, config: &Config, diagnostics: &mut impl Write) -> Exit {
    info!(device = %config.device.display(), ?config.geometry, "starting");

    let mut session = match Session::new(device, config.geometry) {
        Ok(session) => session,
        Err(err) => {
            session::report(diagnostics, &err);
            return Exit::Failure;
        }
    };

    let outcome = start(&mut session, config).and_then(|()| input::run(&mut session));
    session.finish(outcome, diagnostics)
}

fn start<D: Device>(session: &mut Session<D>, config: &Config) -> Result<()> {
    session.enter_raw_mode(config.line_mode)?;
    if config.alternate_screen {
        session.enter_alternate_screen()?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
