// SPDX-License-Identifier: MIT
//
// red, a small screen-oriented text editor.
//
// The binary is a thin shell around red-term:
//
//   environment → Config → log file → editor::run → exit status
//
// Panics are caught by `panic::guard`, after unwinding has dropped the
// session and restored the terminal, and only then reported. Quit with
// Ctrl-Q.

mod logging;

use std::io;
use std::process::ExitCode;

use red_term::config::Config;
use red_term::{editor, panic as deferred};
use tracing::info;

fn main() -> ExitCode {
    let config = Config::from_env();
    if logging::init(&config.log) {
        info!(version = env!("CARGO_PKG_VERSION"), "red starting");
    }

    deferred::guard(&mut io::stderr(), |diagnostics| {
        editor::run(&config, diagnostics)
    })
    .into()
}
