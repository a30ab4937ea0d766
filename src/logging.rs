// SPDX-License-Identifier: MIT
//
// Log file setup.
//
// The terminal is raw for the whole run, so nothing may be logged to it.
// Logs go to a file, and only when `RED_LOG` asks for them.

use std::fs::OpenOptions;
use std::sync::Mutex;

use red_term::config::LogSettings;
use tracing_subscriber::EnvFilter;

/// Directive used when `RED_LOG` doesn't parse.
const FALLBACK_FILTER: &str = "info";

/// Install the global subscriber described by `settings`.
///
/// Returns whether logging is active. Failing to open the log file just
/// leaves logging off; the editor runs the same either way.
pub fn init(settings: &LogSettings) -> bool {
    let Some(directive) = settings.filter.as_deref() else {
        return false;
    };

    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)
    else {
        return false;
    };

    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
