// SPDX-License-Identifier: MIT
//
// Deferred panic reports.
//
// Rust's default hook prints the panic message the moment the panic starts,
// while the terminal is still raw and before unwinding has dropped the
// session. The hook installed here only records a one-line report for the
// panicking thread. Unwinding then runs the session's teardown, and `guard`
// prints the recorded report once the terminal is back to normal.

use std::any::Any;
use std::cell::RefCell;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;

use tracing::error;

use crate::session::{Exit, PROGRAM};

thread_local! {
    /// First panic report on this thread that nobody has taken yet.
    static REPORT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Ensures the hook is installed at most once per process.
static HOOK_INSTALLED: Once = Once::new();

/// Replace the panic hook with one that records the report instead of
/// printing it.
///
/// Test builds still forward to the previous hook, so a failing test's
/// message is not swallowed.
pub fn install_hook() {
    HOOK_INSTALLED.call_once(|| {
        #[cfg(test)]
        let previous = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let report = describe(info.location(), info.payload());
            error!(%report, "panic");
            let _ = REPORT.try_with(|slot| {
                slot.borrow_mut().get_or_insert(report);
            });

            #[cfg(test)]
            previous(info);
        }));
    });
}

/// Take this thread's recorded report, if it panicked. Only the first panic
/// is kept.
#[must_use]
pub fn take_report() -> Option<String> {
    REPORT.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
}

/// Run `body`, turning a panic into a reported failure.
///
/// The report goes to `diagnostics` only after `body` has fully unwound, so
/// everything it owned, the session included, has already restored the
/// terminal.
pub fn guard<W: Write>(diagnostics: &mut W, body: impl FnOnce(&mut W) -> Exit) -> Exit {
    install_hook();
    let _ = take_report();

    match panic::catch_unwind(AssertUnwindSafe(|| body(diagnostics))) {
        Ok(exit) => exit,
        Err(payload) => {
            let report = take_report().unwrap_or_else(|| describe(None, payload.as_ref()));
            let _ = writeln!(diagnostics, "{PROGRAM}: {report}");
            let _ = diagnostics.flush();
            Exit::Failure
        }
    }
}

/// `panicked at file:line:col: message`, on one line.
fn describe(location: Option<&Location<'_>>, payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Box<dyn Any>");
    let message = message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match location {
        Some(at) => format!(
            "panicked at {}:{}:{}: {message}",
            at.file(),
            at.line(),
            at.column()
        ),
        None => format!("panicked: {message}"),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
