// SPDX-License-Identifier: MIT
//
// Startup configuration, resolved once from the environment.
//
// Everything is read through a lookup function rather than `std::env`
// directly, so tests hand in a map and never mutate the process environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::device::LineMode;

/// Device opened when `RED_TTY` is unset.
pub const DEFAULT_DEVICE: &str = "/dev/tty";

// ─── Geometry ────────────────────────────────────────────────────────────────

/// Screen size in character cells.
///
/// Fixed for the life of the process: there is no resize handling, so this
/// is what the environment said at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub rows: u16,
    pub cols: u16,
}

impl Geometry {
    /// The classic VT100 screen.
    pub const DEFAULT: Self = Self { rows: 24, cols: 80 };

    /// Bytes of output buffer per screen cell. A frame of escape sequences
    /// rarely needs more than two bytes per cell.
    pub const BYTES_PER_CELL: usize = 2;

    /// Geometry from `LINES` / `COLUMNS` values.
    ///
    /// Both must parse as positive integers; if either is missing, zero or
    /// not a number, both fall back to [`DEFAULT`](Self::DEFAULT).
    #[must_use]
    pub fn from_vars(lines: Option<&str>, columns: Option<&str>) -> Self {
        match (parse_dimension(lines), parse_dimension(columns)) {
            (Some(rows), Some(cols)) => Self { rows, cols },
            _ => Self::DEFAULT,
        }
    }

    /// Output buffer capacity for one frame: `rows × cols × 2`, or `None`
    /// if that doesn't fit in a `usize`.
    #[inline]
    #[must_use]
    pub const fn buffer_capacity(self) -> Option<usize> {
        match (self.rows as usize).checked_mul(self.cols as usize) {
            Some(cells) => cells.checked_mul(Self::BYTES_PER_CELL),
            None => None,
        }
    }

    /// Zero-based index of the bottom row.
    #[inline]
    #[must_use]
    pub const fn last_row(self) -> u16 {
        self.rows.saturating_sub(1)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn parse_dimension(value: Option<&str>) -> Option<u16> {
    value?.trim().parse::<u16>().ok().filter(|&n| n > 0)
}

// ─── LogSettings ─────────────────────────────────────────────────────────────

/// Where diagnostics beyond the exit message go.
///
/// The terminal is in raw mode while the editor runs, so logs only ever go
/// to a file, and only when a filter is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `RED_LOG`, a tracing filter directive such as `debug`.
    pub filter: Option<String>,
    /// `RED_LOG_FILE`, or `red.log` in the temp directory.
    pub file: PathBuf,
}

impl LogSettings {
    /// Whether logging was requested.
    #[inline]
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.filter.is_some()
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Everything the editor needs to know before it touches the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Terminal device path (`RED_TTY`).
    pub device: PathBuf,
    /// Screen size (`LINES`, `COLUMNS`).
    pub geometry: Geometry,
    /// Line-discipline features raw mode disables (`RED_RAW=full`).
    pub line_mode: LineMode,
    /// Switch to the alternate screen while running (`RED_ALT_SCREEN`).
    pub alternate_screen: bool,
    /// Log file settings (`RED_LOG`, `RED_LOG_FILE`).
    pub log: LogSettings,
}

impl Config {
    /// Resolve configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from a map of variables.
    #[must_use]
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Resolve configuration through `lookup`, which returns the value of an
    /// environment variable or `None` if unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let device = lookup("RED_TTY")
            .filter(|p| !p.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DEVICE), PathBuf::from);

        let geometry = Geometry::from_vars(
            lookup("LINES").as_deref(),
            lookup("COLUMNS").as_deref(),
        );

        let line_mode = match lookup("RED_RAW").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("full") => LineMode::FULL_RAW,
            _ => LineMode::RAW,
        };

        let alternate_screen = lookup("RED_ALT_SCREEN")
            .as_deref()
            .is_some_and(is_truthy);

        let log = LogSettings {
            filter: lookup("RED_LOG").filter(|f| !f.trim().is_empty()),
            file: lookup("RED_LOG_FILE")
                .filter(|p| !p.is_empty())
                .map_or_else(|| env::temp_dir().join("red.log"), PathBuf::from),
        };

        Self {
            device,
            geometry,
            line_mode,
            alternate_screen,
            log,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
