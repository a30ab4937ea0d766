// SPDX-License-Identifier: MIT
//
// The terminal device, the one handle everything else talks through.
//
// Safety: the unix implementation calls tcgetattr/tcsetattr on the device's
// file descriptor. These are the standard POSIX interfaces for line
// discipline control and there is no safe alternative in std.
#![allow(unsafe_code)]
//
// The editor never touches stdin or stdout. It opens the controlling terminal
// directly (`/dev/tty`), reads single keystrokes from it and writes escape
// sequences to it. The `Device` trait is the seam: the session, renderer and
// input loop are generic over it, so tests drive the whole lifecycle against
// an in-memory device while the binary uses `TtyDevice`.

use std::io::{self, Read, Write};

use bitflags::bitflags;

// ─── LineMode ────────────────────────────────────────────────────────────────

bitflags! {
    /// Line-discipline features, as a set.
    ///
    /// Used as the set of features raw mode turns *off*. The in-memory test
    /// device also uses it as its attribute type: the set of features
    /// currently on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineMode: u8 {
        /// Line-buffered input with editing (ICANON).
        const CANONICAL         = 1 << 0;
        /// Local echo of typed characters (ECHO).
        const ECHO              = 1 << 1;
        /// Ctrl-S / Ctrl-Q start/stop output flow control (IXON).
        const FLOW_CONTROL      = 1 << 2;
        /// Ctrl-C / Ctrl-Z / Ctrl-\ generate signals (ISIG).
        const SIGNALS           = 1 << 3;
        /// Output post-processing such as NL → CRNL (OPOST).
        const OUTPUT_PROCESSING = 1 << 4;
    }
}

impl LineMode {
    /// The standard raw profile: every keystroke, including Ctrl-Q and
    /// Ctrl-S, arrives as one unechoed byte.
    pub const RAW: Self = Self::CANONICAL
        .union(Self::ECHO)
        .union(Self::FLOW_CONTROL);

    /// The `cfmakeraw` profile: [`RAW`](Self::RAW) plus no signal keys and
    /// no output post-processing.
    pub const FULL_RAW: Self = Self::RAW
        .union(Self::SIGNALS)
        .union(Self::OUTPUT_PROCESSING);
}

impl Default for LineMode {
    fn default() -> Self {
        Self::RAW
    }
}

// ─── Device ──────────────────────────────────────────────────────────────────

/// A terminal device: a byte stream plus line-discipline attributes.
///
/// `Read` delivers keystrokes, `Write` receives escape sequences. The output
/// buffer relies on one `write` call being one system call, so
/// implementations must not buffer internally.
///
/// Closing is dropping: the session releases the handle by dropping it.
pub trait Device: Read + Write {
    /// Snapshot of the line-discipline configuration.
    type Attributes: Clone;

    /// Whether raw mode on this device takes the process's single raw-mode
    /// slot. True for real terminals; in-memory devices opt out.
    const EXCLUSIVE: bool = true;

    /// Query the current attributes.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the query fails.
    fn attributes(&self) -> io::Result<Self::Attributes>;

    /// Apply `attrs` immediately.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the apply fails. The previous attributes are
    /// then still in effect.
    fn set_attributes(&mut self, attrs: &Self::Attributes) -> io::Result<()>;

    /// Derive the raw variant of `original` with the features in `disable`
    /// switched off. Pure: nothing is applied.
    fn raw_variant(&self, original: &Self::Attributes, disable: LineMode) -> Self::Attributes;
}

// ─── TtyDevice ───────────────────────────────────────────────────────────────

#[cfg(unix)]
pub use unix::TtyDevice;

#[cfg(unix)]
mod unix {
    use std::fs::{File, OpenOptions};
    use std::io::{self, Read, Write};
    use std::os::unix::io::AsRawFd;
    use std::path::{Path, PathBuf};

    use tracing::debug;

    use super::{Device, LineMode};
    use crate::error::{Result, TermError};

    /// The controlling terminal, opened read+write.
    #[derive(Debug)]
    pub struct TtyDevice {
        file: File,
        path: PathBuf,
    }

    impl TtyDevice {
        /// Open the terminal device at `path` for reading and writing.
        ///
        /// # Errors
        ///
        /// [`TermError::DeviceUnavailable`] if the open fails.
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|source| TermError::DeviceUnavailable {
                    path: path.to_path_buf(),
                    source,
                })?;

            debug!(path = %path.display(), fd = file.as_raw_fd(), "opened terminal device");
            Ok(Self {
                file,
                path: path.to_path_buf(),
            })
        }

        /// The path this device was opened from.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Read for TtyDevice {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.file.read(buf)
        }
    }

    impl Write for TtyDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.file.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl Device for TtyDevice {
        type Attributes = libc::termios;

        fn attributes(&self) -> io::Result<libc::termios> {
            let fd = self.file.as_raw_fd();
            unsafe {
                let mut termios: libc::termios = std::mem::zeroed();
                if libc::tcgetattr(fd, &raw mut termios) != 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(termios)
            }
        }

        fn set_attributes(&mut self, attrs: &libc::termios) -> io::Result<()> {
            let fd = self.file.as_raw_fd();
            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, attrs) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            Ok(())
        }

        fn raw_variant(&self, original: &libc::termios, disable: LineMode) -> libc::termios {
            let mut raw = *original;

            if disable.contains(LineMode::CANONICAL) {
                raw.c_lflag &= !libc::ICANON;
                // VMIN=1, VTIME=0: read() blocks until one byte is available.
                raw.c_cc[libc::VMIN] = 1;
                raw.c_cc[libc::VTIME] = 0;
            }
            if disable.contains(LineMode::ECHO) {
                raw.c_lflag &= !(libc::ECHO | libc::ECHONL);
            }
            if disable.contains(LineMode::FLOW_CONTROL) {
                raw.c_iflag &= !libc::IXON;
            }
            if disable.contains(LineMode::SIGNALS) {
                raw.c_lflag &= !(libc::ISIG | libc::IEXTEN);
            }
            if disable.contains(LineMode::OUTPUT_PROCESSING) {
                raw.c_oflag &= !libc::OPOST;
            }

            raw
        }
    }

}

// ─── Tests ───────────────────────────────────────────────────────────────────
