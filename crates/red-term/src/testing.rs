// SPDX-License-Identifier: MIT
//
// In-memory terminal device for tests.
//
// `FakeDevice` scripts keyboard input and attribute failures, and records
// everything that reaches it in a shared `Journal`. The journal outlives the
// device (it's behind an `Rc`), so a test can hand the device to a session,
// let teardown drop it, and still count writes, restores and closes.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use crate::device::{Device, LineMode};

/// One observable thing that happened to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Bytes accepted by a single `write` call.
    Write(Vec<u8>),
    /// Attributes applied.
    SetAttributes(LineMode),
    /// The handle was dropped.
    Close,
}

/// Everything the device has seen.
#[derive(Debug)]
pub struct Journal {
    /// Line-discipline features currently on.
    pub active: LineMode,
    pub entries: Vec<Entry>,
}

impl Journal {
    /// All accepted bytes, concatenated in write order.
    pub fn written(&self) -> Vec<u8> {
        self.writes().concat()
    }

    /// Each `write` call's accepted bytes.
    pub fn writes(&self) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn attribute_writes(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::SetAttributes(_)))
            .count()
    }

    pub fn closes(&self) -> usize {
        self.entries.iter().filter(|e| **e == Entry::Close).count()
    }

    /// Written output as lossy UTF-8, for `contains` checks.
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written()).into_owned()
    }
}

/// Scripted terminal device.
pub struct FakeDevice {
    journal: Rc<RefCell<Journal>>,
    input: VecDeque<Result<u8, io::ErrorKind>>,
    fail_query: bool,
    fail_apply: bool,
    fail_write: bool,
    write_limit: Option<usize>,
}

impl FakeDevice {
    /// A cooked device (every line-discipline feature on) with no input.
    pub fn new() -> Self {
        Self {
            journal: Rc::new(RefCell::new(Journal {
                active: LineMode::all(),
                entries: Vec::new(),
            })),
            input: VecDeque::new(),
            fail_query: false,
            fail_apply: false,
            fail_write: false,
            write_limit: None,
        }
    }

    /// Queue keystrokes.
    pub fn with_input(mut self, bytes: &[u8]) -> Self {
        self.input.extend(bytes.iter().copied().map(Ok));
        self
    }

    /// Queue a read error after any queued keystrokes.
    pub fn with_read_error(mut self, kind: io::ErrorKind) -> Self {
        self.input.push_back(Err(kind));
        self
    }

    pub fn fail_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    pub fn fail_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn set_fail_apply(&mut self, fail: bool) {
        self.fail_apply = fail;
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_write = true;
        self
    }

    /// Accept at most `limit` bytes per `write` call.
    pub fn short_writes(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub fn journal(&self) -> Ref<'_, Journal> {
        self.journal.borrow()
    }

    /// Shared handle to the journal that stays valid after the device drops.
    pub fn handle(&self) -> Rc<RefCell<Journal>> {
        Rc::clone(&self.journal)
    }
}

impl Read for FakeDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.input.pop_front() {
            Some(Ok(byte)) => {
                buf[0] = byte;
                Ok(1)
            }
            Some(Err(kind)) => Err(io::Error::from(kind)),
            None => Ok(0),
        }
    }
}

impl Write for FakeDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_write {
            return Err(io::Error::other("device gone"));
        }
        let n = self.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        self.journal
            .borrow_mut()
            .entries
            .push(Entry::Write(buf[..n].to_vec()));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Device for FakeDevice {
    type Attributes = LineMode;
    const EXCLUSIVE: bool = false;

    fn attributes(&self) -> io::Result<LineMode> {
        if self.fail_query {
            return Err(io::Error::other("not a terminal"));
        }
        Ok(self.journal.borrow().active)
    }

    fn set_attributes(&mut self, attrs: &LineMode) -> io::Result<()> {
        if self.fail_apply {
            return Err(io::Error::other("invalid argument"));
        }
        let mut journal = self.journal.borrow_mut();
        journal.active = *attrs;
        journal.entries.push(Entry::SetAttributes(*attrs));
        Ok(())
    }

    fn raw_variant(&self, original: &LineMode, disable: LineMode) -> LineMode {
        original.difference(disable)
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.journal.borrow_mut().entries.push(Entry::Close);
    }
}

/// A `FakeDevice` that takes the process-wide raw-mode slot the way a real
/// terminal does.
pub struct ExclusiveDevice(FakeDevice);

impl ExclusiveDevice {
    pub fn new() -> Self {
        Self(FakeDevice::new())
    }

    pub fn journal(&self) -> Ref<'_, Journal> {
        self.0.journal()
    }
}

impl Read for ExclusiveDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for ExclusiveDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Device for ExclusiveDevice {
    type Attributes = LineMode;

    fn attributes(&self) -> io::Result<LineMode> {
        self.0.attributes()
    }

    fn set_attributes(&mut self, attrs: &LineMode) -> io::Result<()> {
        self.0.set_attributes(attrs)
    }

    fn raw_variant(&self, original: &LineMode, disable: LineMode) -> LineMode {
        self.0.raw_variant(original, disable)
    }
}
