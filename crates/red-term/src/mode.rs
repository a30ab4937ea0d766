// SPDX-License-Identifier: MIT
//
// Raw mode entry and restore.
//
// The controller captures the device's attributes exactly once, before
// anything is changed, and is the only thing that ever puts them back.
// `restore` is a no-op unless raw mode is actually in effect, which makes it
// safe to call from every exit path: after a failed entry, twice in a row,
// or on a handle that was never touched.
//
// A process has one controlling terminal, so at most one controller may hold
// a real terminal raw at a time. That slot is a process-wide flag, taken
// before the attributes are touched and given back once they are restored.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::device::{Device, LineMode};
use crate::error::{Result, TermError};

/// Set while some controller holds an exclusive device raw.
static RAW_MODE_HELD: AtomicBool = AtomicBool::new(false);

// ─── RawModeClaim ────────────────────────────────────────────────────────────

/// The process's single raw-mode slot. Released on drop.
#[derive(Debug)]
pub struct RawModeClaim {
    _slot: (),
}

impl RawModeClaim {
    /// Take the slot.
    ///
    /// # Errors
    ///
    /// [`TermError::RawModeHeld`] if another claim is alive.
    pub fn acquire() -> Result<Self> {
        RAW_MODE_HELD
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { _slot: () })
            .map_err(|_| TermError::RawModeHeld)
    }
}

impl Drop for RawModeClaim {
    fn drop(&mut self) {
        RAW_MODE_HELD.store(false, Ordering::Release);
    }
}

// ─── ModeController ──────────────────────────────────────────────────────────

/// Owns the saved attributes and knows whether raw mode is in effect.
#[derive(Debug)]
pub struct ModeController<A> {
    /// Attributes captured before the first mutation.
    saved: Option<A>,
    /// Whether the raw variant is currently applied.
    raw: bool,
    /// Held while an exclusive device is raw.
    claim: Option<RawModeClaim>,
}

impl<A: Clone> ModeController<A> {
    /// A controller that has not touched the device.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            saved: None,
            raw: false,
            claim: None,
        }
    }

    /// Whether raw mode is in effect.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.raw
    }

    /// The attributes that [`restore`](Self::restore) will re-apply.
    #[inline]
    #[must_use]
    pub const fn saved(&self) -> Option<&A> {
        self.saved.as_ref()
    }

    /// Capture the current attributes and apply a raw variant with the
    /// features in `disable` switched off.
    ///
    /// Idempotent: entering while already raw does nothing, so there is never
    /// more than one snapshot to restore.
    ///
    /// # Errors
    ///
    /// - [`TermError::RawModeHeld`] if `D` is exclusive and another
    ///   controller already holds a device raw. Nothing was touched.
    /// - [`TermError::AttributeQueryFailed`] if the attributes can't be read.
    ///   Nothing was captured or changed.
    /// - [`TermError::AttributeApplyFailed`] if the raw set can't be applied.
    ///   The snapshot is kept but raw mode is not considered entered, so a
    ///   later restore is a no-op.
    pub fn enter_raw_mode<D>(&mut self, device: &mut D, disable: LineMode) -> Result<()>
    where
        D: Device<Attributes = A>,
    {
        if self.raw {
            return Ok(());
        }
        let claim = if D::EXCLUSIVE {
            Some(RawModeClaim::acquire()?)
        } else {
            None
        };

        let original = device
            .attributes()
            .map_err(TermError::AttributeQueryFailed)?;
        let raw = device.raw_variant(&original, disable);
        self.saved = Some(original);

        device
            .set_attributes(&raw)
            .map_err(TermError::AttributeApplyFailed)?;
        self.raw = true;
        self.claim = claim;

        debug!(?disable, "entered raw mode");
        Ok(())
    }

    /// Re-apply the saved attributes.
    ///
    /// No-op if raw mode is not in effect.
    ///
    /// # Errors
    ///
    /// [`TermError::AttributeRestoreFailed`] if the apply fails. The
    /// controller then still considers the device raw and keeps its claim.
    pub fn restore<D>(&mut self, device: &mut D) -> Result<()>
    where
        D: Device<Attributes = A>,
    {
        if !self.raw {
            return Ok(());
        }
        let Some(saved) = self.saved.as_ref() else {
            return Ok(());
        };

        device
            .set_attributes(saved)
            .map_err(TermError::AttributeRestoreFailed)?;
        self.raw = false;
        self.claim = None;

        debug!("restored terminal attributes");
        Ok(())
    }
}

impl<A: Clone> Default for ModeController<A> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
