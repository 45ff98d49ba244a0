//! Base/offset address windowing.
//!
//! Memory instructions carry a 16-bit offset in 64-byte units, reaching
//! at most 2^22 bytes past the live base register. The window adjuster
//! decides, per access, whether the current base still covers the
//! requested byte address or a SET of a new base must be issued first.

use crate::common::error::{IsaError, Result};

/// Addressing granule in bytes; bases and offsets are multiples of this.
pub const GRANULE: u64 = 64;

/// Bytes reachable from one base via the 16-bit offset field.
pub const WINDOW_SPAN: u64 = GRANULE << 16;

/// Outcome of fitting a byte address into the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    /// Offset field value, in 64-byte units.
    pub offset: u32,
    /// New base address to SET before the access, if the window moved.
    pub new_base: Option<u64>,
}

/// Tracks the live base register for one memory port.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseWindow {
    base: Option<u64>,
}

impl BaseWindow {
    /// Creates a window with no known base.
    pub const fn new() -> Self {
        Self { base: None }
    }

    /// The live base address, if one has been issued.
    pub const fn base(&self) -> Option<u64> {
        self.base
    }

    /// Forgets the live base.
    ///
    /// Called after scalar instructions, which may rewrite the base
    /// register behind the assembler's back.
    pub const fn invalidate(&mut self) {
        self.base = None;
    }

    /// Pins the base to an explicit address.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::MisalignedOffset`] if `addr` is not a
    /// multiple of the 64-byte granule.
    pub const fn set_base(&mut self, addr: u64) -> Result<()> {
        if !addr.is_multiple_of(GRANULE) {
            return Err(IsaError::MisalignedOffset(addr));
        }
        self.base = Some(addr);
        Ok(())
    }

    /// Fits `addr` into the window, moving the base if necessary.
    ///
    /// When the current base covers `addr`, only the offset field is
    /// returned. Otherwise the base moves to `addr` itself (already
    /// 64-byte aligned) and the offset is zero; the caller must emit
    /// the base SET before the access.
    ///
    /// # Errors
    ///
    /// Returns [`IsaError::MisalignedOffset`] if `addr` is not a
    /// multiple of the 64-byte granule.
    pub fn adjust(&mut self, addr: u64) -> Result<Adjustment> {
        if !addr.is_multiple_of(GRANULE) {
            return Err(IsaError::MisalignedOffset(addr));
        }
        if let Some(base) = self.base
            && addr >= base
            && addr - base < WINDOW_SPAN
        {
            // The window check bounds this below 2^16.
            return Ok(Adjustment {
                offset: ((addr - base) / GRANULE) as u32,
                new_base: None,
            });
        }
        self.base = Some(addr);
        Ok(Adjustment {
            offset: 0,
            new_base: Some(addr),
        })
    }
}
