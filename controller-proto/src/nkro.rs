//! N-key-rollover keyboard report.
//!
//! Layout (32 bytes, excluding the report ID):
//!
//! ```text
//! byte 0      modifier bits, usages 0xE0..=0xE7 (bit = usage - 0xE0)
//! byte 1..=31 keycode bitmap, usage `code` at byte code / 8 + 1, bit code % 8
//! ```
//!
//! Usages whose byte would land past the end of the bitmap are dropped.

use crate::keycode::{is_modifier, MODIFIER_FIRST};

/// Keyboard bitmap report with room for up to 248 simultaneous keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NkroReport([u8; NkroReport::SIZE]);

impl NkroReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 32;

    /// Number of bitmap bytes following the modifier byte.
    pub const BITMAP_BYTES: usize = Self::SIZE - 1;

    /// An empty report (no keys pressed).
    #[must_use]
    pub const fn new() -> Self {
        Self([0; Self::SIZE])
    }

    /// Mark a usage as pressed.
    ///
    /// Returns `false` if the usage cannot be represented and was dropped.
    pub fn press(&mut self, code: u8) -> bool {
        match Self::locate(code) {
            Some((byte, bit)) => {
                self.0[byte] |= 1 << bit;
                true
            }
            None => false,
        }
    }

    /// Check whether a usage is marked as pressed.
    #[must_use]
    pub fn is_pressed(&self, code: u8) -> bool {
        Self::locate(code).is_some_and(|(byte, bit)| self.0[byte] & (1 << bit) != 0)
    }

    /// The modifier byte.
    #[inline]
    #[must_use]
    pub const fn modifiers(&self) -> u8 {
        self.0[0]
    }

    /// Check if no keys are pressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Raw report bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Byte index and bit position of a usage, if representable.
    #[inline]
    fn locate(code: u8) -> Option<(usize, u8)> {
        if is_modifier(code) {
            return Some((0, code - MODIFIER_FIRST));
        }
        let byte = usize::from(code / 8) + 1;
        (byte <= Self::BITMAP_BYTES).then_some((byte, code % 8))
    }
}

impl Default for NkroReport {
    fn default() -> Self {
        Self::new()
    }
}
