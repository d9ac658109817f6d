//! Rotary encoder tracking.
//!
//! The hardware pulse counter is a free-running `u32` written by the capture
//! tasks. The tracker turns successive snapshots of it into signed per-cycle
//! deltas and an absolute position that survives counter wraparound.
//!
//! # Rollover safety
//!
//! `snapshot.wrapping_sub(previous) as i32` is the true signed delta as long
//! as less than half the counter range passed between snapshots, so a wrap
//! from `0xFFFF_FFF0` to `0x0000_0005` reads as `+21`. Deltas larger than the
//! configured rollover threshold cannot come from a real knob and are dropped.

/// Result of feeding one counter snapshot to an [`EncoderTracker`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderSample {
    /// Signed rotation since the previous snapshot, polarity applied.
    pub delta: i32,
    /// The raw delta exceeded the rollover threshold and was dropped.
    pub discarded: bool,
}

/// Per-encoder tracking state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderTracker {
    previous_raw: u32,
    accumulated: i64,
    reverse: bool,
    pulses_per_rev: u32,
    rollover: u32,
}

impl EncoderTracker {
    /// Create a tracker for a counter that starts at zero.
    ///
    /// `pulses_per_rev` must be non-zero.
    #[must_use]
    pub const fn new(reverse: bool, pulses_per_rev: u32, rollover: u32) -> Self {
        Self {
            previous_raw: 0,
            accumulated: 0,
            reverse,
            pulses_per_rev,
            rollover,
        }
    }

    /// Feed one snapshot of the raw counter.
    ///
    /// The caller takes the snapshot once and passes the same value to every
    /// derived computation of the cycle.
    pub fn update(&mut self, snapshot: u32) -> EncoderSample {
        let raw_delta = snapshot.wrapping_sub(self.previous_raw) as i32;
        self.previous_raw = snapshot;

        if raw_delta.unsigned_abs() > self.rollover {
            return EncoderSample {
                delta: 0,
                discarded: true,
            };
        }

        let delta = if self.reverse { -raw_delta } else { raw_delta };
        self.accumulated += i64::from(delta);
        EncoderSample {
            delta,
            discarded: false,
        }
    }

    /// Total signed rotation since boot, in pulses.
    #[inline]
    #[must_use]
    pub const fn accumulated(&self) -> i64 {
        self.accumulated
    }

    /// Absolute position wrapped into `[0, pulses_per_rev)`.
    #[inline]
    #[must_use]
    pub fn position(&self) -> u32 {
        // rem_euclid is non-negative and below pulses_per_rev, so it fits u32
        self.accumulated.rem_euclid(i64::from(self.pulses_per_rev)) as u32
    }

    /// Wrapped position rescaled linearly onto a joystick axis (0-255).
    #[inline]
    #[must_use]
    pub fn axis(&self) -> u8 {
        position_to_axis(self.position(), self.pulses_per_rev)
    }

    #[inline]
    #[must_use]
    pub const fn previous_raw(&self) -> u32 {
        self.previous_raw
    }
}

/// Rescale a position in `[0, pulses_per_rev)` to `[0, 255]`.
#[inline]
#[must_use]
pub fn position_to_axis(position: u32, pulses_per_rev: u32) -> u8 {
    let scaled = u64::from(position) * 256 / u64::from(pulses_per_rev);
    scaled.min(255) as u8
}

/// Signed counter step for one change of the two-bit phase state
/// `(B << 1) | A`, decoded x4.
///
/// Phase A leading phase B (`00 -> 01 -> 11 -> 10`) counts up. A jump of two
/// states has no known direction and counts zero.
#[inline]
#[must_use]
pub const fn quadrature_step(previous: u8, next: u8) -> i32 {
    const GRAY_INDEX: [u8; 4] = [0, 1, 3, 2];
    let from = GRAY_INDEX[(previous & 0b11) as usize];
    let to = GRAY_INDEX[(next & 0b11) as usize];
    match (to + 4 - from) % 4 {
        1 => 1,
        3 => -1,
        _ => 0,
    }
}

/// Scale a per-cycle delta by a sensitivity multiplier into a mouse axis.
#[inline]
#[must_use]
pub fn scale_relative(delta: i32, sensitivity: i32) -> i8 {
    delta.saturating_mul(sensitivity).clamp(-127, 127) as i8
}
