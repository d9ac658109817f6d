//! Output sink traits and error types.

use core::future::Future;

use controller_proto::{InputReport, Rgb};
use embedded_hal::digital::OutputPin;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not configured).
    NotReady,
    /// Report dropped (e.g., host not polling fast enough).
    Dropped,
    /// Endpoint busy.
    Busy,
}

/// Async trait for input report sinks.
///
/// Callers check [`is_ready`](Self::is_ready) first and skip the cycle when
/// it returns `false`; reports are never queued.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait ReportSink {
    /// Send one input report to the host.
    fn send(&mut self, report: &InputReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the endpoint can take a report right now.
    fn is_ready(&self) -> bool;
}

/// Async trait for addressable pixel strips.
pub trait PixelSink {
    /// Push one full frame, first pixel first.
    fn write(&mut self, pixels: &[Rgb]) -> impl Future<Output = ()>;
}

/// Bank of `N` switch lamps, lit when driven high.
///
/// Pins are only written when their desired state changes. A failed write is
/// skipped and retried on the next change.
pub struct LampBank<P, const N: usize> {
    pins: [P; N],
    lit: [Option<bool>; N],
}

impl<P: OutputPin, const N: usize> LampBank<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self {
            pins,
            lit: [None; N],
        }
    }

    /// Drive every lamp to `states`. Returns the number of pins written.
    pub fn apply(&mut self, states: &[bool; N]) -> usize {
        let mut written = 0;
        for ((pin, lit), &on) in self.pins.iter_mut().zip(self.lit.iter_mut()).zip(states) {
            if *lit == Some(on) {
                continue;
            }
            let result = if on { pin.set_high() } else { pin.set_low() };
            if result.is_ok() {
                *lit = Some(on);
                written += 1;
            } else {
                *lit = None;
            }
        }
        written
    }

    /// Last state successfully written to lamp `index`.
    #[must_use]
    pub fn is_lit(&self, index: usize) -> Option<bool> {
        self.lit.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPin;

    #[test]
    fn test_lamps_written_on_change_only() {
        let pins = [MockPin::new(false), MockPin::new(false)];
        let mut lamps = LampBank::new(pins.clone());

        assert_eq!(lamps.apply(&[true, false]), 2);
        assert!(pins[0].level());
        assert!(!pins[1].level());

        assert_eq!(lamps.apply(&[true, false]), 0);
        assert_eq!(lamps.apply(&[true, true]), 1);
        assert!(pins[1].level());
        assert_eq!(pins[0].writes(), 1);
        assert_eq!(pins[1].writes(), 2);
    }

    #[test]
    fn test_failed_lamp_is_skipped() {
        let pins = [MockPin::failing(), MockPin::new(false)];
        let mut lamps = LampBank::new(pins);
        assert_eq!(lamps.apply(&[true, true]), 1);
        assert_eq!(lamps.is_lit(0), None);
        assert_eq!(lamps.is_lit(1), Some(true));
    }
}
