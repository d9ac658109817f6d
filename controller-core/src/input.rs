//! Switch sampling.

use embedded_hal::digital::InputPin;

/// Bank of `N` pull-up switches, closed when the pin reads low.
///
/// A pin that fails to read samples as released, so one bad pin never stalls
/// the poll cycle.
pub struct SwitchBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> SwitchBank<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    /// Sample every switch once, `true` = pressed.
    pub fn sample(&mut self) -> [bool; N] {
        let mut raw = [false; N];
        for (pressed, pin) in raw.iter_mut().zip(self.pins.iter_mut()) {
            *pressed = pin.is_low().unwrap_or(false);
        }
        raw
    }

    /// Sample switch `index` alone.
    pub fn sample_one(&mut self, index: usize) -> bool {
        self.pins
            .get_mut(index)
            .is_some_and(|pin| pin.is_low().unwrap_or(false))
    }

    pub fn into_inner(self) -> [P; N] {
        self.pins
    }
}
