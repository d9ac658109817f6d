//! Switch debouncing.
//!
//! Two policies filter raw samples into a stable value:
//!
//! - [`DebounceMode::Eager`] adopts a change as soon as it is seen, then
//!   ignores further changes until the interval has passed since that
//!   adoption. Presses reach the host with no added latency. The first
//!   sample counts as an adoption of the boot state, so nothing changes
//!   during the first interval after power-up.
//! - [`DebounceMode::Deferred`] adopts a change only once the raw value has
//!   held unbroken for the whole interval, measured from the first sample
//!   that differed. A reversion inside the window abandons the change.
//!
//! Timestamps are microseconds from a monotonic clock.

/// Debounce policy, chosen once at boot.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceMode {
    #[default]
    Eager,
    Deferred,
}

/// Per-switch debounce state.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchState {
    /// Most recent raw sample (true = pressed).
    pub raw_sample: bool,
    /// Debounced value reported to the host.
    pub stable_value: bool,
    /// Eager: when the last change was adopted, starting with the first sample.
    /// Deferred: when the pending change was first observed.
    /// `None` means no such event, never "long ago".
    pub last_transition: Option<u64>,
}

impl SwitchState {
    /// Feed one raw sample. Returns `true` if the stable value changed.
    pub fn update(&mut self, mode: DebounceMode, raw: bool, now_us: u64, interval_us: u64) -> bool {
        self.raw_sample = raw;
        match mode {
            DebounceMode::Eager => self.update_eager(now_us, interval_us),
            DebounceMode::Deferred => self.update_deferred(now_us, interval_us),
        }
    }

    fn update_eager(&mut self, now_us: u64, interval_us: u64) -> bool {
        // The first sample opens the first lockout window
        let Some(adopted_at) = self.last_transition else {
            self.last_transition = Some(now_us);
            return false;
        };

        if self.raw_sample == self.stable_value
            || now_us.saturating_sub(adopted_at) < interval_us
        {
            return false;
        }
        self.stable_value = self.raw_sample;
        self.last_transition = Some(now_us);
        true
    }

    fn update_deferred(&mut self, now_us: u64, interval_us: u64) -> bool {
        if self.raw_sample == self.stable_value {
            self.last_transition = None;
            return false;
        }

        let first_seen = *self.last_transition.get_or_insert(now_us);
        if now_us.saturating_sub(first_seen) >= interval_us {
            self.stable_value = self.raw_sample;
            self.last_transition = None;
            true
        } else {
            false
        }
    }
}

/// Debouncer for a fixed bank of `N` switches.
#[derive(Clone, Debug)]
pub struct Debouncer<const N: usize> {
    mode: DebounceMode,
    interval_us: u64,
    switches: [SwitchState; N],
}

impl<const N: usize> Debouncer<N> {
    /// Create a debouncer with every switch released.
    #[must_use]
    pub const fn new(mode: DebounceMode, interval_us: u64) -> Self {
        Self {
            mode,
            interval_us,
            switches: [SwitchState {
                raw_sample: false,
                stable_value: false,
                last_transition: None,
            }; N],
        }
    }

    /// Run one poll cycle over all switches.
    ///
    /// Returns `true` if any stable value changed.
    pub fn update(&mut self, raw: &[bool; N], now_us: u64) -> bool {
        let mut changed = false;
        for (switch, &sample) in self.switches.iter_mut().zip(raw.iter()) {
            changed |= switch.update(self.mode, sample, now_us, self.interval_us);
        }
        changed
    }

    /// Stable values of all switches.
    #[must_use]
    pub fn stable(&self) -> [bool; N] {
        core::array::from_fn(|i| self.switches[i].stable_value)
    }

    /// Stable value of switch `index`; out-of-range switches read released.
    #[inline]
    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.switches.get(index).is_some_and(|s| s.stable_value)
    }

    /// Full per-switch state.
    #[inline]
    #[must_use]
    pub fn switches(&self) -> &[SwitchState; N] {
        &self.switches
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> DebounceMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: u64 = 4000;

    fn feed(state: &mut SwitchState, mode: DebounceMode, samples: &[(u64, bool)]) -> bool {
        let mut stable = state.stable_value;
        for &(t, raw) in samples {
            state.update(mode, raw, t, INTERVAL);
            stable = state.stable_value;
        }
        stable
    }

    #[test]
    fn test_eager_first_press_is_immediate() {
        let mut s = SwitchState::default();
        assert!(!s.update(DebounceMode::Eager, false, 0, INTERVAL));
        assert_eq!(s.last_transition, Some(0));

        assert!(s.update(DebounceMode::Eager, true, INTERVAL, INTERVAL));
        assert!(s.stable_value);
        assert_eq!(s.last_transition, Some(INTERVAL));
    }

    #[test]
    fn test_eager_boot_sample_opens_lockout() {
        // Held at power-up: the first window must pass before adoption
        let mut s = SwitchState::default();
        assert!(!s.update(DebounceMode::Eager, true, 500, INTERVAL));
        assert!(!s.update(DebounceMode::Eager, true, 4499, INTERVAL));
        assert!(!s.stable_value);
        assert!(s.update(DebounceMode::Eager, true, 4500, INTERVAL));
        assert!(s.stable_value);
    }

    #[test]
    fn test_eager_ignores_bounce_inside_lockout() {
        let mut s = SwitchState::default();
        s.update(DebounceMode::Eager, false, 0, INTERVAL);
        assert!(s.update(DebounceMode::Eager, true, 10_000, INTERVAL));

        // Contact bounce right after the press is swallowed
        assert!(!s.update(DebounceMode::Eager, false, 10_500, INTERVAL));
        assert!(!s.update(DebounceMode::Eager, true, 11_000, INTERVAL));
        assert!(!s.update(DebounceMode::Eager, false, 13_999, INTERVAL));
        assert!(s.stable_value);

        // First differing sample after the window is adopted
        assert!(s.update(DebounceMode::Eager, false, 14_000, INTERVAL));
        assert!(!s.stable_value);
        assert_eq!(s.last_transition, Some(14_000));
    }

    #[test]
    fn test_eager_lockout_counts_from_adoption_not_first_difference() {
        let mut s = SwitchState::default();
        s.update(DebounceMode::Eager, false, 0, INTERVAL);
        assert!(s.update(DebounceMode::Eager, true, 4000, INTERVAL));
        // Raw value stays equal to stable, nothing restarts the window
        s.update(DebounceMode::Eager, true, 7000, INTERVAL);
        // Released at 7500, but the lockout runs until 8000
        assert!(feed(&mut s, DebounceMode::Eager, &[(7500, false), (7900, false)]));
        assert!(!feed(&mut s, DebounceMode::Eager, &[(8000, false)]));
    }

    #[test]
    fn test_deferred_waits_full_interval() {
        let mut s = SwitchState::default();
        assert!(!s.update(DebounceMode::Deferred, true, 1000, INTERVAL));
        assert_eq!(s.last_transition, Some(1000));
        assert!(!s.update(DebounceMode::Deferred, true, 4999, INTERVAL));
        assert!(!s.stable_value);

        assert!(s.update(DebounceMode::Deferred, true, 5000, INTERVAL));
        assert!(s.stable_value);
        assert_eq!(s.last_transition, None);
    }

    #[test]
    fn test_deferred_reversion_cancels_pending_change() {
        let mut s = SwitchState::default();
        s.update(DebounceMode::Deferred, true, 0, INTERVAL);
        s.update(DebounceMode::Deferred, true, 3000, INTERVAL);
        // Bounce back to released abandons the window
        s.update(DebounceMode::Deferred, false, 3500, INTERVAL);
        assert_eq!(s.last_transition, None);

        // Pressed again: a fresh window starts at 3600
        assert!(!s.update(DebounceMode::Deferred, true, 3600, INTERVAL));
        assert!(!s.update(DebounceMode::Deferred, true, 7000, INTERVAL));
        assert!(!s.stable_value);
        assert!(s.update(DebounceMode::Deferred, true, 7600, INTERVAL));
    }

    #[test]
    fn test_deferred_sentinel_is_not_elapsed() {
        // A late first sample must not be mistaken for a long-held one.
        let mut s = SwitchState::default();
        assert!(!s.update(DebounceMode::Deferred, true, 1_000_000_000, INTERVAL));
        assert!(!s.stable_value);
    }

    #[test]
    fn test_deferred_never_flips_on_chatter() {
        let mut s = SwitchState::default();
        let mut t = 0;
        for i in 0..200 {
            s.update(DebounceMode::Deferred, i % 2 == 0, t, INTERVAL);
            assert!(!s.stable_value);
            t += 1500;
        }
    }

    #[test]
    fn test_debouncer_reports_any_change() {
        let mut d: Debouncer<3> = Debouncer::new(DebounceMode::Eager, INTERVAL);
        assert!(!d.update(&[false, false, false], 0));
        assert!(!d.update(&[false, true, false], 100));
        assert!(d.update(&[false, true, false], INTERVAL));
        assert_eq!(d.stable(), [false, true, false]);
        assert!(d.is_pressed(1));
        assert!(!d.is_pressed(7));
    }

    #[test]
    fn test_debouncer_switches_are_independent() {
        let mut d: Debouncer<2> = Debouncer::new(DebounceMode::Deferred, INTERVAL);
        d.update(&[true, false], 0);
        d.update(&[true, true], 2000);
        d.update(&[true, true], 4000);
        assert_eq!(d.stable(), [true, false]);
        d.update(&[true, true], 6000);
        assert_eq!(d.stable(), [true, true]);
    }
}
