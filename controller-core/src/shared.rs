//! State shared between the polling loop and the lighting loop.
//!
//! The two loops run on separate cores with no locks. Every field is a
//! word-sized (or byte-sized) atomic accessed with `Ordering::Relaxed`, and
//! every field has exactly one writer:
//!
//! | Field | Writer | Readers |
//! |-------|--------|---------|
//! | `encoder_raw` | encoder capture tasks | polling loop, lighting loop |
//! | `buttons` | polling loop | lighting loop, lamp step |
//! | `last_activity_us` | polling loop | lighting loop |
//! | `lights` | host lighting callback | lamp step, lighting loop |
//! | `lighting_clock` | host lighting callback | lamp step, lighting loop |
//!
//! A reader may see a lighting report whose bytes straddle two host writes.
//! That costs at most one stale frame and is accepted.

use controller_proto::{LightsError, REPORT_ID_LIGHTS};
use portable_atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::config::{Lights, ENC_COUNT, LIGHTS_LEN, SW_COUNT};
use crate::lighting::LightingTimeoutClock;

#[allow(clippy::declare_interior_mutable_const)]
const COUNTER_INIT: AtomicU32 = AtomicU32::new(0);
#[allow(clippy::declare_interior_mutable_const)]
const LIGHT_INIT: AtomicU8 = AtomicU8::new(0);

/// Racy-but-tolerant cells read by both execution contexts.
pub struct SharedState {
    encoder_raw: [AtomicU32; ENC_COUNT],
    buttons: AtomicU16,
    last_activity_us: AtomicU64,
    lights: [AtomicU8; LIGHTS_LEN],
    lighting_clock: LightingTimeoutClock,
}

impl SharedState {
    /// Boot state: counters at zero, no switch pressed, no host lighting yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            encoder_raw: [COUNTER_INIT; ENC_COUNT],
            buttons: AtomicU16::new(0),
            last_activity_us: AtomicU64::new(0),
            lights: [LIGHT_INIT; LIGHTS_LEN],
            lighting_clock: LightingTimeoutClock::new(),
        }
    }

    // --- Encoder capture (writer) ---

    /// Advance encoder `index`'s raw counter by one quadrature step.
    ///
    /// Only the capture task owning `index` may call this.
    pub fn record_encoder_step(&self, index: usize, step: i32) {
        if let Some(counter) = self.encoder_raw.get(index) {
            let raw = counter.load(Ordering::Relaxed);
            counter.store(raw.wrapping_add_signed(step), Ordering::Relaxed);
        }
    }

    /// Overwrite encoder `index`'s raw counter.
    pub fn set_encoder_raw(&self, index: usize, raw: u32) {
        if let Some(counter) = self.encoder_raw.get(index) {
            counter.store(raw, Ordering::Relaxed);
        }
    }

    /// Snapshot every raw counter once.
    #[must_use]
    pub fn encoder_snapshot(&self) -> [u32; ENC_COUNT] {
        core::array::from_fn(|i| self.encoder_raw[i].load(Ordering::Relaxed))
    }

    // --- Polling loop (writer) ---

    /// Publish the debounced switch states.
    ///
    /// `changed` marks switch activity at `now_us` for the idle-lights timeout.
    pub fn publish_buttons(&self, stable: &[bool; SW_COUNT], changed: bool, now_us: u64) {
        let bits = stable
            .iter()
            .enumerate()
            .filter(|(_, &pressed)| pressed)
            .fold(0u16, |acc, (i, _)| acc | (1 << i));
        self.buttons.store(bits, Ordering::Relaxed);
        if changed {
            self.last_activity_us.store(now_us, Ordering::Relaxed);
        }
    }

    /// Debounced switch states, bit `i` = switch `i`.
    #[inline]
    #[must_use]
    pub fn buttons(&self) -> u16 {
        self.buttons.load(Ordering::Relaxed)
    }

    #[inline]
    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        index < SW_COUNT && self.buttons() & (1 << index) != 0
    }

    /// When a stable switch value last changed (0 before any activity).
    #[inline]
    #[must_use]
    pub fn last_activity_us(&self) -> u64 {
        self.last_activity_us.load(Ordering::Relaxed)
    }

    // --- Host lighting callback (writer) ---

    /// Accept an inbound output report from the host.
    ///
    /// A valid lights report replaces the stored report and resets the
    /// lighting timeout clock to `now_us`. Anything else leaves state untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`LightsError`] describing why the report was discarded.
    pub fn accept_host_lights(
        &self,
        report_id: u8,
        data: &[u8],
        now_us: u64,
    ) -> Result<(), LightsError> {
        let report = Lights::parse(report_id, data)?;

        let colors = report.zone_colors.iter().flat_map(|c| [c.r, c.g, c.b]);
        let bytes = report.button_lights.into_iter().chain(colors);
        for (cell, byte) in self.lights.iter().zip(bytes) {
            cell.store(byte, Ordering::Relaxed);
        }
        self.lighting_clock.reset(now_us);
        Ok(())
    }

    /// The last lighting report received from the host (all off before any).
    #[must_use]
    pub fn lights(&self) -> Lights {
        let mut tagged = [0u8; LIGHTS_LEN + 1];
        tagged[0] = REPORT_ID_LIGHTS;
        for (byte, cell) in tagged[1..].iter_mut().zip(self.lights.iter()) {
            *byte = cell.load(Ordering::Relaxed);
        }
        Lights::parse(REPORT_ID_LIGHTS, &tagged).unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn lighting_clock(&self) -> &LightingTimeoutClock {
        &self.lighting_clock
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
