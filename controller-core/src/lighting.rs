//! Lighting arbitration between host and local animation.
//!
//! Every lighting tick the arbiter picks one of two modes:
//!
//! - [`LightingMode::HostDriven`] while a valid host lighting report arrived
//!   less than the reactive timeout ago. Pixels show the host's zone colours,
//!   or with the reactive animation the host's lamps in each switch's colour.
//! - [`LightingMode::LocalReactive`] otherwise, including at boot before the
//!   host has ever written. Pixels show the configured [`Animation`].
//!
//! In either mode the pixels go dark once every switch has been idle for the
//! idle-lights timeout.
//!
//! Switch lamps follow the same mode: the host's lamp values, or the
//! debounced switch states.

use controller_proto::Rgb;
use portable_atomic::{AtomicU64, Ordering};

use crate::animation::Animation;
use crate::config::{ControllerConfig, Lights, LED_COUNT, PIXELS_PER_ZONE, PIXEL_COUNT};
use crate::output::PixelSink;
use crate::shared::SharedState;

/// Time of the last valid host lighting write.
///
/// Stored as `timestamp + 1` so that zero can mean "never".
#[derive(Debug)]
pub struct LightingTimeoutClock {
    last_update: AtomicU64,
}

impl LightingTimeoutClock {
    /// A clock that has never been reset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_update: AtomicU64::new(0),
        }
    }

    /// Record a valid host write at `now_us`.
    pub fn reset(&self, now_us: u64) {
        self.last_update
            .store(now_us.saturating_add(1), Ordering::Relaxed);
    }

    /// When the host last wrote, if ever.
    #[must_use]
    pub fn last_update(&self) -> Option<u64> {
        match self.last_update.load(Ordering::Relaxed) {
            0 => None,
            stamp => Some(stamp - 1),
        }
    }

    /// Time since the last host write, or `None` if there never was one.
    #[must_use]
    pub fn elapsed(&self, now_us: u64) -> Option<u64> {
        self.last_update().map(|at| now_us.saturating_sub(at))
    }

    /// Whether local lighting is in charge at `now_us`.
    #[must_use]
    pub fn is_reactive(&self, now_us: u64, timeout_us: u64) -> bool {
        lighting_mode(self.last_update(), now_us, timeout_us) == LightingMode::LocalReactive
    }
}

impl Default for LightingTimeoutClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Who owns the lights this tick.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightingMode {
    HostDriven,
    #[default]
    LocalReactive,
}

/// Mode at `now_us` given the last host write.
#[must_use]
pub fn lighting_mode(last_update: Option<u64>, now_us: u64, timeout_us: u64) -> LightingMode {
    match last_update {
        Some(at) if now_us.saturating_sub(at) < timeout_us => LightingMode::HostDriven,
        _ => LightingMode::LocalReactive,
    }
}

/// Pixels filled zone by zone with the host's colours.
#[must_use]
pub fn zone_fill(lights: &Lights) -> [Rgb; PIXEL_COUNT] {
    core::array::from_fn(|i| {
        lights
            .zone_colors
            .get(i / PIXELS_PER_ZONE)
            .copied()
            .unwrap_or(Rgb::BLACK)
    })
}

/// Desired lamp states at `now_us`.
#[must_use]
pub fn lamp_states(shared: &SharedState, config: &ControllerConfig, now_us: u64) -> [bool; LED_COUNT] {
    let clock = shared.lighting_clock();
    if clock.is_reactive(now_us, config.reactive_timeout_us) {
        core::array::from_fn(|i| shared.is_pressed(i))
    } else {
        let lights = shared.lights();
        core::array::from_fn(|i| lights.lamp_on(i))
    }
}

/// One lighting tick's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub mode: LightingMode,
    pub pixels: [Rgb; PIXEL_COUNT],
}

/// Per-tick pixel arbiter, owned by the lighting loop.
#[derive(Clone, Debug)]
pub struct LightingArbiter {
    animation: Animation,
    counter: u32,
    mode: LightingMode,
    reactive_timeout_us: u64,
    idle_lights_timeout_us: u64,
}

impl LightingArbiter {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            animation: Animation::new(config),
            counter: 0,
            mode: LightingMode::LocalReactive,
            reactive_timeout_us: config.reactive_timeout_us,
            idle_lights_timeout_us: config.idle_lights_timeout_us,
        }
    }

    /// Run one lighting tick at `now_us`.
    ///
    /// The animation advances on every tick, whichever mode wins, so the comet
    /// physics never see a backlog of encoder motion.
    pub fn tick(&mut self, shared: &SharedState, now_us: u64) -> Frame {
        let snapshot = shared.encoder_snapshot();
        let animated = self
            .animation
            .render(self.counter, &snapshot, shared.buttons());
        self.counter = self.counter.wrapping_add(1);

        self.mode = lighting_mode(
            shared.lighting_clock().last_update(),
            now_us,
            self.reactive_timeout_us,
        );

        let idle = now_us.saturating_sub(shared.last_activity_us());
        let pixels = if idle >= self.idle_lights_timeout_us {
            [Rgb::BLACK; PIXEL_COUNT]
        } else {
            match self.mode {
                LightingMode::HostDriven => {
                    let lights = shared.lights();
                    let zones = zone_fill(&lights);
                    match &self.animation {
                        Animation::Reactive(reactive) => reactive.host_frame(&lights, &zones),
                        _ => zones,
                    }
                }
                LightingMode::LocalReactive => animated,
            }
        };

        Frame {
            mode: self.mode,
            pixels,
        }
    }

    /// Run one tick and push the frame to `strip`.
    pub async fn refresh<S: PixelSink>(
        &mut self,
        shared: &SharedState,
        now_us: u64,
        strip: &mut S,
    ) -> Frame {
        let frame = self.tick(shared, now_us);
        strip.write(&frame.pixels).await;
        frame
    }

    /// Mode chosen by the most recent tick.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> LightingMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }
}
