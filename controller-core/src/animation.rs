//! Local lighting animations.
//!
//! Every animation renders a full pixel frame per lighting tick. The colour
//! cycle depends only on the tick counter. The comet keeps physics state per
//! encoder and reads the raw counters directly. The reactive mode lights each
//! switch's pixel in that switch's colour over a dimmed colour cycle.

use controller_proto::Rgb;

use crate::config::{
    ControllerConfig, Lights, ENC_COUNT, ENC_PULSES, ENC_ROLLOVER, PIXEL_COUNT, SW_COUNT,
};
use crate::encoder::EncoderTracker;

/// Colour wheel length in units.
pub const WHEEL_LEN: u32 = 768;

/// Animation selected at boot for local lighting.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationKind {
    /// Travelling rainbow.
    #[default]
    ColorCycle,
    /// Encoder-driven chasing comets.
    Comet,
    /// Per-switch colours over a dimmed rainbow glow.
    Reactive,
}

/// Comet tuning, in encoder revolutions and ring positions per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CometConfig {
    /// Bound on the velocity proxy magnitude.
    pub clamp: f32,
    /// Proxy magnitude above which the knob counts as moving.
    pub threshold: f32,
    /// Proxy decay per tick.
    pub decay: f32,
    /// Comet speed while moving.
    pub velocity: f32,
    /// Number of logical positions on the ring.
    pub ring_len: f32,
    /// Brightness lost per idle tick.
    pub fade: f32,
    /// Idle ticks after which the comet returns to rest.
    pub fade_ticks: u32,
    pub rest_position: f32,
    /// Distance at which a comet stops lighting a pixel.
    pub radius: f32,
    /// Colour of each encoder's comet.
    pub hues: [Rgb; ENC_COUNT],
    /// Ring position of each physical pixel.
    pub pixel_positions: [f32; PIXEL_COUNT],
}

/// Per-switch pixel colours for [`AnimationKind::Reactive`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactiveConfig {
    /// Colour a switch's pixel shows while it is pressed or lit by the host.
    pub switch_colors: [Rgb; SW_COUNT],
    /// Switch shown on each pixel; `None` pixels only ever glow.
    pub pixel_switch: [Option<usize>; PIXEL_COUNT],
    /// Scale applied to the colour cycle behind released switches, in `[0, 1]`.
    pub glow_brightness: f32,
}

impl ReactiveConfig {
    /// Local frame: pressed switches in their colour, everything else glowing.
    #[must_use]
    pub fn local_frame(&self, counter: u32, buttons: u16) -> [Rgb; PIXEL_COUNT] {
        let glow = color_cycle(counter);
        core::array::from_fn(|i| match self.pixel_switch[i] {
            Some(s) if s < SW_COUNT && buttons & (1 << s) != 0 => self.switch_colors[s],
            _ => scale(glow[i], self.glow_brightness),
        })
    }

    /// Host frame: switch pixels follow the host's lamps, the rest its zones.
    #[must_use]
    pub fn host_frame(&self, lights: &Lights, zones: &[Rgb; PIXEL_COUNT]) -> [Rgb; PIXEL_COUNT] {
        core::array::from_fn(|i| match self.pixel_switch[i] {
            Some(s) if lights.lamp_on(s) => self.switch_colors.get(s).copied().unwrap_or(Rgb::BLACK),
            Some(_) => Rgb::BLACK,
            None => zones[i],
        })
    }
}

/// Position on the 768-unit red, green, blue wheel.
#[must_use]
pub fn color_wheel(pos: u32) -> Rgb {
    let pos = pos % WHEEL_LEN;
    // each segment spans 256 units, so the offsets fit u8
    let p = (pos % 256) as u8;
    match pos / 256 {
        0 => Rgb::new(p, 255 - p, 0),
        1 => Rgb::new(255 - p, 0, p),
        _ => Rgb::new(0, p, 255 - p),
    }
}

/// Rainbow spread evenly over the strip, rotated by `counter`.
#[must_use]
pub fn color_cycle(counter: u32) -> [Rgb; PIXEL_COUNT] {
    let spacing = WHEEL_LEN / PIXEL_COUNT as u32;
    core::array::from_fn(|i| color_wheel(counter.wrapping_add(i as u32 * spacing) % WHEEL_LEN))
}

/// Per-encoder comet state.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct CometState {
    /// Damped rotation proxy in revolutions, bounded by [`CometConfig::clamp`].
    pub velocity: f32,
    /// Position on the ring, in `[0, ring_len)`.
    pub position: f32,
    /// Brightness in `[0, 1]`.
    pub brightness: f32,
    /// Consecutive ticks below the motion threshold.
    pub idle: u32,
}

impl CometState {
    /// Advance one tick with the encoder's rotation `delta` since the last tick.
    pub fn step(&mut self, delta: i32, config: &CometConfig) {
        let turn = delta as f32 / ENC_PULSES as f32;
        self.velocity = clamp(self.velocity + turn, -config.clamp, config.clamp);

        if self.velocity > config.threshold {
            self.idle = 0;
            self.position += config.velocity;
            self.brightness = 1.0;
        } else if self.velocity < -config.threshold {
            self.idle = 0;
            self.position -= config.velocity;
            self.brightness = 1.0;
        } else {
            self.idle = self.idle.saturating_add(1);
            self.brightness = clamp(self.brightness - config.fade, 0.0, 1.0);
            if self.brightness <= 0.0 || self.idle > config.fade_ticks {
                self.position = config.rest_position;
            }
        }
        self.position = wrap(self.position, config.ring_len);

        // Damping, snapping to rest once inside one decay step
        if self.velocity > config.decay {
            self.velocity -= config.decay;
        } else if self.velocity < -config.decay {
            self.velocity += config.decay;
        } else {
            self.velocity = 0.0;
        }
    }

    /// Contribution to a pixel at ring position `pixel`, in `[0, brightness]`.
    #[must_use]
    pub fn strength_at(&self, pixel: f32, config: &CometConfig) -> f32 {
        let distance = ring_distance(self.position, pixel, config.ring_len);
        let falloff = 1.0 - clamp(distance, 0.0, config.radius) / config.radius;
        falloff * self.brightness
    }
}

/// Encoder-driven chasing comets, one per encoder.
#[derive(Clone, Debug)]
pub struct Comet {
    config: CometConfig,
    trackers: [EncoderTracker; ENC_COUNT],
    states: [CometState; ENC_COUNT],
}

impl Comet {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            config: config.comet,
            trackers: core::array::from_fn(|i| {
                EncoderTracker::new(config.encoder_reverse[i], ENC_PULSES, ENC_ROLLOVER)
            }),
            states: [CometState::default(); ENC_COUNT],
        }
    }

    /// Step every comet from one snapshot of the raw counters.
    pub fn step(&mut self, snapshot: &[u32; ENC_COUNT]) {
        for ((tracker, state), &raw) in self
            .trackers
            .iter_mut()
            .zip(self.states.iter_mut())
            .zip(snapshot.iter())
        {
            let sample = tracker.update(raw);
            state.step(sample.delta, &self.config);
        }
    }

    /// Blend every comet onto the strip.
    #[must_use]
    pub fn frame(&self) -> [Rgb; PIXEL_COUNT] {
        core::array::from_fn(|i| {
            let pixel = self.config.pixel_positions[i];
            let mut rgb = [0.0f32; 3];
            for (state, hue) in self.states.iter().zip(self.config.hues.iter()) {
                let s = state.strength_at(pixel, &self.config);
                rgb[0] += s * f32::from(hue.r);
                rgb[1] += s * f32::from(hue.g);
                rgb[2] += s * f32::from(hue.b);
            }
            Rgb::new(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
        })
    }

    #[inline]
    #[must_use]
    pub fn states(&self) -> &[CometState; ENC_COUNT] {
        &self.states
    }
}

/// Configured animation with its state.
#[derive(Clone, Debug)]
pub enum Animation {
    ColorCycle,
    Comet(Comet),
    Reactive(ReactiveConfig),
}

impl Animation {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        match config.animation {
            AnimationKind::ColorCycle => Self::ColorCycle,
            AnimationKind::Comet => Self::Comet(Comet::new(config)),
            AnimationKind::Reactive => Self::Reactive(config.reactive),
        }
    }

    /// Advance one tick and return the frame for tick `counter`.
    ///
    /// `buttons` holds the debounced switch states, bit `i` for switch `i`.
    pub fn render(
        &mut self,
        counter: u32,
        snapshot: &[u32; ENC_COUNT],
        buttons: u16,
    ) -> [Rgb; PIXEL_COUNT] {
        match self {
            Self::ColorCycle => color_cycle(counter),
            Self::Comet(comet) => {
                comet.step(snapshot);
                comet.frame()
            }
            Self::Reactive(reactive) => reactive.local_frame(counter, buttons),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AnimationKind {
        match self {
            Self::ColorCycle => AnimationKind::ColorCycle,
            Self::Comet(_) => AnimationKind::Comet,
            Self::Reactive(_) => AnimationKind::Reactive,
        }
    }
}

fn clamp(v: f32, min: f32, max: f32) -> f32 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

fn abs(v: f32) -> f32 {
    if v < 0.0 {
        -v
    } else {
        v
    }
}

/// Wrap `v` into `[0, len)`, assuming it is at most one length out.
fn wrap(v: f32, len: f32) -> f32 {
    if v < 0.0 {
        v + len
    } else if v >= len {
        v - len
    } else {
        v
    }
}

fn ring_distance(a: f32, b: f32, len: f32) -> f32 {
    let d = abs(a - b);
    if d > len - d {
        len - d
    } else {
        d
    }
}

fn scale(color: Rgb, brightness: f32) -> Rgb {
    Rgb::new(
        channel(f32::from(color.r) * brightness),
        channel(f32::from(color.g) * brightness),
        channel(f32::from(color.b) * brightness),
    )
}

fn channel(v: f32) -> u8 {
    // float to int casts saturate
    clamp(v, 0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;

    fn reactive_config() -> ControllerConfig {
        ControllerConfig {
            animation: AnimationKind::Reactive,
            ..DEFAULT_CONFIG
        }
    }

    fn comet_config() -> ControllerConfig {
        ControllerConfig {
            animation: AnimationKind::Comet,
            ..DEFAULT_CONFIG
        }
    }

    #[test]
    fn test_color_wheel_segments() {
        assert_eq!(color_wheel(0), Rgb::new(0, 255, 0));
        assert_eq!(color_wheel(255), Rgb::new(255, 0, 0));
        assert_eq!(color_wheel(256), Rgb::new(255, 0, 0));
        assert_eq!(color_wheel(511), Rgb::new(0, 0, 255));
        assert_eq!(color_wheel(512), Rgb::new(0, 0, 255));
        assert_eq!(color_wheel(767), Rgb::new(0, 255, 0));
        assert_eq!(color_wheel(768), color_wheel(0));
    }

    #[test]
    fn test_color_cycle_travels() {
        let a = color_cycle(0);
        let b = color_cycle(768 / PIXEL_COUNT as u32);
        // One spacing later each pixel shows its neighbour's colour
        assert_eq!(b[0], a[1]);
        assert_eq!(b[3], a[4]);
        assert_eq!(color_cycle(768), a);
    }

    #[test]
    fn test_comet_lights_on_motion() {
        let config = DEFAULT_CONFIG.comet;
        let mut state = CometState::default();
        // 0.06 rev in one tick crosses the 0.05 threshold
        state.step(144, &config);
        assert_eq!(state.brightness, 1.0);
        assert_eq!(state.idle, 0);
        assert!(abs(state.position - config.velocity) < 1e-6);
    }

    #[test]
    fn test_comet_reverse_motion_wraps_ring() {
        let config = DEFAULT_CONFIG.comet;
        let mut state = CometState::default();
        state.step(-144, &config);
        assert!(abs(state.position - (config.ring_len - config.velocity)) < 1e-5);
        assert!(state.position >= 0.0 && state.position < config.ring_len);
    }

    #[test]
    fn test_comet_velocity_is_clamped() {
        let config = DEFAULT_CONFIG.comet;
        let mut state = CometState::default();
        state.step(ENC_PULSES as i32, &config);
        assert!(state.velocity <= config.clamp);
        assert!(state.velocity > config.clamp - 2.0 * config.decay);
    }

    #[test]
    fn test_comet_brightness_never_rises_below_threshold() {
        let config = DEFAULT_CONFIG.comet;
        let mut state = CometState::default();
        state.step(240, &config);
        assert_eq!(state.brightness, 1.0);

        // Let the proxy decay below threshold, then watch the fade
        let mut last = state.brightness;
        let mut faded = false;
        for _ in 0..400 {
            state.step(0, &config);
            if state.velocity <= config.threshold {
                assert!(state.brightness <= last);
                faded = true;
            }
            last = state.brightness;
        }
        assert!(faded);
        assert_eq!(state.brightness, 0.0);
        assert_eq!(state.position, config.rest_position);
        assert_eq!(state.velocity, 0.0);
    }

    #[test]
    fn test_comet_brightness_resets_on_crossing() {
        let config = DEFAULT_CONFIG.comet;
        let mut state = CometState {
            brightness: 0.3,
            idle: 12,
            ..CometState::default()
        };
        state.step(144, &config);
        assert_eq!(state.brightness, 1.0);
        assert_eq!(state.idle, 0);
    }

    #[test]
    fn test_strength_falls_off_linearly() {
        let config = DEFAULT_CONFIG.comet;
        let state = CometState {
            position: 4.0,
            brightness: 1.0,
            ..CometState::default()
        };
        assert_eq!(state.strength_at(4.0, &config), 1.0);
        assert_eq!(state.strength_at(5.0, &config), 0.5);
        assert_eq!(state.strength_at(6.0, &config), 0.0);
        assert_eq!(state.strength_at(9.0, &config), 0.0);
    }

    #[test]
    fn test_strength_uses_ring_distance() {
        let config = DEFAULT_CONFIG.comet;
        let state = CometState {
            position: config.ring_len - 0.5,
            brightness: 1.0,
            ..CometState::default()
        };
        assert_eq!(state.strength_at(0.5, &config), 0.5);
    }

    #[test]
    fn test_comet_frame_blends_and_clamps() {
        let mut comet = Comet::new(&comet_config());
        comet.states[0] = CometState {
            position: 2.0,
            brightness: 1.0,
            ..CometState::default()
        };
        comet.states[1] = comet.states[0];

        let frame = comet.frame();
        // Pixel 0 sits at ring position 2: both hues at full strength
        assert_eq!(frame[0], Rgb::new(255, 255, 255));
        // Pixel 1 at position 3: half of each hue summed
        assert_eq!(frame[1], Rgb::new(160, 145, 225));
        assert_eq!(frame[9], Rgb::BLACK);
    }

    #[test]
    fn test_dark_comet_renders_black() {
        let mut animation = Animation::new(&comet_config());
        assert_eq!(animation.kind(), AnimationKind::Comet);
        let frame = animation.render(0, &[0; ENC_COUNT], 0);
        assert!(frame.iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn test_comet_follows_encoder_counter() {
        let mut animation = Animation::new(&comet_config());
        animation.render(0, &[144, 0], 0);
        let Animation::Comet(comet) = &animation else {
            panic!("expected comet");
        };
        assert_eq!(comet.states()[0].brightness, 1.0);
        assert_eq!(comet.states()[1].brightness, 0.0);
    }

    #[test]
    fn test_reactive_pressed_switch_takes_its_colour() {
        let config = reactive_config();
        let mut animation = Animation::new(&config);
        assert_eq!(animation.kind(), AnimationKind::Reactive);

        let frame = animation.render(0, &[0; ENC_COUNT], 1 << 5);
        assert_eq!(frame[5], config.reactive.switch_colors[5]);
        assert_eq!(frame[5], Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_reactive_released_switch_glows_dimmed() {
        let config = reactive_config();
        let mut animation = Animation::new(&config);
        let frame = animation.render(0, &[0; ENC_COUNT], 0);
        // Pixel 0 starts the wheel at pure green; a fifth of 255 is 51
        assert_eq!(color_cycle(0)[0], Rgb::new(0, 255, 0));
        assert_eq!(frame[0], Rgb::new(0, 51, 0));
    }

    #[test]
    fn test_reactive_unmapped_pixel_always_glows() {
        let mut reactive = DEFAULT_CONFIG.reactive;
        reactive.pixel_switch[2] = None;
        let frame = reactive.local_frame(0, 0xffff);
        assert_eq!(frame[2], scale(color_cycle(0)[2], reactive.glow_brightness));
        assert_eq!(frame[3], reactive.switch_colors[3]);
    }

    #[test]
    fn test_reactive_host_frame_follows_lamps() {
        let mut reactive = DEFAULT_CONFIG.reactive;
        reactive.pixel_switch[9] = None;
        let mut lights = Lights::off();
        lights.button_lights[1] = 1;
        lights.zone_colors[1] = Rgb::new(40, 50, 60);
        let zones = [Rgb::new(40, 50, 60); PIXEL_COUNT];

        let frame = reactive.host_frame(&lights, &zones);
        assert_eq!(frame[1], reactive.switch_colors[1]);
        assert_eq!(frame[0], Rgb::BLACK);
        assert_eq!(frame[9], Rgb::new(40, 50, 60));
    }
}
