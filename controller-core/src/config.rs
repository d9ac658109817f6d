//! Compile-time controller configuration.
//!
//! Counts are crate-level constants because they size the arrays that flow
//! through every module. Everything else lives in [`ControllerConfig`];
//! customize it at compile time by creating your own const, typically with
//! struct update syntax over [`DEFAULT_CONFIG`].

use controller_proto::{keycode, LightsReport, Rgb};

use crate::animation::{AnimationKind, CometConfig, ReactiveConfig};
use crate::debounce::DebounceMode;

/// Number of switches.
pub const SW_COUNT: usize = 11;
/// Number of switch lamps.
pub const LED_COUNT: usize = 10;
/// Number of encoders.
pub const ENC_COUNT: usize = 2;
/// Number of WS2812B pixels.
pub const PIXEL_COUNT: usize = 10;
/// Number of host-addressable RGB zones.
pub const ZONE_COUNT: usize = 2;
/// Consecutive pixels covered by one zone.
pub const PIXELS_PER_ZONE: usize = PIXEL_COUNT / ZONE_COUNT;

/// Encoder pulses per revolution as printed on the part.
pub const ENC_PPR: u32 = 600;
/// Counted pulses per revolution. The capture decodes every edge of both
/// phases ([`quadrature_step`](crate::encoder::quadrature_step)), so x4.
pub const ENC_PULSES: u32 = ENC_PPR * 4;
/// Per-cycle delta magnitude above which a reading is treated as a glitch.
pub const ENC_ROLLOVER: u32 = ENC_PULSES * 2;

/// Switch debounce interval.
pub const SW_DEBOUNCE_TIME_US: u64 = 4000;
/// Host lighting silence after which local animation takes over.
pub const REACTIVE_TIMEOUT_US: u64 = 1_000_000;
/// Switch inactivity after which local lighting goes dark (10 min).
pub const IDLE_LIGHTS_TIMEOUT_US: u64 = 600_000_000;
/// Lighting loop period.
pub const LIGHTS_REFRESH_MS: u64 = 5;

/// Host lighting report for this board.
pub type Lights = LightsReport<LED_COUNT, ZONE_COUNT>;
/// Untagged lighting payload length.
pub const LIGHTS_LEN: usize = Lights::LEN;

/// Per-board mapping and behaviour tables.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// HID usage sent for each switch in keyboard mode.
    pub keycodes: [u8; SW_COUNT],
    /// Joystick report bit for each switch (values of 16 or more are dropped).
    pub button_bits: [u8; SW_COUNT],
    /// GPIO of each switch (pull-up, active low).
    pub switch_gpio: [u8; SW_COUNT],
    /// GPIO of each switch lamp.
    pub lamp_gpio: [u8; LED_COUNT],
    /// GPIO of each encoder's A phase; B is the next pin.
    pub encoder_gpio: [u8; ENC_COUNT],
    /// WS2812B data GPIO.
    pub pixel_gpio: u8,
    /// Invert the rotation direction of each encoder.
    ///
    /// With `false`, rotation where phase A leads phase B raises the joystick
    /// axis and moves the mouse positive. Boards wired with A and B swapped
    /// set `true`.
    pub encoder_reverse: [bool; ENC_COUNT],
    /// Mouse-mode multiplier for each encoder's delta.
    pub mouse_sensitivity: [i32; ENC_COUNT],
    /// Encoders driving mouse X and Y.
    pub mouse_axes: [usize; 2],
    /// Switch sampled at boot; held selects keyboard+mouse mode.
    pub mode_switch: usize,
    pub debounce: DebounceMode,
    pub debounce_us: u64,
    pub reactive_timeout_us: u64,
    pub idle_lights_timeout_us: u64,
    pub animation: AnimationKind,
    pub comet: CometConfig,
    pub reactive: ReactiveConfig,
}

/// Default configuration for the 11-switch, 2-encoder board.
pub const DEFAULT_CONFIG: ControllerConfig = ControllerConfig {
    keycodes: [
        keycode::KEY_D,
        keycode::KEY_F,
        keycode::KEY_J,
        keycode::KEY_K,
        keycode::KEY_C,
        keycode::KEY_M,
        keycode::KEY_A,
        keycode::KEY_B,
        keycode::KEY_1,
        keycode::KEY_E,
        keycode::KEY_G,
    ],
    button_bits: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
    switch_gpio: [4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 27],
    lamp_gpio: [5, 7, 9, 11, 13, 15, 17, 19, 21, 26],
    encoder_gpio: [0, 2],
    pixel_gpio: 28,
    encoder_reverse: [false, false],
    mouse_sensitivity: [1, 1],
    mouse_axes: [0, 1],
    mode_switch: 0,
    debounce: DebounceMode::Eager,
    debounce_us: SW_DEBOUNCE_TIME_US,
    reactive_timeout_us: REACTIVE_TIMEOUT_US,
    idle_lights_timeout_us: IDLE_LIGHTS_TIMEOUT_US,
    animation: AnimationKind::ColorCycle,
    comet: CometConfig {
        clamp: 0.1,
        threshold: 0.05,
        decay: 0.0005,
        velocity: 0.12,
        ring_len: PIXEL_COUNT as f32 + 6.0,
        fade: 0.025,
        fade_ticks: 40,
        rest_position: 0.0,
        radius: 2.0,
        hues: [Rgb::new(70, 230, 250), Rgb::new(250, 60, 200)],
        pixel_positions: RING_POSITIONS,
    },
    reactive: ReactiveConfig {
        switch_colors: [
            WHITE, WHITE, WHITE, WHITE, RED, RED, BLUE, BLUE, BLUE, BLUE, BLUE,
        ],
        pixel_switch: PIXEL_SWITCHES,
        glow_brightness: 0.2,
    },
};

const WHITE: Rgb = Rgb::new(255, 255, 255);
const RED: Rgb = Rgb::new(255, 0, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);

/// Pixel `i` sits under switch `i`.
const PIXEL_SWITCHES: [Option<usize>; PIXEL_COUNT] = {
    let mut map = [None; PIXEL_COUNT];
    let mut i = 0;
    while i < PIXEL_COUNT {
        map[i] = Some(i);
        i += 1;
    }
    map
};

/// Ring position of each pixel: two dummy slots before the first pixel and
/// three between the two halves of the strip.
const RING_POSITIONS: [f32; PIXEL_COUNT] = {
    let mut positions = [0.0; PIXEL_COUNT];
    let mut i = 0;
    while i < PIXEL_COUNT {
        let gap = if i >= PIXEL_COUNT / 2 { 3.0 } else { 0.0 };
        positions[i] = 2.0 + i as f32 + gap;
        i += 1;
    }
    positions
};
