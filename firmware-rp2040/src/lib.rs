//! Rhythm game controller firmware for RP2040.
//!
//! Board glue around [`controller_core`]: USB HID, PIO encoder capture, the
//! PIO WS2812B strip and the core-1 lighting loop.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | Switches | 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 27 | Pull-up, closed = low |
//! | Lamps    | 5, 7, 9, 11, 13, 15, 17, 19, 21, 26 | High = lit |
//! | Encoder 0 | 0 (A), 1 (B) | PIO0 SM0 |
//! | Encoder 1 | 2 (A), 3 (B) | PIO0 SM1 |
//! | Pixels   | 28 | WS2812B data, PIO1 SM0 |
//!
//! Holding switch 0 while plugging in selects keyboard+mouse mode.
//!
//! # Architecture
//!
//! Core 0 runs an Embassy executor with:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Lights Task**: Feeds host lighting reports into [`SharedState`](controller_core::SharedState)
//! - **Encoder Tasks**: One per encoder, advancing the raw counters
//! - **Poll Task**: Debounce, build and send one report per iteration, then
//!   drive the switch lamps
//!
//! Core 1 runs a second executor with a single lighting task that ticks the
//! [`LightingArbiter`](controller_core::LightingArbiter) every
//! [`LIGHTS_REFRESH_MS`](controller_core::config::LIGHTS_REFRESH_MS).
//!
//! The cores share nothing but the relaxed atomics in `SharedState`.
//!
//! # Modules
//!
//! - [`usb_output`]: HID descriptors, report sink and lighting request handler
//! - [`capture`]: encoder capture loop
//! - [`ws2812`]: PIO pixel strip ([`Ws2812`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`debounce-deferred`**: Deferred debounce instead of eager
//! - **`lights-turbocharger`**: Encoder comet animation instead of the colour cycle
//! - **`lights-reactive`**: Each switch's pixel lights in its own colour over a dimmed colour cycle

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they define conflicting panic handlers");

#[cfg(all(feature = "lights-turbocharger", feature = "lights-reactive"))]
compile_error!("Cannot enable both `lights-turbocharger` and `lights-reactive` features - pick one local animation");

use controller_core::{AnimationKind, ControllerConfig, DebounceMode, DEFAULT_CONFIG};

pub mod capture;
pub mod usb_output;
pub mod ws2812;

pub use usb_output::{
    configure_usb_hid, report_descriptor, LightsRequestHandler, UsbHidOutput, UsbStateHandler,
};
pub use ws2812::Ws2812;

/// Board configuration with the Cargo feature selections applied.
pub const BOARD_CONFIG: ControllerConfig = ControllerConfig {
    debounce: if cfg!(feature = "debounce-deferred") {
        DebounceMode::Deferred
    } else {
        DebounceMode::Eager
    },
    animation: if cfg!(feature = "lights-turbocharger") {
        AnimationKind::Comet
    } else if cfg!(feature = "lights-reactive") {
        AnimationKind::Reactive
    } else {
        AnimationKind::ColorCycle
    },
    ..DEFAULT_CONFIG
};
