//! HID report wire formats for the rhythm game controller.
//!
//! This crate owns every byte layout exchanged with the USB host:
//!
//! - **Input reports** (device to host)
//!   - [`JoystickReport`] - button bitfield plus two absolute 8-bit axes
//!   - [`NkroReport`] - 32-byte N-key-rollover keyboard bitmap
//!   - [`MouseReport`] - relative pointer motion
//!   - [`InputReport`] - one of the above, tagged with its report ID
//!
//! - **Output reports** (host to device)
//!   - [`LightsReport`] - per-switch lamp values and per-zone RGB colours
//!
//! # Report IDs
//!
//! All reports share one composite HID interface and are told apart by a
//! leading report ID byte:
//!
//! | ID | Report |
//! |----|--------|
//! | 1  | Joystick (input) |
//! | 2  | Lights (output) |
//! | 3  | NKRO keyboard (input) |
//! | 4  | Mouse (input) |
//!
//! # Example
//!
//! ```
//! use controller_proto::{keycode, InputReport, NkroReport, MAX_INPUT_REPORT_SIZE};
//!
//! let mut keys = NkroReport::new();
//! keys.press(keycode::KEY_D);
//!
//! let mut buf = [0u8; MAX_INPUT_REPORT_SIZE];
//! let len = InputReport::Keyboard(keys).encode(&mut buf).unwrap();
//! assert_eq!(len, 33);
//! assert_eq!(buf[0], controller_proto::REPORT_ID_KEYBOARD);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod keycode;
pub mod lights;
pub mod nkro;
pub mod report;

pub use lights::{LightsError, LightsReport, Rgb};
pub use nkro::NkroReport;
pub use report::{
    EncodeError, InputReport, JoystickReport, MouseReport, ReportKind, MAX_INPUT_REPORT_SIZE,
    REPORT_ID_JOYSTICK, REPORT_ID_KEYBOARD, REPORT_ID_LIGHTS, REPORT_ID_MOUSE,
};
