//! Platform-agnostic input pipeline and lighting engine for the rhythm game
//! controller.
//!
//! Nothing here touches a peripheral directly. Switches and lamps come in as
//! `embedded-hal` pins, reports and pixels go out through the [`ReportSink`]
//! and [`PixelSink`] traits, and the two execution contexts meet only in
//! [`SharedState`].
//!
//! # Overview
//!
//! - [`config`]: counts, timings and mapping tables ([`DEFAULT_CONFIG`])
//! - [`debounce`]: eager and deferred debounce policies ([`Debouncer`])
//! - [`encoder`]: rollover-safe encoder tracking ([`EncoderTracker`])
//! - [`report`]: device personality and report assembly ([`ReportBuilder`])
//! - [`pipeline`]: one poll cycle of the main loop ([`ControllerPipeline`])
//! - [`lighting`]: host vs. local lighting arbitration ([`LightingArbiter`])
//! - [`animation`]: colour cycle, comet and per-switch reactive effects ([`Animation`])
//! - [`shared`]: lock-free state read by both loops ([`SharedState`])
//! - [`input`] / [`output`]: switch bank, lamp bank and sink traits
//!
//! # Loops
//!
//! The main loop calls [`ControllerPipeline::poll_cycle`] as fast as USB
//! allows, then drives the lamps from [`lamp_states`]. The lighting loop calls
//! [`LightingArbiter::refresh`] every [`LIGHTS_REFRESH_MS`](config::LIGHTS_REFRESH_MS).
//! The host lighting callback feeds [`SharedState::accept_host_lights`].
//!
//! # Example
//!
//! ```rust
//! use controller_core::{LightingArbiter, LightingMode, SharedState, DEFAULT_CONFIG};
//! use controller_proto::REPORT_ID_LIGHTS;
//!
//! static SHARED: SharedState = SharedState::new();
//!
//! let mut arbiter = LightingArbiter::new(&DEFAULT_CONFIG);
//! assert_eq!(arbiter.tick(&SHARED, 0).mode, LightingMode::LocalReactive);
//!
//! let payload = [0u8; controller_core::config::LIGHTS_LEN];
//! SHARED.accept_host_lights(REPORT_ID_LIGHTS, &payload, 10).unwrap();
//! assert_eq!(arbiter.tick(&SHARED, 20).mode, LightingMode::HostDriven);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod animation;
pub mod config;
pub mod debounce;
pub mod encoder;
pub mod input;
pub mod lighting;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod shared;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use animation::{Animation, AnimationKind, Comet, CometConfig, CometState, ReactiveConfig};
pub use config::{ControllerConfig, DEFAULT_CONFIG};
pub use debounce::{DebounceMode, Debouncer, SwitchState};
pub use encoder::{quadrature_step, EncoderSample, EncoderTracker};
pub use input::SwitchBank;
pub use lighting::{lamp_states, Frame, LightingArbiter, LightingMode, LightingTimeoutClock};
pub use output::{LampBank, OutputError, PixelSink, ReportSink};
pub use pipeline::ControllerPipeline;
pub use report::{BuiltReport, CycleOutcome, DeviceMode, ReportBuilder};
pub use shared::SharedState;
