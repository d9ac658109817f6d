//! Report assembly for the two device personalities.

use controller_proto::{InputReport, JoystickReport, MouseReport, NkroReport, ReportKind};

use crate::config::{ControllerConfig, ENC_COUNT, ENC_PULSES, ENC_ROLLOVER, SW_COUNT};
use crate::encoder::{scale_relative, EncoderSample, EncoderTracker};

/// Device personality, fixed for the session.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Joystick buttons plus absolute encoder axes.
    #[default]
    Gamepad,
    /// Alternating NKRO keyboard and relative mouse frames.
    KeyboardMouse,
}

impl DeviceMode {
    /// Personality for the mode-select switch's level at boot.
    #[must_use]
    pub const fn select(mode_switch_pressed: bool) -> Self {
        if mode_switch_pressed {
            Self::KeyboardMouse
        } else {
            Self::Gamepad
        }
    }
}

/// What one poll cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// A report of this kind was handed to the sink.
    Sent(ReportKind),
    /// The sink was not ready; nothing was built.
    Skipped,
}

/// A report ready to send plus the encoder samples consumed building it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltReport {
    pub report: InputReport,
    /// `None` for keyboard frames, which leave the encoders untouched.
    pub samples: Option<[EncoderSample; ENC_COUNT]>,
}

/// Builds one input report per cycle from debounced switches and encoder
/// counter snapshots.
#[derive(Clone, Debug)]
pub struct ReportBuilder {
    mode: DeviceMode,
    keyboard_next: bool,
    trackers: [EncoderTracker; ENC_COUNT],
    keycodes: [u8; SW_COUNT],
    button_bits: [u8; SW_COUNT],
    mouse_sensitivity: [i32; ENC_COUNT],
    mouse_axes: [usize; 2],
}

impl ReportBuilder {
    #[must_use]
    pub fn new(mode: DeviceMode, config: &ControllerConfig) -> Self {
        Self {
            mode,
            keyboard_next: true,
            trackers: core::array::from_fn(|i| {
                EncoderTracker::new(config.encoder_reverse[i], ENC_PULSES, ENC_ROLLOVER)
            }),
            keycodes: config.keycodes,
            button_bits: config.button_bits,
            mouse_sensitivity: config.mouse_sensitivity,
            mouse_axes: config.mouse_axes,
        }
    }

    /// Build this cycle's report.
    ///
    /// In [`DeviceMode::KeyboardMouse`] successive calls alternate keyboard
    /// and mouse frames, starting with keyboard. Encoder motion during a
    /// keyboard frame carries over into the next mouse frame.
    pub fn build(&mut self, stable: &[bool; SW_COUNT], snapshot: &[u32; ENC_COUNT]) -> BuiltReport {
        match self.mode {
            DeviceMode::Gamepad => {
                let samples = self.track(snapshot);
                BuiltReport {
                    report: InputReport::Joystick(self.joystick(stable)),
                    samples: Some(samples),
                }
            }
            DeviceMode::KeyboardMouse => {
                let keyboard = self.keyboard_next;
                self.keyboard_next = !keyboard;
                if keyboard {
                    BuiltReport {
                        report: InputReport::Keyboard(self.keyboard(stable)),
                        samples: None,
                    }
                } else {
                    let samples = self.track(snapshot);
                    BuiltReport {
                        report: InputReport::Mouse(self.mouse(&samples)),
                        samples: Some(samples),
                    }
                }
            }
        }
    }

    fn track(&mut self, snapshot: &[u32; ENC_COUNT]) -> [EncoderSample; ENC_COUNT] {
        core::array::from_fn(|i| self.trackers[i].update(snapshot[i]))
    }

    fn joystick(&self, stable: &[bool; SW_COUNT]) -> JoystickReport {
        let buttons = stable
            .iter()
            .zip(self.button_bits.iter())
            .filter(|(&pressed, &bit)| pressed && bit < 16)
            .fold(0u16, |acc, (_, &bit)| acc | (1 << bit));
        let axes = core::array::from_fn(|i| self.trackers.get(i).map_or(0, EncoderTracker::axis));
        JoystickReport { buttons, axes }
    }

    fn keyboard(&self, stable: &[bool; SW_COUNT]) -> NkroReport {
        let mut report = NkroReport::new();
        for (&pressed, &code) in stable.iter().zip(self.keycodes.iter()) {
            if pressed {
                report.press(code);
            }
        }
        report
    }

    fn mouse(&self, samples: &[EncoderSample; ENC_COUNT]) -> MouseReport {
        let axis = |encoder: usize| {
            samples.get(encoder).map_or(0, |s| {
                scale_relative(s.delta, self.mouse_sensitivity[encoder])
            })
        };
        MouseReport::motion(axis(self.mouse_axes[0]), axis(self.mouse_axes[1]))
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Per-encoder tracking state.
    #[inline]
    #[must_use]
    pub fn trackers(&self) -> &[EncoderTracker; ENC_COUNT] {
        &self.trackers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::encoder::quadrature_step;
    use controller_proto::keycode;

    fn pressed(indices: &[usize]) -> [bool; SW_COUNT] {
        let mut stable = [false; SW_COUNT];
        for &i in indices {
            stable[i] = true;
        }
        stable
    }

    #[test]
    fn test_mode_select() {
        assert_eq!(DeviceMode::select(false), DeviceMode::Gamepad);
        assert_eq!(DeviceMode::select(true), DeviceMode::KeyboardMouse);
    }

    #[test]
    fn test_joystick_buttons_and_axes() {
        let mut builder = ReportBuilder::new(DeviceMode::Gamepad, &DEFAULT_CONFIG);
        let built = builder.build(&pressed(&[0, 3, 10]), &[ENC_PULSES / 2, 0]);
        let InputReport::Joystick(report) = built.report else {
            panic!("expected joystick report");
        };
        assert_eq!(report.buttons, 0b100_0000_1001);
        assert_eq!(report.axes, [128, 0]);
        assert_eq!(built.samples.map(|s| s[0].delta), Some(1200));
    }

    #[test]
    fn test_button_remap() {
        let mut config = DEFAULT_CONFIG;
        config.button_bits[0] = 15;
        config.button_bits[1] = 16;
        let mut builder = ReportBuilder::new(DeviceMode::Gamepad, &config);
        let InputReport::Joystick(report) = builder.build(&pressed(&[0, 1]), &[0, 0]).report else {
            panic!("expected joystick report");
        };
        // Bit 16 does not exist and is dropped
        assert_eq!(report.buttons, 1 << 15);
    }

    #[test]
    fn test_keyboard_mouse_alternate() {
        let mut builder = ReportBuilder::new(DeviceMode::KeyboardMouse, &DEFAULT_CONFIG);
        let kinds: [ReportKind; 4] =
            core::array::from_fn(|_| builder.build(&[false; SW_COUNT], &[0, 0]).report.kind());
        assert_eq!(
            kinds,
            [
                ReportKind::Keyboard,
                ReportKind::Mouse,
                ReportKind::Keyboard,
                ReportKind::Mouse
            ]
        );
    }

    #[test]
    fn test_keyboard_bitmap_exact() {
        let mut config = DEFAULT_CONFIG;
        config.keycodes[2] = keycode::KEY_LEFT_SHIFT;
        let mut builder = ReportBuilder::new(DeviceMode::KeyboardMouse, &config);
        // D (0x07), J -> left shift, G (0x0A)
        let built = builder.build(&pressed(&[0, 2, 10]), &[0, 0]);
        assert_eq!(built.samples, None);
        let InputReport::Keyboard(report) = built.report else {
            panic!("expected keyboard report");
        };

        let mut expected = [0u8; 32];
        expected[0] = 0x02;
        expected[0x07 / 8 + 1] |= 1 << (0x07 % 8);
        expected[0x0A / 8 + 1] |= 1 << (0x0A % 8);
        assert_eq!(report.as_bytes(), &expected);
    }

    #[test]
    fn test_mouse_motion_carries_over_keyboard_frame() {
        let mut config = DEFAULT_CONFIG;
        config.mouse_sensitivity = [2, 1];
        let mut builder = ReportBuilder::new(DeviceMode::KeyboardMouse, &config);

        // Keyboard frame: the encoders move but are not consumed
        builder.build(&[false; SW_COUNT], &[5, 0]);
        let built = builder.build(&[false; SW_COUNT], &[10, 0u32.wrapping_sub(3)]);
        assert_eq!(built.report, InputReport::Mouse(MouseReport::motion(20, -3)));
    }

    #[test]
    fn test_mouse_axes_swap() {
        let mut config = DEFAULT_CONFIG;
        config.mouse_axes = [1, 0];
        let mut builder = ReportBuilder::new(DeviceMode::KeyboardMouse, &config);
        builder.build(&[false; SW_COUNT], &[0, 0]);
        let built = builder.build(&[false; SW_COUNT], &[7, 9]);
        assert_eq!(built.report, InputReport::Mouse(MouseReport::motion(9, 7)));
    }

    #[test]
    fn test_phase_a_lead_moves_mouse_positive() {
        let mut raw: u32 = 0;
        let mut phase = 0b00;
        for next in [0b01, 0b11, 0b10, 0b00, 0b01] {
            raw = raw.wrapping_add_signed(quadrature_step(phase, next));
            phase = next;
        }

        let mut builder = ReportBuilder::new(DeviceMode::KeyboardMouse, &DEFAULT_CONFIG);
        builder.build(&[false; SW_COUNT], &[0, 0]);
        let built = builder.build(&[false; SW_COUNT], &[raw, 0]);
        assert_eq!(built.report, InputReport::Mouse(MouseReport::motion(5, 0)));
    }

    #[test]
    fn test_reverse_encoder_axis() {
        let mut config = DEFAULT_CONFIG;
        config.encoder_reverse = [true, false];
        let mut builder = ReportBuilder::new(DeviceMode::Gamepad, &config);
        let InputReport::Joystick(report) = builder.build(&[false; SW_COUNT], &[ENC_PULSES / 4, 0]).report
        else {
            panic!("expected joystick report");
        };
        assert_eq!(report.axes[0], 192);
    }
}
