//! Input reports sent from the controller to the host.

use crate::nkro::NkroReport;

/// Report ID of the joystick input report.
pub const REPORT_ID_JOYSTICK: u8 = 1;
/// Report ID of the lights output report.
pub const REPORT_ID_LIGHTS: u8 = 2;
/// Report ID of the NKRO keyboard input report.
pub const REPORT_ID_KEYBOARD: u8 = 3;
/// Report ID of the mouse input report.
pub const REPORT_ID_MOUSE: u8 = 4;

/// Largest encoded input report, including the report ID byte.
pub const MAX_INPUT_REPORT_SIZE: usize = 1 + NkroReport::SIZE;

/// Joystick report: button bitfield and two absolute axes.
///
/// Total size: 4 bytes (buttons: 2 little-endian, axes: 2x1).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickReport {
    /// Button bitfield, bit position chosen by the button remap table.
    pub buttons: u16,
    /// Absolute axis values (0-255), one per encoder.
    pub axes: [u8; 2],
}

impl JoystickReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 4;

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let [lo, hi] = self.buttons.to_le_bytes();
        [lo, hi, self.axes[0], self.axes[1]]
    }
}

/// Relative mouse report: buttons, X/Y motion and wheel.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
}

impl MouseReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 4;

    /// Report carrying only pointer motion.
    #[must_use]
    pub const fn motion(x: i8, y: i8) -> Self {
        Self {
            buttons: 0,
            x,
            y,
            wheel: 0,
        }
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
        ]
    }
}

/// Which input report a cycle produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Joystick,
    Keyboard,
    Mouse,
}

impl ReportKind {
    /// The report ID byte that prefixes this report on the wire.
    #[inline]
    #[must_use]
    pub const fn report_id(self) -> u8 {
        match self {
            Self::Joystick => REPORT_ID_JOYSTICK,
            Self::Keyboard => REPORT_ID_KEYBOARD,
            Self::Mouse => REPORT_ID_MOUSE,
        }
    }
}

/// Any input report, ready to be framed with its report ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputReport {
    Joystick(JoystickReport),
    Keyboard(NkroReport),
    Mouse(MouseReport),
}

impl InputReport {
    /// The kind of report carried.
    #[must_use]
    pub const fn kind(&self) -> ReportKind {
        match self {
            Self::Joystick(_) => ReportKind::Joystick,
            Self::Keyboard(_) => ReportKind::Keyboard,
            Self::Mouse(_) => ReportKind::Mouse,
        }
    }

    /// Encode as `[report_id, payload...]` into `buf`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `buf` cannot hold the report.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        match self {
            Self::Joystick(r) => frame(buf, REPORT_ID_JOYSTICK, &r.as_bytes()),
            Self::Keyboard(r) => frame(buf, REPORT_ID_KEYBOARD, r.as_bytes()),
            Self::Mouse(r) => frame(buf, REPORT_ID_MOUSE, &r.as_bytes()),
        }
    }
}

fn frame(buf: &mut [u8], id: u8, payload: &[u8]) -> Result<usize, EncodeError> {
    let len = payload.len() + 1;
    let out = buf.get_mut(..len).ok_or(EncodeError::BufferTooSmall)?;
    out[0] = id;
    out[1..].copy_from_slice(payload);
    Ok(len)
}

/// Error type for report encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer is too small to hold the encoded report.
    BufferTooSmall,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joystick_bytes_little_endian() {
        let report = JoystickReport {
            buttons: 0x0408,
            axes: [0x12, 0xFF],
        };
        assert_eq!(report.as_bytes(), [0x08, 0x04, 0x12, 0xFF]);
    }

    #[test]
    fn test_mouse_negative_motion() {
        let report = MouseReport::motion(-1, 127);
        assert_eq!(report.as_bytes(), [0x00, 0xFF, 0x7F, 0x00]);
    }

    #[test]
    fn test_encode_prefixes_report_id() {
        let mut buf = [0u8; MAX_INPUT_REPORT_SIZE];
        let report = InputReport::Joystick(JoystickReport {
            buttons: 1 << 3,
            axes: [0, 128],
        });

        let len = report.encode(&mut buf).unwrap();
        assert_eq!(len, 5);
        assert_eq!(&buf[..len], &[REPORT_ID_JOYSTICK, 0x08, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn test_encode_keyboard_full_length() {
        let mut buf = [0u8; MAX_INPUT_REPORT_SIZE];
        let len = InputReport::Keyboard(NkroReport::new())
            .encode(&mut buf)
            .unwrap();
        assert_eq!(len, MAX_INPUT_REPORT_SIZE);
        assert_eq!(buf[0], REPORT_ID_KEYBOARD);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buf = [0u8; 4];
        let result = InputReport::Mouse(MouseReport::default()).encode(&mut buf);
        assert_eq!(result, Err(EncodeError::BufferTooSmall));
    }

    #[test]
    fn test_kind_matches_report_id() {
        let report = InputReport::Mouse(MouseReport::default());
        assert_eq!(report.kind(), ReportKind::Mouse);
        assert_eq!(report.kind().report_id(), REPORT_ID_MOUSE);
    }
}
