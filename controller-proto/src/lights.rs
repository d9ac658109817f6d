//! Host-to-device lighting report.
//!
//! Payload layout for `LEDS` switch lamps and `ZONES` RGB zones:
//!
//! ```text
//! [lamp_0 .. lamp_{LEDS-1}] [r g b] x ZONES
//! ```
//!
//! The payload may arrive tagged with the lights report ID as its first byte
//! (control-pipe SET_REPORT) or untagged (interrupt OUT with the ID already
//! stripped). Anything else is rejected.

use crate::report::REPORT_ID_LIGHTS;

/// 8-bit RGB colour.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Lamp intensities and zone colours last requested by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightsReport<const LEDS: usize, const ZONES: usize> {
    /// Per-switch lamp value; zero is off, anything else is on.
    pub button_lights: [u8; LEDS],
    /// Per-zone RGB colour.
    pub zone_colors: [Rgb; ZONES],
}

impl<const LEDS: usize, const ZONES: usize> LightsReport<LEDS, ZONES> {
    /// Payload length in bytes, excluding any report ID tag.
    pub const LEN: usize = LEDS + 3 * ZONES;

    /// All lamps off, all zones black.
    #[must_use]
    pub const fn off() -> Self {
        Self {
            button_lights: [0; LEDS],
            zone_colors: [Rgb::BLACK; ZONES],
        }
    }

    /// Parse an output report delivered for `report_id`.
    ///
    /// # Errors
    ///
    /// - [`LightsError::WrongReportId`] if the report is not the lights report.
    /// - [`LightsError::BadTag`] if a tagged payload carries the wrong tag.
    /// - [`LightsError::BadLength`] if the payload is neither the tagged nor
    ///   the untagged length.
    pub fn parse(report_id: u8, data: &[u8]) -> Result<Self, LightsError> {
        if report_id != REPORT_ID_LIGHTS {
            return Err(LightsError::WrongReportId);
        }

        let payload = if data.len() == Self::LEN + 1 {
            if data[0] != REPORT_ID_LIGHTS {
                return Err(LightsError::BadTag);
            }
            &data[1..]
        } else if data.len() == Self::LEN {
            data
        } else {
            return Err(LightsError::BadLength);
        };

        Ok(Self::from_payload(payload))
    }

    /// Decode an untagged payload of exactly [`Self::LEN`] bytes.
    fn from_payload(payload: &[u8]) -> Self {
        let (lamps, colors) = payload.split_at(LEDS);
        let mut report = Self::off();
        report.button_lights.copy_from_slice(lamps);
        for (zone, rgb) in report.zone_colors.iter_mut().zip(colors.chunks_exact(3)) {
            *zone = Rgb::new(rgb[0], rgb[1], rgb[2]);
        }
        report
    }

    /// Write the untagged payload into `buf`.
    ///
    /// Returns the number of bytes written, or `None` if `buf` is too short.
    pub fn write_payload(&self, buf: &mut [u8]) -> Option<usize> {
        let out = buf.get_mut(..Self::LEN)?;
        let (lamps, colors) = out.split_at_mut(LEDS);
        lamps.copy_from_slice(&self.button_lights);
        for (chunk, zone) in colors.chunks_exact_mut(3).zip(self.zone_colors.iter()) {
            chunk.copy_from_slice(&[zone.r, zone.g, zone.b]);
        }
        Some(Self::LEN)
    }

    /// Check whether lamp `index` is requested on.
    #[inline]
    #[must_use]
    pub fn lamp_on(&self, index: usize) -> bool {
        self.button_lights.get(index).is_some_and(|&v| v != 0)
    }
}

impl<const LEDS: usize, const ZONES: usize> Default for LightsReport<LEDS, ZONES> {
    fn default() -> Self {
        Self::off()
    }
}

/// Reasons an inbound lighting write is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightsError {
    /// The output report is not the lights report.
    WrongReportId,
    /// The payload length matches neither framing.
    BadLength,
    /// The leading tag byte is not the lights report ID.
    BadTag,
}
