//! USB HID output and host lighting input.

use controller_core::config::{LIGHTS_LEN, SW_COUNT};
use controller_core::{DeviceMode, OutputError, ReportSink, SharedState};
use controller_proto::{InputReport, MAX_INPUT_REPORT_SIZE};
use defmt::{debug, trace};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::Instant;
use embassy_usb::class::hid::{HidReader, HidReaderWriter, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Handler};
use portable_atomic::{AtomicBool, Ordering};

/// USB driver type for this board.
pub type UsbDriver = Driver<'static, USB>;

/// Largest host output report, including the report ID byte.
pub const MAX_OUTPUT_REPORT_SIZE: usize = LIGHTS_LEN + 1;

// The descriptors below hard-code these sizes.
const _: () = assert!(SW_COUNT == 11);
const _: () = assert!(LIGHTS_LEN == 16);

/// Joystick personality: joystick input report plus the lights output report.
pub const GAMEPAD_DESCRIPTOR: &[u8] = &GAMEPAD_BYTES;

/// Keyboard+mouse personality: lights output report, NKRO keyboard and a
/// relative mouse.
pub const KEYBOARD_MOUSE_DESCRIPTOR: &[u8] = &KEYBOARD_MOUSE_BYTES;

const GAMEPAD_BYTES: [u8; JOYSTICK_COLLECTION.len() + LIGHTS_COLLECTION.len()] =
    concat(JOYSTICK_COLLECTION, LIGHTS_COLLECTION);

const LIGHTS_NKRO_BYTES: [u8; LIGHTS_COLLECTION.len() + NKRO_COLLECTION.len()] =
    concat(LIGHTS_COLLECTION, NKRO_COLLECTION);

const KEYBOARD_MOUSE_BYTES: [u8; LIGHTS_NKRO_BYTES.len() + MOUSE_COLLECTION.len()] =
    concat(LIGHTS_NKRO_BYTES, MOUSE_COLLECTION);

/// 11 buttons padded to 16 bits, then two 8-bit absolute axes.
const JOYSTICK_COLLECTION: [u8; 48] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    //
    // --- Buttons (11 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x0B, //   Usage Maximum (Button 11)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x0B, //   Report Count (11)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x05, //   Report Size (5) - padding
    0x81, 0x03, //   Input (Constant, Variable, Absolute)
    //
    // --- Encoder axes ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x95, 0x02, //   Report Count (2)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Host-to-device lights: 10 lamp bytes then 2 RGB zones.
const LIGHTS_COLLECTION: [u8; 30] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x00, // Usage (Undefined)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0x95, 0x10, //   Report Count (16)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x05, 0x0A, //   Usage Page (Ordinal)
    0x88, 0x04, //   String Minimum (4)
    0x98, 0x10, //   String Maximum (16)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x10, //   Usage Maximum (16)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Modifier byte then a 248-bit key bitmap.
const NKRO_COLLECTION: [u8; 42] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x03, //   Report ID (3)
    //
    // --- Modifiers ---
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x05, 0x07, //   Usage Page (Keyboard)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Key bitmap (31 bytes) ---
    0x75, 0x01, //   Report Size (1)
    0x96, 0xF8, 0x00, //   Report Count (248)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x05, 0x07, //   Usage Page (Keyboard)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xF7, //   Usage Maximum (247)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Five buttons, then relative X, Y and wheel.
const MOUSE_COLLECTION: [u8; 54] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x04, //   Report ID (4)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    //
    // --- Buttons (5 buttons) ---
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x05, //     Usage Maximum (Button 5)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x05, //     Report Count (5)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x03, //     Report Size (3) - padding
    0x81, 0x01, //     Input (Constant)
    //
    // --- Motion ---
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
];

const fn concat<const A: usize, const B: usize, const N: usize>(a: [u8; A], b: [u8; B]) -> [u8; N] {
    assert!(A + B == N);
    let mut out = [0u8; N];
    let mut i = 0;
    while i < A {
        out[i] = a[i];
        i += 1;
    }
    while i < N {
        out[i] = b[i - A];
        i += 1;
    }
    out
}

/// Report descriptor for a personality.
#[must_use]
pub const fn report_descriptor(mode: DeviceMode) -> &'static [u8] {
    match mode {
        DeviceMode::Gamepad => GAMEPAD_DESCRIPTOR,
        DeviceMode::KeyboardMouse => KEYBOARD_MOUSE_DESCRIPTOR,
    }
}

/// Set while the host has the device configured and awake.
static USB_READY: AtomicBool = AtomicBool::new(false);

/// Device-level USB event handler tracking readiness.
pub struct UsbStateHandler {
    configured: bool,
    suspended: bool,
}

impl UsbStateHandler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: false,
            suspended: false,
        }
    }

    fn publish(&self) {
        USB_READY.store(self.configured && !self.suspended, Ordering::Relaxed);
    }
}

impl Default for UsbStateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for UsbStateHandler {
    fn reset(&mut self) {
        self.configured = false;
        self.publish();
    }

    fn configured(&mut self, configured: bool) {
        self.configured = configured;
        self.publish();
    }

    fn suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        self.publish();
    }
}

/// USB HID input report output.
///
/// Wraps an embassy-usb HID writer. [`is_ready`](ReportSink::is_ready) only
/// reports whether the device is configured and awake; it cannot see the IN
/// endpoint. While the host has not yet collected the previous report,
/// [`send`](ReportSink::send) waits for it, at most one polling interval.
/// That wait is what paces the poll loop to the host's report rate.
pub struct UsbHidOutput<'d> {
    writer: HidWriter<'d, Driver<'d, USB>, MAX_INPUT_REPORT_SIZE>,
}

impl<'d> UsbHidOutput<'d> {
    /// Create a new USB HID output from the given HID writer.
    pub fn new(writer: HidWriter<'d, Driver<'d, USB>, MAX_INPUT_REPORT_SIZE>) -> Self {
        Self { writer }
    }
}

impl<'d> ReportSink for UsbHidOutput<'d> {
    async fn send(&mut self, report: &InputReport) -> Result<(), OutputError> {
        let mut buf = [0u8; MAX_INPUT_REPORT_SIZE];
        let len = report.encode(&mut buf).map_err(|_| OutputError::Dropped)?;
        self.writer
            .write(&buf[..len])
            .await
            .map_err(|_| OutputError::Io)
    }

    // Configured and not suspended; a busy endpoint is absorbed by `send`
    fn is_ready(&self) -> bool {
        USB_READY.load(Ordering::Relaxed)
    }
}

/// HID request handler: accepts lights output reports into shared state.
///
/// GET_REPORT has no data to offer and stalls.
pub struct LightsRequestHandler {
    shared: &'static SharedState,
}

impl LightsRequestHandler {
    #[must_use]
    pub const fn new(shared: &'static SharedState) -> Self {
        Self { shared }
    }
}

impl RequestHandler for LightsRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        if let ReportId::Out(report_id) = id {
            let now = Instant::now().as_micros();
            match self.shared.accept_host_lights(report_id, data, now) {
                Ok(()) => trace!("Host lights accepted"),
                Err(e) => debug!("Host lights ignored: {:?}", e),
            }
        }
        // Malformed lighting is dropped without telling the host
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the output-report reader and the input-report writer.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
    request_handler: &'d mut LightsRequestHandler,
    mode: DeviceMode,
) -> (
    HidReader<'d, Driver<'d, USB>, MAX_OUTPUT_REPORT_SIZE>,
    HidWriter<'d, Driver<'d, USB>, MAX_INPUT_REPORT_SIZE>,
) {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: report_descriptor(mode),
        request_handler: Some(request_handler),
        poll_ms: 1,
        max_packet_size: 64,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidReaderWriter::<_, MAX_OUTPUT_REPORT_SIZE, MAX_INPUT_REPORT_SIZE>::new(builder, state, config)
        .split()
}
