#![no_std]
#![no_main]

use controller_core::config::{LED_COUNT, LIGHTS_REFRESH_MS};
use controller_core::{
    lamp_states, ControllerPipeline, CycleOutcome, DeviceMode, LampBank, LightingArbiter,
    SharedState, SwitchBank,
};
use defmt::{debug, info, trace, warn};
use defmt_rtt as _;
use embassy_executor::{Executor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{PIN_28, PIO0, PIO1, USB};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::usb::Driver;
use embassy_rp::Peri;
use embassy_time::{Duration, Instant, Ticker, Timer};
use embassy_usb::class::hid::{HidReader, State};
use embassy_usb::{Builder, Config as UsbConfig, UsbDevice};
use pico_game_controller::capture::{self, QuadratureEncoder, QuadratureProgram};
use pico_game_controller::usb_output::{UsbDriver, MAX_OUTPUT_REPORT_SIZE};
use pico_game_controller::{
    configure_usb_hid, LightsRequestHandler, UsbHidOutput, UsbStateHandler, Ws2812, BOARD_CONFIG,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    PIO1_IRQ_0 => PioInterruptHandler<PIO1>;
});

type Pipeline = ControllerPipeline<Input<'static>, UsbHidOutput<'static>>;

/// State shared by both cores.
static SHARED: SharedState = SharedState::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<LightsRequestHandler> = StaticCell::new();
static DEVICE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

/// Core 1 stack and executor.
static CORE1_STACK: StaticCell<Stack<4096>> = StaticCell::new();
static CORE1_EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pico Game Controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Switches and lamps ---
    let mut switches = SwitchBank::new([
        Input::new(p.PIN_4, Pull::Up),
        Input::new(p.PIN_6, Pull::Up),
        Input::new(p.PIN_8, Pull::Up),
        Input::new(p.PIN_10, Pull::Up),
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_14, Pull::Up),
        Input::new(p.PIN_16, Pull::Up),
        Input::new(p.PIN_18, Pull::Up),
        Input::new(p.PIN_20, Pull::Up),
        Input::new(p.PIN_22, Pull::Up),
        Input::new(p.PIN_27, Pull::Up),
    ]);
    let lamps: LampBank<Output<'static>, LED_COUNT> = LampBank::new([
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_9, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_13, Level::Low),
        Output::new(p.PIN_15, Level::Low),
        Output::new(p.PIN_17, Level::Low),
        Output::new(p.PIN_19, Level::Low),
        Output::new(p.PIN_21, Level::Low),
        Output::new(p.PIN_26, Level::Low),
    ]);

    // Let the pull-ups settle before reading the mode switch
    Timer::after_millis(1).await;
    let mode = DeviceMode::select(switches.sample_one(BOARD_CONFIG.mode_switch));
    info!("Personality: {:?}", mode);

    // --- Encoders (PIO0) ---
    let Pio {
        mut common, sm0, sm1, ..
    } = Pio::new(p.PIO0, Irqs);
    let encoder_program = QuadratureProgram::new(&mut common);
    let encoder0 = QuadratureEncoder::new(&mut common, sm0, p.PIN_0, p.PIN_1, &encoder_program);
    let encoder1 = QuadratureEncoder::new(&mut common, sm1, p.PIN_2, p.PIN_3, &encoder_program);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Pico Game Controller");
    usb_config.product = Some(match mode {
        DeviceMode::Gamepad => "Pico Game Controller Joystick",
        DeviceMode::KeyboardMouse => "Pico Game Controller Keyboard",
    });
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(DEVICE_HANDLER.init(UsbStateHandler::new()));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let request_handler = REQUEST_HANDLER.init(LightsRequestHandler::new(&SHARED));
    let (hid_reader, hid_writer) = configure_usb_hid(&mut builder, hid_state, request_handler, mode);

    // Build the USB device
    let usb_device = builder.build();

    let pipeline = ControllerPipeline::with_mode(
        switches,
        UsbHidOutput::new(hid_writer),
        mode,
        &BOARD_CONFIG,
    );

    // --- Lighting on core 1 ---
    let pio1 = p.PIO1;
    let pixel_pin = p.PIN_28;
    spawn_core1(p.CORE1, CORE1_STACK.init(Stack::new()), move || {
        let executor = CORE1_EXECUTOR.init(Executor::new());
        executor.run(|spawner| spawner.spawn(lighting_task(pio1, pixel_pin).unwrap()));
    });

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(lights_task(hid_reader).unwrap());
    spawner.spawn(encoder_0_task(encoder0).unwrap());
    spawner.spawn(encoder_1_task(encoder1).unwrap());
    spawner.spawn(poll_task(pipeline, lamps).unwrap());

    info!("Pico Game Controller initialized");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// Lights task - hands interrupt OUT reports to the lighting request handler.
#[embassy_executor::task]
async fn lights_task(reader: HidReader<'static, UsbDriver, MAX_OUTPUT_REPORT_SIZE>) {
    let mut handler = LightsRequestHandler::new(&SHARED);
    reader.run(true, &mut handler).await;
}

#[embassy_executor::task]
async fn encoder_0_task(encoder: QuadratureEncoder<'static, PIO0, 0>) {
    capture::track(encoder, &SHARED, 0).await;
}

#[embassy_executor::task]
async fn encoder_1_task(encoder: QuadratureEncoder<'static, PIO0, 1>) {
    capture::track(encoder, &SHARED, 1).await;
}

/// Poll task - one report per iteration, then the switch lamps.
#[embassy_executor::task]
async fn poll_task(mut pipeline: Pipeline, mut lamps: LampBank<Output<'static>, LED_COUNT>) {
    info!("Polling switches and encoders...");

    loop {
        let now = Instant::now().as_micros();
        match pipeline.poll_cycle(&SHARED, now).await {
            Ok(CycleOutcome::Sent(_)) => {}
            Ok(CycleOutcome::Skipped) => trace!("HID not ready, cycle skipped"),
            Err(e) => warn!("HID write error: {:?}", e),
        }

        if let Some(samples) = pipeline.last_samples() {
            for (index, sample) in samples.iter().enumerate() {
                if sample.discarded {
                    warn!("Encoder {} glitch discarded", index);
                }
            }
        }

        lamps.apply(&lamp_states(&SHARED, &BOARD_CONFIG, now));

        // Let USB and the capture tasks run
        yield_now().await;
    }
}

/// Lighting task (core 1) - one pixel frame every refresh period.
#[embassy_executor::task]
async fn lighting_task(pio: Peri<'static, PIO1>, pixel_pin: Peri<'static, PIN_28>) {
    let Pio {
        mut common, sm0, ..
    } = Pio::new(pio, Irqs);
    let mut strip = Ws2812::new(&mut common, sm0, pixel_pin);
    let mut arbiter = LightingArbiter::new(&BOARD_CONFIG);
    let mut ticker = Ticker::every(Duration::from_millis(LIGHTS_REFRESH_MS));
    let mut mode = arbiter.mode();

    info!("Lighting core started");

    loop {
        let frame = arbiter
            .refresh(&SHARED, Instant::now().as_micros(), &mut strip)
            .await;
        if frame.mode != mode {
            debug!("Lighting mode: {:?}", frame.mode);
            mode = frame.mode;
        }
        ticker.next().await;
    }
}
