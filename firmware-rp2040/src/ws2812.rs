//! WS2812B pixel strip on a PIO state machine.

use controller_core::PixelSink;
use controller_proto::Rgb;
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, PioPin, ShiftDirection, StateMachine,
};
use embassy_rp::Peri;
use fixed::traits::ToFixed;
use pio::pio_asm;

/// PIO clock for the bit program: 10 cycles per bit gives 800 kHz.
const PIO_CLOCK_HZ: u32 = 8_000_000;
/// System clock after `embassy_rp::init` with the default config.
const SYS_CLOCK_HZ: u32 = 125_000_000;

/// Pack a colour into the 24-bit GRB word the strip shifts out MSB first.
#[inline]
#[must_use]
pub const fn grb_word(color: Rgb) -> u32 {
    ((color.g as u32) << 24) | ((color.r as u32) << 16) | ((color.b as u32) << 8)
}

/// WS2812B strip driven by one PIO state machine.
pub struct Ws2812<'d, P: Instance, const SM: usize> {
    sm: StateMachine<'d, P, SM>,
}

impl<'d, P: Instance, const SM: usize> Ws2812<'d, P, SM> {
    /// Load the bit program and start the state machine on `pin`.
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        pin: Peri<'d, impl PioPin>,
    ) -> Self {
        let program = pio_asm!(
            ".side_set 1",
            ".wrap_target",
            "get_data:",
            "pull block      side 0",
            "set y, 23       side 0",
            "bitloop:",
            "out x, 1        side 0 [2]",
            "jmp !x do_zero  side 1 [1]",
            "do_one:",
            "jmp y-- bitloop side 1 [4]",
            "jmp get_data    side 0",
            "do_zero:",
            "jmp y-- bitloop side 0 [4]",
            ".wrap"
        );

        let pin = common.make_pio_pin(pin);
        let loaded = common.load_program(&program.program);

        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[&pin]);
        cfg.set_out_pins(&[&pin]);
        cfg.clock_divider = (SYS_CLOCK_HZ as f32 / PIO_CLOCK_HZ as f32).to_fixed();
        cfg.shift_out.direction = ShiftDirection::Left;
        cfg.shift_out.auto_fill = false;
        cfg.fifo_join = FifoJoin::TxOnly;

        sm.set_config(&cfg);
        sm.set_pin_dirs(Direction::Out, &[&pin]);
        sm.set_enable(true);

        Self { sm }
    }
}

impl<'d, P: Instance, const SM: usize> PixelSink for Ws2812<'d, P, SM> {
    async fn write(&mut self, pixels: &[Rgb]) {
        for &pixel in pixels {
            self.sm.tx().wait_push(grb_word(pixel)).await;
        }
    }
}
