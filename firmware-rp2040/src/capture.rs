//! Quadrature encoder capture on PIO0.
//!
//! Each encoder runs a x4 quadrature program on its own state machine. The
//! program samples both phases and pushes the two-bit state whenever it
//! changes; the capture task decodes each change with
//! [`quadrature_step`] and advances the shared raw counter. Awaiting the next
//! push is what keeps the capture armed.

use controller_core::{quadrature_step, SharedState};
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, LoadedProgram, PioPin, ShiftDirection,
    StateMachine,
};
use embassy_rp::pio_programs::clock_divider::calculate_pio_clock_divider;
use embassy_rp::Peri;
use pio::pio_asm;

/// Phase sampling clock: one sample every five cycles, 200 kHz.
const SAMPLE_CLOCK_HZ: u32 = 1_000_000;

/// The x4 quadrature program loaded into PIO instruction memory.
pub struct QuadratureProgram<'d, P: Instance> {
    program: LoadedProgram<'d, P>,
}

impl<'d, P: Instance> QuadratureProgram<'d, P> {
    /// Load the program once; every encoder on this PIO shares it.
    pub fn new(common: &mut Common<'d, P>) -> Self {
        let program = pio_asm!(
            // 4 is no two-bit state, so the first sample is always pushed
            "set y, 4",
            "sample:",
            "mov isr, null",
            "in pins, 2",
            "mov x, isr",
            "jmp x!=y changed",
            "jmp sample",
            "changed:",
            "push block",
            "mov y, x",
            "jmp sample"
        );

        Self {
            program: common.load_program(&program.program),
        }
    }
}

/// One encoder whose A and B phases sit on consecutive pins.
pub struct QuadratureEncoder<'d, P: Instance, const SM: usize> {
    sm: StateMachine<'d, P, SM>,
}

impl<'d, P: Instance, const SM: usize> QuadratureEncoder<'d, P, SM> {
    /// Start the state machine sampling `pin_a` (bit 0) and `pin_b` (bit 1).
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        pin_a: Peri<'d, impl PioPin>,
        pin_b: Peri<'d, impl PioPin>,
        program: &QuadratureProgram<'d, P>,
    ) -> Self {
        let mut pin_a = common.make_pio_pin(pin_a);
        let mut pin_b = common.make_pio_pin(pin_b);
        pin_a.set_pull(Pull::Up);
        pin_b.set_pull(Pull::Up);
        sm.set_pin_dirs(Direction::In, &[&pin_a, &pin_b]);

        let mut cfg = Config::default();
        cfg.use_program(&program.program, &[]);
        cfg.set_in_pins(&[&pin_a, &pin_b]);
        cfg.shift_in.direction = ShiftDirection::Left;
        cfg.shift_in.auto_fill = false;
        cfg.fifo_join = FifoJoin::RxOnly;
        cfg.clock_divider = calculate_pio_clock_divider(SAMPLE_CLOCK_HZ);

        sm.set_config(&cfg);
        sm.set_enable(true);

        Self { sm }
    }

    /// Wait for the next phase state, `(B << 1) | A`.
    pub async fn read(&mut self) -> u8 {
        // masked to two bits
        (self.sm.rx().wait_pull().await & 0b11) as u8
    }
}

/// Forward every decoded step of `encoder` into encoder `index`'s raw counter.
pub async fn track<const SM: usize>(
    mut encoder: QuadratureEncoder<'static, PIO0, SM>,
    shared: &'static SharedState,
    index: usize,
) -> ! {
    let mut phase = encoder.read().await;
    loop {
        let next = encoder.read().await;
        let step = quadrature_step(phase, next);
        // A two-state jump means a missed sample; no direction to record
        if step != 0 {
            shared.record_encoder_step(index, step);
        }
        phase = next;
    }
}
