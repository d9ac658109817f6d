//! ControllerPipeline: switches and encoders in, one report per cycle out.

use embedded_hal::digital::InputPin;

use crate::config::{ControllerConfig, ENC_COUNT, SW_COUNT};
use crate::debounce::Debouncer;
use crate::encoder::EncoderSample;
use crate::input::SwitchBank;
use crate::output::{OutputError, ReportSink};
use crate::report::{CycleOutcome, DeviceMode, ReportBuilder};
use crate::shared::SharedState;

/// The polling loop's state: switch bank, debouncer, report builder and sink.
///
/// # Backpressure
///
/// When the sink is not ready the cycle still debounces and publishes the
/// switch states, but builds nothing. Encoder motion is picked up by the
/// next cycle that does send.
pub struct ControllerPipeline<P, O> {
    switches: SwitchBank<P, SW_COUNT>,
    debouncer: Debouncer<SW_COUNT>,
    builder: ReportBuilder,
    output: O,
    last_samples: Option<[EncoderSample; ENC_COUNT]>,
}

impl<P: InputPin, O: ReportSink> ControllerPipeline<P, O> {
    /// Create the pipeline, sampling the mode-select switch to pick the
    /// device personality.
    pub fn new(mut switches: SwitchBank<P, SW_COUNT>, output: O, config: &ControllerConfig) -> Self {
        let mode = DeviceMode::select(switches.sample_one(config.mode_switch));
        Self::with_mode(switches, output, mode, config)
    }

    /// Create the pipeline with a personality already chosen, e.g. when the
    /// USB descriptors had to be picked before the sink existed.
    pub fn with_mode(
        switches: SwitchBank<P, SW_COUNT>,
        output: O,
        mode: DeviceMode,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            switches,
            debouncer: Debouncer::new(config.debounce, config.debounce_us),
            builder: ReportBuilder::new(mode, config),
            output,
            last_samples: None,
        }
    }

    /// Run one poll cycle at `now_us`.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if sending the report failed. The report is
    /// not retried.
    pub async fn poll_cycle(
        &mut self,
        shared: &SharedState,
        now_us: u64,
    ) -> Result<CycleOutcome, OutputError> {
        self.last_samples = None;

        let raw = self.switches.sample();
        let changed = self.debouncer.update(&raw, now_us);
        let stable = self.debouncer.stable();
        shared.publish_buttons(&stable, changed, now_us);

        if !self.output.is_ready() {
            return Ok(CycleOutcome::Skipped);
        }

        let snapshot = shared.encoder_snapshot();
        let built = self.builder.build(&stable, &snapshot);
        self.last_samples = built.samples;

        self.output.send(&built.report).await?;
        Ok(CycleOutcome::Sent(built.report.kind()))
    }

    /// Personality chosen at boot.
    #[inline]
    pub fn mode(&self) -> DeviceMode {
        self.builder.mode()
    }

    /// Encoder samples consumed by the last cycle, if it read the encoders.
    #[inline]
    pub fn last_samples(&self) -> Option<&[EncoderSample; ENC_COUNT]> {
        self.last_samples.as_ref()
    }

    #[inline]
    pub fn debouncer(&self) -> &Debouncer<SW_COUNT> {
        &self.debouncer
    }

    /// Get a reference to the output sink.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the output sink.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Decompose the pipeline into its switch bank and output sink.
    pub fn into_parts(self) -> (SwitchBank<P, SW_COUNT>, O) {
        (self.switches, self.output)
    }
}
