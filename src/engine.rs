//! Modem facade: owns parameters, protocol table, Tx/Rx state, and exposes
//! the handle-style operations external code drives `encode`/`decode`
//! through.

use crate::config::{Parameters, K_BASE_SAMPLE_RATE};
use crate::decoder::{DecodeEvent, FixedLengthDecoder, VariableLengthDecoder};
use crate::encoder::{predict_encode_size_samples, run_encode, TxPlan};
use crate::errors::{ConfigError, EncodeError};
use crate::logging::{LogConfig, LogLevel, SignalLogger};
use crate::protocol::{default_table, Protocol};
use crate::receiver::Receiver;
use crate::signal_processing::{folded_power_spectrum, Resampler};
use crate::utils::float_to_samples;

/// Outcome of [`Engine::take_rx_data`]: mirrors the reference facade's
/// "len>0 success / -1 failure / 0 nothing new" trichotomy as an enum
/// instead of a sentinel-coded integer.
#[derive(Debug, Clone, PartialEq)]
pub enum RxData {
    /// Nothing new since the last call.
    None,
    /// An end marker closed a transmission that failed to decode.
    Failure,
    /// A transmission decoded successfully.
    Data(Vec<u8>),
}

/// Owns all mutable engine state: Tx scratch, Rx decoders, resampler state,
/// the protocol table, and the last decode outcome. Single-threaded and
/// cooperative — every mutation happens on the thread that calls `encode`,
/// `decode`, or an accessor.
pub struct Engine {
    params: Parameters,
    protocols: Vec<Protocol>,
    logger: SignalLogger,

    tx_plan: Option<TxPlan>,
    has_tx_data: bool,

    receiver: Receiver,
    variable_decoder: VariableLengthDecoder,
    fixed_decoder: Option<FixedLengthDecoder>,
    rx_data: RxData,
    last_rx_spectrum: Vec<f32>,
    last_rx_amplitude: Vec<f32>,
}

impl Engine {
    /// Validates `params` and constructs an engine. Fails the same way
    /// `Parameters::new` does.
    pub fn new(params: Parameters) -> Result<Self, ConfigError> {
        let params = params.new()?;
        let protocols = default_table();

        let variable_decoder = VariableLengthDecoder::new(
            params.samples_per_frame,
            params.sound_marker_threshold,
            &protocols,
        );
        let fixed_decoder = if params.is_fixed_length() {
            Some(FixedLengthDecoder::new(
                params.payload_length as usize,
                &protocols,
            ))
        } else {
            None
        };
        let receiver = Receiver::new(&params);

        Ok(Self {
            params,
            protocols,
            logger: SignalLogger::new(LogConfig::default()),
            tx_plan: None,
            has_tx_data: false,
            receiver,
            variable_decoder,
            fixed_decoder,
            rx_data: RxData::None,
            last_rx_spectrum: Vec::new(),
            last_rx_amplitude: Vec::new(),
        })
    }

    /// Replaces the logging configuration (e.g. [`LogConfig::disabled`] for
    /// embedded builds, [`LogConfig::verbose`] while debugging).
    pub fn configure_logging(&mut self, config: LogConfig) {
        self.logger = SignalLogger::new(config);
    }

    pub fn logger(&self) -> &SignalLogger {
        &self.logger
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn has_tx_data(&self) -> bool {
        self.has_tx_data
    }

    /// Resets Tx state and schedules a new transmission.
    pub fn init(
        &mut self,
        payload: &[u8],
        protocol: Protocol,
        volume: i32,
    ) -> Result<(), EncodeError> {
        let plan = TxPlan::new(&self.params, payload, protocol, volume)?;
        self.has_tx_data = !payload.is_empty();
        self.tx_plan = Some(plan);
        Ok(())
    }

    /// Predicts the sample count `encode` will produce for the scheduled
    /// transmission, without emitting any audio.
    pub fn encode_size_samples(&self) -> usize {
        match &self.tx_plan {
            Some(plan) => {
                predict_encode_size_samples(plan, self.params.samples_per_frame, self.params.sample_rate_out)
            }
            None => 0,
        }
    }

    /// Same as [`Engine::encode_size_samples`], in bytes of the configured
    /// output sample format.
    pub fn encode_size_bytes(&self) -> usize {
        self.encode_size_samples() * self.params.sample_format_out.bytes_per_sample()
    }

    /// Streams the scheduled transmission's frames through `out_cb`,
    /// resampling and format-converting as configured, and clears
    /// `has_tx_data` once the transmission completes.
    pub fn encode(&mut self, mut out_cb: impl FnMut(&[u8])) -> Result<(), EncodeError> {
        let Some(plan) = self.tx_plan.take() else {
            return Ok(());
        };

        let needs_resample = self.params.sample_rate_out != K_BASE_SAMPLE_RATE;
        let factor = (K_BASE_SAMPLE_RATE / self.params.sample_rate_out) as f32;
        let mut resampler = Resampler::new();
        let fmt = self.params.sample_format_out;

        self.logger.log(
            LogLevel::Debug,
            "TX",
            format!("starting transmission of {} base-rate frames", plan.total_frames()),
        );

        run_encode(&plan, self.params.samples_per_frame, |frame| {
            if needs_resample {
                let mut out = Vec::new();
                resampler.resample(factor, frame, Some(&mut out));
                out_cb(&float_to_samples(fmt, &out));
            } else {
                out_cb(&float_to_samples(fmt, frame));
            }
        });

        self.has_tx_data = false;
        Ok(())
    }

    /// Drains `in_cb` (which returns the number of bytes written into its
    /// buffer argument, zero to stop) until it signals no more audio is
    /// available, dispatching every accumulated base-rate frame to the
    /// variable- or fixed-length decoder per the configured mode.
    pub fn decode(&mut self, mut in_cb: impl FnMut(&mut [u8]) -> usize) {
        let sample_size = self.params.sample_format_inp.bytes_per_sample();
        let mut buf = vec![0u8; self.params.samples_per_frame * sample_size];

        loop {
            let n = in_cb(&mut buf);
            if n == 0 {
                break;
            }

            let currently_receiving = self.is_receiving();
            match self.receiver.push(&buf[..n], currently_receiving) {
                Ok(frames) => {
                    for frame in frames {
                        self.process_frame(&frame);
                    }
                }
                Err(err) => {
                    self.logger.warn("RECORD", err);
                    self.receiver.reset();
                }
            }
        }
    }

    fn is_receiving(&self) -> bool {
        !self.params.is_fixed_length() && self.variable_decoder.is_recording()
    }

    fn process_frame(&mut self, frame: &[f32]) {
        self.last_rx_amplitude = frame.to_vec();
        self.last_rx_spectrum = folded_power_spectrum(frame);

        if self.params.is_fixed_length() {
            if let Some(decoder) = &mut self.fixed_decoder {
                if let Some(payload) = decoder.on_frame(frame, &self.protocols) {
                    self.logger.info("RS", "fixed-length decode succeeded");
                    self.rx_data = RxData::Data(payload);
                }
            }
        } else {
            match self.variable_decoder.on_frame(frame, &self.protocols) {
                DecodeEvent::Success(payload) => {
                    self.logger.info("ANALYZE", "variable-length decode succeeded");
                    self.rx_data = RxData::Data(payload);
                }
                DecodeEvent::Failure => {
                    self.logger
                        .warn("ANALYZE", "end marker closed a transmission that failed to decode");
                    self.rx_data = RxData::Failure;
                }
                DecodeEvent::Pending => {}
            }
        }
    }

    /// Returns and clears the last decode outcome.
    pub fn take_rx_data(&mut self) -> RxData {
        std::mem::replace(&mut self.rx_data, RxData::None)
    }

    /// Enables or disables protocol `id` for receiving. Out-of-range ids are
    /// ignored.
    pub fn toggle_rx_protocol(&mut self, id: usize, enabled: bool) {
        if let Some(p) = self.protocols.get_mut(id) {
            p.enabled = enabled;
        }
    }

    /// Forces an immediate return to the listening state, discarding any
    /// partially recorded transmission.
    pub fn stop_receiving(&mut self) {
        self.variable_decoder.reset();
        self.receiver.reset();
    }

    /// The most recent frame's folded power spectrum, for diagnostics.
    pub fn rx_spectrum(&self) -> &[f32] {
        &self.last_rx_spectrum
    }

    /// The most recent frame's raw amplitude, for diagnostics.
    pub fn rx_amplitude(&self) -> &[f32] {
        &self.last_rx_amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AUDIBLE_FAST;

    fn params() -> Parameters {
        Parameters::default().new().unwrap()
    }

    #[test]
    fn end_to_end_roundtrip_at_base_rate() {
        let mut engine = Engine::new(params()).unwrap();
        let table = default_table();
        engine.init(b"test", table[AUDIBLE_FAST], 50).unwrap();
        assert!(engine.has_tx_data());

        let mut audio: Vec<u8> = Vec::new();
        engine.encode(|bytes| audio.extend_from_slice(bytes)).unwrap();
        assert!(!engine.has_tx_data());
        assert_eq!(audio.len(), engine.encode_size_bytes());

        let mut offset = 0usize;
        engine.decode(|buf| {
            let remaining = audio.len() - offset;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&audio[offset..offset + n]);
            offset += n;
            n
        });

        assert_eq!(engine.take_rx_data(), RxData::Data(b"test".to_vec()));
    }

    #[test]
    fn empty_payload_yields_no_tx_data() {
        let mut engine = Engine::new(params()).unwrap();
        let table = default_table();
        engine.init(b"", table[0], 50).unwrap();
        assert!(!engine.has_tx_data());
        assert_eq!(engine.encode_size_samples(), 0);
    }

    #[test]
    fn toggling_unknown_protocol_id_is_a_no_op() {
        let mut engine = Engine::new(params()).unwrap();
        engine.toggle_rx_protocol(9_999, false);
    }

    #[test]
    fn invalid_parameters_are_rejected_at_construction() {
        let bad = Parameters {
            sample_rate_inp: 1.0,
            ..Parameters::default()
        };
        assert!(Engine::new(bad).is_err());
    }
}
