//! Configuration types for the modem engine.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Sample encoding accepted on the input and output sides independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    U8,
    I8,
    U16,
    I16,
    F32,
}

impl SampleFormat {
    /// Bytes occupied by one sample in this format.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => 1,
            SampleFormat::U16 | SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
        }
    }
}

/// Operating-mode bitmask: which directions the engine is prepared to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingMode(u8);

impl OperatingMode {
    pub const TX: OperatingMode = OperatingMode(0b001);
    pub const RX: OperatingMode = OperatingMode(0b010);
    pub const DSS: OperatingMode = OperatingMode(0b100);
    pub const RX_TX: OperatingMode = OperatingMode(0b011);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: OperatingMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn from_bits(bits: u8) -> Self {
        OperatingMode(bits)
    }
}

impl std::ops::BitOr for OperatingMode {
    type Output = OperatingMode;
    fn bitor(self, rhs: OperatingMode) -> OperatingMode {
        OperatingMode(self.0 | rhs.0)
    }
}

/// Normative constants from the external-interfaces section.
pub const K_BASE_SAMPLE_RATE: f64 = 48_000.0;
pub const K_DEFAULT_SAMPLES_PER_FRAME: usize = 1024;
pub const K_DEFAULT_SOUND_MARKER_THRESHOLD: f32 = 3.0;
pub const K_DEFAULT_MARKER_FRAMES: usize = 16;
pub const K_DEFAULT_ENCODED_DATA_OFFSET: usize = 3;
pub const K_MAX_LENGTH_VARIABLE: usize = 140;
pub const K_MAX_LENGTH_FIXED: usize = 64;
pub const K_MAX_SPECTRUM_HISTORY: usize = 4;
/// Upper bound on the encoded (post-RS) byte stream the analyzer will ever
/// scan into; guards the variable-length brute-force loop against runaway
/// offsets on malformed input.
pub const K_MAX_DATA_SIZE: usize = 256;

const MIN_SAMPLE_RATE: f64 = 6_000.0;
const MAX_SAMPLE_RATE: f64 = 96_000.0;

/// Immutable configuration snapshot passed by value at engine construction.
///
/// `payload_length == -1` selects variable-length mode; any value in
/// `1..=kMaxLengthFixed` selects fixed-length mode with that exact payload size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    pub payload_length: i32,
    pub sample_rate_inp: f64,
    pub sample_rate_out: f64,
    pub samples_per_frame: usize,
    pub sound_marker_threshold: f32,
    pub sample_format_inp: SampleFormat,
    pub sample_format_out: SampleFormat,
    pub operating_mode: OperatingMode,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            payload_length: -1,
            sample_rate_inp: K_BASE_SAMPLE_RATE,
            sample_rate_out: K_BASE_SAMPLE_RATE,
            samples_per_frame: K_DEFAULT_SAMPLES_PER_FRAME,
            sound_marker_threshold: K_DEFAULT_SOUND_MARKER_THRESHOLD,
            sample_format_inp: SampleFormat::F32,
            sample_format_out: SampleFormat::F32,
            operating_mode: OperatingMode::RX_TX,
        }
    }
}

impl Parameters {
    /// Validates and constructs a parameter snapshot, matching the
    /// `InvalidParameters` checks in the error-handling design.
    pub fn new(self) -> Result<Self, ConfigError> {
        if self.payload_length != -1
            && (self.payload_length < 1 || self.payload_length as usize > K_MAX_LENGTH_FIXED)
        {
            return Err(ConfigError::PayloadLengthOutOfRange {
                len: self.payload_length,
                max: K_MAX_LENGTH_FIXED,
            });
        }

        for rate in [self.sample_rate_inp, self.sample_rate_out] {
            if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
                return Err(ConfigError::InvalidSampleRate {
                    rate,
                    min: MIN_SAMPLE_RATE,
                    max: MAX_SAMPLE_RATE,
                });
            }
        }

        if self.samples_per_frame == 0
            || self.samples_per_frame > K_DEFAULT_SAMPLES_PER_FRAME
            || !self.samples_per_frame.is_power_of_two()
        {
            return Err(ConfigError::InvalidSamplesPerFrame {
                frames: self.samples_per_frame,
                max: K_DEFAULT_SAMPLES_PER_FRAME,
            });
        }

        if self.operating_mode.bits() == 0 {
            return Err(ConfigError::EmptyOperatingMode);
        }

        Ok(self)
    }

    /// Whether fixed-length mode was selected.
    pub fn is_fixed_length(&self) -> bool {
        self.payload_length != -1
    }

    pub fn hz_per_sample(&self) -> f64 {
        K_BASE_SAMPLE_RATE / self.samples_per_frame as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_are_valid() {
        assert!(Parameters::default().new().is_ok());
    }

    #[test]
    fn rejects_payload_length_over_fixed_cap() {
        let p = Parameters {
            payload_length: 65,
            ..Parameters::default()
        };
        assert!(matches!(
            p.new(),
            Err(ConfigError::PayloadLengthOutOfRange { len: 65, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_sample_rate() {
        let p = Parameters {
            sample_rate_inp: 1_000.0,
            ..Parameters::default()
        };
        assert!(matches!(p.new(), Err(ConfigError::InvalidSampleRate { .. })));
    }

    #[test]
    fn accepts_max_variable_length_marker() {
        let p = Parameters {
            payload_length: -1,
            ..Parameters::default()
        };
        assert!(p.new().is_ok());
    }
}
