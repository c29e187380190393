//! Receiver front-end: turns raw captured bytes in the caller's sample
//! format into base-rate amplitude frames, resampling as needed.
//!
//! Owns no decoding state of its own — it is a pure format/rate adapter
//! sitting in front of [`crate::decoder`]; the engine drives both.

use crate::config::{Parameters, K_BASE_SAMPLE_RATE};
use crate::errors::DecodeError;
use crate::signal_processing::Resampler;
use crate::utils::samples_to_float;

/// How many seconds of audio the resampler may process before its delay
/// line is reset as a precaution against numerical drift, when the engine
/// is not currently in the middle of receiving a transmission.
const RESAMPLER_RESET_SECONDS: f64 = 60.0;

pub struct Receiver {
    samples_per_frame: usize,
    sample_format_inp: crate::config::SampleFormat,
    needs_resample: bool,
    resample_factor: f32,
    resampler: Resampler,
    pending: Vec<f32>,
    samples_since_reset: f64,
    reset_interval_samples: f64,
}

impl Receiver {
    pub fn new(params: &Parameters) -> Self {
        let needs_resample = params.sample_rate_inp != K_BASE_SAMPLE_RATE;
        Self {
            samples_per_frame: params.samples_per_frame,
            sample_format_inp: params.sample_format_inp,
            needs_resample,
            resample_factor: (params.sample_rate_inp / K_BASE_SAMPLE_RATE) as f32,
            resampler: Resampler::new(),
            pending: Vec::new(),
            samples_since_reset: 0.0,
            reset_interval_samples: RESAMPLER_RESET_SECONDS * params.sample_rate_inp,
        }
    }

    /// Forces the receiver back to a clean state, discarding any partially
    /// buffered frame and resetting the resampler's delay line.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.resampler.reset();
        self.samples_since_reset = 0.0;
    }

    /// Converts and resamples one chunk of raw captured bytes, returning
    /// every `samplesPerFrame`-sample base-rate frame completed by it (zero,
    /// one, or more, depending on how much audio `raw` represents).
    ///
    /// `currently_receiving` gates the periodic resampler-reset housekeeping,
    /// matching the reference receiver's "don't reset mid-transmission" rule.
    pub fn push(
        &mut self,
        raw: &[u8],
        currently_receiving: bool,
    ) -> Result<Vec<Vec<f32>>, DecodeError> {
        let sample_size = self.sample_format_inp.bytes_per_sample();
        if raw.len() % sample_size != 0 {
            self.pending.clear();
            return Err(DecodeError::CaptureInconsistent {
                got: raw.len(),
                sample_size,
            });
        }

        let samples = samples_to_float(self.sample_format_inp, raw);

        let resampled = if self.needs_resample {
            let mut out = Vec::new();
            self.resampler
                .resample(self.resample_factor, &samples, Some(&mut out));
            out
        } else {
            samples
        };

        self.samples_since_reset += resampled.len() as f64;
        self.pending.extend(resampled);

        let mut frames = Vec::new();
        while self.pending.len() >= self.samples_per_frame {
            let frame: Vec<f32> = self.pending.drain(..self.samples_per_frame).collect();
            frames.push(frame);
        }

        if !currently_receiving && self.samples_since_reset >= self.reset_interval_samples {
            self.resampler.reset();
            self.samples_since_reset = 0.0;
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleFormat;

    fn params(sample_rate_inp: f64) -> Parameters {
        Parameters {
            sample_rate_inp,
            samples_per_frame: 256,
            sample_format_inp: SampleFormat::I16,
            ..Parameters::default()
        }
        .new()
        .unwrap()
    }

    #[test]
    fn bypasses_resampler_at_base_rate() {
        let p = params(K_BASE_SAMPLE_RATE);
        let receiver = Receiver::new(&p);
        assert!(!receiver.needs_resample);
    }

    #[test]
    fn accumulates_until_a_full_frame() {
        let p = params(K_BASE_SAMPLE_RATE);
        let mut receiver = Receiver::new(&p);
        let half = vec![0u8; 256]; // 128 i16 samples, half a 256-sample frame
        let frames = receiver.push(&half, false).unwrap();
        assert!(frames.is_empty());
        let frames = receiver.push(&half, false).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 256);
    }

    #[test]
    fn rejects_misaligned_byte_counts() {
        let p = params(K_BASE_SAMPLE_RATE);
        let mut receiver = Receiver::new(&p);
        let err = receiver.push(&[0u8; 3], false).unwrap_err();
        assert!(matches!(err, DecodeError::CaptureInconsistent { got: 3, .. }));
    }

    #[test]
    fn resamples_non_base_input_rate() {
        let p = params(24_000.0);
        let mut receiver = Receiver::new(&p);
        assert!(receiver.needs_resample);
        let raw = vec![0u8; 4 * 256]; // 512 i16 samples at half rate
        let frames = receiver.push(&raw, false).unwrap();
        // Downsampling by ~2x from 512 input samples should yield at least one frame.
        assert!(!frames.is_empty());
    }
}
