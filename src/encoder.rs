//! Encoder pipeline: payload + protocol + volume -> framed waveform samples.

use crate::config::{Parameters, K_DEFAULT_ENCODED_DATA_OFFSET, K_DEFAULT_MARKER_FRAMES};
use crate::errors::EncodeError;
use crate::protocol::Protocol;
use crate::reed_solomon::{ecc_bytes_for_length, ReedSolomon};
use crate::signal_processing::resampler::Resampler;
use crate::signal_processing::tone::{add_amplitude_smooth, ToneTable};

/// One excited tone, exposed for an external beeper driver and for tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEvent {
    pub freq_hz: f64,
    pub duration_ms: f64,
}

/// Everything needed to stream one transmission's frames.
pub struct TxPlan {
    encoded: Vec<u8>,
    protocol: Protocol,
    volume: i32,
    is_fixed: bool,
    samples_per_frame: usize,
    hz_per_sample: f64,
    tones: ToneTable,
    n_marker_frames: usize,
    total_data_frames: usize,
}

impl TxPlan {
    /// Validates inputs and builds the RS-encoded byte stream and reference
    /// tone tables for one transmission. Does not synthesize samples yet.
    pub fn new(
        params: &Parameters,
        payload: &[u8],
        protocol: Protocol,
        volume: i32,
    ) -> Result<Self, EncodeError> {
        let len = payload.len();
        let max_len = if params.is_fixed_length() {
            params.payload_length as usize
        } else {
            crate::config::K_MAX_LENGTH_VARIABLE
        };
        if len > max_len {
            return Err(EncodeError::InvalidLength {
                len: len as i32,
                max: max_len,
            });
        }
        if !(0..=100).contains(&volume) {
            return Err(EncodeError::InvalidVolume { volume });
        }
        if !params.is_fixed_length() && protocol.requires_fixed_length() {
            return Err(EncodeError::FixedLengthRequired {
                protocol_id: protocol.id,
            });
        }

        let is_fixed = params.is_fixed_length();
        let ecc_bytes = ecc_bytes_for_length(len);

        let encoded = if is_fixed {
            let rs = ReedSolomon::new(len.max(1), ecc_bytes / 2);
            if len == 0 {
                Vec::new()
            } else {
                rs.encode(payload)
            }
        } else {
            let rs_len = ReedSolomon::new(1, (K_DEFAULT_ENCODED_DATA_OFFSET - 1) / 2);
            let len_codeword = rs_len.encode(&[len as u8]);

            let mut out = len_codeword; // [len, parity...] = encodedDataOffset bytes
            if len > 0 {
                let rs_payload = ReedSolomon::new(len, ecc_bytes / 2);
                out.extend(rs_payload.encode(payload));
            }
            out
        };

        let total_bytes = encoded.len();
        let total_data_frames = if total_bytes == 0 {
            0
        } else {
            div_ceil(total_bytes, protocol.bytes_per_tx) * protocol.frames_per_tx
        };

        let tones = ToneTable::build(&protocol, params.samples_per_frame, params.hz_per_sample());

        Ok(Self {
            encoded,
            protocol,
            volume,
            is_fixed,
            samples_per_frame: params.samples_per_frame,
            hz_per_sample: params.hz_per_sample(),
            tones,
            n_marker_frames: K_DEFAULT_MARKER_FRAMES,
            total_data_frames,
        })
    }

    /// Number of base-rate (48 kHz) frames this transmission will emit,
    /// including start/end markers in variable-length mode.
    pub fn total_frames(&self) -> usize {
        if self.encoded.is_empty() {
            return 0;
        }
        if self.is_fixed {
            self.total_data_frames
        } else {
            2 * self.n_marker_frames + self.total_data_frames
        }
    }

    fn bit_freq(&self, bit: usize) -> f64 {
        self.hz_per_sample * self.protocol.freq_start as f64 + self.hz_per_sample * bit as f64
    }

    /// Synthesizes frame `frame_id` (one `samplesPerFrame`-sample base-rate
    /// frame) into `out`, scaled by volume, and returns the tones excited.
    pub fn synthesize_frame(&self, frame_id: usize, out: &mut [f32]) -> Vec<ToneEvent> {
        debug_assert_eq!(out.len(), self.samples_per_frame);
        out.iter_mut().for_each(|v| *v = 0.0);

        let scalar = self.volume as f32 / 100.0;
        let duration_ms = 1000.0 * self.samples_per_frame as f64 / crate::config::K_BASE_SAMPLE_RATE;
        let mut tones = Vec::new();

        let marker_frames = if self.is_fixed { 0 } else { self.n_marker_frames };

        if frame_id < marker_frames {
            self.emit_marker(frame_id, out, scalar, duration_ms, &mut tones, false);
        } else if frame_id < marker_frames + self.total_data_frames {
            self.emit_data(frame_id - marker_frames, out, scalar, duration_ms, &mut tones);
        } else if frame_id < marker_frames + self.total_data_frames + marker_frames {
            let f_id = frame_id - (marker_frames + self.total_data_frames);
            self.emit_marker(f_id, out, scalar, duration_ms, &mut tones, true);
        }

        let n_freq = tones.len().max(1) as f32;
        let scale = 1.0 / n_freq;
        for v in out.iter_mut() {
            *v *= scale;
        }

        tones
    }

    fn emit_marker(
        &self,
        frame_in_marker: usize,
        out: &mut [f32],
        scalar: f32,
        duration_ms: f64,
        tones: &mut Vec<ToneEvent>,
        inverted: bool,
    ) {
        const N_BITS_IN_MARKER: usize = 16;
        for i in 0..N_BITS_IN_MARKER {
            let active_is_one = (i % 2 == 0) != inverted;
            if active_is_one {
                add_amplitude_smooth(
                    &self.tones.bit1[i],
                    out,
                    scalar,
                    frame_in_marker,
                    self.n_marker_frames,
                    self.samples_per_frame,
                );
                tones.push(ToneEvent {
                    freq_hz: self.bit_freq(2 * i),
                    duration_ms,
                });
            } else {
                add_amplitude_smooth(
                    &self.tones.bit0[i],
                    out,
                    scalar,
                    frame_in_marker,
                    self.n_marker_frames,
                    self.samples_per_frame,
                );
                tones.push(ToneEvent {
                    freq_hz: self.bit_freq(2 * i + 1),
                    duration_ms,
                });
            }
        }
    }

    fn emit_data(
        &self,
        data_offset: usize,
        out: &mut [f32],
        scalar: f32,
        duration_ms: f64,
        tones: &mut Vec<ToneEvent>,
    ) {
        let cycle_mod = data_offset % self.protocol.frames_per_tx;
        let byte_offset = (data_offset / self.protocol.frames_per_tx) * self.protocol.bytes_per_tx;

        for j in 0..self.protocol.bytes_per_tx {
            let byte = self.encoded.get(byte_offset + j).copied().unwrap_or(0);
            let lo = (byte & 0x0F) as usize;
            let hi = (byte >> 4) as usize;

            self.emit_bin(2 * j * 16 + lo, out, scalar, cycle_mod, duration_ms, tones);
            self.emit_bin(
                (2 * j + 1) * 16 + hi,
                out,
                scalar,
                cycle_mod,
                duration_ms,
                tones,
            );
        }
    }

    /// Excites one of the `nibblesPerTx*16` raw bin offsets. The reference
    /// tone table only holds `bytesPerTx*16` frames per side, so bin `2*m`
    /// lives in `bit1[m]` and bin `2*m+1` lives in `bit0[m]` — halving the
    /// table by packing two raw bins into each stored frame.
    fn emit_bin(
        &self,
        k_global: usize,
        out: &mut [f32],
        scalar: f32,
        cycle_mod: usize,
        duration_ms: f64,
        tones: &mut Vec<ToneEvent>,
    ) {
        let m = k_global / 2;
        let frame = if k_global % 2 == 0 {
            &self.tones.bit1[m]
        } else {
            &self.tones.bit0[m]
        };
        add_amplitude_smooth(
            frame,
            out,
            scalar,
            cycle_mod,
            self.protocol.frames_per_tx,
            self.samples_per_frame,
        );
        tones.push(ToneEvent {
            freq_hz: self.bit_freq(k_global),
            duration_ms,
        });
    }
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// The tones excited by each base-rate frame of a plan, without writing any
/// audio. For an external beeper driver (or a test) that only cares which
/// frequencies play and for how long, this is cheaper than synthesizing and
/// discarding full sample frames.
pub fn tone_events(plan: &TxPlan) -> Vec<Vec<ToneEvent>> {
    let mut scratch = vec![0.0f32; plan.samples_per_frame];
    (0..plan.total_frames())
        .map(|frame_id| plan.synthesize_frame(frame_id, &mut scratch))
        .collect()
}

/// Drives a [`TxPlan`] to completion, calling `queue` once per synthesized
/// frame (resampled and format-converted by the caller's `queue` closure) and
/// returning the total base-rate sample count produced.
pub fn run_encode(
    plan: &TxPlan,
    samples_per_frame: usize,
    mut queue: impl FnMut(&[f32]),
) -> usize {
    let mut frame = vec![0.0f32; samples_per_frame];
    let n_frames = plan.total_frames();
    for frame_id in 0..n_frames {
        plan.synthesize_frame(frame_id, &mut frame);
        queue(&frame);
    }
    n_frames * samples_per_frame
}

/// Predicts the output sample count for a plan at a given output rate,
/// without synthesizing any audio, by asking the resampler to size the
/// first frame and multiplying out.
pub fn predict_encode_size_samples(
    plan: &TxPlan,
    samples_per_frame: usize,
    sample_rate_out: f64,
) -> usize {
    let n_frames = plan.total_frames();
    if n_frames == 0 {
        return 0;
    }
    if sample_rate_out == crate::config::K_BASE_SAMPLE_RATE {
        return n_frames * samples_per_frame;
    }
    let factor = (crate::config::K_BASE_SAMPLE_RATE / sample_rate_out) as f32;
    let mut resampler = Resampler::new();
    let silence = vec![0.0f32; samples_per_frame];
    let per_frame = resampler.resample(factor, &silence, None) + 1;
    n_frames * per_frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::default_table;

    fn params() -> Parameters {
        Parameters::default().new().unwrap()
    }

    #[test]
    fn empty_payload_produces_no_frames() {
        let table = default_table();
        let plan = TxPlan::new(&params(), &[], table[0], 50).unwrap();
        assert_eq!(plan.total_frames(), 0);
    }

    #[test]
    fn variable_mode_includes_both_markers() {
        let table = default_table();
        let plan = TxPlan::new(&params(), b"test", table[0], 50).unwrap();
        assert!(plan.total_frames() > 2 * K_DEFAULT_MARKER_FRAMES);
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let table = default_table();
        let err = TxPlan::new(&params(), b"hi", table[0], 101).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidVolume { volume: 101 }));
    }

    #[test]
    fn dual_tone_protocol_requires_fixed_length() {
        let table = default_table();
        let err = TxPlan::new(&params(), b"hi", table[crate::protocol::DT_NORMAL], 50).unwrap_err();
        assert!(matches!(err, EncodeError::FixedLengthRequired { .. }));
    }

    #[test]
    fn synthesized_frame_has_samples_per_frame_length() {
        let table = default_table();
        let plan = TxPlan::new(&params(), b"abc", table[0], 50).unwrap();
        let mut frame = vec![0.0f32; 1024];
        let tones = plan.synthesize_frame(0, &mut frame);
        assert_eq!(frame.len(), 1024);
        assert_eq!(tones.len(), 16); // marker frame excites 16 tones
    }

    #[test]
    fn run_encode_produces_total_frames_times_samples_per_frame() {
        let table = default_table();
        let plan = TxPlan::new(&params(), b"abc", table[0], 50).unwrap();
        let mut count = 0usize;
        let total = run_encode(&plan, 1024, |frame| count += frame.len());
        assert_eq!(total, count);
        assert_eq!(total, plan.total_frames() * 1024);
    }

    #[test]
    fn tone_events_has_one_entry_per_frame() {
        let table = default_table();
        let plan = TxPlan::new(&params(), b"abc", table[0], 50).unwrap();
        let events = tone_events(&plan);
        assert_eq!(events.len(), plan.total_frames());
        assert_eq!(events[0].len(), 16); // start marker excites 16 tones
        for tone in &events[0] {
            assert!(tone.freq_hz > 0.0);
            assert!(tone.duration_ms > 0.0);
        }
    }
}
