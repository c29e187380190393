//! Variable-length decoder: listens for a start marker, records until the
//! matching end marker, then brute-forces the symbol offset and protocol
//! that makes the recording's Reed-Solomon length header (and, in turn, its
//! payload) check out.

use std::collections::VecDeque;

use super::{argmax16, marker_bits_present};
use crate::config::{K_DEFAULT_ENCODED_DATA_OFFSET, K_MAX_LENGTH_VARIABLE};
use crate::protocol::Protocol;
use crate::reed_solomon::{ecc_bytes_for_length, ReedSolomon};
use crate::signal_processing::{average_frames, folded_power_spectrum};

const MARKER_FRAMES: usize = crate::config::K_DEFAULT_MARKER_FRAMES;
const HISTORY_FRAMES: usize = crate::config::K_MAX_SPECTRUM_HISTORY;
const STEPS_PER_FRAME: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Listening,
    Recording,
}

/// Outcome of feeding one frame to the decoder.
#[derive(Debug, PartialEq)]
pub enum DecodeEvent {
    /// Still listening, or still recording — nothing to report yet.
    Pending,
    /// A marker-bracketed transmission was captured and decoded.
    Success(Vec<u8>),
    /// An end marker closed a transmission, but no protocol's Reed-Solomon
    /// decode checked out — distinct from "no message yet".
    Failure,
}

/// Streams base-rate frames in and, once a complete marker-bracketed
/// transmission has been captured, analyzes it for a decodable payload.
pub struct VariableLengthDecoder {
    threshold: f32,
    samples_per_frame: usize,
    max_record_frames: usize,
    state: State,
    amplitude_history: VecDeque<Vec<f32>>,
    recorded: Vec<f32>,
    marker_freq_start: Option<usize>,
}

impl VariableLengthDecoder {
    /// `all_protocols` is the full static table, used only to size the
    /// maximum record duration (`2*nMarkerFrames + maxFramesPerTx *
    /// ((kMaxLengthVariable + eccBytes(kMaxLengthVariable))/minBytesPerTx +
    /// 1)`), matching the reference bound regardless of which protocols are
    /// currently enabled.
    pub fn new(samples_per_frame: usize, threshold: f32, all_protocols: &[Protocol]) -> Self {
        let min_bytes_per_tx = all_protocols.iter().map(|p| p.bytes_per_tx).min().unwrap_or(1);
        let max_frames_per_tx = all_protocols.iter().map(|p| p.frames_per_tx).max().unwrap_or(1);
        let worst_len = K_MAX_LENGTH_VARIABLE + ecc_bytes_for_length(K_MAX_LENGTH_VARIABLE);
        let max_record_frames =
            2 * MARKER_FRAMES + max_frames_per_tx * (div_ceil(worst_len, min_bytes_per_tx) + 1);

        Self {
            threshold,
            samples_per_frame,
            max_record_frames,
            state: State::Listening,
            amplitude_history: VecDeque::with_capacity(HISTORY_FRAMES),
            recorded: Vec::new(),
            marker_freq_start: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == State::Recording
    }

    /// Resets to the listening state, discarding any partially recorded
    /// transmission.
    pub fn reset(&mut self) {
        self.state = State::Listening;
        self.amplitude_history.clear();
        self.recorded.clear();
        self.marker_freq_start = None;
    }

    /// Feeds one base-rate frame of amplitude samples to the decoder.
    ///
    /// Returns [`DecodeEvent::Success`] once a complete, Reed-Solomon-verified
    /// transmission has been captured and decoded, [`DecodeEvent::Failure`]
    /// once an end marker closes a transmission that didn't check out, and
    /// [`DecodeEvent::Pending`] otherwise.
    pub fn on_frame(&mut self, amplitude: &[f32], protocols: &[Protocol]) -> DecodeEvent {
        debug_assert_eq!(amplitude.len(), self.samples_per_frame);

        if self.amplitude_history.len() == HISTORY_FRAMES {
            self.amplitude_history.pop_front();
        }
        self.amplitude_history.push_back(amplitude.to_vec());
        let averaged = average_frames(
            &self
                .amplitude_history
                .iter()
                .cloned()
                .collect::<Vec<_>>(),
        );
        let spectrum = folded_power_spectrum(&averaged);

        let listenable: Vec<&Protocol> = protocols
            .iter()
            .filter(|p| p.enabled && !p.requires_fixed_length())
            .collect();

        match self.state {
            State::Listening => {
                if let Some(p) = listenable
                    .iter()
                    .find(|p| marker_bits_present(&spectrum, p, self.threshold, false))
                {
                    self.state = State::Recording;
                    self.recorded.clear();
                    self.amplitude_history.clear();
                    self.marker_freq_start = Some(p.freq_start);
                }
                DecodeEvent::Pending
            }
            State::Recording => {
                self.recorded.extend_from_slice(amplitude);

                let candidates: Vec<&Protocol> = listenable
                    .into_iter()
                    .filter(|p| Some(p.freq_start) == self.marker_freq_start)
                    .collect();

                let ended = candidates
                    .iter()
                    .any(|p| marker_bits_present(&spectrum, p, self.threshold, true));

                if ended {
                    let result = analyze(&self.recorded, self.samples_per_frame, &candidates);
                    self.reset();
                    return match result {
                        Some(payload) => DecodeEvent::Success(payload),
                        None => DecodeEvent::Failure,
                    };
                }

                if self.recorded.len() > self.max_record_frames * self.samples_per_frame {
                    self.reset();
                }
                DecodeEvent::Pending
            }
        }
    }
}

/// Brute-forces the fine-grained symbol offset (in `samplesPerFrame/16`
/// steps) and candidate protocol that makes `recorded`'s length header and
/// payload check out under Reed-Solomon.
fn analyze(recorded: &[f32], samples_per_frame: usize, candidates: &[&Protocol]) -> Option<Vec<u8>> {
    let step = samples_per_frame / STEPS_PER_FRAME;
    if step == 0 || recorded.is_empty() {
        return None;
    }

    let frames_to_analyze = MARKER_FRAMES * STEPS_PER_FRAME;
    let rs_length = ReedSolomon::new(1, (K_DEFAULT_ENCODED_DATA_OFFSET - 1) / 2);

    // Protocol outer, offset inner: exhaust one protocol's whole offset range
    // before trying the next, matching GGWave::decode's nesting. Several
    // protocols share a freqStart (e.g. the three audible speeds all start at
    // bin 40) and all pass the marker_freq_start filter together, so the
    // opposite nesting could let a spurious RS-valid decode for the wrong
    // protocol at the wrong offset win before the right one is ever tried.
    for protocol in candidates {
        for ii in (0..frames_to_analyze).rev() {
            let offset_samples = ii * step;

            if let Some(payload) = analyze_one(
                recorded,
                samples_per_frame,
                offset_samples,
                protocol,
                &rs_length,
            ) {
                return Some(payload);
            }
        }
    }
    None
}

fn analyze_one(
    recorded: &[f32],
    samples_per_frame: usize,
    offset_samples: usize,
    protocol: &Protocol,
    rs_length: &ReedSolomon,
) -> Option<Vec<u8>> {
    let frames_per_tx = protocol.frames_per_tx;
    let bytes_per_tx = protocol.bytes_per_tx;
    let symbol_span = frames_per_tx * samples_per_frame;

    let mut encoded = vec![0u8; crate::config::K_MAX_DATA_SIZE];
    let mut known_length: Option<(usize, usize, usize)> = None; // (length, total_bytes_expected, total_frames_expected)

    let mut itx = 0usize;
    loop {
        let base = offset_samples + itx * symbol_span;
        if base + symbol_span > recorded.len() {
            break;
        }
        if (itx + 1) * bytes_per_tx > encoded.len() {
            break;
        }

        let mut fft_inp = vec![0.0f32; samples_per_frame];
        for k in 0..frames_per_tx {
            let start = base + k * samples_per_frame;
            for i in 0..samples_per_frame {
                fft_inp[i] += recorded[start + i];
            }
        }
        let spectrum = folded_power_spectrum(&fft_inp);

        for j in 0..bytes_per_tx {
            let lo = argmax16(&spectrum, protocol.freq_start + j * 32);
            let hi = argmax16(&spectrum, protocol.freq_start + j * 32 + 16);
            encoded[itx * bytes_per_tx + j] = (lo as u8) | ((hi as u8) << 4);
        }

        if known_length.is_none() && (itx + 1) * bytes_per_tx > K_DEFAULT_ENCODED_DATA_OFFSET {
            match rs_length.decode(&encoded[..K_DEFAULT_ENCODED_DATA_OFFSET]) {
                Ok(len_payload) => {
                    let length = len_payload[0] as usize;
                    if length == 0 || length > K_MAX_LENGTH_VARIABLE {
                        return None;
                    }
                    let total_bytes_expected =
                        K_DEFAULT_ENCODED_DATA_OFFSET + length + ecc_bytes_for_length(length);
                    let total_frames_expected =
                        div_ceil(total_bytes_expected, bytes_per_tx) * frames_per_tx;
                    let recv_frames = recorded.len() / samples_per_frame;
                    let tolerance = 2 * MARKER_FRAMES;
                    if total_frames_expected > recv_frames + tolerance
                        || total_frames_expected + tolerance < recv_frames
                    {
                        return None;
                    }
                    known_length = Some((length, total_bytes_expected, total_frames_expected));
                }
                Err(_) => return None,
            }
        }

        if let Some((_, total_bytes_expected, _)) = known_length {
            if (itx + 1) * bytes_per_tx > total_bytes_expected + 1 {
                break;
            }
        }

        itx += 1;
    }

    let (length, total_bytes_expected, _) = known_length?;
    let ecc_bytes = ecc_bytes_for_length(length);
    let rs_payload = ReedSolomon::new(length, ecc_bytes / 2);
    let codeword = &encoded[K_DEFAULT_ENCODED_DATA_OFFSET..total_bytes_expected];
    let payload = rs_payload.decode(codeword).ok()?;
    if payload.first().copied().unwrap_or(0) == 0 {
        return None;
    }
    Some(payload)
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parameters;
    use crate::encoder::{run_encode, TxPlan};
    use crate::protocol::default_table;

    fn params() -> Parameters {
        Parameters::default().new().unwrap()
    }

    #[test]
    fn decodes_a_roundtrip_transmission() {
        let table = default_table();
        let payload = b"hi";
        let plan = TxPlan::new(&params(), payload, table[0], 50).unwrap();

        let mut frames = Vec::new();
        run_encode(&plan, 1024, |frame| frames.push(frame.to_vec()));

        let mut decoder = VariableLengthDecoder::new(1024, 3.0, &table);
        let mut result = None;
        for frame in &frames {
            match decoder.on_frame(frame, &table) {
                DecodeEvent::Success(p) => {
                    result = Some(p);
                    break;
                }
                DecodeEvent::Failure => break,
                DecodeEvent::Pending => {}
            }
        }
        assert_eq!(result.as_deref(), Some(&payload[..]));
    }

    #[test]
    fn fresh_decoder_starts_listening() {
        let table = default_table();
        let decoder = VariableLengthDecoder::new(1024, 3.0, &table);
        assert!(!decoder.is_recording());
    }

    #[test]
    fn reset_clears_recording_state() {
        let table = default_table();
        let mut decoder = VariableLengthDecoder::new(1024, 3.0, &table);
        decoder.state = State::Recording;
        decoder.recorded = vec![0.0; 10];
        decoder.reset();
        assert!(!decoder.is_recording());
        assert!(decoder.recorded.is_empty());
    }
}
