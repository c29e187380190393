//! Fixed-length decoder: no markers, just a continuous stream of symbols at
//! a pre-agreed payload length. Every incoming frame's power spectrum is
//! pushed into a circular history sized for the worst case across the whole
//! protocol table, and each enabled protocol is re-tried against that
//! history on every frame via majority vote across `framesPerTx` repeats.

use super::{argmax16_last_wins, majority_bin};
use crate::protocol::Protocol;
use crate::reed_solomon::{ecc_bytes_for_length, ReedSolomon};
use crate::signal_processing::folded_power_spectrum;

/// Fraction of nibble-group votes that must reach majority for a candidate
/// protocol to be considered detected at all, guarding against spending a
/// full Reed-Solomon decode on pure noise.
const DETECTION_RATE_GATE: f32 = 0.75;

pub struct FixedLengthDecoder {
    payload_length: usize,
    history: Vec<Vec<f32>>,
    write_pos: usize,
    filled: usize,
}

impl FixedLengthDecoder {
    /// `all_protocols` is the *entire* protocol table (not just the
    /// currently enabled subset) — the history buffer is sized for the
    /// worst case across every entry so that toggling a protocol on later
    /// never requires a reallocation.
    pub fn new(payload_length: usize, all_protocols: &[Protocol]) -> Self {
        let min_bytes_per_tx = all_protocols
            .iter()
            .map(|p| p.bytes_per_tx)
            .min()
            .unwrap_or(1);
        let max_frames_per_tx = all_protocols
            .iter()
            .map(|p| p.frames_per_tx)
            .max()
            .unwrap_or(1);

        let total_length = payload_length + ecc_bytes_for_length(payload_length);
        let total_txs = div_ceil(total_length, min_bytes_per_tx);
        let capacity = (total_txs * max_frames_per_tx).max(1);

        Self {
            payload_length,
            history: vec![vec![0.0; 0]; capacity],
            write_pos: 0,
            filled: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.history.len()
    }

    /// Feeds one base-rate frame of amplitude samples. Returns `Some(payload)`
    /// once the circular history yields a Reed-Solomon-verified decode for
    /// any enabled protocol.
    pub fn on_frame(&mut self, amplitude: &[f32], protocols: &[Protocol]) -> Option<Vec<u8>> {
        let spectrum = folded_power_spectrum(amplitude);
        let cap = self.capacity();
        self.history[self.write_pos] = spectrum;
        self.write_pos = (self.write_pos + 1) % cap;
        self.filled = (self.filled + 1).min(cap);

        if self.filled < cap {
            return None;
        }

        for protocol in protocols.iter().filter(|p| p.enabled) {
            if let Some(payload) = self.decode_with(protocol) {
                return Some(payload);
            }
        }
        None
    }

    fn decode_with(&self, protocol: &Protocol) -> Option<Vec<u8>> {
        let total_length = self.payload_length + ecc_bytes_for_length(self.payload_length);
        let total_txs = div_ceil(total_length, protocol.bytes_per_tx);
        let needed_frames = total_txs * protocol.frames_per_tx;
        let cap = self.capacity();
        if needed_frames > cap {
            return None;
        }

        let start = (self.write_pos + cap - needed_frames) % cap;

        let mut detected_bins = vec![0usize; 2 * total_length];
        let mut tx_needed = 0usize;
        let mut tx_detected = 0usize;

        for k in 0..total_txs {
            let mut tallies = vec![[0u32; 16]; 2 * protocol.bytes_per_tx];
            for i in 0..protocol.frames_per_tx {
                let idx = (start + k * protocol.frames_per_tx + i) % cap;
                let spectrum = &self.history[idx];
                for j in 0..protocol.bytes_per_tx {
                    let lo = argmax16_last_wins(spectrum, protocol.freq_start + j * 32);
                    let hi = argmax16_last_wins(spectrum, protocol.freq_start + j * 32 + 16);
                    tallies[2 * j][lo] += 1;
                    tallies[2 * j + 1][hi] += 1;
                }
            }

            for j in 0..protocol.bytes_per_tx {
                let byte_index = k * protocol.bytes_per_tx + j;
                if byte_index >= total_length {
                    break;
                }
                tx_needed += 2;
                if let Some(bin) = majority_bin(&tallies[2 * j], protocol.frames_per_tx) {
                    detected_bins[2 * byte_index] = bin;
                    tx_detected += 1;
                }
                if let Some(bin) = majority_bin(&tallies[2 * j + 1], protocol.frames_per_tx) {
                    detected_bins[2 * byte_index + 1] = bin;
                    tx_detected += 1;
                }
            }
        }

        if tx_needed == 0 || (tx_detected as f32) < DETECTION_RATE_GATE * tx_needed as f32 {
            return None;
        }

        let bytes: Vec<u8> = (0..total_length)
            .map(|idx| (detected_bins[2 * idx] as u8) | ((detected_bins[2 * idx + 1] as u8) << 4))
            .collect();

        let ecc_bytes = ecc_bytes_for_length(self.payload_length);
        let rs = ReedSolomon::new(self.payload_length, ecc_bytes / 2);
        let payload = rs.decode(&bytes).ok()?;
        if payload.first().copied().unwrap_or(0) == 0 {
            return None;
        }
        Some(payload)
    }
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}
