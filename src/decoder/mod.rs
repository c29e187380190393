//! Spectral demodulation: turning per-frame power spectra back into bytes.
//!
//! [`variable`] implements the marker-bracketed, brute-force-offset decoder
//! used when a transmission's length isn't known ahead of time.
//! [`fixed`] implements the majority-vote decoder used when both sides agree
//! on an exact payload length beforehand, trading the markers for redundancy
//! across a whole circular history of frames.

pub mod fixed;
pub mod variable;

pub use fixed::FixedLengthDecoder;
pub use variable::{DecodeEvent, VariableLengthDecoder};

use crate::protocol::Protocol;

/// Returns the index (`0..16`) of the strongest bin in the 16-bin nibble
/// group starting at `bin_start`, first-max-wins on a tie.
///
/// Used by the variable-length analyzer, matching `GGWave::analyzeRecordedData`
/// (`if (m_sampleSpectrum[bin+k] > amax)`, a strict `>` that keeps the first
/// bin reached).
pub(crate) fn argmax16(spectrum: &[f32], bin_start: usize) -> usize {
    let mut best = 0usize;
    let mut best_val = spectrum[bin_start];
    for k in 1..16 {
        let v = spectrum[bin_start + k];
        if v > best_val {
            best_val = v;
            best = k;
        }
    }
    best
}

/// Returns the index (`0..16`) of the strongest bin in the 16-bin nibble
/// group starting at `bin_start`, last-max-wins on a tie.
///
/// Used by the fixed-length decoder's per-frame nibble tally, matching
/// `GGWave::decode`'s fixed-length branch (`if (f0max <= v)` / `if (f1max <=
/// v)`, a `<=` that keeps overwriting through ties). Deliberately a separate
/// function from [`argmax16`] rather than a shared helper: the two decode
/// paths use different tie-break conventions in the reference, and a tie
/// within a 16-bin group would otherwise pick a different winning bin than
/// the reference decoder.
pub(crate) fn argmax16_last_wins(spectrum: &[f32], bin_start: usize) -> usize {
    let mut best = 0usize;
    let mut best_val = spectrum[bin_start];
    for k in 1..16 {
        let v = spectrum[bin_start + k];
        if v >= best_val {
            best_val = v;
            best = k;
        }
    }
    best
}

/// Checks whether a 16-bit start/end marker pattern is present in `spectrum`
/// at `protocol`'s `freqStart`.
///
/// Even-indexed bits carry a `1` (bin louder than its upper neighbor by
/// `threshold`) and odd-indexed bits carry a `0` (bin quieter than its upper
/// neighbor by `threshold`) for the start marker; `inverted` swaps that
/// convention for the end marker.
pub(crate) fn marker_bits_present(
    spectrum: &[f32],
    protocol: &Protocol,
    threshold: f32,
    inverted: bool,
) -> bool {
    for i in 0..16 {
        let bin = protocol.freq_start + 2 * i;
        if bin + 1 >= spectrum.len() {
            return false;
        }
        let even_is_one = (i % 2 == 0) != inverted;
        let detected = if even_is_one {
            spectrum[bin] >= threshold * spectrum[bin + 1]
        } else {
            spectrum[bin] <= threshold * spectrum[bin + 1]
        };
        if !detected {
            return false;
        }
    }
    true
}

/// Elects the majority bin across `counts`, or `None` if no bin was chosen
/// by more than half of `votes_cast` voters.
pub(crate) fn majority_bin(counts: &[u32; 16], votes_cast: usize) -> Option<usize> {
    let (bin, &count) = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .map(|(i, c)| (i, c))
        .unwrap();
    if (count as usize) > votes_cast / 2 {
        Some(bin)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_loudest_bin() {
        let mut spectrum = vec![0.0f32; 32];
        spectrum[5] = 10.0;
        assert_eq!(argmax16(&spectrum, 0), 5);
    }

    #[test]
    fn argmax16_breaks_ties_by_keeping_the_first_bin() {
        let mut spectrum = vec![0.0f32; 16];
        spectrum[3] = 10.0;
        spectrum[7] = 10.0;
        assert_eq!(argmax16(&spectrum, 0), 3);
    }

    #[test]
    fn argmax16_last_wins_breaks_ties_by_keeping_the_last_bin() {
        let mut spectrum = vec![0.0f32; 16];
        spectrum[3] = 10.0;
        spectrum[7] = 10.0;
        assert_eq!(argmax16_last_wins(&spectrum, 0), 7);
    }

    #[test]
    fn majority_requires_strict_half() {
        let mut counts = [0u32; 16];
        counts[3] = 5;
        assert_eq!(majority_bin(&counts, 9), Some(3)); // 5 > 9/2 == 4
        counts[3] = 4;
        assert_eq!(majority_bin(&counts, 9), None); // 4 is not > 4
    }
}
