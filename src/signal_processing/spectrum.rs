//! Power spectrum computation with mirror-fold, shared by the encoder's
//! self-verification path and the receiver's per-frame analysis.

use super::fft::real_fft;

/// Computes the folded power spectrum of one frame of amplitude samples.
///
/// `amplitude.len()` must be a power of two (`samplesPerFrame`). Returns a
/// vector the same length as the input; only the first `len/2` entries carry
/// independent information after folding (`spectrum[i] += spectrum[N-i]` for
/// `i` in `1..N/2`), matching the reference fold.
pub fn folded_power_spectrum(amplitude: &[f32]) -> Vec<f32> {
    let n = amplitude.len();
    let fft_out = real_fft(amplitude);

    let mut spectrum = vec![0.0_f32; n];
    for i in 0..n {
        let re = fft_out[2 * i];
        let im = fft_out[2 * i + 1];
        spectrum[i] = re * re + im * im;
    }
    for i in 1..n / 2 {
        spectrum[i] += spectrum[n - i];
    }
    spectrum
}

/// Averages `history` frames of equal length elementwise.
///
/// Grounded in the variable-length decoder's `kMaxSpectrumHistory`-frame
/// amplitude average (§4.6), computed before the FFT rather than after.
pub fn average_frames(history: &[Vec<f32>]) -> Vec<f32> {
    assert!(!history.is_empty(), "history must be non-empty");
    let n = history[0].len();
    let mut avg = vec![0.0_f32; n];
    for frame in history {
        debug_assert_eq!(frame.len(), n);
        for (a, &s) in avg.iter_mut().zip(frame.iter()) {
            *a += s;
        }
    }
    let norm = 1.0 / history.len() as f32;
    for a in avg.iter_mut() {
        *a *= norm;
    }
    avg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn pure_tone_folds_into_single_bin() {
        let n = 256;
        let k = 10;
        let amplitude: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * k as f32 * i as f32 / n as f32).cos())
            .collect();
        let spectrum = folded_power_spectrum(&amplitude);
        let total: f32 = spectrum[..n / 2].iter().sum();
        assert!(spectrum[k] / total > 0.99);
    }

    #[test]
    fn average_frames_matches_manual_mean() {
        let history = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let avg = average_frames(&history);
        assert_eq!(avg, vec![2.0, 3.0]);
    }

    #[test]
    fn silent_frame_has_no_energy() {
        let spectrum = folded_power_spectrum(&vec![0.0_f32; 64]);
        assert!(spectrum.iter().all(|&p| p < 1e-9));
    }
}
