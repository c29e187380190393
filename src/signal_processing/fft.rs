//! Real-input forward FFT.
//!
//! Takes `N` real samples (`N` a power of two, `N <= 1024`) and returns `2N`
//! interleaved `(real, imag)` floats, matching the contract the encoder uses
//! to verify tone placement and the receiver uses to obtain per-frame spectra.

use rustfft::{num_complex::Complex32, FftPlanner};

use crate::config::K_DEFAULT_SAMPLES_PER_FRAME;

/// Forward FFT of `N` real samples, returning `2N` interleaved floats.
///
/// Panics if `src.len()` is not a power of two or exceeds
/// `kDefaultSamplesPerFrame`, since that is a programmer error at every call
/// site (frame size is fixed for the lifetime of an `Engine`).
pub fn real_fft(src: &[f32]) -> Vec<f32> {
    let n = src.len();
    assert!(n.is_power_of_two(), "FFT size {n} is not a power of two");
    assert!(
        n <= K_DEFAULT_SAMPLES_PER_FRAME,
        "FFT size {n} exceeds the {K_DEFAULT_SAMPLES_PER_FRAME}-sample frame limit"
    );

    let mut buffer: Vec<Complex32> = src.iter().map(|&x| Complex32::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let mut out = Vec::with_capacity(2 * n);
    for c in buffer {
        out.push(c.re);
        out.push(c.im);
    }
    out
}
