//! Test-only channel noise helper.
//!
//! Not part of the public API: the modem's acoustic robustness comes from the
//! detector's threshold logic (§4.6/§4.7), not from a simulated propagation
//! model. Built behind the `test-util` feature (enabled for this crate's own
//! test runs via the self dev-dependency in Cargo.toml) rather than a plain
//! `#[cfg(test)]`, so that `tests/` integration binaries — which link the
//! compiled library rather than sharing its unit-test build — can reach
//! [`apply_audio_noise`] too, in addition to this module's own unit tests.

#![cfg(any(test, feature = "test-util"))]

use rand::Rng;
use rand_distr::StandardNormal;

/// Adds Gaussian noise with standard deviation `noise_std` to each sample.
pub fn apply_audio_noise<R: Rng>(audio: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    audio
        .iter()
        .map(|&sample| {
            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            sample + noise as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deterministic_with_seed() {
        let audio = vec![0.1, 0.2, 0.3];
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let noisy1 = apply_audio_noise(&audio, 0.01, &mut rng1);
        let noisy2 = apply_audio_noise(&audio, 0.01, &mut rng2);

        assert_eq!(noisy1, noisy2);
    }

    #[test]
    fn zero_std_preserves_signal() {
        let audio = vec![0.3, -0.2];
        let mut rng = StdRng::seed_from_u64(1);
        let noisy = apply_audio_noise(&audio, 0.0, &mut rng);
        assert_eq!(noisy, audio);
    }
}
