//! Tone synthesizer: per-bit reference frames and the raised-cosine envelope
//! used to sum them into one output frame.

use crate::protocol::Protocol;

/// Precomputed `bit1[k]`/`bit0[k]` reference sine frames for every data bit
/// index `k` of a protocol, each one frame (`samplesPerFrame` samples) long.
pub struct ToneTable {
    pub bit1: Vec<Vec<f32>>,
    pub bit0: Vec<Vec<f32>>,
}

impl ToneTable {
    /// Builds reference frames for `n_data_bits` bit indices of `protocol` at
    /// the given frame size and base-rate bin width.
    ///
    /// `bit1[k]` sits at `freqStart·hzPerSample + k·freqDelta_hz`; `bit0[k]`
    /// sits one `hzPerSample` bin above it. Each carries a phase offset of
    /// `pi*k/nDataBitsPerTx` so adjacent bit tones don't phase-align.
    pub fn build(protocol: &Protocol, samples_per_frame: usize, hz_per_sample: f64) -> Self {
        // Reference frames are indexed by bin-pair offset: bit1[k] sits at
        // freqStart + 2k, bit0[k] at freqStart + 2k + 1, together covering
        // every bin across all `2*bytesPerTx` nibble groups of 16 bins each.
        let n_data_bits = protocol.bytes_per_tx * 16;
        let n_data_bits_per_tx = protocol.data_bits_per_tx() as f64;
        let mut bit1 = Vec::with_capacity(n_data_bits);
        let mut bit0 = Vec::with_capacity(n_data_bits);

        let i_samples_per_frame = 1.0 / samples_per_frame as f64;

        for k in 0..n_data_bits {
            let freq = protocol.freq_start as f64 * hz_per_sample + k as f64 * 2.0 * hz_per_sample;
            let phase_offset = std::f64::consts::PI * k as f64 / n_data_bits_per_tx;
            let i_hz_per_sample = 1.0 / hz_per_sample;

            let mut frame1 = Vec::with_capacity(samples_per_frame);
            let mut frame0 = Vec::with_capacity(samples_per_frame);
            for i in 0..samples_per_frame {
                let phase1 = std::f64::consts::TAU
                    * (i as f64 * i_samples_per_frame)
                    * (freq * i_hz_per_sample)
                    + phase_offset;
                frame1.push(phase1.sin() as f32);

                let phase0 = std::f64::consts::TAU
                    * (i as f64 * i_samples_per_frame)
                    * ((freq + hz_per_sample) * i_hz_per_sample)
                    + phase_offset;
                frame0.push(phase0.sin() as f32);
            }
            bit1.push(frame1);
            bit0.push(frame0);
        }

        Self { bit1, bit0 }
    }
}

/// Adds `scalar * src[i]` into `dst[i]` for `i` in `0..final_id`, ramping
/// linearly over the first and last 15% of the symbol's total duration
/// (`n_per_cycle * final_id` samples) to suppress spectral splatter between
/// symbols. `cycle_mod` is this frame's position within the symbol
/// (`0..n_per_cycle`).
pub fn add_amplitude_smooth(
    src: &[f32],
    dst: &mut [f32],
    scalar: f32,
    cycle_mod: usize,
    n_per_cycle: usize,
    final_id: usize,
) {
    let n_total = (n_per_cycle * final_id) as f32;
    let frac = 0.15f32;
    let ds = frac * n_total;
    let ids = if ds > 0.0 { 1.0 / ds } else { 0.0 };
    let n_begin = frac * n_total;
    let n_end = (1.0 - frac) * n_total;

    for i in 0..final_id {
        let k = (cycle_mod * final_id + i) as f32;
        let weight = if k < n_begin {
            k * ids
        } else if k > n_end {
            (n_total - k) * ids
        } else {
            1.0
        };
        dst[i] += scalar * src[i] * weight;
    }
}
