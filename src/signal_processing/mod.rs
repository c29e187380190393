//! Spectral and waveform primitives shared by the encoder and receiver.
//!
//! - [`fft`]: real-input FFT via `rustfft`.
//! - [`spectrum`]: power spectrum with mirror-folding and frame averaging.
//! - [`tone`]: reference sine tables and the raised-cosine envelope used to
//!   excite them.
//! - [`resampler`]: windowed-sinc resampling between the engine's base rate
//!   and caller-supplied input/output rates.

pub mod fft;
pub mod resampler;
pub mod spectrum;
pub mod tone;

pub use fft::real_fft;
pub use resampler::Resampler;
pub use spectrum::{average_frames, folded_power_spectrum};
pub use tone::{add_amplitude_smooth, ToneTable};
