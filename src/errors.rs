//! Modem error types, split by concern and composed into one top-level error.

use thiserror::Error;

/// Top-level error type for all modem operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("reed-solomon error: {0}")]
    Rs(#[from] RsError),
}

/// Raised from `Parameters` validation / `Engine::new`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be in [{min}, {max}])")]
    InvalidSampleRate { rate: f64, min: f64, max: f64 },

    #[error("unsupported sample format")]
    UnsupportedSampleFormat,

    #[error("payload length {len} out of range (must be -1 or in 1..={max})")]
    PayloadLengthOutOfRange { len: i32, max: usize },

    #[error("invalid samplesPerFrame {frames} (must be > 0 and <= {max})")]
    InvalidSamplesPerFrame { frames: usize, max: usize },

    #[error("operating-mode bitmask has no Tx or Rx bit set")]
    EmptyOperatingMode,
}

/// Raised from `Engine::init` / `Engine::encode`.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("volume {volume} out of range (must be 0..=100)")]
    InvalidVolume { volume: i32 },

    #[error("payload length {len} out of range (must be 0..={max})")]
    InvalidLength { len: i32, max: usize },

    #[error("protocol {protocol_id} requires fixed-length mode")]
    FixedLengthRequired { protocol_id: usize },

    #[error("resampler failed to produce the requested number of output samples")]
    ResamplerOverflow,

    #[error("output callback refused queued audio")]
    CallbackRefused,
}

/// Non-fatal conditions surfaced from `decode`; "no message yet" is modeled as
/// `Ok(None)` at the call site, not as one of these.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input callback returned {got} bytes, not a multiple of the sample size {sample_size}")]
    CaptureInconsistent { got: usize, sample_size: usize },

    #[error("reed-solomon could not correct the received bytes")]
    Uncorrectable,
}

/// Internal Reed-Solomon failure; call sites downgrade this to "no candidate".
#[derive(Debug, Error)]
pub enum RsError {
    #[error("codeword has {len} bytes, expected {expected}")]
    WrongLength { len: usize, expected: usize },

    #[error("syndromes nonzero after correction attempt: uncorrectable")]
    Uncorrectable,

    #[error("error locator degree {degree} exceeds correction capacity {t}")]
    TooManyErrors { degree: usize, t: usize },
}

/// Result type alias for modem operations.
pub type Result<T> = std::result::Result<T, ModemError>;
