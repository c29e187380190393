//! sonicwave-core: a data-over-sound modem engine.
//!
//! Encodes a byte payload into an audible or ultrasonic waveform and decodes
//! it back, using frequency-shift-keyed tones bracketed by start/end markers
//! (variable-length mode) or sent at a fixed cadence with majority-vote
//! symbol recovery (fixed-length mode). Reed-Solomon coding protects both the
//! length header and the payload.
//!
//! The top-level entry point is [`engine::Engine`]; most callers only need
//! [`Engine::encode`] and [`Engine::decode`] plus the [`config::Parameters`]
//! used to build one.

#[cfg(any(test, feature = "test-util"))]
pub mod channel;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod protocol;
pub mod receiver;
pub mod reed_solomon;
pub mod signal_processing;
pub mod utils;

pub use config::{OperatingMode, Parameters, SampleFormat};
pub use engine::Engine;
pub use errors::{ModemError, Result};
pub use protocol::{default_table, Protocol};
