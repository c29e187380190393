//! The modem's transmit protocol table.
//!
//! Each `Protocol` names a `freqStart` bin, a frame duration per symbol, a
//! byte payload per symbol, and a tone multiplicity. The table is static;
//! receivers may toggle `enabled` per protocol at runtime through the engine
//! facade (see [`crate::engine`]), never by mutating a table entry directly.

use serde::{Deserialize, Serialize};

/// Tone multiplicity: how many simultaneous tones a symbol excites per nibble
/// group. `Normal` is the ordinary 1-of-16 tone selection; `DualTone` excites
/// two bin groups per nibble for extra redundancy; `MonoTone` is reserved for
/// single-tone custom protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneMultiplicity {
    Normal = 1,
    DualTone = 2,
    MonoTone = 3,
}

/// One entry in the transmit protocol table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Protocol {
    pub id: usize,
    pub name: &'static str,
    pub freq_start: usize,
    pub frames_per_tx: usize,
    pub bytes_per_tx: usize,
    pub extra: ToneMultiplicity,
    pub enabled: bool,
}

impl Protocol {
    /// Whether this protocol requires fixed-length mode (dual-tone family).
    pub fn requires_fixed_length(&self) -> bool {
        matches!(self.extra, ToneMultiplicity::DualTone)
    }

    /// Number of data bits carried by one symbol of this protocol.
    pub fn data_bits_per_tx(&self) -> usize {
        8 * self.bytes_per_tx
    }

    /// Number of 4-bit nibble positions per symbol.
    pub fn nibbles_per_tx(&self) -> usize {
        2 * self.bytes_per_tx
    }
}

pub const FREQ_START_AUDIBLE: usize = 40;
pub const FREQ_START_ULTRASOUND: usize = 320;
pub const FREQ_START_DUAL_TONE: usize = 24;

/// Protocol IDs, stable across versions (see external interfaces).
pub const AUDIBLE_NORMAL: usize = 0;
pub const AUDIBLE_FAST: usize = 1;
pub const AUDIBLE_FASTEST: usize = 2;
pub const ULTRASOUND_NORMAL: usize = 3;
pub const ULTRASOUND_FAST: usize = 4;
pub const ULTRASOUND_FASTEST: usize = 5;
pub const DT_NORMAL: usize = 6;
pub const DT_FAST: usize = 7;
pub const DT_FASTEST: usize = 8;
pub const CUSTOM_BASE: usize = 9;
pub const NUM_PROTOCOLS: usize = 19;

/// Builds the default protocol table: audible, ultrasound and dual-tone
/// variants of Normal/Fast/Fastest, followed by ten disabled custom slots
/// reserved for caller-defined `freqStart` overrides.
pub fn default_table() -> Vec<Protocol> {
    let mut table = Vec::with_capacity(NUM_PROTOCOLS);

    let families: [(usize, &str); 3] = [
        (FREQ_START_AUDIBLE, "audible"),
        (FREQ_START_ULTRASOUND, "ultrasound"),
        (FREQ_START_DUAL_TONE, "dual-tone"),
    ];
    // (name suffix, frames_per_tx, bytes_per_tx) — framesPerTx shrinks from
    // Normal to Fastest while bytesPerTx stays fixed at 3, matching the
    // reference protocol table.
    let speeds: [(&str, usize, usize); 3] = [
        ("normal", 9, 3),
        ("fast", 6, 3),
        ("fastest", 3, 3),
    ];

    for (freq_start, family_name) in families {
        let extra = if family_name == "dual-tone" {
            ToneMultiplicity::DualTone
        } else {
            ToneMultiplicity::Normal
        };
        for (speed_name, frames_per_tx, bytes_per_tx) in speeds {
            table.push(Protocol {
                id: table.len(),
                name: leak_name(family_name, speed_name),
                freq_start,
                frames_per_tx,
                bytes_per_tx,
                extra,
                enabled: true,
            });
        }
    }

    for i in 0..10 {
        table.push(Protocol {
            id: table.len(),
            name: leak_name("custom", Box::leak(i.to_string().into_boxed_str())),
            freq_start: FREQ_START_AUDIBLE,
            frames_per_tx: 9,
            bytes_per_tx: 3,
            extra: ToneMultiplicity::Normal,
            enabled: false,
        });
    }

    table
}

/// Interns a `"family-speed"` name as a `&'static str` for the const-shaped
/// `Protocol::name` field. The table is built once per engine; this is not a
/// hot path.
fn leak_name(family: &str, speed: &str) -> &'static str {
    Box::leak(format!("{family}-{speed}").into_boxed_str())
}
