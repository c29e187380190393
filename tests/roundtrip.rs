//! End-to-end encode/decode scenarios through the public [`Engine`] facade.

use sonicwave_core::config::{Parameters, SampleFormat};
use sonicwave_core::engine::{Engine, RxData};
use sonicwave_core::protocol::{
    default_table, AUDIBLE_FAST, AUDIBLE_FASTEST, AUDIBLE_NORMAL, DT_FAST, ULTRASOUND_FASTEST,
};

fn drive_roundtrip(engine: &mut Engine, payload: &[u8], protocol_id: usize, volume: i32) -> RxData {
    let table = default_table();
    engine.init(payload, table[protocol_id], volume).unwrap();

    let mut audio: Vec<u8> = Vec::new();
    engine.encode(|bytes| audio.extend_from_slice(bytes)).unwrap();

    feed_audio(engine, &audio);
    engine.take_rx_data()
}

fn feed_audio(engine: &mut Engine, audio: &[u8]) {
    let mut offset = 0usize;
    engine.decode(|buf| {
        let remaining = audio.len() - offset;
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&audio[offset..offset + n]);
        offset += n;
        n
    });
}

#[test]
fn audible_fast_roundtrip_at_48khz_i16() {
    let params = Parameters {
        sample_format_inp: SampleFormat::I16,
        sample_format_out: SampleFormat::I16,
        ..Parameters::default()
    };
    let mut engine = Engine::new(params).unwrap();
    let outcome = drive_roundtrip(&mut engine, b"test", AUDIBLE_FAST, 50);
    assert_eq!(outcome, RxData::Data(b"test".to_vec()));
}

#[test]
fn audible_normal_roundtrip_at_48khz_f32_low_volume() {
    let params = Parameters::default();
    let mut engine = Engine::new(params).unwrap();
    let outcome = drive_roundtrip(&mut engine, b"hello", AUDIBLE_NORMAL, 25);
    assert_eq!(outcome, RxData::Data(b"hello".to_vec()));
}

#[test]
fn ultrasound_fastest_roundtrip() {
    let mut engine = Engine::new(Parameters::default()).unwrap();
    let outcome = drive_roundtrip(&mut engine, b"test", ULTRASOUND_FASTEST, 50);
    assert_eq!(outcome, RxData::Data(b"test".to_vec()));
}

#[test]
fn dual_tone_fast_fixed_length_roundtrip() {
    let payload = b"0123456789abcdef";
    let params = Parameters {
        payload_length: payload.len() as i32,
        ..Parameters::default()
    };
    let mut engine = Engine::new(params).unwrap();
    let outcome = drive_roundtrip(&mut engine, payload, DT_FAST, 50);
    assert_eq!(outcome, RxData::Data(payload.to_vec()));
}

#[test]
fn survives_silence_padding_before_and_after() {
    let params = Parameters {
        sample_format_inp: SampleFormat::I16,
        sample_format_out: SampleFormat::I16,
        ..Parameters::default()
    };
    let mut engine = Engine::new(params).unwrap();

    let table = default_table();
    engine.init(b"abc", table[AUDIBLE_FAST], 50).unwrap();
    let mut audio: Vec<u8> = Vec::new();
    engine.encode(|bytes| audio.extend_from_slice(bytes)).unwrap();

    let silence = vec![0u8; 4800 * SampleFormat::I16.bytes_per_sample()];
    let mut padded = silence.clone();
    padded.extend_from_slice(&audio);
    padded.extend_from_slice(&silence);

    feed_audio(&mut engine, &padded);
    assert_eq!(engine.take_rx_data(), RxData::Data(b"abc".to_vec()));
}

#[test]
fn roundtrip_at_non_base_sample_rate() {
    let params = Parameters {
        sample_rate_inp: 24_000.0,
        sample_rate_out: 24_000.0,
        ..Parameters::default()
    };
    let mut engine = Engine::new(params).unwrap();
    let outcome = drive_roundtrip(&mut engine, b"abc", AUDIBLE_FAST, 50);
    assert_eq!(outcome, RxData::Data(b"abc".to_vec()));
}

#[test]
fn max_variable_length_payload_roundtrips() {
    let payload = vec![0x5Au8; sonicwave_core::config::K_MAX_LENGTH_VARIABLE];
    let mut engine = Engine::new(Parameters::default()).unwrap();
    let outcome = drive_roundtrip(&mut engine, &payload, AUDIBLE_FASTEST, 50);
    assert_eq!(outcome, RxData::Data(payload));
}

#[test]
fn fixed_mode_rejects_payload_length_past_the_fixed_cap() {
    let params = Parameters {
        payload_length: (sonicwave_core::config::K_MAX_LENGTH_FIXED + 1) as i32,
        ..Parameters::default()
    };
    assert!(params.new().is_err());
}

#[test]
fn encode_rejects_volume_below_zero_and_above_hundred() {
    let mut engine = Engine::new(Parameters::default()).unwrap();
    let table = default_table();
    assert!(engine.init(b"hi", table[AUDIBLE_FAST], -1).is_err());
    assert!(engine.init(b"hi", table[AUDIBLE_FAST], 101).is_err());
}

#[test]
fn encode_accepts_volume_at_zero_and_a_hundred() {
    let mut engine = Engine::new(Parameters::default()).unwrap();
    let table = default_table();
    assert!(engine.init(b"hi", table[AUDIBLE_FAST], 0).is_ok());
    assert!(engine.init(b"hi", table[AUDIBLE_FAST], 100).is_ok());
}

#[test]
fn encode_size_samples_matches_samples_actually_produced() {
    let mut engine = Engine::new(Parameters::default()).unwrap();
    let table = default_table();
    engine.init(b"predict me", table[AUDIBLE_FAST], 50).unwrap();
    let predicted = engine.encode_size_bytes();

    let mut produced = 0usize;
    engine.encode(|bytes| produced += bytes.len()).unwrap();
    assert_eq!(predicted, produced);
}
