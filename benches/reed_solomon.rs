use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sonicwave_core::reed_solomon::{ecc_bytes_for_length, ReedSolomon};

fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

fn benchmark_encode_by_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs_encode_by_payload_len");
    for &len in [4usize, 16, 64, 140].iter() {
        let payload = random_payload(len, 1);
        let rs = ReedSolomon::new(len, ecc_bytes_for_length(len) / 2);
        group.bench_with_input(BenchmarkId::from_parameter(len), &payload, |b, payload| {
            b.iter(|| rs.encode(black_box(payload)))
        });
    }
    group.finish();
}

fn benchmark_decode_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs_decode_no_errors");
    for &len in [4usize, 16, 64, 140].iter() {
        let payload = random_payload(len, 2);
        let rs = ReedSolomon::new(len, ecc_bytes_for_length(len) / 2);
        let codeword = rs.encode(&payload);
        group.bench_with_input(BenchmarkId::from_parameter(len), &codeword, |b, codeword| {
            b.iter(|| rs.decode(black_box(codeword)))
        });
    }
    group.finish();
}

fn benchmark_decode_with_errors(c: &mut Criterion) {
    let len = 64;
    let t = ecc_bytes_for_length(len) / 2;
    let rs = ReedSolomon::new(len, t);
    let payload = random_payload(len, 3);
    let mut codeword = rs.encode(&payload);
    for i in (0..codeword.len()).step_by(7).take(t) {
        codeword[i] ^= 0xFF;
    }

    c.bench_function("rs_decode_near_capacity_errors", |b| {
        b.iter(|| rs.decode(black_box(&codeword)))
    });
}

criterion_group!(
    benches,
    benchmark_encode_by_length,
    benchmark_decode_clean,
    benchmark_decode_with_errors
);
criterion_main!(benches);
