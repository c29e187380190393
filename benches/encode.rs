use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sonicwave_core::config::Parameters;
use sonicwave_core::encoder::{run_encode, TxPlan};
use sonicwave_core::protocol::default_table;

fn params() -> Parameters {
    Parameters::default().new().unwrap()
}

fn benchmark_plan_construction(c: &mut Criterion) {
    let table = default_table();
    let payload = b"benchmark payload for timing the encoder's Reed-Solomon and tone setup";

    c.bench_function("tx_plan_new", |b| {
        b.iter(|| TxPlan::new(&params(), black_box(payload), black_box(table[0]), black_box(50)))
    });
}

fn benchmark_synthesize_frame(c: &mut Criterion) {
    let table = default_table();
    let plan = TxPlan::new(&params(), b"hello, world", table[0], 50).unwrap();
    let mut frame = vec![0.0f32; 1024];

    c.bench_function("synthesize_single_frame", |b| {
        b.iter(|| plan.synthesize_frame(black_box(0), black_box(&mut frame)))
    });
}

fn benchmark_run_encode(c: &mut Criterion) {
    let table = default_table();

    let mut group = c.benchmark_group("run_encode_by_payload_len");
    for &len in [4usize, 16, 64, 140].iter() {
        let payload = vec![0x42u8; len];
        let plan = TxPlan::new(&params(), &payload, table[0], 50).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &plan, |b, plan| {
            b.iter(|| run_encode(black_box(plan), 1024, |_frame| {}))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_plan_construction,
    benchmark_synthesize_frame,
    benchmark_run_encode
);
criterion_main!(benches);
