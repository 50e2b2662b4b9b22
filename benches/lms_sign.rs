use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lms::{LmsAlgorithmType, LmotsAlgorithmType, LmsPrivateKey};
use rand::rngs::OsRng;
use rand::RngCore;

fn sign_benchmarks(c: &mut Criterion) {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let sk = LmsPrivateKey::generate(
        LmsAlgorithmType::Sha256M32H10,
        LmotsAlgorithmType::Sha256N32W8,
        &mut OsRng,
        &seed,
    )
    .unwrap();

    let mut message = [0u8; 64];
    OsRng.fill_bytes(&mut message);

    let mut group = c.benchmark_group("LMS sign");
    group.bench_function(
        BenchmarkId::new("sign", "SHA256_M32_H10/SHA256_N32_W8"),
        |b| {
            // Each iteration consumes a leaf, so sign a fresh clone to
            // keep the key from exhausting mid-benchmark.
            b.iter_batched(
                || (sk.clone(), vec![0u8; sk.signature_len()]),
                |(mut sk, mut signature)| {
                    black_box(sk.sign(&mut OsRng, &message, &mut signature).unwrap());
                },
                BatchSize::LargeInput,
            );
        },
    );

    group.finish();
}

criterion_group!(benches, sign_benchmarks);
criterion_main!(benches);
