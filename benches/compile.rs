use cipher_keygen::{
    aes::{AesCircuit, KeySize},
    chacha::ChaChaCircuit,
    compiler::Compiler,
    scalar::Field,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_chacha(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Compile: ChaCha20");
    group.sample_size(10);

    for blocks in 1..=4 {
        let circuit = ChaChaCircuit::with_blocks(blocks);
        let id = BenchmarkId::new("Number of blocks", blocks);
        group.bench_with_input(id, &circuit, |b, circuit| {
            b.iter(|| Compiler::compile(Field::Ristretto255, black_box(circuit)).unwrap())
        });
    }

    group.finish();
}

fn bench_aes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Compile: AES");
    group.sample_size(10);

    for key_size in [KeySize::Aes128, KeySize::Aes256] {
        let circuit = AesCircuit::new(key_size);
        let id = BenchmarkId::new("Key size", key_size.name());
        group.bench_with_input(id, &circuit, |b, circuit| {
            b.iter(|| Compiler::compile(Field::Ristretto255, black_box(circuit)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chacha, bench_aes);
criterion_main!(benches);
