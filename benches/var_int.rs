use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use swf_bitstream::prelude::*;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    // mostly small values, as in action records
    let values: Vec<u32> = (0..1_000_000)
        .map(|_| rng.random::<u32>() >> rng.random_range(0..32_u32))
        .collect();

    c.bench_function("write_var_u32", |b| {
        b.iter(|| {
            let mut w = <BufBitWriter<LE, _>>::new(Vec::with_capacity(5 * values.len()));
            for &value in &values {
                black_box(w.write_var_u32(value).unwrap());
            }
            w.finish().unwrap()
        })
    });

    let mut w = <BufBitWriter<LE, _>>::new(Vec::new());
    for &value in &values {
        w.write_var_u32(value).unwrap();
    }
    let data = w.finish().unwrap();

    c.bench_function("read_var_u32", |b| {
        b.iter(|| {
            let mut r = <BufBitReader<LE, _>>::new(&data[..]);
            for _ in &values {
                black_box(r.read_var_u32().unwrap());
            }
        })
    });

    c.bench_function("len_var_u32", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&value| len_var_u32(black_box(value)))
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
