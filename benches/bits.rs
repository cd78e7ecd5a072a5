use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;
use swf_bitstream::prelude::*;

pub const FIELDS: usize = 1_000_000;

/// Return pairs (value, width) with widths typical of shape records.
pub fn gen_fields(n: usize) -> Vec<(u32, usize)> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..n)
        .map(|_| {
            let n_bits = rng.random_range(1..=20);
            (rng.random::<u32>() & low_mask(n_bits), n_bits)
        })
        .collect()
}

fn bench_bits_endianness<E: Endianness>(c: &mut Criterion) {
    let fields = gen_fields(FIELDS);
    let mut data = vec![];

    c.bench_function(&format!("bits ({}-endian, write)", E::NAME), |b| {
        b.iter(|| {
            let mut w = <BufBitWriter<E, _>>::new(Vec::with_capacity(4 * FIELDS));
            for &(value, n_bits) in &fields {
                black_box(w.write_bits(value, n_bits).unwrap());
            }
            data = w.finish().unwrap();
        })
    });

    c.bench_function(&format!("bits ({}-endian, read)", E::NAME), |b| {
        b.iter(|| {
            let mut r = <BufBitReader<E, _>>::new(&data[..]);
            for &(_, n_bits) in &fields {
                black_box(r.read_bits(n_bits).unwrap());
            }
        })
    });

    c.bench_function(&format!("signed bits ({}-endian, read)", E::NAME), |b| {
        b.iter(|| {
            let mut r = <BufBitReader<E, _>>::new(&data[..]);
            for &(_, n_bits) in &fields {
                black_box(r.read_signed_bits(n_bits).unwrap());
            }
        })
    });
}

fn bench_tags(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let lengths: Vec<u32> = (0..100_000).map(|_| rng.random_range(0..100)).collect();
    let body = [0_u8; 100];
    let mut w = <BufBitWriter<LE, _>>::new(Vec::new());
    for &length in &lengths {
        encode_tag(&mut w, TagHeader::new(1, length), |w| {
            w.write_bytes(&body[..length as usize])
        })
        .unwrap();
    }
    let data = w.finish().unwrap();

    c.bench_function("tags (peek and skip)", |b| {
        b.iter(|| {
            let mut r = <BufBitReader<LE, _>>::new(&data[..]);
            for _ in &lengths {
                let header = TagHeader::peek(&mut r).unwrap();
                r.skip_bytes(black_box(header.total_len())).unwrap();
            }
        })
    });
}

fn benchmark(c: &mut Criterion) {
    bench_bits_endianness::<LE>(c);
    bench_bits_endianness::<BE>(c);
    bench_tags(c);
}

criterion_group! {
    name = bits_benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3));
    targets = benchmark
}
criterion_main!(bits_benches);
