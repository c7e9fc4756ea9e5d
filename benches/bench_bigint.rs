use bigdec::BigInt;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

fn random_odd(bits: u64, rng: &mut StdRng) -> BigInt {
    BigInt::random_bits(bits, rng).set_bit(bits - 1).set_bit(0)
}

fn bench_multiplication(c: &mut Criterion) {
    let mut group = c.benchmark_group("bigint_multiplication");
    let mut rng = StdRng::seed_from_u64(7);
    for bits in [256u64, 1024, 4096] {
        let x = random_odd(bits, &mut rng);
        let y = random_odd(bits, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, _| {
            b.iter(|| black_box(black_box(&x) * black_box(&y)));
        });
    }
    group.finish();
}

fn bench_division(c: &mut Criterion) {
    let mut group = c.benchmark_group("bigint_division");
    let mut rng = StdRng::seed_from_u64(11);
    for bits in [256u64, 1024, 4096] {
        let x = random_odd(2 * bits, &mut rng);
        let y = random_odd(bits, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, _| {
            b.iter(|| black_box(black_box(&x).try_div_rem(black_box(&y)).unwrap()));
        });
    }
    group.finish();
}

fn bench_gcd(c: &mut Criterion) {
    c.bench_function("bigint_gcd_1024", |b| {
        let mut rng = StdRng::seed_from_u64(13);
        let x = random_odd(1024, &mut rng);
        let y = random_odd(1024, &mut rng);
        b.iter(|| black_box(black_box(&x).gcd(black_box(&y))));
    });
}

fn bench_mod_pow(c: &mut Criterion) {
    let mut group = c.benchmark_group("bigint_mod_pow");
    group.sample_size(20);
    let mut rng = StdRng::seed_from_u64(17);
    for bits in [512u64, 1024, 2048] {
        let base = BigInt::random_bits(bits - 1, &mut rng);
        let exp = BigInt::random_bits(bits, &mut rng);
        let odd = random_odd(bits, &mut rng);
        let even = odd.clear_bit(0);
        group.bench_with_input(BenchmarkId::new("odd", bits), &bits, |b, _| {
            b.iter(|| black_box(base.mod_pow(black_box(&exp), black_box(&odd)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("even", bits), &bits, |b, _| {
            b.iter(|| black_box(base.mod_pow(black_box(&exp), black_box(&even)).unwrap()));
        });
    }
    group.finish();
}

fn bench_mod_inverse(c: &mut Criterion) {
    c.bench_function("bigint_mod_inverse_1024", |b| {
        let mut rng = StdRng::seed_from_u64(19);
        let m = random_odd(1024, &mut rng);
        let x = BigInt::random_bits(1000, &mut rng).set_bit(0);
        b.iter(|| black_box(black_box(&x).mod_inverse(black_box(&m))));
    });
}

fn bench_probable_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("bigint_probable_prime");
    group.sample_size(10);
    for bits in [64u64, 256, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            let mut rng = StdRng::seed_from_u64(23);
            b.iter(|| black_box(BigInt::probable_prime(bits, &mut rng).unwrap()));
        });
    }
    group.finish();
}

fn bench_to_string(c: &mut Criterion) {
    c.bench_function("bigint_to_string_4096", |b| {
        let mut rng = StdRng::seed_from_u64(29);
        let x = random_odd(4096, &mut rng);
        b.iter(|| black_box(black_box(&x).to_string()));
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("bigint_parse_1000_digits", |b| {
        let s = "1234567890".repeat(100);
        b.iter(|| black_box(black_box(s.as_str()).parse::<BigInt>().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_multiplication,
    bench_division,
    bench_gcd,
    bench_mod_pow,
    bench_mod_inverse,
    bench_probable_prime,
    bench_to_string,
    bench_parse,
);

criterion_main!(benches);
