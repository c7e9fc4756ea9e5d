use bigdec::{Decimal, MathContext, RoundingMode};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::str::FromStr;

fn bench_addition(c: &mut Criterion) {
    c.bench_function("decimal_addition", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("987.654321").unwrap();
        b.iter(|| black_box(black_box(&x) + black_box(&y)));
    });
}

fn bench_addition_mixed_scale(c: &mut Criterion) {
    c.bench_function("decimal_addition_mixed_scale", |b| {
        let x = Decimal::from_str("123.4").unwrap();
        let y = Decimal::from_str("0.000000987654321").unwrap();
        b.iter(|| black_box(black_box(&x) + black_box(&y)));
    });
}

fn bench_addition_ctx_far_operands(c: &mut Criterion) {
    c.bench_function("decimal_addition_ctx_far_operands", |b| {
        let x = Decimal::from_str("1E+100000").unwrap();
        let y = Decimal::from_str("1E-100000").unwrap();
        let mc = MathContext::DECIMAL64;
        b.iter(|| black_box(black_box(&x).try_add_ctx(black_box(&y), &mc).unwrap()));
    });
}

fn bench_multiplication(c: &mut Criterion) {
    c.bench_function("decimal_multiplication", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(&x) * black_box(&y)));
    });
}

fn bench_multiplication_inflated(c: &mut Criterion) {
    c.bench_function("decimal_multiplication_inflated", |b| {
        let x = Decimal::from_str("123456789012345678901234567890.123456789").unwrap();
        let y = Decimal::from_str("987654321098765432109876543210.987654321").unwrap();
        b.iter(|| black_box(black_box(&x) * black_box(&y)));
    });
}

fn bench_division_scale(c: &mut Criterion) {
    c.bench_function("decimal_division_to_scale", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("9.876543").unwrap();
        b.iter(|| {
            black_box(
                black_box(&x)
                    .div_with_scale(black_box(&y), 8, RoundingMode::HalfEven)
                    .unwrap(),
            )
        });
    });
}

fn bench_division_ctx(c: &mut Criterion) {
    c.bench_function("decimal_division_decimal128", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(&x).try_div_ctx(black_box(&y), &MathContext::DECIMAL128).unwrap()));
    });
}

fn bench_parsing(c: &mut Criterion) {
    c.bench_function("decimal_parsing", |b| {
        b.iter(|| black_box(Decimal::from_str(black_box("123.456789")).unwrap()));
    });
}

fn bench_formatting(c: &mut Criterion) {
    c.bench_function("decimal_formatting_uncached", |b| {
        let d = Decimal::from_str("-1234567.891E-20").unwrap();
        b.iter(|| black_box(black_box(&d).to_engineering_string()));
    });
}

fn bench_sum(c: &mut Criterion) {
    c.bench_function("decimal_sum_1000_values", |b| {
        let values: Vec<Decimal> = (0..1000)
            .map(|i| Decimal::from_str(&format!("{}.{:02}", i, i % 100)).unwrap())
            .collect();
        b.iter(|| black_box(values.iter().sum::<Decimal>()));
    });
}

fn bench_rounding(c: &mut Criterion) {
    c.bench_function("decimal_round_to_2_decimals", |b| {
        let d = Decimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(&d).set_scale(2, RoundingMode::HalfUp).unwrap()));
    });
}

fn bench_comparison(c: &mut Criterion) {
    c.bench_function("decimal_comparison_mixed_scale", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("123.45679").unwrap();
        b.iter(|| black_box(black_box(&x).compare_to(black_box(&y))));
    });
}

fn bench_pow_ctx(c: &mut Criterion) {
    c.bench_function("decimal_pow_ctx", |b| {
        let d = Decimal::from_str("1.05").unwrap();
        b.iter(|| black_box(black_box(&d).pow_ctx(365, &MathContext::DECIMAL64).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_addition,
    bench_addition_mixed_scale,
    bench_addition_ctx_far_operands,
    bench_multiplication,
    bench_multiplication_inflated,
    bench_division_scale,
    bench_division_ctx,
    bench_parsing,
    bench_formatting,
    bench_sum,
    bench_rounding,
    bench_comparison,
    bench_pow_ctx,
);

criterion_main!(benches);
