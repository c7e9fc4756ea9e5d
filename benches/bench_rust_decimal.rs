//! Side-by-side with `rust_decimal` on values both types hold exactly.

use bigdec::{Decimal as BigDecimal, MathContext, RoundingMode};
use criterion::{Criterion, criterion_group, criterion_main};
use rust_decimal::{Decimal, MathematicalOps};
use std::hint::black_box;
use std::str::FromStr;

fn bench_addition(c: &mut Criterion) {
    let mut group = c.benchmark_group("addition");
    group.bench_function("rust_decimal", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("987.654321").unwrap();
        b.iter(|| black_box(black_box(x) + black_box(y)));
    });
    group.bench_function("bigdec", |b| {
        let x = BigDecimal::from_str("123.456789").unwrap();
        let y = BigDecimal::from_str("987.654321").unwrap();
        b.iter(|| black_box(black_box(&x) + black_box(&y)));
    });
    group.finish();
}

fn bench_multiplication(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiplication");
    group.bench_function("rust_decimal", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(x) * black_box(y)));
    });
    group.bench_function("bigdec", |b| {
        let x = BigDecimal::from_str("123.456789").unwrap();
        let y = BigDecimal::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(&x) * black_box(&y)));
    });
    group.finish();
}

fn bench_division(c: &mut Criterion) {
    let mut group = c.benchmark_group("division_28_digits");
    group.bench_function("rust_decimal", |b| {
        let x = Decimal::from_str("123.456789").unwrap();
        let y = Decimal::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(x) / black_box(y)));
    });
    group.bench_function("bigdec", |b| {
        let x = BigDecimal::from_str("123.456789").unwrap();
        let y = BigDecimal::from_str("9.876543").unwrap();
        let mc = MathContext::with_rounding(28, RoundingMode::HalfEven);
        b.iter(|| black_box(black_box(&x).try_div_ctx(black_box(&y), &mc).unwrap()));
    });
    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.bench_function("rust_decimal", |b| {
        b.iter(|| black_box(Decimal::from_str(black_box("123.456789")).unwrap()));
    });
    group.bench_function("bigdec", |b| {
        b.iter(|| black_box(BigDecimal::from_str(black_box("123.456789")).unwrap()));
    });
    group.finish();
}

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.bench_function("rust_decimal", |b| {
        let d = Decimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(format!("{}", black_box(d))));
    });
    group.bench_function("bigdec", |b| {
        let d = BigDecimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(&d).to_plain_string()));
    });
    group.finish();
}

fn bench_rounding(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_to_2_decimals");
    group.bench_function("rust_decimal", |b| {
        let d = Decimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(d).round_dp(2)));
    });
    group.bench_function("bigdec", |b| {
        let d = BigDecimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(&d).set_scale(2, RoundingMode::HalfEven).unwrap()));
    });
    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_1000_values");
    let text: Vec<String> = (0..1000).map(|i| format!("{}.{:02}", i, i % 100)).collect();
    group.bench_function("rust_decimal", |b| {
        let values: Vec<Decimal> = text.iter().map(|s| Decimal::from_str(s).unwrap()).collect();
        b.iter(|| black_box(values.iter().copied().sum::<Decimal>()));
    });
    group.bench_function("bigdec", |b| {
        let values: Vec<BigDecimal> = text.iter().map(|s| BigDecimal::from_str(s).unwrap()).collect();
        b.iter(|| black_box(values.iter().sum::<BigDecimal>()));
    });
    group.finish();
}

fn bench_powi(c: &mut Criterion) {
    let mut group = c.benchmark_group("powi_10");
    group.bench_function("rust_decimal", |b| {
        let d = Decimal::from_str("1.05").unwrap();
        b.iter(|| black_box(black_box(d).powi(10)));
    });
    group.bench_function("bigdec", |b| {
        let d = BigDecimal::from_str("1.05").unwrap();
        b.iter(|| black_box(black_box(&d).pow(10).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_addition,
    bench_multiplication,
    bench_division,
    bench_parsing,
    bench_formatting,
    bench_rounding,
    bench_sum,
    bench_powi,
);

criterion_main!(benches);
