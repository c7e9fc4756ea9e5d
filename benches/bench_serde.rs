use bigdec::{BigInt, Decimal};
use criterion::{Criterion, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use std::{hint::black_box, str::FromStr};

// ============================================================================
// JSON Serialization/Deserialization
// ============================================================================

fn bench_decimal_serialize_json(c: &mut Criterion) {
    c.bench_function("decimal_serialize_json", |b| {
        let d = Decimal::from_str("123.456789").unwrap();
        b.iter(|| black_box(serde_json::to_string(black_box(&d)).unwrap()));
    });
}

fn bench_decimal_deserialize_json(c: &mut Criterion) {
    c.bench_function("decimal_deserialize_json", |b| {
        let json = r#""123.456789""#;
        b.iter(|| black_box(serde_json::from_str::<Decimal>(black_box(json)).unwrap()));
    });
}

fn bench_decimal_roundtrip_json(c: &mut Criterion) {
    c.bench_function("decimal_roundtrip_json", |b| {
        let d = Decimal::from_str("-1.2345678901234567890123456789E-40").unwrap();
        b.iter(|| {
            let json = serde_json::to_string(black_box(&d)).unwrap();
            black_box(serde_json::from_str::<Decimal>(&json).unwrap())
        });
    });
}

fn bench_bigint_roundtrip_json(c: &mut Criterion) {
    c.bench_function("bigint_roundtrip_json", |b| {
        let x = BigInt::from_str(&"9876543210".repeat(20)).unwrap();
        b.iter(|| {
            let json = serde_json::to_string(black_box(&x)).unwrap();
            black_box(serde_json::from_str::<BigInt>(&json).unwrap())
        });
    });
}

// ============================================================================
// Struct Serialization
// ============================================================================

#[derive(Serialize, Deserialize)]
struct Ledger {
    account: u64,
    balance: Decimal,
    rate: Decimal,
    nonce: BigInt,
}

fn sample_ledger() -> Ledger {
    Ledger {
        account: 12345,
        balance: Decimal::from_str("1048576.25").unwrap(),
        rate: Decimal::from_str("0.0425").unwrap(),
        nonce: BigInt::from_str("340282366920938463463374607431768211457").unwrap(),
    }
}

fn bench_struct_serialize_json(c: &mut Criterion) {
    c.bench_function("ledger_struct_serialize_json", |b| {
        let ledger = sample_ledger();
        b.iter(|| black_box(serde_json::to_string(black_box(&ledger)).unwrap()));
    });
}

fn bench_struct_deserialize_json(c: &mut Criterion) {
    c.bench_function("ledger_struct_deserialize_json", |b| {
        let json = serde_json::to_string(&sample_ledger()).unwrap();
        b.iter(|| black_box(serde_json::from_str::<Ledger>(black_box(&json)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_decimal_serialize_json,
    bench_decimal_deserialize_json,
    bench_decimal_roundtrip_json,
    bench_bigint_roundtrip_json,
    bench_struct_serialize_json,
    bench_struct_deserialize_json,
);

criterion_main!(benches);
