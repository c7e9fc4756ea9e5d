use bigdec::{BigInt, Decimal, MathContext, NumError, RoundingMode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cmp::Ordering;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn primes_below(limit: usize) -> Vec<u32> {
    let mut composite = vec![false; limit];
    let mut primes = Vec::new();
    for n in 2..limit {
        if !composite[n] {
            primes.push(n as u32);
            for multiple in (n * n..limit).step_by(n) {
                composite[multiple] = true;
            }
        }
    }
    primes
}

// ============================================================================
// Decimal division and rounding
// ============================================================================

#[test]
fn test_divide_to_scale_floor() {
    let q = dec("19").div_with_scale(&dec("100"), 2, RoundingMode::Floor).unwrap();
    assert_eq!(q.unscaled_value(), BigInt::from(19));
    assert_eq!(q.scale(), 2);
    assert_eq!(q.to_string(), "0.19");

    let q = dec("21").div_with_scale(&dec("110"), 3, RoundingMode::Floor).unwrap();
    assert_eq!(q.unscaled_value(), BigInt::from(190));
    assert_eq!(q.scale(), 3);
    assert_eq!(q.to_string(), "0.190");
}

#[test]
fn test_half_boundaries() {
    let zero_point_five = dec("0.5");
    for mode in [RoundingMode::Up, RoundingMode::HalfUp, RoundingMode::Ceiling] {
        assert_eq!(zero_point_five.set_scale(0, mode).unwrap(), Decimal::ONE, "{mode}");
    }
    for mode in [RoundingMode::Down, RoundingMode::HalfDown, RoundingMode::Floor] {
        assert_eq!(zero_point_five.set_scale(0, mode).unwrap(), Decimal::ZERO, "{mode}");
    }
    assert_eq!(dec("1.5").set_scale(0, RoundingMode::HalfEven).unwrap(), Decimal::from(2));
    assert_eq!(dec("2.5").set_scale(0, RoundingMode::HalfEven).unwrap(), Decimal::from(2));
    assert_eq!(dec("-2.5").set_scale(0, RoundingMode::HalfEven).unwrap(), Decimal::from(-2));
}

#[test]
fn test_context_division() {
    let third = Decimal::ONE.try_div_ctx(&dec("3"), &MathContext::DECIMAL128).unwrap();
    assert_eq!(third.precision(), 34);
    assert_eq!(third.to_string(), format!("0.{}", "3".repeat(34)));

    let two_thirds = dec("2").try_div_ctx(&dec("3"), &MathContext::DECIMAL32).unwrap();
    assert_eq!(two_thirds.to_string(), "0.6666667");

    assert_eq!(dec("1").try_div(&dec("3")), Err(NumError::NonTerminatingDecimal));
}

#[test]
fn test_money_style_arithmetic() {
    let price = dec("19.99");
    let qty = Decimal::from(3);
    let subtotal = &price * &qty;
    assert_eq!(subtotal.to_string(), "59.97");

    let tax = subtotal
        .try_mul(&dec("0.0825"))
        .unwrap()
        .set_scale(2, RoundingMode::HalfEven)
        .unwrap();
    assert_eq!(tax.to_string(), "4.95");
    let total = &subtotal + &tax;
    assert_eq!(total.to_string(), "64.92");

    let share = total.div_with_scale(&Decimal::from(7), 2, RoundingMode::HalfUp).unwrap();
    assert_eq!(share.to_string(), "9.27");
    assert_eq!(share.compare_to(&dec("9.274")), Ordering::Less);
}

// ============================================================================
// BigInt arithmetic
// ============================================================================

#[test]
fn test_thirty_digit_square() {
    let x: BigInt = "123456789012345678901234567890".parse().unwrap();
    let expected: BigInt = "15241578753238836750495351562536198787501905199875019052100"
        .parse()
        .unwrap();
    assert_eq!(&x * &x, expected);
    assert_eq!(x.square(), expected);
    assert_eq!(x.pow(2), expected);
}

#[test]
fn test_truncating_division_signs() {
    let cases = [(7, 2, 3, 1), (-7, 2, -3, -1), (7, -2, -3, 1), (-7, -2, 3, -1)];
    for (a, b, q, r) in cases {
        let (got_q, got_r) = BigInt::from(a).try_div_rem(&BigInt::from(b)).unwrap();
        assert_eq!(got_q, BigInt::from(q), "{a} / {b}");
        assert_eq!(got_r, BigInt::from(r), "{a} % {b}");
    }
    assert_eq!(BigInt::from(-7).modulo(&BigInt::from(2)).unwrap(), BigInt::from(1));
}

// ============================================================================
// Primes
// ============================================================================

fn check_generated_prime(p: &BigInt, bits: u64, small_primes: &[u32]) {
    assert_eq!(p.bit_length(), bits);
    for &q in small_primes {
        assert!(
            !(p % &BigInt::from(q)).is_zero(),
            "{p} is divisible by {q}"
        );
    }
    let p_minus_one = p - &BigInt::from(1);
    for base in [2, 3, 5, 7] {
        let fermat = BigInt::from(base).mod_pow(&p_minus_one, p).unwrap();
        assert_eq!(fermat, BigInt::from(1), "Fermat base {base} rejects {p}");
    }
    assert!(p.is_probable_prime(100));
}

#[test]
fn test_probable_prime_generation() {
    let small_primes = primes_below(10_000);
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    for bits in [16, 64, 128, 512] {
        for _ in 0..3 {
            let p = BigInt::probable_prime(bits, &mut rng).unwrap();
            check_generated_prime(&p, bits, &small_primes);
        }
    }
}

#[test]
fn test_probable_prime_rejects_tiny_bit_lengths() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(BigInt::probable_prime(1, &mut rng), Err(NumError::BitLengthTooSmall));
    let p = BigInt::probable_prime(2, &mut rng).unwrap();
    assert!(p == BigInt::from(2) || p == BigInt::from(3));
}

#[test]
fn test_small_composites_and_primes() {
    assert!(!BigInt::from(4).is_probable_prime(100));
    assert!(!BigInt::from(1).is_probable_prime(100));
    assert!(!BigInt::ZERO.is_probable_prime(100));
    assert!(BigInt::from(2).is_probable_prime(100));
    assert!(BigInt::from(-7).is_probable_prime(100));
    // certainty <= 0 accepts anything
    assert!(BigInt::from(4).is_probable_prime(0));

    let primes = primes_below(2_000);
    for n in 2..2_000u32 {
        let expected = primes.binary_search(&n).is_ok();
        assert_eq!(BigInt::from(n).is_probable_prime(50), expected, "{n}");
    }
}

#[test]
fn test_next_probable_prime() {
    assert_eq!(BigInt::ZERO.next_probable_prime().unwrap(), BigInt::from(2));
    assert_eq!(BigInt::from(2).next_probable_prime().unwrap(), BigInt::from(3));
    assert_eq!(BigInt::from(100).next_probable_prime().unwrap(), BigInt::from(101));
    assert_eq!(BigInt::from(7919).next_probable_prime().unwrap(), BigInt::from(7927));
    assert_eq!(
        BigInt::from(-1).next_probable_prime(),
        Err(NumError::NegativeValue)
    );

    // 2^89 - 1 is prime; the next one above 2^89 - 3 must be it
    let m89 = (BigInt::from(1) << 89u32) - BigInt::from(1);
    let below = &m89 - &BigInt::from(2);
    assert_eq!(below.next_probable_prime().unwrap(), m89);
}
