//! Powers of ten shared by all decimal arithmetic.
//!
//! Small powers live in a fixed `i64` table. Larger ones come from a
//! process-wide `BigInt` table that grows on demand under a write lock.

use std::sync::{LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::bigint::BigInt;
use crate::magnitude;

/// `10^n` for `n` in `0..19`.
pub(crate) const LONG_TEN_POWERS: [i64; 19] = {
    let mut table = [1i64; 19];
    let mut i = 1;
    while i < 19 {
        table[i] = table[i - 1] * 10;
        i += 1;
    }
    table
};

/// `i64::MAX / 10^n`: the largest magnitude that survives a multiply by
/// `10^n`.
const THRESHOLDS: [i64; 19] = {
    let mut table = [i64::MAX; 19];
    let mut i = 1;
    while i < 19 {
        table[i] = i64::MAX / LONG_TEN_POWERS[i];
        i += 1;
    }
    table
};

const BIG_TEN_POWERS_INITIAL_LEN: usize = 19;
const BIG_TEN_POWERS_MAX: usize = 16 * BIG_TEN_POWERS_INITIAL_LEN;

static BIG_TEN_POWERS: LazyLock<RwLock<Vec<BigInt>>> = LazyLock::new(|| {
    RwLock::new(LONG_TEN_POWERS.iter().map(|&p| BigInt::from(p)).collect())
});

/// `val * 10^n` if the product fits an `i64` other than `i64::MIN`.
pub(crate) fn long_multiply_power_ten(val: i64, n: u32) -> Option<i64> {
    if val == 0 || n == 0 {
        return Some(val);
    }
    let n = n as usize;
    if n < LONG_TEN_POWERS.len() {
        let ten_power = LONG_TEN_POWERS[n];
        if val == 1 {
            return Some(ten_power);
        }
        if val.unsigned_abs() <= THRESHOLDS[n] as u64 {
            return Some(val * ten_power);
        }
    }
    None
}

/// `10^n` as a `BigInt`.
pub(crate) fn big_ten_to_the(n: u32) -> BigInt {
    let idx = n as usize;
    if idx < BIG_TEN_POWERS_MAX {
        {
            let table = BIG_TEN_POWERS.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(p) = table.get(idx) {
                return p.clone();
            }
        }
        return expand_big_ten_powers(idx);
    }
    BigInt::from(10u32).pow(n)
}

fn expand_big_ten_powers(n: usize) -> BigInt {
    let mut table = BIG_TEN_POWERS.write().unwrap_or_else(PoisonError::into_inner);
    // Another writer may have grown the table while we waited.
    let cur_len = table.len();
    if cur_len <= n {
        let mut new_len = cur_len << 1;
        while new_len <= n {
            new_len <<= 1;
        }
        table.reserve(new_len - cur_len);
        for i in cur_len..new_len {
            let next = table[i - 1].mul_i64(10);
            table.push(next);
        }
        debug!(from = cur_len, to = new_len, "grew power-of-ten table");
    }
    table[n].clone()
}

/// `value * 10^n`.
pub(crate) fn big_multiply_power_ten(value: &BigInt, n: u32) -> BigInt {
    if n == 0 || value.is_zero() {
        return value.clone();
    }
    if (n as usize) < LONG_TEN_POWERS.len() {
        value.mul_i64(LONG_TEN_POWERS[n as usize])
    } else {
        value * &big_ten_to_the(n)
    }
}

/// Number of decimal digits in `|x|`; zero has one digit.
pub(crate) fn long_digit_length(x: i64) -> u32 {
    let x = x.unsigned_abs();
    if x < 10 {
        return 1;
    }
    let bits = 64 - x.leading_zeros();
    // log10(2) ~= 1233 / 4096
    let r = ((bits + 1) * 1233) >> 12;
    if r as usize >= LONG_TEN_POWERS.len() || x < LONG_TEN_POWERS[r as usize] as u64 {
        r
    } else {
        r + 1
    }
}

/// Number of decimal digits in `|b|`; zero has one digit.
pub(crate) fn big_digit_length(b: &BigInt) -> u32 {
    if b.is_zero() {
        return 1;
    }
    // log10(2) ~= 646456993 / 2^31
    let r = ((magnitude::bit_length(b.magnitude()) + 1) * 646_456_993) >> 31;
    let r = r as u32;
    if b.compare_magnitude(&big_ten_to_the(r)).is_lt() {
        r
    } else {
        r + 1
    }
}
