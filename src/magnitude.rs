//! Word-array arithmetic on unsigned magnitudes.
//!
//! A magnitude is a big-endian sequence of 32-bit words (most significant
//! word first). Canonical magnitudes carry no leading zero word and zero is
//! the empty slice. All carries and borrows go through 64-bit intermediates.

use core::cmp::Ordering;

pub(crate) const LONG_MASK: u64 = 0xffff_ffff;

// ============================================================================
// Normalization & Comparison
// ============================================================================

/// Drops leading zero words in place.
#[inline]
pub(crate) fn strip_leading_zeros(mut v: Vec<u32>) -> Vec<u32> {
    let keep = v.iter().position(|&w| w != 0).unwrap_or(v.len());
    if keep > 0 {
        v.drain(..keep);
    }
    v
}

/// Index of the first nonzero word, or `v.len()` when all words are zero.
#[inline]
pub(crate) fn first_nonzero(v: &[u32]) -> usize {
    v.iter().position(|&w| w != 0).unwrap_or(v.len())
}

/// Compares two canonical magnitudes.
pub(crate) fn compare(x: &[u32], y: &[u32]) -> Ordering {
    match x.len().cmp(&y.len()) {
        Ordering::Equal => x.cmp(y),
        other => other,
    }
}

/// Compares the first `len` words of two big-endian arrays.
#[inline]
pub(crate) fn cmp_to_len(a: &[u32], b: &[u32], len: usize) -> Ordering {
    a[..len].cmp(&b[..len])
}

#[inline(always)]
pub(crate) const fn bit_length_for_word(w: u32) -> u32 {
    32 - w.leading_zeros()
}

/// Number of significant bits in a canonical magnitude.
#[inline]
pub(crate) fn bit_length(mag: &[u32]) -> u64 {
    match mag.first() {
        None => 0,
        Some(&hi) => ((mag.len() as u64 - 1) << 5) + bit_length_for_word(hi) as u64,
    }
}

// ============================================================================
// Addition & Subtraction
// ============================================================================

/// `x + y`. The result gains one leading word when the sum carries out.
pub(crate) fn add(x: &[u32], y: &[u32]) -> Vec<u32> {
    let (x, y) = if x.len() < y.len() { (y, x) } else { (x, y) };

    let mut x_index = x.len();
    let mut y_index = y.len();
    let mut result = vec![0u32; x_index];
    let mut sum: u64 = 0;

    while y_index > 0 {
        x_index -= 1;
        y_index -= 1;
        sum = x[x_index] as u64 + y[y_index] as u64 + (sum >> 32);
        result[x_index] = sum as u32;
    }

    let mut carry = (sum >> 32) != 0;
    while x_index > 0 && carry {
        x_index -= 1;
        result[x_index] = x[x_index].wrapping_add(1);
        carry = result[x_index] == 0;
    }
    result[..x_index].copy_from_slice(&x[..x_index]);

    if carry {
        result.insert(0, 1);
    }
    result
}

/// `big - little`. Requires `big >= little`; the result is stripped.
pub(crate) fn subtract(big: &[u32], little: &[u32]) -> Vec<u32> {
    debug_assert!(compare(big, little) != Ordering::Less);

    let mut big_index = big.len();
    let mut little_index = little.len();
    let mut result = vec![0u32; big_index];
    let mut difference: i64 = 0;

    while little_index > 0 {
        big_index -= 1;
        little_index -= 1;
        difference = big[big_index] as i64 - little[little_index] as i64 + (difference >> 32);
        result[big_index] = difference as u32;
    }

    let mut borrow = (difference >> 32) != 0;
    while big_index > 0 && borrow {
        big_index -= 1;
        result[big_index] = big[big_index].wrapping_sub(1);
        borrow = result[big_index] == u32::MAX;
    }
    result[..big_index].copy_from_slice(&big[..big_index]);

    strip_leading_zeros(result)
}

/// Subtracts two arrays of equal length in place, returning the borrow
/// (`0` or `-1`).
pub(crate) fn sub_n(a: &mut [u32], b: &[u32], len: usize) -> i32 {
    let mut sum: i64 = 0;
    for i in (0..len).rev() {
        sum = a[i] as i64 - b[i] as i64 + (sum >> 32);
        a[i] = sum as u32;
    }
    (sum >> 32) as i32
}

// ============================================================================
// Multiplication
// ============================================================================

/// Schoolbook `x * y`, stripped.
pub(crate) fn multiply(x: &[u32], y: &[u32]) -> Vec<u32> {
    if x.is_empty() || y.is_empty() {
        return Vec::new();
    }
    let mut z = vec![0u32; x.len() + y.len()];
    multiply_to_len(x, y, &mut z);
    strip_leading_zeros(z)
}

/// Writes `x * y` into `z[..x.len() + y.len()]`, overwriting it.
pub(crate) fn multiply_to_len(x: &[u32], y: &[u32], z: &mut [u32]) {
    let xstart = x.len() - 1;
    let ystart = y.len() - 1;

    let mut carry: u64 = 0;
    let xw = x[xstart] as u64;
    for j in (0..=ystart).rev() {
        let product = y[j] as u64 * xw + carry;
        z[j + 1 + xstart] = product as u32;
        carry = product >> 32;
    }
    z[xstart] = carry as u32;

    for i in (0..xstart).rev() {
        carry = 0;
        let xw = x[i] as u64;
        for j in (0..=ystart).rev() {
            let k = j + 1 + i;
            let product = y[j] as u64 * xw + z[k] as u64 + carry;
            z[k] = product as u32;
            carry = product >> 32;
        }
        z[i] = carry as u32;
    }
}

/// `x * w` for a single word, stripped.
pub(crate) fn multiply_word(x: &[u32], w: u32) -> Vec<u32> {
    if x.is_empty() || w == 0 {
        return Vec::new();
    }
    let mut z = vec![0u32; x.len() + 1];
    let mut carry: u64 = 0;
    for i in (0..x.len()).rev() {
        let product = x[i] as u64 * w as u64 + carry;
        z[i + 1] = product as u32;
        carry = product >> 32;
    }
    z[0] = carry as u32;
    strip_leading_zeros(z)
}

/// `x * x`, stripped.
pub(crate) fn square(x: &[u32]) -> Vec<u32> {
    if x.is_empty() {
        return Vec::new();
    }
    let mut z = vec![0u32; x.len() << 1];
    square_to_len(x, &mut z);
    strip_leading_zeros(z)
}

/// Writes `x * x` into `z`, which must be exactly `2 * x.len()` words.
///
/// Only the diagonal and the triangle below it are computed: the diagonal
/// squares are stored halved, the off-diagonal products are added once,
/// and the whole is doubled back with the low bit restored from `x`.
pub(crate) fn square_to_len(x: &[u32], z: &mut [u32]) {
    let len = x.len();
    let zlen = len << 1;
    debug_assert_eq!(z.len(), zlen);

    let mut last_product_low_word: u32 = 0;
    let mut i = 0;
    for &piece in x {
        let product = piece as u64 * piece as u64;
        z[i] = (last_product_low_word << 31) | (product >> 33) as u32;
        z[i + 1] = (product >> 1) as u32;
        last_product_low_word = product as u32;
        i += 2;
    }

    let mut offset = 1;
    for i in (1..=len).rev() {
        let t = x[i - 1];
        let t = mul_add(z, x, offset, i - 1, t);
        add_one(z, offset - 1, i, t);
        offset += 2;
    }

    primitive_left_shift(z, 1);
    z[zlen - 1] |= x[len - 1] & 1;
}

/// Multiplies `inp[..len]` by `k` and adds it into `out`, aligned `offset`
/// words up from the least significant end. Returns the carry word.
pub(crate) fn mul_add(out: &mut [u32], inp: &[u32], offset: usize, len: usize, k: u32) -> u32 {
    let k = k as u64;
    let mut carry: u64 = 0;
    let mut pos = out.len() - offset - 1;
    for j in (0..len).rev() {
        let product = inp[j] as u64 * k + out[pos] as u64 + carry;
        out[pos] = product as u32;
        pos = pos.wrapping_sub(1);
        carry = product >> 32;
    }
    carry as u32
}

/// Adds `carry` into `a` at `mlen` words above `offset`, propagating.
/// Returns 1 if the carry ran off the top of the array.
pub(crate) fn add_one(a: &mut [u32], offset: usize, mlen: usize, carry: u32) -> u32 {
    let mut pos = a.len() - 1 - mlen - offset;
    let t = a[pos] as u64 + carry as u64;
    a[pos] = t as u32;
    if (t >> 32) == 0 {
        return 0;
    }
    for _ in 0..mlen {
        if pos == 0 {
            return 1;
        }
        pos -= 1;
        a[pos] = a[pos].wrapping_add(1);
        if a[pos] != 0 {
            return 0;
        }
    }
    1
}

/// `x = x * y + z` in place, assuming the result fits in `x`.
pub(crate) fn mul_add_in_place(x: &mut [u32], y: u32, z: u32) {
    let ylong = y as u64;
    let zlong = z as u64;
    let len = x.len();

    let mut carry: u64 = 0;
    for i in (0..len).rev() {
        let product = ylong * x[i] as u64 + carry;
        x[i] = product as u32;
        carry = product >> 32;
    }

    let mut sum = x[len - 1] as u64 + zlong;
    x[len - 1] = sum as u32;
    carry = sum >> 32;
    for i in (0..len - 1).rev() {
        sum = x[i] as u64 + carry;
        x[i] = sum as u32;
        carry = sum >> 32;
    }
}

// ============================================================================
// Shifts
// ============================================================================

/// Shifts the whole array left by `n` bits (`0 <= n < 32`), dropping bits
/// that leave the top word.
pub(crate) fn primitive_left_shift(a: &mut [u32], n: u32) {
    let len = a.len();
    if len == 0 || n == 0 {
        return;
    }
    let n2 = 32 - n;
    for i in 0..len - 1 {
        a[i] = (a[i] << n) | (a[i + 1] >> n2);
    }
    a[len - 1] <<= n;
}

/// Shifts the whole array right by `n` bits (`0 <= n < 32`).
pub(crate) fn primitive_right_shift(a: &mut [u32], n: u32) {
    let len = a.len();
    if len == 0 || n == 0 {
        return;
    }
    let n2 = 32 - n;
    for i in (1..len).rev() {
        a[i] = (a[i - 1] << n2) | (a[i] >> n);
    }
    a[0] >>= n;
}

/// `mag << n`.
pub(crate) fn shift_left(mag: &[u32], n: u64) -> Vec<u32> {
    if mag.is_empty() {
        return Vec::new();
    }
    let n_ints = (n >> 5) as usize;
    let n_bits = (n & 0x1f) as u32;
    let mag_len = mag.len();

    if n_bits == 0 {
        let mut out = Vec::with_capacity(mag_len + n_ints);
        out.extend_from_slice(mag);
        out.resize(mag_len + n_ints, 0);
        return out;
    }

    let n_bits2 = 32 - n_bits;
    let high_bits = mag[0] >> n_bits2;
    let mut out = Vec::with_capacity(mag_len + n_ints + 1);
    if high_bits != 0 {
        out.push(high_bits);
    }
    for j in 0..mag_len - 1 {
        out.push((mag[j] << n_bits) | (mag[j + 1] >> n_bits2));
    }
    out.push(mag[mag_len - 1] << n_bits);
    out.resize(out.len() + n_ints, 0);
    out
}

/// `mag >> n`, discarding the shifted-out bits.
pub(crate) fn shift_right(mag: &[u32], n: u64) -> Vec<u32> {
    let mag_len = mag.len();
    let n_ints = (n >> 5) as usize;
    if n >> 5 >= mag_len as u64 {
        return Vec::new();
    }
    let n_bits = (n & 0x1f) as u32;

    if n_bits == 0 {
        return mag[..mag_len - n_ints].to_vec();
    }

    let high_bits = mag[0] >> n_bits;
    let n_bits2 = 32 - n_bits;
    let mut out = Vec::with_capacity(mag_len - n_ints);
    if high_bits != 0 {
        out.push(high_bits);
    }
    for j in 0..mag_len - n_ints - 1 {
        out.push((mag[j] << n_bits2) | (mag[j + 1] >> n_bits));
    }
    strip_leading_zeros(out)
}

/// True when any of the lowest `n` bits of `mag` is set.
pub(crate) fn has_low_bits(mag: &[u32], n: u64) -> bool {
    let n_ints = (n >> 5) as usize;
    let n_bits = (n & 0x1f) as u32;
    let len = mag.len();
    let whole = n_ints.min(len);
    if mag[len - whole..].iter().any(|&w| w != 0) {
        return true;
    }
    n_bits != 0 && n_ints < len && (mag[len - n_ints - 1] << (32 - n_bits)) != 0
}

/// Splits a `u64` into a canonical magnitude.
#[inline]
pub(crate) fn from_u64(v: u64) -> Vec<u32> {
    let hi = (v >> 32) as u32;
    let lo = v as u32;
    if hi != 0 {
        vec![hi, lo]
    } else if lo != 0 {
        vec![lo]
    } else {
        Vec::new()
    }
}

/// Splits a `u128` into a canonical magnitude.
pub(crate) fn from_u128(v: u128) -> Vec<u32> {
    let words = [(v >> 96) as u32, (v >> 64) as u32, (v >> 32) as u32, v as u32];
    words[first_nonzero(&words)..].to_vec()
}

/// Value of a magnitude of at most two words.
#[inline]
pub(crate) fn to_u64(mag: &[u32]) -> Option<u64> {
    match *mag {
        [] => Some(0),
        [lo] => Some(lo as u64),
        [hi, lo] => Some(((hi as u64) << 32) | lo as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mag(v: u128) -> Vec<u32> {
        from_u128(v)
    }

    fn val(m: &[u32]) -> u128 {
        m.iter().fold(0u128, |acc, &w| (acc << 32) | w as u128)
    }

    #[test]
    fn test_strip_and_compare() {
        assert_eq!(strip_leading_zeros(vec![0, 0, 5, 0]), vec![5, 0]);
        assert!(strip_leading_zeros(vec![0, 0]).is_empty());
        assert_eq!(compare(&[1, 0], &[0xffff_ffff]), Ordering::Greater);
        assert_eq!(compare(&[3, 4], &[3, 5]), Ordering::Less);
        assert_eq!(compare(&[], &[]), Ordering::Equal);
    }

    #[test]
    fn test_add_carry_out() {
        let sum = add(&[u32::MAX, u32::MAX], &[1]);
        assert_eq!(sum, vec![1, 0, 0]);
        assert_eq!(val(&add(&mag(12345), &mag(1 << 40))), 12345 + (1 << 40));
        assert_eq!(add(&[], &[7]), vec![7]);
    }

    #[test]
    fn test_subtract_borrow() {
        assert_eq!(subtract(&[1, 0, 0], &[1]), vec![u32::MAX, u32::MAX]);
        assert!(subtract(&[9, 9], &[9, 9]).is_empty());
        let a = (1u128 << 100) + 17;
        let b = (1u128 << 64) + 99;
        assert_eq!(val(&subtract(&mag(a), &mag(b))), a - b);
    }

    #[test]
    fn test_multiply_matches_u128() {
        let a = 0xdead_beef_cafe_babeu128;
        let b = 0x1234_5678_9abcu128;
        assert_eq!(val(&multiply(&mag(a), &mag(b))), a * b);
        assert!(multiply(&[], &[1, 2]).is_empty());
        assert_eq!(val(&multiply_word(&mag(a), 1000)), a * 1000);
    }

    #[test]
    fn test_square_matches_multiply() {
        let x = vec![0x8000_0001, 0xffff_ffff, 0x1234_5678, 3];
        assert_eq!(square(&x), multiply(&x, &x));
        assert_eq!(square(&[u32::MAX]), multiply(&[u32::MAX], &[u32::MAX]));
        let y = vec![7];
        assert_eq!(square(&y), vec![49]);
    }

    #[test]
    fn test_shifts() {
        let a = 0x1_2345_6789_abcdu128;
        assert_eq!(val(&shift_left(&mag(a), 4)), a << 4);
        assert_eq!(val(&shift_left(&mag(a), 32)), a << 32);
        assert_eq!(val(&shift_left(&mag(a), 37)), a << 37);
        assert_eq!(val(&shift_right(&mag(a), 4)), a >> 4);
        assert_eq!(val(&shift_right(&mag(a), 33)), a >> 33);
        assert!(shift_right(&mag(a), 64).is_empty());
        assert!(shift_right(&mag(a), 1000).is_empty());
    }

    #[test]
    fn test_primitive_shifts() {
        let mut a = vec![0x0000_0001, 0x8000_0000];
        primitive_left_shift(&mut a, 1);
        assert_eq!(a, vec![0x0000_0003, 0]);
        primitive_right_shift(&mut a, 1);
        assert_eq!(a, vec![0x0000_0001, 0x8000_0000]);
        primitive_right_shift(&mut a, 0);
        assert_eq!(a, vec![0x0000_0001, 0x8000_0000]);
    }

    #[test]
    fn test_mul_add_in_place() {
        let mut x = vec![0, 0, 12];
        mul_add_in_place(&mut x, 1_000_000_000, 345);
        assert_eq!(val(&x), 12_000_000_345);
    }

    #[test]
    fn test_bit_length_and_low_bits() {
        assert_eq!(bit_length(&[]), 0);
        assert_eq!(bit_length(&[1]), 1);
        assert_eq!(bit_length(&[1, 0]), 33);
        assert!(has_low_bits(&[1, 0], 33));
        assert!(!has_low_bits(&[1, 0], 32));
        assert!(has_low_bits(&[0x10], 5));
        assert!(!has_low_bits(&[0x10], 4));
    }
}
