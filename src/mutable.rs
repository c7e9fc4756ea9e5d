//! In-place big integer used as a scratch value by division, GCD and
//! modular inversion.
//!
//! A `MutableBigInt` is a window `value[offset..offset + len]` into a word
//! buffer. Operations grow the buffer only when the window cannot be
//! extended into slack on either side. Instances never escape the crate:
//! results are materialized into a [`BigInt`] at the algorithm boundary.

use core::cmp::Ordering;

use crate::bigint::{BigInt, Sign};
use crate::magnitude::{self, LONG_MASK};
use crate::{NumError, Result};

#[derive(Clone, Debug, Default)]
pub(crate) struct MutableBigInt {
    value: Vec<u32>,
    offset: usize,
    len: usize,
}

// ============================================================================
// Construction & Accessors
// ============================================================================

impl MutableBigInt {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            value: vec![0; 1],
            offset: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn from_word(w: u32) -> Self {
        Self {
            value: vec![w],
            offset: 0,
            len: (w != 0) as usize,
        }
    }

    /// Copies a magnitude into a fresh buffer and normalizes it.
    pub(crate) fn from_mag(mag: &[u32]) -> Self {
        let mut m = Self {
            value: mag.to_vec(),
            offset: 0,
            len: mag.len(),
        };
        m.normalize();
        m
    }

    /// The active window.
    #[inline]
    pub(crate) fn mag(&self) -> &[u32] {
        &self.value[self.offset..self.offset + self.len]
    }

    #[inline]
    fn mag_mut(&mut self) -> &mut [u32] {
        let end = self.offset + self.len;
        &mut self.value[self.offset..end]
    }

    /// Copies the window out as a canonical magnitude.
    #[inline]
    pub(crate) fn to_mag(&self) -> Vec<u32> {
        magnitude::strip_leading_zeros(self.mag().to_vec())
    }

    /// Materializes the value with the given sign (ignored when zero).
    pub(crate) fn to_big_int(&self, sign: Sign) -> BigInt {
        BigInt::from_parts(sign, self.to_mag())
    }

    pub(crate) fn copy_value(&mut self, src: &MutableBigInt) {
        self.value.clear();
        self.value.extend_from_slice(src.mag());
        if self.value.is_empty() {
            self.value.push(0);
        }
        self.offset = 0;
        self.len = src.len;
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.offset = 0;
        self.len = 0;
    }

    #[inline]
    fn set_value(&mut self, value: Vec<u32>, len: usize) {
        self.value = value;
        self.len = len;
        self.offset = 0;
    }

    /// Moves the window past leading zero words.
    pub(crate) fn normalize(&mut self) {
        if self.len == 0 {
            self.offset = 0;
            return;
        }
        let skip = magnitude::first_nonzero(self.mag());
        if skip == self.len {
            self.reset();
        } else {
            self.offset += skip;
            self.len -= skip;
        }
    }

    #[inline(always)]
    pub(crate) fn is_zero(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub(crate) fn is_one(&self) -> bool {
        self.len == 1 && self.value[self.offset] == 1
    }

    #[inline(always)]
    fn low_word(&self) -> u32 {
        if self.len == 0 {
            0
        } else {
            self.value[self.offset + self.len - 1]
        }
    }

    #[inline(always)]
    pub(crate) fn is_odd(&self) -> bool {
        self.low_word() & 1 == 1
    }

    #[inline(always)]
    pub(crate) fn is_even(&self) -> bool {
        self.low_word() & 1 == 0
    }

    /// Index of the lowest set bit, `None` for zero.
    pub(crate) fn lowest_set_bit(&self) -> Option<u64> {
        let mag = self.mag();
        let j = mag.iter().rposition(|&w| w != 0)?;
        Some((((mag.len() - 1 - j) as u64) << 5) + mag[j].trailing_zeros() as u64)
    }

    pub(crate) fn compare(&self, other: &MutableBigInt) -> Ordering {
        magnitude::compare(self.mag(), other.mag())
    }

    /// Compares `self` against half of `b`, exactly.
    pub(crate) fn compare_half(&self, b: &MutableBigInt) -> Ordering {
        let blen = b.len;
        let len = self.len;
        if len == 0 {
            return if blen == 0 {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if len > blen {
            return Ordering::Greater;
        }
        if len + 1 < blen {
            return Ordering::Less;
        }

        let bval = b.mag();
        let mut bstart = 0;
        let mut carry: u32 = 0;
        if len != blen {
            if bval[0] == 1 {
                bstart = 1;
                carry = 0x8000_0000;
            } else {
                return Ordering::Less;
            }
        }

        for (&v, &bv) in self.mag().iter().zip(&bval[bstart..]) {
            let hb = (bv >> 1).wrapping_add(carry);
            if v != hb {
                return v.cmp(&hb);
            }
            carry = (bv & 1) << 31;
        }
        if carry == 0 {
            Ordering::Equal
        } else {
            Ordering::Less
        }
    }
}

// ============================================================================
// Shifts
// ============================================================================

impl MutableBigInt {
    /// `self <<= n`, reusing slack on the right, then on the left, before
    /// reallocating.
    pub(crate) fn left_shift(&mut self, n: u64) {
        if self.len == 0 || n == 0 {
            return;
        }
        let n_ints = (n >> 5) as usize;
        let n_bits = (n & 0x1f) as u32;
        let bits_in_high_word = magnitude::bit_length_for_word(self.value[self.offset]);

        if n <= (32 - bits_in_high_word) as u64 {
            magnitude::primitive_left_shift(self.mag_mut(), n_bits);
            return;
        }

        let mut new_len = self.len + n_ints + 1;
        if n_bits <= 32 - bits_in_high_word {
            new_len -= 1;
        }

        if self.value.len() < new_len {
            let mut grown = vec![0u32; new_len];
            grown[..self.len].copy_from_slice(self.mag());
            self.set_value(grown, new_len);
        } else if self.value.len() - self.offset >= new_len {
            let start = self.offset + self.len;
            self.value[start..self.offset + new_len].fill(0);
        } else {
            self.value.copy_within(self.offset..self.offset + self.len, 0);
            self.value[self.len..new_len].fill(0);
            self.offset = 0;
        }
        self.len = new_len;

        if n_bits == 0 {
            return;
        }
        if n_bits <= 32 - bits_in_high_word {
            magnitude::primitive_left_shift(self.mag_mut(), n_bits);
        } else {
            magnitude::primitive_right_shift(self.mag_mut(), 32 - n_bits);
        }
    }

    /// `self >>= n`, discarding shifted-out bits.
    pub(crate) fn right_shift(&mut self, n: u64) {
        if self.len == 0 || n == 0 {
            return;
        }
        let n_ints = n >> 5;
        if n_ints >= self.len as u64 {
            self.reset();
            return;
        }
        let n_bits = (n & 0x1f) as u32;
        self.len -= n_ints as usize;
        if n_bits == 0 {
            return;
        }
        let bits_in_high_word = magnitude::bit_length_for_word(self.value[self.offset]);
        if n_bits >= bits_in_high_word {
            magnitude::primitive_left_shift(self.mag_mut(), 32 - n_bits);
            self.len -= 1;
        } else {
            magnitude::primitive_right_shift(self.mag_mut(), n_bits);
        }
        self.normalize();
    }

    /// Keeps only the lowest `bits` bits.
    pub(crate) fn keep_low_bits(&mut self, bits: u64) {
        let words = bits.div_ceil(32);
        if words < self.len as u64 {
            let drop = self.len - words as usize;
            self.offset += drop;
            self.len = words as usize;
        }
        let excess = (self.len as u64) * 32 - bits.min((self.len as u64) * 32);
        if excess > 0 && self.len > 0 {
            self.value[self.offset] &= u32::MAX >> excess;
        }
        self.normalize();
    }
}

// ============================================================================
// Addition & Subtraction
// ============================================================================

impl MutableBigInt {
    /// `self += addend`. The sum is right-aligned in the buffer.
    pub(crate) fn add(&mut self, addend: &MutableBigInt) {
        let mut x = self.len;
        let mut y = addend.len;
        let mut result_len = x.max(y);

        if self.value.len() < result_len {
            let mut grown = vec![0u32; result_len];
            grown[result_len - self.len..].copy_from_slice(self.mag());
            self.value = grown;
            self.offset = result_len - self.len;
        }

        let offset = self.offset;
        let avalue = addend.mag();
        let mut rstart = self.value.len();
        let mut carry: u64 = 0;

        while x > 0 && y > 0 {
            x -= 1;
            y -= 1;
            let sum = self.value[x + offset] as u64 + avalue[y] as u64 + carry;
            rstart -= 1;
            self.value[rstart] = sum as u32;
            carry = sum >> 32;
        }

        while x > 0 {
            x -= 1;
            if carry == 0 && rstart == x + offset + 1 {
                // remaining words are already in place
                self.offset = self.value.len() - result_len;
                self.len = result_len;
                return;
            }
            let sum = self.value[x + offset] as u64 + carry;
            rstart -= 1;
            self.value[rstart] = sum as u32;
            carry = sum >> 32;
        }

        while y > 0 {
            y -= 1;
            let sum = avalue[y] as u64 + carry;
            rstart -= 1;
            self.value[rstart] = sum as u32;
            carry = sum >> 32;
        }

        if carry > 0 {
            result_len += 1;
            if self.value.len() < result_len {
                self.value.insert(0, 1);
            } else {
                rstart -= 1;
                self.value[rstart] = 1;
            }
        }

        self.offset = self.value.len() - result_len;
        self.len = result_len;
    }

    /// Replaces `self` with `|self - b|` and returns the sign of
    /// `self - b` (-1, 0 or 1).
    pub(crate) fn subtract(&mut self, b: &MutableBigInt) -> i32 {
        match self.compare(b) {
            Ordering::Equal => {
                self.reset();
                0
            }
            Ordering::Greater => {
                let bval = b.mag();
                let mut x = self.len;
                let mut y = bval.len();
                let offset = self.offset;
                let mut diff: i64 = 0;
                while y > 0 {
                    x -= 1;
                    y -= 1;
                    diff = self.value[x + offset] as i64 - bval[y] as i64 + (diff >> 32);
                    self.value[x + offset] = diff as u32;
                }
                while x > 0 && (diff >> 32) != 0 {
                    x -= 1;
                    diff = self.value[x + offset] as i64 + (diff >> 32);
                    self.value[x + offset] = diff as u32;
                }
                self.normalize();
                1
            }
            Ordering::Less => {
                let result = magnitude::subtract(b.mag(), self.mag());
                let len = result.len();
                self.set_value(result, len);
                -1
            }
        }
    }
}

// ============================================================================
// Multiplication
// ============================================================================

impl MutableBigInt {
    /// `z = self * y`.
    pub(crate) fn multiply(&self, y: &MutableBigInt, z: &mut MutableBigInt) {
        if self.is_zero() || y.is_zero() {
            z.reset();
            return;
        }
        let new_len = self.len + y.len;
        if z.value.len() < new_len {
            z.value = vec![0u32; new_len];
        }
        z.offset = 0;
        z.len = new_len;
        magnitude::multiply_to_len(self.mag(), y.mag(), &mut z.value[..new_len]);
        z.normalize();
    }

    /// `z = self * y` for a single word.
    pub(crate) fn mul(&self, y: u32, z: &mut MutableBigInt) {
        if y == 1 {
            z.copy_value(self);
            return;
        }
        let product = magnitude::multiply_word(self.mag(), y);
        let len = product.len();
        z.set_value(product, len);
        if z.value.is_empty() {
            z.value.push(0);
        }
    }
}

// ============================================================================
// Division
// ============================================================================

impl MutableBigInt {
    /// `quotient = self / divisor`; returns the remainder word.
    pub(crate) fn divide_one_word(&self, divisor: u32, quotient: &mut MutableBigInt) -> u32 {
        debug_assert!(divisor != 0);
        let d = divisor as u64;
        let mut q = vec![0u32; self.len.max(1)];
        let mut rem: u64 = 0;
        for (i, &w) in self.mag().iter().enumerate() {
            let dividend = (rem << 32) | w as u64;
            q[i] = (dividend / d) as u32;
            rem = dividend % d;
        }
        let len = self.len;
        quotient.set_value(q, len);
        quotient.normalize();
        rem as u32
    }

    /// `quotient = self / b`; returns `self % b`. `b` must be nonzero.
    ///
    /// Multi-word divisors use Knuth's Algorithm D: both operands are
    /// normalized so the divisor's top bit is set, each quotient word is
    /// estimated from the leading remainder words and corrected by at most
    /// one add-back.
    pub(crate) fn divide(&self, b: &MutableBigInt, quotient: &mut MutableBigInt) -> MutableBigInt {
        debug_assert!(!b.is_zero());

        if self.is_zero() {
            quotient.reset();
            return MutableBigInt::new();
        }

        match self.compare(b) {
            Ordering::Less => {
                quotient.reset();
                return self.clone();
            }
            Ordering::Equal => {
                quotient.set_value(vec![1], 1);
                return MutableBigInt::new();
            }
            Ordering::Greater => {}
        }

        if b.len == 1 {
            let r = self.divide_one_word(b.value[b.offset], quotient);
            return MutableBigInt::from_word(r);
        }

        self.divide_magnitude(b.mag(), quotient)
    }

    fn divide_magnitude(&self, div: &[u32], quotient: &mut MutableBigInt) -> MutableBigInt {
        let dlen = div.len();
        let nlen = self.len;
        let shift = div[0].leading_zeros();

        let mut d = div.to_vec();
        magnitude::primitive_left_shift(&mut d, shift);

        let mut rem = vec![0u32; nlen + 1];
        rem[1..].copy_from_slice(self.mag());
        magnitude::primitive_left_shift(&mut rem, shift);

        let limit = nlen - dlen + 1;
        let mut q = vec![0u32; limit];
        let dh = d[0] as u64;
        let dl = d[1] as u64;

        for j in 0..limit {
            let nh = rem[j] as u64;
            let nm = rem[j + 1] as u64;

            let (mut qhat, mut rhat) = if nh == dh {
                (LONG_MASK, nh + nm)
            } else {
                let n = (nh << 32) | nm;
                (n / dh, n % dh)
            };

            let nl = rem[j + 2] as u64;
            while rhat <= LONG_MASK && qhat * dl > ((rhat << 32) | nl) {
                qhat -= 1;
                rhat += dh;
            }

            // rem[j..=j + dlen] -= qhat * d
            let mut carry: u64 = 0;
            let mut borrow: i64 = 0;
            for i in (0..dlen).rev() {
                let p = qhat * d[i] as u64 + carry;
                carry = p >> 32;
                let t = rem[j + 1 + i] as i64 - (p & LONG_MASK) as i64 + borrow;
                rem[j + 1 + i] = t as u32;
                borrow = t >> 32;
            }
            let t = rem[j] as i64 - carry as i64 + borrow;
            rem[j] = t as u32;

            if t < 0 {
                qhat -= 1;
                let mut c: u64 = 0;
                for i in (0..dlen).rev() {
                    let s = rem[j + 1 + i] as u64 + d[i] as u64 + c;
                    rem[j + 1 + i] = s as u32;
                    c = s >> 32;
                }
                rem[j] = rem[j].wrapping_add(c as u32);
            }

            q[j] = qhat as u32;
        }

        quotient.set_value(q, limit);
        quotient.normalize();

        let mut r = rem.split_off(limit);
        magnitude::primitive_right_shift(&mut r, shift);
        let mut remainder = MutableBigInt {
            value: r,
            offset: 0,
            len: dlen,
        };
        remainder.normalize();
        remainder
    }
}

// ============================================================================
// GCD
// ============================================================================

impl MutableBigInt {
    /// Euclidean steps while the operands differ in size by two or more
    /// words, then binary GCD.
    pub(crate) fn hybrid_gcd(self, b: MutableBigInt) -> MutableBigInt {
        let mut a = self;
        let mut b = b;
        let mut q = MutableBigInt::new();
        while !b.is_zero() {
            if a.len.abs_diff(b.len) < 2 {
                return binary_gcd(a, b);
            }
            let r = a.divide(&b, &mut q);
            a = b;
            b = r;
        }
        a
    }
}

/// Stein's algorithm. Both operands must be nonzero.
fn binary_gcd(mut u: MutableBigInt, mut v: MutableBigInt) -> MutableBigInt {
    let (Some(s1), Some(s2)) = (u.lowest_set_bit(), v.lowest_set_bit()) else {
        return if u.is_zero() { v } else { u };
    };
    let k = s1.min(s2);
    u.right_shift(s1);
    v.right_shift(s2);

    loop {
        if u.len < 2 && v.len < 2 {
            let x = binary_gcd_word(u.low_word(), v.low_word());
            let mut r = MutableBigInt::from_word(x);
            r.left_shift(k);
            return r;
        }
        match u.compare(&v) {
            Ordering::Equal => break,
            Ordering::Greater => {
                u.subtract(&v);
                let lb = u.lowest_set_bit().unwrap_or(0);
                u.right_shift(lb);
            }
            Ordering::Less => {
                v.subtract(&u);
                let lb = v.lowest_set_bit().unwrap_or(0);
                v.right_shift(lb);
            }
        }
    }

    u.left_shift(k);
    u
}

/// Binary GCD of two words.
pub(crate) fn binary_gcd_word(mut a: u32, mut b: u32) -> u32 {
    if b == 0 {
        return a;
    }
    if a == 0 {
        return b;
    }
    let t = (a | b).trailing_zeros();
    a >>= a.trailing_zeros();
    b >>= b.trailing_zeros();
    while a != b {
        if a > b {
            a -= b;
            a >>= a.trailing_zeros();
        } else {
            b -= a;
            b >>= b.trailing_zeros();
        }
    }
    a << t
}

// ============================================================================
// Modular Inverse
// ============================================================================

/// Signed wrapper used for the cofactors of the almost-inverse algorithm.
#[derive(Clone, Debug)]
struct SignedMutable {
    sign: i32,
    mag: MutableBigInt,
}

impl SignedMutable {
    fn new(w: u32) -> Self {
        Self {
            sign: 1,
            mag: MutableBigInt::from_word(w),
        }
    }

    fn signed_add(&mut self, addend: &MutableBigInt, addend_sign: i32) {
        if addend.is_zero() {
            return;
        }
        if self.mag.is_zero() {
            self.mag.copy_value(addend);
            self.sign = addend_sign;
            return;
        }
        if self.sign == addend_sign {
            self.mag.add(addend);
        } else {
            let s = self.mag.subtract(addend);
            self.sign = if s == 0 { 1 } else { self.sign * s };
        }
    }
}

/// Inverse of `val` modulo 2^32 by Newton iteration. `val` must be odd.
pub(crate) const fn inverse_mod32(val: u32) -> u32 {
    let mut t = val;
    t = t.wrapping_mul(2u32.wrapping_sub(val.wrapping_mul(t)));
    t = t.wrapping_mul(2u32.wrapping_sub(val.wrapping_mul(t)));
    t = t.wrapping_mul(2u32.wrapping_sub(val.wrapping_mul(t)));
    t = t.wrapping_mul(2u32.wrapping_sub(val.wrapping_mul(t)));
    t
}

impl MutableBigInt {
    /// `self^-1 mod p` for `0 < self < p`.
    pub(crate) fn mutable_mod_inverse(&self, p: &MutableBigInt) -> Result<MutableBigInt> {
        if p.is_odd() {
            return self.mod_inverse_odd(p);
        }
        if self.is_even() {
            return Err(NumError::NotInvertible);
        }

        let powers_of_2 = p.lowest_set_bit().unwrap_or(0);
        let mut odd_mod = p.clone();
        odd_mod.right_shift(powers_of_2);

        if odd_mod.is_one() {
            return self.mod_inverse_mp2(powers_of_2);
        }

        let mut odd_part = self.mod_inverse_odd(&odd_mod)?;
        let even_part = self.mod_inverse_mp2(powers_of_2)?;

        let y1 = fixup(SignedMutable::new(1), &odd_mod, powers_of_2);
        let y2 = odd_mod.mod_inverse_mp2(powers_of_2)?;

        let mut temp1 = MutableBigInt::new();
        let mut temp2 = MutableBigInt::new();
        let mut result = MutableBigInt::new();

        odd_part.left_shift(powers_of_2);
        odd_part.multiply(&y1, &mut result);
        even_part.multiply(&odd_mod, &mut temp1);
        temp1.multiply(&y2, &mut temp2);
        result.add(&temp2);

        Ok(result.divide(p, &mut temp1))
    }

    /// Schroeppel's almost-inverse for an odd modulus, followed by a fixup
    /// that removes the accumulated power of two.
    fn mod_inverse_odd(&self, p: &MutableBigInt) -> Result<MutableBigInt> {
        let mut f = self.clone();
        let mut g = p.clone();
        let mut c = SignedMutable::new(1);
        let mut d = SignedMutable::new(0);
        let mut k: u64 = 0;

        if f.is_zero() {
            return Err(NumError::NotInvertible);
        }
        if f.is_even() {
            let tz = f.lowest_set_bit().unwrap_or(0);
            f.right_shift(tz);
            d.mag.left_shift(tz);
            k = tz;
        }

        while !f.is_one() {
            if f.compare(&g) == Ordering::Less {
                core::mem::swap(&mut f, &mut g);
                core::mem::swap(&mut c, &mut d);
            }

            if ((f.low_word() ^ g.low_word()) & 3) == 0 {
                f.subtract(&g);
                c.signed_add(&d.mag, -d.sign);
            } else {
                f.add(&g);
                c.signed_add(&d.mag, d.sign);
            }

            let Some(tz) = f.lowest_set_bit() else {
                return Err(NumError::NotInvertible);
            };
            f.right_shift(tz);
            d.mag.left_shift(tz);
            k += tz;
        }

        while c.sign < 0 {
            c.signed_add(p, 1);
        }

        Ok(fixup(c, p, k))
    }

    /// Inverse of an odd `self` modulo 2^k.
    pub(crate) fn mod_inverse_mp2(&self, k: u64) -> Result<MutableBigInt> {
        if self.is_even() {
            return Err(NumError::NotInvertible);
        }

        let low = self.low_word();
        let t = inverse_mod32(low);
        if k <= 32 {
            let t = if k == 32 { t } else { t & ((1u32 << k) - 1) };
            return Ok(MutableBigInt::from_word(t));
        }

        let mag = self.mag();
        let mut p_long = low as u64;
        if mag.len() > 1 {
            p_long |= (mag[mag.len() - 2] as u64) << 32;
        }
        let mut t_long = t as u64;
        t_long = t_long.wrapping_mul(2u64.wrapping_sub(p_long.wrapping_mul(t_long)));
        if k <= 64 {
            if k < 64 {
                t_long &= (1u64 << k) - 1;
            }
            return Ok(MutableBigInt::from_mag(&magnitude::from_u64(t_long)));
        }

        // Newton lifting: each step doubles the number of correct low bits.
        let mut t = magnitude::from_u64(t_long);
        let mut bits: u64 = 64;
        while bits < k {
            bits = (bits * 2).min(k);
            let mut at = MutableBigInt::from_mag(&magnitude::multiply(mag, &t));
            at.keep_low_bits(bits);
            let two = magnitude::add(&magnitude::shift_left(&[1], bits), &[2]);
            let mut correction = MutableBigInt::from_mag(&magnitude::subtract(&two, at.mag()));
            correction.keep_low_bits(bits);
            let mut next = MutableBigInt::from_mag(&magnitude::multiply(&t, correction.mag()));
            next.keep_low_bits(bits);
            t = next.to_mag();
        }
        Ok(MutableBigInt::from_mag(&t))
    }
}

/// Computes `c * 2^-k mod p` for odd `p`, clearing the low word of `c` one
/// word at a time with Montgomery-style multiples of `p`.
fn fixup(c: SignedMutable, p: &MutableBigInt, k: u64) -> MutableBigInt {
    let mut c = c.mag;
    let mut temp = MutableBigInt::new();
    let r = inverse_mod32(p.low_word()).wrapping_neg();

    for _ in 0..(k >> 5) {
        let v = r.wrapping_mul(c.low_word());
        p.mul(v, &mut temp);
        c.add(&temp);
        if c.len > 0 {
            c.len -= 1;
            c.normalize();
        }
    }

    let num_bits = (k & 0x1f) as u32;
    if num_bits != 0 {
        let mut v = r.wrapping_mul(c.low_word());
        v &= (1u32 << num_bits) - 1;
        p.mul(v, &mut temp);
        c.add(&temp);
        c.right_shift(num_bits as u64);
    }

    while c.compare(p) != Ordering::Less {
        c.subtract(p);
    }
    c
}
