use core::cmp::Ordering;
use core::fmt;
use core::iter::{Product, Sum};
use core::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, DivAssign, Mul, MulAssign, Neg, Not, Rem,
    RemAssign, Shl, Shr, Sub, SubAssign,
};
use core::str::FromStr;

use num_integer::Integer;
use num_traits::{FromPrimitive, Num, One, Pow, Signed, ToPrimitive, Zero};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::magnitude;
use crate::mutable::MutableBigInt;
use crate::{NumError, Result};

/// Sign of a [`BigInt`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sign {
    Minus,
    NoSign,
    Plus,
}

impl Neg for Sign {
    type Output = Sign;

    #[inline]
    fn neg(self) -> Sign {
        match self {
            Sign::Minus => Sign::Plus,
            Sign::NoSign => Sign::NoSign,
            Sign::Plus => Sign::Minus,
        }
    }
}

impl Mul for Sign {
    type Output = Sign;

    #[inline]
    fn mul(self, rhs: Sign) -> Sign {
        match (self, rhs) {
            (Sign::NoSign, _) | (_, Sign::NoSign) => Sign::NoSign,
            (a, b) if a == b => Sign::Plus,
            _ => Sign::Minus,
        }
    }
}

/// Immutable signed integer of unbounded magnitude.
///
/// Stored as a sign and a canonical big-endian magnitude of 32-bit words:
/// zero is `NoSign` with an empty magnitude, and the magnitude never has a
/// leading zero word, so every value has exactly one representation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BigInt {
    pub(crate) sign: Sign,
    pub(crate) mag: Vec<u32>,
}

// ============================================================================
// Constants & Radix Tables
// ============================================================================

impl BigInt {
    /// Zero
    pub const ZERO: BigInt = BigInt {
        sign: Sign::NoSign,
        mag: Vec::new(),
    };
}

/// Bits per digit for each radix, scaled by 1024 and rounded up.
const BITS_PER_DIGIT: [u64; 37] = [
    0, 0, 1024, 1624, 2048, 2378, 2648, 2875, 3072, 3247, 3402, 3543, 3672, 3790, 3899, 4001,
    4096, 4186, 4271, 4350, 4426, 4498, 4567, 4633, 4696, 4756, 4814, 4870, 4923, 4975, 5025,
    5074, 5120, 5166, 5210, 5253, 5295,
];

/// `(digits, radix^digits)` for the largest digit group below 2^31.
const RADIX_GROUPS: [(u32, u32); 37] = radix_groups();

const fn radix_groups() -> [(u32, u32); 37] {
    let mut table = [(0u32, 0u32); 37];
    let mut radix = 2;
    while radix <= 36 {
        let mut digits = 0;
        let mut power: u64 = 1;
        while power * (radix as u64) < (1u64 << 31) {
            power *= radix as u64;
            digits += 1;
        }
        table[radix] = (digits, power as u32);
        radix += 1;
    }
    table
}

#[inline]
fn check_radix(radix: u32) -> Result<()> {
    if (2..=36).contains(&radix) {
        Ok(())
    } else {
        Err(NumError::InvalidRadix(radix))
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Default for BigInt {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BigInt {
    /// Builds a value from a sign and a big-endian word magnitude.
    ///
    /// Leading zero words are dropped. A `NoSign` or empty magnitude yields
    /// zero.
    pub fn from_parts(sign: Sign, mag: Vec<u32>) -> Self {
        let mag = magnitude::strip_leading_zeros(mag);
        if mag.is_empty() || sign == Sign::NoSign {
            return Self::ZERO;
        }
        Self { sign, mag }
    }

    #[inline]
    pub(crate) fn from_u64_with_sign(sign: Sign, v: u64) -> Self {
        Self::from_parts(sign, magnitude::from_u64(v))
    }

    /// Builds a value from a sign and big-endian magnitude bytes.
    ///
    /// # Errors
    /// Returns `NumError::SignMagnitudeMismatch` if `sign` is `NoSign` and the
    /// magnitude is nonzero.
    pub fn from_bytes_be(sign: Sign, bytes: &[u8]) -> Result<Self> {
        let mag = bytes_to_mag(bytes);
        if sign == Sign::NoSign && !mag.is_empty() {
            return Err(NumError::SignMagnitudeMismatch);
        }
        Ok(Self::from_parts(sign, mag))
    }

    /// Parses a big-endian two's-complement byte sequence.
    ///
    /// # Errors
    /// Returns `NumError::Empty` for an empty slice.
    pub fn from_signed_bytes_be(bytes: &[u8]) -> Result<Self> {
        let Some(&first) = bytes.first() else {
            return Err(NumError::Empty);
        };
        if (first as i8) < 0 {
            let mut negated: Vec<u8> = bytes.iter().map(|b| !b).collect();
            for b in negated.iter_mut().rev() {
                *b = b.wrapping_add(1);
                if *b != 0 {
                    break;
                }
            }
            Ok(Self::from_parts(Sign::Minus, bytes_to_mag(&negated)))
        } else {
            Ok(Self::from_parts(Sign::Plus, bytes_to_mag(bytes)))
        }
    }

    /// Two's-complement words (big-endian) to a value.
    pub(crate) fn from_twos_complement_words(words: Vec<u32>) -> Self {
        match words.first() {
            Some(&w) if (w as i32) < 0 => {
                let mut neg: Vec<u32> = words.iter().map(|w| !w).collect();
                for w in neg.iter_mut().rev() {
                    *w = w.wrapping_add(1);
                    if *w != 0 {
                        break;
                    }
                }
                Self::from_parts(Sign::Minus, neg)
            }
            _ => Self::from_parts(Sign::Plus, words),
        }
    }

    /// Uniformly distributed value in `[0, 2^bits)`.
    pub fn random_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Self {
        if bits == 0 {
            return Self::ZERO;
        }
        let num_bytes = bits.div_ceil(8) as usize;
        let mut bytes = vec![0u8; num_bytes];
        rng.fill(&mut bytes[..]);
        let excess = 8 * num_bytes as u64 - bits;
        bytes[0] &= u8::MAX >> excess;
        Self::from_parts(Sign::Plus, bytes_to_mag(&bytes))
    }

    /// Parses a string in the given radix: optional leading `+` or `-`
    /// followed by one or more digits.
    ///
    /// # Errors
    /// - `NumError::InvalidRadix` if `radix` is outside `2..=36`
    /// - `NumError::Empty` for an empty string
    /// - `NumError::MisplacedSign` for a sign anywhere but the first position
    /// - `NumError::NoDigits` for a bare sign
    /// - `NumError::InvalidDigit` for any character that is not a digit
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self> {
        check_radix(radix)?;
        if s.is_empty() {
            return Err(NumError::Empty);
        }

        let bytes = s.as_bytes();
        let (sign, mut cursor) = match bytes[0] {
            b'-' => (Sign::Minus, 1),
            b'+' => (Sign::Plus, 1),
            _ => (Sign::Plus, 0),
        };
        if bytes[cursor..].iter().any(|&b| b == b'-' || b == b'+') {
            return Err(NumError::MisplacedSign);
        }
        if cursor == bytes.len() {
            return Err(NumError::NoDigits);
        }

        let digit = |b: u8| (b as char).to_digit(radix).ok_or(NumError::InvalidDigit);

        // Skip leading zeros
        while cursor < bytes.len() && digit(bytes[cursor])? == 0 {
            cursor += 1;
        }
        if cursor == bytes.len() {
            return Ok(Self::ZERO);
        }

        let num_digits = (bytes.len() - cursor) as u64;
        let num_bits = ((num_digits * BITS_PER_DIGIT[radix as usize]) >> 10) + 1;
        let num_words = num_bits.div_ceil(32) as usize;
        let mut mag = vec![0u32; num_words];

        let (group_len, super_radix) = RADIX_GROUPS[radix as usize];
        let mut first_group = (num_digits % group_len as u64) as usize;
        if first_group == 0 {
            first_group = group_len as usize;
        }

        let parse_group = |group: &[u8]| -> Result<u32> {
            group
                .iter()
                .try_fold(0u32, |acc, &b| Ok(acc * radix + digit(b)?))
        };

        mag[num_words - 1] = parse_group(&bytes[cursor..cursor + first_group])?;
        cursor += first_group;
        while cursor < bytes.len() {
            let end = cursor + group_len as usize;
            let group_val = parse_group(&bytes[cursor..end])?;
            magnitude::mul_add_in_place(&mut mag, super_radix, group_val);
            cursor = end;
        }

        Ok(Self::from_parts(sign, mag))
    }
}

fn bytes_to_mag(bytes: &[u8]) -> Vec<u32> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let bytes = &bytes[start..];
    let mut mag = Vec::with_capacity(bytes.len().div_ceil(4));
    let head = bytes.len() % 4;
    if head != 0 {
        mag.push(bytes[..head].iter().fold(0u32, |acc, &b| (acc << 8) | b as u32));
    }
    for chunk in bytes[head..].chunks_exact(4) {
        mag.push(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    mag
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInt {
                #[inline]
                fn from(value: $t) -> Self {
                    let sign = match value.signum() {
                        -1 => Sign::Minus,
                        0 => Sign::NoSign,
                        _ => Sign::Plus,
                    };
                    BigInt::from_parts(sign, magnitude::from_u128(value.unsigned_abs() as u128))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInt {
                #[inline]
                fn from(value: $t) -> Self {
                    BigInt::from_parts(Sign::Plus, magnitude::from_u128(value as u128))
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64, i128, isize);
impl_from_unsigned!(u8, u16, u32, u64, u128, usize);

// ============================================================================
// Accessors & Sign
// ============================================================================

impl BigInt {
    #[inline(always)]
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// -1, 0 or 1.
    #[inline(always)]
    pub fn signum(&self) -> i32 {
        match self.sign {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    /// Big-endian magnitude words.
    #[inline(always)]
    pub fn magnitude(&self) -> &[u32] {
        &self.mag
    }

    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.sign == Sign::NoSign
    }

    #[inline(always)]
    pub fn is_positive(&self) -> bool {
        self.sign == Sign::Plus
    }

    #[inline(always)]
    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Minus
    }

    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn abs(&self) -> BigInt {
        match self.sign {
            Sign::Minus => BigInt {
                sign: Sign::Plus,
                mag: self.mag.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Compares magnitudes, ignoring sign.
    #[inline]
    pub fn compare_magnitude(&self, other: &BigInt) -> Ordering {
        magnitude::compare(&self.mag, &other.mag)
    }

    #[inline]
    pub(crate) fn is_odd_value(&self) -> bool {
        self.mag.last().is_some_and(|w| w & 1 == 1)
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

impl BigInt {
    fn add_ref(&self, other: &BigInt) -> BigInt {
        if other.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return other.clone();
        }
        if self.sign == other.sign {
            return BigInt {
                sign: self.sign,
                mag: magnitude::add(&self.mag, &other.mag),
            };
        }
        match self.compare_magnitude(other) {
            Ordering::Equal => BigInt::ZERO,
            Ordering::Greater => {
                BigInt::from_parts(self.sign, magnitude::subtract(&self.mag, &other.mag))
            }
            Ordering::Less => {
                BigInt::from_parts(other.sign, magnitude::subtract(&other.mag, &self.mag))
            }
        }
    }

    fn sub_ref(&self, other: &BigInt) -> BigInt {
        if other.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return -other;
        }
        if self.sign != other.sign {
            return BigInt {
                sign: self.sign,
                mag: magnitude::add(&self.mag, &other.mag),
            };
        }
        match self.compare_magnitude(other) {
            Ordering::Equal => BigInt::ZERO,
            Ordering::Greater => {
                BigInt::from_parts(self.sign, magnitude::subtract(&self.mag, &other.mag))
            }
            Ordering::Less => {
                BigInt::from_parts(-self.sign, magnitude::subtract(&other.mag, &self.mag))
            }
        }
    }

    fn mul_ref(&self, other: &BigInt) -> BigInt {
        if self.is_zero() || other.is_zero() {
            return BigInt::ZERO;
        }
        if core::ptr::eq(self, other) {
            return self.square();
        }
        BigInt::from_parts(self.sign * other.sign, magnitude::multiply(&self.mag, &other.mag))
    }

    /// `self * self`, computing only half of the partial products.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn square(&self) -> BigInt {
        if self.is_zero() {
            return BigInt::ZERO;
        }
        BigInt::from_parts(Sign::Plus, magnitude::square(&self.mag))
    }

    /// Multiplies by a signed machine word.
    pub(crate) fn mul_i64(&self, v: i64) -> BigInt {
        if v == 0 || self.is_zero() {
            return BigInt::ZERO;
        }
        let sign = if v < 0 { -self.sign } else { self.sign };
        let v = v.unsigned_abs();
        let mag = if v >> 32 == 0 {
            magnitude::multiply_word(&self.mag, v as u32)
        } else {
            magnitude::multiply(&self.mag, &magnitude::from_u64(v))
        };
        BigInt::from_parts(sign, mag)
    }

    /// Truncating division with remainder. The quotient rounds toward zero
    /// and the remainder takes the sign of `self`.
    ///
    /// # Errors
    /// Returns `NumError::DivisionByZero` if `other` is zero.
    pub fn try_div_rem(&self, other: &BigInt) -> Result<(BigInt, BigInt)> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        let mut q = MutableBigInt::new();
        let a = MutableBigInt::from_mag(&self.mag);
        let b = MutableBigInt::from_mag(&other.mag);
        let r = a.divide(&b, &mut q);
        Ok((q.to_big_int(self.sign * other.sign), r.to_big_int(self.sign)))
    }

    /// Truncating division.
    ///
    /// # Errors
    /// Returns `NumError::DivisionByZero` if `other` is zero.
    #[inline]
    pub fn try_div(&self, other: &BigInt) -> Result<BigInt> {
        self.try_div_rem(other).map(|(q, _)| q)
    }

    /// Remainder of truncating division; the result takes the sign of `self`.
    ///
    /// # Errors
    /// Returns `NumError::DivisionByZero` if `other` is zero.
    #[inline]
    pub fn try_rem(&self, other: &BigInt) -> Result<BigInt> {
        self.try_div_rem(other).map(|(_, r)| r)
    }

    /// Checked division. Returns `None` if `other` is zero.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn checked_div(&self, other: &BigInt) -> Option<BigInt> {
        self.try_div(other).ok()
    }

    /// Checked remainder. Returns `None` if `other` is zero.
    #[inline]
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn checked_rem(&self, other: &BigInt) -> Option<BigInt> {
        self.try_rem(other).ok()
    }

    /// `self^exponent` by square-and-multiply.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn pow(&self, exponent: u32) -> BigInt {
        if exponent == 0 {
            return BigInt::one();
        }
        if self.is_zero() {
            return BigInt::ZERO;
        }

        let mut result = vec![1u32];
        let mut base = self.mag.clone();
        let mut e = exponent;
        while e != 0 {
            if e & 1 == 1 {
                result = magnitude::multiply(&result, &base);
            }
            e >>= 1;
            if e != 0 {
                base = magnitude::square(&base);
            }
        }

        let sign = if self.is_negative() && exponent & 1 == 1 {
            Sign::Minus
        } else {
            Sign::Plus
        };
        BigInt::from_parts(sign, result)
    }

    /// Greatest common divisor of `|self|` and `|other|`; `gcd(0, 0) == 0`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn gcd(&self, other: &BigInt) -> BigInt {
        if other.is_zero() {
            return self.abs();
        }
        if self.is_zero() {
            return other.abs();
        }
        let a = MutableBigInt::from_mag(&self.mag);
        let b = MutableBigInt::from_mag(&other.mag);
        a.hybrid_gcd(b).to_big_int(Sign::Plus)
    }

    #[inline]
    #[must_use]
    pub fn min(self, other: BigInt) -> BigInt {
        Ord::min(self, other)
    }

    #[inline]
    #[must_use]
    pub fn max(self, other: BigInt) -> BigInt {
        Ord::max(self, other)
    }
}

// ============================================================================
// Shifts
// ============================================================================

impl BigInt {
    /// `self * 2^n`. A negative `n` shifts right.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn shift_left(&self, n: i64) -> BigInt {
        if n >= 0 {
            self.shl_bits(n as u64)
        } else {
            self.shr_bits(n.unsigned_abs())
        }
    }

    /// `floor(self / 2^n)`. A negative `n` shifts left.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn shift_right(&self, n: i64) -> BigInt {
        if n >= 0 {
            self.shr_bits(n as u64)
        } else {
            self.shl_bits(n.unsigned_abs())
        }
    }

    pub(crate) fn shl_bits(&self, n: u64) -> BigInt {
        if self.is_zero() || n == 0 {
            return self.clone();
        }
        BigInt {
            sign: self.sign,
            mag: magnitude::shift_left(&self.mag, n),
        }
    }

    pub(crate) fn shr_bits(&self, n: u64) -> BigInt {
        if self.is_zero() || n == 0 {
            return self.clone();
        }
        let mut mag = magnitude::shift_right(&self.mag, n);
        // Floor for negatives: round the magnitude up if any ones were lost.
        if self.is_negative() && magnitude::has_low_bits(&self.mag, n) {
            mag = magnitude::add(&mag, &[1]);
        }
        BigInt::from_parts(self.sign, mag)
    }
}

// ============================================================================
// Two's-Complement Bit Operations
// ============================================================================

/// Infinite two's-complement view of a sign-magnitude value.
struct TwosComplement<'a> {
    mag: &'a [u32],
    negative: bool,
    first_nonzero: usize,
}

impl<'a> TwosComplement<'a> {
    fn new(x: &'a BigInt) -> Self {
        let first_nonzero = x
            .mag
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |i| x.mag.len() - 1 - i);
        Self {
            mag: &x.mag,
            negative: x.is_negative(),
            first_nonzero,
        }
    }

    /// Little-endian word `n`, sign-extended past the stored magnitude.
    #[inline]
    fn get_word(&self, n: usize) -> u32 {
        let len = self.mag.len();
        if n >= len {
            return if self.negative { u32::MAX } else { 0 };
        }
        let w = self.mag[len - 1 - n];
        if !self.negative {
            w
        } else if n <= self.first_nonzero {
            w.wrapping_neg()
        } else {
            !w
        }
    }
}

impl BigInt {
    /// Words needed for the two's-complement form, including a sign bit.
    #[inline]
    fn int_length(&self) -> usize {
        (self.bit_length() >> 5) as usize + 1
    }

    /// Little-endian word `n` of the infinite two's-complement encoding.
    #[inline]
    pub fn get_word(&self, n: usize) -> u32 {
        TwosComplement::new(self).get_word(n)
    }

    fn bitwise(&self, other: &BigInt, op: impl Fn(u32, u32) -> u32) -> BigInt {
        let len = self.int_length().max(other.int_length());
        let a = TwosComplement::new(self);
        let b = TwosComplement::new(other);
        let words = (0..len)
            .rev()
            .map(|i| op(a.get_word(i), b.get_word(i)))
            .collect();
        BigInt::from_twos_complement_words(words)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn and(&self, other: &BigInt) -> BigInt {
        self.bitwise(other, |a, b| a & b)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn or(&self, other: &BigInt) -> BigInt {
        self.bitwise(other, |a, b| a | b)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn xor(&self, other: &BigInt) -> BigInt {
        self.bitwise(other, |a, b| a ^ b)
    }

    /// `self & !other`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn and_not(&self, other: &BigInt) -> BigInt {
        self.bitwise(other, |a, b| a & !b)
    }

    fn not_ref(&self) -> BigInt {
        let t = TwosComplement::new(self);
        let words = (0..self.int_length()).rev().map(|i| !t.get_word(i)).collect();
        BigInt::from_twos_complement_words(words)
    }

    /// True if bit `n` of the two's-complement form is set.
    pub fn test_bit(&self, n: u64) -> bool {
        let w = self.get_word((n >> 5) as usize);
        (w >> (n & 31)) & 1 != 0
    }

    fn with_bit(&self, n: u64, min_words: usize, op: impl Fn(u32, u32) -> u32) -> BigInt {
        let word_num = (n >> 5) as usize;
        let bit = 1u32 << (n & 31);
        let len = self.int_length().max(min_words);
        let t = TwosComplement::new(self);
        let words = (0..len)
            .rev()
            .map(|i| {
                let w = t.get_word(i);
                if i == word_num { op(w, bit) } else { w }
            })
            .collect();
        BigInt::from_twos_complement_words(words)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn set_bit(&self, n: u64) -> BigInt {
        self.with_bit(n, (n >> 5) as usize + 2, |w, bit| w | bit)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn clear_bit(&self, n: u64) -> BigInt {
        self.with_bit(n, ((n + 1) >> 5) as usize + 1, |w, bit| w & !bit)
    }

    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn flip_bit(&self, n: u64) -> BigInt {
        self.with_bit(n, ((n + 1) >> 5) as usize + 1, |w, bit| w ^ bit)
    }

    /// Index of the lowest set bit, `None` for zero.
    pub fn lowest_set_bit(&self) -> Option<u64> {
        let j = self.mag.iter().rposition(|&w| w != 0)?;
        let words_below = (self.mag.len() - 1 - j) as u64;
        Some((words_below << 5) + self.mag[j].trailing_zeros() as u64)
    }

    /// Bits in the minimal two's-complement form, excluding the sign bit.
    pub fn bit_length(&self) -> u64 {
        let mag_bits = magnitude::bit_length(&self.mag);
        if self.is_negative() && self.is_power_of_two_magnitude() {
            mag_bits - 1
        } else {
            mag_bits
        }
    }

    fn is_power_of_two_magnitude(&self) -> bool {
        self.mag[0].count_ones() == 1 && self.mag[1..].iter().all(|&w| w == 0)
    }

    /// Bits of the two's-complement form that differ from the sign bit.
    pub fn bit_count(&self) -> u64 {
        let ones: u64 = self.mag.iter().map(|w| w.count_ones() as u64).sum();
        match self.lowest_set_bit() {
            Some(tz) if self.is_negative() => ones + tz - 1,
            _ => ones,
        }
    }
}

// ============================================================================
// Byte Conversions
// ============================================================================

impl BigInt {
    /// Minimal big-endian two's-complement bytes (at least one byte).
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        let byte_len = (self.bit_length() / 8 + 1) as usize;
        let t = TwosComplement::new(self);
        let mut out = vec![0u8; byte_len];
        let mut next = 0u32;
        for (i, slot) in out.iter_mut().rev().enumerate() {
            if i % 4 == 0 {
                next = t.get_word(i / 4);
            } else {
                next >>= 8;
            }
            *slot = next as u8;
        }
        out
    }

    /// Sign and big-endian magnitude bytes without leading zeros.
    pub fn to_bytes_be(&self) -> (Sign, Vec<u8>) {
        let mut out = Vec::with_capacity(self.mag.len() * 4);
        for w in &self.mag {
            out.extend_from_slice(&w.to_be_bytes());
        }
        let start = out.iter().position(|&b| b != 0).unwrap_or(out.len());
        out.drain(..start);
        (self.sign, out)
    }
}

// ============================================================================
// Primitive Conversions
// ============================================================================

impl BigInt {
    /// Low 64 bits of the two's-complement form.
    #[inline]
    pub fn to_i64_wrapping(&self) -> i64 {
        let t = TwosComplement::new(self);
        (((t.get_word(1) as u64) << 32) | t.get_word(0) as u64) as i64
    }

    /// Low 32 bits of the two's-complement form.
    #[inline]
    pub fn to_i32_wrapping(&self) -> i32 {
        self.get_word(0) as i32
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// Returns `NumError::Overflow` if the value does not fit an `i64`.
    pub fn try_to_i64(&self) -> Result<i64> {
        if self.bit_length() <= 63 {
            Ok(self.to_i64_wrapping())
        } else {
            Err(NumError::Overflow)
        }
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// Returns `NumError::Overflow` if the value does not fit an `i32`.
    pub fn try_to_i32(&self) -> Result<i32> {
        if self.bit_length() <= 31 {
            Ok(self.to_i32_wrapping())
        } else {
            Err(NumError::Overflow)
        }
    }

    /// Nearest `f64`, through the decimal string form.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Nearest `f32`, through the decimal string form.
    pub fn to_f32(&self) -> f32 {
        self.to_string().parse().unwrap_or(f32::NAN)
    }
}

impl ToPrimitive for BigInt {
    fn to_i64(&self) -> Option<i64> {
        self.try_to_i64().ok()
    }

    fn to_u64(&self) -> Option<u64> {
        if self.is_negative() {
            return None;
        }
        magnitude::to_u64(&self.mag)
    }

    fn to_i128(&self) -> Option<i128> {
        if self.bit_length() > 127 {
            return None;
        }
        let v = self.mag.iter().fold(0u128, |acc, &w| (acc << 32) | w as u128) as i128;
        Some(if self.is_negative() { v.wrapping_neg() } else { v })
    }

    fn to_u128(&self) -> Option<u128> {
        if self.is_negative() || self.mag.len() > 4 {
            return None;
        }
        Some(self.mag.iter().fold(0u128, |acc, &w| (acc << 32) | w as u128))
    }

    fn to_f64(&self) -> Option<f64> {
        Some(BigInt::to_f64(self))
    }

    fn to_f32(&self) -> Option<f32> {
        Some(BigInt::to_f32(self))
    }
}

impl FromPrimitive for BigInt {
    fn from_i64(n: i64) -> Option<Self> {
        Some(BigInt::from(n))
    }

    fn from_u64(n: u64) -> Option<Self> {
        Some(BigInt::from(n))
    }

    fn from_i128(n: i128) -> Option<Self> {
        Some(BigInt::from(n))
    }

    fn from_u128(n: u128) -> Option<Self> {
        Some(BigInt::from(n))
    }

    /// Truncates toward zero; `None` for NaN and infinities.
    fn from_f64(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        let n = n.trunc();
        if n.abs() < 9.223_372_036_854_775_807e18 {
            return Some(BigInt::from(n as i64));
        }
        let bits = n.to_bits();
        let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
        let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
        let v = BigInt::from(mantissa).shift_left(exponent);
        Some(if n < 0.0 { -v } else { v })
    }
}

// ============================================================================
// Radix Formatting
// ============================================================================

impl BigInt {
    /// Digits in the given radix with a leading `-` for negatives.
    ///
    /// A radix outside `2..=36` formats in base 10.
    pub fn to_str_radix(&self, radix: u32) -> String {
        let radix = if check_radix(radix).is_ok() { radix } else { 10 };
        let mut out = String::new();
        if self.is_negative() {
            out.push('-');
        }
        self.write_digits(radix, &mut out);
        out
    }

    /// Appends the digits of `|self|`.
    pub(crate) fn write_digits(&self, radix: u32, out: &mut String) {
        if self.is_zero() {
            out.push('0');
            return;
        }

        let (group_len, super_radix) = RADIX_GROUPS[radix as usize];
        let mut groups = Vec::new();
        let mut cur = MutableBigInt::from_mag(&self.mag);
        let mut q = MutableBigInt::new();
        while !cur.is_zero() {
            groups.push(cur.divide_one_word(super_radix, &mut q));
            core::mem::swap(&mut cur, &mut q);
        }

        out.reserve(groups.len() * group_len as usize);
        let mut groups = groups.into_iter().rev();
        if let Some(top) = groups.next() {
            push_word_digits(out, top, radix, 0);
        }
        for g in groups {
            push_word_digits(out, g, radix, group_len as usize);
        }
    }
}

fn push_word_digits(out: &mut String, mut w: u32, radix: u32, pad: usize) {
    let mut buf = [0u8; 32];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = char::from_digit(w % radix, radix).map_or(b'0', |c| c as u8);
        w /= radix;
        if w == 0 {
            break;
        }
    }
    let digits = buf.len() - pos;
    for _ in digits..pad {
        out.push('0');
    }
    for &b in &buf[pos..] {
        out.push(b as char);
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = String::new();
        self.write_digits(10, &mut digits);
        f.pad_integral(!self.is_negative(), "", &digits)
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("BigInt")
                .field("sign", &self.sign)
                .field("mag", &self.mag)
                .finish()
        } else {
            write!(f, "BigInt({})", self)
        }
    }
}

impl fmt::LowerHex for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = String::new();
        self.write_digits(16, &mut digits);
        f.pad_integral(!self.is_negative(), "0x", &digits)
    }
}

impl fmt::Binary for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = String::new();
        self.write_digits(2, &mut digits);
        f.pad_integral(!self.is_negative(), "0b", &digits)
    }
}

impl FromStr for BigInt {
    type Err = NumError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        BigInt::from_str_radix(s, 10)
    }
}

// ============================================================================
// Ordering
// ============================================================================

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.sign.cmp(&other.sign) {
            Ordering::Equal => match self.sign {
                Sign::Plus => self.compare_magnitude(other),
                Sign::Minus => other.compare_magnitude(self),
                Sign::NoSign => Ordering::Equal,
            },
            ord => ord,
        }
    }
}

impl PartialOrd for BigInt {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// Operator Overloading
// ============================================================================

impl Add<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn add(self, rhs: &BigInt) -> BigInt {
        self.add_ref(rhs)
    }
}

impl Sub<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn sub(self, rhs: &BigInt) -> BigInt {
        self.sub_ref(rhs)
    }
}

impl Mul<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn mul(self, rhs: &BigInt) -> BigInt {
        self.mul_ref(rhs)
    }
}

impl Div<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn div(self, rhs: &BigInt) -> BigInt {
        self.try_div(rhs).expect("attempt to divide by zero")
    }
}

impl Rem<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn rem(self, rhs: &BigInt) -> BigInt {
        self.try_rem(rhs)
            .expect("attempt to calculate the remainder with a divisor of zero")
    }
}

impl BitAnd<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn bitand(self, rhs: &BigInt) -> BigInt {
        self.and(rhs)
    }
}

impl BitOr<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn bitor(self, rhs: &BigInt) -> BigInt {
        self.or(rhs)
    }
}

impl BitXor<&BigInt> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn bitxor(self, rhs: &BigInt) -> BigInt {
        self.xor(rhs)
    }
}

forward_all_binop!(impl Add for BigInt, add);
forward_all_binop!(impl Sub for BigInt, sub);
forward_all_binop!(impl Mul for BigInt, mul);
forward_all_binop!(impl Div for BigInt, div);
forward_all_binop!(impl Rem for BigInt, rem);
forward_all_binop!(impl BitAnd for BigInt, bitand);
forward_all_binop!(impl BitOr for BigInt, bitor);
forward_all_binop!(impl BitXor for BigInt, bitxor);

forward_op_assign!(impl AddAssign for BigInt, add_assign, add);
forward_op_assign!(impl SubAssign for BigInt, sub_assign, sub);
forward_op_assign!(impl MulAssign for BigInt, mul_assign, mul);
forward_op_assign!(impl DivAssign for BigInt, div_assign, div);
forward_op_assign!(impl RemAssign for BigInt, rem_assign, rem);

impl Neg for BigInt {
    type Output = BigInt;

    #[inline]
    fn neg(mut self) -> BigInt {
        self.sign = -self.sign;
        self
    }
}

impl Neg for &BigInt {
    type Output = BigInt;

    #[inline]
    fn neg(self) -> BigInt {
        -self.clone()
    }
}

impl Not for BigInt {
    type Output = BigInt;

    #[inline]
    fn not(self) -> BigInt {
        self.not_ref()
    }
}

impl Not for &BigInt {
    type Output = BigInt;

    #[inline]
    fn not(self) -> BigInt {
        self.not_ref()
    }
}

impl Shl<u32> for BigInt {
    type Output = BigInt;

    #[inline]
    fn shl(self, rhs: u32) -> BigInt {
        self.shl_bits(rhs as u64)
    }
}

impl Shl<u32> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn shl(self, rhs: u32) -> BigInt {
        self.shl_bits(rhs as u64)
    }
}

impl Shr<u32> for BigInt {
    type Output = BigInt;

    #[inline]
    fn shr(self, rhs: u32) -> BigInt {
        self.shr_bits(rhs as u64)
    }
}

impl Shr<u32> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn shr(self, rhs: u32) -> BigInt {
        self.shr_bits(rhs as u64)
    }
}

// ============================================================================
// num-traits / num-integer
// ============================================================================

impl Zero for BigInt {
    #[inline]
    fn zero() -> Self {
        BigInt::ZERO
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.sign == Sign::NoSign
    }
}

impl One for BigInt {
    #[inline]
    fn one() -> Self {
        BigInt {
            sign: Sign::Plus,
            mag: vec![1],
        }
    }
}

impl Num for BigInt {
    type FromStrRadixErr = NumError;

    fn from_str_radix(s: &str, radix: u32) -> Result<Self> {
        BigInt::from_str_radix(s, radix)
    }
}

impl Signed for BigInt {
    fn abs(&self) -> Self {
        BigInt::abs(self)
    }

    fn abs_sub(&self, other: &Self) -> Self {
        if self <= other {
            BigInt::ZERO
        } else {
            self - other
        }
    }

    fn signum(&self) -> Self {
        BigInt::from(BigInt::signum(self))
    }

    fn is_positive(&self) -> bool {
        BigInt::is_positive(self)
    }

    fn is_negative(&self) -> bool {
        BigInt::is_negative(self)
    }
}

impl Pow<u32> for BigInt {
    type Output = BigInt;

    #[inline]
    fn pow(self, rhs: u32) -> BigInt {
        BigInt::pow(&self, rhs)
    }
}

impl Pow<u32> for &BigInt {
    type Output = BigInt;

    #[inline]
    fn pow(self, rhs: u32) -> BigInt {
        BigInt::pow(self, rhs)
    }
}

impl Integer for BigInt {
    fn div_floor(&self, other: &Self) -> Self {
        let (q, r) = self.div_rem(other);
        if !r.is_zero() && r.sign != other.sign {
            q - BigInt::one()
        } else {
            q
        }
    }

    fn mod_floor(&self, other: &Self) -> Self {
        let r = self % other;
        if !r.is_zero() && r.sign != other.sign {
            r + other
        } else {
            r
        }
    }

    fn gcd(&self, other: &Self) -> Self {
        BigInt::gcd(self, other)
    }

    fn lcm(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return BigInt::ZERO;
        }
        let g = BigInt::gcd(self, other);
        (self / &g * other).abs()
    }

    fn is_multiple_of(&self, other: &Self) -> bool {
        if other.is_zero() {
            return self.is_zero();
        }
        (self % other).is_zero()
    }

    fn is_even(&self) -> bool {
        !self.is_odd_value()
    }

    fn is_odd(&self) -> bool {
        self.is_odd_value()
    }

    fn div_rem(&self, other: &Self) -> (Self, Self) {
        self.try_div_rem(other).expect("attempt to divide by zero")
    }
}

// ============================================================================
// Iterator Trait Implementations
// ============================================================================

impl Sum for BigInt {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BigInt::ZERO, |acc, x| &acc + &x)
    }
}

impl<'a> Sum<&'a BigInt> for BigInt {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(BigInt::ZERO, |acc, x| &acc + x)
    }
}

impl Product for BigInt {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BigInt::one(), |acc, x| &acc * &x)
    }
}

impl<'a> Product<&'a BigInt> for BigInt {
    fn product<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(BigInt::one(), |acc, x| &acc * x)
    }
}

// ============================================================================
// Serde Support
// ============================================================================

#[cfg(feature = "serde")]
impl Serialize for BigInt {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.to_signed_bytes_be().serialize(serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            BigInt::from_signed_bytes_be(&bytes).map_err(de::Error::custom)
        }
    }
}
