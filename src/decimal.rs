//! Arbitrary-precision signed decimal numbers.
//!
//! A [`Decimal`] is an unscaled integer and a 32-bit scale; its value is
//! `unscaled * 10^-scale`. Unscaled values that fit an `i64` are kept
//! compact and only materialized as a [`BigInt`] on demand.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::{Product, Sum};
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;
use std::borrow::Cow;
use std::sync::OnceLock;

use num_traits::{One, Zero};
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::bigint::{BigInt, Sign};
use crate::context::{MathContext, RoundingMode};
use crate::magnitude;
use crate::mutable::MutableBigInt;
use crate::pow10::{
    LONG_TEN_POWERS, big_digit_length, big_multiply_power_ten, big_ten_to_the, long_digit_length,
    long_multiply_power_ten,
};
use crate::{NumError, Result};

/// Marks an unscaled value that only lives in `int_val`.
const INFLATED: i64 = i64::MIN;

/// Largest exponent magnitude accepted by [`Decimal::pow`].
const MAX_POW: u32 = 999_999_999;

/// Immutable arbitrary-precision decimal.
///
/// Equality and hashing are by representation: `2.0` and `2.00` are
/// different values that compare equal under [`Decimal::compare_to`].
#[derive(Clone)]
pub struct Decimal {
    int_compact: i64,
    int_val: OnceLock<BigInt>,
    scale: i32,
    precision: OnceLock<u32>,
    string_cache: OnceLock<String>,
}

// ============================================================================
// Constants
// ============================================================================

impl Decimal {
    /// Zero, scale 0
    pub const ZERO: Decimal = Decimal::from_compact(0, 0);

    /// One, scale 0
    pub const ONE: Decimal = Decimal::from_compact(1, 0);

    /// Ten, scale 0
    pub const TEN: Decimal = Decimal::from_compact(10, 0);
}

// ============================================================================
// Construction
// ============================================================================

impl Decimal {
    #[inline(always)]
    const fn from_compact(unscaled: i64, scale: i32) -> Self {
        Self {
            int_compact: unscaled,
            int_val: OnceLock::new(),
            scale,
            precision: OnceLock::new(),
            string_cache: OnceLock::new(),
        }
    }

    /// `unscaled * 10^-scale`.
    pub fn new(unscaled: BigInt, scale: i32) -> Self {
        Self {
            int_compact: compact_val_for(&unscaled),
            int_val: OnceLock::from(unscaled),
            scale,
            precision: OnceLock::new(),
            string_cache: OnceLock::new(),
        }
    }

    /// `unscaled * 10^-scale` from a machine word.
    #[inline]
    pub fn from_i64_scaled(unscaled: i64, scale: i32) -> Self {
        if unscaled == INFLATED {
            Self::new(BigInt::from(unscaled), scale)
        } else {
            Self::from_compact(unscaled, scale)
        }
    }

    /// `unscaled * 10^-scale`, rounded to `mc`.
    ///
    /// # Errors
    /// Fails if rounding is needed under [`RoundingMode::Unnecessary`] or the
    /// rounded scale leaves the `i32` range.
    pub fn from_bigint_rounded(unscaled: BigInt, scale: i32, mc: &MathContext) -> Result<Self> {
        Self::new(unscaled, scale).do_round(mc)
    }

    /// An integer rounded to `mc`.
    ///
    /// # Errors
    /// See [`Decimal::from_bigint_rounded`].
    pub fn from_i64_rounded(value: i64, mc: &MathContext) -> Result<Self> {
        Self::from_i64_scaled(value, 0).do_round(mc)
    }

    /// Parses `s` and rounds the result to `mc`.
    ///
    /// # Errors
    /// Any parse error, or a rounding failure as in
    /// [`Decimal::from_bigint_rounded`].
    pub fn from_str_rounded(s: &str, mc: &MathContext) -> Result<Self> {
        s.parse::<Decimal>()?.do_round(mc)
    }

    #[inline(always)]
    fn zero_with_scale(scale: i32) -> Self {
        Self::from_compact(0, scale)
    }

    /// Same unscaled value at another scale.
    fn with_scale(&self, scale: i32) -> Self {
        Self {
            int_compact: self.int_compact,
            int_val: self.int_val.clone(),
            scale,
            precision: self.precision.clone(),
            string_cache: OnceLock::new(),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Decimal {
                #[inline]
                fn from(value: $t) -> Self {
                    Decimal::from_i64_scaled(value as i64, 0)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Decimal::from_i64_scaled(v, 0),
            Err(_) => Decimal::new(BigInt::from(value), 0),
        }
    }
}

impl From<BigInt> for Decimal {
    #[inline]
    fn from(value: BigInt) -> Self {
        Decimal::new(value, 0)
    }
}

impl TryFrom<f64> for Decimal {
    type Error = NumError;

    /// Converts through the shortest decimal string that round-trips the
    /// float, so `0.1` becomes exactly `0.1`.
    ///
    /// # Errors
    /// Returns `NumError::InvalidOperation` for NaN and infinities.
    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(NumError::InvalidOperation);
        }
        format!("{value:?}").parse()
    }
}

impl TryFrom<f32> for Decimal {
    type Error = NumError;

    fn try_from(value: f32) -> Result<Self> {
        if !value.is_finite() {
            return Err(NumError::InvalidOperation);
        }
        format!("{value:?}").parse()
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Decimal {
    #[inline(always)]
    pub const fn scale(&self) -> i32 {
        self.scale
    }

    /// Number of digits in the unscaled value; zero has precision 1.
    pub fn precision(&self) -> u32 {
        *self.precision.get_or_init(|| match self.compact() {
            Some(v) => long_digit_length(v),
            None => big_digit_length(self.inflated()),
        })
    }

    /// -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        match self.compact() {
            Some(v) => v.signum() as i32,
            None => self.inflated().signum(),
        }
    }

    pub fn unscaled_value(&self) -> BigInt {
        self.inflated().clone()
    }

    /// One unit in the last place: `1 * 10^-scale`.
    #[inline]
    pub fn ulp(&self) -> Decimal {
        Decimal::from_compact(1, self.scale)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.signum() == 0
    }

    #[inline(always)]
    fn compact(&self) -> Option<i64> {
        (self.int_compact != INFLATED).then_some(self.int_compact)
    }

    #[inline]
    fn inflated(&self) -> &BigInt {
        self.int_val.get_or_init(|| BigInt::from(self.int_compact))
    }

    #[inline]
    fn operand(&self) -> Operand<'_> {
        match self.compact() {
            Some(v) => Operand::Long(v),
            None => Operand::Big(self.inflated()),
        }
    }
}

// ============================================================================
// Internal Helpers
// ============================================================================

/// Borrowed unscaled value fed to the shared division routine.
#[derive(Clone, Copy)]
enum Operand<'a> {
    Long(i64),
    Big(&'a BigInt),
}

impl<'a> Operand<'a> {
    fn to_big(self) -> Cow<'a, BigInt> {
        match self {
            Operand::Long(v) => Cow::Owned(BigInt::from(v)),
            Operand::Big(b) => Cow::Borrowed(b),
        }
    }
}

/// The compact form of `b`, or `INFLATED` if it does not fit.
fn compact_val_for(b: &BigInt) -> i64 {
    match magnitude::to_u64(b.magnitude()) {
        Some(m) if m <= i64::MAX as u64 => {
            if b.is_negative() {
                -(m as i64)
            } else {
                m as i64
            }
        }
        _ => INFLATED,
    }
}

/// Narrows a computed scale to `i32`.
///
/// Zero values clamp; anything else out of range fails with `Overflow`
/// (scale too small, value too large) or `Underflow`.
fn check_scale(is_zero: bool, val: i64) -> Result<i32> {
    if let Ok(v) = i32::try_from(val) {
        return Ok(v);
    }
    if is_zero {
        Ok(if val > 0 { i32::MAX } else { i32::MIN })
    } else if val > 0 {
        Err(NumError::Underflow)
    } else {
        Err(NumError::Overflow)
    }
}

#[inline]
fn saturate(val: i64) -> i32 {
    val.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// `dividend / divisor` at `scale`, rounded per `mode`.
///
/// An exact quotient has trailing zeros stripped until its scale reaches
/// `preferred`.
fn divide_and_round(
    dividend: Operand<'_>,
    divisor: Operand<'_>,
    scale: i32,
    mode: RoundingMode,
    preferred: i64,
) -> Result<Decimal> {
    if let (Operand::Long(x), Operand::Long(y)) = (dividend, divisor) {
        let q = x / y;
        let r = x % y;
        let qsign: i64 = if (x < 0) == (y < 0) { 1 } else { -1 };
        if r != 0 {
            let cmp_half = (r.unsigned_abs() as u128 * 2).cmp(&(y.unsigned_abs() as u128));
            let inc = mode.should_increment(qsign as i32, cmp_half, q & 1 != 0)?;
            return Ok(Decimal::from_i64_scaled(if inc { q + qsign } else { q }, scale));
        }
        let q = Decimal::from_i64_scaled(q, scale);
        return if preferred != scale as i64 {
            q.strip_zeros_to_match_scale(preferred)
        } else {
            Ok(q)
        };
    }

    let x = dividend.to_big();
    let y = divisor.to_big();
    let mdividend = MutableBigInt::from_mag(x.magnitude());
    let mdivisor = MutableBigInt::from_mag(y.magnitude());
    let mut mq = MutableBigInt::new();
    let mr = mdividend.divide(&mdivisor, &mut mq);
    let sign = x.sign() * y.sign();

    if !mr.is_zero() {
        let qsign = if sign == Sign::Minus { -1 } else { 1 };
        if mode.should_increment(qsign, mr.compare_half(&mdivisor), mq.is_odd())? {
            mq.add(&MutableBigInt::from_word(1));
        }
        return Ok(Decimal::new(mq.to_big_int(sign), scale));
    }
    let q = Decimal::new(mq.to_big_int(sign), scale);
    if preferred != scale as i64 {
        q.strip_zeros_to_match_scale(preferred)
    } else {
        Ok(q)
    }
}

impl Decimal {
    /// Rounds to `mc.precision()` digits. Rounding can carry into a new
    /// digit (`999 -> 1000`), hence the loop.
    fn do_round(self, mc: &MathContext) -> Result<Decimal> {
        let mcp = mc.precision() as i64;
        if mcp == 0 {
            return Ok(self);
        }
        let mut d = self;
        loop {
            let drop = d.precision() as i64 - mcp;
            if drop <= 0 {
                return Ok(d);
            }
            let scale = check_scale(d.is_zero(), d.scale as i64 - drop)?;
            d = d.drop_digits(drop as u32, scale, mc.rounding_mode())?;
        }
    }

    /// Divides the unscaled value by `10^drop` and labels it `new_scale`.
    fn drop_digits(&self, drop: u32, new_scale: i32, mode: RoundingMode) -> Result<Decimal> {
        if drop > self.precision() {
            // every digit is discarded and the fraction is below one half
            let signum = self.signum();
            let inc = signum != 0 && mode.should_increment(signum, Ordering::Less, false)?;
            return Ok(Decimal::from_compact(if inc { signum as i64 } else { 0 }, new_scale));
        }
        let preferred = new_scale as i64;
        if (drop as usize) < LONG_TEN_POWERS.len() {
            let divisor = Operand::Long(LONG_TEN_POWERS[drop as usize]);
            divide_and_round(self.operand(), divisor, new_scale, mode, preferred)
        } else {
            let divisor = big_ten_to_the(drop);
            divide_and_round(self.operand(), Operand::Big(&divisor), new_scale, mode, preferred)
        }
    }

    /// Multiplies the unscaled value by `10^raise` and labels it `new_scale`.
    fn upscale(&self, raise: u32, new_scale: i32) -> Decimal {
        match self.compact() {
            Some(c) => match long_multiply_power_ten(c, raise) {
                Some(v) => Decimal::from_i64_scaled(v, new_scale),
                None => Decimal::new(big_multiply_power_ten(&BigInt::from(c), raise), new_scale),
            },
            None => Decimal::new(big_multiply_power_ten(self.inflated(), raise), new_scale),
        }
    }

    /// Removes trailing zero digits while the scale stays above `preferred`.
    fn strip_zeros_to_match_scale(self, preferred: i64) -> Result<Decimal> {
        if let Some(mut v) = self.compact() {
            let mut scale = self.scale;
            while v.unsigned_abs() >= 10 && scale as i64 > preferred {
                if v & 1 != 0 || v % 10 != 0 {
                    break;
                }
                v /= 10;
                scale = check_scale(false, scale as i64 - 1)?;
            }
            return Ok(Decimal::from_i64_scaled(v, scale));
        }

        let ten = BigInt::from(10);
        let mut v = self.inflated().clone();
        let mut scale = self.scale;
        while v.compare_magnitude(&ten).is_ge() && scale as i64 > preferred {
            if v.is_odd_value() {
                break;
            }
            let (q, r) = v.try_div_rem(&ten)?;
            if !r.is_zero() {
                break;
            }
            v = q;
            scale = check_scale(false, scale as i64 - 1)?;
        }
        Ok(Decimal::new(v, scale))
    }
}

// ============================================================================
// Addition, Subtraction, Multiplication
// ============================================================================

fn add_aligned(x: Operand<'_>, y: Operand<'_>, scale: i32) -> Decimal {
    if let (Operand::Long(a), Operand::Long(b)) = (x, y) {
        if let Some(sum) = a.checked_add(b) {
            return Decimal::from_i64_scaled(sum, scale);
        }
    }
    Decimal::new(x.to_big().as_ref() + y.to_big().as_ref(), scale)
}

impl Decimal {
    /// Exact sum; the result scale is the larger of the two scales.
    ///
    /// # Errors
    /// Returns `Underflow` if aligning the scales needs more than `i32::MAX`
    /// extra digits.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_add(&self, augend: &Decimal) -> Result<Decimal> {
        match self.scale.cmp(&augend.scale) {
            Ordering::Equal => Ok(add_aligned(self.operand(), augend.operand(), self.scale)),
            Ordering::Less => {
                let raise = check_scale(self.is_zero(), augend.scale as i64 - self.scale as i64)?;
                let x = self.upscale(raise as u32, augend.scale);
                Ok(add_aligned(x.operand(), augend.operand(), augend.scale))
            }
            Ordering::Greater => {
                let raise = check_scale(augend.is_zero(), self.scale as i64 - augend.scale as i64)?;
                let y = augend.upscale(raise as u32, self.scale);
                Ok(add_aligned(self.operand(), y.operand(), self.scale))
            }
        }
    }

    /// Sum rounded to `mc`.
    ///
    /// When one operand lies entirely below the rounding position of the
    /// other it is condensed to a single sticky digit first, so adding
    /// `1E+1000000` and `1E-1000000` does not materialize two million digits.
    ///
    /// # Errors
    /// Scale overflow, or `RoundingNecessary` under
    /// [`RoundingMode::Unnecessary`].
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_add_ctx(&self, augend: &Decimal, mc: &MathContext) -> Result<Decimal> {
        if mc.is_unlimited() {
            return self.try_add(augend);
        }
        let lhs_is_zero = self.is_zero();
        let augend_is_zero = augend.is_zero();

        if lhs_is_zero || augend_is_zero {
            let preferred = self.scale.max(augend.scale);
            if lhs_is_zero && augend_is_zero {
                return Ok(Decimal::zero_with_scale(preferred));
            }
            let nonzero = if lhs_is_zero { augend } else { self };
            let result = nonzero.clone().do_round(mc)?;
            return match result.scale.cmp(&preferred) {
                Ordering::Equal => Ok(result),
                Ordering::Greater => result.strip_zeros_to_match_scale(preferred as i64),
                Ordering::Less => {
                    let precision_diff = mc.precision() as i64 - result.precision() as i64;
                    let scale_diff = preferred as i64 - result.scale as i64;
                    let target = if precision_diff >= scale_diff {
                        preferred
                    } else {
                        (result.scale as i64 + precision_diff) as i32
                    };
                    result.set_scale(target, RoundingMode::Unnecessary)
                }
            };
        }

        let padding = self.scale as i64 - augend.scale as i64;
        if padding == 0 {
            return self.try_add(augend)?.do_round(mc);
        }
        let (big, small) = if padding < 0 {
            (self, augend)
        } else {
            (augend, self)
        };
        let est_result_ulp_scale = big.scale as i64 - big.precision() as i64 + mc.precision() as i64;
        let small_high_digit_pos = small.scale as i64 - small.precision() as i64 + 1;
        if small_high_digit_pos > big.scale as i64 + 2
            && small_high_digit_pos > est_result_ulp_scale + 2
        {
            let sticky_scale = check_scale(false, (big.scale as i64).max(est_result_ulp_scale) + 3)?;
            let sticky = Decimal::from_compact(small.signum() as i64, sticky_scale);
            return big.try_add(&sticky)?.do_round(mc);
        }
        big.try_add(small)?.do_round(mc)
    }

    /// Exact difference; the result scale is the larger of the two scales.
    ///
    /// # Errors
    /// See [`Decimal::try_add`].
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_sub(&self, subtrahend: &Decimal) -> Result<Decimal> {
        self.try_add(&-subtrahend)
    }

    /// Difference rounded to `mc`.
    ///
    /// # Errors
    /// See [`Decimal::try_add_ctx`].
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_sub_ctx(&self, subtrahend: &Decimal, mc: &MathContext) -> Result<Decimal> {
        self.try_add_ctx(&-subtrahend, mc)
    }

    /// Exact product; the result scale is the sum of the scales.
    ///
    /// # Errors
    /// Returns `Overflow` or `Underflow` if the summed scale leaves the `i32`
    /// range.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_mul(&self, multiplicand: &Decimal) -> Result<Decimal> {
        let scale = check_scale(
            self.is_zero() || multiplicand.is_zero(),
            self.scale as i64 + multiplicand.scale as i64,
        )?;
        if let (Some(x), Some(y)) = (self.compact(), multiplicand.compact()) {
            if let Some(p) = x.checked_mul(y) {
                return Ok(Decimal::from_i64_scaled(p, scale));
            }
        }
        Ok(Decimal::new(self.inflated() * multiplicand.inflated(), scale))
    }

    /// Product rounded to `mc`.
    ///
    /// # Errors
    /// See [`Decimal::try_mul`]; also `RoundingNecessary`.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_mul_ctx(&self, multiplicand: &Decimal, mc: &MathContext) -> Result<Decimal> {
        self.try_mul(multiplicand)?.do_round(mc)
    }
}

// ============================================================================
// Division
// ============================================================================

#[inline]
fn zero_divisor_error(dividend: &Decimal) -> NumError {
    if dividend.is_zero() {
        NumError::DivisionUndefined
    } else {
        NumError::DivisionByZero
    }
}

impl Decimal {
    /// Quotient at an explicit `scale`, rounded per `mode`.
    ///
    /// # Errors
    /// `DivisionByZero` (or `DivisionUndefined` for `0 / 0`),
    /// `RoundingNecessary`, or scale overflow.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn div_with_scale(&self, divisor: &Decimal, scale: i32, mode: RoundingMode) -> Result<Decimal> {
        if divisor.is_zero() {
            return Err(zero_divisor_error(self));
        }
        let preferred = scale as i64;
        let dividend_scale = check_scale(self.is_zero(), scale as i64 + divisor.scale as i64)?;
        if dividend_scale > self.scale {
            let dividend = self.set_scale(dividend_scale, RoundingMode::Unnecessary)?;
            divide_and_round(dividend.operand(), divisor.operand(), scale, mode, preferred)
        } else {
            let divisor_scale = check_scale(divisor.is_zero(), self.scale as i64 - scale as i64)?;
            let divisor = divisor.set_scale(divisor_scale, RoundingMode::Unnecessary)?;
            divide_and_round(self.operand(), divisor.operand(), scale, mode, preferred)
        }
    }

    /// Quotient at `self.scale()`, rounded per `mode`.
    ///
    /// # Errors
    /// See [`Decimal::div_with_scale`].
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn div_rounded(&self, divisor: &Decimal, mode: RoundingMode) -> Result<Decimal> {
        self.div_with_scale(divisor, self.scale, mode)
    }

    /// Exact quotient, with preferred scale `self.scale() - divisor.scale()`.
    ///
    /// # Errors
    /// `NonTerminatingDecimal` if the quotient has no finite decimal
    /// expansion, plus the division-by-zero errors.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_div(&self, divisor: &Decimal) -> Result<Decimal> {
        if divisor.is_zero() {
            return Err(zero_divisor_error(self));
        }
        let preferred = saturate(self.scale as i64 - divisor.scale as i64);
        if self.is_zero() {
            return Ok(Decimal::zero_with_scale(preferred));
        }
        // a terminating quotient never needs more digits than this
        let digits = self.precision() as u64 + (10 * divisor.precision() as u64).div_ceil(3);
        let mc = MathContext::with_rounding(
            digits.min(i32::MAX as u64) as u32,
            RoundingMode::Unnecessary,
        );
        let quotient = self.try_div_ctx(divisor, &mc).map_err(|e| match e {
            NumError::RoundingNecessary => NumError::NonTerminatingDecimal,
            e => e,
        })?;
        if preferred > quotient.scale {
            quotient.set_scale(preferred, RoundingMode::Unnecessary)
        } else {
            Ok(quotient)
        }
    }

    /// Quotient rounded to `mc`; an unlimited context means [`Decimal::try_div`].
    ///
    /// # Errors
    /// Division by zero, `RoundingNecessary`, or scale overflow.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_div_ctx(&self, divisor: &Decimal, mc: &MathContext) -> Result<Decimal> {
        if mc.is_unlimited() {
            return self.try_div(divisor);
        }
        if divisor.is_zero() {
            return Err(zero_divisor_error(self));
        }
        let preferred = self.scale as i64 - divisor.scale as i64;
        if self.is_zero() {
            return Ok(Decimal::zero_with_scale(saturate(preferred)));
        }

        // Normalize both operands into [0.1, 1) and keep the dividend
        // strictly below the divisor, so the quotient has exactly `mcp`
        // digits before rounding.
        let mcp = mc.precision() as i64;
        let xscale = self.precision() as i64;
        let mut yscale = divisor.precision() as i64;
        let xnorm = self.with_scale(i32::try_from(xscale).map_err(|_| NumError::Overflow)?);
        let ynorm = divisor.with_scale(i32::try_from(yscale).map_err(|_| NumError::Overflow)?);
        if xnorm.compare_magnitude(&ynorm).is_gt() {
            yscale -= 1;
        }

        let scl = check_scale(false, preferred + yscale - xscale + mcp)?;
        let preferred = check_scale(false, preferred)? as i64;
        let mode = mc.rounding_mode();
        let raise = mcp + yscale - xscale;
        let quotient = if raise > 0 {
            let raise = check_scale(false, raise)? as u32;
            let dividend = self.upscale(raise, 0);
            divide_and_round(dividend.operand(), divisor.operand(), scl, mode, preferred)?
        } else {
            let raise = check_scale(false, xscale - mcp - yscale)? as u32;
            let divisor = divisor.upscale(raise, 0);
            divide_and_round(self.operand(), divisor.operand(), scl, mode, preferred)?
        };
        quotient.do_round(mc)
    }

    /// Integer part of the exact quotient, with preferred scale
    /// `self.scale() - divisor.scale()`.
    ///
    /// # Errors
    /// Division by zero.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn div_to_integral_value(&self, divisor: &Decimal) -> Result<Decimal> {
        if divisor.is_zero() {
            return Err(zero_divisor_error(self));
        }
        let preferred = saturate(self.scale as i64 - divisor.scale as i64);
        if self.compare_magnitude(divisor).is_lt() {
            return Ok(Decimal::zero_with_scale(preferred));
        }

        let max_digits = self.precision() as u64
            + (10 * divisor.precision() as u64).div_ceil(3)
            + (self.scale as i64 - divisor.scale as i64).unsigned_abs()
            + 2;
        let mc = MathContext::with_rounding(max_digits.min(i32::MAX as u64) as u32, RoundingMode::Down);
        let mut quotient = self.try_div_ctx(divisor, &mc)?;
        if quotient.scale > 0 {
            quotient = quotient
                .set_scale(0, RoundingMode::Down)?
                .strip_zeros_to_match_scale(preferred as i64)?;
        }
        if quotient.scale < preferred {
            quotient = quotient.set_scale(preferred, RoundingMode::Unnecessary)?;
        }
        Ok(quotient)
    }

    /// Integer part of the quotient, which must fit `mc.precision()` digits.
    ///
    /// # Errors
    /// `DivisionImpossible` if the integer part needs more digits, plus the
    /// division-by-zero errors.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn div_to_integral_value_ctx(&self, divisor: &Decimal, mc: &MathContext) -> Result<Decimal> {
        if mc.is_unlimited() || self.compare_magnitude(divisor).is_lt() {
            return self.div_to_integral_value(divisor);
        }
        let preferred = saturate(self.scale as i64 - divisor.scale as i64);

        let mut result =
            self.try_div_ctx(divisor, &MathContext::with_rounding(mc.precision(), RoundingMode::Down))?;
        if result.scale < 0 {
            // the quotient is whole; it is the full integer part only if the
            // leftover is smaller than the divisor
            let product = result.try_mul(divisor)?;
            if self.try_sub(&product)?.compare_magnitude(divisor).is_ge() {
                return Err(NumError::DivisionImpossible);
            }
        } else if result.scale > 0 {
            result = result.set_scale(0, RoundingMode::Down)?;
        }

        let precision_diff = mc.precision() as i64 - result.precision() as i64;
        if preferred > result.scale && precision_diff > 0 {
            let grow = precision_diff.min(preferred as i64 - result.scale as i64);
            let target = (result.scale as i64 + grow) as i32;
            result.set_scale(target, RoundingMode::Unnecessary)
        } else {
            result.strip_zeros_to_match_scale(preferred as i64)
        }
    }

    /// `self - self.div_to_integral_value(divisor) * divisor`; the sign
    /// follows the dividend.
    ///
    /// # Errors
    /// Division by zero.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_rem(&self, divisor: &Decimal) -> Result<Decimal> {
        self.div_rem(divisor).map(|(_, r)| r)
    }

    /// Remainder after [`Decimal::div_to_integral_value_ctx`].
    ///
    /// # Errors
    /// See [`Decimal::div_to_integral_value_ctx`].
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn try_rem_ctx(&self, divisor: &Decimal, mc: &MathContext) -> Result<Decimal> {
        self.div_rem_ctx(divisor, mc).map(|(_, r)| r)
    }

    /// Integral quotient and remainder in one pass.
    ///
    /// # Errors
    /// Division by zero.
    pub fn div_rem(&self, divisor: &Decimal) -> Result<(Decimal, Decimal)> {
        let q = self.div_to_integral_value(divisor)?;
        let r = self.try_sub(&q.try_mul(divisor)?)?;
        Ok((q, r))
    }

    /// Integral quotient and remainder under `mc`.
    ///
    /// # Errors
    /// See [`Decimal::div_to_integral_value_ctx`].
    pub fn div_rem_ctx(&self, divisor: &Decimal, mc: &MathContext) -> Result<(Decimal, Decimal)> {
        if mc.is_unlimited() {
            return self.div_rem(divisor);
        }
        let q = self.div_to_integral_value_ctx(divisor, mc)?;
        let r = self.try_sub(&q.try_mul(divisor)?)?;
        Ok((q, r))
    }
}

// ============================================================================
// Power
// ============================================================================

impl Decimal {
    /// Exact `self^n`; the scale is `self.scale() * n`.
    ///
    /// # Errors
    /// `InvalidOperation` if `n > 999_999_999`; scale overflow.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn pow(&self, n: u32) -> Result<Decimal> {
        if n > MAX_POW {
            return Err(NumError::InvalidOperation);
        }
        let scale = check_scale(self.is_zero(), self.scale as i64 * n as i64)?;
        Ok(Decimal::new(self.inflated().pow(n), scale))
    }

    /// `self^n` rounded to `mc`, following the X3.274 algorithm: the
    /// intermediate products carry `elength + 1` guard digits, where
    /// `elength` is the number of digits in `|n|`, and a negative `n`
    /// takes the reciprocal at the end.
    ///
    /// # Errors
    /// `InvalidOperation` if `|n| > 999_999_999`, if `elength` exceeds the
    /// context precision, or if `n` is negative with an unlimited context.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn pow_ctx(&self, n: i32, mc: &MathContext) -> Result<Decimal> {
        if mc.is_unlimited() {
            return match u32::try_from(n) {
                Ok(n) => self.pow(n),
                Err(_) => Err(NumError::InvalidOperation),
            };
        }
        let mag = n.unsigned_abs();
        if mag > MAX_POW {
            return Err(NumError::InvalidOperation);
        }
        if n == 0 {
            return Ok(Decimal::ONE);
        }
        let elength = long_digit_length(mag as i64);
        if elength > mc.precision() {
            return Err(NumError::InvalidOperation);
        }
        let workmc = MathContext::with_rounding(mc.precision() + elength + 1, mc.rounding_mode());

        let mut acc = Decimal::ONE;
        let mut seen_bit = false;
        for bit in (0..31).rev() {
            if mag & (1 << bit) != 0 {
                seen_bit = true;
                acc = acc.try_mul_ctx(self, &workmc)?;
            }
            if bit == 0 {
                break;
            }
            if seen_bit {
                acc = acc.try_mul_ctx(&acc, &workmc)?;
            }
        }
        if n < 0 {
            acc = Decimal::ONE.try_div_ctx(&acc, &workmc)?;
        }
        acc.do_round(mc)
    }
}

// ============================================================================
// Sign & Rounding
// ============================================================================

impl Decimal {
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn abs(&self) -> Decimal {
        if self.signum() < 0 { -self } else { self.clone() }
    }

    /// Absolute value rounded to `mc`.
    ///
    /// # Errors
    /// `RoundingNecessary` or scale overflow.
    pub fn abs_ctx(&self, mc: &MathContext) -> Result<Decimal> {
        if self.signum() < 0 {
            self.negate_ctx(mc)
        } else {
            self.plus_ctx(mc)
        }
    }

    /// Negation rounded to `mc`.
    ///
    /// # Errors
    /// `RoundingNecessary` or scale overflow.
    pub fn negate_ctx(&self, mc: &MathContext) -> Result<Decimal> {
        (-self).plus_ctx(mc)
    }

    /// `self` rounded to `mc`.
    ///
    /// # Errors
    /// `RoundingNecessary` or scale overflow.
    pub fn plus_ctx(&self, mc: &MathContext) -> Result<Decimal> {
        self.clone().do_round(mc)
    }

    /// Same as [`Decimal::plus_ctx`].
    ///
    /// # Errors
    /// `RoundingNecessary` or scale overflow.
    #[inline]
    pub fn round(&self, mc: &MathContext) -> Result<Decimal> {
        self.plus_ctx(mc)
    }
}

// ============================================================================
// Scale Manipulation
// ============================================================================

impl Decimal {
    /// Same value at `new_scale`, rounding per `mode` when digits are
    /// discarded.
    ///
    /// # Errors
    /// `RoundingNecessary` under [`RoundingMode::Unnecessary`], or
    /// `Underflow` when raising the scale by more than `i32::MAX`.
    pub fn set_scale(&self, new_scale: i32, mode: RoundingMode) -> Result<Decimal> {
        let old_scale = self.scale;
        if new_scale == old_scale {
            return Ok(self.clone());
        }
        if self.is_zero() {
            return Ok(Decimal::zero_with_scale(new_scale));
        }
        if new_scale > old_scale {
            let raise = check_scale(false, new_scale as i64 - old_scale as i64)?;
            Ok(self.upscale(raise as u32, new_scale))
        } else {
            let drop = (old_scale as i64 - new_scale as i64) as u32;
            self.drop_digits(drop, new_scale, mode)
        }
    }

    /// Same value at `new_scale`; no digits may be lost.
    ///
    /// # Errors
    /// See [`Decimal::set_scale`].
    #[inline]
    pub fn set_scale_exact(&self, new_scale: i32) -> Result<Decimal> {
        self.set_scale(new_scale, RoundingMode::Unnecessary)
    }

    /// `self * 10^-n`, never with a negative scale.
    ///
    /// # Errors
    /// Scale overflow.
    pub fn move_point_left(&self, n: i32) -> Result<Decimal> {
        let scale = check_scale(self.is_zero(), self.scale as i64 + n as i64)?;
        let num = self.with_scale(scale);
        if num.scale < 0 {
            num.set_scale(0, RoundingMode::Unnecessary)
        } else {
            Ok(num)
        }
    }

    /// `self * 10^n`, never with a negative scale.
    ///
    /// # Errors
    /// Scale overflow.
    pub fn move_point_right(&self, n: i32) -> Result<Decimal> {
        let scale = check_scale(self.is_zero(), self.scale as i64 - n as i64)?;
        let num = self.with_scale(scale);
        if num.scale < 0 {
            num.set_scale(0, RoundingMode::Unnecessary)
        } else {
            Ok(num)
        }
    }

    /// `self * 10^n` by adjusting the scale alone.
    ///
    /// # Errors
    /// Scale overflow.
    pub fn scale_by_power_of_ten(&self, n: i32) -> Result<Decimal> {
        let scale = check_scale(self.is_zero(), self.scale as i64 - n as i64)?;
        Ok(self.with_scale(scale))
    }

    /// Numerically equal value without trailing zeros. Zero becomes `0`
    /// at scale 0.
    ///
    /// # Errors
    /// `Overflow` if the scale would drop below `i32::MIN`.
    pub fn strip_trailing_zeros(&self) -> Result<Decimal> {
        if self.is_zero() {
            return Ok(Decimal::ZERO);
        }
        self.clone().strip_zeros_to_match_scale(i64::MIN)
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl Decimal {
    /// Numerical comparison; `2.0` and `2.00` are equal here.
    pub fn compare_to(&self, other: &Decimal) -> Ordering {
        if self.scale == other.scale {
            if let (Some(x), Some(y)) = (self.compact(), other.compact()) {
                return x.cmp(&y);
            }
        }
        let xsign = self.signum();
        let ysign = other.signum();
        if xsign != ysign {
            return xsign.cmp(&ysign);
        }
        if xsign == 0 {
            return Ordering::Equal;
        }
        let cmp = self.compare_magnitude(other);
        if xsign > 0 { cmp } else { cmp.reverse() }
    }

    /// Compares `|self|` with `|other|`.
    fn compare_magnitude(&self, other: &Decimal) -> Ordering {
        if self.is_zero() {
            return if other.is_zero() {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if other.is_zero() {
            return Ordering::Greater;
        }

        let sdiff = self.scale as i64 - other.scale as i64;
        if sdiff != 0 {
            // position of the leading digit decides unless it ties
            let xae = self.precision() as i64 - self.scale as i64;
            let yae = other.precision() as i64 - other.scale as i64;
            if xae != yae {
                return xae.cmp(&yae);
            }
            // equal leading positions bound |sdiff| by the digit counts
            return if sdiff < 0 {
                let n = sdiff.unsigned_abs() as u32;
                if let (Some(x), Some(y)) = (self.compact(), other.compact()) {
                    if let Some(xs) = long_multiply_power_ten(x, n) {
                        return xs.unsigned_abs().cmp(&y.unsigned_abs());
                    }
                }
                big_multiply_power_ten(self.inflated(), n).compare_magnitude(other.inflated())
            } else {
                let n = sdiff as u32;
                if let (Some(x), Some(y)) = (self.compact(), other.compact()) {
                    if let Some(ys) = long_multiply_power_ten(y, n) {
                        return x.unsigned_abs().cmp(&ys.unsigned_abs());
                    }
                }
                self.inflated()
                    .compare_magnitude(&big_multiply_power_ten(other.inflated(), n))
            };
        }

        match (self.compact(), other.compact()) {
            (Some(x), Some(y)) => x.unsigned_abs().cmp(&y.unsigned_abs()),
            _ => self.inflated().compare_magnitude(other.inflated()),
        }
    }

    /// The numerically smaller value; `self` on ties.
    #[must_use]
    pub fn min(self, other: Decimal) -> Decimal {
        if self.compare_to(&other).is_le() { self } else { other }
    }

    /// The numerically larger value; `self` on ties.
    #[must_use]
    pub fn max(self, other: Decimal) -> Decimal {
        if self.compare_to(&other).is_ge() { self } else { other }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        if self.scale != other.scale {
            return false;
        }
        match (self.compact(), other.compact()) {
            (Some(x), Some(y)) => x == y,
            (None, None) => self.inflated() == other.inflated(),
            _ => false,
        }
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.compact() {
            Some(v) => v.hash(state),
            None => self.inflated().hash(state),
        }
        self.scale.hash(state);
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl Decimal {
    /// Digits of the absolute unscaled value.
    fn coefficient(&self) -> String {
        match self.compact() {
            Some(v) => v.unsigned_abs().to_string(),
            None => {
                let mut out = String::new();
                self.inflated().write_digits(10, &mut out);
                out
            }
        }
    }

    /// Scientific (`sci`) or engineering notation.
    fn layout(&self, sci: bool) -> String {
        if self.scale == 0 {
            return match self.compact() {
                Some(v) => v.to_string(),
                None => self.inflated().to_string(),
            };
        }
        let coeff = self.coefficient();
        let coeff_len = coeff.len() as i64;
        let mut buf = String::with_capacity(coeff.len() + 16);
        if self.signum() < 0 {
            buf.push('-');
        }

        let mut adjusted = coeff_len - 1 - self.scale as i64;
        if self.scale >= 0 && adjusted >= -6 {
            // plain notation
            let pad = self.scale as i64 - coeff_len;
            if pad >= 0 {
                buf.push_str("0.");
                buf.extend(core::iter::repeat_n('0', pad as usize));
                buf.push_str(&coeff);
            } else {
                let split = (-pad) as usize;
                buf.push_str(&coeff[..split]);
                buf.push('.');
                buf.push_str(&coeff[split..]);
            }
            return buf;
        }

        if sci {
            buf.push_str(&coeff[..1]);
            if coeff.len() > 1 {
                buf.push('.');
                buf.push_str(&coeff[1..]);
            }
        } else {
            let mut sig = adjusted % 3;
            if sig < 0 {
                sig += 3;
            }
            adjusted -= sig;
            sig += 1;
            if self.signum() == 0 {
                match sig {
                    1 => buf.push('0'),
                    2 => {
                        buf.push_str("0.00");
                        adjusted += 3;
                    }
                    _ => {
                        buf.push_str("0.0");
                        adjusted += 3;
                    }
                }
            } else if sig >= coeff_len {
                buf.push_str(&coeff);
                buf.extend(core::iter::repeat_n('0', (sig - coeff_len) as usize));
            } else {
                let split = sig as usize;
                buf.push_str(&coeff[..split]);
                buf.push('.');
                buf.push_str(&coeff[split..]);
            }
        }
        if adjusted != 0 {
            buf.push('E');
            if adjusted > 0 {
                buf.push('+');
            }
            buf.push_str(&adjusted.to_string());
        }
        buf
    }

    /// Like `Display`, but exponents are multiples of three.
    pub fn to_engineering_string(&self) -> String {
        self.layout(false)
    }

    /// Digits without an exponent field.
    pub fn to_plain_string(&self) -> String {
        if self.scale == 0 {
            return self.layout(true);
        }
        if self.is_zero() && self.scale < 0 {
            return "0".to_string();
        }
        let coeff = self.coefficient();
        let mut buf = String::with_capacity(coeff.len() + 3);
        if self.signum() < 0 {
            buf.push('-');
        }
        if self.scale < 0 {
            buf.push_str(&coeff);
            buf.extend(core::iter::repeat_n('0', self.scale.unsigned_abs() as usize));
            return buf;
        }
        let scale = self.scale as usize;
        match coeff.len().checked_sub(scale) {
            Some(0) | None => {
                buf.push_str("0.");
                buf.extend(core::iter::repeat_n('0', scale - coeff.len()));
                buf.push_str(&coeff);
            }
            Some(split) => {
                buf.push_str(&coeff[..split]);
                buf.push('.');
                buf.push_str(&coeff[split..]);
            }
        }
        buf
    }
}

impl fmt::Display for Decimal {
    /// Canonical scientific notation; the exponent appears once the adjusted
    /// exponent drops below -6 or the scale is negative.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string_cache.get_or_init(|| self.layout(true)))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("Decimal")
                .field("unscaled", self.inflated())
                .field("scale", &self.scale)
                .finish()
        } else {
            write!(f, "Decimal({})", self)
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses the digits after `e`/`E`.
fn parse_exponent(bytes: &[u8]) -> Result<i64> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return Err(NumError::NoDigits);
    }
    let mut exp: i64 = 0;
    let mut significant = 0;
    for &b in digits {
        let d = match b {
            b'0'..=b'9' => (b - b'0') as i64,
            b'+' | b'-' => return Err(NumError::MisplacedSign),
            _ => return Err(NumError::InvalidDigit),
        };
        if exp == 0 && d == 0 {
            continue;
        }
        significant += 1;
        if significant > 10 {
            return Err(NumError::ExponentOverflow);
        }
        exp = exp * 10 + d;
    }
    let exp = if negative { -exp } else { exp };
    if i32::try_from(exp).is_err() {
        return Err(NumError::ExponentOverflow);
    }
    Ok(exp)
}

impl FromStr for Decimal {
    type Err = NumError;

    /// Accepts an optional sign, digits with at most one decimal point and
    /// an optional exponent: `-1.23E+4`, `.5`, `7.`, `1e-3`.
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let (negative, body) = match bytes.first() {
            None => return Err(NumError::Empty),
            Some(b'-') => (true, &bytes[1..]),
            Some(b'+') => (false, &bytes[1..]),
            Some(_) => (false, bytes),
        };

        let mut digits = String::with_capacity(body.len());
        let mut saw_digit = false;
        let mut saw_dot = false;
        let mut frac_digits: i64 = 0;
        let mut exp: i64 = 0;
        for (i, &b) in body.iter().enumerate() {
            match b {
                b'0'..=b'9' => {
                    saw_digit = true;
                    if saw_dot {
                        frac_digits += 1;
                    }
                    if b != b'0' || !digits.is_empty() {
                        digits.push(b as char);
                    }
                }
                b'.' => {
                    if saw_dot {
                        return Err(NumError::MultipleDecimalPoints);
                    }
                    saw_dot = true;
                }
                b'e' | b'E' => {
                    exp = parse_exponent(&body[i + 1..])?;
                    break;
                }
                b'+' | b'-' => return Err(NumError::MisplacedSign),
                _ => return Err(NumError::InvalidDigit),
            }
        }
        if !saw_digit {
            return Err(NumError::NoDigits);
        }
        let scale = i32::try_from(frac_digits - exp).map_err(|_| NumError::ExponentOverflow)?;

        let precision = digits.len().max(1) as u32;
        let value = if digits.len() <= 18 {
            let v = digits.bytes().fold(0i64, |acc, b| acc * 10 + (b - b'0') as i64);
            Decimal::from_compact(if negative { -v } else { v }, scale)
        } else {
            let v = BigInt::from_str_radix(&digits, 10)?;
            Decimal::new(if negative { -v } else { v }, scale)
        };
        let _ = value.precision.set(precision);
        Ok(value)
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl Decimal {
    /// Integer part, truncated toward zero.
    pub fn to_bigint(&self) -> BigInt {
        if self.scale <= 0 {
            return big_multiply_power_ten(self.inflated(), self.scale.unsigned_abs());
        }
        if let Some(v) = self.compact() {
            if (self.scale as usize) < LONG_TEN_POWERS.len() {
                return BigInt::from(v / LONG_TEN_POWERS[self.scale as usize]);
            }
        }
        self.inflated() / &big_ten_to_the(self.scale as u32)
    }

    /// Integer value; fails if there is a nonzero fraction.
    ///
    /// # Errors
    /// `RoundingNecessary` if a fractional digit is nonzero.
    pub fn to_bigint_exact(&self) -> Result<BigInt> {
        if self.scale <= 0 {
            return Ok(self.to_bigint());
        }
        self.set_scale(0, RoundingMode::Unnecessary)
            .map(|d| d.unscaled_value())
    }

    /// Low 64 bits of the truncated integer part.
    pub fn to_i64_wrapping(&self) -> i64 {
        match self.compact() {
            Some(v) if self.scale == 0 => v,
            _ => self.to_bigint().to_i64_wrapping(),
        }
    }

    /// Low 32 bits of the truncated integer part.
    pub fn to_i32_wrapping(&self) -> i32 {
        self.to_i64_wrapping() as i32
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// `RoundingNecessary` for a nonzero fraction, `Overflow` if the integer
    /// does not fit.
    pub fn try_to_i64(&self) -> Result<i64> {
        if let Some(v) = self.compact() {
            if self.scale == 0 {
                return Ok(v);
            }
        }
        if self.is_zero() {
            return Ok(0);
        }
        let int_digits = self.precision() as i64 - self.scale as i64;
        if int_digits > 19 {
            return Err(NumError::Overflow);
        }
        if int_digits <= 0 {
            return Err(NumError::RoundingNecessary);
        }
        self.to_bigint_exact()?.try_to_i64()
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// See [`Decimal::try_to_i64`].
    pub fn try_to_i32(&self) -> Result<i32> {
        i32::try_from(self.try_to_i64()?).map_err(|_| NumError::Overflow)
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// See [`Decimal::try_to_i64`].
    pub fn try_to_i16(&self) -> Result<i16> {
        i16::try_from(self.try_to_i64()?).map_err(|_| NumError::Overflow)
    }

    /// Exact conversion.
    ///
    /// # Errors
    /// See [`Decimal::try_to_i64`].
    pub fn try_to_i8(&self) -> Result<i8> {
        i8::try_from(self.try_to_i64()?).map_err(|_| NumError::Overflow)
    }

    /// Nearest `f64`; out-of-range values become infinities or zero.
    pub fn to_f64(&self) -> f64 {
        match self.compact() {
            Some(v) if self.scale == 0 => v as f64,
            _ => self.to_string().parse().unwrap_or(f64::NAN),
        }
    }

    /// Nearest `f32`; out-of-range values become infinities or zero.
    pub fn to_f32(&self) -> f32 {
        self.to_string().parse().unwrap_or(f32::NAN)
    }
}

// ============================================================================
// Operator Traits
// ============================================================================

impl Add<&Decimal> for &Decimal {
    type Output = Decimal;

    #[inline]
    fn add(self, other: &Decimal) -> Decimal {
        self.try_add(other).expect("attempt to add with scale overflow")
    }
}

impl Sub<&Decimal> for &Decimal {
    type Output = Decimal;

    #[inline]
    fn sub(self, other: &Decimal) -> Decimal {
        self.try_sub(other).expect("attempt to subtract with scale overflow")
    }
}

impl Mul<&Decimal> for &Decimal {
    type Output = Decimal;

    #[inline]
    fn mul(self, other: &Decimal) -> Decimal {
        self.try_mul(other).expect("attempt to multiply with scale overflow")
    }
}

forward_all_binop!(impl Add for Decimal, add);
forward_all_binop!(impl Sub for Decimal, sub);
forward_all_binop!(impl Mul for Decimal, mul);

forward_op_assign!(impl AddAssign for Decimal, add_assign, add);
forward_op_assign!(impl SubAssign for Decimal, sub_assign, sub);
forward_op_assign!(impl MulAssign for Decimal, mul_assign, mul);

impl Neg for &Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        match self.compact() {
            Some(v) => Decimal::from_i64_scaled(-v, self.scale),
            None => Decimal::new(-self.inflated(), self.scale),
        }
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    #[inline]
    fn neg(self) -> Decimal {
        -&self
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, x| acc + x)
    }
}

impl Product for Decimal {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Decimal::ONE, |acc, x| acc * x)
    }
}

impl<'a> Product<&'a Decimal> for Decimal {
    fn product<I: Iterator<Item = &'a Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ONE, |acc, x| acc * x)
    }
}

impl Zero for Decimal {
    #[inline]
    fn zero() -> Self {
        Decimal::ZERO
    }

    #[inline]
    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
}

impl One for Decimal {
    #[inline]
    fn one() -> Self {
        Decimal::ONE
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::ZERO
    }
}

// ============================================================================
// Serde Support
// ============================================================================

#[cfg(feature = "serde")]
impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            (self.inflated().to_signed_bytes_be(), self.scale).serialize(serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let (bytes, scale) = <(Vec<u8>, i32)>::deserialize(deserializer)?;
            let unscaled = BigInt::from_signed_bytes_be(&bytes).map_err(de::Error::custom)?;
            Ok(Decimal::new(unscaled, scale))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(Decimal::ZERO.to_string(), "0");
        assert_eq!(Decimal::ONE.to_string(), "1");
        assert_eq!(Decimal::TEN.precision(), 2);
        assert_eq!(Decimal::default(), Decimal::ZERO);
    }

    #[test]
    fn test_compact_boundary() {
        let min = Decimal::from(i64::MIN);
        assert_eq!(min.compact(), None);
        assert_eq!(min.to_string(), i64::MIN.to_string());
        assert_eq!(min.precision(), 19);

        let max = Decimal::from(i64::MAX);
        assert_eq!(max.compact(), Some(i64::MAX));
        let next = &max + &Decimal::ONE;
        assert_eq!(next.compact(), None);
        assert_eq!(next.to_string(), "9223372036854775808");
        let back = &next - &Decimal::ONE;
        assert_eq!(back.compact(), Some(i64::MAX));
        assert_eq!(back, max);
    }

    #[test]
    fn test_accessors() {
        let d = dec("-123.4500");
        assert_eq!(d.scale(), 4);
        assert_eq!(d.precision(), 7);
        assert_eq!(d.signum(), -1);
        assert_eq!(d.unscaled_value(), BigInt::from(-1234500));
        assert_eq!(d.ulp().to_string(), "0.0001");
        assert!(!d.is_zero());
        assert!(dec("0.000").is_zero());
        assert_eq!(dec("0.000").precision(), 1);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Decimal::from(42u8).to_string(), "42");
        assert_eq!(Decimal::from(-7i16).to_string(), "-7");
        assert_eq!(Decimal::from(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Decimal::from(BigInt::from(5)).scale(), 0);
        assert_eq!(Decimal::from_i64_scaled(12345, 2).to_string(), "123.45");
        assert_eq!(Decimal::from_i64_scaled(5, -3).to_string(), "5E+3");
    }

    #[test]
    fn test_from_float() {
        assert_eq!(Decimal::try_from(0.1f64).unwrap().to_string(), "0.1");
        assert_eq!(Decimal::try_from(100.0f64).unwrap().to_string(), "100.0");
        assert_eq!(Decimal::try_from(-2.5f64).unwrap().to_string(), "-2.5");
        assert_eq!(Decimal::try_from(1e300f64).unwrap().to_string(), "1E+300");
        assert_eq!(Decimal::try_from(0.1f32).unwrap().to_string(), "0.1");
        assert_eq!(Decimal::try_from(f64::NAN), Err(NumError::InvalidOperation));
        assert_eq!(Decimal::try_from(f64::INFINITY), Err(NumError::InvalidOperation));
    }

    #[test]
    fn test_rounded_constructors() {
        let mc = MathContext::new(3);
        assert_eq!(
            Decimal::from_bigint_rounded(BigInt::from(123456), 2, &mc).unwrap().to_string(),
            "1.23E+3"
        );
        assert_eq!(Decimal::from_i64_rounded(98765, &mc).unwrap().to_string(), "9.88E+4");
        assert_eq!(Decimal::from_str_rounded("0.0012345", &mc).unwrap().to_string(), "0.00123");
        assert_eq!(
            Decimal::from_i64_rounded(12, &MathContext::with_rounding(1, RoundingMode::Unnecessary)),
            Err(NumError::RoundingNecessary)
        );
    }

    #[test]
    fn test_representation_equality() {
        assert_ne!(dec("2.0"), dec("2.00"));
        assert_eq!(dec("2.0").compare_to(&dec("2.00")), Ordering::Equal);
        assert_eq!(dec("2.50"), Decimal::from_i64_scaled(250, 2));

        use std::collections::HashSet;
        let set: HashSet<Decimal> = [dec("1.0"), dec("1.00"), dec("1.0")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_operators() {
        let a = dec("1.5");
        let b = dec("0.25");
        assert_eq!((&a + &b).to_string(), "1.75");
        assert_eq!((&a - &b).to_string(), "1.25");
        assert_eq!((&a * &b).to_string(), "0.375");
        assert_eq!((-a.clone()).to_string(), "-1.5");

        let mut c = a.clone();
        c += &b;
        c -= dec("0.75");
        c *= dec("2");
        assert_eq!(c.to_string(), "2.00");

        let total: Decimal = [dec("0.1"), dec("0.2"), dec("0.3")].iter().sum();
        assert_eq!(total.to_string(), "0.6");
        let product: Decimal = [dec("1.5"), dec("2"), dec("0.5")].into_iter().product();
        assert_eq!(product.to_string(), "1.50");
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", dec("-1.5")), "Decimal(-1.5)");
        let alt = format!("{:#?}", dec("1.5"));
        assert!(alt.contains("scale: 1"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_json() {
        let d = dec("-123.4500");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"-123.4500\"");
        let back: Decimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Decimal>("\"1.2.3\"").is_err());
    }
}


#[cfg(test)]
mod division_tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_div_with_scale() {
        let q = dec("19").div_with_scale(&dec("100"), 2, RoundingMode::Floor).unwrap();
        assert_eq!(q.to_string(), "0.19");
        let q = dec("21").div_with_scale(&dec("110"), 3, RoundingMode::Floor).unwrap();
        assert_eq!(q.unscaled_value(), BigInt::from(190));
        assert_eq!(q.to_string(), "0.190");
        let q = dec("-1").div_with_scale(&dec("3"), 4, RoundingMode::HalfUp).unwrap();
        assert_eq!(q.to_string(), "-0.3333");
        let q = dec("2").div_with_scale(&dec("3"), 2, RoundingMode::Down).unwrap();
        assert_eq!(q.to_string(), "0.66");
        let q = dec("1000").div_with_scale(&dec("0.5"), -2, RoundingMode::Unnecessary).unwrap();
        assert_eq!(q.to_string(), "2.0E+3");
    }

    #[test]
    fn test_div_rounded() {
        let q = dec("10.00").div_rounded(&dec("3"), RoundingMode::HalfEven).unwrap();
        assert_eq!(q.to_string(), "3.33");
        assert_eq!(
            dec("10").div_rounded(&dec("3"), RoundingMode::Unnecessary),
            Err(NumError::RoundingNecessary)
        );
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(dec("1").try_div(&dec("0")), Err(NumError::DivisionByZero));
        assert_eq!(dec("0").try_div(&dec("0.0")), Err(NumError::DivisionUndefined));
        assert_eq!(
            dec("1").div_with_scale(&Decimal::ZERO, 2, RoundingMode::Up),
            Err(NumError::DivisionByZero)
        );
        assert_eq!(
            dec("1").try_div_ctx(&Decimal::ZERO, &MathContext::DECIMAL64),
            Err(NumError::DivisionByZero)
        );
        assert_eq!(dec("5").try_rem(&Decimal::ZERO), Err(NumError::DivisionByZero));
    }

    #[test]
    fn test_exact_division() {
        assert_eq!(dec("1").try_div(&dec("8")).unwrap().to_string(), "0.125");
        assert_eq!(dec("19").try_div(&dec("100")).unwrap().to_string(), "0.19");
        assert_eq!(dec("6.00").try_div(&dec("2")).unwrap().to_string(), "3.00");
        assert_eq!(dec("6").try_div(&dec("2.0")).unwrap().to_string(), "3");
        assert_eq!(dec("0.00").try_div(&dec("7")).unwrap().to_string(), "0.00");
        assert_eq!(dec("1").try_div(&dec("3")), Err(NumError::NonTerminatingDecimal));
    }

    #[test]
    fn test_div_ctx() {
        let third = Decimal::ONE.try_div_ctx(&dec("3"), &MathContext::DECIMAL32).unwrap();
        assert_eq!(third.to_string(), "0.3333333");
        let two_thirds = dec("2").try_div_ctx(&dec("3"), &MathContext::new(5)).unwrap();
        assert_eq!(two_thirds.to_string(), "0.66667");
        let q = dec("1000").try_div_ctx(&dec("8"), &MathContext::new(10)).unwrap();
        assert_eq!(q.to_string(), "125");
        let q = dec("-22").try_div_ctx(&dec("7"), &MathContext::new(6)).unwrap();
        assert_eq!(q.to_string(), "-3.14286");
        let big = dec("123456789012345678901234567890");
        let q = big.try_div_ctx(&dec("9"), &MathContext::DECIMAL64).unwrap();
        assert_eq!(q.to_string(), "1.371742100137174E+28");
    }

    #[test]
    fn test_div_to_integral_value() {
        let q = dec("7.5").div_to_integral_value(&dec("2")).unwrap();
        assert_eq!(q.to_string(), "3.0");
        let q = dec("-7").div_to_integral_value(&dec("2")).unwrap();
        assert_eq!(q.to_string(), "-3");
        let q = dec("1").div_to_integral_value(&dec("3")).unwrap();
        assert_eq!(q.to_string(), "0");
        let q = dec("1E+3").div_to_integral_value(&dec("7")).unwrap();
        assert_eq!(q.compare_to(&dec("142")), Ordering::Equal);
    }

    #[test]
    fn test_div_to_integral_value_ctx() {
        let mc = MathContext::new(5);
        let q = dec("7.5").div_to_integral_value_ctx(&dec("2"), &mc).unwrap();
        assert_eq!(q.to_string(), "3.0");
        let q = dec("1E+10").div_to_integral_value_ctx(&dec("1"), &mc).unwrap();
        assert_eq!(q.to_string(), "1E+10");
        assert_eq!(
            dec("12345678").div_to_integral_value_ctx(&dec("1"), &MathContext::new(3)),
            Err(NumError::DivisionImpossible)
        );
    }

    #[test]
    fn test_remainder() {
        assert_eq!(dec("7.5").try_rem(&dec("2")).unwrap().to_string(), "1.5");
        assert_eq!(dec("-7.5").try_rem(&dec("2")).unwrap().to_string(), "-1.5");
        assert_eq!(dec("7.5").try_rem(&dec("-2")).unwrap().to_string(), "1.5");
        let (q, r) = dec("10").div_rem(&dec("3")).unwrap();
        assert_eq!((q.to_string(), r.to_string()), ("3".to_string(), "1".to_string()));
        let (q, r) = dec("10").div_rem_ctx(&dec("0.3"), &MathContext::new(5)).unwrap();
        assert_eq!(q.to_string(), "33");
        assert_eq!(r.to_string(), "0.1");
        assert_eq!(
            dec("10").try_rem_ctx(&dec("0.3"), &MathContext::new(5)).unwrap().to_string(),
            "0.1"
        );
    }
}
