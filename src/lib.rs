//! Arbitrary-precision integers and exact decimals
//!
//! This library provides two value types built on a shared word-array core:
//!
//! - **`BigInt`**: immutable signed integer of unbounded magnitude
//!   - 32-bit limbs, most significant word first
//!   - Knuth division, Montgomery `mod_pow`, hybrid binary GCD
//!   - Miller-Rabin + Lucas-Lehmer primality, sieved prime generation
//!   - Bit operations over an infinite two's-complement view
//!
//! - **`Decimal`**: `unscaled × 10^-scale` with an `i32` scale
//!   - Single-word fast path, lazily materialized `BigInt` otherwise
//!   - Eight rounding modes and a [`MathContext`] precision setting
//!   - Canonical, engineering and plain string forms
//!
//! ## Features
//!
//! - **Exact by default**: operations without a `MathContext` never round
//! - **Uniform errors**: every fallible operation returns [`Result`]
//! - **Operator traits**: `+ - * / %` behave like primitive integers and
//!   panic on division by zero
//! - **Serde support** (`serde` feature): strings for human-readable formats,
//!   two's-complement bytes for binary ones
//! - **num-traits / num-integer** integration
//!
//! ## Example
//!
//! ```rust
//! use bigdec::{BigInt, Decimal, MathContext, RoundingMode};
//!
//! // Integers
//! let a: BigInt = "123456789012345678901234567890".parse().unwrap();
//! let square = &a * &a;
//! assert_eq!(square.to_string(), "15241578753238836750495351562536198787501905199875019052100");
//!
//! let m = BigInt::from(1_000_000_007u32);
//! let r = BigInt::from(2).mod_pow(&BigInt::from(100), &m).unwrap();
//! assert_eq!(r, BigInt::from(976_371_285u32));
//!
//! // Decimals
//! let x: Decimal = "19".parse().unwrap();
//! let y: Decimal = "100".parse().unwrap();
//! let q = x.div_with_scale(&y, 2, RoundingMode::Floor).unwrap();
//! assert_eq!(q.to_string(), "0.19");
//!
//! let third = Decimal::from(1).try_div_ctx(&Decimal::from(3), &MathContext::DECIMAL32).unwrap();
//! assert_eq!(third.to_string(), "0.3333333");
//! ```

// Operator forwarding: the `&T op &T` impl carries the logic, the owned
// combinations delegate to it.
macro_rules! forward_val_val_binop {
    (impl $imp:ident for $res:ty, $method:ident) => {
        impl $imp<$res> for $res {
            type Output = $res;

            #[inline]
            fn $method(self, other: $res) -> $res {
                (&self).$method(&other)
            }
        }
    };
}

macro_rules! forward_ref_val_binop {
    (impl $imp:ident for $res:ty, $method:ident) => {
        impl<'a> $imp<$res> for &'a $res {
            type Output = $res;

            #[inline]
            fn $method(self, other: $res) -> $res {
                self.$method(&other)
            }
        }
    };
}

macro_rules! forward_val_ref_binop {
    (impl $imp:ident for $res:ty, $method:ident) => {
        impl<'a> $imp<&'a $res> for $res {
            type Output = $res;

            #[inline]
            fn $method(self, other: &$res) -> $res {
                (&self).$method(other)
            }
        }
    };
}

macro_rules! forward_all_binop {
    (impl $imp:ident for $res:ty, $method:ident) => {
        forward_val_val_binop!(impl $imp for $res, $method);
        forward_ref_val_binop!(impl $imp for $res, $method);
        forward_val_ref_binop!(impl $imp for $res, $method);
    };
}

macro_rules! forward_op_assign {
    (impl $imp:ident for $res:ty, $method:ident, $op:ident) => {
        impl $imp<$res> for $res {
            #[inline]
            fn $method(&mut self, other: $res) {
                *self = (&*self).$op(&other);
            }
        }

        impl<'a> $imp<&'a $res> for $res {
            #[inline]
            fn $method(&mut self, other: &$res) {
                *self = (&*self).$op(other);
            }
        }
    };
}

mod bigint;
mod context;
mod decimal;
mod magnitude;
mod modular;
mod mutable;
mod pow10;
mod prime;

pub use bigint::{BigInt, Sign};
pub use context::{MathContext, RoundingMode};
pub use decimal::Decimal;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumError {
    #[error("cannot parse number from empty string")]
    Empty,

    #[error("invalid digit found in string")]
    InvalidDigit,

    #[error("illegal embedded sign character")]
    MisplacedSign,

    #[error("more than one decimal point")]
    MultipleDecimalPoints,

    #[error("no digits found")]
    NoDigits,

    #[error("exponent out of range")]
    ExponentOverflow,

    #[error("radix {0} out of range")]
    InvalidRadix(u32),

    #[error("signum-magnitude mismatch")]
    SignMagnitudeMismatch,

    #[error("division by zero")]
    DivisionByZero,

    #[error("division undefined")]
    DivisionUndefined,

    #[error("division impossible")]
    DivisionImpossible,

    #[error("modulus not positive")]
    NonPositiveModulus,

    #[error("value not invertible")]
    NotInvertible,

    #[error("negative value not allowed")]
    NegativeValue,

    #[error("bit length must be at least 2")]
    BitLengthTooSmall,

    #[error("overflow: value too large to represent")]
    Overflow,

    #[error("underflow: value too small to represent")]
    Underflow,

    #[error("rounding necessary")]
    RoundingNecessary,

    #[error("non-terminating decimal expansion; no exact representable decimal result")]
    NonTerminatingDecimal,

    #[error("invalid operation")]
    InvalidOperation,
}

pub type Result<T> = core::result::Result<T, NumError>;
