//! Rounding modes and precision settings for [`Decimal`](crate::Decimal)
//! arithmetic.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::{NumError, Result};

// ============================================================================
// Rounding Mode
// ============================================================================

/// How a value is rounded when digits have to be discarded.
///
/// | input | Up | Down | Ceiling | Floor | HalfUp | HalfDown | HalfEven |
/// |------:|---:|-----:|--------:|------:|-------:|---------:|---------:|
/// |   5.5 |  6 |    5 |       6 |     5 |      6 |        5 |        6 |
/// |   2.5 |  3 |    2 |       3 |     2 |      3 |        2 |        2 |
/// |   1.1 |  2 |    1 |       2 |     1 |      1 |        1 |        1 |
/// |  -1.1 | -2 |   -1 |      -1 |    -2 |     -1 |       -1 |       -1 |
/// |  -2.5 | -3 |   -2 |      -2 |    -3 |     -3 |       -2 |       -2 |
///
/// `Unnecessary` asserts that no rounding is needed and fails with
/// [`NumError::RoundingNecessary`] if a discarded digit is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Towards zero.
    Down,
    /// Towards positive infinity.
    Ceiling,
    /// Towards negative infinity.
    Floor,
    /// To nearest, ties away from zero.
    #[default]
    HalfUp,
    /// To nearest, ties towards zero.
    HalfDown,
    /// To nearest, ties to the even neighbour.
    HalfEven,
    /// No rounding allowed.
    Unnecessary,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 8] = [
        RoundingMode::Up,
        RoundingMode::Down,
        RoundingMode::Ceiling,
        RoundingMode::Floor,
        RoundingMode::HalfUp,
        RoundingMode::HalfDown,
        RoundingMode::HalfEven,
        RoundingMode::Unnecessary,
    ];

    /// The upper-snake name used by `Display` and `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            RoundingMode::Up => "UP",
            RoundingMode::Down => "DOWN",
            RoundingMode::Ceiling => "CEILING",
            RoundingMode::Floor => "FLOOR",
            RoundingMode::HalfUp => "HALF_UP",
            RoundingMode::HalfDown => "HALF_DOWN",
            RoundingMode::HalfEven => "HALF_EVEN",
            RoundingMode::Unnecessary => "UNNECESSARY",
        }
    }

    /// Decides whether a truncated quotient moves one unit away from zero.
    ///
    /// Only called when the discarded fraction is non-zero. `qsign` is the
    /// sign of the exact result, `cmp_frac_half` compares the discarded
    /// fraction with one half and `q_odd` tells whether the retained last
    /// digit is odd.
    pub(crate) fn should_increment(
        self,
        qsign: i32,
        cmp_frac_half: Ordering,
        q_odd: bool,
    ) -> Result<bool> {
        Ok(match self {
            RoundingMode::Unnecessary => return Err(NumError::RoundingNecessary),
            RoundingMode::Up => true,
            RoundingMode::Down => false,
            RoundingMode::Ceiling => qsign > 0,
            RoundingMode::Floor => qsign < 0,
            RoundingMode::HalfUp | RoundingMode::HalfDown | RoundingMode::HalfEven => {
                match cmp_frac_half {
                    Ordering::Less => false,
                    Ordering::Greater => true,
                    Ordering::Equal => match self {
                        RoundingMode::HalfUp => true,
                        RoundingMode::HalfDown => false,
                        _ => q_odd,
                    },
                }
            }
        })
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoundingMode {
    type Err = NumError;

    fn from_str(s: &str) -> Result<Self> {
        RoundingMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or(NumError::InvalidDigit)
    }
}

// ============================================================================
// Math Context
// ============================================================================

/// Precision and rounding applied by the `_ctx` family of
/// [`Decimal`](crate::Decimal) operations.
///
/// A precision of zero means unlimited: results are exact and the rounding
/// mode is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MathContext {
    precision: u32,
    rounding_mode: RoundingMode,
}

impl MathContext {
    /// Exact arithmetic.
    pub const UNLIMITED: MathContext = MathContext::with_rounding(0, RoundingMode::HalfUp);

    /// IEEE 754R decimal32: 7 digits, half-even.
    pub const DECIMAL32: MathContext = MathContext::with_rounding(7, RoundingMode::HalfEven);

    /// IEEE 754R decimal64: 16 digits, half-even.
    pub const DECIMAL64: MathContext = MathContext::with_rounding(16, RoundingMode::HalfEven);

    /// IEEE 754R decimal128: 34 digits, half-even.
    pub const DECIMAL128: MathContext = MathContext::with_rounding(34, RoundingMode::HalfEven);

    /// `precision` digits with [`RoundingMode::HalfUp`].
    #[inline(always)]
    pub const fn new(precision: u32) -> Self {
        Self::with_rounding(precision, RoundingMode::HalfUp)
    }

    #[inline(always)]
    pub const fn with_rounding(precision: u32, rounding_mode: RoundingMode) -> Self {
        Self {
            precision,
            rounding_mode,
        }
    }

    #[inline(always)]
    pub const fn precision(&self) -> u32 {
        self.precision
    }

    #[inline(always)]
    pub const fn rounding_mode(&self) -> RoundingMode {
        self.rounding_mode
    }

    #[inline(always)]
    pub const fn is_unlimited(&self) -> bool {
        self.precision == 0
    }
}

impl Default for MathContext {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

impl fmt::Display for MathContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "precision={} roundingMode={}", self.precision, self.rounding_mode)
    }
}

impl FromStr for MathContext {
    type Err = NumError;

    /// Parses the `Display` form, `"precision=<n> roundingMode=<MODE>"`.
    fn from_str(s: &str) -> Result<Self> {
        let rest = s.strip_prefix("precision=").ok_or(NumError::InvalidDigit)?;
        let (digits, mode) = rest.split_once(' ').ok_or(NumError::InvalidDigit)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NumError::InvalidDigit);
        }
        let precision: u32 = digits.parse().map_err(|_| NumError::Overflow)?;
        let mode = mode.strip_prefix("roundingMode=").ok_or(NumError::InvalidDigit)?;
        Ok(Self::with_rounding(precision, mode.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_increment_directed() {
        let lt = Ordering::Less;
        assert!(RoundingMode::Up.should_increment(1, lt, false).unwrap());
        assert!(RoundingMode::Up.should_increment(-1, lt, false).unwrap());
        assert!(!RoundingMode::Down.should_increment(1, Ordering::Greater, true).unwrap());
        assert!(RoundingMode::Ceiling.should_increment(1, lt, false).unwrap());
        assert!(!RoundingMode::Ceiling.should_increment(-1, lt, false).unwrap());
        assert!(!RoundingMode::Floor.should_increment(1, lt, false).unwrap());
        assert!(RoundingMode::Floor.should_increment(-1, lt, false).unwrap());
    }

    #[test]
    fn test_should_increment_half_modes() {
        let eq = Ordering::Equal;
        assert!(RoundingMode::HalfUp.should_increment(1, eq, false).unwrap());
        assert!(!RoundingMode::HalfDown.should_increment(1, eq, true).unwrap());
        assert!(RoundingMode::HalfEven.should_increment(1, eq, true).unwrap());
        assert!(!RoundingMode::HalfEven.should_increment(1, eq, false).unwrap());
        for mode in [RoundingMode::HalfUp, RoundingMode::HalfDown, RoundingMode::HalfEven] {
            assert!(mode.should_increment(1, Ordering::Greater, false).unwrap());
            assert!(!mode.should_increment(1, Ordering::Less, true).unwrap());
        }
    }

    #[test]
    fn test_unnecessary_fails() {
        assert_eq!(
            RoundingMode::Unnecessary.should_increment(1, Ordering::Less, false),
            Err(NumError::RoundingNecessary)
        );
    }

    #[test]
    fn test_rounding_mode_names() {
        for mode in RoundingMode::ALL {
            assert_eq!(mode.to_string().parse::<RoundingMode>().unwrap(), mode);
        }
        assert_eq!("HALF_EVEN".parse::<RoundingMode>().unwrap(), RoundingMode::HalfEven);
        assert!("half_even".parse::<RoundingMode>().is_err());
    }

    #[test]
    fn test_math_context_constants() {
        assert_eq!(MathContext::DECIMAL32.precision(), 7);
        assert_eq!(MathContext::DECIMAL64.precision(), 16);
        assert_eq!(MathContext::DECIMAL128.precision(), 34);
        assert_eq!(MathContext::DECIMAL128.rounding_mode(), RoundingMode::HalfEven);
        assert!(MathContext::UNLIMITED.is_unlimited());
        assert_eq!(MathContext::new(5).rounding_mode(), RoundingMode::HalfUp);
        assert_eq!(MathContext::default(), MathContext::UNLIMITED);
    }

    #[test]
    fn test_math_context_string_round_trip() {
        let mc = MathContext::with_rounding(12, RoundingMode::Floor);
        assert_eq!(mc.to_string(), "precision=12 roundingMode=FLOOR");
        assert_eq!(mc.to_string().parse::<MathContext>().unwrap(), mc);
        assert_eq!(
            "precision=7 roundingMode=HALF_EVEN".parse::<MathContext>().unwrap(),
            MathContext::DECIMAL32
        );
    }

    #[test]
    fn test_math_context_parse_errors() {
        assert!("precision=-1 roundingMode=UP".parse::<MathContext>().is_err());
        assert!("precision=7".parse::<MathContext>().is_err());
        assert!("precision=7 roundingMode=SIDEWAYS".parse::<MathContext>().is_err());
        assert!("7 HALF_UP".parse::<MathContext>().is_err());
        assert_eq!(
            "precision=99999999999 roundingMode=UP".parse::<MathContext>(),
            Err(NumError::Overflow)
        );
    }
}
