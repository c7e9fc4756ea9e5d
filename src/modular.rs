//! Modular arithmetic on [`BigInt`]: residues, exponentiation and inverses.
//!
//! Odd moduli use Montgomery multiplication with a sliding exponent
//! window. Even moduli are split into an odd part and a power of two and
//! recombined with the Chinese Remainder Theorem.

use core::cmp::Ordering;

use num_traits::One;

use crate::bigint::{BigInt, Sign};
use crate::magnitude;
use crate::mutable::{self, MutableBigInt};
use crate::{NumError, Result};

/// Exponent bit lengths above which the window grows by one bit.
const EXP_MOD_THRESHOLDS: [u64; 6] = [7, 25, 81, 241, 673, 1793];

impl BigInt {
    /// `self mod m`, always in `[0, m)`.
    ///
    /// # Errors
    /// Returns `NumError::NonPositiveModulus` if `m <= 0`.
    pub fn modulo(&self, m: &BigInt) -> Result<BigInt> {
        if !m.is_positive() {
            return Err(NumError::NonPositiveModulus);
        }
        let r = self.try_rem(m)?;
        Ok(if r.is_negative() { &r + m } else { r })
    }

    /// `self^exponent mod m`. A negative exponent computes the inverse of
    /// the positive power.
    ///
    /// # Errors
    /// - `NumError::NonPositiveModulus` if `m <= 0`
    /// - `NumError::NotInvertible` if `exponent < 0` and `self` is not
    ///   coprime to `m`
    pub fn mod_pow(&self, exponent: &BigInt, m: &BigInt) -> Result<BigInt> {
        if !m.is_positive() {
            return Err(NumError::NonPositiveModulus);
        }

        let one = BigInt::one();
        let m_is_one = *m == one;
        let unit = || if m_is_one { BigInt::ZERO } else { BigInt::one() };

        if exponent.is_zero() || *self == one {
            return Ok(unit());
        }
        if self.is_zero() && !exponent.is_negative() {
            return Ok(BigInt::ZERO);
        }
        if *self == -&one && !exponent.test_bit(0) {
            return Ok(unit());
        }

        let invert_result = exponent.is_negative();
        let exponent = exponent.abs();

        let base = if self.is_negative() || self >= m {
            self.modulo(m)?
        } else {
            self.clone()
        };

        let result = if m.test_bit(0) {
            base.odd_mod_pow(&exponent, m)
        } else {
            // m = m1 * m2 with m1 odd and m2 = 2^p
            let p = m.lowest_set_bit().unwrap_or(0);
            let m1 = m.shr_bits(p);
            let m2 = one.shl_bits(p);

            let base2 = if self.is_negative() || self >= &m1 {
                self.modulo(&m1)?
            } else {
                self.clone()
            };
            let a1 = if m1 == one {
                BigInt::ZERO
            } else {
                base2.odd_mod_pow(&exponent, &m1)
            };
            let a2 = base.mod_pow2(&exponent, p);

            let y1 = m2.mod_inverse(&m1)?;
            let y2 = m1.mod_inverse(&m2)?;

            (&(&a1 * &m2) * &y1 + &(&a2 * &m1) * &y2).modulo(m)?
        };

        if invert_result {
            result.mod_inverse(m)
        } else {
            Ok(result)
        }
    }

    /// `self^-1 mod m`.
    ///
    /// # Errors
    /// - `NumError::NonPositiveModulus` if `m <= 0`
    /// - `NumError::NotInvertible` if `gcd(self, m) != 1`
    pub fn mod_inverse(&self, m: &BigInt) -> Result<BigInt> {
        if !m.is_positive() {
            return Err(NumError::NonPositiveModulus);
        }
        let one = BigInt::one();
        if *m == one {
            return Ok(BigInt::ZERO);
        }

        let mod_val = if self.is_negative() || self.compare_magnitude(m) != Ordering::Less {
            self.modulo(m)?
        } else {
            self.clone()
        };
        if mod_val.is_zero() {
            return Err(NumError::NotInvertible);
        }
        if mod_val == one {
            return Ok(one);
        }

        let a = MutableBigInt::from_mag(&mod_val.mag);
        let b = MutableBigInt::from_mag(&m.mag);
        Ok(a.mutable_mod_inverse(&b)?.to_big_int(Sign::Plus))
    }

    /// Montgomery exponentiation for an odd modulus; `self` is already
    /// reduced and `y` is non-negative.
    pub(crate) fn odd_mod_pow(&self, y: &BigInt, z: &BigInt) -> BigInt {
        if *y == BigInt::one() {
            return self.clone();
        }
        if self.is_zero() {
            return BigInt::ZERO;
        }

        let exp = &y.mag;
        let modulus = &z.mag;
        let mod_len = modulus.len();

        // Window size
        let ebits = magnitude::bit_length(exp);
        let mut wbits = 0usize;
        if ebits != 17 || exp[0] != 65537 {
            while wbits < EXP_MOD_THRESHOLDS.len() && ebits > EXP_MOD_THRESHOLDS[wbits] {
                wbits += 1;
            }
        }
        let tblmask = 1usize << wbits;

        let inv = mutable::inverse_mod32(modulus[mod_len - 1]).wrapping_neg();
        let mont = Montgomery {
            modulus,
            inv,
        };

        // Base into Montgomery form: base * 2^(32 * mod_len) mod z
        let shifted = MutableBigInt::from_mag(&magnitude::shift_left(&self.mag, (mod_len as u64) << 5));
        let mut q = MutableBigInt::new();
        let r = shifted.divide(&MutableBigInt::from_mag(modulus), &mut q);
        let mut first = vec![0u32; mod_len];
        let r = r.to_mag();
        first[mod_len - r.len()..].copy_from_slice(&r);

        // table[k] = base^(2k + 1)
        let square = mont.square(&first);
        let mut table = Vec::with_capacity(tblmask);
        table.push(first);
        for i in 1..tblmask {
            let next = mont.multiply(&square, &table[i - 1]);
            table.push(next);
        }

        let bit = |i: u64| (exp[exp.len() - 1 - (i >> 5) as usize] >> (i & 31)) & 1 == 1;

        let mut acc: Option<Vec<u32>> = None;
        let mut i = ebits as i64 - 1;
        while i >= 0 {
            if !bit(i as u64) {
                if let Some(a) = acc.as_mut() {
                    *a = mont.square(a);
                }
                i -= 1;
                continue;
            }

            // Longest window of at most wbits + 1 bits that ends in a one.
            let mut j = (i - wbits as i64).max(0);
            while !bit(j as u64) {
                j += 1;
            }
            let mut window = 0usize;
            for k in (j..=i).rev() {
                window = (window << 1) | bit(k as u64) as usize;
            }

            acc = Some(match acc {
                None => table[window >> 1].clone(),
                Some(mut a) => {
                    for _ in j..=i {
                        a = mont.square(&a);
                    }
                    mont.multiply(&a, &table[window >> 1])
                }
            });
            i = j - 1;
        }

        // Out of Montgomery form
        let b = acc.unwrap_or_else(|| table[0].clone());
        let mut t2 = vec![0u32; 2 * mod_len];
        t2[mod_len..].copy_from_slice(&b);
        mont.reduce(&mut t2);
        t2.truncate(mod_len);
        BigInt::from_parts(Sign::Plus, t2)
    }

    /// `self^exponent mod 2^p` for non-negative `self`.
    fn mod_pow2(&self, exponent: &BigInt, p: u64) -> BigInt {
        let mut result = BigInt::one();
        let mut base_to_pow2 = self.mod2(p);
        let mut limit = exponent.bit_length();
        // Odd residues have order dividing 2^(p-1).
        if self.test_bit(0) {
            limit = limit.min(p.saturating_sub(1));
        }

        let mut exp_offset = 0;
        while exp_offset < limit {
            if exponent.test_bit(exp_offset) {
                result = (&result * &base_to_pow2).mod2(p);
            }
            exp_offset += 1;
            if exp_offset < limit {
                base_to_pow2 = base_to_pow2.square().mod2(p);
            }
        }
        result
    }

    /// Low `p` bits of a non-negative value.
    fn mod2(&self, p: u64) -> BigInt {
        if self.bit_length() <= p {
            return self.clone();
        }
        let num_ints = p.div_ceil(32) as usize;
        let mut mag = self.mag[self.mag.len() - num_ints..].to_vec();
        let excess_bits = ((num_ints as u64) << 5) - p;
        mag[0] &= u32::MAX >> excess_bits;
        BigInt::from_parts(Sign::Plus, mag)
    }
}

/// Montgomery arithmetic modulo an odd, word-aligned modulus. Operands are
/// exactly `modulus.len()` words.
struct Montgomery<'a> {
    modulus: &'a [u32],
    inv: u32,
}

impl Montgomery<'_> {
    fn multiply(&self, a: &[u32], b: &[u32]) -> Vec<u32> {
        let mut prod = vec![0u32; 2 * self.modulus.len()];
        magnitude::multiply_to_len(a, b, &mut prod);
        self.reduce(&mut prod);
        prod.truncate(self.modulus.len());
        prod
    }

    fn square(&self, a: &[u32]) -> Vec<u32> {
        let mut prod = vec![0u32; 2 * self.modulus.len()];
        magnitude::square_to_len(a, &mut prod);
        self.reduce(&mut prod);
        prod.truncate(self.modulus.len());
        prod
    }

    /// Reduces the double-width `n` modulo the modulus and divides by
    /// 2^(32 * len). The result lands in the high half of `n`.
    fn reduce(&self, n: &mut [u32]) {
        let mlen = self.modulus.len();
        let mut c: i32 = 0;
        for offset in 0..mlen {
            let n_end = n[n.len() - 1 - offset];
            let carry = magnitude::mul_add(n, self.modulus, offset, mlen, self.inv.wrapping_mul(n_end));
            c += magnitude::add_one(n, offset, mlen, carry) as i32;
        }
        while c > 0 {
            c += magnitude::sub_n(n, self.modulus, mlen);
        }
        while magnitude::cmp_to_len(n, self.modulus, mlen) != Ordering::Less {
            magnitude::sub_n(n, self.modulus, mlen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_mod_pow(base: i64, exp: u32, m: i64) -> i64 {
        let mut result: i128 = 1 % m as i128;
        let b = (base as i128).rem_euclid(m as i128);
        for _ in 0..exp {
            result = result * b % m as i128;
        }
        result as i64
    }

    #[test]
    fn test_modulo_is_non_negative() {
        let m = BigInt::from(7);
        assert_eq!(BigInt::from(-1).modulo(&m).unwrap(), BigInt::from(6));
        assert_eq!(BigInt::from(14).modulo(&m).unwrap(), BigInt::ZERO);
        assert_eq!(
            BigInt::from(3).modulo(&BigInt::from(-7)),
            Err(NumError::NonPositiveModulus)
        );
    }

    #[test]
    fn test_mod_pow_small_odd_and_even() {
        for m in [1i64, 2, 3, 8, 12, 97, 1000, 4096, 65535] {
            for base in [-5i64, 0, 1, 2, 7, 123] {
                for exp in [0u32, 1, 2, 5, 17, 64] {
                    let got = BigInt::from(base)
                        .mod_pow(&BigInt::from(exp), &BigInt::from(m))
                        .unwrap();
                    assert_eq!(got, BigInt::from(naive_mod_pow(base, exp, m)), "{base}^{exp} mod {m}");
                }
            }
        }
    }

    #[test]
    fn test_mod_pow_multiword() {
        // 2^(p-1) = 1 mod p for the Mersenne prime 2^127 - 1
        let p = (BigInt::from(1) << 127) - BigInt::from(1);
        let e = &p - &BigInt::from(1);
        assert_eq!(BigInt::from(3).mod_pow(&e, &p).unwrap(), BigInt::one());

        // 65537 = 2^16 + 1, so x^65537 = x^(2^16) * x
        let m: BigInt = "1000000000000000000000000000057".parse().unwrap();
        let x: BigInt = "123456789123456789".parse().unwrap();
        let mut sq = x.clone();
        for _ in 0..16 {
            sq = (&sq * &sq) % &m;
        }
        assert_eq!(x.mod_pow(&BigInt::from(65537), &m).unwrap(), (&sq * &x) % &m);
    }

    #[test]
    fn test_mod_pow_even_multiword_modulus() {
        let m = BigInt::from(3u64).pow(40) << 70;
        let base = BigInt::from(12345);
        let e = BigInt::from(1000);
        let mut expected = BigInt::one();
        for _ in 0..1000 {
            expected = (&expected * &base) % &m;
        }
        assert_eq!(base.mod_pow(&e, &m).unwrap(), expected);
    }

    #[test]
    fn test_mod_pow_negative_exponent() {
        let m = BigInt::from(11);
        let r = BigInt::from(3).mod_pow(&BigInt::from(-1), &m).unwrap();
        assert_eq!(r, BigInt::from(4));
        assert_eq!(
            BigInt::from(2).mod_pow(&BigInt::from(-1), &BigInt::from(4)),
            Err(NumError::NotInvertible)
        );
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(BigInt::from(3).mod_inverse(&BigInt::from(11)).unwrap(), BigInt::from(4));
        assert_eq!(BigInt::from(-3).mod_inverse(&BigInt::from(11)).unwrap(), BigInt::from(7));
        assert_eq!(BigInt::from(5).mod_inverse(&BigInt::from(1)).unwrap(), BigInt::ZERO);
        assert_eq!(BigInt::from(12).mod_inverse(&BigInt::from(11)).unwrap(), BigInt::one());
        assert_eq!(
            BigInt::from(22).mod_inverse(&BigInt::from(11)),
            Err(NumError::NotInvertible)
        );
        assert_eq!(
            BigInt::from(3).mod_inverse(&BigInt::ZERO),
            Err(NumError::NonPositiveModulus)
        );

        let a: BigInt = "98765432109876543210987654321".parse().unwrap();
        let mersenne = (BigInt::from(1) << 127) - BigInt::from(1);
        let inv = a.mod_inverse(&mersenne).unwrap();
        assert_eq!((&a * &inv).modulo(&mersenne).unwrap(), BigInt::one());

        let m = BigInt::from(1) << 200;
        let inv = a.mod_inverse(&m).unwrap();
        assert_eq!((&a * &inv).modulo(&m).unwrap(), BigInt::one());

        let m = BigInt::from(3u64).pow(30) << 40;
        let inv = a.mod_inverse(&m).unwrap();
        assert_eq!((&a * &inv).modulo(&m).unwrap(), BigInt::one());
    }
}
