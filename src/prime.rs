//! Primality testing and prime generation for [`BigInt`].
//!
//! `is_probable_prime` runs Miller-Rabin with a round count that shrinks as
//! the candidate grows, plus a strong Lucas test for candidates of 256 bits
//! or more. Generation trial-divides small candidates and sieves a window
//! of odd candidates for large ones.

use std::sync::LazyLock;

use num_traits::One;
use rand::Rng;
use tracing::{instrument, trace};

use crate::bigint::BigInt;
use crate::mutable::MutableBigInt;
use crate::{NumError, Result};

/// Candidates shorter than this are trial-divided instead of sieved.
const SMALL_PRIME_THRESHOLD: u64 = 95;

/// Certainty used by the generators: error probability below `2^-100`.
const DEFAULT_PRIME_CERTAINTY: i32 = 100;

/// Bit length from which the Lucas test supplements Miller-Rabin.
const LUCAS_THRESHOLD: u64 = 256;

const SMALL_PRIMES: [u64; 12] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

const SMALL_PRIME_PRODUCT: u64 = {
    let mut product = 1u64;
    let mut i = 0;
    while i < SMALL_PRIMES.len() {
        product *= SMALL_PRIMES[i];
        i += 1;
    }
    product
};

// ============================================================================
// Primality Test
// ============================================================================

impl BigInt {
    /// Returns `true` if `self` is probably prime, `false` if it is
    /// definitely composite. The sign is ignored.
    ///
    /// The probability that a composite passes is below `2^-certainty`.
    /// A `certainty` of zero or less always returns `true`.
    pub fn is_probable_prime(&self, certainty: i32) -> bool {
        self.is_probable_prime_with_rng(certainty, &mut rand::rng())
    }

    /// Like [`is_probable_prime`](Self::is_probable_prime), drawing
    /// Miller-Rabin bases from `rng`.
    pub fn is_probable_prime_with_rng<R: Rng + ?Sized>(&self, certainty: i32, rng: &mut R) -> bool {
        if certainty <= 0 {
            return true;
        }
        let w = self.abs();
        if w == BigInt::from(2) {
            return true;
        }
        if !w.test_bit(0) || w.is_one() {
            return false;
        }
        w.prime_to_certainty(certainty, rng)
    }

    /// `self` is odd and at least 3.
    fn prime_to_certainty<R: Rng + ?Sized>(&self, certainty: i32, rng: &mut R) -> bool {
        let n = (certainty.min(i32::MAX - 1) + 1) / 2;
        let size = self.bit_length();

        // Rounds after ANSI X9.80
        let rounds = match size {
            0..100 => 50,
            100..256 => 27,
            256..512 => 15,
            512..768 => 8,
            768..1024 => 4,
            _ => 2,
        };
        let rounds = rounds.min(n) as u32;

        if !self.passes_miller_rabin(rounds, rng) {
            return false;
        }
        size < LUCAS_THRESHOLD || self.passes_lucas_lehmer()
    }

    fn passes_miller_rabin<R: Rng + ?Sized>(&self, iterations: u32, rng: &mut R) -> bool {
        let one = BigInt::one();
        let this_minus_one = self - &one;
        // self = 1 + 2^a * m with m odd
        let a = this_minus_one.lowest_set_bit().unwrap_or(0);
        let m = this_minus_one.shr_bits(a);
        let bits = self.bit_length();

        for _ in 0..iterations {
            // uniform on (1, self)
            let b = loop {
                let b = BigInt::random_bits(bits, rng);
                if b > one && b < *self {
                    break b;
                }
            };

            let mut j = 0;
            let mut z = b.odd_mod_pow(&m, self);
            while !((j == 0 && z == one) || z == this_minus_one) {
                if j > 0 && z == one {
                    return false;
                }
                j += 1;
                if j == a {
                    return false;
                }
                z = z.square() % self;
            }
        }
        true
    }

    fn passes_lucas_lehmer(&self) -> bool {
        let this_plus_one = self + &BigInt::one();

        // 5, -7, 9, -11, ...
        let mut d: i32 = 5;
        while jacobi_symbol(d, self) != -1 {
            d = if d < 0 { d.abs() + 2 } else { -(d + 2) };
        }

        let u = lucas_lehmer_sequence(d, &this_plus_one, self);
        reduce(&u, self).is_zero()
    }
}

/// `x mod n` in `[0, n)` for positive `n`.
fn reduce(x: &BigInt, n: &BigInt) -> BigInt {
    let r = x % n;
    if r.is_negative() { r + n } else { r }
}

/// Jacobi symbol `(p / n)` for odd positive `n`.
fn jacobi_symbol(p: i32, n: &BigInt) -> i32 {
    if p == 0 {
        return 0;
    }

    let mut j = 1;
    let mag = n.magnitude();
    let mut u = mag[mag.len() - 1];

    if p < 0 {
        let n8 = u & 7;
        if n8 == 3 || n8 == 7 {
            j = -j;
        }
    }
    let mut p = p.unsigned_abs();

    // Factors of two in p
    while p & 3 == 0 {
        p >>= 2;
    }
    if p & 1 == 0 {
        p >>= 1;
        if (u ^ (u >> 1)) & 2 != 0 {
            j = -j;
        }
    }
    if p == 1 {
        return j;
    }

    // Quadratic reciprocity, then reduce u mod p
    if p & u & 2 != 0 {
        j = -j;
    }
    u = (n % &BigInt::from(p)).to_i64_wrapping() as u32;

    while u != 0 {
        while u & 3 == 0 {
            u >>= 2;
        }
        if u & 1 == 0 {
            u >>= 1;
            if (p ^ (p >> 1)) & 2 != 0 {
                j = -j;
            }
        }
        if u == 1 {
            return j;
        }
        debug_assert!(u < p);
        core::mem::swap(&mut u, &mut p);
        if u & p & 2 != 0 {
            j = -j;
        }
        u %= p;
    }
    0
}

/// `U_k mod n` for the Lucas sequence with `P = 1`, `Q = (1 - z) / 4`.
fn lucas_lehmer_sequence(z: i32, k: &BigInt, n: &BigInt) -> BigInt {
    let d = BigInt::from(z);
    let mut u = BigInt::one();
    let mut v = BigInt::one();

    // Halving mod n: n is odd, so an odd value becomes even after subtracting n.
    let halve = |x: BigInt| {
        let x = if x.test_bit(0) { &x - n } else { x };
        x.shr_bits(1)
    };

    let top = k.bit_length();
    for i in (0..top.saturating_sub(1)).rev() {
        let u2 = reduce(&(&u * &v), n);
        let v2 = halve(reduce(&(v.square() + &d * &u.square()), n));
        u = u2;
        v = v2;

        if k.test_bit(i) {
            let u2 = halve(reduce(&(&u + &v), n));
            let v2 = halve(reduce(&(&v + &(&d * &u)), n));
            u = u2;
            v = v2;
        }
    }
    u
}

// ============================================================================
// Prime Generation
// ============================================================================

impl BigInt {
    /// Returns a positive `bits`-bit integer that is probably prime, with a
    /// probability of being composite below `2^-100`.
    ///
    /// # Errors
    /// Returns `NumError::BitLengthTooSmall` if `bits < 2`.
    #[instrument(skip_all, level = "debug", fields(bits = bits))]
    pub fn probable_prime<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Result<BigInt> {
        if bits < 2 {
            return Err(NumError::BitLengthTooSmall);
        }
        Ok(if bits < SMALL_PRIME_THRESHOLD {
            small_prime(bits, DEFAULT_PRIME_CERTAINTY, rng)
        } else {
            large_prime(bits, DEFAULT_PRIME_CERTAINTY, rng)
        })
    }

    /// Returns the first integer greater than `self` that is probably prime.
    /// The probability that the result is composite is below `2^-100`, and
    /// no prime is skipped.
    ///
    /// # Errors
    /// Returns `NumError::NegativeValue` if `self < 0`.
    #[instrument(skip_all, level = "debug")]
    pub fn next_probable_prime(&self) -> Result<BigInt> {
        if self.is_negative() {
            return Err(NumError::NegativeValue);
        }
        let one = BigInt::one();
        let two = BigInt::from(2);
        if self.is_zero() || self.is_one() {
            return Ok(two);
        }

        let rng = &mut rand::rng();
        let mut result = self + &one;

        if result.bit_length() < SMALL_PRIME_THRESHOLD {
            if !result.test_bit(0) {
                result += &one;
            }
            loop {
                let candidate_bits = result.bit_length();
                if candidate_bits > 6 && has_small_prime_factor(&result) {
                    result += &two;
                    continue;
                }
                // 2- and 3-bit odd candidates are prime
                if candidate_bits < 4 {
                    return Ok(result);
                }
                if result.prime_to_certainty(DEFAULT_PRIME_CERTAINTY, rng) {
                    return Ok(result);
                }
                result += &two;
            }
        }

        // Sieve windows start on an even number
        if result.test_bit(0) {
            result -= &one;
        }
        let search_len = (result.bit_length() / 20 * 64) as usize;
        loop {
            let sieve = BitSieve::new(&result, search_len);
            if let Some(candidate) = sieve.retrieve(&result, DEFAULT_PRIME_CERTAINTY, rng) {
                return Ok(candidate);
            }
            trace!(search_len, "sieve window exhausted");
            result += BigInt::from(2 * search_len as u64);
        }
    }
}

fn has_small_prime_factor(candidate: &BigInt) -> bool {
    let r = (candidate % &BigInt::from(SMALL_PRIME_PRODUCT)).to_i64_wrapping() as u64;
    SMALL_PRIMES.iter().any(|&p| r % p == 0)
}

fn small_prime<R: Rng + ?Sized>(bits: u64, certainty: i32, rng: &mut R) -> BigInt {
    loop {
        let mut p = BigInt::random_bits(bits, rng).set_bit(bits - 1);
        if bits > 2 {
            p = p.set_bit(0);
        }

        if bits > 6 && has_small_prime_factor(&p) {
            continue;
        }
        // Every 2- and 3-bit candidate left is prime
        if bits < 4 {
            return p;
        }
        if p.prime_to_certainty(certainty, rng) {
            return p;
        }
    }
}

fn large_prime<R: Rng + ?Sized>(bits: u64, certainty: i32, rng: &mut R) -> BigInt {
    let fresh_base = |rng: &mut R| BigInt::random_bits(bits, rng).set_bit(bits - 1).clear_bit(0);

    // A window likely to contain the next prime
    let search_len = (bits / 20 * 64) as usize;
    let step = BigInt::from(2 * search_len as u64);

    let mut p = fresh_base(&mut *rng);
    loop {
        let sieve = BitSieve::new(&p, search_len);
        if let Some(candidate) = sieve.retrieve(&p, certainty, rng) {
            if candidate.bit_length() == bits {
                return candidate;
            }
        }
        trace!(bits, search_len, "sieve window exhausted");

        p = &p + &step;
        if p.bit_length() != bits {
            p = fresh_base(&mut *rng);
        } else {
            p = p.clear_bit(0);
        }
    }
}

// ============================================================================
// Bit Sieve
// ============================================================================

/// Sieve over odd offsets: bit `i` stands for `base + 2i + 1` and is set
/// once that value is known to be composite.
struct BitSieve {
    bits: Vec<u64>,
    length: usize,
}

/// Odd numbers below `2 * 150 * 64`; bit `i` is set if `2i + 1` is composite.
static SMALL_SIEVE: LazyLock<BitSieve> = LazyLock::new(BitSieve::small);

impl BitSieve {
    #[inline(always)]
    const fn unit_index(bit_index: usize) -> usize {
        bit_index >> 6
    }

    #[inline(always)]
    const fn bit(bit_index: usize) -> u64 {
        1 << (bit_index & 63)
    }

    fn with_len(length: usize) -> Self {
        Self {
            bits: vec![0; Self::unit_index(length - 1) + 1],
            length,
        }
    }

    fn small() -> Self {
        let length = 150 * 64;
        let mut sieve = Self::with_len(length);
        // 1 is not prime
        sieve.set(0);

        let mut next_index = 1;
        let mut next_prime = 3;
        loop {
            sieve.sieve_single(length, next_index + next_prime, next_prime);
            match sieve.sieve_search(length, next_index + 1) {
                Some(index) if 2 * index + 1 < length => {
                    next_index = index;
                    next_prime = 2 * index + 1;
                }
                _ => break,
            }
        }
        sieve
    }

    /// Sieves the `search_len` odd numbers above the even `base` with every
    /// prime in the small sieve.
    fn new(base: &BigInt, search_len: usize) -> Self {
        let mut sieve = Self::with_len(search_len);
        let small = &*SMALL_SIEVE;

        let b = MutableBigInt::from_mag(base.magnitude());
        let mut q = MutableBigInt::new();
        let mut step = small.sieve_search(small.length, 0);
        while let Some(index) = step {
            let prime = 2 * index + 1;
            let r = b.divide_one_word(prime as u32, &mut q) as usize;

            // First odd offset with base + start divisible by prime
            let mut start = prime - r;
            if start % 2 == 0 {
                start += prime;
            }
            sieve.sieve_single(search_len, (start - 1) / 2, prime);

            step = small.sieve_search(small.length, index + 1);
        }
        sieve
    }

    #[inline(always)]
    fn get(&self, bit_index: usize) -> bool {
        self.bits[Self::unit_index(bit_index)] & Self::bit(bit_index) != 0
    }

    #[inline(always)]
    fn set(&mut self, bit_index: usize) {
        self.bits[Self::unit_index(bit_index)] |= Self::bit(bit_index);
    }

    /// First clear bit in `start..limit - 1`.
    fn sieve_search(&self, limit: usize, start: usize) -> Option<usize> {
        if start >= limit {
            return None;
        }
        (start..(limit - 1).max(start + 1)).find(|&i| !self.get(i))
    }

    fn sieve_single(&mut self, limit: usize, mut start: usize, step: usize) {
        while start < limit {
            self.set(start);
            start += step;
        }
    }

    /// Tests each surviving candidate in order and returns the first prime.
    fn retrieve<R: Rng + ?Sized>(&self, base: &BigInt, certainty: i32, rng: &mut R) -> Option<BigInt> {
        let mut offset = 1u64;
        for &word in &self.bits {
            let mut candidates = !word;
            for _ in 0..64 {
                if candidates & 1 == 1 {
                    let candidate = base + &BigInt::from(offset);
                    if candidate.prime_to_certainty(certainty, rng) {
                        return Some(candidate);
                    }
                }
                candidates >>= 1;
                offset += 2;
            }
        }
        None
    }
}
