//! Printing: conversion of a fixed-precision value into free-format digits,
//! using the Burger-Dybvig algorithm. The value is interpreted as a stand-in
//! for its whole rounding range (the interval of reals that read back to it
//! at the same precision and rounding mode), and the generated digit sequence
//! is the shortest one inside that range.

use crate::context::RoundingMode;
use crate::float::Float;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Pow, ToPrimitive, Zero};
use thiserror::Error;

/// Default bound on the number of digits generated in all-digits mode. A
/// value with no exact expansion in the output radix would otherwise loop
/// forever under the directed rounding modes.
const DEFAULT_DIGIT_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// All-digits generation did not close the rounding range within the
    /// digit bound; the value has no exact expansion in the output radix.
    #[error("no exact digit expansion in radix {radix} within {limit} digits")]
    DigitLimitExceeded { radix: u32, limit: usize },
}

/// The result of a format operation: the value equals
/// `0.d1 d2 d3 ... * output_radix^scale`. If `round_up` is set (all-digits
/// mode only) the least significant digit must still be incremented, with
/// carry propagation; [`Digits::adjusted`] applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digits {
    pub scale: i64,
    pub digits: Vec<u8>,
    pub round_up: bool,
}

impl Digits {
    /// The digit sequence with any pending round-up applied. A carry can
    /// ripple all the way out, prepending a digit and bumping the scale.
    pub fn adjusted(&self, radix: u32) -> (i64, Vec<u8>) {
        if !self.round_up {
            return (self.scale, self.digits.clone());
        }
        let mut digits = self.digits.clone();
        let mut scale = self.scale;
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                scale += 1;
                break;
            }
            i -= 1;
            digits[i] += 1;
            if digits[i] as u32 == radix {
                digits[i] = 0;
            } else {
                break;
            }
        }
        (scale, digits)
    }
}

// The working quotients: value = r/s, distance to the upper limit of the
// rounding range = m_p/s, distance to the lower limit = m_m/s. round_l and
// round_h tell whether the lower/upper limits themselves round back to the
// value (closed boundaries).
struct Quotients {
    r: BigUint,
    s: BigUint,
    m_p: BigUint,
    m_m: BigUint,
    k: i64,
    round_l: bool,
    round_h: bool,
}

/// Converts fixed-precision values of one radix into digit sequences of
/// another. `input_min_e` is the minimum coefficient exponent of the input
/// format (the denormal floor), needed to size the rounding range at the
/// bottom of the exponent range.
#[derive(Debug, Clone)]
pub struct Formatter {
    input_radix: u32,
    min_e: i64,
    output_radix: u32,
    digit_limit: usize,
}

impl Formatter {
    pub fn new(input_radix: u32, input_min_e: i64, output_radix: u32) -> Self {
        debug_assert!(input_radix >= 2 && output_radix >= 2);
        Formatter {
            input_radix,
            min_e: input_min_e,
            output_radix,
            digit_limit: DEFAULT_DIGIT_LIMIT,
        }
    }

    /// Replace the all-digits bound.
    pub fn with_digit_limit(mut self, limit: usize) -> Self {
        self.digit_limit = limit;
        self
    }

    pub fn output_radix(&self) -> u32 {
        self.output_radix
    }

    /// Convert `v` (a finite value of `precision` digits) into the shortest
    /// digit sequence that reads back to `v` at the same precision under
    /// `rounding`. A `None` rounding stands for an unspecified
    /// round-to-nearest mode: the result is valid for any of them, at the
    /// cost of possibly one extra digit.
    pub fn format(
        &self,
        v: &Float,
        rounding: Option<RoundingMode>,
        precision: usize,
    ) -> Digits {
        debug_assert!(v.is_finite());
        if v.is_zero() {
            return Digits {
                scale: 0,
                digits: vec![0],
                round_up: false,
            };
        }
        let mut q = self.prepare(v, rounding, precision);
        self.scale_optimized(v, &mut q);
        self.generate(q)
    }

    /// Like [`Formatter::format`], but emits every significant digit: all
    /// digits that cannot change without altering the value the text reads
    /// back to. The digits are not rounded; instead the result's `round_up`
    /// flag tells the caller to increment the final digit. Values with no
    /// exact expansion in the output radix exceed the digit bound under the
    /// directed rounding modes and report an error.
    pub fn format_all(
        &self,
        v: &Float,
        rounding: Option<RoundingMode>,
        precision: usize,
    ) -> Result<Digits, FormatError> {
        debug_assert!(v.is_finite());
        if v.is_zero() {
            return Ok(Digits {
                scale: 0,
                digits: vec![0],
                round_up: false,
            });
        }
        let mut q = self.prepare(v, rounding, precision);
        self.scale_optimized(v, &mut q);
        self.generate_all(q)
    }

    // Build the quotients r/s, m_p/s, m_m/s for the magnitude of v, decide
    // the boundary closures, and apply the directed-rounding adjustment.
    fn prepare(
        &self,
        v: &Float,
        rounding: Option<RoundingMode>,
        precision: usize,
    ) -> Quotients {
        // Work on the magnitude; swap the sign-directed modes if negative.
        let rounding = if v.get_sign() {
            rounding.map(RoundingMode::for_negative)
        } else {
            rounding
        };

        let f = v.get_coeff();
        let e = v.get_exp();
        let b = BigUint::from(self.input_radix);

        // Which boundaries of the rounding range are closed, i.e. themselves
        // read back to v.
        let (round_l, round_h) = match rounding {
            Some(RoundingMode::HalfEven) => {
                let even = f.is_even();
                (even, even)
            }
            Some(RoundingMode::Up) | Some(RoundingMode::Ceiling) => (false, true),
            Some(RoundingMode::Down) | Some(RoundingMode::Floor) => (true, false),
            Some(RoundingMode::HalfUp) => (true, false),
            Some(RoundingMode::HalfDown) => (false, true),
            // Unknown nearest mode: treat both boundaries as open. Valid for
            // any nearest rounding, possibly one digit longer than needed.
            None => (false, false),
        };

        // The distances to the adjacent representable values are one ulp on
        // both sides, except when the coefficient sits on a power of the
        // radix: the gap below is then one radix-th of the gap above. The
        // common factor 2 keeps the half-gaps integral.
        let b_pow_p1 = b.clone().pow(precision as u64 - 1);
        let (r, s, m_p, m_m) = if e >= 0 {
            let be = b.clone().pow(e as u64);
            if *f != b_pow_p1 {
                (f * &be * 2u32, BigUint::from(2u32), be.clone(), be)
            } else {
                let be1 = &be * &b;
                (f * &be1 * 2u32, &b * 2u32, be1, be)
            }
        } else if e == self.min_e || *f != b_pow_p1 {
            (
                f * 2u32,
                b.pow((-e) as u64) * 2u32,
                BigUint::one(),
                BigUint::one(),
            )
        } else {
            (
                f * &b * 2u32,
                b.clone().pow((1 - e) as u64) * 2u32,
                b.clone(),
                BigUint::one(),
            )
        };

        // Directed rounding: only one side of v bounds the rounding range,
        // and it spans a full ulp rather than half.
        let (m_p, m_m) = match rounding {
            Some(RoundingMode::Up) | Some(RoundingMode::Ceiling) => {
                (BigUint::zero(), m_m * 2u32)
            }
            Some(RoundingMode::Down) | Some(RoundingMode::Floor) => {
                (m_p * 2u32, BigUint::zero())
            }
            _ => (m_p, m_m),
        };

        Quotients {
            r,
            s,
            m_p,
            m_m,
            k: 0,
            round_l,
            round_h,
        }
    }

    // Find k such that the first significant digit lands right after the
    // radix point: the smallest k with (r + m_p)/s <= output_radix^k (or
    // strictly below, when the upper boundary is open). Exact big-integer
    // arithmetic only.
    fn scale(&self, q: &mut Quotients) {
        let ob = BigUint::from(self.output_radix);
        loop {
            let high = &q.r + &q.m_p;
            let too_low = if q.round_h { high >= q.s } else { high > q.s };
            if too_low {
                q.s *= &ob;
                q.k += 1;
                continue;
            }
            let scaled = high * &ob;
            let too_high = if q.round_h {
                scaled < q.s
            } else {
                scaled <= q.s
            };
            if too_high {
                q.r *= &ob;
                q.m_p *= &ob;
                q.m_m *= &ob;
                q.k -= 1;
            } else {
                break;
            }
        }
    }

    // Pre-scale by a floating-point estimate of k, then let the exact loop
    // correct it. The estimate is biased slightly down so it is almost always
    // at most one step short; either way the loop produces the same k and the
    // same digits as scaling from zero.
    fn scale_optimized(&self, v: &Float, q: &mut Quotients) {
        // The logarithm of zero is undefined. Zero is short-circuited before
        // this point; keep the exact loop as the route for it regardless.
        if v.is_zero() {
            self.scale(q);
            return;
        }

        let estimate = self.estimate_scale(v);
        if estimate >= 0 {
            q.s *= BigUint::from(self.output_radix).pow(estimate as u64);
        } else {
            let sc = BigUint::from(self.output_radix).pow((-estimate) as u64);
            q.r *= &sc;
            q.m_p *= &sc;
            q.m_m *= &sc;
        }
        q.k = estimate;
        self.scale(q);
    }

    // ceil(log_outputradix |v|), estimated in floating point from the
    // coefficient's bit length and the exponent.
    fn estimate_scale(&self, v: &Float) -> i64 {
        let log_ob = (self.output_radix as f64).ln();
        let l = (ln_big(v.get_coeff())
            + v.get_exp() as f64 * (self.input_radix as f64).ln())
            / log_ob;
        if l.is_finite() {
            (l - 1e-10).ceil() as i64
        } else {
            // Rough fallback based on the position of the leading digit.
            let adj = v.adjusted_exponent() as f64;
            (adj * (self.input_radix as f64).ln() / log_ob).ceil() as i64
        }
    }

    // Emit digits until the generated prefix, extended with the digit just
    // produced (or that digit plus one), falls inside the rounding range.
    fn generate(&self, mut q: Quotients) -> Digits {
        let ob = BigUint::from(self.output_radix);
        let mut list: Vec<u8> = Vec::new();
        loop {
            let (d, rem) = (&q.r * &ob).div_rem(&q.s);
            q.r = rem;
            q.m_p *= &ob;
            q.m_m *= &ob;
            let d = small_digit(&d);

            let low = if q.round_l {
                q.r <= q.m_m
            } else {
                q.r < q.m_m
            };
            let high_sum = &q.r + &q.m_p;
            let high = if q.round_h {
                high_sum >= q.s
            } else {
                high_sum > q.s
            };

            match (low, high) {
                (false, false) => list.push(d),
                (false, true) => {
                    list.push(d + 1);
                    break;
                }
                (true, false) => {
                    list.push(d);
                    break;
                }
                (true, true) => {
                    // Both candidates are inside the range; keep the one
                    // closer to the remaining fraction.
                    if &q.r * 2u32 < q.s {
                        list.push(d);
                    } else {
                        list.push(d + 1);
                    }
                    break;
                }
            }
        }
        Digits {
            scale: q.k,
            digits: list,
            round_up: false,
        }
    }

    // All-digits variant: emit every digit until both boundaries are
    // satisfied, never incrementing in the loop. The pending increment is
    // reported through the round_up flag instead.
    fn generate_all(&self, mut q: Quotients) -> Result<Digits, FormatError> {
        let ob = BigUint::from(self.output_radix);
        let mut list: Vec<u8> = Vec::new();
        loop {
            if list.len() >= self.digit_limit {
                return Err(FormatError::DigitLimitExceeded {
                    radix: self.output_radix,
                    limit: self.digit_limit,
                });
            }
            let (d, rem) = (&q.r * &ob).div_rem(&q.s);
            q.r = rem;
            q.m_p *= &ob;
            q.m_m *= &ob;
            list.push(small_digit(&d));

            let low = if q.round_l {
                q.r <= q.m_m
            } else {
                q.r < q.m_m
            };
            let high_sum = &q.r + &q.m_p;
            let high = if q.round_h {
                high_sum >= q.s
            } else {
                high_sum > q.s
            };

            if low && high {
                let round_up = &q.r * 2u32 >= q.s;
                return Ok(Digits {
                    scale: q.k,
                    digits: list,
                    round_up,
                });
            }
        }
    }
}

// A digit quotient is always below the output radix.
fn small_digit(n: &BigUint) -> u8 {
    n.to_u8().expect("digit below the output radix")
}

// Natural logarithm of a positive big integer, via its top 53 bits. Stays
// finite for any length.
fn ln_big(n: &BigUint) -> f64 {
    let bits = n.bits();
    if bits <= 53 {
        return n.to_f64().unwrap_or(f64::NAN).ln();
    }
    let top = (n >> (bits - 53) as usize).to_f64().unwrap_or(f64::NAN);
    top.ln() + (bits - 53) as f64 * core::f64::consts::LN_2
}

#[cfg(test)]
use crate::context::Context;

#[cfg(test)]
fn binary64_formatter() -> Formatter {
    Formatter::new(2, Context::binary64().etiny(), 10)
}

#[test]
fn test_format_zero() {
    use RoundingMode::*;
    let fmt = binary64_formatter();
    for mode in [HalfEven, HalfUp, HalfDown, Up, Down, Ceiling, Floor] {
        let d = fmt.format(&Float::zero(2, false), Some(mode), 53);
        assert_eq!(d.scale, 0);
        assert_eq!(d.digits, [0]);
        assert!(!d.round_up);
    }
    let d = fmt.format(&Float::zero(2, true), None, 53);
    assert_eq!((d.scale, d.digits), (0, vec![0]));
}

#[test]
fn test_format_tenth() {
    // The double closest to 0.1 prints as the single digit 1 at scale 0,
    // i.e. "0.1".
    let fmt = binary64_formatter();
    let v = Float::from_f64(0.1);
    let d = fmt.format(&v, Some(RoundingMode::HalfEven), 53);
    assert_eq!(d.scale, 0);
    assert_eq!(d.digits, [1]);
    assert!(!d.round_up);
}

#[test]
fn test_format_simple_values() {
    let fmt = binary64_formatter();

    let d = fmt.format(&Float::from_f64(0.5), Some(RoundingMode::HalfEven), 53);
    assert_eq!((d.scale, d.digits), (0, vec![5]));

    let d = fmt.format(&Float::from_f64(1.0), Some(RoundingMode::HalfEven), 53);
    assert_eq!((d.scale, d.digits), (1, vec![1]));

    let d = fmt.format(&Float::from_f64(1995.5), Some(RoundingMode::HalfEven), 53);
    assert_eq!((d.scale, d.digits), (4, vec![1, 9, 9, 5, 5]));

    let d = fmt.format(&Float::from_f64(1e300), Some(RoundingMode::HalfEven), 53);
    assert_eq!((d.scale, d.digits), (301, vec![1]));
}

#[test]
fn test_tie_picks_even_digit() {
    // 12 * 2^-5 = 0.375 sits exactly between "0.37" and "0.38"; the closed
    // boundaries (even coefficient) let both stop conditions fire and the
    // tie resolves to the even final digit.
    let fmt = binary64_formatter();
    let v = Float::from_u64(2, false, 12, -5);
    let d = fmt.format(&v, Some(RoundingMode::HalfEven), 4);
    assert_eq!(d.scale, 0);
    assert_eq!(d.digits, [3, 8]);
}

#[test]
fn test_all_digits_round_up_flag() {
    // In all-digits mode the final increment is left to the caller.
    let fmt = binary64_formatter();
    let v = Float::from_u64(2, false, 12, -5);
    let d = fmt.format_all(&v, Some(RoundingMode::HalfEven), 4).unwrap();
    assert_eq!(d.scale, 0);
    assert_eq!(d.digits, [3, 7]);
    assert!(d.round_up);
    assert_eq!(d.adjusted(10), (0, vec![3, 8]));
}

#[test]
fn test_adjusted_carry_ripples() {
    let d = Digits {
        scale: 1,
        digits: vec![9, 9],
        round_up: true,
    };
    assert_eq!(d.adjusted(10), (2, vec![1, 0, 0]));

    let d = Digits {
        scale: 0,
        digits: vec![2, 9],
        round_up: true,
    };
    assert_eq!(d.adjusted(10), (0, vec![3, 0]));

    let d = Digits {
        scale: 0,
        digits: vec![2, 9],
        round_up: false,
    };
    assert_eq!(d.adjusted(10), (0, vec![2, 9]));
}

#[test]
fn test_all_digits_limit() {
    // A decimal fraction has no finite binary expansion; under a directed
    // mode the low boundary test can only close on an exact remainder, so
    // the digit bound must fire.
    let fmt = Formatter::new(10, Context::decimal(28).etiny(), 2).with_digit_limit(64);
    let v = Float::from_u64(10, false, 1, -1);
    let err = fmt.format_all(&v, Some(RoundingMode::Down), 1);
    assert_eq!(
        err,
        Err(FormatError::DigitLimitExceeded {
            radix: 2,
            limit: 64
        })
    );

    // The nearest modes close once the boundaries outgrow the remainder.
    assert!(fmt.format_all(&v, Some(RoundingMode::HalfEven), 1).is_ok());
}

#[test]
fn test_directed_modes_round_trip_one_ulp() {
    // Under `down` the rounding range is [v, v+), so the digits may land
    // anywhere below the next value up; reading them back with `down` must
    // recover v.
    use crate::reader::Reader;
    let ctx = Context::binary64();
    let fmt = binary64_formatter();
    for val in [0.1f64, 0.3, 2.5, 1995.1995, 1e-8, 123456.789e12] {
        for mode in [
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::Ceiling,
            RoundingMode::Floor,
        ] {
            let v = Float::from_f64(val);
            let d = fmt.format(&v, Some(mode), 53);
            let (scale, digits) = d.adjusted(10);
            let mut coeff = BigUint::zero();
            for dig in &digits {
                coeff = coeff * 10u32 + u32::from(*dig);
            }
            let mut reader = Reader::new();
            let back = reader.read(
                &ctx,
                mode,
                v.get_sign(),
                &coeff,
                scale - digits.len() as i64,
                10,
            );
            assert_eq!(back, v, "{} under {:?}", val, mode);
        }
    }
}

#[test]
fn test_scale_estimate_matches_exact_loop() {
    // The estimated scale path is a pure optimization: it must agree with
    // the exact loop on both the scale and the digits.
    let fmt = binary64_formatter();
    for val in [
        0.1f64,
        0.5,
        1.0,
        3.14159,
        1e300,
        1e-300,
        5e-324,
        1.7976931348623157e308,
        6.02214076e23,
        1.1e-10,
    ] {
        let v = Float::from_f64(val);
        let p = v.number_of_digits();

        let mut est = fmt.prepare(&v, Some(RoundingMode::HalfEven), p);
        fmt.scale_optimized(&v, &mut est);

        let mut plain = fmt.prepare(&v, Some(RoundingMode::HalfEven), p);
        fmt.scale(&mut plain);

        assert_eq!(est.k, plain.k, "scale for {}", val);
        assert_eq!(
            fmt.generate(est).digits,
            fmt.generate(plain).digits,
            "digits for {}",
            val
        );
    }
}

#[test]
fn test_scale_monotonic_in_value() {
    // Larger positive values never get a smaller scale.
    let fmt = binary64_formatter();
    let mut vals = [0.003f64, 0.1, 0.25, 1.0, 2.5, 1995.0, 1e10, 1e200];
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut last = i64::MIN;
    for val in vals {
        let d = fmt.format(&Float::from_f64(val), Some(RoundingMode::HalfEven), 53);
        assert!(d.scale >= last, "scale regressed at {}", val);
        last = d.scale;
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use crate::context::Context;
    use crate::reader::Reader;
    use proptest::prelude::*;

    fn read_back(ctx: &Context, mode: RoundingMode, sign: bool, d: &Digits) -> Float {
        let (scale, digits) = d.adjusted(10);
        let mut coeff = BigUint::zero();
        for dig in &digits {
            coeff = coeff * 10u32 + u32::from(*dig);
        }
        let mut reader = Reader::new();
        reader.read(ctx, mode, sign, &coeff, scale - digits.len() as i64, 10)
    }

    proptest! {
        // Property: reading the formatted digits reproduces the value, for
        // every rounding mode, across random doubles.
        #[test]
        fn roundtrip_binary64(bits in any::<u64>(), mode_idx in 0usize..7) {
            let val = f64::from_bits(bits);
            prop_assume!(val.is_finite());
            let modes = [
                RoundingMode::HalfEven,
                RoundingMode::HalfUp,
                RoundingMode::HalfDown,
                RoundingMode::Up,
                RoundingMode::Down,
                RoundingMode::Ceiling,
                RoundingMode::Floor,
            ];
            let mode = modes[mode_idx];
            let ctx = Context::binary64();
            let fmt = Formatter::new(2, ctx.etiny(), 10);
            let v = Float::from_f64(val).align(&ctx);
            let d = fmt.format(&v, Some(mode), 53);
            let back = read_back(&ctx, mode, v.get_sign(), &d);
            prop_assert_eq!(back, v);
        }

        // Property: the unknown-nearest form (None) round-trips under any
        // nearest mode.
        #[test]
        fn roundtrip_any_nearest(bits in any::<u64>()) {
            let val = f64::from_bits(bits);
            prop_assume!(val.is_finite());
            let ctx = Context::binary64();
            let fmt = Formatter::new(2, ctx.etiny(), 10);
            let v = Float::from_f64(val).align(&ctx);
            let d = fmt.format(&v, None, 53);
            for mode in [RoundingMode::HalfEven, RoundingMode::HalfUp, RoundingMode::HalfDown] {
                let back = read_back(&ctx, mode, v.get_sign(), &d);
                prop_assert_eq!(back, v.clone());
            }
        }

        // Property: the emitted sequence is minimal; dropping the last digit
        // (rounded either way) no longer reads back to the value.
        #[test]
        fn shortest_form_is_minimal(bits in any::<u64>()) {
            let val = f64::from_bits(bits);
            prop_assume!(val.is_finite() && val != 0.0);
            let ctx = Context::binary64();
            let fmt = Formatter::new(2, ctx.etiny(), 10);
            let v = Float::from_f64(val).align(&ctx);
            let d = fmt.format(&v, Some(RoundingMode::HalfEven), 53);
            prop_assume!(d.digits.len() > 1);

            for bump in [0u8, 1] {
                let mut shorter = d.digits.clone();
                shorter.pop();
                let mut coeff = BigUint::zero();
                for dig in &shorter {
                    coeff = coeff * 10u32 + u32::from(*dig);
                }
                coeff += u32::from(bump);
                let mut reader = Reader::new();
                let back = reader.read(
                    &ctx,
                    RoundingMode::HalfEven,
                    v.get_sign(),
                    &coeff,
                    d.scale - shorter.len() as i64,
                    10,
                );
                prop_assert_ne!(back, v.clone());
            }
        }

        // Property: decimal values round-trip through decimal text at the
        // context precision.
        #[test]
        fn roundtrip_decimal(coeff in 1u64..10_000_000, exp in -30i64..30, neg: bool) {
            let ctx = Context::decimal(7);
            let fmt = Formatter::new(10, ctx.etiny(), 10);
            let v = Float::new(10, neg, BigUint::from(coeff), exp);
            let p = v.number_of_digits();
            prop_assume!(p <= 7);
            let d = fmt.format(&v, Some(RoundingMode::HalfEven), p);
            let back = read_back(&ctx, RoundingMode::HalfEven, neg, &d);
            prop_assert_eq!(back, v);
        }
    }
}
