//! Reading: conversion of free-format numeric literals to correctly-rounded
//! fixed-precision values, using Clinger's Algorithm M. The input is taken as
//! the exact value `f * input_radix^e`; the result is the closest value
//! representable at the context precision under the requested rounding mode.

use crate::context::{Context, RoundingMode};
use crate::float::Float;
use core::cmp::Ordering;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Pow, Zero};

/// Converts exact (coefficient, exponent) pairs in an input radix into
/// floating point numbers in the context radix. The reader records whether
/// the last conversion preserved the input value exactly.
#[derive(Debug, Default)]
pub struct Reader {
    exact: Option<bool>,
}

impl Reader {
    pub fn new() -> Self {
        Reader { exact: None }
    }

    /// Whether the last `read` call was exact: true iff no information was
    /// lost. None before the first call.
    pub fn exact(&self) -> Option<bool> {
        self.exact
    }

    /// Given exact integers `f` and `e`, with `f` nonnegative, returns the
    /// floating-point number closest to `f * input_radix^e` under `rounding`,
    /// at the context precision. The exponent is clamped to the context's
    /// range: tiny values terminate at etiny (producing a subnormal
    /// coefficient) and huge values at etop (producing an overflowed
    /// coefficient for the caller to resolve).
    pub fn read(
        &mut self,
        ctx: &Context,
        rounding: RoundingMode,
        sign: bool,
        f: &BigUint,
        e: i64,
        input_radix: u32,
    ) -> Float {
        debug_assert!(input_radix >= 2);
        // The loop below works on the magnitude, so the two sign-directed
        // modes must trade places for negative inputs.
        let rounding = if sign { rounding.for_negative() } else { rounding };

        // The scaling loop is undefined for a zero numerator.
        if f.is_zero() {
            self.exact = Some(true);
            return Float::zero(ctx.radix(), sign);
        }

        // Represent the exact input as the ratio u/v scaled by radix^k.
        let ib = BigUint::from(input_radix);
        let (mut u, mut v) = if e < 0 {
            (f.clone(), ib.pow((-e) as u64))
        } else {
            (f * ib.pow(e as u64), BigUint::one())
        };
        let mut k: i64 = 0;

        // Automatic precision: derive the working precision from a rough
        // bit-length estimate of the input magnitude. The caller's context is
        // left untouched; the override lives in a call-local copy.
        let working;
        let wctx = if ctx.is_exact() {
            let mut c = ctx.clone();
            c.set_precision((u.bits() as usize).max(1));
            c.set_exact(false);
            working = c;
            &working
        } else {
            ctx
        };

        let n = wctx.precision() as u64;
        let min_e = wctx.etiny();
        let max_e = wctx.etop();

        let rp_n = wctx.int_radix_power(n);
        let rp_n_1 = wctx.int_radix_power(n - 1);
        let radix = BigUint::from(wctx.radix());

        // Rescale until the quotient has exactly n digits, or the exponent
        // hits the denormal or overflow clamp.
        loop {
            let x = &u / &v;
            if (x >= rp_n_1 && x < rp_n) || k == min_e || k == max_e {
                let (mut z, exact) = Self::ratio_float(wctx, rounding, &u, &v, k);
                self.exact = Some(exact);
                z.set_sign(sign);
                return z;
            } else if x < rp_n_1 {
                u *= &radix;
                k -= 1;
            } else {
                v *= &radix;
                k += 1;
            }
        }
    }

    // Given exact positive integers u and v, returns the floating point
    // number closest to (u/v) * radix^k and whether the quotient was exact.
    // Handles only positive magnitudes; ceiling and floor must have been
    // swapped before this point.
    fn ratio_float(
        ctx: &Context,
        rounding: RoundingMode,
        u: &BigUint,
        v: &BigUint,
        k: i64,
    ) -> (Float, bool) {
        let (q, r) = u.div_rem(v);
        let v_r = v - &r;
        let exact = r.is_zero();
        let q_even = q.is_even();
        let z = Float::new(ctx.radix(), false, q, k);

        let z = match rounding {
            RoundingMode::Down | RoundingMode::Floor => z,
            RoundingMode::Up | RoundingMode::Ceiling => {
                if exact {
                    z
                } else {
                    z.next_plus(ctx)
                }
            }
            _ => match r.cmp(&v_r) {
                Ordering::Less => z,
                Ordering::Greater => z.next_plus(ctx),
                Ordering::Equal => match rounding {
                    RoundingMode::HalfDown => z,
                    RoundingMode::HalfEven if q_even => z,
                    _ => z.next_plus(ctx),
                },
            },
        };
        (z, exact)
    }
}

#[cfg(test)]
fn read_decimal(ctx: &Context, rounding: RoundingMode, text: &str, e: i64) -> (Float, bool) {
    let mut reader = Reader::new();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let f = BigUint::parse_bytes(digits.as_bytes(), 10).unwrap();
    let z = reader.read(ctx, rounding, sign, &f, e, 10);
    (z, reader.exact().unwrap())
}

#[test]
fn test_read_tenth_binary64() {
    use crate::context::RoundingMode::HalfEven;
    let ctx = Context::binary64();

    // 0.1 must land on the IEEE double encoding, inexactly.
    let (z, exact) = read_decimal(&ctx, HalfEven, "1", -1);
    assert!(!exact);
    let z = z.reduce();
    assert_eq!(z.get_coeff(), &BigUint::from(3602879701896397u64));
    assert_eq!(z.get_exp(), -55);
    assert_eq!(z.as_f64(), 0.1);
}

#[test]
fn test_read_exact_values() {
    use crate::context::RoundingMode::HalfEven;
    let ctx = Context::binary64();

    let (z, exact) = read_decimal(&ctx, HalfEven, "5", -1);
    assert!(exact);
    assert_eq!(z.as_f64(), 0.5);

    let (z, exact) = read_decimal(&ctx, HalfEven, "1995", 0);
    assert!(exact);
    assert_eq!(z.as_f64(), 1995.0);

    let (z, exact) = read_decimal(&ctx, HalfEven, "0", 7);
    assert!(exact);
    assert!(z.is_zero());
}

#[test]
fn test_read_directed_modes() {
    use crate::context::RoundingMode::{Ceiling, Down, Floor, Up};
    let ctx = Context::binary64();

    // 0.1 truncates one ulp below the nearest value under down/floor.
    let (down, _) = read_decimal(&ctx, Down, "1", -1);
    assert_eq!(down.get_coeff(), &BigUint::from(7205759403792793u64));
    assert_eq!(down.get_exp(), -56);
    let (floor, _) = read_decimal(&ctx, Floor, "1", -1);
    assert_eq!(down, floor);

    let (up, _) = read_decimal(&ctx, Up, "1", -1);
    assert_eq!(up.reduce().get_coeff(), &BigUint::from(3602879701896397u64));
    let (ceil, _) = read_decimal(&ctx, Ceiling, "1", -1);
    assert_eq!(up, ceil);

    // For negative inputs ceiling truncates and floor rounds the magnitude up.
    let (nceil, _) = read_decimal(&ctx, Ceiling, "-1", -1);
    assert_eq!(nceil.neg(), down);
    let (nfloor, _) = read_decimal(&ctx, Floor, "-1", -1);
    assert_eq!(nfloor.neg(), up);
}

#[test]
fn test_read_tie_breaks() {
    use crate::context::RoundingMode::{Down, HalfDown, HalfEven, HalfUp, Up};
    // At two bits of precision, 2.5 sits exactly between 2 and 3.
    let ctx = Context::binary(2, -64, 64);

    let expect = |mode, coeff: u64| {
        let (z, exact) = read_decimal(&ctx, mode, "25", -1);
        assert!(!exact);
        assert_eq!(z, Float::from_u64(2, false, coeff, 0), "{:?}", mode);
    };
    expect(HalfEven, 2); // ties to the even coefficient
    expect(HalfUp, 3);
    expect(HalfDown, 2);
    expect(Up, 3);
    expect(Down, 2);

    // 3.5 is a tie whose even neighbor is above.
    let (z, _) = read_decimal(&ctx, HalfEven, "35", -1);
    assert_eq!(z, Float::from_u64(2, false, 2, 1));
}

#[test]
fn test_read_denormal_clamp() {
    use crate::context::RoundingMode::HalfEven;
    let ctx = Context::binary64();

    // 1e-310 is below the normal range: the scale stops at etiny and the
    // coefficient comes out short.
    let (z, exact) = read_decimal(&ctx, HalfEven, "1", -310);
    assert!(!exact);
    assert_eq!(z.get_exp(), ctx.etiny());
    assert_eq!(z.get_coeff().bits(), 48);

    // Far below the tiniest subnormal the magnitude rounds to zero, but a
    // directed round away from zero holds on to the smallest subnormal.
    let (z, exact) = read_decimal(&ctx, HalfEven, "1", -400);
    assert!(!exact);
    assert!(z.is_zero());
    let (z, _) = read_decimal(&ctx, crate::RoundingMode::Up, "1", -400);
    assert_eq!(z, Float::min_subnormal(&ctx, false));
}

#[test]
fn test_read_exact_mode_precision() {
    use crate::context::RoundingMode::HalfEven;
    let ctx = Context::exact_binary();

    // 0.125 is exactly representable; automatic precision finds it.
    let (z, exact) = read_decimal(&ctx, HalfEven, "125", -3);
    assert!(exact);
    let z = z.reduce();
    assert_eq!(z.get_coeff(), &BigUint::from(1u32));
    assert_eq!(z.get_exp(), -3);

    // 3125e-5 == 2^-5.
    let (z, exact) = read_decimal(&ctx, HalfEven, "3125", -5);
    assert!(exact);
    assert_eq!(z.as_f64(), 0.03125);
}

#[test]
fn test_read_binary_to_decimal() {
    use crate::context::RoundingMode::HalfEven;
    let ctx = Context::decimal(10);

    // 3 * 2^-2 == 0.75 exactly.
    let mut reader = Reader::new();
    let z = reader.read(&ctx, HalfEven, false, &BigUint::from(3u32), -2, 2);
    assert_eq!(reader.exact(), Some(true));
    assert_eq!(z.reduce(), Float::from_u64(10, false, 75, -2));

    // 1/2^60 needs more than ten decimal digits, so it rounds.
    let z = reader.read(&ctx, HalfEven, false, &BigUint::one(), -60, 2);
    assert_eq!(reader.exact(), Some(false));
    assert_eq!(z.get_coeff().to_string(), "8673617380");
    assert_eq!(z.get_exp(), -28);
}
