//! The floating-point value type: a sign, an integer coefficient, an integer
//! exponent and a radix. Values are not normalized on construction; the
//! coefficient keeps whatever digit count it was built with.

use crate::context::{Context, RoundingMode};
use core::cmp::Ordering;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Pow, ToPrimitive, Zero};

/// The categories of a floating point number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Normal,
    Zero,
    Infinity,
    NaN,
    SNaN,
}

/// An arbitrary-precision floating point number with an explicit radix:
/// the finite value is `(-1)^sign * coeff * radix^exp`.
#[derive(Debug, Clone)]
pub struct Float {
    // The numeric base of the coefficient and exponent.
    radix: u32,
    // The sign bit. True means negative.
    sign: bool,
    // The integer coefficient (significand), nonnegative.
    coeff: BigUint,
    // The exponent applied to the coefficient.
    exp: i64,
    // The kind of number this float represents.
    category: Category,
}

impl Float {
    /// Create a new finite floating point number. A zero coefficient
    /// canonicalizes to the zero category.
    pub fn new(radix: u32, sign: bool, coeff: BigUint, exp: i64) -> Self {
        debug_assert!(radix >= 2);
        if coeff.is_zero() {
            return Float::zero(radix, sign);
        }
        Float {
            radix,
            sign,
            coeff,
            exp,
            category: Category::Normal,
        }
    }

    /// Create a finite number from a small coefficient.
    pub fn from_u64(radix: u32, sign: bool, coeff: u64, exp: i64) -> Self {
        Float::new(radix, sign, BigUint::from(coeff), exp)
    }

    /// Returns a new zero float.
    pub fn zero(radix: u32, sign: bool) -> Self {
        Float {
            radix,
            sign,
            coeff: BigUint::zero(),
            exp: 0,
            category: Category::Zero,
        }
    }

    /// Returns a new infinity float.
    pub fn inf(radix: u32, sign: bool) -> Self {
        Float {
            radix,
            sign,
            coeff: BigUint::zero(),
            exp: 0,
            category: Category::Infinity,
        }
    }

    /// Returns a new quiet NaN float.
    pub fn nan(radix: u32, sign: bool) -> Self {
        Float {
            radix,
            sign,
            coeff: BigUint::zero(),
            exp: 0,
            category: Category::NaN,
        }
    }

    /// Returns a new signaling NaN float.
    pub fn snan(radix: u32, sign: bool) -> Self {
        Float {
            radix,
            sign,
            coeff: BigUint::zero(),
            exp: 0,
            category: Category::SNaN,
        }
    }

    /// The largest finite magnitude representable under `ctx`.
    pub fn max_finite(ctx: &Context, sign: bool) -> Self {
        let coeff = ctx.int_radix_power(ctx.precision() as u64) - 1u32;
        Float::new(ctx.radix(), sign, coeff, ctx.etop())
    }

    /// The smallest positive subnormal magnitude representable under `ctx`.
    pub fn min_subnormal(ctx: &Context, sign: bool) -> Self {
        Float::new(ctx.radix(), sign, BigUint::one(), ctx.etiny())
    }

    /// The result of an overflowing operation, per the rounding mode: the
    /// nearest modes and `up` overflow to infinity, `down` saturates at the
    /// largest finite value, and the sign-directed modes pick per sign.
    pub(crate) fn overflow(ctx: &Context, sign: bool) -> Self {
        let inf = Float::inf(ctx.radix(), sign);
        let max = Float::max_finite(ctx, sign);
        match ctx.rounding() {
            RoundingMode::HalfEven
            | RoundingMode::HalfUp
            | RoundingMode::HalfDown
            | RoundingMode::Up => inf,
            RoundingMode::Down => max,
            RoundingMode::Ceiling => {
                if sign {
                    max
                } else {
                    inf
                }
            }
            RoundingMode::Floor => {
                if sign {
                    inf
                } else {
                    max
                }
            }
        }
    }

    pub fn get_radix(&self) -> u32 {
        self.radix
    }

    /// Returns the sign of the float. True means negative.
    pub fn get_sign(&self) -> bool {
        self.sign
    }

    /// Update the sign of the float to `sign`. True means negative.
    pub fn set_sign(&mut self, sign: bool) {
        self.sign = sign;
    }

    /// Returns the coefficient of the float.
    pub fn get_coeff(&self) -> &BigUint {
        &self.coeff
    }

    /// Returns the exponent of the float.
    pub fn get_exp(&self) -> i64 {
        self.exp
    }

    /// Returns the category of the float.
    pub fn get_category(&self) -> Category {
        self.category
    }

    pub fn is_negative(&self) -> bool {
        self.sign
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.category, Category::Zero)
    }

    pub fn is_inf(&self) -> bool {
        matches!(self.category, Category::Infinity)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.category, Category::NaN)
    }

    pub fn is_snan(&self) -> bool {
        matches!(self.category, Category::SNaN)
    }

    /// Returns true if this number is normal (not zero, NaN or infinity).
    pub fn is_normal(&self) -> bool {
        matches!(self.category, Category::Normal)
    }

    /// Returns true if this number is finite (normal or zero).
    pub fn is_finite(&self) -> bool {
        matches!(self.category, Category::Normal | Category::Zero)
    }

    /// Returns a new float which has a flipped sign (negated value).
    pub fn neg(&self) -> Self {
        let mut n = self.clone();
        n.sign = !n.sign;
        n
    }

    /// The number of digits of the coefficient in the float's own radix.
    /// A zero coefficient counts as one digit.
    pub fn number_of_digits(&self) -> usize {
        if self.coeff.is_zero() {
            return 1;
        }
        if self.radix == 2 {
            return self.coeff.bits() as usize;
        }
        self.coeff.to_radix_le(self.radix).len()
    }

    /// The exponent of the most significant digit: the exponent the value
    /// would have in scientific notation with one digit before the point.
    pub fn adjusted_exponent(&self) -> i64 {
        debug_assert!(self.is_normal());
        self.exp + self.number_of_digits() as i64 - 1
    }

    /// Strips trailing zero digits from the coefficient, moving them into the
    /// exponent. This is the canonical form used for value comparisons.
    pub fn reduce(&self) -> Self {
        if !self.is_normal() {
            let mut n = self.clone();
            n.exp = 0;
            return n;
        }
        let radix = BigUint::from(self.radix);
        let mut coeff = self.coeff.clone();
        let mut exp = self.exp;
        loop {
            let (q, r) = coeff.div_rem(&radix);
            if !r.is_zero() {
                break;
            }
            coeff = q;
            exp += 1;
        }
        Float::new(self.radix, self.sign, coeff, exp)
    }

    /// The same value re-expressed on the context's representational grid:
    /// the coefficient is padded until it has the context precision or the
    /// exponent reaches etiny. Values built outside the context (such as
    /// IEEE subnormals, whose minimal form carries a short coefficient)
    /// must be aligned before formatting, so the digit generator sees the
    /// spacing of the context rather than the spacing implied by the
    /// minimal coefficient.
    pub fn align(&self, ctx: &Context) -> Self {
        debug_assert_eq!(self.radix, ctx.radix());
        if !self.is_normal() {
            return self.clone();
        }
        let (coeff, exp) = self.align_to_precision(ctx);
        Float::new(self.radix, self.sign, coeff, exp)
    }

    /// Pad the coefficient with trailing zeros up to the context precision,
    /// without dropping the exponent below etiny.
    fn align_to_precision(&self, ctx: &Context) -> (BigUint, i64) {
        let digits = self.number_of_digits() as i64;
        let p = ctx.precision() as i64;
        let room = self.exp - ctx.etiny();
        let pad = (p - digits).min(room).max(0);
        if pad == 0 {
            return (self.coeff.clone(), self.exp);
        }
        let scale = ctx.int_radix_power(pad as u64);
        (&self.coeff * scale, self.exp - pad)
    }

    // The next magnitude up at the context precision, treating the value as
    // positive. Overflows to infinity past the largest finite value.
    fn magnitude_next_up(&self, ctx: &Context) -> Self {
        let (coeff, exp) = self.align_to_precision(ctx);
        let coeff = coeff + 1u32;
        let limit = ctx.int_radix_power(ctx.precision() as u64);
        if coeff == limit {
            if exp < ctx.etop() {
                let low = ctx.int_radix_power(ctx.precision() as u64 - 1);
                return Float::new(self.radix, false, low, exp + 1);
            }
            return Float::inf(self.radix, false);
        }
        Float::new(self.radix, false, coeff, exp)
    }

    // The next magnitude down at the context precision, treating the value as
    // positive. Steps onto the subnormal range and down to zero.
    fn magnitude_next_down(&self, ctx: &Context) -> Self {
        let (coeff, exp) = self.align_to_precision(ctx);
        debug_assert!(!coeff.is_zero());
        let low = ctx.int_radix_power(ctx.precision() as u64 - 1);
        if coeff == low && exp > ctx.etiny() {
            let top = ctx.int_radix_power(ctx.precision() as u64) - 1u32;
            return Float::new(self.radix, false, top, exp - 1);
        }
        Float::new(self.radix, false, coeff - 1u32, exp)
    }

    /// The closest representable value larger than this one, at the context
    /// precision and exponent range.
    pub fn next_plus(&self, ctx: &Context) -> Self {
        debug_assert_eq!(self.radix, ctx.radix());
        match self.category {
            Category::NaN | Category::SNaN => self.clone(),
            Category::Infinity => {
                if self.sign {
                    Float::max_finite(ctx, true)
                } else {
                    self.clone()
                }
            }
            Category::Zero => Float::min_subnormal(ctx, false),
            Category::Normal => {
                if self.sign {
                    self.neg().magnitude_next_down(ctx).neg()
                } else {
                    self.magnitude_next_up(ctx)
                }
            }
        }
    }

    /// The closest representable value smaller than this one, at the context
    /// precision and exponent range.
    pub fn next_minus(&self, ctx: &Context) -> Self {
        debug_assert_eq!(self.radix, ctx.radix());
        match self.category {
            Category::NaN | Category::SNaN => self.clone(),
            Category::Infinity => {
                if self.sign {
                    self.clone()
                } else {
                    Float::max_finite(ctx, false)
                }
            }
            Category::Zero => Float::min_subnormal(ctx, true),
            Category::Normal => {
                if self.sign {
                    self.neg().magnitude_next_up(ctx).neg()
                } else {
                    self.magnitude_next_down(ctx)
                }
            }
        }
    }

    /// Decompose an `f64` into an exact binary float, including subnormals.
    pub fn from_f64(val: f64) -> Self {
        let bits = val.to_bits();
        let sign = (bits >> 63) == 1;
        let biased_exp = ((bits >> 52) & 0x7ff) as i64;
        let mantissa = bits & ((1u64 << 52) - 1);

        if biased_exp == 0x7ff {
            if mantissa == 0 {
                return Float::inf(2, sign);
            }
            return Float::nan(2, sign);
        }
        if biased_exp == 0 {
            // Zero or subnormal: no implicit leading bit.
            return Float::new(2, sign, BigUint::from(mantissa), -1074);
        }
        let coeff = mantissa | (1u64 << 52);
        Float::new(2, sign, BigUint::from(coeff), biased_exp - 1075)
    }

    /// An approximate `f64` rendition of the value. The coefficient is
    /// rounded to 53 bits and the scaling may overflow to infinity or
    /// underflow to zero.
    pub fn as_f64(&self) -> f64 {
        let sign = if self.sign { -1.0 } else { 1.0 };
        match self.category {
            Category::Zero => sign * 0.0,
            Category::Infinity => sign * f64::INFINITY,
            Category::NaN | Category::SNaN => f64::NAN,
            Category::Normal => {
                // Take at most 53 bits of the coefficient so the conversion
                // cannot lose the scaling to an intermediate overflow.
                let bits = self.coeff.bits();
                let (top, shift) = if bits > 53 {
                    let top = (&self.coeff >> (bits - 53) as usize)
                        .to_f64()
                        .unwrap_or(f64::INFINITY);
                    (top, (bits - 53) as i64)
                } else {
                    (self.coeff.to_f64().unwrap_or(0.0), 0)
                };
                if self.radix == 2 {
                    // Power-of-two scaling is exact; split it so neither half
                    // overflows on the way to a subnormal result.
                    let e = (self.exp + shift).clamp(-2200, 2200) as i32;
                    let h = e / 2;
                    return sign * top * 2f64.powi(h) * 2f64.powi(e - h);
                }
                let coeff = top * 2f64.powi(shift.clamp(0, 2000) as i32);
                let e = self.exp.clamp(-400, 400) as i32;
                sign * coeff * (self.radix as f64).powi(e)
            }
        }
    }

    // Exact cross-radix value comparison of two normal magnitudes:
    // c1 * r1^e1 <=> c2 * r2^e2, with both sides scaled to integers.
    fn magnitude_cmp(&self, other: &Self) -> Ordering {
        let a1 = (-self.exp).max(0) as u64;
        let a2 = (-other.exp).max(0) as u64;
        let r1 = BigUint::from(self.radix);
        let r2 = BigUint::from(other.radix);
        let lhs = &self.coeff
            * r1.clone().pow((self.exp + a1 as i64) as u64)
            * r2.clone().pow(a2);
        let rhs = &other.coeff
            * r2.pow((other.exp + a2 as i64) as u64)
            * r1.pow(a1);
        lhs.cmp(&rhs)
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        match (self.category, other.category) {
            (Category::Zero, Category::Zero) => true,
            (Category::Infinity, Category::Infinity) => self.sign == other.sign,
            (Category::Normal, Category::Normal) => {
                if self.sign != other.sign {
                    return false;
                }
                if self.radix == other.radix {
                    let a = self.reduce();
                    let b = other.reduce();
                    return a.coeff == b.coeff && a.exp == b.exp;
                }
                self.magnitude_cmp(other).is_eq()
            }
            _ => false,
        }
    }
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let bool_to_ord = |less: bool| -> Option<Ordering> {
            if less {
                Some(Ordering::Less)
            } else {
                Some(Ordering::Greater)
            }
        };

        match (self.category, other.category) {
            (Category::NaN | Category::SNaN, _) | (_, Category::NaN | Category::SNaN) => None,
            (Category::Zero, Category::Zero) => Some(Ordering::Equal),
            (Category::Infinity, Category::Infinity) => {
                if self.sign == other.sign {
                    Some(Ordering::Equal)
                } else {
                    bool_to_ord(self.sign)
                }
            }
            (Category::Infinity, _) => bool_to_ord(self.sign),
            (_, Category::Infinity) => bool_to_ord(!other.sign),
            (Category::Normal, Category::Zero) => bool_to_ord(self.sign),
            (Category::Zero, Category::Normal) => bool_to_ord(!other.sign),
            (Category::Normal, Category::Normal) => {
                if self.sign != other.sign {
                    return bool_to_ord(self.sign);
                }
                let mag = if self.radix == other.radix
                    && self.adjusted_exponent() != other.adjusted_exponent()
                {
                    self.adjusted_exponent().cmp(&other.adjusted_exponent())
                } else {
                    self.magnitude_cmp(other)
                };
                if self.sign {
                    Some(mag.reverse())
                } else {
                    Some(mag)
                }
            }
        }
    }
}

#[test]
fn test_from_f64_decomposition() {
    let one = Float::from_f64(1.0);
    assert_eq!(one.get_coeff(), &BigUint::from(1u64 << 52));
    assert_eq!(one.get_exp(), -52);

    let tenth = Float::from_f64(0.1);
    assert_eq!(tenth.get_coeff(), &BigUint::from(7205759403792794u64));
    assert_eq!(tenth.get_exp(), -56);
    let reduced = tenth.reduce();
    assert_eq!(reduced.get_coeff(), &BigUint::from(3602879701896397u64));
    assert_eq!(reduced.get_exp(), -55);

    // Smallest positive subnormal.
    let tiny = Float::from_f64(f64::from_bits(1));
    assert_eq!(tiny.get_coeff(), &BigUint::from(1u64));
    assert_eq!(tiny.get_exp(), -1074);

    assert!(Float::from_f64(f64::INFINITY).is_inf());
    assert!(Float::from_f64(f64::NAN).is_nan());
    assert!(Float::from_f64(-0.0).is_zero());
    assert!(Float::from_f64(-0.0).is_negative());
}

#[test]
fn test_as_f64_round_trip() {
    for val in [0.0, 1.0, -1.0, 0.1, 1995.1995, 1e300, 5e-324, -2.5] {
        assert_eq!(Float::from_f64(val).as_f64(), val);
    }
}

#[test]
fn test_number_of_digits() {
    assert_eq!(Float::from_u64(2, false, 12, -5).number_of_digits(), 4);
    assert_eq!(Float::from_u64(10, false, 90210, 0).number_of_digits(), 5);
    assert_eq!(Float::zero(10, false).number_of_digits(), 1);
}

#[test]
fn test_next_plus_minus() {
    let ctx = Context::binary(3, -6, 6);

    // 4 * 2^0: coefficients live in [4, 8).
    let x = Float::from_u64(2, false, 4, 0);
    let up = x.next_plus(&ctx);
    assert_eq!(up.get_coeff(), &BigUint::from(5u32));
    assert_eq!(up.get_exp(), 0);

    // Stepping down across the power-of-two boundary halves the spacing.
    let down = x.next_minus(&ctx);
    assert_eq!(down.get_coeff(), &BigUint::from(7u32));
    assert_eq!(down.get_exp(), -1);

    // The top coefficient carries into the next exponent.
    let y = Float::from_u64(2, false, 7, 0);
    let carried = y.next_plus(&ctx);
    assert_eq!(carried.get_coeff(), &BigUint::from(4u32));
    assert_eq!(carried.get_exp(), 1);

    // Past the largest finite value lies infinity.
    let top = Float::max_finite(&ctx, false);
    assert!(top.next_plus(&ctx).is_inf());

    // Zero steps onto the smallest subnormal.
    let z = Float::zero(2, false);
    assert_eq!(z.next_plus(&ctx), Float::min_subnormal(&ctx, false));
    assert!(z.next_minus(&ctx).is_negative());

    // Negative values mirror the positive steps.
    let neg = Float::from_u64(2, true, 4, 0);
    assert_eq!(neg.next_plus(&ctx), down.neg());
    assert_eq!(neg.next_minus(&ctx), Float::from_u64(2, true, 5, 0));
}

#[test]
fn test_align_to_context_grid() {
    let ctx = Context::binary64();

    // An IEEE subnormal re-expressed at the context's etiny.
    let v = Float::from_f64(5e-324);
    let a = v.align(&ctx);
    assert_eq!(a, v);
    assert_eq!(a.get_coeff(), &BigUint::from(8u32));
    assert_eq!(a.get_exp(), ctx.etiny());

    // A short normal value pads out to the full precision.
    let v = Float::from_u64(2, false, 3, 0);
    let a = v.align(&ctx);
    assert_eq!(a, v);
    assert_eq!(a.number_of_digits(), 53);

    // Full-precision values are already on the grid.
    let v = Float::from_f64(0.1);
    let a = v.align(&ctx);
    assert_eq!(a.get_coeff(), v.get_coeff());
    assert_eq!(a.get_exp(), v.get_exp());
}

#[test]
fn test_value_equality() {
    // 12 * 2^-5 == 3 * 2^-3.
    let a = Float::from_u64(2, false, 12, -5);
    let b = Float::from_u64(2, false, 3, -3);
    assert_eq!(a, b);

    // Zeros compare equal regardless of sign; NaN is not equal to itself.
    assert_eq!(Float::zero(2, true), Float::zero(2, false));
    assert_ne!(Float::nan(2, false), Float::nan(2, false));

    // Cross-radix: 0.5 in binary equals 5 * 10^-1 in decimal.
    let bin = Float::from_u64(2, false, 1, -1);
    let dec = Float::from_u64(10, false, 5, -1);
    assert_eq!(bin, dec);
    assert_ne!(bin, Float::from_u64(10, false, 51, -2));
}

#[test]
fn test_ordering() {
    let a = Float::from_u64(2, false, 5, 0);
    let b = Float::from_u64(2, false, 3, 1);
    assert!(a < b);
    assert!(a.neg() > b.neg());
    assert!(Float::zero(2, false) < a);
    assert!(Float::inf(2, true) < a.neg());
    assert!(a < Float::inf(2, false));
    assert!(Float::nan(2, false).partial_cmp(&a).is_none());
}
