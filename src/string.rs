//! This module contains the implementation of string conversion: parsing of
//! numeric literals through the [`Reader`] and rendering through the
//! [`Formatter`], plus the assembly of conventional fixed-point or scientific
//! notation.

use crate::context::Context;
use crate::float::{Category, Float};
use crate::formatter::Formatter;
use crate::reader::Reader;
use core::fmt::Display;
use num_bigint::BigUint;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the input provided was empty")]
    Empty,
    #[error("failed parsing the number part of a floating point literal")]
    Number,
    #[error("failed parsing the exponent of a floating point literal")]
    Exponent,
}

impl Float {
    /// Parse a numeric literal under `ctx`: optional sign, digit sequence
    /// with an optional radix point, optional exponent marker, or one of the
    /// special spellings (`Infinity`, `NaN`, `sNaN`). The literal is read in
    /// base 10 and converted to the context radix with the context rounding
    /// mode; the context's condition flags record whether the conversion was
    /// inexact, subnormal or out of range.
    pub fn from_str_ctx(value: &str, ctx: &mut Context) -> Result<Self, ParseError> {
        if value.is_empty() {
            return Err(ParseError::Empty);
        }

        // Handle the plus or minus in front of the number.
        let (sign, rest) = match value.as_bytes()[0] {
            b'-' => (true, &value[1..]),
            b'+' => (false, &value[1..]),
            _ => (false, value),
        };
        if rest.is_empty() {
            return Err(ParseError::Number);
        }

        if rest.eq_ignore_ascii_case("inf") || rest.eq_ignore_ascii_case("infinity") {
            return Ok(Float::inf(ctx.radix(), sign));
        }
        if rest.eq_ignore_ascii_case("nan") {
            return Ok(Float::nan(ctx.radix(), sign));
        }
        if rest.eq_ignore_ascii_case("snan") {
            return Ok(Float::snan(ctx.radix(), sign));
        }

        // Split off the exponent part. (Example: 565e+1)
        let (num_part, exp_part) = match rest.find(|c| c == 'e' || c == 'E') {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };
        let explicit_exp: i64 = match exp_part {
            Some(txt) => txt.parse().map_err(|_| ParseError::Exponent)?,
            None => 0,
        };

        // Split the digits around the radix point and fold them into a
        // single integer numerator.
        let (int_part, frac_part) = match num_part.split_once('.') {
            Some((l, r)) => (l, r),
            None => (num_part, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseError::Number);
        }
        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::Number);
        }
        let coeff = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or(ParseError::Number)?;
        let exp = explicit_exp - frac_part.len() as i64;

        let mut reader = Reader::new();
        let z = reader.read(ctx, ctx.rounding(), sign, &coeff, exp, 10);
        let exact = reader.exact().unwrap_or(true);
        Ok(fix_after_read(z, exact, ctx))
    }

    /// Render the value using the fewest digits that read back to it at its
    /// own precision, under the context rounding mode.
    pub fn to_text(&self, ctx: &Context) -> String {
        let sign = if self.get_sign() { "-" } else { "" };
        match self.get_category() {
            Category::Infinity => return format!("{}Infinity", sign),
            Category::NaN => return format!("{}NaN", sign),
            Category::SNaN => return format!("{}sNaN", sign),
            Category::Normal | Category::Zero => {}
        }

        let v = self.align(ctx);
        let p = ctx.precision().max(v.number_of_digits());
        let fmt = Formatter::new(v.get_radix(), ctx.etiny(), 10);
        let digits = fmt.format(&v, Some(ctx.rounding()), p);
        let (dec_pos, digs) = digits.adjusted(10);
        format!("{}{}", sign, assemble(dec_pos, &digs, 10))
    }
}

// Apply the context's range to a freshly read value and record the
// conditions it ran into.
fn fix_after_read(z: Float, exact: bool, ctx: &mut Context) -> Float {
    if !exact {
        raise(ctx, "inexact");
        raise(ctx, "rounded");
    }
    if z.is_normal() {
        if z.adjusted_exponent() > ctx.emax() {
            raise(ctx, "overflow");
            raise(ctx, "inexact");
            raise(ctx, "rounded");
            return Float::overflow(ctx, z.get_sign());
        }
        if z.adjusted_exponent() < ctx.emin() {
            raise(ctx, "subnormal");
            if !exact {
                raise(ctx, "underflow");
            }
        }
    } else if z.is_zero() && !exact {
        // The magnitude rounded all the way down to zero.
        raise(ctx, "subnormal");
        raise(ctx, "underflow");
    }
    z
}

// The condition set is fixed; the names are statically part of it.
fn raise(ctx: &mut Context, name: &str) {
    ctx.flags_mut()
        .set(name, true)
        .expect("name belongs to the condition set");
}

// Reassemble the scale and digit sequence into conventional notation:
// plain fixed-point when the radix point lands near the digits, scientific
// notation otherwise.
fn assemble(dec_pos: i64, digits: &[u8], radix: u32) -> String {
    let chars: String = digits
        .iter()
        .map(|d| char::from_digit(*d as u32, radix).expect("digit below the radix"))
        .collect();
    let len = digits.len() as i64;
    if dec_pos <= 0 {
        if dec_pos >= -4 && len <= 15 {
            format!("0.{}{}", "0".repeat((-dec_pos) as usize), chars)
        } else {
            scientific(&chars, dec_pos)
        }
    } else if dec_pos > len {
        if dec_pos <= 20 {
            format!("{}{}", chars, "0".repeat((dec_pos - len) as usize))
        } else {
            scientific(&chars, dec_pos)
        }
    } else if dec_pos != len {
        format!(
            "{}.{}",
            &chars[..dec_pos as usize],
            &chars[dec_pos as usize..]
        )
    } else {
        chars
    }
}

fn scientific(chars: &str, dec_pos: i64) -> String {
    if chars.len() == 1 {
        format!("{}E{}", chars, dec_pos - 1)
    } else {
        format!("{}.{}E{}", &chars[..1], &chars[1..], dec_pos - 1)
    }
}

impl Display for Float {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // A wide default context: half-even, exponents far out of the way.
        let ctx = Context::new(
            self.get_radix(),
            self.number_of_digits(),
            crate::context::RoundingMode::HalfEven,
            -999_999_999,
            999_999_999,
        );
        write!(f, "{}", self.to_text(&ctx))
    }
}

#[test]
fn test_to_text_values() {
    let ctx = Context::binary64();
    let text = |val: f64| Float::from_f64(val).to_text(&ctx);

    assert_eq!(text(0.1), "0.1");
    assert_eq!(text(0.5), "0.5");
    assert_eq!(text(0.3), "0.3");
    assert_eq!(text(1.0), "1");
    assert_eq!(text(256.0), "256");
    assert_eq!(text(1995.5), "1995.5");
    assert_eq!(text(-2.5), "-2.5");
    assert_eq!(text(0.00001), "0.00001");
    assert_eq!(text(1e15), "1000000000000000");
    assert_eq!(text(1e300), "1E300");
    assert_eq!(text(5e-324), "5E-324");
    assert_eq!(text(0.0), "0.0");
    assert_eq!(text(-0.0), "-0.0");
    assert_eq!(text(f64::INFINITY), "Infinity");
    assert_eq!(text(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(text(f64::NAN), "NaN");
    assert_eq!(Float::snan(2, true).to_text(&ctx), "-sNaN");
}

#[test]
fn test_display_uses_shortest_form() {
    use std::string::ToString;
    assert_eq!(Float::from_f64(1995.1995).to_string(), "1995.1995");
    assert_eq!(Float::from_u64(10, false, 25, -1).to_string(), "2.5");
    assert_eq!(Float::from_u64(10, true, 5, 3).to_string(), "-5000");
}

#[test]
fn test_from_str_ctx() {
    let mut ctx = Context::binary64();

    let z = Float::from_str_ctx("0.1", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(0.1));
    assert!(ctx.flags().get("inexact").unwrap());
    assert!(ctx.flags().get("rounded").unwrap());

    let mut ctx = Context::binary64();
    let z = Float::from_str_ctx("0.5", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(0.5));
    assert!(!ctx.flags().any());

    let z = Float::from_str_ctx("-54.85e-1", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(-5.485));
    let z = Float::from_str_ctx("3.2e1", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(32.0));
    let z = Float::from_str_ctx("+30", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(30.0));
    let z = Float::from_str_ctx("44.E-1", &mut ctx).unwrap();
    assert_eq!(z, Float::from_f64(4.4));
}

#[test]
fn test_parse_errors() {
    let mut ctx = Context::binary64();
    assert_eq!(Float::from_str_ctx("", &mut ctx), Err(ParseError::Empty));
    assert_eq!(
        Float::from_str_ctx("abc.de", &mut ctx),
        Err(ParseError::Number)
    );
    assert_eq!(
        Float::from_str_ctx("e.-21", &mut ctx),
        Err(ParseError::Exponent)
    );
    assert_eq!(
        Float::from_str_ctx("-rlp.", &mut ctx),
        Err(ParseError::Number)
    );
    assert_eq!(Float::from_str_ctx("-", &mut ctx), Err(ParseError::Number));
    assert_eq!(
        Float::from_str_ctx("1e", &mut ctx),
        Err(ParseError::Exponent)
    );
    assert_eq!(Float::from_str_ctx(".", &mut ctx), Err(ParseError::Number));
}

#[test]
fn test_parse_specials() {
    let mut ctx = Context::binary64();
    assert!(Float::from_str_ctx("inf", &mut ctx).unwrap().is_inf());
    let z = Float::from_str_ctx("-Infinity", &mut ctx).unwrap();
    assert!(z.is_inf() && z.is_negative());
    assert!(Float::from_str_ctx("NaN", &mut ctx).unwrap().is_nan());
    assert!(Float::from_str_ctx("sNaN", &mut ctx).unwrap().is_snan());
    let z = Float::from_str_ctx("-snan", &mut ctx).unwrap();
    assert!(z.is_snan() && z.is_negative());
}

#[test]
fn test_overflow_literals() {
    use crate::context::RoundingMode;

    let mut ctx = Context::binary64();
    let z = Float::from_str_ctx("1e400", &mut ctx).unwrap();
    assert!(z.is_inf());
    assert!(ctx.flags().get("overflow").unwrap());
    assert!(ctx.flags().get("inexact").unwrap());

    // Toward-zero rounding saturates at the largest finite value.
    let mut ctx = Context::binary64();
    ctx.set_rounding(RoundingMode::Down);
    let z = Float::from_str_ctx("1e400", &mut ctx).unwrap();
    assert_eq!(z, Float::max_finite(&ctx, false));

    // Ceiling on a negative overflow stops at the negative maximum.
    let mut ctx = Context::binary64();
    ctx.set_rounding(RoundingMode::Ceiling);
    let z = Float::from_str_ctx("-1e400", &mut ctx).unwrap();
    assert_eq!(z, Float::max_finite(&ctx, true));
    let z = Float::from_str_ctx("1e400", &mut ctx).unwrap();
    assert!(z.is_inf());
}

#[test]
fn test_underflow_literals() {
    let mut ctx = Context::binary64();
    let z = Float::from_str_ctx("1e-310", &mut ctx).unwrap();
    assert!(z.is_normal());
    assert_eq!(z.get_exp(), ctx.etiny());
    assert!(ctx.flags().get("subnormal").unwrap());
    assert!(ctx.flags().get("underflow").unwrap());

    let mut ctx = Context::binary64();
    let z = Float::from_str_ctx("1e-400", &mut ctx).unwrap();
    assert!(z.is_zero());
    assert!(ctx.flags().get("underflow").unwrap());
}

#[test]
fn test_parse_print_fuzz() {
    use crate::utils::Lfsr;

    // Print five hundred pseudorandom doubles and read them back.
    let mut lfsr = Lfsr::new();
    let ctx = Context::binary64();
    for _ in 0..500 {
        let v0 = lfsr.get64();
        let f0 = f64::from_bits(v0);
        if !f0.is_finite() {
            continue;
        }
        let v = Float::from_f64(f0);
        let text = v.to_text(&ctx);
        let mut rctx = ctx.clone();
        let back = Float::from_str_ctx(&text, &mut rctx).unwrap();
        assert_eq!(back, v, "{}", text);
    }
}

#[test]
fn test_round_trip_per_mode() {
    use crate::context::RoundingMode::*;

    for mode in [HalfEven, HalfUp, HalfDown, Up, Down, Ceiling, Floor] {
        let mut ctx = Context::binary64();
        ctx.set_rounding(mode);
        for val in [0.1f64, -0.1, 0.3, 2.5, -1995.1995, 1e-8, 6.02214076e23] {
            let v = Float::from_f64(val);
            let text = v.to_text(&ctx);
            let back = Float::from_str_ctx(&text, &mut ctx).unwrap();
            assert_eq!(back, v, "{} under {:?}", text, mode);
        }
    }
}

#[test]
fn test_decimal_context_round_trip() {
    // Decimal values print exactly and re-read exactly.
    let mut ctx = Context::decimal(28);
    let z = Float::from_str_ctx("123.456", &mut ctx).unwrap();
    assert!(!ctx.flags().any());
    assert_eq!(z.reduce(), Float::from_u64(10, false, 123456, -3));
    assert_eq!(z.to_text(&ctx), "123.456");
}
