//! The arithmetic context: radix, precision, rounding mode, exponent range,
//! and the condition flags raised by conversions.

use crate::flags::{FlagValues, Flags};
use num_bigint::BigUint;
use num_traits::Pow;

/// Defines the supported rounding modes. The names follow the General Decimal
/// Arithmetic convention: `Up` rounds away from zero, `Down` toward zero,
/// `Ceiling` toward positive infinity and `Floor` toward negative infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    HalfEven,
    HalfUp,
    HalfDown,
    Up,
    Down,
    Ceiling,
    Floor,
}

impl RoundingMode {
    /// The mode to apply to a magnitude when the value is negative. The
    /// conversion algorithms work on positive magnitudes only, so the two
    /// sign-directed modes trade places.
    pub(crate) fn for_negative(self) -> Self {
        match self {
            RoundingMode::Ceiling => RoundingMode::Floor,
            RoundingMode::Floor => RoundingMode::Ceiling,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingMode::HalfEven => "half_even",
            RoundingMode::HalfUp => "half_up",
            RoundingMode::HalfDown => "half_down",
            RoundingMode::Up => "up",
            RoundingMode::Down => "down",
            RoundingMode::Ceiling => "ceiling",
            RoundingMode::Floor => "floor",
        }
    }
}

/// The standard condition set tracked by a context.
pub fn condition_flags() -> FlagValues {
    FlagValues::new([
        "inexact",
        "rounded",
        "subnormal",
        "underflow",
        "overflow",
        "clamped",
        "invalid_operation",
        "division_by_zero",
    ])
    .expect("condition flag names are valid identifiers")
}

/// The arithmetic context. A context is immutable for the duration of a
/// conversion call; the text-conversion layer raises condition flags on it
/// after the fact.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    radix: u32,
    precision: usize,
    rounding: RoundingMode,
    emin: i64,
    emax: i64,
    exact: bool,
    flags: Flags,
    traps: Flags,
}

impl Context {
    /// Create a new context. The precision is a digit count in the context's
    /// own radix; `emin`/`emax` bound the adjusted exponent.
    pub fn new(
        radix: u32,
        precision: usize,
        rounding: RoundingMode,
        emin: i64,
        emax: i64,
    ) -> Self {
        assert!(radix >= 2, "radix must be at least 2");
        assert!(precision >= 1, "precision must be at least one digit");
        Context {
            radix,
            precision,
            rounding,
            emin,
            emax,
            exact: false,
            flags: Flags::new(condition_flags()),
            traps: Flags::new(condition_flags()),
        }
    }

    /// A binary context matching IEEE-754 double precision.
    pub fn binary64() -> Self {
        Context::new(2, 53, RoundingMode::HalfEven, -1025, 1023)
    }

    /// A binary context with the given precision and exponent range.
    pub fn binary(precision: usize, emin: i64, emax: i64) -> Self {
        Context::new(2, precision, RoundingMode::HalfEven, emin, emax)
    }

    /// A decimal context with the given precision and the default wide
    /// exponent range.
    pub fn decimal(precision: usize) -> Self {
        Context::new(10, precision, RoundingMode::HalfEven, -999_999_999, 999_999_999)
    }

    /// An exact-mode context: conversions pick a working precision large
    /// enough to represent the input exactly when possible.
    pub fn exact_binary() -> Self {
        let mut ctx = Context::binary64();
        ctx.exact = true;
        ctx
    }

    pub fn radix(&self) -> u32 {
        self.radix
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn set_precision(&mut self, precision: usize) {
        assert!(precision >= 1, "precision must be at least one digit");
        self.precision = precision;
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn set_rounding(&mut self, rounding: RoundingMode) {
        self.rounding = rounding;
    }

    pub fn emin(&self) -> i64 {
        self.emin
    }

    pub fn emax(&self) -> i64 {
        self.emax
    }

    /// True if the context requests automatic (exact) working precision.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn set_exact(&mut self, exact: bool) {
        self.exact = exact;
    }

    /// The minimum exponent of the coefficient: the exponent at which the
    /// smallest subnormal has a one-digit coefficient.
    pub fn etiny(&self) -> i64 {
        self.emin - self.precision as i64 + 1
    }

    /// The maximum exponent of the coefficient, reached by the largest
    /// representable magnitude.
    pub fn etop(&self) -> i64 {
        self.emax - self.precision as i64 + 1
    }

    /// `radix^n` as a big integer.
    pub fn int_radix_power(&self, n: u64) -> BigUint {
        BigUint::from(self.radix).pow(n)
    }

    /// The raised condition flags.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// The enabled traps. The core never consults these; they are carried for
    /// the surrounding arithmetic engine.
    pub fn traps(&self) -> &Flags {
        &self.traps
    }

    pub fn traps_mut(&mut self) -> &mut Flags {
        &mut self.traps
    }
}

#[test]
fn test_exponent_bounds() {
    let ctx = Context::binary64();
    assert_eq!(ctx.etiny(), -1077);
    assert_eq!(ctx.etop(), 971);

    let ctx = Context::decimal(28);
    assert_eq!(ctx.etiny(), -1_000_000_026);
    assert_eq!(ctx.etop(), 999_999_972);
}

#[test]
fn test_condition_flag_set() {
    let fv = condition_flags();
    assert_eq!(fv.len(), 8);
    assert_eq!(fv.all_flags_value(), 255);
    assert_eq!(fv.bit("inexact").unwrap(), 1);
    assert_eq!(fv.bit("division_by_zero").unwrap(), 128);
}

#[test]
fn test_radix_power() {
    use num_traits::ToPrimitive;
    let ctx = Context::decimal(5);
    assert_eq!(ctx.int_radix_power(0).to_u64().unwrap(), 1);
    assert_eq!(ctx.int_radix_power(9).to_u64().unwrap(), 1_000_000_000);
}

#[test]
fn test_negative_swap() {
    assert_eq!(RoundingMode::Ceiling.for_negative(), RoundingMode::Floor);
    assert_eq!(RoundingMode::Floor.for_negative(), RoundingMode::Ceiling);
    assert_eq!(RoundingMode::HalfEven.for_negative(), RoundingMode::HalfEven);
    assert_eq!(RoundingMode::Down.for_negative(), RoundingMode::Down);
}
