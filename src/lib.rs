//! Arbitrary-precision floating-point numbers in binary and decimal radixes,
//! with correctly-rounded conversion between numeric text literals and
//! fixed-precision values.
//!
//! The two non-trivial pieces are the [`Reader`], which implements Clinger's
//! Algorithm M for reading free-format literals with correct rounding, and the
//! [`Formatter`], which implements the Burger-Dybvig free-format printing
//! algorithm: it emits the shortest digit sequence that reads back to the
//! original value at the same precision and rounding mode. Both operate on
//! exact big-integer arithmetic only.
//!
//! ```
//! use fltnum::{Context, Float};
//!
//! let mut ctx = Context::binary64();
//! let x = Float::from_str_ctx("0.1", &mut ctx).unwrap();
//! assert_eq!(x.to_text(&ctx), "0.1");
//! ```

mod context;
mod flags;
mod float;
mod formatter;
mod reader;
mod string;
#[cfg(test)]
mod utils;

pub use self::context::{condition_flags, Context, RoundingMode};
pub use self::flags::{FlagError, FlagValues, Flags};
pub use self::float::{Category, Float};
pub use self::formatter::{Digits, FormatError, Formatter};
pub use self::reader::Reader;
pub use self::string::ParseError;
