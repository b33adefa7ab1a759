//! This module contains the flag infrastructure: named conditions packed into
//! a bit-vector, used by the arithmetic context to track raised flags and
//! enabled traps.

use thiserror::Error;

/// Errors raised by the flag infrastructure. All of them signal a contract
/// violation by the caller and are never recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// A flag name is not a valid identifier, is a duplicate, or the set of
    /// names does not fit in the bit-vector.
    #[error("flags must be named by unique identifiers; invalid flag name: {0:?}")]
    InvalidFlagType(String),
    /// A flag name is not part of the associated [`FlagValues`].
    #[error("invalid flag: {0:?}")]
    InvalidFlag(String),
    /// A bit pattern has bits outside the valid range of the mapping.
    #[error("invalid bits value: {0:#x}")]
    InvalidBits(u64),
}

/// Assigns a bit value to each named condition so that a set of conditions can
/// be stored as an integer. The i-th name in declaration order gets the value
/// `2^i`, so the n names together span exactly the bits of `[0, 2^n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValues {
    names: Vec<String>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FlagValues {
    /// Create a mapping from the flag names, assigning bit values in
    /// declaration order.
    pub fn new<I, S>(names: I) -> Result<Self, FlagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !is_identifier(name) || out.iter().any(|n| n == name) {
                return Err(FlagError::InvalidFlagType(name.to_string()));
            }
            out.push(name.to_string());
        }
        // The bit-vector is a u64.
        if out.len() > 64 {
            return Err(FlagError::InvalidFlagType(out.swap_remove(64)));
        }
        Ok(FlagValues { names: out })
    }

    /// Returns the bit value of `flag`.
    pub fn bit(&self, flag: &str) -> Result<u64, FlagError> {
        match self.names.iter().position(|n| n == flag) {
            Some(idx) => Ok(1u64 << idx),
            None => Err(FlagError::InvalidFlag(flag.to_string())),
        }
    }

    /// Returns true if `flag` is part of this mapping.
    pub fn contains(&self, flag: &str) -> bool {
        self.names.iter().any(|n| n == flag)
    }

    /// Number of flags in the mapping.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The bit pattern with every flag set.
    pub fn all_flags_value(&self) -> u64 {
        if self.names.len() == 64 {
            u64::MAX
        } else {
            (1u64 << self.names.len()) - 1
        }
    }

    /// Iterate over the (name, bit value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), 1u64 << i))
    }
}

/// A set of named boolean flags, keyed by a [`FlagValues`] mapping and stored
/// as a packed integer. Pure value-type semantics; no interior mutability.
#[derive(Debug, Clone)]
pub struct Flags {
    values: FlagValues,
    bits: u64,
}

impl Flags {
    /// Create an all-clear flag set over `values`.
    pub fn new(values: FlagValues) -> Self {
        Flags { values, bits: 0 }
    }

    /// Create a flag set with the named flags raised.
    pub fn with_set(values: FlagValues, set: &[&str]) -> Result<Self, FlagError> {
        let mut flags = Flags::new(values);
        for name in set {
            flags.set(name, true)?;
        }
        Ok(flags)
    }

    /// The mapping this set is keyed by.
    pub fn values(&self) -> &FlagValues {
        &self.values
    }

    /// Returns the setting of `flag`.
    pub fn get(&self, flag: &str) -> Result<bool, FlagError> {
        let bit = self.values.bit(flag)?;
        Ok(self.bits & bit != 0)
    }

    /// Sets `flag` to `value`.
    pub fn set(&mut self, flag: &str, value: bool) -> Result<(), FlagError> {
        let bit = self.values.bit(flag)?;
        if value {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
        Ok(())
    }

    /// Clears `flag`.
    pub fn clear(&mut self, flag: &str) -> Result<(), FlagError> {
        self.set(flag, false)
    }

    /// Clears every flag.
    pub fn clear_all(&mut self) {
        self.bits = 0;
    }

    /// Sets every flag.
    pub fn set_all(&mut self) {
        self.bits = self.values.all_flags_value();
    }

    /// The flags as a packed integer.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Replaces the entire flag set with the pattern `bits`. The pattern must
    /// not have bits outside the mapping's range.
    pub fn set_bits(&mut self, bits: u64) -> Result<(), FlagError> {
        if bits & !self.values.all_flags_value() != 0 {
            return Err(FlagError::InvalidBits(bits));
        }
        self.bits = bits;
        Ok(())
    }

    /// Returns true if any flag is set.
    pub fn any(&self) -> bool {
        self.bits != 0
    }

    /// The names of the raised flags, in declaration order.
    pub fn set_names(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(_, bit)| self.bits & bit != 0)
            .map(|(name, _)| name)
            .collect()
    }
}

impl PartialEq for Flags {
    fn eq(&self, other: &Self) -> bool {
        if self.values == other.values {
            return self.bits == other.bits;
        }
        // Different mappings: fall back to comparing the raised names.
        let mut a = self.set_names();
        let mut b = other.set_names();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

impl Eq for Flags {}

#[test]
fn test_flag_values_bits() {
    let fv = FlagValues::new(["a", "b", "c"]).unwrap();
    assert_eq!(fv.bit("a").unwrap(), 1);
    assert_eq!(fv.bit("b").unwrap(), 2);
    assert_eq!(fv.bit("c").unwrap(), 4);
    assert_eq!(fv.all_flags_value(), 7);
    assert_eq!(fv.len(), 3);
    assert_eq!(
        fv.bit("d"),
        Err(FlagError::InvalidFlag("d".to_string()))
    );
}

#[test]
fn test_flag_values_rejects_bad_names() {
    assert_eq!(
        FlagValues::new(["ok", "1bad"]),
        Err(FlagError::InvalidFlagType("1bad".to_string()))
    );
    assert_eq!(
        FlagValues::new([""]),
        Err(FlagError::InvalidFlagType(String::new()))
    );
    assert_eq!(
        FlagValues::new(["dup", "dup"]),
        Err(FlagError::InvalidFlagType("dup".to_string()))
    );
    assert!(FlagValues::new(["some_flag", "_other9"]).is_ok());
}

#[test]
fn test_flags_set_clear() {
    let fv = FlagValues::new(["a", "b", "c"]).unwrap();
    let mut flags = Flags::new(fv);

    flags.set("a", true).unwrap();
    flags.set("c", true).unwrap();
    assert_eq!(flags.bits(), 5);

    flags.clear("a").unwrap();
    assert_eq!(flags.bits(), 4);
    assert!(!flags.get("a").unwrap());
    assert!(flags.get("c").unwrap());

    flags.set_bits(6).unwrap();
    assert!(!flags.get("a").unwrap());
    assert!(flags.get("b").unwrap());
    assert!(flags.get("c").unwrap());

    assert_eq!(flags.set_bits(8), Err(FlagError::InvalidBits(8)));
    assert_eq!(
        flags.set("nope", true),
        Err(FlagError::InvalidFlag("nope".to_string()))
    );

    flags.set_all();
    assert_eq!(flags.bits(), 7);
    flags.clear_all();
    assert!(!flags.any());
}

#[test]
fn test_flags_equality() {
    let fv = FlagValues::new(["a", "b", "c"]).unwrap();
    let mut x = Flags::new(fv.clone());
    let mut y = Flags::new(fv);
    x.set("b", true).unwrap();
    y.set("b", true).unwrap();
    assert_eq!(x, y);
    y.set("c", true).unwrap();
    assert_ne!(x, y);

    // Different mappings compare by the set of raised names.
    let mut p = Flags::new(FlagValues::new(["a", "b"]).unwrap());
    let mut q = Flags::new(FlagValues::new(["b", "a", "z"]).unwrap());
    p.set("a", true).unwrap();
    p.set("b", true).unwrap();
    q.set("a", true).unwrap();
    q.set("b", true).unwrap();
    assert_eq!(p, q);
    q.set("z", true).unwrap();
    assert_ne!(p, q);
}

#[test]
fn test_flags_names() {
    let fv = FlagValues::new(["x", "y", "z"]).unwrap();
    let mut flags = Flags::with_set(fv, &["z", "x"]).unwrap();
    assert_eq!(flags.set_names(), ["x", "z"]);
    flags.clear("x").unwrap();
    assert_eq!(flags.set_names(), ["z"]);
}
