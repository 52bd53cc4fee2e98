use std::fmt;
use std::num::NonZeroU32;

use crate::error::{CoreError, Result};

/// Process-unique object identifier.
///
/// Zero is never a valid identifier; "unassigned" is expressed as
/// `Option<ObjectId>`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObjectId(NonZeroU32);

impl ObjectId {
    /// Wraps a raw value. Returns `None` for zero.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    #[inline]
    pub const fn non_zero(self) -> NonZeroU32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identifier counter.
///
/// Identifiers are issued in strictly increasing order and never reused for
/// the lifetime of the source. One source is owned by each
/// [`Graphics`](crate::graphics::Graphics) value so independent scenes never
/// share counters.
#[derive(Debug, Default)]
pub struct IdSource {
    last: u32,
}

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next identifier.
    pub fn issue(&mut self) -> Result<ObjectId> {
        let next = self.last.checked_add(1).ok_or(CoreError::IdsExhausted)?;
        self.last = next;
        ObjectId::new(next).ok_or(CoreError::IdsExhausted)
    }

    /// Returns the most recently issued identifier.
    pub fn last_issued(&self) -> Option<ObjectId> {
        ObjectId::new(self.last)
    }
}

/// Longest accepted object name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Object names must be 1 to [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        log::error!(target: "registry", "rejected object name '{name}' ({len} characters)");
        return Err(CoreError::InvalidName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_an_identifier() {
        assert!(ObjectId::new(0).is_none());
        assert_eq!(ObjectId::new(9).unwrap().get(), 9);
    }

    #[test]
    fn issues_strictly_increasing_ids_starting_at_one() {
        let mut ids = IdSource::new();
        assert!(ids.last_issued().is_none());
        let a = ids.issue().unwrap();
        let b = ids.issue().unwrap();
        let c = ids.issue().unwrap();
        assert_eq!(a.get(), 1);
        assert!(a < b && b < c);
        assert_eq!(ids.last_issued(), Some(c));
    }

    #[test]
    fn exhaustion_is_reported_instead_of_wrapping() {
        let mut ids = IdSource { last: u32::MAX - 1 };
        assert_eq!(ids.issue().unwrap().get(), u32::MAX);
        assert!(matches!(ids.issue(), Err(CoreError::IdsExhausted)));
        assert_eq!(ids.last_issued().unwrap().get(), u32::MAX);
    }

    #[test]
    fn independent_sources_do_not_share_state() {
        let mut a = IdSource::new();
        let mut b = IdSource::new();
        a.issue().unwrap();
        a.issue().unwrap();
        assert_eq!(b.issue().unwrap().get(), 1);
    }

    #[test]
    fn names_are_length_checked() {
        assert!(validate_name("button").is_ok());
        assert!(validate_name(&"é".repeat(50)).is_ok());
        assert!(matches!(validate_name(""), Err(CoreError::InvalidName(_))));
        assert!(validate_name(&"x".repeat(51)).is_err());
    }
}
