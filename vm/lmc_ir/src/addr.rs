//! Code address newtype.

use std::fmt;

/// A code address: the 0-based ordinal of a decoded instruction.
///
/// Addresses are dense — the loader assigns them in listing order, skipping
/// blank lines — so a `u32` index into the instruction vector is enough.
/// `Addr::MAX` never names a real instruction; the machine uses it as the
/// bottom-of-control sentinel.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Addr(u32);

impl Addr {
    /// Program entry point.
    pub const ZERO: Addr = Addr(0);

    /// Sentinel address; out of range for any loadable program.
    pub const MAX: Addr = Addr(u32::MAX);

    /// Create from a raw instruction ordinal.
    #[inline]
    pub const fn new(ordinal: u32) -> Self {
        Addr(ordinal)
    }

    /// Index into an instruction vector.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw ordinal value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The address of the following instruction.
    ///
    /// Saturates at `Addr::MAX`; the machine treats that as out of range.
    #[inline]
    pub const fn next(self) -> Self {
        Addr(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({})", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_advances_by_one() {
        assert_eq!(Addr::ZERO.next(), Addr::new(1));
        assert_eq!(Addr::new(41).next().index(), 42);
    }

    #[test]
    fn max_saturates() {
        assert_eq!(Addr::MAX.next(), Addr::MAX);
    }

    #[test]
    fn display_is_bare_ordinal() {
        assert_eq!(Addr::new(7).to_string(), "7");
    }
}
