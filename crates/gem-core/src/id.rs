//! Interface identifier type

use core::fmt;

/// Identifier of an interface contract
///
/// A 64-bit constant attached to each interface. Two ids are equal iff
/// their raw values are equal. Each contract defines exactly one id;
/// collisions between unrelated contracts are not detected at runtime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct InterfaceId(u64);

impl InterfaceId {
    /// Id of the base contract every object answers
    pub const GENERIC: InterfaceId = InterfaceId(u64::MAX);

    /// Create an id from its raw value
    #[inline]
    pub const fn new(raw: u64) -> Self {
        InterfaceId(raw)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check if this is the base contract id
    #[inline]
    pub const fn is_generic(self) -> bool {
        self.0 == u64::MAX
    }
}

impl From<u64> for InterfaceId {
    #[inline]
    fn from(raw: u64) -> Self {
        InterfaceId(raw)
    }
}

impl From<InterfaceId> for u64 {
    #[inline]
    fn from(id: InterfaceId) -> Self {
        id.0
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_generic() {
            write!(f, "InterfaceId(GENERIC)")
        } else {
            write!(f, "InterfaceId({:#018x})", self.0)
        }
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
