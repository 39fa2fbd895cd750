//! Aggregation: inner objects that borrow the identity of an outer object
//!
//! An outer class keeps each inner object in an [`Aggregate`] member and
//! fills it from its `initialize` hook:
//!
//! ```ignore
//! struct Car {
//!     engine: Aggregate<Engine>,
//! }
//!
//! impl GenericBase for Car {
//!     fn initialize(&self, outer: OuterRef) -> GemResult<()> {
//!         self.engine.init(outer, Engine::default())?;
//!         Ok(())
//!     }
//! }
//!
//! interface_map!(Car { dyn XCar, dyn XEngine => engine });
//! ```
//!
//! An aggregate only binds from inside the object it names, and stops
//! answering if it is moved out, so an inner never outlives its outer.
//!
//! The inner object has no count of its own. `add_ref`, `release` and
//! `query_interface` on it are forwarded to the outer, so callers see one
//! object with the union of both interface sets.

use core::cell::UnsafeCell;
use core::fmt;
use core::mem;
use core::ops::Deref;
use core::ptr::NonNull;
use std::sync::OnceLock;

use gem_core::{GemError, GemResult, InterfaceId, ResultCode};

use crate::generic::{object_addr, InterfaceSlot, XGeneric};

/// Weak back reference to an outer object
///
/// Never adds a reference. It records the extent of the outer allocation
/// so an [`Aggregate`] can check that it is a member of that object.
#[derive(Clone, Copy)]
pub struct OuterRef {
    ptr: NonNull<dyn XGeneric>,
    size: usize,
}

// Safety: the referent is XGeneric (Send + Sync); OuterRef is only a pointer
unsafe impl Send for OuterRef {}
unsafe impl Sync for OuterRef {}

impl OuterRef {
    #[inline]
    pub(crate) fn new(outer: &(dyn XGeneric + 'static)) -> Self {
        OuterRef {
            ptr: NonNull::from(outer),
            size: mem::size_of_val(outer),
        }
    }

    /// Build from a raw outer pointer
    ///
    /// A null outer is rejected with `BadPointer`.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live object.
    pub unsafe fn from_raw(ptr: Option<NonNull<dyn XGeneric>>) -> GemResult<Self> {
        match ptr {
            Some(ptr) => Ok(OuterRef {
                ptr,
                size: mem::size_of_val(ptr.as_ref()),
            }),
            None => Err(GemError::new(ResultCode::BadPointer)),
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> NonNull<dyn XGeneric> {
        self.ptr
    }

    /// Check if `obj` is the outer object (vtables ignored)
    #[inline]
    pub fn is<I: ?Sized>(&self, obj: &I) -> bool {
        self.ptr.cast::<()>().as_ptr() as *const () == object_addr(obj)
    }

    /// Check if `member` lies entirely inside the outer allocation
    ///
    /// Compares addresses only; the outer is not dereferenced.
    #[inline]
    pub fn contains<U>(&self, member: &U) -> bool {
        let base = self.ptr.cast::<u8>().as_ptr() as usize;
        let addr = member as *const U as usize;
        addr >= base && addr + mem::size_of::<U>() <= base + self.size
    }

    #[inline]
    fn outer(&self) -> &dyn XGeneric {
        // Safety: an Inner is only reachable while it sits inside its outer
        // (checked by Aggregate::get), so the outer is alive
        unsafe { self.ptr.as_ref() }
    }
}

impl fmt::Debug for OuterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OuterRef({:p}, {} bytes)", self.ptr.cast::<()>(), self.size)
    }
}

/// An aggregated object: class state plus the outer it delegates to
///
/// All state sits in one `UnsafeCell`: a `release` through `&Inner` may
/// free the outer allocation, which contains this value.
#[derive(Debug)]
pub struct Inner<T> {
    state: UnsafeCell<InnerState<T>>,
}

struct InnerState<T> {
    outer: OuterRef,
    value: T,
}

// Safety: the cell is never written through a shared reference
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send + Sync> Sync for Inner<T> {}

impl<T> Inner<T> {
    /// # Safety
    ///
    /// `outer` must outlive the returned value and every use of it. Prefer
    /// [`Aggregate::init`], which checks that the inner lives inside the
    /// outer object.
    pub unsafe fn new(outer: OuterRef, value: T) -> Self {
        Inner {
            state: UnsafeCell::new(InnerState { outer, value }),
        }
    }

    #[inline]
    fn state(&self) -> &InnerState<T> {
        // Safety: only written through `&mut` (Aggregate::get_mut)
        unsafe { &*self.state.get() }
    }

    /// The outer object this inner answers for
    #[inline]
    pub fn outer(&self) -> OuterRef {
        self.state().outer
    }
}

impl<T: Send + Sync> XGeneric for Inner<T> {
    #[inline]
    fn add_ref(&self) -> u32 {
        self.outer().outer().add_ref()
    }

    #[inline]
    unsafe fn release(&self) -> u32 {
        // May free the allocation holding `self`; nothing is read afterwards
        let outer = self.outer();
        outer.outer().release()
    }

    #[inline]
    fn query_interface(&self, iid: InterfaceId, out: Option<&mut dyn InterfaceSlot>) -> ResultCode {
        self.outer().outer().query_interface(iid, out)
    }
}

impl<T> Deref for Inner<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.state().value
    }
}

/// Member storage for one inner object, empty until the outer fills it
///
/// An aggregate answers only while it is a member of the object it was
/// bound to. Moved out of that object (for instance with `mem::take` in
/// `uninitialize`), it reads as empty.
pub struct Aggregate<T> {
    cell: OnceLock<Inner<T>>,
}

impl<T> Aggregate<T> {
    pub const fn new() -> Self {
        Aggregate { cell: OnceLock::new() }
    }

    /// Create the inner object, bound to `outer`
    ///
    /// Call from the outer's `initialize` with the `OuterRef` it was given.
    /// - `self` not inside the outer object → `InvalidArg`, `value` dropped.
    /// - A second call → `Unavailable`, `value` dropped.
    pub fn init(&self, outer: OuterRef, value: T) -> GemResult<&Inner<T>> {
        if !outer.contains(self) {
            log::warn!(
                target: "gem",
                "aggregate of {} at {:p} is not a member of {:?}",
                core::any::type_name::<T>(),
                self as *const Self,
                outer
            );
            return Err(GemError::new(ResultCode::InvalidArg));
        }
        // Safety: `self` is part of the outer allocation, so it cannot
        // outlive it. Moves out are caught by `get`.
        let inner = unsafe { Inner::new(outer, value) };
        if self.cell.set(inner).is_err() {
            return Err(GemError::new(ResultCode::Unavailable));
        }
        self.get().ok_or(GemError::new(ResultCode::Fail))
    }

    /// The inner object, if filled and still inside its outer
    #[inline]
    pub fn get(&self) -> Option<&Inner<T>> {
        self.cell.get().filter(|inner| inner.outer().contains(self))
    }

    /// Exclusive access to the inner state, for the outer's `uninitialize`
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.cell.get_mut().map(|inner| &mut inner.state.get_mut().value)
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.get().is_some()
    }
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Aggregate::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_outer_rejected() {
        let err = unsafe { OuterRef::from_raw(None) }.unwrap_err();
        assert_eq!(err.code(), ResultCode::BadPointer);
    }

    #[test]
    fn test_aggregate_starts_empty() {
        let agg: Aggregate<u32> = Aggregate::default();
        assert!(!agg.is_initialized());
        assert!(agg.get().is_none());
    }

    /// Stack host that never frees; enough to bind aggregates to
    struct Host {
        _pad: u64,
        slot: Aggregate<u32>,
    }

    impl XGeneric for Host {
        fn add_ref(&self) -> u32 {
            1
        }

        unsafe fn release(&self) -> u32 {
            1
        }

        fn query_interface(&self, _iid: InterfaceId, _out: Option<&mut dyn InterfaceSlot>) -> ResultCode {
            ResultCode::NoInterface
        }
    }

    #[test]
    fn test_contains_checks_extent() {
        let host = Host { _pad: 0, slot: Aggregate::new() };
        let other: Aggregate<u32> = Aggregate::new();
        let outer = OuterRef::new(&host);
        assert!(outer.contains(&host));
        assert!(outer.contains(&host.slot));
        assert!(!outer.contains(&other));
        assert!(outer.is(&host));
    }

    #[test]
    fn test_init_outside_outer_rejected() {
        let host = Host { _pad: 0, slot: Aggregate::new() };
        let stray: Aggregate<u32> = Aggregate::new();
        let err = stray.init(OuterRef::new(&host), 9).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidArg);
        assert!(!stray.is_initialized());
    }

    #[test]
    fn test_moved_out_aggregate_reads_empty() {
        let mut host = Host { _pad: 0, slot: Aggregate::new() };
        let outer = OuterRef::new(&host);
        assert_eq!(host.slot.init(outer, 5).map(|inner| **inner).ok(), Some(5));
        assert!(host.slot.init(outer, 6).is_err());

        let mut taken = mem::take(&mut host.slot);
        assert!(!taken.is_initialized());
        assert!(taken.get().is_none());
        assert!(!host.slot.is_initialized());
        // Exclusive access still reaches the state for cleanup
        assert_eq!(taken.get_mut().map(|v| *v), Some(5));
    }
}
