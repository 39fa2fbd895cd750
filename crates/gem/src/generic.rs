//! The base capability contract
//!
//! Every object answers [`XGeneric`]. Interfaces are object-safe traits
//! with `XGeneric` as supertrait; the id of an interface is attached to
//! its trait object type through [`Interface`]:
//!
//! ```ignore
//! pub trait XCounter: XGeneric {
//!     fn hits(&self) -> u32;
//! }
//!
//! impl Interface for dyn XCounter {
//!     const IID: InterfaceId = InterfaceId::new(0x4354_0001);
//! }
//! ```
//!
//! [`gem_interface!`](crate::gem_interface) writes both halves.
//!
//! Capability pointers are `NonNull<dyn XFoo>`. Selecting the trait object
//! vtable is the pointer adjustment: the same object yields a different
//! fat pointer per interface.

use core::any::Any;
use core::ptr::NonNull;

use gem_core::{GemError, GemResult, InterfaceId, ResultCode};

use crate::ptr::GemPtr;

/// Root contract of every object
///
/// All three methods are infallible by contract apart from the argument
/// checks of `query_interface`. None of them blocks.
pub trait XGeneric: Send + Sync {
    /// Add one reference. Returns the count after the increment.
    fn add_ref(&self) -> u32;

    /// Drop one reference. Returns the count after the decrement.
    ///
    /// When the count reaches zero the object runs its `uninitialize` hook
    /// and is freed.
    ///
    /// # Safety
    ///
    /// The caller must own the reference being released, and must not use
    /// `self` again unless it still owns another reference.
    unsafe fn release(&self) -> u32;

    /// Ask for the capability identified by `iid`
    ///
    /// - `out == None` fails with `BadPointer`.
    /// - Otherwise the slot is cleared first. On a match the slot holds a
    ///   capability pointer owning one new reference and `Success` is
    ///   returned; on a miss `NoInterface` is returned and the slot stays
    ///   empty.
    fn query_interface(&self, iid: InterfaceId, out: Option<&mut dyn InterfaceSlot>) -> ResultCode;
}

/// Attaches an interface id to an interface trait object type
pub trait Interface: XGeneric + 'static {
    const IID: InterfaceId;
}

impl Interface for dyn XGeneric {
    const IID: InterfaceId = InterfaceId::GENERIC;
}

/// Type-erased out-parameter of [`XGeneric::query_interface`]
///
/// Implemented for `Option<NonNull<I>>`. An object filling the slot must
/// write the pointer type that matches the requested id; a mismatch is
/// reported as `InvalidArg` by [`put`](#method.put).
pub trait InterfaceSlot {
    /// Reset to the empty (null) state
    fn clear(&mut self);

    /// Check if no pointer is stored
    fn is_empty(&self) -> bool;

    #[doc(hidden)]
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<I: ?Sized + 'static> InterfaceSlot for Option<NonNull<I>> {
    #[inline]
    fn clear(&mut self) {
        *self = None;
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.is_none()
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn InterfaceSlot + '_ {
    /// Store a capability pointer of type `I`
    ///
    /// Does not touch the reference count. Returns `InvalidArg` and leaves
    /// the slot unchanged if the slot holds a different pointer type.
    pub fn put<I: ?Sized + 'static>(&mut self, ptr: NonNull<I>) -> ResultCode {
        match self.as_any_mut().downcast_mut::<Option<NonNull<I>>>() {
            Some(slot) => {
                *slot = Some(ptr);
                ResultCode::Success
            }
            None => ResultCode::InvalidArg,
        }
    }
}

/// Typed queries available on every object and capability pointer
pub trait XGenericExt: XGeneric {
    /// Query for interface `J`, returning an owning reference
    fn query<J: Interface + ?Sized>(&self) -> GemResult<GemPtr<J>> {
        let mut slot: Option<NonNull<J>> = None;
        self.query_interface(J::IID, Some(&mut slot as &mut dyn InterfaceSlot))
            .ok()?;
        match slot {
            // Safety: a successful query added exactly one reference for us
            Some(ptr) => Ok(unsafe { GemPtr::attach(ptr) }),
            None => Err(GemError::new(ResultCode::Fail)),
        }
    }

    /// Check whether the object answers interface `J`
    fn supports<J: Interface + ?Sized>(&self) -> bool {
        self.query::<J>().is_ok()
    }
}

impl<T: XGeneric + ?Sized> XGenericExt for T {}

/// Address of the object behind a capability pointer, vtable ignored
#[inline]
pub fn object_addr<I: ?Sized>(obj: &I) -> *const () {
    obj as *const I as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_put_and_clear() {
        let value = 7u32;
        let mut slot: Option<NonNull<u32>> = None;
        {
            let erased: &mut dyn InterfaceSlot = &mut slot;
            assert!(erased.is_empty());
            assert_eq!(erased.put(NonNull::from(&value)), ResultCode::Success);
            assert!(!erased.is_empty());
        }
        assert_eq!(slot, Some(NonNull::from(&value)));

        let erased: &mut dyn InterfaceSlot = &mut slot;
        erased.clear();
        assert!(erased.is_empty());
    }

    #[test]
    fn test_slot_type_mismatch() {
        let value = 7u64;
        let mut slot: Option<NonNull<u32>> = None;
        let erased: &mut dyn InterfaceSlot = &mut slot;
        assert_eq!(erased.put(NonNull::from(&value)), ResultCode::InvalidArg);
        assert!(erased.is_empty());
    }

    #[test]
    fn test_generic_iid() {
        assert_eq!(<dyn XGeneric as Interface>::IID, InterfaceId::GENERIC);
    }
}
