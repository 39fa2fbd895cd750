//! Owning reference to a Gem object
//!
//! A non-empty [`GemPtr`] accounts for exactly one reference on its target:
//!
//! | Operation            | Count effect                                 |
//! |----------------------|----------------------------------------------|
//! | `from_raw(Some(p))`  | +1                                           |
//! | `attach(p)`          | none (adopts an existing reference)          |
//! | `clone()`            | +1                                           |
//! | move / `take()`      | none                                         |
//! | `clone_from` / `reset` | +1 new, then -1 old; none if same object   |
//! | `detach()`           | none (gives the reference to the caller)     |
//! | drop                 | -1                                           |

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;

use gem_core::GemResult;

use crate::generic::{Interface, XGeneric, XGenericExt};

/// Owning, reference-counted handle
pub struct GemPtr<I: XGeneric + ?Sized> {
    ptr: Option<NonNull<I>>,
    _owns: PhantomData<I>,
}

// Safety: every XGeneric is Send + Sync and the count is atomic
unsafe impl<I: XGeneric + ?Sized> Send for GemPtr<I> {}
unsafe impl<I: XGeneric + ?Sized> Sync for GemPtr<I> {}

impl<I: XGeneric + ?Sized> GemPtr<I> {
    /// Empty handle
    #[inline]
    pub const fn null() -> Self {
        GemPtr { ptr: None, _owns: PhantomData }
    }

    /// Take a new reference on `ptr` (if non-null)
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live object.
    #[inline]
    pub unsafe fn from_raw(ptr: Option<NonNull<I>>) -> Self {
        if let Some(p) = ptr {
            p.as_ref().add_ref();
        }
        GemPtr { ptr, _owns: PhantomData }
    }

    /// Adopt a reference the caller already owns, without incrementing
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live object and carry one reference that the
    /// caller hands over.
    #[inline]
    pub unsafe fn attach(ptr: NonNull<I>) -> Self {
        GemPtr { ptr: Some(ptr), _owns: PhantomData }
    }

    /// Give up ownership without releasing
    ///
    /// The handle becomes empty. The caller now owns the reference.
    #[inline]
    #[must_use = "the detached reference leaks unless released"]
    pub fn detach(&mut self) -> Option<NonNull<I>> {
        self.ptr.take()
    }

    /// Move the reference out, leaving this handle empty
    #[inline]
    pub fn take(&mut self) -> Self {
        GemPtr { ptr: self.ptr.take(), _owns: PhantomData }
    }

    /// Retarget to `ptr`
    ///
    /// The new target is incremented before the old one is released, and
    /// nothing happens when both are the same object.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live object.
    pub unsafe fn reset(&mut self, ptr: Option<NonNull<I>>) {
        if same_target(self.ptr, ptr) {
            return;
        }
        if let Some(p) = ptr {
            p.as_ref().add_ref();
        }
        if let Some(old) = core::mem::replace(&mut self.ptr, ptr) {
            old.as_ref().release();
        }
    }

    /// Release the held reference (if any) and become empty
    #[inline]
    pub fn clear(&mut self) {
        if let Some(old) = self.ptr.take() {
            // Safety: we owned this reference
            unsafe { old.as_ref().release() };
        }
    }

    #[inline]
    pub fn get(&self) -> Option<&I> {
        // Safety: a held pointer always has a live reference behind it
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    #[inline]
    pub fn as_ptr(&self) -> Option<NonNull<I>> {
        self.ptr
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Check if both handles refer to the same object (vtables ignored)
    #[inline]
    pub fn ptr_eq<J: XGeneric + ?Sized>(&self, other: &GemPtr<J>) -> bool {
        match (self.ptr, other.ptr) {
            (Some(a), Some(b)) => a.cast::<()>() == b.cast::<()>(),
            (None, None) => true,
            _ => false,
        }
    }

    /// Query the target for interface `J`
    ///
    /// An empty handle cannot answer queries: the result is `BadPointer`.
    pub fn query<J: Interface + ?Sized>(&self) -> GemResult<GemPtr<J>> {
        match self.get() {
            Some(obj) => obj.query::<J>(),
            None => Err(gem_core::ResultCode::BadPointer.into()),
        }
    }
}

#[inline]
fn same_target<I: ?Sized>(a: Option<NonNull<I>>, b: Option<NonNull<I>>) -> bool {
    a.map(NonNull::cast::<()>) == b.map(NonNull::cast::<()>)
}

impl<I: XGeneric + ?Sized> Default for GemPtr<I> {
    fn default() -> Self {
        GemPtr::null()
    }
}

impl<I: XGeneric + ?Sized> Clone for GemPtr<I> {
    fn clone(&self) -> Self {
        // Safety: our own reference keeps the target alive
        unsafe { GemPtr::from_raw(self.ptr) }
    }

    fn clone_from(&mut self, source: &Self) {
        // Safety: `source` keeps its target alive
        unsafe { self.reset(source.ptr) }
    }
}

impl<I: XGeneric + ?Sized> Drop for GemPtr<I> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<I: XGeneric + ?Sized> Deref for GemPtr<I> {
    type Target = I;

    /// # Panics
    ///
    /// Dereferencing an empty handle is a precondition violation.
    #[inline]
    fn deref(&self) -> &I {
        match self.get() {
            Some(obj) => obj,
            None => panic!("dereferenced an empty GemPtr"),
        }
    }
}

impl<I: XGeneric + ?Sized> fmt::Debug for GemPtr<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(p) => write!(f, "GemPtr({:p})", p.cast::<()>()),
            None => write!(f, "GemPtr(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};
    use gem_core::{InterfaceId, ResultCode};

    use crate::generic::InterfaceSlot;

    /// Stack-allocated counter that never frees; lets the handle be
    /// tested without the generic wrapper.
    struct Counted {
        refs: AtomicU32,
    }

    impl Counted {
        fn new(refs: u32) -> Self {
            Counted { refs: AtomicU32::new(refs) }
        }

        fn refs(&self) -> u32 {
            self.refs.load(Ordering::SeqCst)
        }
    }

    impl XGeneric for Counted {
        fn add_ref(&self) -> u32 {
            self.refs.fetch_add(1, Ordering::SeqCst) + 1
        }

        unsafe fn release(&self) -> u32 {
            self.refs.fetch_sub(1, Ordering::SeqCst) - 1
        }

        fn query_interface(&self, _iid: InterfaceId, out: Option<&mut dyn InterfaceSlot>) -> ResultCode {
            match out {
                Some(slot) => {
                    slot.clear();
                    ResultCode::NoInterface
                }
                None => ResultCode::BadPointer,
            }
        }
    }

    #[test]
    fn test_from_raw_and_drop() {
        let obj = Counted::new(1);
        {
            let p = unsafe { GemPtr::from_raw(Some(NonNull::from(&obj))) };
            assert!(!p.is_null());
            assert_eq!(obj.refs(), 2);
        }
        assert_eq!(obj.refs(), 1);
    }

    #[test]
    fn test_null_handle() {
        let p: GemPtr<Counted> = GemPtr::default();
        assert!(p.is_null());
        assert!(p.get().is_none());
        assert_eq!(format!("{:?}", p), "GemPtr(null)");
        drop(unsafe { GemPtr::<Counted>::from_raw(None) });
    }

    #[test]
    fn test_clone_increments_and_drop_decrements() {
        let obj = Counted::new(1);
        let p = unsafe { GemPtr::attach(NonNull::from(&obj)) };
        let q = p.clone();
        assert_eq!(obj.refs(), 2);
        assert!(p.ptr_eq(&q));
        drop(q);
        assert_eq!(obj.refs(), 1);
        let mut p = p;
        let _ = p.detach();
    }

    #[test]
    fn test_self_assignment_is_noop() {
        let obj = Counted::new(0);
        let mut p = unsafe { GemPtr::from_raw(Some(NonNull::from(&obj))) };
        let alias = p.clone();
        assert_eq!(obj.refs(), 2);

        p.clone_from(&alias);
        assert_eq!(obj.refs(), 2);

        unsafe { p.reset(alias.as_ptr()) };
        assert_eq!(obj.refs(), 2);

        drop(alias);
        drop(p);
        assert_eq!(obj.refs(), 0);
    }

    #[test]
    fn test_reassign_releases_previous_once() {
        let a = Counted::new(0);
        let b = Counted::new(0);
        let mut p = unsafe { GemPtr::from_raw(Some(NonNull::from(&a))) };
        let q = unsafe { GemPtr::from_raw(Some(NonNull::from(&b))) };

        p.clone_from(&q);
        assert_eq!(a.refs(), 0);
        assert_eq!(b.refs(), 2);

        drop(p);
        drop(q);
        assert_eq!(b.refs(), 0);
    }

    #[test]
    fn test_move_keeps_count() {
        let obj = Counted::new(0);
        let mut p = unsafe { GemPtr::from_raw(Some(NonNull::from(&obj))) };
        let moved = p.take();
        assert!(p.is_null());
        assert_eq!(obj.refs(), 1);

        let moved_again = moved;
        assert_eq!(obj.refs(), 1);
        drop(moved_again);
        assert_eq!(obj.refs(), 0);
    }

    #[test]
    fn test_attach_detach_have_no_side_effects() {
        let obj = Counted::new(1);
        let mut p = unsafe { GemPtr::attach(NonNull::from(&obj)) };
        assert_eq!(obj.refs(), 1);
        let raw = p.detach();
        assert!(p.is_null());
        assert_eq!(raw, Some(NonNull::from(&obj)));
        drop(p);
        assert_eq!(obj.refs(), 1);
    }

    #[test]
    fn test_query_on_empty_handle() {
        let p: GemPtr<Counted> = GemPtr::null();
        let err = p.query::<dyn XGeneric>().unwrap_err();
        assert_eq!(err.code(), ResultCode::BadPointer);
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty GemPtr")]
    fn test_deref_empty_panics() {
        let p: GemPtr<Counted> = GemPtr::null();
        let _ = p.add_ref();
    }
}
