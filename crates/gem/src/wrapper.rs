//! Generic implementation wrapper
//!
//! [`Generic<T>`] turns a class `T` into an object: it adds the atomic
//! reference count, answers the base contract, dispatches queries through
//! the class's interface map and drives the two-phase lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! create(value)
//!   │  allocate ── null ──────────────► OutOfMemory (value dropped)
//!   ▼
//! count = 1, owned by the factory
//!   │  T::initialize(outer)
//!   ├── Err / panic ─► factory drops its reference
//!   │                   └─► count 0 ─► T::uninitialize ─► free
//!   ▼
//! published to the caller (count 1)
//!   ⋮  add_ref / release / query_interface from any thread
//!   ▼
//! release: 1 → 0 ─► T::uninitialize ─► free
//! ```

use core::cell::UnsafeCell;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::{self, NonNull};
use core::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};
use std::alloc::{self, Layout};
use std::panic::{self, AssertUnwindSafe};

use gem_core::{config, metrics, GemError, GemResult, InterfaceId, ResultCode};

use crate::generic::{InterfaceSlot, XGeneric};
use crate::inner::OuterRef;
use crate::map::InterfaceMap;
use crate::ptr::GemPtr;

/// Lifecycle hooks of a class
///
/// Both hooks have default implementations, so a class only overrides what
/// it needs. Every class must also declare its
/// [`interface_map!`](crate::interface_map).
pub trait GenericBase: InterfaceMap + Send + Sync + 'static {
    /// Fallible setup, run once after allocation and before the object is
    /// handed to anyone
    ///
    /// `outer` is the identity of the object being initialized; pass it to
    /// [`Aggregate::init`](crate::Aggregate::init) to create inner objects.
    /// Queries against the object fail with `Uninitialized` until this
    /// returns `Ok`.
    fn initialize(&self, outer: OuterRef) -> GemResult<()> {
        let _ = outer;
        Ok(())
    }

    /// Teardown, run exactly once when the count reaches zero, just before
    /// the value is dropped
    ///
    /// Also runs when `initialize` failed.
    fn uninitialize(&mut self) {}
}

/// A class value wrapped into a reference-counted object
///
/// All state sits in one `UnsafeCell`: the last `release` frees the object
/// while callers still hold `&Generic<T>`.
pub struct Generic<T> {
    state: UnsafeCell<State<T>>,
}

struct State<T> {
    ref_count: AtomicU32,
    initialized: AtomicBool,
    value: ManuallyDrop<T>,
}

// Safety: the state is only written by the teardown, which has exclusive
// access once the count is zero
unsafe impl<T: Send + Sync> Send for Generic<T> {}
unsafe impl<T: Send + Sync> Sync for Generic<T> {}

impl<T: GenericBase> Generic<T> {
    /// Construct through the two-phase factory
    ///
    /// - `out == None` → `BadPointer`, `value` is dropped.
    /// - Allocation failure → `OutOfMemory`.
    /// - `initialize` failure → its code (a panic counts as `Fail`); the
    ///   object is torn down and `out` is left untouched.
    /// - Success → `out` owns the only reference, `Success` returned.
    pub fn create(out: Option<&mut GemPtr<Self>>, value: T) -> ResultCode {
        let Some(out) = out else {
            return ResultCode::BadPointer;
        };
        match Self::try_create(value) {
            Ok(ptr) => {
                *out = ptr;
                ResultCode::Success
            }
            Err(e) => e.code(),
        }
    }

    /// [`create`](Self::create) returning the handle directly
    pub fn try_create(value: T) -> GemResult<GemPtr<Self>> {
        let raw = Self::allocate(value)?;

        // Safety: `allocate` hands out the single initial reference. From
        // here on any early return releases it through the handle.
        let ptr = unsafe { GemPtr::attach(raw) };
        let obj: &Self = &ptr;

        match obj.run_initialize() {
            Ok(()) => {
                obj.state().initialized.store(true, Ordering::Release);
                metrics::record_created();
                log::debug!(
                    target: "gem",
                    "created {} at {:p}",
                    core::any::type_name::<T>(),
                    raw
                );
                Ok(ptr)
            }
            Err(e) => {
                metrics::record_create_failed();
                log::debug!(
                    target: "gem",
                    "initialize of {} failed: {}",
                    core::any::type_name::<T>(),
                    e.code()
                );
                Err(e)
            }
        }
    }

    fn allocate(value: T) -> GemResult<NonNull<Self>> {
        let layout = Layout::new::<Self>();
        // Safety: Self always holds the counter, so the layout is non-zero
        let ptr = checked_allocation::<Self>(unsafe { alloc::alloc(layout) }, layout)?;
        // Safety: freshly allocated with the layout of Self
        unsafe {
            ptr.as_ptr().write(Generic {
                state: UnsafeCell::new(State {
                    ref_count: AtomicU32::new(1),
                    initialized: AtomicBool::new(false),
                    value: ManuallyDrop::new(value),
                }),
            });
        }
        Ok(ptr)
    }

    fn run_initialize(&self) -> GemResult<()> {
        let outer = OuterRef::new(self);
        let value: &T = self;
        if !config::current().catch_init_panics {
            return value.initialize(outer);
        }
        match panic::catch_unwind(AssertUnwindSafe(|| value.initialize(outer))) {
            Ok(res) => res,
            Err(_) => {
                log::warn!(
                    target: "gem",
                    "initialize of {} panicked",
                    core::any::type_name::<T>()
                );
                Err(GemError::new(ResultCode::Fail))
            }
        }
    }

    #[inline]
    pub fn internal_add_ref(&self) -> u32 {
        let count = self.state().ref_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.trace_count("add_ref", count);
        count
    }

    /// # Safety
    ///
    /// See [`XGeneric::release`].
    #[inline]
    pub unsafe fn internal_release(&self) -> u32 {
        let prev = match self
            .state()
            .ref_count
            .fetch_update(Ordering::Release, Ordering::Relaxed, |c| c.checked_sub(1))
        {
            Ok(prev) => prev,
            Err(_) => {
                log::warn!(
                    target: "gem",
                    "release on {} at {:p} with no references",
                    core::any::type_name::<T>(),
                    self as *const Self
                );
                debug_assert!(false, "release on an object with no references");
                return 0;
            }
        };
        let count = prev - 1;
        self.trace_count("release", count);

        if count == 0 {
            // Pairs with the Release decrements of every other holder, so
            // their last accesses happen-before the teardown.
            fence(Ordering::Acquire);
            Self::destroy(self as *const Self);
        }
        count
    }

    /// Run `uninitialize`, drop the value and free the object
    ///
    /// Works on raw pointers only: `this` may come from a shared reference,
    /// and every byte it writes or frees is inside the state cell.
    ///
    /// # Safety
    ///
    /// The count of `this` just reached zero; nothing else uses it.
    unsafe fn destroy(this: *const Self) {
        let state = &mut *UnsafeCell::raw_get(ptr::addr_of!((*this).state));
        state.value.uninitialize();
        ManuallyDrop::drop(&mut state.value);
        metrics::record_destroyed();
        log::debug!(
            target: "gem",
            "destroyed {} at {:p}",
            core::any::type_name::<T>(),
            this
        );
        alloc::dealloc(this as *mut u8, Layout::new::<Self>());
    }

    /// Query without the null-output check of `query_interface`
    pub fn internal_query_interface(&self, iid: InterfaceId, slot: &mut dyn InterfaceSlot) -> ResultCode {
        slot.clear();

        if !self.is_initialized() {
            return ResultCode::Uninitialized;
        }

        let code = if iid == InterfaceId::GENERIC {
            crate::map::put_interface::<dyn XGeneric>(slot, self)
        } else {
            T::interface_map(self, iid, slot)
        };

        if code.is_success() {
            self.internal_add_ref();
        } else {
            slot.clear();
            if code == ResultCode::NoInterface {
                metrics::record_query_missed();
            }
        }
        code
    }

    /// Current reference count (diagnostics only; may be stale at once)
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.state().ref_count.load(Ordering::Acquire)
    }

    /// Check if `initialize` has completed successfully
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state().initialized.load(Ordering::Acquire)
    }

    /// This object as an outer identity for aggregates
    #[inline]
    pub fn outer(&self) -> OuterRef {
        OuterRef::new(self)
    }

    #[inline]
    fn trace_count(&self, op: &str, count: u32) {
        if config::current().trace_refcount {
            log::trace!(
                target: "gem::refcount",
                "{} {:p} -> {}",
                op,
                self as *const Self,
                count
            );
        }
    }
}

impl<T: GenericBase> XGeneric for Generic<T> {
    #[inline]
    fn add_ref(&self) -> u32 {
        self.internal_add_ref()
    }

    #[inline]
    unsafe fn release(&self) -> u32 {
        self.internal_release()
    }

    fn query_interface(&self, iid: InterfaceId, out: Option<&mut dyn InterfaceSlot>) -> ResultCode {
        match out {
            Some(slot) => self.internal_query_interface(iid, slot),
            None => ResultCode::BadPointer,
        }
    }
}

impl<T> Generic<T> {
    #[inline]
    fn state(&self) -> &State<T> {
        // Safety: only the teardown writes, with exclusive access
        unsafe { &*self.state.get() }
    }
}

impl<T> Deref for Generic<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.state().value
    }
}

/// Map the result of a raw allocation, null → `OutOfMemory`
fn checked_allocation<T>(raw: *mut u8, layout: Layout) -> GemResult<NonNull<T>> {
    match NonNull::new(raw.cast::<T>()) {
        Some(ptr) => Ok(ptr),
        None => {
            log::warn!(
                target: "gem",
                "allocation of {} bytes for {} failed",
                layout.size(),
                core::any::type_name::<T>()
            );
            Err(GemError::new(ResultCode::OutOfMemory))
        }
    }
}
