//! Interface map declaration
//!
//! A class declares, once, every interface it answers:
//!
//! ```ignore
//! interface_map!(Car {
//!     dyn XCar,                 // answered by the object itself
//!     dyn XEngine => engine,    // answered by the `engine` aggregate
//! });
//! ```
//!
//! The base contract is always answered by the wrapper and is never listed.
//! Lookup is a fixed chain of id comparisons generated for the class; it
//! does not depend on any other type.

use core::ptr::NonNull;

use gem_core::{InterfaceId, ResultCode};

use crate::generic::{Interface, InterfaceSlot};
use crate::inner::Aggregate;
use crate::wrapper::Generic;

/// Per-class table from interface id to capability pointer
///
/// Implement with [`interface_map!`](crate::interface_map). The
/// implementation only fills `slot`; clearing it and adding the reference
/// are the wrapper's job.
pub trait InterfaceMap: Sized {
    fn interface_map(this: &Generic<Self>, iid: InterfaceId, slot: &mut dyn InterfaceSlot) -> ResultCode;
}

/// Store `obj` in `slot` as interface `I`
#[doc(hidden)]
#[inline]
pub fn put_interface<I: Interface + ?Sized>(slot: &mut dyn InterfaceSlot, obj: &I) -> ResultCode {
    slot.put::<I>(NonNull::from(obj))
}

/// Fetch the inner object of an aggregate entry, `Uninitialized` if the
/// outer has not filled it yet
#[doc(hidden)]
#[inline]
pub fn aggregate_entry<T>(aggregate: &Aggregate<T>) -> Result<&crate::inner::Inner<T>, ResultCode> {
    aggregate.get().ok_or(ResultCode::Uninitialized)
}

/// Declare an interface: the trait plus its id
///
/// ```ignore
/// gem_interface! {
///     /// Counts hits
///     pub trait XCounter: iid(0x4354_0001) {
///         fn hit(&self) -> u32;
///     }
/// }
/// ```
#[macro_export]
macro_rules! gem_interface {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident : iid($iid:expr) {
            $($body:tt)*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name: $crate::XGeneric {
            $($body)*
        }

        impl $crate::Interface for dyn $name {
            const IID: $crate::InterfaceId = $crate::InterfaceId::new($iid);
        }
    };
}

/// Declare the interface map of a class
///
/// Each entry is `dyn Interface` (the object itself must implement it on
/// `Generic<Class>`) or `dyn Interface => field` where `field` is an
/// [`Aggregate`] whose `Inner<_>` implements it.
#[macro_export]
macro_rules! interface_map {
    (@entry $this:ident, $slot:ident, $iface:ty) => {
        $crate::map::put_interface::<$iface>($slot, $this)
    };
    (@entry $this:ident, $slot:ident, $iface:ty, $field:ident) => {
        match $crate::map::aggregate_entry(&$this.$field) {
            Ok(inner) => $crate::map::put_interface::<$iface>($slot, inner),
            Err(code) => code,
        }
    };
    ($class:ty { $($iface:ty $(=> $field:ident)?),* $(,)? }) => {
        impl $crate::InterfaceMap for $class {
            #[allow(unused_variables)]
            fn interface_map(
                this: &$crate::Generic<Self>,
                iid: $crate::InterfaceId,
                slot: &mut dyn $crate::InterfaceSlot,
            ) -> $crate::ResultCode {
                $(
                    if iid == <$iface as $crate::Interface>::IID {
                        return $crate::interface_map!(@entry this, slot, $iface $(, $field)?);
                    }
                )*
                $crate::ResultCode::NoInterface
            }
        }
    };
}
