//! # gem - Component Object Model
//!
//! Reference-counted objects that answer capability queries at runtime.
//!
//! ## Features
//!
//! - **Interfaces**: object-safe traits with a 64-bit id, queried by id
//! - **Reference counting**: atomic, thread-safe, freed at zero
//! - **Two-phase construction**: allocate, then fallible `initialize`
//! - **Aggregation**: inner objects that share the identity and count of an
//!   outer object
//!
//! ## Quick Start
//!
//! ```ignore
//! use gem::{gem_interface, interface_map, Generic, GenericBase, ResultCode};
//!
//! gem_interface! {
//!     pub trait XCounter: iid(0x4354_0001) {
//!         fn hits(&self) -> u32;
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! impl GenericBase for Counter {}
//! interface_map!(Counter { dyn XCounter });
//!
//! impl XCounter for Generic<Counter> {
//!     fn hits(&self) -> u32 {
//!         self.ref_count()
//!     }
//! }
//!
//! let obj = Generic::try_create(Counter)?;
//! let counter = obj.query::<dyn XCounter>()?;
//! assert_eq!(counter.hits(), 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Caller                                 │
//! │          GemPtr<dyn XFoo>, query::<dyn XBar>()              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ XGeneric
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Generic<Class>                           │
//! │     atomic count, initialized flag, lifecycle hooks         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ interface_map!
//!          ┌───────────────────┴───────────────────┐
//!          ▼                                       ▼
//!    ┌───────────────┐                     ┌───────────────────┐
//!    │ impl XFoo for │                     │ Aggregate<Member> │
//!    │ Generic<Class>│                     │  Inner<Member>    │
//!    └───────────────┘                     │  (forwards to     │
//!                                          │   the outer)      │
//!                                          └───────────────────┘
//! ```

mod generic;
pub mod inner;
pub mod map;
pub mod ptr;
mod wrapper;

// Re-export core types
pub use gem_core::{
    InterfaceId,
    ResultCode,
    GemError,
    GemResult,
    ResultExt,
    GemConfig,
    failed,
    succeeded,
    result_to_string,
};

// Re-export configuration and diagnostics modules
pub use gem_core::{config, metrics};

// Re-export env utilities
pub use gem_core::env_get_bool;

pub use generic::{object_addr, Interface, InterfaceSlot, XGeneric, XGenericExt};
pub use inner::{Aggregate, Inner, OuterRef};
pub use map::InterfaceMap;
pub use ptr::GemPtr;
pub use wrapper::{Generic, GenericBase};
