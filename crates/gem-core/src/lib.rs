//! # gem-core
//!
//! Core types for the Gem component object model.
//!
//! This crate holds the leaf types shared by every component: nothing here
//! knows about objects or reference counts. The object model itself lives
//! in the `gem` crate.
//!
//! ## Modules
//!
//! - `id` - Interface identifier type
//! - `result` - Boundary result codes
//! - `error` - Rust error type wrapping a failing code
//! - `config` - Process-wide configuration
//! - `env` - Environment variable utilities
//! - `metrics` - Lifecycle counters (live with `feature = "metrics"`)

pub mod id;
pub mod result;
pub mod error;
pub mod config;
pub mod env;
pub mod metrics;

// Re-exports for convenience
pub use id::InterfaceId;
pub use result::{failed, result_to_string, succeeded, ResultCode};
pub use error::{GemError, GemResult, ResultExt};
pub use config::GemConfig;
pub use env::env_get_bool;

// Boundary values are passed by value across components; pin their size.
static_assertions::assert_eq_size!(InterfaceId, u64);
static_assertions::assert_eq_size!(ResultCode, u32);
static_assertions::const_assert!(ResultCode::Fail as u32 == 0x8000_0000);
