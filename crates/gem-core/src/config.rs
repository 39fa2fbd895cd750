//! Process-wide object model configuration
//!
//! Library defaults, overridden by environment variables, overridden by an
//! explicit [`install`] (highest wins).
//!
//! # Environment Variables
//!
//! - `GEM_TRACE_REFCOUNT=1` - log every add_ref/release at trace level
//! - `GEM_CATCH_INIT_PANICS=0` - let a panicking `initialize` unwind
//!   through the factory instead of reporting `Fail`
//!
//! ```rust,ignore
//! use gem_core::config::{self, GemConfig};
//!
//! config::install(GemConfig::from_env().trace_refcount(true));
//! ```

use std::sync::OnceLock;

use crate::env::env_get_bool;

pub const ENV_TRACE_REFCOUNT: &str = "GEM_TRACE_REFCOUNT";
pub const ENV_CATCH_INIT_PANICS: &str = "GEM_CATCH_INIT_PANICS";

static CONFIG: OnceLock<GemConfig> = OnceLock::new();

/// Object model configuration with builder pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemConfig {
    /// Log each reference count change (default: false)
    pub trace_refcount: bool,

    /// Convert a panic in `initialize` into `ResultCode::Fail` (default: true)
    pub catch_init_panics: bool,
}

impl Default for GemConfig {
    fn default() -> Self {
        Self {
            trace_refcount: false,
            catch_init_panics: true,
        }
    }
}

impl GemConfig {
    /// Library defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Library defaults with environment overrides applied
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trace_refcount: env_get_bool(ENV_TRACE_REFCOUNT, defaults.trace_refcount),
            catch_init_panics: env_get_bool(ENV_CATCH_INIT_PANICS, defaults.catch_init_panics),
        }
    }

    pub fn trace_refcount(mut self, enable: bool) -> Self {
        self.trace_refcount = enable;
        self
    }

    pub fn catch_init_panics(mut self, enable: bool) -> Self {
        self.catch_init_panics = enable;
        self
    }
}

/// Install the process-wide configuration
///
/// Only the first call (or the first [`current`], which loads from the
/// environment) takes effect. Returns `false` if a configuration was
/// already in place.
pub fn install(config: GemConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// The active configuration, loaded from the environment on first use
#[inline]
pub fn current() -> &'static GemConfig {
    CONFIG.get_or_init(GemConfig::from_env)
}
