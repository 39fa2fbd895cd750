//! Environment variable helpers used by [`crate::config`]
//!
//! ```ignore
//! use gem_core::env::env_get_bool;
//!
//! let trace = env_get_bool("GEM_TRACE_REFCOUNT", false);
//! ```

/// Read `key` as a flag
///
/// `1/true/yes/on` enable and `0/false/no/off` disable (case-insensitive).
/// Anything else, including an unset variable, yields `default`.
pub fn env_get_bool(key: &str, default: bool) -> bool {
    let Ok(val) = std::env::var(key) else {
        return default;
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_bool_unset() {
        assert!(env_get_bool("__GEM_TEST_UNSET_VAR__", true));
        assert!(!env_get_bool("__GEM_TEST_UNSET_VAR__", false));
    }

    #[test]
    fn test_env_get_bool_trimmed() {
        std::env::set_var("__GEM_TEST_BOOL_TRIM__", "  on\n");
        assert!(env_get_bool("__GEM_TEST_BOOL_TRIM__", false));
        std::env::remove_var("__GEM_TEST_BOOL_TRIM__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        for on in ["1", "true", "TRUE", "yes", "on"] {
            std::env::set_var("__GEM_TEST_BOOL__", on);
            assert!(env_get_bool("__GEM_TEST_BOOL__", false), "{on}");
        }
        for off in ["0", "false", "No", "off"] {
            std::env::set_var("__GEM_TEST_BOOL__", off);
            assert!(!env_get_bool("__GEM_TEST_BOOL__", true), "{off}");
        }
        std::env::set_var("__GEM_TEST_BOOL__", "garbage");
        assert!(env_get_bool("__GEM_TEST_BOOL__", true));
        assert!(!env_get_bool("__GEM_TEST_BOOL__", false));
        std::env::remove_var("__GEM_TEST_BOOL__");

        assert!(env_get_bool("__GEM_TEST_BOOL__", true));
    }
}
