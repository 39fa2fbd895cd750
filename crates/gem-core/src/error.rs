//! Error type carrying a failing result code

use thiserror::Error;

use crate::result::ResultCode;

/// Result type for fallible Rust-side operations
pub type GemResult<T = ()> = Result<T, GemError>;

/// A failing [`ResultCode`] lifted into a Rust error
///
/// Hooks such as `initialize` return `GemResult<()>` so they can use `?`.
/// The factory turns the error back into its code at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("gem operation failed: {code}")]
pub struct GemError {
    code: ResultCode,
}

impl GemError {
    /// Wrap a failure code
    ///
    /// Non-failing codes are normalised to `Fail`: an error that claims
    /// success would be lost on the way back to a `ResultCode`.
    #[inline]
    pub const fn new(code: ResultCode) -> Self {
        let code = if code.is_failure() { code } else { ResultCode::Fail };
        GemError { code }
    }

    /// The wrapped failure code
    #[inline]
    pub const fn code(&self) -> ResultCode {
        self.code
    }
}

impl From<ResultCode> for GemError {
    #[inline]
    fn from(code: ResultCode) -> Self {
        GemError::new(code)
    }
}

impl From<GemError> for ResultCode {
    #[inline]
    fn from(e: GemError) -> Self {
        e.code
    }
}

/// Collapse a `GemResult<()>` back to a boundary code
pub trait ResultExt {
    fn into_code(self) -> ResultCode;
}

impl ResultExt for GemResult<()> {
    #[inline]
    fn into_code(self) -> ResultCode {
        match self {
            Ok(()) => ResultCode::Success,
            Err(e) => e.code,
        }
    }
}

impl ResultExt for GemResult<ResultCode> {
    #[inline]
    fn into_code(self) -> ResultCode {
        match self {
            Ok(code) => code,
            Err(e) => e.code,
        }
    }
}
