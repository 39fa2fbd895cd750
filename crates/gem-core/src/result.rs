//! Result codes returned across interface boundaries
//!
//! Every boundary operation reports one of these codes instead of
//! unwinding. The raw values are ordered so that all failures sort
//! together at and above [`ResultCode::Fail`]:
//!
//! | Range                     | Meaning                              |
//! |---------------------------|--------------------------------------|
//! | `0`                       | `Success`                            |
//! | `1`                       | `End` (iteration terminator, not an error) |
//! | `0x8000_0000` and above   | failures, `Fail` first               |

use core::fmt;

use crate::error::{GemError, GemResult};

/// Outcome of a boundary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    End = 1,

    /// Catch-all failure. Must stay the lowest failure value.
    Fail = 0x8000_0000,
    InvalidArg,
    NotFound,
    OutOfMemory,
    NoInterface,
    BadPointer,
    NotImplemented,
    Unavailable,
    Uninitialized,
    PluginLoadFailed,
    PluginProcNotFound,
}

impl ResultCode {
    /// Raw value of the first failure code
    pub const FIRST_FAILURE: u32 = ResultCode::Fail as u32;

    /// Every known code, in raw-value order
    pub const ALL: [ResultCode; 13] = [
        ResultCode::Success,
        ResultCode::End,
        ResultCode::Fail,
        ResultCode::InvalidArg,
        ResultCode::NotFound,
        ResultCode::OutOfMemory,
        ResultCode::NoInterface,
        ResultCode::BadPointer,
        ResultCode::NotImplemented,
        ResultCode::Unavailable,
        ResultCode::Uninitialized,
        ResultCode::PluginLoadFailed,
        ResultCode::PluginProcNotFound,
    ];

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Check if this code is a failure
    #[inline]
    pub const fn is_failure(self) -> bool {
        self as u32 >= Self::FIRST_FAILURE
    }

    /// Check if this code is non-failing (`Success` or `End`)
    #[inline]
    pub const fn is_success(self) -> bool {
        !self.is_failure()
    }

    /// Human-readable name of the code
    pub const fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "Success",
            ResultCode::End => "End",
            ResultCode::Fail => "Fail",
            ResultCode::InvalidArg => "InvalidArg",
            ResultCode::NotFound => "NotFound",
            ResultCode::OutOfMemory => "OutOfMemory",
            ResultCode::NoInterface => "NoInterface",
            ResultCode::BadPointer => "BadPointer",
            ResultCode::NotImplemented => "NotImplemented",
            ResultCode::Unavailable => "Unavailable",
            ResultCode::Uninitialized => "Uninitialized",
            ResultCode::PluginLoadFailed => "PluginLoadFailed",
            ResultCode::PluginProcNotFound => "PluginProcNotFound",
        }
    }

    /// Convert to a Rust result: non-failing codes pass through as `Ok`
    ///
    /// This is the `?`-friendly way to bail out of a hook when a nested
    /// boundary call fails.
    #[inline]
    pub fn ok(self) -> GemResult<ResultCode> {
        if self.is_failure() {
            Err(GemError::new(self))
        } else {
            Ok(self)
        }
    }
}

/// Name of any raw code, `"(Unknown)"` for values outside the enumeration
pub fn result_to_string(raw: u32) -> &'static str {
    match ResultCode::try_from(raw) {
        Ok(code) => code.as_str(),
        Err(_) => "(Unknown)",
    }
}

/// Raw-value predicate matching [`ResultCode::is_failure`], valid for
/// unknown codes too
#[inline]
pub const fn failed(raw: u32) -> bool {
    raw >= ResultCode::FIRST_FAILURE
}

/// Raw-value predicate matching [`ResultCode::is_success`]
#[inline]
pub const fn succeeded(raw: u32) -> bool {
    raw < ResultCode::FIRST_FAILURE
}

impl TryFrom<u32> for ResultCode {
    /// The unrecognised raw value
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, u32> {
        match raw {
            0 => Ok(ResultCode::Success),
            1 => Ok(ResultCode::End),
            _ if raw >= Self::FIRST_FAILURE => {
                let idx = (raw - Self::FIRST_FAILURE) as usize + 2;
                Self::ALL.get(idx).copied().ok_or(raw)
            }
            _ => Err(raw),
        }
    }
}

impl From<ResultCode> for u32 {
    #[inline]
    fn from(code: ResultCode) -> u32 {
        code as u32
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
