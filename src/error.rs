//! Library-wide error and result types.

use std::fmt;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors this crate can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
#[derive(Debug)]
pub enum Error {
    /// A `crypt_key` or `tweak_key` was not exactly 16 bytes.
    BadKeyLength,
    /// A scheduled-key region ([`crate::RoundKeys`]) was not exactly 352 bytes.
    BadRoundKeysLength,
    /// The payload buffer's length was not a multiple of 16.
    BadBufferAlignment,
    /// `sector_size` was zero or not a multiple of 16.
    BadSectorSize,
    /// `skipped_bytes` was not a multiple of 16.
    BadSkippedBytes,
    /// A single big-integer sector offset could not be split into
    /// `(hi, lo)` 64-bit halves. Unreachable through this crate's typed
    /// `u128` offset API (every `u128` value splits cleanly); kept so the
    /// error enum matches the language-agnostic contract for bindings that
    /// accept offsets as untyped big integers or decimal strings.
    BadSectorOffset,
    /// The output buffer could not be allocated.
    AllocationFailed,
    /// The external AES provider (see [`crate::provider`]) returned failure
    /// for a block call. Only reachable when the `external-provider`
    /// feature is enabled and active.
    #[cfg(feature = "external-provider")]
    CipherProviderFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadKeyLength => write!(f, "key must be exactly 16 bytes"),
            Error::BadRoundKeysLength => {
                write!(f, "scheduled round keys must be exactly 352 bytes")
            }
            Error::BadBufferAlignment => write!(f, "buffer length must be a multiple of 16"),
            Error::BadSectorSize => write!(f, "sector size must be a non-zero multiple of 16"),
            Error::BadSkippedBytes => write!(f, "skipped bytes must be a multiple of 16"),
            Error::BadSectorOffset => write!(f, "sector offset does not fit a 128-bit integer"),
            Error::AllocationFailed => write!(f, "failed to allocate output buffer"),
            #[cfg(feature = "external-provider")]
            Error::CipherProviderFailed => write!(f, "external AES provider call failed"),
        }
    }
}

impl std::error::Error for Error {}
