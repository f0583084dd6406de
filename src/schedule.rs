//! Scheduled-key pair (C5).
//!
//! The wire-visible object: a single opaque 352-byte region holding two
//! AES-128 key schedules back to back (176 bytes for the data key, then 176
//! bytes for the tweak key). Immutable after construction and safe to share
//! across threads and sessions.

use crate::aes;
use crate::error::{Error, Result};

const ROUND_KEYS_LEN: usize = 176;

/// Length in bytes of a scheduled [`RoundKeys`] pair.
pub const LEN: usize = ROUND_KEYS_LEN * 2;

/// A scheduled AES-128 key pair: round keys for the data cipher and round
/// keys for the tweak cipher, stored back to back.
///
/// The 352-byte layout is an internal invariant, not something callers are
/// expected to index into directly - but [`RoundKeys::as_bytes`] /
/// [`RoundKeys::from_bytes`] expose it for callers that need to persist or
/// transmit a scheduled key (e.g. to avoid re-running the key schedule on
/// every call).
#[derive(Clone)]
pub struct RoundKeys([u8; LEN]);

impl RoundKeys {
    /// Schedule a `crypt_key`/`tweak_key` pair into their round-key tables.
    ///
    /// Rejects neither input by construction - both are fixed-size 16-byte
    /// arrays - but the free-function API in [`crate::schedule`] validates
    /// lengths before calling this for parity with the wire-level contract.
    pub fn schedule(crypt_key: &[u8; 16], tweak_key: &[u8; 16]) -> Self {
        let mut out = [0u8; LEN];
        out[..ROUND_KEYS_LEN].copy_from_slice(&aes::schedule(crypt_key));
        out[ROUND_KEYS_LEN..].copy_from_slice(&aes::schedule(tweak_key));
        Self(out)
    }

    /// Reconstruct a [`RoundKeys`] from its 352-byte wire representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != LEN {
            return Err(Error::BadRoundKeysLength);
        }
        let mut out = [0u8; LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// The opaque 352-byte wire representation.
    pub fn as_bytes(&self) -> &[u8; LEN] {
        &self.0
    }

    pub(crate) fn crypt_round_keys(&self) -> &aes::RoundKeys {
        self.0[..ROUND_KEYS_LEN].try_into().unwrap()
    }

    pub(crate) fn tweak_round_keys(&self) -> &aes::RoundKeys {
        self.0[ROUND_KEYS_LEN..].try_into().unwrap()
    }

    /// The original 16-byte data key. Recoverable because AES-128's first
    /// round key is always the unmodified input key; used by the external
    /// provider (C6), which operates on raw keys rather than expanded round
    /// keys.
    pub(crate) fn crypt_key(&self) -> &[u8; 16] {
        self.0[..16].try_into().unwrap()
    }

    /// The original 16-byte tweak key, recovered the same way as
    /// [`RoundKeys::crypt_key`]; used by the external provider (C6) when
    /// deriving a tweak.
    pub(crate) fn tweak_key(&self) -> &[u8; 16] {
        self.0[ROUND_KEYS_LEN..ROUND_KEYS_LEN + 16].try_into().unwrap()
    }
}

/// Build a [`RoundKeys`] region from a `crypt_key`/`tweak_key` pair,
/// rejecting keys that are not exactly 16 bytes.
///
/// This is the slice-taking, wire-level counterpart to
/// [`RoundKeys::schedule`] (which takes fixed-size arrays and cannot fail).
pub fn schedule(crypt_key: &[u8], tweak_key: &[u8]) -> Result<RoundKeys> {
    let crypt_key: &[u8; 16] = crypt_key.try_into().map_err(|_| Error::BadKeyLength)?;
    let tweak_key: &[u8; 16] = tweak_key.try_into().map_err(|_| Error::BadKeyLength)?;
    Ok(RoundKeys::schedule(crypt_key, tweak_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_rejects_bad_key_lengths() {
        assert!(matches!(
            schedule(&[0u8; 15], &[0u8; 16]),
            Err(Error::BadKeyLength)
        ));
        assert!(matches!(
            schedule(&[0u8; 16], &[0u8; 17]),
            Err(Error::BadKeyLength)
        ));
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(matches!(
            RoundKeys::from_bytes(&[0u8; LEN - 1]),
            Err(Error::BadRoundKeysLength)
        ));
    }

    #[test]
    fn as_bytes_round_trips_through_from_bytes() {
        let rk = RoundKeys::schedule(&[0x11u8; 16], &[0x22u8; 16]);
        let rebuilt = RoundKeys::from_bytes(rk.as_bytes()).unwrap();
        assert_eq!(rk.as_bytes(), rebuilt.as_bytes());
    }

    #[test]
    fn crypt_and_tweak_halves_never_mix() {
        let rk = RoundKeys::schedule(&[0x11u8; 16], &[0x22u8; 16]);
        assert_eq!(rk.crypt_key(), &[0x11u8; 16]);
        assert_ne!(rk.crypt_round_keys(), rk.tweak_round_keys());
    }
}
