//! Per-block tweak state (C3).
//!
//! The tweak is a 128-bit value manipulated in three aliased views across a
//! single algorithm: as 16 bytes (the 0x87 reduction step, the high-bit
//! test), as two little-endian 64-bit limbs (the doubling shift's fast
//! path), and as the plaintext/ciphertext of an AES-128 block call. Rather
//! than model this as a union of views (fragile across host endianness),
//! the tweak here is a plain `[u8; 16]` with an explicit limb-wise fast path
//! that brackets itself with byte swaps.

use crate::aes;
use crate::counter::SectorCounter;
use crate::error::Result;
use crate::schedule::RoundKeys;

#[cfg(feature = "external-provider")]
use crate::error::Error;
#[cfg(feature = "external-provider")]
use crate::provider;

/// A 128-bit XTS-style tweak value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tweak([u8; 16]);

impl Tweak {
    /// Derive the initial tweak for `counter`: the big-endian 16-byte
    /// serialization of the counter, AES-128 encrypted under the tweak key.
    ///
    /// Tweak seeding always uses the encrypt direction, and - like the
    /// engine's data-block strategy - routes through the external AES
    /// provider (C6) when one is active, falling back to the bundled
    /// primitive otherwise. The two are the same strategy-object shape:
    /// only the data cipher's direction varies between them.
    pub fn derive(counter: SectorCounter, keys: &RoundKeys) -> Result<Self> {
        let mut block = counter.to_be_bytes();

        #[cfg(feature = "external-provider")]
        if let Some(active) = provider::handle() {
            return if active.encrypt_block(keys.tweak_key(), &mut block) {
                Ok(Self(block))
            } else {
                Err(Error::CipherProviderFailed)
            };
        }

        aes::encrypt_block(keys.tweak_round_keys(), &mut block);
        Ok(Self(block))
    }

    /// The 16-byte value to XOR on both sides of a data block.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Advance by one position: multiply by `x` in GF(2^128) under the XTS
    /// reduction polynomial `x^128 + x^7 + x^2 + x + 1` (0x87).
    ///
    /// Equivalent byte-wise and limb-wise realizations both left-shift the
    /// 128-bit value by 1 bit (byte 0 / limb 0 least significant) and, if
    /// the top bit of byte 15 was set before the shift, XOR byte 0 with
    /// 0x87 afterward. The limb-wise form here is the fast path; on a
    /// big-endian host the limbs are swapped to little-endian around the
    /// shift so the result is identical to the byte-wise form on every host.
    pub fn update(&mut self) {
        let carry = self.0[15] & 0x80 != 0;

        let lo = u64::from_le_bytes(self.0[0..8].try_into().unwrap());
        let hi = u64::from_le_bytes(self.0[8..16].try_into().unwrap());
        let new_hi = (hi << 1) | (lo >> 63);
        let new_lo = lo << 1;
        self.0[0..8].copy_from_slice(&new_lo.to_le_bytes());
        self.0[8..16].copy_from_slice(&new_hi.to_le_bytes());

        if carry {
            self.0[0] ^= 0x87;
        }
    }
}
