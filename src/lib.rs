//! **aes-xtsn** - the Nintendo Switch variant of AES-XTS (AES-XTSN), a
//! tweakable block-cipher mode used to encrypt sector-addressed storage on
//! Switch game images (NCA/NAX0 headers and similar).
//!
//! AES-XTSN differs from standard XTS-AES (IEEE 1619) in how the per-sector
//! tweak seed is produced: the tweak cipher encrypts the **big-endian**
//! encoding of the 128-bit sector counter, rather than treating the sector
//! number as little-endian plaintext. There is no ciphertext stealing -
//! every buffer this crate touches must be a multiple of 16 bytes.
//!
//! # Quick start
//!
//! ```
//! use aes_xtsn::XtsnKey;
//!
//! let key = XtsnKey::schedule(&[0u8; 16], &[0u8; 16]);
//! let plaintext = vec![0u8; 512];
//! let ciphertext = key.encrypt(&plaintext, 0, None, None).unwrap();
//! let round_trip = key.decrypt(&ciphertext, 0, None, None).unwrap();
//! assert_eq!(round_trip, plaintext);
//! ```
//!
//! # What this crate is not
//!
//! Following the same out-of-scope boundary as the original reference
//! (`switchfs`'s `ccrypto` C extension): this crate has no opinion about
//! NCA/NAX0 container parsing, key derivation or key-file loading, or
//! language bindings. Feed it 16-byte keys and aligned buffers and it gives
//! you back aligned ciphertext/plaintext; everything else is a consumer's
//! problem.
//!
//! # Modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`aes`] | Bundled scalar AES-128 primitive (key schedule, block encrypt/decrypt) |
//! | [`schedule`] | The opaque 352-byte scheduled-key pair ([`RoundKeys`]) |
//! | [`counter`] | 128-bit sector counter with carry-propagating increment |
//! | [`tweak`] | Per-block tweak derivation and GF(2^128) doubling |
//! | [`provider`] | Optional runtime-discovered external AES-128-ECB provider (`external-provider` feature) |

mod engine;

pub mod aes;
pub mod counter;
pub mod error;
pub mod schedule;
pub mod tweak;

#[cfg(feature = "external-provider")]
pub mod provider;

pub use counter::SectorCounter;
pub use error::{Error, Result};
pub use schedule::RoundKeys;

use engine::Direction;

/// Default sector size in bytes: 512.
pub const DEFAULT_SECTOR_SIZE: u32 = 0x200;

/// Schedule a `crypt_key`/`tweak_key` pair into their opaque 352-byte
/// [`RoundKeys`] region. Rejects keys that are not exactly 16 bytes.
pub fn schedule(crypt_key: &[u8], tweak_key: &[u8]) -> Result<RoundKeys> {
    schedule::schedule(crypt_key, tweak_key)
}

/// Encrypt `buf` under AES-XTSN, returning a freshly allocated ciphertext
/// buffer of the same length.
///
/// `counter_hi`/`counter_lo` form the 128-bit starting sector counter.
/// `sector_size` must be a positive multiple of 16. `skipped_bytes` resumes
/// a partial sector left over from a previous call on the same logical
/// stream; pass 0 for a fresh sector boundary.
pub fn encrypt(
    round_keys: &[u8],
    buf: &[u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<Vec<u8>> {
    crypt(
        Direction::Encrypt,
        round_keys,
        buf,
        counter_hi,
        counter_lo,
        sector_size,
        skipped_bytes,
    )
}

/// Decrypt `buf` under AES-XTSN. Inverse of [`encrypt`] under the same
/// parameters.
pub fn decrypt(
    round_keys: &[u8],
    buf: &[u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<Vec<u8>> {
    crypt(
        Direction::Decrypt,
        round_keys,
        buf,
        counter_hi,
        counter_lo,
        sector_size,
        skipped_bytes,
    )
}

fn crypt(
    direction: Direction,
    round_keys: &[u8],
    buf: &[u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<Vec<u8>> {
    engine::validate(round_keys.len(), buf.len(), sector_size, skipped_bytes)?;
    let keys = RoundKeys::from_bytes(round_keys)?;
    let mut out = buf.to_vec();
    engine::run(
        direction,
        &keys,
        SectorCounter::new(counter_hi, counter_lo),
        sector_size,
        skipped_bytes,
        &mut out,
    )?;
    Ok(out)
}

/// Encrypt `buf` in place, avoiding the allocation [`encrypt`] performs.
pub fn encrypt_in_place(
    round_keys: &[u8],
    buf: &mut [u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<()> {
    crypt_in_place(
        Direction::Encrypt,
        round_keys,
        buf,
        counter_hi,
        counter_lo,
        sector_size,
        skipped_bytes,
    )
}

/// Decrypt `buf` in place, avoiding the allocation [`decrypt`] performs.
pub fn decrypt_in_place(
    round_keys: &[u8],
    buf: &mut [u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<()> {
    crypt_in_place(
        Direction::Decrypt,
        round_keys,
        buf,
        counter_hi,
        counter_lo,
        sector_size,
        skipped_bytes,
    )
}

fn crypt_in_place(
    direction: Direction,
    round_keys: &[u8],
    buf: &mut [u8],
    counter_hi: u64,
    counter_lo: u64,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<()> {
    engine::validate(round_keys.len(), buf.len(), sector_size, skipped_bytes)?;
    let keys = RoundKeys::from_bytes(round_keys)?;
    engine::run(
        direction,
        &keys,
        SectorCounter::new(counter_hi, counter_lo),
        sector_size,
        skipped_bytes,
        buf,
    )
}

/// Object-oriented convenience handle over a scheduled key pair, as an
/// alternative to the free-function API: build once from the two keys,
/// then `encrypt`/`decrypt` buffers against a single 128-bit sector offset.
pub struct XtsnKey {
    round_keys: RoundKeys,
}

impl XtsnKey {
    /// Schedule a `crypt_key`/`tweak_key` pair (fixed-size, infallible).
    pub fn schedule(crypt_key: &[u8; 16], tweak_key: &[u8; 16]) -> Self {
        Self {
            round_keys: RoundKeys::schedule(crypt_key, tweak_key),
        }
    }

    /// Rebuild a handle from a previously-scheduled 352-byte [`RoundKeys`]
    /// region.
    pub fn from_round_keys(round_keys: RoundKeys) -> Self {
        Self { round_keys }
    }

    /// The underlying scheduled key pair.
    pub fn round_keys(&self) -> &RoundKeys {
        &self.round_keys
    }

    /// Encrypt `buf`, returning a freshly allocated ciphertext of the same
    /// length. `sector_off` is a single 128-bit sector counter, split as
    /// `hi = off >> 64`, `lo = off & 0xFFFF_FFFF_FFFF_FFFF`. `sector_size`
    /// defaults to [`DEFAULT_SECTOR_SIZE`]; `skipped_bytes` defaults to 0.
    pub fn encrypt(
        &self,
        buf: &[u8],
        sector_off: u128,
        sector_size: Option<u32>,
        skipped_bytes: Option<u64>,
    ) -> Result<Vec<u8>> {
        self.crypt(Direction::Encrypt, buf, sector_off, sector_size, skipped_bytes)
    }

    /// Decrypt `buf`. Inverse of [`XtsnKey::encrypt`] under the same
    /// parameters.
    pub fn decrypt(
        &self,
        buf: &[u8],
        sector_off: u128,
        sector_size: Option<u32>,
        skipped_bytes: Option<u64>,
    ) -> Result<Vec<u8>> {
        self.crypt(Direction::Decrypt, buf, sector_off, sector_size, skipped_bytes)
    }

    fn crypt(
        &self,
        direction: Direction,
        buf: &[u8],
        sector_off: u128,
        sector_size: Option<u32>,
        skipped_bytes: Option<u64>,
    ) -> Result<Vec<u8>> {
        let sector_size = sector_size.unwrap_or(DEFAULT_SECTOR_SIZE);
        let skipped_bytes = skipped_bytes.unwrap_or(0);
        engine::validate(
            self.round_keys.as_bytes().len(),
            buf.len(),
            sector_size,
            skipped_bytes,
        )?;

        let mut out = buf.to_vec();
        engine::run(
            direction,
            &self.round_keys,
            SectorCounter::from_u128(sector_off),
            sector_size,
            skipped_bytes,
            &mut out,
        )?;
        Ok(out)
    }
}
