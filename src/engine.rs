//! XTSN engine (C4): drives the counter, tweak, and block primitive across a
//! buffer.
//!
//! `encrypt`/`decrypt` share identical control flow and differ only in
//! which data-block strategy is used; the tweak cipher is always the
//! encrypt direction in both cases (see [`Direction`]).

use crate::counter::SectorCounter;
use crate::error::{Error, Result};
use crate::schedule::RoundKeys;
use crate::tweak::Tweak;

#[cfg(feature = "external-provider")]
use crate::provider;

/// Selects which AES-128 strategy a session's data blocks go through. The
/// tweak is always derived with the encrypt direction regardless of this
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    fn crypt_block(self, keys: &RoundKeys, block: &mut [u8; 16]) -> Result<()> {
        #[cfg(feature = "external-provider")]
        if let Some(active) = provider::handle() {
            let ok = match self {
                Direction::Encrypt => active.encrypt_block(keys.crypt_key(), block),
                Direction::Decrypt => active.decrypt_block(keys.crypt_key(), block),
            };
            return if ok {
                Ok(())
            } else {
                Err(Error::CipherProviderFailed)
            };
        }

        match self {
            Direction::Encrypt => crate::aes::encrypt_block(keys.crypt_round_keys(), block),
            Direction::Decrypt => crate::aes::decrypt_block(keys.crypt_round_keys(), block),
        }
        Ok(())
    }
}

/// Validate the common preconditions shared by encrypt and decrypt: every
/// error surfaces before any mutation of the output buffer.
pub(crate) fn validate(
    round_keys_len: usize,
    buf_len: usize,
    sector_size: u32,
    skipped_bytes: u64,
) -> Result<()> {
    if round_keys_len != crate::schedule::LEN {
        return Err(Error::BadRoundKeysLength);
    }
    if buf_len % 16 != 0 {
        return Err(Error::BadBufferAlignment);
    }
    if sector_size == 0 || sector_size % 16 != 0 {
        return Err(Error::BadSectorSize);
    }
    if skipped_bytes % 16 != 0 {
        return Err(Error::BadSkippedBytes);
    }
    Ok(())
}

/// Run the XTSN transform over `buf` in place.
///
/// Preconditions are the caller's responsibility; use [`validate`] (or the
/// public `encrypt`/`decrypt` entry points, which call it) before invoking
/// this directly.
pub(crate) fn run(
    direction: Direction,
    keys: &RoundKeys,
    mut counter: SectorCounter,
    sector_size: u32,
    mut skipped_bytes: u64,
    buf: &mut [u8],
) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }

    let sector_size = sector_size as u64;
    let mut cursor = 0usize;

    // Skipped-bytes (partial-sector resumption) flow: fast-forward the
    // counter over whole sectors already consumed elsewhere, then resume
    // the remainder of the first sector at the correct in-sector tweak
    // position.
    if skipped_bytes >= sector_size {
        counter.step_by(skipped_bytes / sector_size);
        skipped_bytes %= sector_size;
    }
    if skipped_bytes > 0 {
        let mut tweak = Tweak::derive(counter, keys)?;
        for _ in 0..(skipped_bytes / 16) {
            tweak.update();
        }

        let blocks_left_in_sector = (sector_size - skipped_bytes) / 16;
        let mut processed = 0u64;
        while processed < blocks_left_in_sector && cursor < buf.len() {
            crypt_one_block(direction, keys, &mut tweak, &mut buf[cursor..cursor + 16])?;
            tweak.update();
            cursor += 16;
            processed += 1;
        }
        counter.step();
    }

    // Whole-sector loop, followed by (if the buffer doesn't land on a
    // sector boundary) one trailing partial sector that does not advance
    // the counter further.
    let sector_size = sector_size as usize;
    while cursor < buf.len() {
        let mut tweak = Tweak::derive(counter, keys)?;
        let sector_end = (cursor + sector_size).min(buf.len());
        let is_whole_sector = sector_end - cursor == sector_size;

        while cursor < sector_end {
            crypt_one_block(direction, keys, &mut tweak, &mut buf[cursor..cursor + 16])?;
            tweak.update();
            cursor += 16;
        }

        if is_whole_sector {
            counter.step();
        }
    }

    Ok(())
}

#[inline]
fn crypt_one_block(
    direction: Direction,
    keys: &RoundKeys,
    tweak: &mut Tweak,
    block: &mut [u8],
) -> Result<()> {
    let mut b: [u8; 16] = block.try_into().unwrap();
    xor_in_place(&mut b, tweak.as_bytes());
    direction.crypt_block(keys, &mut b)?;
    xor_in_place(&mut b, tweak.as_bytes());
    block.copy_from_slice(&b);
    Ok(())
}

#[inline]
fn xor_in_place(block: &mut [u8; 16], tweak: &[u8; 16]) {
    for i in 0..16 {
        block[i] ^= tweak[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RoundKeys;

    fn keys() -> RoundKeys {
        RoundKeys::schedule(
            &[
                0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
                0xEE, 0xFF,
            ],
            &[
                0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22,
                0x11, 0x00,
            ],
        )
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let rk = keys();
        let mut buf: [u8; 0] = [];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(9, 9),
            512,
            0,
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn vector_1_round_trip_single_block() {
        let rk = keys();
        let pt: [u8; 16] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, 0x0F,
        ];
        let mut buf = pt;
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 0),
            512,
            0,
            &mut buf,
        )
        .unwrap();
        assert_ne!(buf, pt);
        run(
            Direction::Decrypt,
            &rk,
            SectorCounter::new(0, 0),
            512,
            0,
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, pt);
    }

    #[test]
    fn vector_2_tweak_updates_between_blocks() {
        let rk = keys();
        let mut buf = [0u8; 32];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 1),
            512,
            0,
            &mut buf,
        )
        .unwrap();
        assert_ne!(&buf[0..16], &buf[16..32]);

        run(
            Direction::Decrypt,
            &rk,
            SectorCounter::new(0, 1),
            512,
            0,
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, [0u8; 32]);
    }

    #[test]
    fn vector_3_counter_carries_between_sectors() {
        let rk = keys();

        let mut two_sectors = [0u8; 1024];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, u64::MAX),
            512,
            0,
            &mut two_sectors,
        )
        .unwrap();

        let mut second_sector_alone = [0u8; 512];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(1, 0),
            512,
            0,
            &mut second_sector_alone,
        )
        .unwrap();

        assert_eq!(&two_sectors[512..1024], &second_sector_alone[..]);
    }

    #[test]
    fn vector_4_resumption_matches_single_call() {
        let rk = keys();
        let plaintext: Vec<u8> = (0..512u32).map(|i| (i % 256) as u8).collect();

        let mut whole = plaintext.clone();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(3, 3),
            512,
            0,
            &mut whole,
        )
        .unwrap();

        let mut first_half = plaintext[0..256].to_vec();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(3, 3),
            512,
            0,
            &mut first_half,
        )
        .unwrap();

        let mut second_half = plaintext[256..512].to_vec();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(3, 3),
            512,
            256,
            &mut second_half,
        )
        .unwrap();

        let mut resumed = first_half;
        resumed.extend_from_slice(&second_half);
        assert_eq!(resumed, whole);
    }

    #[test]
    fn fast_forward_equivalence() {
        let rk = keys();
        let plaintext: Vec<u8> = (0..512u32).map(|i| (i % 256) as u8).collect();

        let mut via_skipped_bytes = plaintext.clone();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 0),
            512,
            2 * 512,
            &mut via_skipped_bytes,
        )
        .unwrap();

        let mut via_advanced_counter = plaintext;
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 2),
            512,
            0,
            &mut via_advanced_counter,
        )
        .unwrap();

        assert_eq!(via_skipped_bytes, via_advanced_counter);
    }

    #[test]
    fn trailing_partial_sector_does_not_advance_counter_twice() {
        let rk = keys();
        // One whole sector plus a 16-byte trailing partial sector.
        let mut buf = [0u8; 512 + 16];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 0),
            512,
            0,
            &mut buf,
        )
        .unwrap();

        // The trailing block must equal an independent encryption of a
        // single 16-byte partial sector at counter 1 (not 2).
        let mut trailing_alone = [0u8; 16];
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(0, 1),
            512,
            0,
            &mut trailing_alone,
        )
        .unwrap();

        assert_eq!(&buf[512..528], &trailing_alone[..]);
    }

    #[test]
    fn sector_independence_split_on_boundary() {
        let rk = keys();
        let plaintext: Vec<u8> = (0..1024u32).map(|i| (i % 256) as u8).collect();

        let mut combined = plaintext.clone();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(7, 0),
            512,
            0,
            &mut combined,
        )
        .unwrap();

        let mut first = plaintext[0..512].to_vec();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(7, 0),
            512,
            0,
            &mut first,
        )
        .unwrap();

        let mut second = plaintext[512..1024].to_vec();
        run(
            Direction::Encrypt,
            &rk,
            SectorCounter::new(7, 1),
            512,
            0,
            &mut second,
        )
        .unwrap();

        let mut expected = first;
        expected.extend_from_slice(&second);
        assert_eq!(combined, expected);
    }

    #[test]
    fn validate_rejects_each_error_kind() {
        assert!(matches!(
            validate(crate::schedule::LEN - 1, 16, 512, 0),
            Err(Error::BadRoundKeysLength)
        ));
        assert!(matches!(
            validate(crate::schedule::LEN, 15, 512, 0),
            Err(Error::BadBufferAlignment)
        ));
        assert!(matches!(
            validate(crate::schedule::LEN, 16, 0, 0),
            Err(Error::BadSectorSize)
        ));
        assert!(matches!(
            validate(crate::schedule::LEN, 16, 17, 0),
            Err(Error::BadSectorSize)
        ));
        assert!(matches!(
            validate(crate::schedule::LEN, 16, 512, 8),
            Err(Error::BadSkippedBytes)
        ));
        assert!(validate(crate::schedule::LEN, 16, 512, 0).is_ok());
    }
}
