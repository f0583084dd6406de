//! Decrypt the first 0xC00 bytes of an NCA (the AES-XTSN-encrypted header
//! region) given a 32-byte `header_key` and print the decrypted bytes as hex.
//!
//! Key provisioning and NCA parsing are out of scope for this crate (see
//! `lib.rs`); this demo only exercises the transform itself.

use std::env;
use std::error::Error as StdError;
use std::fs;

use aes_xtsn::{Error, XtsnKey};

fn parse_hex16(s: &str) -> Result<[u8; 16], Error> {
    let mut out = [0u8; 16];
    if s.len() != 32 {
        return Err(Error::BadKeyLength);
    }
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let hi = (chunk[0] as char).to_digit(16).ok_or(Error::BadKeyLength)?;
        let lo = (chunk[1] as char).to_digit(16).ok_or(Error::BadKeyLength)?;
        out[i] = ((hi << 4) | lo) as u8;
    }
    Ok(out)
}

fn main() -> Result<(), Box<dyn StdError>> {
    let args: Vec<String> = env::args().collect();
    let [_, nca_path, header_key_hex] = args.as_slice() else {
        eprintln!("usage: program <nca-file> <header_key-hex-64chars>");
        std::process::exit(2);
    };

    let crypt_key = parse_hex16(&header_key_hex[..32])?;
    let tweak_key = parse_hex16(&header_key_hex[32..])?;
    let key = XtsnKey::schedule(&crypt_key, &tweak_key);

    let encrypted = fs::read(nca_path)?;
    let header = &encrypted[..0xC00];

    // NCA3 headers number the header's own two sectors contiguously with
    // the four FsHeader sectors (0..5); NCA2 FsHeaders each use sector 0
    // independently. This demo only decrypts the two fixed header sectors.
    let plaintext = key.decrypt(&header[..0x400], 0, None, None)?;

    println!("{}", plaintext.iter().map(|b| format!("{b:02x}")).collect::<String>());
    Ok(())
}
