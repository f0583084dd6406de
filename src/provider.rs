//! Optional external AES-128-ECB provider (C6), compiled only under the
//! `external-provider` Cargo feature.
//!
//! A pluggable replacement for the bundled scalar primitive ([`crate::aes`]),
//! discovered at runtime from the host's OpenSSL-compatible shared library
//! via its EVP cipher-context API (`EVP_CIPHER_CTX_new`/`EVP_CipherInit_ex`/
//! `EVP_CipherUpdate`/`EVP_CipherFinal_ex`/`EVP_CIPHER_CTX_free`).
//!
//! All `unsafe` in this crate is confined to this file.

use std::env;
use std::ffi::c_void;
use std::os::raw::{c_int, c_uchar};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use libloading::{Library, Symbol};

const MIN_MAJOR: u64 = 1;
const MIN_MINOR: u64 = 1;
const MIN_PATCH: u64 = 0;

#[cfg(target_os = "linux")]
const CANDIDATE_NAMES: &[&str] = &["libcrypto.so.3", "libcrypto.so.1.1", "libcrypto.so"];
#[cfg(target_os = "macos")]
const CANDIDATE_NAMES: &[&str] = &["libcrypto.3.dylib", "libcrypto.1.1.dylib", "libcrypto.dylib"];
#[cfg(target_os = "windows")]
const CANDIDATE_NAMES: &[&str] = &["libcrypto-3-x64.dll", "libcrypto-1_1-x64.dll", "libcrypto-1_1.dll"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CANDIDATE_NAMES: &[&str] = &[];

type EvpCipherCtxNew = unsafe extern "C" fn() -> *mut c_void;
type EvpCipherCtxFree = unsafe extern "C" fn(*mut c_void);
type EvpAes128Ecb = unsafe extern "C" fn() -> *const c_void;
type EvpCipherInitEx = unsafe extern "C" fn(
    *mut c_void,
    *const c_void,
    *mut c_void,
    *const c_uchar,
    *const c_uchar,
    c_int,
) -> c_int;
type EvpCipherUpdate = unsafe extern "C" fn(
    *mut c_void,
    *mut c_uchar,
    *mut c_int,
    *const c_uchar,
    c_int,
) -> c_int;
type EvpCipherFinalEx = unsafe extern "C" fn(*mut c_void, *mut c_uchar, *mut c_int) -> c_int;
type EvpCipherCtxSetPadding = unsafe extern "C" fn(*mut c_void, c_int) -> c_int;
type EvpCipherKeyLength = unsafe extern "C" fn(*const c_void) -> c_int;
type OpensslVersionNumber = unsafe extern "C" fn() -> u64;

struct Symbols {
    ctx_new: EvpCipherCtxNew,
    ctx_free: EvpCipherCtxFree,
    aes_128_ecb: EvpAes128Ecb,
    init_ex: EvpCipherInitEx,
    update: EvpCipherUpdate,
    final_ex: EvpCipherFinalEx,
    set_padding: EvpCipherCtxSetPadding,
}

/// A loaded, version-checked external AES provider.
pub(crate) struct Provider {
    // Kept alive for the process lifetime; never unloaded once active.
    _library: Library,
    symbols: Symbols,
}

const ENCRYPT: c_int = 1;
const DECRYPT: c_int = 0;

impl Provider {
    /// Run one AES-128-ECB block through the external library under
    /// `key`, using the encrypt or decrypt direction. Returns `false` on
    /// any failure reported by the library; the engine maps that to
    /// [`crate::Error::CipherProviderFailed`].
    pub(crate) fn encrypt_block(&self, key: &[u8; 16], block: &mut [u8; 16]) -> bool {
        self.crypt_block(key, block, ENCRYPT)
    }

    pub(crate) fn decrypt_block(&self, key: &[u8; 16], block: &mut [u8; 16]) -> bool {
        self.crypt_block(key, block, DECRYPT)
    }

    fn crypt_block(&self, key: &[u8; 16], block: &mut [u8; 16], direction: c_int) -> bool {
        // SAFETY: each call creates and tears down its own context; no
        // state is shared across calls or threads.
        unsafe {
            let ctx = (self.symbols.ctx_new)();
            if ctx.is_null() {
                return false;
            }

            let cipher = (self.symbols.aes_128_ecb)();
            let ok = (self.symbols.init_ex)(
                ctx,
                cipher,
                std::ptr::null_mut(),
                key.as_ptr(),
                std::ptr::null(),
                direction,
            ) == 1
                && (self.symbols.set_padding)(ctx, 0) == 1;

            let mut out = [0u8; 32]; // ECB never needs more than blocksize + blocksize headroom
            let mut out_len: c_int = 0;
            let mut final_len: c_int = 0;

            let ok = ok
                && (self.symbols.update)(
                    ctx,
                    out.as_mut_ptr(),
                    &mut out_len,
                    block.as_ptr(),
                    16,
                ) == 1
                && (self.symbols.final_ex)(ctx, out.as_mut_ptr().add(out_len as usize), &mut final_len)
                    == 1;

            (self.symbols.ctx_free)(ctx);

            if ok && (out_len + final_len) as usize >= 16 {
                block.copy_from_slice(&out[..16]);
                true
            } else {
                false
            }
        }
    }
}

fn try_load(name: &str) -> Option<Provider> {
    // SAFETY: symbol signatures below match OpenSSL's public EVP API; a
    // mismatched library would fail the version/key-length checks rather
    // than invoke anything, except for the unavoidable risk inherent to
    // calling into an arbitrary shared library claiming to be libcrypto.
    unsafe {
        let library = Library::new(name).ok()?;

        let version_fn: Symbol<OpensslVersionNumber> =
            library.get(b"OpenSSL_version_num\0").ok()?;
        let version = version_fn();
        // OPENSSL_VERSION_NUMBER packs as 0xMNNFFPPS (legacy) or, from 3.0
        // onward, major in the top byte; either way the top two nibbles
        // carry enough to compare against our minimum.
        let major = (version >> 28) & 0xF;
        let minor = (version >> 20) & 0xFF;
        let patch = (version >> 4) & 0xFF;
        if (major, minor, patch) < (MIN_MAJOR, MIN_MINOR, MIN_PATCH) {
            return None;
        }

        let ctx_new: Symbol<EvpCipherCtxNew> = library.get(b"EVP_CIPHER_CTX_new\0").ok()?;
        let ctx_free: Symbol<EvpCipherCtxFree> = library.get(b"EVP_CIPHER_CTX_free\0").ok()?;
        let aes_128_ecb: Symbol<EvpAes128Ecb> = library.get(b"EVP_aes_128_ecb\0").ok()?;
        let init_ex: Symbol<EvpCipherInitEx> = library.get(b"EVP_CipherInit_ex\0").ok()?;
        let update: Symbol<EvpCipherUpdate> = library.get(b"EVP_CipherUpdate\0").ok()?;
        let final_ex: Symbol<EvpCipherFinalEx> = library.get(b"EVP_CipherFinal_ex\0").ok()?;
        let set_padding: Symbol<EvpCipherCtxSetPadding> =
            library.get(b"EVP_CIPHER_CTX_set_padding\0").ok()?;
        let key_length_fn: Symbol<EvpCipherKeyLength> =
            library.get(b"EVP_CIPHER_key_length\0").ok()?;

        let cipher = aes_128_ecb();
        if key_length_fn(cipher) != 16 {
            return None;
        }

        let symbols = Symbols {
            ctx_new: *ctx_new,
            ctx_free: *ctx_free,
            aes_128_ecb: *aes_128_ecb,
            init_ex: *init_ex,
            update: *update,
            final_ex: *final_ex,
            set_padding: *set_padding,
        };

        Some(Provider {
            _library: library,
            symbols,
        })
    }
}

fn discover() -> Option<Provider> {
    if force_disabled() {
        return None;
    }
    CANDIDATE_NAMES.iter().find_map(|name| try_load(name))
}

static FORCE_DISABLE: AtomicBool = AtomicBool::new(false);

fn force_disabled() -> bool {
    FORCE_DISABLE.load(Ordering::Relaxed) || env::var_os("AES_XTSN_NO_EXTERNAL_PROVIDER").is_some()
}

/// Force every future session onto the bundled AES-128 primitive, even if a
/// usable external library is present. Useful for deterministic tests. Has
/// no effect once a provider has already been discovered and cached by a
/// prior call into this module - call it before the first `encrypt`/
/// `decrypt` in a process.
pub fn force_disable() {
    FORCE_DISABLE.store(true, Ordering::Relaxed);
}

static PROVIDER: OnceLock<Option<Provider>> = OnceLock::new();

/// The active external provider, if one was discovered and is not
/// force-disabled. Initialization is lazy and idempotent.
pub(crate) fn handle() -> Option<&'static Provider> {
    PROVIDER.get_or_init(discover).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_disable_flips_the_flag() {
        // Each test binary shares the `FORCE_DISABLE` flag, so this only
        // checks monotonic behavior (disabling sticks), not the reverse.
        force_disable();
        assert!(force_disabled());
    }

    #[test]
    fn unrecognized_library_name_does_not_panic() {
        assert!(try_load("definitely-not-a-real-library.so").is_none());
    }
}
