// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Sealed pagination tokens.
//!
//! The search backend's cursor encodes sort positions the caller must not
//! forge, so it never leaves the process in the clear. A page token is the
//! cursor encrypted under a process-wide key:
//! `base64url(nonce_24B || ciphertext || tag_16B)`.
//!
//! The key is derived from `PAGE_TOKEN_SECRET` exactly once at startup;
//! there is no rotation within a process lifetime, a rolling restart rotates
//! the key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305, XNonce,
};
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::error::QueryError;

/// The environment variable the sealing key is derived from.
pub const SECRET_ENV_VAR: &str = "PAGE_TOKEN_SECRET";

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 24;
const TAG_LENGTH: usize = 16;

static SEALING_KEY: OnceCell<Key> = OnceCell::new();

#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum TokenError {
    #[error("`{SECRET_ENV_VAR}` must not be empty")]
    EmptySecret,
    #[error("page token key is not initialized")]
    Uninitialized,
    #[error("invalid page token")]
    Invalid,
}

impl From<TokenError> for QueryError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => QueryError::InvalidPageToken,
            err => QueryError::unexpected(err),
        }
    }
}

/// Initializes the process-wide sealing key from the shared secret.
///
/// Secrets shorter than 32 bytes are right-padded with zeros, longer ones
/// are truncated. Calling this a second time is a no-op; the first key
/// wins.
pub fn init(secret: &str) -> Result<(), TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    let mut key = [0u8; KEY_LENGTH];
    let len = secret.len().min(KEY_LENGTH);
    key[..len].copy_from_slice(&secret.as_bytes()[..len]);
    SEALING_KEY.get_or_init(|| Key::from(key));
    Ok(())
}

/// Seals a backend cursor into an opaque, URL-safe token.
pub fn seal(cursor: &[u8]) -> Result<String, TokenError> {
    let key = SEALING_KEY.get().ok_or(TokenError::Uninitialized)?;
    let cipher = XChaCha20Poly1305::new(key);
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    // Encryption only fails on absurd plaintext lengths.
    let ciphertext = cipher.encrypt(&nonce, cursor).map_err(|_| TokenError::Invalid)?;

    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(sealed))
}

/// Opens a sealed token back into the backend cursor it carries.
///
/// Any malformed, truncated or tampered token fails with
/// [`TokenError::Invalid`].
pub fn open(token: &str) -> Result<Vec<u8>, TokenError> {
    let key = SEALING_KEY.get().ok_or(TokenError::Uninitialized)?;
    let sealed = URL_SAFE_NO_PAD.decode(token).map_err(|_| TokenError::Invalid)?;
    if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(TokenError::Invalid);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);

    let cipher = XChaCha20Poly1305::new(key);
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rand::RngCore;

    use super::*;

    fn init_test_key() {
        init("a test secret that is longer than thirty-two bytes").unwrap();
    }

    #[test]
    fn seal_open_round_trip() {
        init_test_key();
        let cursor = br#"["board of directors","committee:42"]"#;
        let token = seal(cursor).unwrap();
        assert_eq!(open(&token).unwrap(), cursor);
    }

    #[test]
    fn round_trip_random_cursors() {
        init_test_key();
        let mut rng = rand::thread_rng();
        for len in [0usize, 1, 16, 64, 512] {
            let mut cursor = vec![0u8; len];
            rng.fill_bytes(&mut cursor);
            let token = seal(&cursor).unwrap();
            assert_eq!(open(&token).unwrap(), cursor);
        }
    }

    #[test]
    fn tokens_are_unique_per_seal() {
        init_test_key();
        let cursor = b"[1]";
        assert_ne!(seal(cursor).unwrap(), seal(cursor).unwrap());
    }

    #[test]
    fn tampering_is_detected() {
        init_test_key();
        let token = seal(b"[42]").unwrap();
        let mut sealed = URL_SAFE_NO_PAD.decode(&token).unwrap();
        for i in 0..sealed.len() {
            sealed[i] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&sealed);
            assert!(matches!(open(&tampered), Err(TokenError::Invalid)), "byte {i}");
            sealed[i] ^= 0x01;
        }
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        init_test_key();
        assert!(matches!(open("ZZZZ"), Err(TokenError::Invalid)));
        assert!(matches!(open("not/base64url!"), Err(TokenError::Invalid)));
        assert!(matches!(open(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn empty_secret_is_fatal() {
        assert!(matches!(init(""), Err(TokenError::EmptySecret)));
    }
}
