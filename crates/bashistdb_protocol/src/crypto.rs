//! Authenticated encryption with a pre-shared passphrase.

use crate::error::{ProtocolError, ProtocolResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of the per-envelope key derivation salt in bytes.
pub const SALT_SIZE: usize = 16;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const KEY_SIZE: usize = 32;
const KEY_INFO: &[u8] = b"bashistdb-envelope-v1";

/// The pre-shared key of a client/server pair.
///
/// Every sealed envelope derives a fresh AES-256 key from the passphrase and
/// a random salt, so no two envelopes share a key/nonce pair.
/// The passphrase is zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey {
    passphrase: Vec<u8>,
}

impl SharedKey {
    /// Creates a key from a passphrase.
    ///
    /// # Errors
    ///
    /// Returns an error if the passphrase is empty.
    pub fn from_passphrase(passphrase: impl AsRef<[u8]>) -> ProtocolResult<Self> {
        let passphrase = passphrase.as_ref();
        if passphrase.is_empty() {
            return Err(ProtocolError::invalid_key("passphrase must not be empty"));
        }
        Ok(Self {
            passphrase: passphrase.to_vec(),
        })
    }

    /// Encrypts `plaintext`.
    ///
    /// The output format is: `salt (16) || nonce (12) || ciphertext || tag (16)`.
    pub fn seal(&self, plaintext: &[u8]) -> ProtocolResult<Vec<u8>> {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce_bytes);

        let cipher = self.cipher(&salt)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| ProtocolError::integrity("encryption error"))?;

        let mut sealed = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);
        Ok(sealed)
    }

    /// Decrypts data produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns an integrity error if the data is truncated, was sealed with
    /// another key, or was modified in any byte.
    pub fn open(&self, sealed: &[u8]) -> ProtocolResult<Vec<u8>> {
        if sealed.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(ProtocolError::integrity("ciphertext too short"));
        }

        let (salt, rest) = sealed.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);
        let cipher = self.cipher(salt)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ProtocolError::integrity("authentication failed"))
    }

    fn cipher(&self, salt: &[u8]) -> ProtocolResult<Aes256Gcm> {
        let hk = Hkdf::<Sha256>::new(Some(salt), &self.passphrase);
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        hk.expand(KEY_INFO, &mut key[..])
            .map_err(|_| ProtocolError::invalid_key("HKDF expand failed"))?;
        Ok(Aes256Gcm::new(GenericArray::from_slice(&key[..])))
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}
