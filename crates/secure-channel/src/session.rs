//! Post-handshake session: one AES-128 key and one strictly monotonic
//! counter per direction, AEAD framing per call.

use kex::HandshakeKeys;
use vault::{Secret, Vault};

use crate::error::ChannelError;

pub struct SecureChannel {
    encrypt_key: Secret,
    decrypt_key: Secret,
    encrypt_nonce: u64,
    decrypt_nonce: u64,
    h: [u8; 32],
}

impl SecureChannel {
    pub fn new(keys: HandshakeKeys) -> Self {
        Self {
            encrypt_key: keys.encrypt_key,
            decrypt_key: keys.decrypt_key,
            encrypt_nonce: 0,
            decrypt_nonce: 0,
            h: keys.h,
        }
    }

    /// Transcript hash of the handshake this session came from, retained as
    /// a binding value for higher layers.
    pub fn transcript_hash(&self) -> &[u8; 32] {
        &self.h
    }

    pub fn encrypt_nonce(&self) -> u64 {
        self.encrypt_nonce
    }

    pub fn decrypt_nonce(&self) -> u64 {
        self.decrypt_nonce
    }

    /// Encrypt one frame; the send counter advances on success. The final
    /// counter value is reserved so the direction ends before the IV could
    /// repeat.
    pub fn encrypt<V: Vault>(
        &mut self,
        vault: &mut V,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, ChannelError> {
        if self.encrypt_nonce == u64::MAX {
            return Err(ChannelError::NonceExhausted);
        }
        let ciphertext = vault.aead_encrypt(&self.encrypt_key, self.encrypt_nonce, aad, plaintext)?;
        self.encrypt_nonce += 1;
        Ok(ciphertext)
    }

    /// Decrypt one frame; the receive counter advances only after the tag
    /// verifies, so a tampered frame does not desynchronise the direction.
    pub fn decrypt<V: Vault>(
        &mut self,
        vault: &mut V,
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>, ChannelError> {
        if self.decrypt_nonce == u64::MAX {
            return Err(ChannelError::NonceExhausted);
        }
        let plaintext =
            vault.aead_decrypt(&self.decrypt_key, self.decrypt_nonce, aad, ciphertext_and_tag)?;
        self.decrypt_nonce += 1;
        Ok(plaintext)
    }

    /// Destroy both directional keys.
    pub fn close<V: Vault>(self, vault: &mut V) {
        let _ = vault.secret_destroy(self.encrypt_key);
        let _ = vault.secret_destroy(self.decrypt_key);
    }
}
