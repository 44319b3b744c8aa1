//! Noise symmetric state: transcript hash `h`, chaining key `ck`, current
//! message key `k` and counter `n`, all key material behind vault handles.

use zeroize::Zeroize;

use vault::{Secret, SecretAttributes, SecretPurpose, Vault};

use crate::error::KexError;

pub struct SymmetricState {
    h: [u8; 32],
    ck: Option<Secret>,
    k: Option<Secret>,
    n: u64,
}

impl SymmetricState {
    /// Initialise from the protocol label: `h` is the label zero-padded to 32
    /// bytes (hashed instead when longer), `ck` starts equal to `h`, and the
    /// empty prologue is absorbed.
    pub fn new<V: Vault>(vault: &mut V, label: &[u8]) -> Result<Self, KexError> {
        let mut h = [0u8; 32];
        if label.len() <= 32 {
            h[..label.len()].copy_from_slice(label);
        } else {
            h = vault.sha256(label);
        }
        let ck = vault.secret_import(SecretAttributes::chain_key(), &h)?;
        let mut state = Self {
            h,
            ck: Some(ck),
            k: None,
            n: 0,
        };
        state.mix_hash(vault, &[]);
        Ok(state)
    }

    pub fn h(&self) -> &[u8; 32] {
        &self.h
    }

    pub fn has_key(&self) -> bool {
        self.k.is_some()
    }

    /// `h <- SHA256(h || data)`
    pub fn mix_hash<V: Vault>(&mut self, vault: &mut V, data: &[u8]) {
        let mut buf = Vec::with_capacity(self.h.len() + data.len());
        buf.extend_from_slice(&self.h);
        buf.extend_from_slice(data);
        self.h = vault.sha256(&buf);
    }

    /// `ck, k <- HKDF(ck, ikm)`; the counter resets and the previous `ck`,
    /// `k` and the ikm handle are all destroyed.
    pub fn mix_key<V: Vault>(&mut self, vault: &mut V, ikm: Secret) -> Result<(), KexError> {
        let ck = self.ck.take().ok_or(KexError::ProtocolViolation)?;
        let outputs = [
            SecretAttributes::chain_key(),
            SecretAttributes::aes128(SecretPurpose::KeyAgreement),
        ];
        let derived = vault.hkdf_sha256(&ck, Some(&ikm), &outputs);
        let _ = vault.secret_destroy(ikm);
        let _ = vault.secret_destroy(ck);
        let mut derived = derived?;
        let new_k = derived.pop().ok_or(KexError::ProtocolViolation)?;
        let new_ck = derived.pop().ok_or(KexError::ProtocolViolation)?;
        if let Some(old_k) = self.k.take() {
            let _ = vault.secret_destroy(old_k);
        }
        self.ck = Some(new_ck);
        self.k = Some(new_k);
        self.n = 0;
        Ok(())
    }

    /// With a key present: AEAD-encrypt with `h` as associated data, absorb
    /// the ciphertext, bump the counter. Without one: plaintext passes
    /// through and is absorbed as-is.
    pub fn encrypt_and_hash<V: Vault>(
        &mut self,
        vault: &mut V,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, KexError> {
        match &self.k {
            None => {
                self.mix_hash(vault, plaintext);
                Ok(plaintext.to_vec())
            }
            Some(k) => {
                let ciphertext = vault.aead_encrypt(k, self.n, &self.h, plaintext)?;
                self.mix_hash(vault, &ciphertext);
                self.n += 1;
                Ok(ciphertext)
            }
        }
    }

    /// Mirror of [`Self::encrypt_and_hash`]; the ciphertext (not the plaintext) is
    /// absorbed, and the counter only advances on successful authentication.
    pub fn decrypt_and_hash<V: Vault>(
        &mut self,
        vault: &mut V,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, KexError> {
        match &self.k {
            None => {
                self.mix_hash(vault, ciphertext);
                Ok(ciphertext.to_vec())
            }
            Some(k) => {
                let plaintext = vault.aead_decrypt(k, self.n, &self.h, ciphertext)?;
                self.mix_hash(vault, ciphertext);
                self.n += 1;
                Ok(plaintext)
            }
        }
    }

    /// Final derivation: `(k1, k2) <- HKDF(ck, empty)` as the two epilogue
    /// AES-128 keys. Consumes `ck` and the last message key.
    pub fn split<V: Vault>(&mut self, vault: &mut V) -> Result<(Secret, Secret), KexError> {
        let ck = self.ck.take().ok_or(KexError::ProtocolViolation)?;
        let outputs = [
            SecretAttributes::aes128(SecretPurpose::Epilogue),
            SecretAttributes::aes128(SecretPurpose::Epilogue),
        ];
        let derived = vault.hkdf_sha256(&ck, None, &outputs);
        let _ = vault.secret_destroy(ck);
        if let Some(k) = self.k.take() {
            let _ = vault.secret_destroy(k);
        }
        let mut derived = derived?;
        let k2 = derived.pop().ok_or(KexError::ProtocolViolation)?;
        let k1 = derived.pop().ok_or(KexError::ProtocolViolation)?;
        Ok((k1, k2))
    }

    /// Destroy whatever handles remain and wipe the transcript hash.
    pub fn destroy<V: Vault>(&mut self, vault: &mut V) {
        if let Some(ck) = self.ck.take() {
            let _ = vault.secret_destroy(ck);
        }
        if let Some(k) = self.k.take() {
            let _ = vault.secret_destroy(k);
        }
        self.h.zeroize();
        self.n = 0;
    }
}
