use serde::{Deserialize, Serialize};

/// What a secret's material is, and therefore which operations accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretType {
    Buffer,
    Aes128,
    Aes256,
    Curve25519Private,
    P256Private,
    ChainKey,
}

impl SecretType {
    /// Byte length implied by the type, if any.
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            SecretType::Buffer => None,
            SecretType::Aes128 => Some(16),
            SecretType::Aes256 => Some(32),
            SecretType::Curve25519Private => Some(core_crypto::x25519::PRIVATE_KEY_LEN),
            SecretType::P256Private => Some(core_crypto::p256::PRIVATE_KEY_LEN),
            SecretType::ChainKey => Some(32),
        }
    }

    pub fn is_private_key(self) -> bool {
        matches!(self, SecretType::Curve25519Private | SecretType::P256Private)
    }

    /// Raw material may only cross the vault boundary for these types.
    pub fn is_exportable(self) -> bool {
        matches!(
            self,
            SecretType::Buffer | SecretType::Aes128 | SecretType::Aes256
        )
    }

    pub fn is_aes_key(self) -> bool {
        matches!(self, SecretType::Aes128 | SecretType::Aes256)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretPurpose {
    KeyAgreement,
    Epilogue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretPersistence {
    Ephemeral,
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretAttributes {
    pub secret_type: SecretType,
    pub purpose: SecretPurpose,
    pub persistence: SecretPersistence,
    pub length: usize,
}

impl SecretAttributes {
    pub fn new(
        secret_type: SecretType,
        purpose: SecretPurpose,
        persistence: SecretPersistence,
        length: usize,
    ) -> Self {
        Self {
            secret_type,
            purpose,
            persistence,
            length,
        }
    }

    /// Ephemeral buffer of `length` bytes for key agreement.
    pub fn buffer(length: usize) -> Self {
        Self::new(
            SecretType::Buffer,
            SecretPurpose::KeyAgreement,
            SecretPersistence::Ephemeral,
            length,
        )
    }

    pub fn aes128(purpose: SecretPurpose) -> Self {
        Self::new(SecretType::Aes128, purpose, SecretPersistence::Ephemeral, 16)
    }

    pub fn chain_key() -> Self {
        Self::new(
            SecretType::ChainKey,
            SecretPurpose::KeyAgreement,
            SecretPersistence::Ephemeral,
            32,
        )
    }

    pub fn private_key(secret_type: SecretType, persistence: SecretPersistence) -> Self {
        let length = secret_type.fixed_length().unwrap_or(0);
        Self::new(secret_type, SecretPurpose::KeyAgreement, persistence, length)
    }
}

/// Opaque handle to a secret held by a vault.
///
/// The value is only meaningful to the vault that issued it. Handles are
/// move-only tokens: destroying a secret consumes its handle, so reuse after
/// destroy is a compile error wherever the handle flow is linear, and an
/// `UnknownHandle` at runtime otherwise. `into_raw`/`from_raw` preserve the
/// plain 64-bit shape for FFI boundaries.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Secret(u64);

const INDEX_BITS: u64 = 24;
const GENERATION_BITS: u64 = 24;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u64 = (1 << GENERATION_BITS) - 1;

pub(crate) const MAX_SECRETS: usize = INDEX_MASK as usize;

impl Secret {
    pub(crate) fn pack(tag: u16, index: u32, generation: u32) -> Self {
        let raw = ((tag as u64) << (INDEX_BITS + GENERATION_BITS))
            | ((index as u64 & INDEX_MASK) << GENERATION_BITS)
            | (generation as u64 & GENERATION_MASK);
        Secret(raw)
    }

    pub(crate) fn tag(&self) -> u16 {
        (self.0 >> (INDEX_BITS + GENERATION_BITS)) as u16
    }

    pub(crate) fn index(&self) -> u32 {
        ((self.0 >> GENERATION_BITS) & INDEX_MASK) as u32
    }

    pub(crate) fn generation(&self) -> u32 {
        (self.0 & GENERATION_MASK) as u32
    }

    pub fn into_raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Secret(raw)
    }
}
