//! Handle-based secret store: secrets live inside a vault and are referenced
//! by opaque move-only handles. All cryptographic operations that need secret
//! material run behind the vault boundary; raw bytes only come out through
//! `secret_export` for buffer/AES types and `secret_public_key` for private
//! keys.

mod error;
mod software;
mod storage;
mod types;

pub use error::VaultError;
pub use software::SoftwareVault;
pub use types::{Secret, SecretAttributes, SecretPersistence, SecretPurpose, SecretType};

pub type Result<T> = std::result::Result<T, VaultError>;

/// AEAD IV layout shared by the handshake and the session: four zero bytes
/// followed by the counter as a big-endian u64.
pub fn aead_iv(counter: u64) -> [u8; 12] {
    let mut iv = [0u8; 12];
    iv[4..].copy_from_slice(&counter.to_be_bytes());
    iv
}

/// Capability trait implemented by vaults. Consumers (the key-agreement state
/// machine, the secure channel) depend only on this trait, so hardware-backed
/// vaults can slot in behind the same handle API.
pub trait Vault {
    /// Fill `out` with uniform random bytes from the vault's entropy source.
    fn random(&mut self, out: &mut [u8]) -> Result<()>;

    /// One-shot SHA-256.
    fn sha256(&self, data: &[u8]) -> [u8; 32];

    /// Create a secret with freshly generated material.
    fn secret_generate(&mut self, attributes: SecretAttributes) -> Result<Secret>;

    /// Create a secret from caller-supplied material.
    fn secret_import(&mut self, attributes: SecretAttributes, material: &[u8]) -> Result<Secret>;

    /// Copy a secret's material out of the vault. Fails with `NotExportable`
    /// for private-key and chain-key types.
    fn secret_export(&self, secret: &Secret) -> Result<zeroize::Zeroizing<Vec<u8>>>;

    fn secret_attributes(&self, secret: &Secret) -> Result<SecretAttributes>;

    /// Public half of a private-key secret (32 bytes X25519, 65 bytes SEC1
    /// uncompressed P-256).
    fn secret_public_key(&self, secret: &Secret) -> Result<Vec<u8>>;

    /// Re-tag a secret. Legal transitions only: `Buffer -> Aes128`,
    /// `Buffer -> Aes256`, `ChainKey -> Buffer`.
    fn secret_type_set(&mut self, secret: &Secret, new_type: SecretType) -> Result<()>;

    /// Overwrite the secret's material and invalidate the handle.
    fn secret_destroy(&mut self, secret: Secret) -> Result<()>;

    /// HKDF-SHA-256 keyed by vault-held secrets: `salt` is the extract salt,
    /// `ikm` the input keying material (absent means empty), and one new
    /// secret is created per entry of `outputs`, slicing the OKM stream in
    /// order.
    fn hkdf_sha256(
        &mut self,
        salt: &Secret,
        ikm: Option<&Secret>,
        outputs: &[SecretAttributes],
    ) -> Result<Vec<Secret>>;

    /// ECDH between a vault-held private key and a peer public key; the
    /// shared secret stays in the vault as a 32-byte `Buffer`.
    fn ecdh(&mut self, private_key: &Secret, peer_public_key: &[u8]) -> Result<Secret>;

    /// AES-GCM encrypt with the IV of [`aead_iv`]; returns ciphertext||tag.
    fn aead_encrypt(
        &mut self,
        key: &Secret,
        nonce: u64,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// AES-GCM decrypt counterpart of [`Vault::aead_encrypt`].
    fn aead_decrypt(
        &mut self,
        key: &Secret,
        nonce: u64,
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>>;

    /// Write a secret's record to the persistent store under `id`.
    fn secret_persist(&mut self, secret: &Secret, id: &str) -> Result<()>;

    /// Re-create a handle for a previously persisted secret.
    fn secret_load(&mut self, id: &str) -> Result<Secret>;

    /// Overwrite and drop every secret currently held in memory.
    fn deinit(&mut self);
}
