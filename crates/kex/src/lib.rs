//! Noise XX key agreement over a vault: three messages of mutual
//! authentication, every secret behind a handle, ending in a pair of
//! directional AEAD keys and the transcript hash.

mod error;
mod handshake;
mod symmetric;

pub use error::KexError;
pub use handshake::{Handshake, HandshakeKeys, Role};
pub use symmetric::SymmetricState;

use vault::SecretType;

/// AES-GCM tag length appended to every encrypted handshake field.
pub const TAG_LEN: usize = 16;

/// Diffie-Hellman instantiation of the XX pattern. The curve fixes the
/// protocol label, the public-key wire length, and the vault secret type of
/// the local keypairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhCurve {
    X25519,
    P256,
}

impl DhCurve {
    pub fn protocol_label(self) -> &'static [u8] {
        match self {
            DhCurve::X25519 => b"Noise_XX_25519_AESGCM_SHA256",
            DhCurve::P256 => b"Noise_XX_P256_AESGCM_SHA256",
        }
    }

    pub fn public_key_len(self) -> usize {
        match self {
            DhCurve::X25519 => 32,
            DhCurve::P256 => 65,
        }
    }

    pub fn private_key_type(self) -> SecretType {
        match self {
            DhCurve::X25519 => SecretType::Curve25519Private,
            DhCurve::P256 => SecretType::P256Private,
        }
    }
}
