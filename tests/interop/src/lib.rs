//! Shared helpers for the cross-crate scenario tests.

use vault::{Secret, SecretAttributes, SecretPersistence, SecretType, SoftwareVault, Vault};

/// 32 consecutive byte values starting at `start`.
pub fn seq_key(start: u8) -> [u8; 32] {
    core::array::from_fn(|i| start + i as u8)
}

pub fn import_x25519(vault: &mut SoftwareVault, sk: [u8; 32]) -> Secret {
    vault
        .secret_import(
            SecretAttributes::private_key(
                SecretType::Curve25519Private,
                SecretPersistence::Ephemeral,
            ),
            &sk,
        )
        .expect("import x25519 key")
}
