//! In-memory vault over the software primitives, with an optional file store
//! for persistent secrets.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};

use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::storage::{valid_id, SecretRecord, Storage};
use crate::types::{
    Secret, SecretAttributes, SecretPersistence, SecretPurpose, SecretType, MAX_SECRETS,
};
use crate::{aead_iv, Result, Vault};

const MAX_HKDF_OUTPUTS: usize = 8;
// Scalar rejection for P-256 generation is a ~2^-32 event per draw.
const MAX_SCALAR_RETRIES: usize = 8;

struct Entry {
    attributes: SecretAttributes,
    material: Zeroizing<Vec<u8>>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Software vault: a generational slot table keyed by opaque handles.
///
/// Each handle carries a per-instance tag, so a handle from one vault never
/// resolves in another, and a slot's generation advances on destroy, so a
/// destroyed handle can never alias a later secret.
pub struct SoftwareVault {
    tag: u16,
    slots: Vec<Slot>,
    free: Vec<u32>,
    store: Option<Storage>,
}

// Distinct per instance so a handle can never resolve in a vault that did
// not issue it.
static NEXT_TAG: AtomicU16 = AtomicU16::new(1);

impl SoftwareVault {
    pub fn new() -> Self {
        Self {
            tag: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            store: None,
        }
    }

    /// Vault with a persistent-secret store rooted at `dir`.
    pub fn with_storage(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut vault = Self::new();
        vault.store = Some(Storage::open(dir.into())?);
        Ok(vault)
    }

    fn resolve(&self, secret: &Secret) -> Result<&Entry> {
        if secret.tag() != self.tag {
            return Err(VaultError::UnknownHandle);
        }
        let slot = self
            .slots
            .get(secret.index() as usize)
            .ok_or(VaultError::UnknownHandle)?;
        if slot.generation != secret.generation() {
            return Err(VaultError::UnknownHandle);
        }
        slot.entry.as_ref().ok_or(VaultError::UnknownHandle)
    }

    fn resolve_mut(&mut self, secret: &Secret) -> Result<&mut Entry> {
        if secret.tag() != self.tag {
            return Err(VaultError::UnknownHandle);
        }
        let slot = self
            .slots
            .get_mut(secret.index() as usize)
            .ok_or(VaultError::UnknownHandle)?;
        if slot.generation != secret.generation() {
            return Err(VaultError::UnknownHandle);
        }
        slot.entry.as_mut().ok_or(VaultError::UnknownHandle)
    }

    fn insert(&mut self, attributes: SecretAttributes, material: Zeroizing<Vec<u8>>) -> Result<Secret> {
        let entry = Entry {
            attributes,
            material,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return Ok(Secret::pack(self.tag, index, slot.generation));
        }
        if self.slots.len() >= MAX_SECRETS {
            return Err(VaultError::InvalidAttributes);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            entry: Some(entry),
        });
        Ok(Secret::pack(self.tag, index, 1))
    }

    fn validate(attributes: &SecretAttributes) -> Result<()> {
        match attributes.secret_type.fixed_length() {
            Some(len) if attributes.length != len => Err(VaultError::InvalidAttributes),
            Some(_) => Ok(()),
            None if attributes.length == 0 => Err(VaultError::InvalidAttributes),
            None => Ok(()),
        }
    }

    fn generate_material(&mut self, attributes: &SecretAttributes) -> Result<Zeroizing<Vec<u8>>> {
        let mut material = Zeroizing::new(vec![0u8; attributes.length]);
        if attributes.secret_type == SecretType::P256Private {
            for _ in 0..MAX_SCALAR_RETRIES {
                core_crypto::random::fill(&mut material)?;
                if core_crypto::p256::is_valid_scalar(&material) {
                    return Ok(material);
                }
            }
            return Err(VaultError::NoEntropy);
        }
        core_crypto::random::fill(&mut material)?;
        Ok(material)
    }
}

impl Vault for SoftwareVault {
    fn random(&mut self, out: &mut [u8]) -> Result<()> {
        core_crypto::random::fill(out)?;
        Ok(())
    }

    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        core_crypto::sha256::digest(data)
    }

    fn secret_generate(&mut self, attributes: SecretAttributes) -> Result<Secret> {
        Self::validate(&attributes)?;
        let material = self.generate_material(&attributes)?;
        self.insert(attributes, material)
    }

    fn secret_import(&mut self, attributes: SecretAttributes, material: &[u8]) -> Result<Secret> {
        Self::validate(&attributes)?;
        if material.len() != attributes.length {
            return Err(VaultError::LengthMismatch);
        }
        if attributes.secret_type == SecretType::P256Private
            && !core_crypto::p256::is_valid_scalar(material)
        {
            return Err(VaultError::InvalidAttributes);
        }
        self.insert(attributes, Zeroizing::new(material.to_vec()))
    }

    fn secret_export(&self, secret: &Secret) -> Result<Zeroizing<Vec<u8>>> {
        let entry = self.resolve(secret)?;
        if !entry.attributes.secret_type.is_exportable() {
            return Err(VaultError::NotExportable);
        }
        Ok(Zeroizing::new(entry.material.to_vec()))
    }

    fn secret_attributes(&self, secret: &Secret) -> Result<SecretAttributes> {
        Ok(self.resolve(secret)?.attributes)
    }

    fn secret_public_key(&self, secret: &Secret) -> Result<Vec<u8>> {
        let entry = self.resolve(secret)?;
        match entry.attributes.secret_type {
            SecretType::Curve25519Private => {
                let sk: &[u8; 32] = entry
                    .material
                    .as_slice()
                    .try_into()
                    .map_err(|_| VaultError::LengthMismatch)?;
                Ok(core_crypto::x25519::public_key(sk).to_vec())
            }
            SecretType::P256Private => {
                Ok(core_crypto::p256::public_key(&entry.material)?.to_vec())
            }
            _ => Err(VaultError::NotAPrivateKey),
        }
    }

    fn secret_type_set(&mut self, secret: &Secret, new_type: SecretType) -> Result<()> {
        let entry = self.resolve_mut(secret)?;
        let legal = matches!(
            (entry.attributes.secret_type, new_type),
            (SecretType::Buffer, SecretType::Aes128)
                | (SecretType::Buffer, SecretType::Aes256)
                | (SecretType::ChainKey, SecretType::Buffer)
        );
        if !legal {
            return Err(VaultError::IllegalTransition);
        }
        if let Some(len) = new_type.fixed_length() {
            if entry.material.len() != len {
                return Err(VaultError::LengthMismatch);
            }
        }
        entry.attributes.secret_type = new_type;
        Ok(())
    }

    fn secret_destroy(&mut self, secret: Secret) -> Result<()> {
        if secret.tag() != self.tag {
            return Err(VaultError::UnknownHandle);
        }
        let slot = self
            .slots
            .get_mut(secret.index() as usize)
            .ok_or(VaultError::UnknownHandle)?;
        if slot.generation != secret.generation() || slot.entry.is_none() {
            return Err(VaultError::UnknownHandle);
        }
        // Zeroizing overwrites the material as the entry drops.
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(secret.index());
        Ok(())
    }

    fn hkdf_sha256(
        &mut self,
        salt: &Secret,
        ikm: Option<&Secret>,
        outputs: &[SecretAttributes],
    ) -> Result<Vec<Secret>> {
        if outputs.is_empty() || outputs.len() > MAX_HKDF_OUTPUTS {
            return Err(VaultError::TooManyOutputs);
        }
        for attributes in outputs {
            Self::validate(attributes)?;
            if attributes.secret_type.is_private_key() {
                return Err(VaultError::InvalidAttributes);
            }
        }
        let total: usize = outputs.iter().map(|a| a.length).sum();
        if total > core_crypto::hkdf::MAX_OUTPUT_LEN {
            return Err(VaultError::TooManyOutputs);
        }

        let salt_entry = self.resolve(salt)?;
        if salt_entry.attributes.secret_type.is_private_key() {
            return Err(VaultError::WrongKeyType);
        }
        let salt_material = Zeroizing::new(salt_entry.material.to_vec());
        let ikm_material = match ikm {
            Some(handle) => {
                let entry = self.resolve(handle)?;
                if entry.attributes.secret_type.is_private_key() {
                    return Err(VaultError::WrongKeyType);
                }
                Zeroizing::new(entry.material.to_vec())
            }
            None => Zeroizing::new(Vec::new()),
        };

        let okm = Zeroizing::new(core_crypto::hkdf::derive(
            Some(&salt_material),
            &ikm_material,
            b"",
            total,
        )?);

        let mut secrets = Vec::with_capacity(outputs.len());
        let mut offset = 0;
        for attributes in outputs {
            let material = Zeroizing::new(okm[offset..offset + attributes.length].to_vec());
            offset += attributes.length;
            secrets.push(self.insert(*attributes, material)?);
        }
        Ok(secrets)
    }

    fn ecdh(&mut self, private_key: &Secret, peer_public_key: &[u8]) -> Result<Secret> {
        let entry = self.resolve(private_key)?;
        let shared = match entry.attributes.secret_type {
            SecretType::Curve25519Private => {
                let sk: &[u8; 32] = entry
                    .material
                    .as_slice()
                    .try_into()
                    .map_err(|_| VaultError::LengthMismatch)?;
                let pk: &[u8; 32] = peer_public_key
                    .try_into()
                    .map_err(|_| VaultError::WrongCurve)?;
                core_crypto::x25519::diffie_hellman(sk, pk)?
            }
            SecretType::P256Private => {
                if peer_public_key.len() != core_crypto::p256::PUBLIC_KEY_LEN {
                    return Err(VaultError::WrongCurve);
                }
                core_crypto::p256::diffie_hellman(&entry.material, peer_public_key)?
            }
            _ => return Err(VaultError::NotAPrivateKey),
        };
        let material = Zeroizing::new(shared.to_vec());
        self.insert(SecretAttributes::buffer(material.len()), material)
    }

    fn aead_encrypt(
        &mut self,
        key: &Secret,
        nonce: u64,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let entry = self.resolve(key)?;
        if !entry.attributes.secret_type.is_aes_key() {
            return Err(VaultError::WrongKeyType);
        }
        Ok(core_crypto::aead::seal(
            &entry.material,
            &aead_iv(nonce),
            aad,
            plaintext,
        )?)
    }

    fn aead_decrypt(
        &mut self,
        key: &Secret,
        nonce: u64,
        aad: &[u8],
        ciphertext_and_tag: &[u8],
    ) -> Result<Vec<u8>> {
        let entry = self.resolve(key)?;
        if !entry.attributes.secret_type.is_aes_key() {
            return Err(VaultError::WrongKeyType);
        }
        Ok(core_crypto::aead::open(
            &entry.material,
            &aead_iv(nonce),
            aad,
            ciphertext_and_tag,
        )?)
    }

    fn secret_persist(&mut self, secret: &Secret, id: &str) -> Result<()> {
        if !valid_id(id) {
            return Err(VaultError::InvalidId);
        }
        let store = self.store.as_ref().ok_or(VaultError::NoStore)?;
        let entry = self.resolve(secret)?;
        if entry.attributes.persistence != SecretPersistence::Persistent {
            return Err(VaultError::InvalidAttributes);
        }
        let record = SecretRecord {
            secret_type: entry.attributes.secret_type,
            purpose: entry.attributes.purpose,
            length: entry.attributes.length,
            material: hex::encode(entry.material.as_slice()),
        };
        store.save(id, &record)?;
        tracing::debug!(id, "persisted secret record");
        Ok(())
    }

    fn secret_load(&mut self, id: &str) -> Result<Secret> {
        if !valid_id(id) {
            return Err(VaultError::InvalidId);
        }
        let store = self.store.as_ref().ok_or(VaultError::NoStore)?;
        let record = store.load(id)?;
        let material =
            Zeroizing::new(hex::decode(&record.material).map_err(|_| VaultError::MalformedRecord)?);
        if material.len() != record.length {
            return Err(VaultError::MalformedRecord);
        }
        let attributes = SecretAttributes::new(
            record.secret_type,
            record.purpose,
            SecretPersistence::Persistent,
            record.length,
        );
        Self::validate(&attributes).map_err(|_| VaultError::MalformedRecord)?;
        self.insert(attributes, material)
    }

    fn deinit(&mut self) {
        let live = self.slots.iter().filter(|s| s.entry.is_some()).count();
        if live > 0 {
            tracing::debug!(live, "wiping vault secrets");
        }
        // Dropping each entry zeroises its material.
        self.slots.clear();
        self.free.clear();
    }
}

impl Default for SoftwareVault {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SoftwareVault {
    fn drop(&mut self) {
        self.deinit();
    }
}

impl std::fmt::Debug for SoftwareVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareVault")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("store", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> SoftwareVault {
        SoftwareVault::new()
    }

    #[test]
    fn generate_respects_declared_lengths() {
        let mut v = vault();
        for (attrs, len) in [
            (SecretAttributes::buffer(24), 24),
            (SecretAttributes::aes128(SecretPurpose::KeyAgreement), 16),
            (
                SecretAttributes::new(
                    SecretType::Aes256,
                    SecretPurpose::KeyAgreement,
                    SecretPersistence::Ephemeral,
                    32,
                ),
                32,
            ),
            (SecretAttributes::chain_key(), 32),
        ] {
            let s = v.secret_generate(attrs).unwrap();
            assert_eq!(v.secret_export(&s).unwrap().len(), len);
            assert_eq!(v.secret_attributes(&s).unwrap(), attrs);
        }
    }

    #[test]
    fn generate_rejects_inconsistent_attributes() {
        let mut v = vault();
        let bad = SecretAttributes::new(
            SecretType::Aes128,
            SecretPurpose::KeyAgreement,
            SecretPersistence::Ephemeral,
            32,
        );
        assert!(matches!(
            v.secret_generate(bad),
            Err(VaultError::InvalidAttributes)
        ));
        assert!(matches!(
            v.secret_generate(SecretAttributes::buffer(0)),
            Err(VaultError::InvalidAttributes)
        ));
    }

    #[test]
    fn import_checks_material_length() {
        let mut v = vault();
        let attrs = SecretAttributes::aes128(SecretPurpose::KeyAgreement);
        assert!(matches!(
            v.secret_import(attrs, &[0u8; 15]),
            Err(VaultError::LengthMismatch)
        ));
        let s = v.secret_import(attrs, &[7u8; 16]).unwrap();
        assert_eq!(v.secret_export(&s).unwrap().as_slice(), &[7u8; 16]);
    }

    #[test]
    fn private_keys_never_export() {
        let mut v = vault();
        for secret_type in [SecretType::Curve25519Private, SecretType::P256Private] {
            let s = v
                .secret_generate(SecretAttributes::private_key(
                    secret_type,
                    SecretPersistence::Ephemeral,
                ))
                .unwrap();
            assert!(matches!(
                v.secret_export(&s),
                Err(VaultError::NotExportable)
            ));
            // but the public half is available
            let pk = v.secret_public_key(&s).unwrap();
            let expected = if secret_type == SecretType::P256Private {
                65
            } else {
                32
            };
            assert_eq!(pk.len(), expected);
        }
    }

    #[test]
    fn chain_key_exports_only_after_retag() {
        let mut v = vault();
        let ck = v.secret_generate(SecretAttributes::chain_key()).unwrap();
        assert!(matches!(
            v.secret_export(&ck),
            Err(VaultError::NotExportable)
        ));
        v.secret_type_set(&ck, SecretType::Buffer).unwrap();
        assert_eq!(v.secret_export(&ck).unwrap().len(), 32);
    }

    #[test]
    fn type_set_rejects_illegal_transitions() {
        let mut v = vault();
        let buf32 = v
            .secret_import(SecretAttributes::buffer(32), &[1u8; 32])
            .unwrap();
        // 32-byte buffer cannot become a 16-byte AES key
        assert!(matches!(
            v.secret_type_set(&buf32, SecretType::Aes128),
            Err(VaultError::LengthMismatch)
        ));
        v.secret_type_set(&buf32, SecretType::Aes256).unwrap();
        // AES key cannot go back to buffer
        assert!(matches!(
            v.secret_type_set(&buf32, SecretType::Buffer),
            Err(VaultError::IllegalTransition)
        ));
        let sk = v
            .secret_generate(SecretAttributes::private_key(
                SecretType::Curve25519Private,
                SecretPersistence::Ephemeral,
            ))
            .unwrap();
        assert!(matches!(
            v.secret_type_set(&sk, SecretType::Buffer),
            Err(VaultError::IllegalTransition)
        ));
    }

    #[test]
    fn destroy_invalidates_handle() {
        let mut v = vault();
        let s = v
            .secret_import(SecretAttributes::buffer(4), &[1, 2, 3, 4])
            .unwrap();
        let raw = s.into_raw();
        v.secret_destroy(Secret::from_raw(raw)).unwrap();
        assert!(matches!(
            v.secret_export(&Secret::from_raw(raw)),
            Err(VaultError::UnknownHandle)
        ));
        assert!(matches!(
            v.secret_destroy(Secret::from_raw(raw)),
            Err(VaultError::UnknownHandle)
        ));
        // the freed slot is reused under a new generation
        let s2 = v
            .secret_import(SecretAttributes::buffer(4), &[5, 6, 7, 8])
            .unwrap();
        assert_ne!(s2.into_raw(), raw);
    }

    #[test]
    fn handles_are_not_portable_across_vaults() {
        let mut a = vault();
        let mut b = vault();
        let s = a
            .secret_import(SecretAttributes::buffer(4), &[9u8; 4])
            .unwrap();
        let foreign = Secret::from_raw(s.into_raw());
        assert!(matches!(
            b.secret_export(&foreign),
            Err(VaultError::UnknownHandle)
        ));
        assert!(matches!(
            b.secret_destroy(foreign),
            Err(VaultError::UnknownHandle)
        ));
    }

    #[test]
    fn hkdf_slices_one_okm_stream() {
        let mut v = vault();
        let salt = v
            .secret_import(SecretAttributes::chain_key(), &[3u8; 32])
            .unwrap();
        let ikm = v
            .secret_import(SecretAttributes::buffer(32), &[5u8; 32])
            .unwrap();
        let out = v
            .hkdf_sha256(
                &salt,
                Some(&ikm),
                &[
                    SecretAttributes::chain_key(),
                    SecretAttributes::aes128(SecretPurpose::KeyAgreement),
                ],
            )
            .unwrap();
        assert_eq!(out.len(), 2);
        let reference = core_crypto::hkdf::derive(Some(&[3u8; 32]), &[5u8; 32], b"", 48).unwrap();
        v.secret_type_set(&out[0], SecretType::Buffer).unwrap();
        assert_eq!(
            v.secret_export(&out[0]).unwrap().as_slice(),
            &reference[..32]
        );
        assert_eq!(
            v.secret_export(&out[1]).unwrap().as_slice(),
            &reference[32..48]
        );
    }

    #[test]
    fn hkdf_rejects_private_key_outputs() {
        let mut v = vault();
        let salt = v.secret_generate(SecretAttributes::chain_key()).unwrap();
        let bad = [SecretAttributes::private_key(
            SecretType::Curve25519Private,
            SecretPersistence::Ephemeral,
        )];
        assert!(matches!(
            v.hkdf_sha256(&salt, None, &bad),
            Err(VaultError::InvalidAttributes)
        ));
        assert!(matches!(
            v.hkdf_sha256(&salt, None, &[]),
            Err(VaultError::TooManyOutputs)
        ));
    }

    #[test]
    fn ecdh_agrees_on_both_curves() {
        let mut v = vault();
        for secret_type in [SecretType::Curve25519Private, SecretType::P256Private] {
            let a = v
                .secret_generate(SecretAttributes::private_key(
                    secret_type,
                    SecretPersistence::Ephemeral,
                ))
                .unwrap();
            let b = v
                .secret_generate(SecretAttributes::private_key(
                    secret_type,
                    SecretPersistence::Ephemeral,
                ))
                .unwrap();
            let pa = v.secret_public_key(&a).unwrap();
            let pb = v.secret_public_key(&b).unwrap();
            let s1 = v.ecdh(&a, &pb).unwrap();
            let s2 = v.ecdh(&b, &pa).unwrap();
            assert_eq!(
                v.secret_export(&s1).unwrap().as_slice(),
                v.secret_export(&s2).unwrap().as_slice()
            );
            assert_eq!(
                v.secret_attributes(&s1).unwrap().secret_type,
                SecretType::Buffer
            );
        }
    }

    #[test]
    fn ecdh_rejects_mismatched_curves() {
        let mut v = vault();
        let x = v
            .secret_generate(SecretAttributes::private_key(
                SecretType::Curve25519Private,
                SecretPersistence::Ephemeral,
            ))
            .unwrap();
        assert!(matches!(
            v.ecdh(&x, &[4u8; 65]),
            Err(VaultError::WrongCurve)
        ));
        let weak = [0u8; 32];
        assert!(matches!(v.ecdh(&x, &weak), Err(VaultError::WeakPoint)));
    }

    #[test]
    fn aead_counters_only_shift_the_iv_tail() {
        let mut v = vault();
        let k = v
            .secret_import(SecretAttributes::aes128(SecretPurpose::Epilogue), &[6u8; 16])
            .unwrap();
        let c0 = v.aead_encrypt(&k, 0, b"aad", b"payload").unwrap();
        let c1 = v.aead_encrypt(&k, 1, b"aad", b"payload").unwrap();
        assert_ne!(c0, c1);
        assert_eq!(v.aead_decrypt(&k, 0, b"aad", &c0).unwrap(), b"payload");
        assert_eq!(v.aead_decrypt(&k, 1, b"aad", &c1).unwrap(), b"payload");
        // reference the raw primitive to pin the IV contract
        let direct =
            core_crypto::aead::seal(&[6u8; 16], &crate::aead_iv(1), b"aad", b"payload").unwrap();
        assert_eq!(c1, direct);
        assert!(matches!(
            v.aead_decrypt(&k, 2, b"aad", &c1),
            Err(VaultError::AuthFailed)
        ));
    }

    #[test]
    fn aead_requires_an_aes_key() {
        let mut v = vault();
        let b = v
            .secret_import(SecretAttributes::buffer(16), &[1u8; 16])
            .unwrap();
        assert!(matches!(
            v.aead_encrypt(&b, 0, b"", b"x"),
            Err(VaultError::WrongKeyType)
        ));
    }

    #[test]
    fn persistent_secret_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("vault-store-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut v = SoftwareVault::with_storage(&dir).unwrap();
        let attrs = SecretAttributes::private_key(
            SecretType::Curve25519Private,
            SecretPersistence::Persistent,
        );
        let s = v.secret_import(attrs, &[0x42u8; 32]).unwrap();
        let pk = v.secret_public_key(&s).unwrap();
        v.secret_persist(&s, "identity-key").unwrap();
        drop(v);

        let mut v2 = SoftwareVault::with_storage(&dir).unwrap();
        let restored = v2.secret_load("identity-key").unwrap();
        assert_eq!(v2.secret_public_key(&restored).unwrap(), pk);
        assert!(matches!(
            v2.secret_load("no-such-id"),
            Err(VaultError::UnknownId)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn persist_requires_persistent_attributes_and_a_store() {
        let dir = std::env::temp_dir().join(format!("vault-eph-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut v = SoftwareVault::with_storage(&dir).unwrap();
        let eph = v.secret_generate(SecretAttributes::buffer(8)).unwrap();
        assert!(matches!(
            v.secret_persist(&eph, "eph"),
            Err(VaultError::InvalidAttributes)
        ));
        assert!(matches!(
            v.secret_persist(&eph, "bad id!"),
            Err(VaultError::InvalidId)
        ));

        let mut bare = vault();
        let s = bare
            .secret_import(
                SecretAttributes::new(
                    SecretType::Buffer,
                    SecretPurpose::KeyAgreement,
                    SecretPersistence::Persistent,
                    8,
                ),
                &[1u8; 8],
            )
            .unwrap();
        assert!(matches!(
            bare.secret_persist(&s, "anything"),
            Err(VaultError::NoStore)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn deinit_drops_everything() {
        let mut v = vault();
        let s = v.secret_generate(SecretAttributes::buffer(8)).unwrap();
        v.deinit();
        assert!(matches!(
            v.secret_export(&s),
            Err(VaultError::UnknownHandle)
        ));
    }
}
