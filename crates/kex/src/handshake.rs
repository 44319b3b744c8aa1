//! Role-aware XX state machine: `-> e`, `<- e, ee, s, es`, `-> s, se`.
//!
//! The handshake borrows its vault for its whole lifetime and owns the
//! ephemeral keypair plus the symmetric-state handles; the caller keeps
//! ownership of the static identity key. Any failure destroys the owned
//! handles and poisons the instance, and dropping an unfinished handshake
//! does the same.

use tracing::{debug, warn};

use vault::{Secret, SecretAttributes, SecretPersistence, Vault};

use crate::error::KexError;
use crate::symmetric::SymmetricState;
use crate::{DhCurve, TAG_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    WaitM2,
    ReadyM3,
    SendM2,
    WaitM3,
    Done,
    Failed,
}

/// Output of a completed handshake: the two directional AES-128 keys and the
/// final transcript hash for higher-layer channel binding.
#[derive(Debug)]
pub struct HandshakeKeys {
    pub encrypt_key: Secret,
    pub decrypt_key: Secret,
    pub h: [u8; 32],
}

pub struct Handshake<'a, V: Vault> {
    vault: &'a mut V,
    role: Role,
    curve: DhCurve,
    step: Step,
    state: SymmetricState,
    e: Option<Secret>,
    s: &'a Secret,
    re: Option<Vec<u8>>,
    rs: Option<Vec<u8>>,
}

impl<'a, V: Vault> Handshake<'a, V> {
    pub fn initiator(
        vault: &'a mut V,
        static_key: &'a Secret,
        curve: DhCurve,
    ) -> Result<Self, KexError> {
        Self::new(vault, Role::Initiator, static_key, curve, None)
    }

    pub fn responder(
        vault: &'a mut V,
        static_key: &'a Secret,
        curve: DhCurve,
    ) -> Result<Self, KexError> {
        Self::new(vault, Role::Responder, static_key, curve, None)
    }

    /// Initiator with a caller-provided ephemeral keypair instead of a
    /// freshly generated one (externally managed or deterministic keys).
    pub fn initiator_with_ephemeral(
        vault: &'a mut V,
        static_key: &'a Secret,
        curve: DhCurve,
        ephemeral: Secret,
    ) -> Result<Self, KexError> {
        Self::new(vault, Role::Initiator, static_key, curve, Some(ephemeral))
    }

    pub fn responder_with_ephemeral(
        vault: &'a mut V,
        static_key: &'a Secret,
        curve: DhCurve,
        ephemeral: Secret,
    ) -> Result<Self, KexError> {
        Self::new(vault, Role::Responder, static_key, curve, Some(ephemeral))
    }

    fn new(
        vault: &'a mut V,
        role: Role,
        static_key: &'a Secret,
        curve: DhCurve,
        ephemeral: Option<Secret>,
    ) -> Result<Self, KexError> {
        let check_keypair = |vault: &mut V, key: &Secret| -> Result<(), KexError> {
            let attributes = vault.secret_attributes(key)?;
            if attributes.secret_type != curve.private_key_type() {
                return Err(KexError::Vault(vault::VaultError::WrongKeyType));
            }
            Ok(())
        };
        check_keypair(vault, static_key)?;
        let e = match ephemeral {
            Some(e) => {
                if let Err(err) = check_keypair(vault, &e) {
                    let _ = vault.secret_destroy(e);
                    return Err(err);
                }
                e
            }
            None => vault.secret_generate(SecretAttributes::private_key(
                curve.private_key_type(),
                SecretPersistence::Ephemeral,
            ))?,
        };
        let state = match SymmetricState::new(vault, curve.protocol_label()) {
            Ok(state) => state,
            Err(err) => {
                let _ = vault.secret_destroy(e);
                return Err(err);
            }
        };
        debug!(?role, ?curve, "handshake initialised");
        Ok(Self {
            vault,
            role,
            curve,
            step: Step::Start,
            state,
            e: Some(e),
            s: static_key,
            re: None,
            rs: None,
        })
    }

    /// `-> e` plus the plaintext-hashed first payload.
    pub fn write_message1(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Initiator, Step::Start)?;
        let result = self.write_message1_inner(payload);
        self.advance(result, Step::WaitM2)
    }

    pub fn read_message1(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Responder, Step::Start)?;
        if message.len() < self.curve.public_key_len() {
            return self.fail(KexError::ProtocolViolation);
        }
        let result = self.read_message1_inner(message);
        self.advance(result, Step::SendM2)
    }

    /// `<- e, ee, s, es` plus the (now encrypted) second payload.
    pub fn write_message2(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Responder, Step::SendM2)?;
        let result = self.write_message2_inner(payload);
        self.advance(result, Step::WaitM3)
    }

    pub fn read_message2(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Initiator, Step::WaitM2)?;
        let l = self.curve.public_key_len();
        if message.len() < l + (l + TAG_LEN) + TAG_LEN {
            return self.fail(KexError::ProtocolViolation);
        }
        let result = self.read_message2_inner(message);
        self.advance(result, Step::ReadyM3)
    }

    /// `-> s, se` plus the encrypted third payload.
    pub fn write_message3(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Initiator, Step::ReadyM3)?;
        let result = self.write_message3_inner(payload);
        self.advance(result, Step::Done)
    }

    pub fn read_message3(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        self.expect(Role::Responder, Step::WaitM3)?;
        let l = self.curve.public_key_len();
        if message.len() < (l + TAG_LEN) + TAG_LEN {
            return self.fail(KexError::ProtocolViolation);
        }
        let result = self.read_message3_inner(message);
        self.advance(result, Step::Done)
    }

    pub fn is_complete(&self) -> bool {
        self.step == Step::Done
    }

    /// The peer's static public key, known once its authenticating message
    /// has been processed.
    pub fn remote_static_public_key(&self) -> Option<&[u8]> {
        self.rs.as_deref()
    }

    /// Derive the directional keys and hand back everything the session
    /// needs. The ephemeral and chaining handles are destroyed here; the
    /// caller's static key is untouched.
    pub fn finish(mut self) -> Result<HandshakeKeys, KexError> {
        if self.step != Step::Done {
            return Err(KexError::ProtocolViolation);
        }
        let h = *self.state.h();
        let split = self.state.split(self.vault);
        if let Some(e) = self.e.take() {
            let _ = self.vault.secret_destroy(e);
        }
        let (k1, k2) = split?;
        debug!(role = ?self.role, "handshake complete");
        // Initiator decrypts with k1 and encrypts with k2; the responder
        // mirrors it.
        let keys = match self.role {
            Role::Initiator => HandshakeKeys {
                decrypt_key: k1,
                encrypt_key: k2,
                h,
            },
            Role::Responder => HandshakeKeys {
                encrypt_key: k1,
                decrypt_key: k2,
                h,
            },
        };
        Ok(keys)
    }

    fn expect(&mut self, role: Role, step: Step) -> Result<(), KexError> {
        if self.role == role && self.step == step {
            Ok(())
        } else {
            Err(KexError::ProtocolViolation)
        }
    }

    fn advance<T>(&mut self, result: Result<T, KexError>, next: Step) -> Result<T, KexError> {
        match result {
            Ok(value) => {
                self.step = next;
                Ok(value)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: KexError) -> Result<T, KexError> {
        warn!(role = ?self.role, error = %err, "handshake aborted");
        self.cleanup();
        self.step = Step::Failed;
        Err(err)
    }

    fn cleanup(&mut self) {
        if let Some(e) = self.e.take() {
            let _ = self.vault.secret_destroy(e);
        }
        self.state.destroy(self.vault);
    }

    fn write_message1_inner(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let e_pub = self.vault.secret_public_key(e)?;
        self.state.mix_hash(self.vault, &e_pub);
        let mut message = e_pub;
        let body = self.state.encrypt_and_hash(self.vault, payload)?;
        message.extend_from_slice(&body);
        Ok(message)
    }

    fn read_message1_inner(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        let (re, rest) = message.split_at(self.curve.public_key_len());
        self.state.mix_hash(self.vault, re);
        self.re = Some(re.to_vec());
        self.state.decrypt_and_hash(self.vault, rest)
    }

    fn write_message2_inner(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let e_pub = self.vault.secret_public_key(e)?;
        self.state.mix_hash(self.vault, &e_pub);
        let mut message = e_pub;

        let re = self.re.clone().ok_or(KexError::ProtocolViolation)?;
        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let ee = self.vault.ecdh(e, &re)?;
        self.state.mix_key(self.vault, ee)?;

        let s_pub = self.vault.secret_public_key(self.s)?;
        let encrypted_s = self.state.encrypt_and_hash(self.vault, &s_pub)?;
        message.extend_from_slice(&encrypted_s);

        let es = self.vault.ecdh(self.s, &re)?;
        self.state.mix_key(self.vault, es)?;

        let body = self.state.encrypt_and_hash(self.vault, payload)?;
        message.extend_from_slice(&body);
        Ok(message)
    }

    fn read_message2_inner(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        let l = self.curve.public_key_len();
        let (re, rest) = message.split_at(l);
        self.state.mix_hash(self.vault, re);
        self.re = Some(re.to_vec());

        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let ee = self.vault.ecdh(e, re)?;
        self.state.mix_key(self.vault, ee)?;

        let (encrypted_s, rest) = rest.split_at(l + TAG_LEN);
        let rs = self.state.decrypt_and_hash(self.vault, encrypted_s)?;

        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let es = self.vault.ecdh(e, &rs)?;
        self.rs = Some(rs);
        self.state.mix_key(self.vault, es)?;

        self.state.decrypt_and_hash(self.vault, rest)
    }

    fn write_message3_inner(&mut self, payload: &[u8]) -> Result<Vec<u8>, KexError> {
        let s_pub = self.vault.secret_public_key(self.s)?;
        let mut message = self.state.encrypt_and_hash(self.vault, &s_pub)?;

        let re = self.re.clone().ok_or(KexError::ProtocolViolation)?;
        let se = self.vault.ecdh(self.s, &re)?;
        self.state.mix_key(self.vault, se)?;

        let body = self.state.encrypt_and_hash(self.vault, payload)?;
        message.extend_from_slice(&body);
        Ok(message)
    }

    fn read_message3_inner(&mut self, message: &[u8]) -> Result<Vec<u8>, KexError> {
        let l = self.curve.public_key_len();
        let (encrypted_s, rest) = message.split_at(l + TAG_LEN);
        let rs = self.state.decrypt_and_hash(self.vault, encrypted_s)?;

        let e = self.e.as_ref().ok_or(KexError::ProtocolViolation)?;
        let se = self.vault.ecdh(e, &rs)?;
        self.rs = Some(rs);
        self.state.mix_key(self.vault, se)?;

        self.state.decrypt_and_hash(self.vault, rest)
    }
}

impl<V: Vault> Drop for Handshake<'_, V> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
