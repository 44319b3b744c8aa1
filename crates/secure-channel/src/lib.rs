//! Authenticated-encrypted channel over any byte stream: run the XX
//! handshake across a `Read + Write` transport, then exchange framed AEAD
//! traffic with per-direction counters. The channel owns its vault and its
//! identity key; a fatal error poisons it permanently.

mod error;
pub mod framing;
mod session;

pub use error::ChannelError;
pub use kex::DhCurve;
pub use session::SecureChannel;

use std::io::{Read, Write};

use tracing::{debug, warn};

use kex::{Handshake, Role};
use vault::{Secret, Vault};

pub struct Channel<V: Vault, S: Read + Write> {
    vault: V,
    stream: S,
    static_key: Option<Secret>,
    session: Option<SecureChannel>,
    remote_static: Vec<u8>,
}

impl<V: Vault, S: Read + Write> Channel<V, S> {
    /// Dial side: send message 1, process message 2, send message 3.
    pub fn initiate(
        vault: V,
        stream: S,
        static_key: Secret,
        curve: DhCurve,
    ) -> Result<Self, ChannelError> {
        Self::establish(Role::Initiator, vault, stream, static_key, curve)
    }

    /// Listen side: process message 1, send message 2, process message 3.
    pub fn respond(
        vault: V,
        stream: S,
        static_key: Secret,
        curve: DhCurve,
    ) -> Result<Self, ChannelError> {
        Self::establish(Role::Responder, vault, stream, static_key, curve)
    }

    fn establish(
        role: Role,
        mut vault: V,
        mut stream: S,
        static_key: Secret,
        curve: DhCurve,
    ) -> Result<Self, ChannelError> {
        let (keys, remote_static) = {
            let mut handshake = match role {
                Role::Initiator => Handshake::initiator(&mut vault, &static_key, curve)?,
                Role::Responder => Handshake::responder(&mut vault, &static_key, curve)?,
            };
            match role {
                Role::Initiator => {
                    let m1 = handshake.write_message1(&[])?;
                    framing::write_frame(&mut stream, &m1)?;
                    let m2 = framing::read_frame(&mut stream)?;
                    handshake.read_message2(&m2)?;
                    let m3 = handshake.write_message3(&[])?;
                    framing::write_frame(&mut stream, &m3)?;
                }
                Role::Responder => {
                    let m1 = framing::read_frame(&mut stream)?;
                    handshake.read_message1(&m1)?;
                    let m2 = handshake.write_message2(&[])?;
                    framing::write_frame(&mut stream, &m2)?;
                    let m3 = framing::read_frame(&mut stream)?;
                    handshake.read_message3(&m3)?;
                }
            }
            let remote_static = handshake
                .remote_static_public_key()
                .map(|pk| pk.to_vec())
                .unwrap_or_default();
            (handshake.finish()?, remote_static)
        };
        debug!(?role, ?curve, "channel established");
        Ok(Self {
            vault,
            stream,
            static_key: Some(static_key),
            session: Some(SecureChannel::new(keys)),
            remote_static,
        })
    }

    /// The peer's authenticated static public key.
    pub fn remote_static_public_key(&self) -> &[u8] {
        &self.remote_static
    }

    /// Transcript hash binding this channel to its handshake.
    pub fn transcript_hash(&self) -> Option<&[u8; 32]> {
        self.session.as_ref().map(|s| s.transcript_hash())
    }

    /// Encrypt `plaintext` and write it as one frame. Session frames are
    /// bound to the handshake by using the transcript hash as AEAD
    /// associated data.
    pub fn send(&mut self, plaintext: &[u8]) -> Result<(), ChannelError> {
        let session = self.session.as_mut().ok_or(ChannelError::Poisoned)?;
        let h = *session.transcript_hash();
        let frame = match session.encrypt(&mut self.vault, &h, plaintext) {
            Ok(frame) => frame,
            Err(e) => return Self::poison(&mut self.session, &mut self.vault, e),
        };
        if let Err(e) = framing::write_frame(&mut self.stream, &frame) {
            return Self::poison(&mut self.session, &mut self.vault, e);
        }
        Ok(())
    }

    /// Read one frame and decrypt it. Any failure (transport or
    /// authentication) is fatal to the channel.
    pub fn recv(&mut self) -> Result<Vec<u8>, ChannelError> {
        let session = self.session.as_mut().ok_or(ChannelError::Poisoned)?;
        let frame = match framing::read_frame(&mut self.stream) {
            Ok(frame) => frame,
            Err(e) => return Self::poison(&mut self.session, &mut self.vault, e),
        };
        let h = *session.transcript_hash();
        match session.decrypt(&mut self.vault, &h, &frame) {
            Ok(plaintext) => Ok(plaintext),
            Err(e) => Self::poison(&mut self.session, &mut self.vault, e),
        }
    }

    fn poison<T>(
        session: &mut Option<SecureChannel>,
        vault: &mut V,
        err: ChannelError,
    ) -> Result<T, ChannelError> {
        warn!(error = %err, "channel failed");
        if let Some(session) = session.take() {
            session.close(vault);
        }
        Err(err)
    }

    /// Destroy the session keys and the identity key this channel owns.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close(&mut self.vault);
        }
        if let Some(static_key) = self.static_key.take() {
            let _ = self.vault.secret_destroy(static_key);
        }
    }
}

impl<V: Vault, S: Read + Write> Drop for Channel<V, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
