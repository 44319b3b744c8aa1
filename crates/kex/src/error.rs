use vault::VaultError;

/// Handshake errors are terminal: the state machine destroys every secret it
/// owns before surfacing one, and the instance refuses further use.
#[derive(Debug, thiserror::Error)]
pub enum KexError {
    #[error("handshake message failed authentication")]
    AuthFailed,
    #[error("peer public key is a weak point")]
    WeakPoint,
    #[error("malformed or out-of-order handshake message")]
    ProtocolViolation,
    #[error(transparent)]
    Vault(VaultError),
}

impl From<VaultError> for KexError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::AuthFailed => KexError::AuthFailed,
            VaultError::WeakPoint => KexError::WeakPoint,
            other => KexError::Vault(other),
        }
    }
}
