use kex::KexError;
use vault::VaultError;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("frame authentication failed")]
    AuthFailed,
    #[error("direction counter exhausted")]
    NonceExhausted,
    #[error("frame larger than the wire format allows")]
    FrameTooLarge,
    #[error("transport ended mid-frame")]
    TransportShort,
    #[error("transport closed")]
    TransportClosed,
    #[error("transport io: {0}")]
    Io(std::io::Error),
    #[error("handshake failed: {0}")]
    Handshake(#[from] KexError),
    #[error(transparent)]
    Vault(VaultError),
    #[error("channel is unusable after a fatal error")]
    Poisoned,
}

impl From<VaultError> for ChannelError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::AuthFailed => ChannelError::AuthFailed,
            other => ChannelError::Vault(other),
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match e.kind() {
            UnexpectedEof => ChannelError::TransportShort,
            BrokenPipe | ConnectionAborted | ConnectionReset | WriteZero => {
                ChannelError::TransportClosed
            }
            _ => ChannelError::Io(e),
        }
    }
}
