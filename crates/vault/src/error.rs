#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid secret attributes")]
    InvalidAttributes,
    #[error("material length does not match attributes")]
    LengthMismatch,
    #[error("unknown secret handle")]
    UnknownHandle,
    #[error("secret is not exportable")]
    NotExportable,
    #[error("secret is not a private key")]
    NotAPrivateKey,
    #[error("wrong secret type for this operation")]
    WrongKeyType,
    #[error("illegal secret type transition")]
    IllegalTransition,
    #[error("authentication failed")]
    AuthFailed,
    #[error("weak public key rejected")]
    WeakPoint,
    #[error("public key does not match the secret's curve")]
    WrongCurve,
    #[error("entropy source unavailable")]
    NoEntropy,
    #[error("too many derived outputs requested")]
    TooManyOutputs,
    #[error("invalid persistent secret id")]
    InvalidId,
    #[error("no record for persistent secret id")]
    UnknownId,
    #[error("no secret store configured")]
    NoStore,
    #[error("secret store record malformed")]
    MalformedRecord,
    #[error("secret store io: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<core_crypto::Error> for VaultError {
    fn from(e: core_crypto::Error) -> Self {
        use core_crypto::Error::*;
        match e {
            AuthFailed => VaultError::AuthFailed,
            WeakPoint => VaultError::WeakPoint,
            PointNotOnCurve => VaultError::WrongCurve,
            InvalidKeyLength => VaultError::WrongKeyType,
            InvalidScalar => VaultError::InvalidAttributes,
            OutputTooLong => VaultError::TooManyOutputs,
            RandomUnavailable | RandomShort => VaultError::NoEntropy,
        }
    }
}
