//! Core cryptographic primitives (thin wrappers around ring / dalek / p256)

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("authentication failed")]
    AuthFailed,
    #[error("invalid key length")]
    InvalidKeyLength,
    #[error("weak public key")]
    WeakPoint,
    #[error("point not on curve")]
    PointNotOnCurve,
    #[error("invalid private scalar")]
    InvalidScalar,
    #[error("requested output too long")]
    OutputTooLong,
    #[error("entropy source unavailable")]
    RandomUnavailable,
    #[error("entropy read incomplete")]
    RandomShort,
}

pub mod sha256 {
    use ring::digest;

    pub const DIGEST_LEN: usize = 32;

    pub fn digest(data: &[u8]) -> [u8; DIGEST_LEN] {
        let d = digest::digest(&digest::SHA256, data);
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(d.as_ref());
        out
    }
}

pub mod hkdf {
    use crate::Error;
    use ring::hkdf::{KeyType, Salt, HKDF_SHA256};

    pub const MAX_OUTPUT_LEN: usize = 255 * 32;

    // Runtime length marker to request arbitrary-length OKM from ring's HKDF.
    struct OkmLen(usize);
    impl KeyType for OkmLen {
        fn len(&self) -> usize {
            self.0
        }
    }

    /// RFC 5869 extract-then-expand. A missing salt behaves as the RFC's
    /// zero-filled default (HMAC pads both the same way).
    pub fn derive(
        salt: Option<&[u8]>,
        ikm: &[u8],
        info: &[u8],
        out_len: usize,
    ) -> Result<Vec<u8>, Error> {
        if out_len > MAX_OUTPUT_LEN {
            return Err(Error::OutputTooLong);
        }
        let prk = Salt::new(HKDF_SHA256, salt.unwrap_or(&[])).extract(ikm);
        let info_slices: [&[u8]; 1] = [info];
        let okm = prk
            .expand(&info_slices, OkmLen(out_len))
            .map_err(|_| Error::OutputTooLong)?;
        let mut out = vec![0u8; out_len];
        okm.fill(&mut out).map_err(|_| Error::OutputTooLong)?;
        Ok(out)
    }
}

pub mod aead {
    use crate::Error;
    use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};

    pub const TAG_LEN: usize = 16;
    pub const NONCE_LEN: usize = 12;

    fn algorithm(key: &[u8]) -> Result<&'static aead::Algorithm, Error> {
        match key.len() {
            16 => Ok(&aead::AES_128_GCM),
            32 => Ok(&aead::AES_256_GCM),
            _ => Err(Error::InvalidKeyLength),
        }
    }

    // AES-GCM (12-byte IV, 16-byte trailing tag)
    pub fn seal(
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        pt: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let unbound = UnboundKey::new(algorithm(key)?, key).map_err(|_| Error::InvalidKeyLength)?;
        let key = LessSafeKey::new(unbound);
        let mut buf = pt.to_vec();
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(*nonce),
            Aad::from(aad),
            &mut buf,
        )
        .map_err(|_| Error::InvalidKeyLength)?;
        Ok(buf)
    }

    pub fn open(
        key: &[u8],
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        ct: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let unbound = UnboundKey::new(algorithm(key)?, key).map_err(|_| Error::InvalidKeyLength)?;
        let key = LessSafeKey::new(unbound);
        let mut buf = ct.to_vec();
        let out = key
            .open_in_place(
                Nonce::assume_unique_for_key(*nonce),
                Aad::from(aad),
                &mut buf,
            )
            .map_err(|_| Error::AuthFailed)?;
        Ok(out.to_vec())
    }
}

pub mod x25519 {
    use crate::Error;
    use curve25519_dalek::montgomery::MontgomeryPoint;

    pub const PRIVATE_KEY_LEN: usize = 32;
    pub const PUBLIC_KEY_LEN: usize = 32;

    pub fn public_key(sk: &[u8; PRIVATE_KEY_LEN]) -> [u8; PUBLIC_KEY_LEN] {
        MontgomeryPoint::mul_base_clamped(*sk).to_bytes()
    }

    /// X25519 scalar multiplication. The all-zero shared secret marks a
    /// low-order peer point and is rejected.
    pub fn diffie_hellman(
        sk: &[u8; PRIVATE_KEY_LEN],
        peer_pk: &[u8; PUBLIC_KEY_LEN],
    ) -> Result<[u8; 32], Error> {
        let shared = MontgomeryPoint(*peer_pk).mul_clamped(*sk).to_bytes();
        if shared == [0u8; 32] {
            return Err(Error::WeakPoint);
        }
        Ok(shared)
    }
}

pub mod p256 {
    use crate::Error;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use p256::{PublicKey, SecretKey};

    pub const PRIVATE_KEY_LEN: usize = 32;
    // SEC1 uncompressed: 0x04 || x || y
    pub const PUBLIC_KEY_LEN: usize = 65;

    pub fn public_key(sk: &[u8]) -> Result<[u8; PUBLIC_KEY_LEN], Error> {
        let sk = SecretKey::from_slice(sk).map_err(|_| Error::InvalidScalar)?;
        let point = sk.public_key().to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        Ok(out)
    }

    /// ECDH over NIST P-256; returns the affine X coordinate. Peer points
    /// are validated by the SEC1 parser.
    pub fn diffie_hellman(sk: &[u8], peer_pk: &[u8]) -> Result<[u8; 32], Error> {
        let sk = SecretKey::from_slice(sk).map_err(|_| Error::InvalidScalar)?;
        let peer = PublicKey::from_sec1_bytes(peer_pk).map_err(|_| Error::PointNotOnCurve)?;
        let shared = ::p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), peer.as_affine());
        let mut out = [0u8; 32];
        out.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(out)
    }

    /// Whether `sk` is a valid non-zero scalar below the group order.
    pub fn is_valid_scalar(sk: &[u8]) -> bool {
        SecretKey::from_slice(sk).is_ok()
    }
}

pub mod random {
    use crate::Error;
    use ring::rand::{SecureRandom, SystemRandom};

    /// Fill `out` from the OS CSPRNG. ring retries interrupted reads
    /// internally, so a failure here means the source itself is unusable.
    pub fn fill(out: &mut [u8]) -> Result<(), Error> {
        SystemRandom::new()
            .fill(out)
            .map_err(|_| Error::RandomUnavailable)
    }
}
