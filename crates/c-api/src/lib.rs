//! C ABI over the vault: an opaque pointer per vault instance, plain 64-bit
//! integers for secret handles, and integer status codes. Callers own the
//! vault pointer and must free it with [`vault_free`].

use libc::{c_int, size_t};
use std::ptr;
use std::slice;

use vault::{
    Secret, SecretAttributes, SecretPersistence, SecretPurpose, SecretType, SoftwareVault, Vault,
    VaultError,
};

pub const VAULT_OK: c_int = 0;
pub const VAULT_ERROR_INVALID_PARAM: c_int = 1;
pub const VAULT_ERROR_INVALID_ATTRIBUTES: c_int = 2;
pub const VAULT_ERROR_UNKNOWN_HANDLE: c_int = 3;
pub const VAULT_ERROR_POLICY: c_int = 4;
pub const VAULT_ERROR_AUTH_FAILED: c_int = 5;
pub const VAULT_ERROR_WEAK_POINT: c_int = 6;
pub const VAULT_ERROR_ENTROPY: c_int = 7;
pub const VAULT_ERROR_SMALL_BUFFER: c_int = 8;
pub const VAULT_ERROR_STORAGE: c_int = 9;

#[repr(C)]
pub struct VaultHandle(*mut SoftwareVault);

#[repr(C)]
#[derive(Clone, Copy)]
pub struct VaultSecretAttributes {
    pub secret_type: u32,
    pub purpose: u32,
    pub persistence: u32,
    pub length: u32,
}

fn status(err: &VaultError) -> c_int {
    match err {
        VaultError::InvalidAttributes | VaultError::LengthMismatch => {
            VAULT_ERROR_INVALID_ATTRIBUTES
        }
        VaultError::UnknownHandle => VAULT_ERROR_UNKNOWN_HANDLE,
        VaultError::NotExportable
        | VaultError::NotAPrivateKey
        | VaultError::WrongKeyType
        | VaultError::IllegalTransition
        | VaultError::WrongCurve
        | VaultError::TooManyOutputs => VAULT_ERROR_POLICY,
        VaultError::AuthFailed => VAULT_ERROR_AUTH_FAILED,
        VaultError::WeakPoint => VAULT_ERROR_WEAK_POINT,
        VaultError::NoEntropy => VAULT_ERROR_ENTROPY,
        VaultError::InvalidId
        | VaultError::UnknownId
        | VaultError::NoStore
        | VaultError::MalformedRecord
        | VaultError::Storage(_) => VAULT_ERROR_STORAGE,
    }
}

fn decode_attributes(attributes: &VaultSecretAttributes) -> Option<SecretAttributes> {
    let secret_type = match attributes.secret_type {
        0 => SecretType::Buffer,
        1 => SecretType::Aes128,
        2 => SecretType::Aes256,
        3 => SecretType::Curve25519Private,
        4 => SecretType::P256Private,
        5 => SecretType::ChainKey,
        _ => return None,
    };
    let purpose = match attributes.purpose {
        0 => SecretPurpose::KeyAgreement,
        1 => SecretPurpose::Epilogue,
        _ => return None,
    };
    let persistence = match attributes.persistence {
        0 => SecretPersistence::Ephemeral,
        1 => SecretPersistence::Persistent,
        _ => return None,
    };
    Some(SecretAttributes::new(
        secret_type,
        purpose,
        persistence,
        attributes.length as usize,
    ))
}

fn encode_attributes(attributes: &SecretAttributes) -> VaultSecretAttributes {
    VaultSecretAttributes {
        secret_type: match attributes.secret_type {
            SecretType::Buffer => 0,
            SecretType::Aes128 => 1,
            SecretType::Aes256 => 2,
            SecretType::Curve25519Private => 3,
            SecretType::P256Private => 4,
            SecretType::ChainKey => 5,
        },
        purpose: match attributes.purpose {
            SecretPurpose::KeyAgreement => 0,
            SecretPurpose::Epilogue => 1,
        },
        persistence: match attributes.persistence {
            SecretPersistence::Ephemeral => 0,
            SecretPersistence::Persistent => 1,
        },
        length: attributes.length as u32,
    }
}

fn vault_mut<'a>(handle: *mut VaultHandle) -> Option<&'a mut SoftwareVault> {
    unsafe {
        if handle.is_null() || (*handle).0.is_null() {
            None
        } else {
            Some(&mut *(*handle).0)
        }
    }
}

/// Copy `data` into `(out, cap)` and report the written length.
fn copy_out(data: &[u8], out: *mut u8, cap: size_t, out_len: *mut size_t) -> c_int {
    if out.is_null() || out_len.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    if data.len() > cap as usize {
        return VAULT_ERROR_SMALL_BUFFER;
    }
    unsafe {
        ptr::copy_nonoverlapping(data.as_ptr(), out, data.len());
        *out_len = data.len() as size_t;
    }
    VAULT_OK
}

#[no_mangle]
pub extern "C" fn vault_init(out: *mut VaultHandle) -> c_int {
    if out.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let vault = Box::new(SoftwareVault::new());
    unsafe {
        (*out).0 = Box::into_raw(vault);
    }
    VAULT_OK
}

#[no_mangle]
pub extern "C" fn vault_free(handle: *mut VaultHandle) {
    if handle.is_null() {
        return;
    }
    unsafe {
        if !(*handle).0.is_null() {
            // Drop wipes every secret still held.
            let _ = Box::from_raw((*handle).0);
            (*handle).0 = ptr::null_mut();
        }
    }
}

#[no_mangle]
pub extern "C" fn vault_random_bytes(handle: *mut VaultHandle, out: *mut u8, len: size_t) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if out.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let buf = unsafe { slice::from_raw_parts_mut(out, len as usize) };
    match vault.random(buf) {
        Ok(()) => VAULT_OK,
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_sha256(
    handle: *mut VaultHandle,
    input: *const u8,
    input_len: size_t,
    out32: *mut u8,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if (input.is_null() && input_len != 0) || out32.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let data = if input_len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(input, input_len as usize) }
    };
    let digest = vault.sha256(data);
    unsafe {
        ptr::copy_nonoverlapping(digest.as_ptr(), out32, digest.len());
    }
    VAULT_OK
}

#[no_mangle]
pub extern "C" fn vault_secret_generate(
    handle: *mut VaultHandle,
    out_secret: *mut u64,
    attributes: VaultSecretAttributes,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if out_secret.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let Some(attributes) = decode_attributes(&attributes) else {
        return VAULT_ERROR_INVALID_ATTRIBUTES;
    };
    match vault.secret_generate(attributes) {
        Ok(secret) => {
            unsafe { *out_secret = secret.into_raw() };
            VAULT_OK
        }
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_import(
    handle: *mut VaultHandle,
    out_secret: *mut u64,
    attributes: VaultSecretAttributes,
    input: *const u8,
    input_len: size_t,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if out_secret.is_null() || input.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let Some(attributes) = decode_attributes(&attributes) else {
        return VAULT_ERROR_INVALID_ATTRIBUTES;
    };
    let material = unsafe { slice::from_raw_parts(input, input_len as usize) };
    match vault.secret_import(attributes, material) {
        Ok(secret) => {
            unsafe { *out_secret = secret.into_raw() };
            VAULT_OK
        }
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_export(
    handle: *mut VaultHandle,
    secret: u64,
    out: *mut u8,
    cap: size_t,
    out_len: *mut size_t,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    match vault.secret_export(&Secret::from_raw(secret)) {
        Ok(material) => copy_out(&material, out, cap, out_len),
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_publickey_get(
    handle: *mut VaultHandle,
    secret: u64,
    out: *mut u8,
    cap: size_t,
    out_len: *mut size_t,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    match vault.secret_public_key(&Secret::from_raw(secret)) {
        Ok(public_key) => copy_out(&public_key, out, cap, out_len),
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_attributes_get(
    handle: *mut VaultHandle,
    secret: u64,
    out: *mut VaultSecretAttributes,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if out.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    match vault.secret_attributes(&Secret::from_raw(secret)) {
        Ok(attributes) => {
            unsafe { *out = encode_attributes(&attributes) };
            VAULT_OK
        }
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_type_set(
    handle: *mut VaultHandle,
    secret: u64,
    secret_type: u32,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    let new_type = match secret_type {
        0 => SecretType::Buffer,
        1 => SecretType::Aes128,
        2 => SecretType::Aes256,
        _ => return VAULT_ERROR_INVALID_ATTRIBUTES,
    };
    match vault.secret_type_set(&Secret::from_raw(secret), new_type) {
        Ok(()) => VAULT_OK,
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_secret_destroy(handle: *mut VaultHandle, secret: u64) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    match vault.secret_destroy(Secret::from_raw(secret)) {
        Ok(()) => VAULT_OK,
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_ecdh(
    handle: *mut VaultHandle,
    private_key: u64,
    peer_public: *const u8,
    peer_public_len: size_t,
    out_secret: *mut u64,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if peer_public.is_null() || out_secret.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let peer = unsafe { slice::from_raw_parts(peer_public, peer_public_len as usize) };
    match vault.ecdh(&Secret::from_raw(private_key), peer) {
        Ok(secret) => {
            unsafe { *out_secret = secret.into_raw() };
            VAULT_OK
        }
        Err(e) => status(&e),
    }
}

/// `ikm` of zero means derive without input keying material; handles are
/// never zero.
#[no_mangle]
pub extern "C" fn vault_hkdf_sha256(
    handle: *mut VaultHandle,
    salt: u64,
    ikm: u64,
    derived_attributes: *const VaultSecretAttributes,
    derived_count: size_t,
    out_secrets: *mut u64,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if derived_attributes.is_null() || out_secrets.is_null() {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let raw = unsafe { slice::from_raw_parts(derived_attributes, derived_count as usize) };
    let mut outputs = Vec::with_capacity(raw.len());
    for attributes in raw {
        match decode_attributes(attributes) {
            Some(attributes) => outputs.push(attributes),
            None => return VAULT_ERROR_INVALID_ATTRIBUTES,
        }
    }
    let salt = Secret::from_raw(salt);
    let ikm = (ikm != 0).then(|| Secret::from_raw(ikm));
    match vault.hkdf_sha256(&salt, ikm.as_ref(), &outputs) {
        Ok(secrets) => {
            for (i, secret) in secrets.into_iter().enumerate() {
                unsafe { *out_secrets.add(i) = secret.into_raw() };
            }
            VAULT_OK
        }
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_aead_aes_gcm_encrypt(
    handle: *mut VaultHandle,
    key: u64,
    nonce: u64,
    aad: *const u8,
    aad_len: size_t,
    plaintext: *const u8,
    plaintext_len: size_t,
    out: *mut u8,
    cap: size_t,
    out_len: *mut size_t,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if (aad.is_null() && aad_len != 0) || (plaintext.is_null() && plaintext_len != 0) {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let aad = if aad_len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(aad, aad_len as usize) }
    };
    let plaintext = if plaintext_len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(plaintext, plaintext_len as usize) }
    };
    match vault.aead_encrypt(&Secret::from_raw(key), nonce, aad, plaintext) {
        Ok(ciphertext) => copy_out(&ciphertext, out, cap, out_len),
        Err(e) => status(&e),
    }
}

#[no_mangle]
pub extern "C" fn vault_aead_aes_gcm_decrypt(
    handle: *mut VaultHandle,
    key: u64,
    nonce: u64,
    aad: *const u8,
    aad_len: size_t,
    ciphertext: *const u8,
    ciphertext_len: size_t,
    out: *mut u8,
    cap: size_t,
    out_len: *mut size_t,
) -> c_int {
    let Some(vault) = vault_mut(handle) else {
        return VAULT_ERROR_INVALID_PARAM;
    };
    if ciphertext.is_null() || (aad.is_null() && aad_len != 0) {
        return VAULT_ERROR_INVALID_PARAM;
    }
    let aad = if aad_len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(aad, aad_len as usize) }
    };
    let ciphertext = unsafe { slice::from_raw_parts(ciphertext, ciphertext_len as usize) };
    match vault.aead_decrypt(&Secret::from_raw(key), nonce, aad, ciphertext) {
        Ok(plaintext) => copy_out(&plaintext, out, cap, out_len),
        Err(e) => status(&e),
    }
}
