//! Scripted X25519 handshake with fixed static and ephemeral keys, checked
//! against known ciphertext prefixes, plus the transcript-hash recomputation
//! from the raw absorbed byte strings.

use interop::{import_x25519, seq_key};
use kex::{DhCurve, Handshake, HandshakeKeys};
use secure_channel::SecureChannel;
use vault::{SoftwareVault, Vault};

const LABEL: &[u8] = b"Noise_XX_25519_AESGCM_SHA256";

struct Scripted {
    initiator_vault: SoftwareVault,
    responder_vault: SoftwareVault,
    initiator_keys: HandshakeKeys,
    responder_keys: HandshakeKeys,
    messages: [Vec<u8>; 3],
}

fn run_scripted() -> Scripted {
    let mut initiator_vault = SoftwareVault::new();
    let mut responder_vault = SoftwareVault::new();
    let si = import_x25519(&mut initiator_vault, seq_key(0x00));
    let ei = import_x25519(&mut initiator_vault, seq_key(0x20));
    let sr = import_x25519(&mut responder_vault, seq_key(0x01));
    let er = import_x25519(&mut responder_vault, seq_key(0x41));

    let mut initiator =
        Handshake::initiator_with_ephemeral(&mut initiator_vault, &si, DhCurve::X25519, ei)
            .unwrap();
    let mut responder =
        Handshake::responder_with_ephemeral(&mut responder_vault, &sr, DhCurve::X25519, er)
            .unwrap();

    let m1 = initiator.write_message1(&[]).unwrap();
    responder.read_message1(&m1).unwrap();
    let m2 = responder.write_message2(&[]).unwrap();
    initiator.read_message2(&m2).unwrap();
    let m3 = initiator.write_message3(&[]).unwrap();
    responder.read_message3(&m3).unwrap();

    let initiator_keys = initiator.finish().unwrap();
    let responder_keys = responder.finish().unwrap();
    Scripted {
        initiator_vault,
        responder_vault,
        initiator_keys,
        responder_keys,
        messages: [m1, m2, m3],
    }
}

#[test]
fn message_prefixes_match_known_vectors() {
    let s = run_scripted();
    let [m1, m2, m3] = &s.messages;
    assert_eq!(m1.len(), 32);
    assert_eq!(m2.len(), 32 + 48 + 16);
    assert_eq!(m3.len(), 48 + 16);
    assert_eq!(
        hex::encode(&m1[..16]),
        "358072d6365880d1aeea329adf912138"
    );
    assert_eq!(
        hex::encode(&m2[..16]),
        "64b101b1d0be5a8704bd078f9895001f"
    );
    assert_eq!(
        hex::encode(&m3[..16]),
        "e610eadc4b00c17708bf223f29a66f02"
    );
}

#[test]
fn both_sides_agree_on_transcript_and_keys() {
    let s = run_scripted();
    assert_eq!(s.initiator_keys.h, s.responder_keys.h);
    assert_eq!(
        s.initiator_vault
            .secret_export(&s.initiator_keys.encrypt_key)
            .unwrap()
            .as_slice(),
        s.responder_vault
            .secret_export(&s.responder_keys.decrypt_key)
            .unwrap()
            .as_slice()
    );
    assert_eq!(
        s.initiator_vault
            .secret_export(&s.initiator_keys.decrypt_key)
            .unwrap()
            .as_slice(),
        s.responder_vault
            .secret_export(&s.responder_keys.encrypt_key)
            .unwrap()
            .as_slice()
    );
}

#[test]
fn transcript_hash_is_iterated_sha256_over_absorbed_strings() {
    let s = run_scripted();
    let [m1, m2, m3] = &s.messages;

    let mut h = [0u8; 32];
    h[..LABEL.len()].copy_from_slice(LABEL);
    let absorb = |h: &[u8; 32], data: &[u8]| -> [u8; 32] {
        let mut buf = h.to_vec();
        buf.extend_from_slice(data);
        core_crypto::sha256::digest(&buf)
    };
    h = absorb(&h, b""); // empty prologue
    h = absorb(&h, &m1[..32]); // e
    h = absorb(&h, &m1[32..]); // plaintext payload 1
    h = absorb(&h, &m2[..32]); // re
    h = absorb(&h, &m2[32..80]); // encrypted s
    h = absorb(&h, &m2[80..]); // encrypted payload 2
    h = absorb(&h, &m3[..48]); // encrypted s
    h = absorb(&h, &m3[48..]); // encrypted payload 3

    assert_eq!(h, s.initiator_keys.h);
}

#[test]
fn session_vectors_and_tamper_detection() {
    let s = run_scripted();
    let mut vi = s.initiator_vault;
    let mut vr = s.responder_vault;
    let mut initiator = SecureChannel::new(s.initiator_keys);
    let mut responder = SecureChannel::new(s.responder_keys);
    let h = *initiator.transcript_hash();

    // initiator -> responder under nonce 0
    let ct = initiator.encrypt(&mut vi, &h, b"submarineyellow").unwrap();
    assert_eq!(
        hex::encode(&ct[..16]),
        "217c5111fad7afde33bd28abaff3def8"
    );
    assert_eq!(responder.decrypt(&mut vr, &h, &ct).unwrap(), b"submarineyellow");

    // responder -> initiator under its own nonce 0
    let ct = responder.encrypt(&mut vr, &h, b"yellowsubmarine").unwrap();
    assert_eq!(hex::encode(&ct[..15]), "9ea1da1ec3bfecfffab213e537ed17");
    assert_eq!(initiator.decrypt(&mut vi, &h, &ct).unwrap(), b"yellowsubmarine");

    // flipping any byte fails and leaves the receive counter alone
    let ct = initiator.encrypt(&mut vi, &h, b"tamper target").unwrap();
    for i in 0..ct.len() {
        let mut bad = ct.clone();
        bad[i] ^= 0x01;
        assert!(responder.decrypt(&mut vr, &h, &bad).is_err());
        assert_eq!(responder.decrypt_nonce(), 1);
    }
    assert_eq!(responder.decrypt(&mut vr, &h, &ct).unwrap(), b"tamper target");

    initiator.close(&mut vi);
    responder.close(&mut vr);
}

#[test]
fn all_zero_ephemeral_aborts_the_handshake() {
    let mut responder_vault = SoftwareVault::new();
    let sr = import_x25519(&mut responder_vault, seq_key(0x01));
    let er = import_x25519(&mut responder_vault, seq_key(0x41));
    let mut responder =
        Handshake::responder_with_ephemeral(&mut responder_vault, &sr, DhCurve::X25519, er)
            .unwrap();
    responder.read_message1(&[0u8; 32]).unwrap();
    assert!(matches!(
        responder.write_message2(&[]),
        Err(kex::KexError::WeakPoint)
    ));
}
