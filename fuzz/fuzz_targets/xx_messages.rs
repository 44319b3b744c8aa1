#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use kex::{DhCurve, Handshake};
use vault::{SecretAttributes, SecretPersistence, SoftwareVault, Vault};

#[derive(Debug, Arbitrary)]
struct Input {
    /// Bytes fed to the responder as message 1, then message 3.
    m1: Vec<u8>,
    m3: Vec<u8>,
    /// Bytes fed to a fresh initiator as message 2.
    m2: Vec<u8>,
}

fn static_key(vault: &mut SoftwareVault, curve: DhCurve) -> vault::Secret {
    vault
        .secret_generate(SecretAttributes::private_key(
            curve.private_key_type(),
            SecretPersistence::Ephemeral,
        ))
        .expect("generate static key")
}

// Hostile handshake messages may fail but must never panic, and a failed
// step must poison the state machine.
fuzz_target!(|input: Input| {
    for curve in [DhCurve::X25519, DhCurve::P256] {
        let mut vault = SoftwareVault::new();
        let key = static_key(&mut vault, curve);
        let mut responder = Handshake::responder(&mut vault, &key, curve).expect("responder");
        if responder.read_message1(&input.m1).is_ok() {
            if responder.write_message2(&[]).is_ok() {
                let _ = responder.read_message3(&input.m3);
            }
        }

        let mut vault = SoftwareVault::new();
        let key = static_key(&mut vault, curve);
        let mut initiator = Handshake::initiator(&mut vault, &key, curve).expect("initiator");
        let _ = initiator.write_message1(&[]).expect("message 1");
        if initiator.read_message2(&input.m2).is_err() {
            assert!(initiator.write_message3(&[]).is_err());
        }
    }
});
