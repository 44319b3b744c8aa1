//! End-to-end channels over real sockets, including an identity key that
//! survives a vault restart through the persistent store.

use std::net::TcpListener;
use std::thread;

use kex::DhCurve;
use secure_channel::Channel;
use vault::{Secret, SecretAttributes, SecretPersistence, SoftwareVault, Vault};

fn fresh_identity(vault: &mut SoftwareVault, curve: DhCurve) -> Secret {
    vault
        .secret_generate(SecretAttributes::private_key(
            curve.private_key_type(),
            SecretPersistence::Ephemeral,
        ))
        .unwrap()
}

#[test]
fn echo_over_tcp_on_both_curves() {
    for curve in [DhCurve::X25519, DhCurve::P256] {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            let mut vault = SoftwareVault::new();
            let key = fresh_identity(&mut vault, curve);
            let mut channel = Channel::respond(vault, socket, key, curve).unwrap();
            loop {
                let msg = channel.recv().unwrap();
                if msg == b"bye" {
                    break;
                }
                channel.send(&msg).unwrap();
            }
            channel.close();
        });

        let socket = std::net::TcpStream::connect(addr).unwrap();
        let mut vault = SoftwareVault::new();
        let key = fresh_identity(&mut vault, curve);
        let mut channel = Channel::initiate(vault, socket, key, curve).unwrap();
        for size in [1usize, 64, 4096] {
            let msg = vec![0x5au8; size];
            channel.send(&msg).unwrap();
            assert_eq!(channel.recv().unwrap(), msg);
        }
        channel.send(b"bye").unwrap();
        channel.close();
        server.join().unwrap();
    }
}

#[test]
fn identity_key_survives_restart_and_still_authenticates() {
    let curve = DhCurve::X25519;
    let dir = std::env::temp_dir().join(format!("channel-identity-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    // first process lifetime: mint and persist the identity
    let expected_public = {
        let mut vault = SoftwareVault::with_storage(&dir).unwrap();
        let key = vault
            .secret_generate(SecretAttributes::private_key(
                curve.private_key_type(),
                SecretPersistence::Persistent,
            ))
            .unwrap();
        vault.secret_persist(&key, "initiator-identity").unwrap();
        vault.secret_public_key(&key).unwrap()
    };

    // second lifetime: reload the identity and run a channel with it
    let mut vault = SoftwareVault::with_storage(&dir).unwrap();
    let key = vault.secret_load("initiator-identity").unwrap();
    assert_eq!(vault.secret_public_key(&key).unwrap(), expected_public);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (socket, _) = listener.accept().unwrap();
        let mut vault = SoftwareVault::new();
        let responder_key = fresh_identity(&mut vault, curve);
        let channel = Channel::respond(vault, socket, responder_key, curve).unwrap();
        channel.remote_static_public_key().to_vec()
    });

    let socket = std::net::TcpStream::connect(addr).unwrap();
    let channel = Channel::initiate(vault, socket, key, curve).unwrap();
    let seen_by_responder = server.join().unwrap();
    // the responder authenticated exactly the restored identity
    assert_eq!(seen_by_responder, expected_public);
    channel.close();

    let _ = std::fs::remove_dir_all(&dir);
}
