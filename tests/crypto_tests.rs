//! Integration tests for the crypto module.

use credvault::crypto::{
    decrypt, derive_key, encrypt, generate_nonce, generate_salt, hash_master, verify_master,
    KdfLevel, VaultKey, NONCE_LEN, SALT_LEN,
};
use credvault::errors::VaultError;

const AAD: &[u8] = b"header-digest";

fn key() -> VaultKey {
    VaultKey::new([0xABu8; 32])
}

// ---------------------------------------------------------------------------
// Encryption round-trip and tamper detection
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let plaintext = br#"{"entries":[]}"#;
    let nonce = generate_nonce();

    let ciphertext = encrypt(plaintext, &key(), &nonce, AAD).expect("encrypt");
    assert_eq!(ciphertext.len(), plaintext.len() + 16);

    let recovered = decrypt(&ciphertext, &key(), &nonce, AAD).expect("decrypt");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn any_flipped_bit_fails_decryption() {
    let plaintext = b"service=github.com;password=p@ss";
    let nonce = generate_nonce();
    let ciphertext = encrypt(plaintext, &key(), &nonce, AAD).unwrap();

    for i in 0..ciphertext.len() {
        let mut tampered = ciphertext.clone();
        tampered[i] ^= 0x01;
        assert!(matches!(
            decrypt(&tampered, &key(), &nonce, AAD),
            Err(VaultError::DecryptionFailed)
        ));
    }

    for i in 0..NONCE_LEN {
        let mut bad_nonce = nonce;
        bad_nonce[i] ^= 0x80;
        assert!(matches!(
            decrypt(&ciphertext, &key(), &bad_nonce, AAD),
            Err(VaultError::DecryptionFailed)
        ));
    }

    for i in 0..AAD.len() {
        let mut bad_aad = AAD.to_vec();
        bad_aad[i] ^= 0x01;
        assert!(matches!(
            decrypt(&ciphertext, &key(), &nonce, &bad_aad),
            Err(VaultError::DecryptionFailed)
        ));
    }
}

#[test]
fn wrong_key_is_indistinguishable_from_tampering() {
    let nonce = generate_nonce();
    let ciphertext = encrypt(b"secret", &key(), &nonce, AAD).unwrap();
    let other = VaultKey::new([0xCDu8; 32]);

    let wrong_key = decrypt(&ciphertext, &other, &nonce, AAD).unwrap_err();
    let wrong_aad = decrypt(&ciphertext, &key(), &nonce, b"other").unwrap_err();
    assert_eq!(wrong_key.to_string(), wrong_aad.to_string());
}

#[test]
fn fresh_nonces_differ() {
    assert_ne!(generate_nonce(), generate_nonce());
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn key_derivation_is_deterministic_per_salt() {
    let salt = generate_salt();
    let k1 = derive_key(b"Secret123", &salt, KdfLevel::Light).unwrap();
    let k2 = derive_key(b"Secret123", &salt, KdfLevel::Light).unwrap();
    assert_eq!(k1, k2);

    let other_salt = generate_salt();
    let k3 = derive_key(b"Secret123", &other_salt, KdfLevel::Light).unwrap();
    assert_ne!(k1, k3);
}

#[test]
fn short_salt_is_rejected() {
    let err = derive_key(b"pw", &[0u8; 8], KdfLevel::Light).unwrap_err();
    assert!(matches!(
        err,
        VaultError::InvalidSalt {
            expected: SALT_LEN,
            actual: 8
        }
    ));
}

// ---------------------------------------------------------------------------
// Master password hashing
// ---------------------------------------------------------------------------

#[test]
fn master_hash_verifies_only_the_right_password() {
    let hash = hash_master(b"Secret123").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_master(b"Secret123", &hash));
    assert!(!verify_master(b"secret123", &hash));
    assert!(!verify_master(b"Secret123", "not-a-hash"));
}

#[test]
fn master_hash_is_salted() {
    assert_ne!(hash_master(b"same").unwrap(), hash_master(b"same").unwrap());
}
