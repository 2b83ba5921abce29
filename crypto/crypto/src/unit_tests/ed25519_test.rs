// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    ed25519::{
        Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature, PRIVATE_KEY_LENGTH,
        PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
    },
    CryptoMaterialError,
};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn keypair_strategy() -> impl Strategy<Value = Ed25519PrivateKey> {
    any::<[u8; 32]>().prop_map(|seed| Ed25519PrivateKey::generate(&mut StdRng::from_seed(seed)))
}

#[test]
fn from_seed_is_deterministic() {
    let a = Ed25519PrivateKey::from_seed([7u8; PRIVATE_KEY_LENGTH]);
    let b = Ed25519PrivateKey::from_seed([7u8; PRIVATE_KEY_LENGTH]);
    assert_eq!(a.public_key(), b.public_key());
    assert_eq!(a.sign(b"payload"), b.sign(b"payload"));
}

#[test]
fn wrong_lengths_are_rejected() {
    assert_eq!(
        Ed25519PublicKey::from_bytes(&[0u8; 31]).unwrap_err(),
        CryptoMaterialError::WrongLengthError {
            expected: PUBLIC_KEY_LENGTH,
            found: 31
        }
    );
    assert!(matches!(
        Ed25519Signature::from_bytes(&[0u8; 12]),
        Err(CryptoMaterialError::WrongLengthError { .. })
    ));
    assert!(Ed25519PrivateKey::from_bytes(&[1u8; 33]).is_err());
}

#[test]
fn encoded_private_key_round_trips() {
    let key = Ed25519PrivateKey::from_seed([3u8; 32]);
    let encoded = key.to_encoded_string();
    let decoded = Ed25519PrivateKey::from_encoded_string(&format!("{}\n", encoded)).unwrap();
    assert_eq!(key.public_key(), decoded.public_key());
    assert!(matches!(
        Ed25519PrivateKey::from_encoded_string("not hex"),
        Err(CryptoMaterialError::HexError(_))
    ));
}

#[test]
fn public_key_serde_uses_hex_for_human_readable_formats() {
    let key = Ed25519PrivateKey::from_seed([9u8; 32]).public_key();
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, format!("\"{}\"", key.to_encoded_string()));
    let from_json: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, key);

    let bytes = bcs::to_bytes(&key).unwrap();
    assert_eq!(bytes.len(), PUBLIC_KEY_LENGTH + 1);
    let from_bcs: Ed25519PublicKey = bcs::from_bytes(&bytes).unwrap();
    assert_eq!(from_bcs, key);
}

proptest! {
    #[test]
    fn signatures_verify_only_for_the_signed_message(
        key in keypair_strategy(),
        message in proptest::collection::vec(any::<u8>(), 0..256),
        other in proptest::collection::vec(any::<u8>(), 1..256),
    ) {
        let signature = key.sign(&message);
        prop_assert!(signature.verify(&message, &key.public_key()).is_ok());
        prop_assume!(message != other);
        prop_assert_eq!(
            signature.verify(&other, &key.public_key()),
            Err(CryptoMaterialError::SignatureVerification)
        );
    }

    #[test]
    fn signatures_do_not_verify_under_other_keys(
        key in keypair_strategy(),
        other_key in keypair_strategy(),
    ) {
        prop_assume!(key.public_key() != other_key.public_key());
        let signature = key.sign(b"network-parameters");
        prop_assert!(signature.verify(b"network-parameters", &other_key.public_key()).is_err());
        prop_assert_eq!(Ed25519Signature::from_bytes(&signature.to_bytes()).unwrap(), signature.clone());
        prop_assert_eq!(signature.to_bytes().len(), SIGNATURE_LENGTH);
    }
}
