// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! This module provides an API for the PureEdDSA signature scheme over the ed25519 twisted
//! Edwards curve as defined in [RFC8032](https://tools.ietf.org/html/rfc8032).
//!
//! Signature verification uses the strict variant, rejecting small-order keys and
//! non-canonical signatures.
//!
//! # Examples
//!
//! ```
//! use netboot_crypto::ed25519::Ed25519PrivateKey;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::from_seed([0; 32]);
//! let private_key = Ed25519PrivateKey::generate(&mut rng);
//! let signature = private_key.sign(b"Test message");
//! assert!(signature.verify(b"Test message", &private_key.public_key()).is_ok());
//! ```

use crate::CryptoMaterialError;
use ed25519_dalek::ExpandedSecretKey;
use rand::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

/// The length of the Ed25519PrivateKey
pub const PRIVATE_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// The length of the Ed25519PublicKey
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// The length of the Ed25519Signature
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// An Ed25519 private key
pub struct Ed25519PrivateKey(ed25519_dalek::SecretKey);

/// An Ed25519 public key
#[derive(Clone)]
pub struct Ed25519PublicKey(ed25519_dalek::PublicKey);

/// An Ed25519 signature
#[derive(Clone)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519PrivateKey {
    /// Generates a fresh key from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; PRIVATE_KEY_LENGTH];
        rng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Deterministically derives a key from a 32 byte seed.
    pub fn from_seed(seed: [u8; PRIVATE_KEY_LENGTH]) -> Self {
        Ed25519PrivateKey(
            ed25519_dalek::SecretKey::from_bytes(&seed)
                .expect("a seed of SECRET_KEY_LENGTH bytes is always a valid secret key"),
        )
    }

    /// Serialize an Ed25519PrivateKey.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Deserialize an Ed25519PrivateKey, only checking the key size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoMaterialError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError {
                expected: PRIVATE_KEY_LENGTH,
                found: bytes.len(),
            });
        }
        ed25519_dalek::SecretKey::from_bytes(bytes)
            .map(Ed25519PrivateKey)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }

    /// Hex form of the key, used when persisting it to a node directory.
    pub fn to_encoded_string(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses the hex form produced by [`Ed25519PrivateKey::to_encoded_string`].
    pub fn from_encoded_string(encoded: &str) -> Result<Self, CryptoMaterialError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CryptoMaterialError::HexError(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Derives the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey((&self.0).into())
    }

    /// Signs an arbitrary message.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        let public_key: ed25519_dalek::PublicKey = (&self.0).into();
        let expanded = ExpandedSecretKey::from(&self.0);
        Ed25519Signature(expanded.sign(message, &public_key))
    }
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<elided secret for Ed25519PrivateKey>")
    }
}

#[cfg(any(test, feature = "cloneable-private-keys"))]
impl Clone for Ed25519PrivateKey {
    fn clone(&self) -> Self {
        Self::from_seed(self.to_bytes())
    }
}

impl Ed25519PublicKey {
    /// Serialize an Ed25519PublicKey.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Deserialize an Ed25519PublicKey, rejecting points that do not decompress.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoMaterialError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError {
                expected: PUBLIC_KEY_LENGTH,
                found: bytes.len(),
            });
        }
        ed25519_dalek::PublicKey::from_bytes(bytes)
            .map(Ed25519PublicKey)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }

    /// Lower-case hex form of the key.
    pub fn to_encoded_string(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses the hex form of a public key.
    pub fn from_encoded_string(encoded: &str) -> Result<Self, CryptoMaterialError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CryptoMaterialError::HexError(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl PartialEq for Ed25519PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Ed25519PublicKey {}

impl PartialOrd for Ed25519PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ed25519PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Hash for Ed25519PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.0.as_bytes());
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({})", self.to_encoded_string())
    }
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_encoded_string())
    }
}

impl FromStr for Ed25519PublicKey {
    type Err = CryptoMaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_encoded_string(s)
    }
}

impl Ed25519Signature {
    /// Serialize an Ed25519Signature.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Deserialize an Ed25519Signature, only checking the size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoMaterialError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoMaterialError::WrongLengthError {
                expected: SIGNATURE_LENGTH,
                found: bytes.len(),
            });
        }
        ed25519_dalek::Signature::try_from(bytes)
            .map(Ed25519Signature)
            .map_err(|_| CryptoMaterialError::DeserializationError)
    }

    /// Verifies the signature of `message` under `public_key`.
    pub fn verify(
        &self,
        message: &[u8],
        public_key: &Ed25519PublicKey,
    ) -> Result<(), CryptoMaterialError> {
        public_key
            .0
            .verify_strict(message, &self.0)
            .map_err(|_| CryptoMaterialError::SignatureVerification)
    }
}

impl PartialEq for Ed25519Signature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes()[..] == other.to_bytes()[..]
    }
}

impl Eq for Ed25519Signature {}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature({})", hex::encode(&self.to_bytes()[..]))
    }
}

macro_rules! serde_bytes_key {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let bytes = self.to_bytes();
                if serializer.is_human_readable() {
                    serializer.serialize_str(&hex::encode(&bytes[..]))
                } else {
                    serializer.serialize_bytes(&bytes[..])
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let bytes = if deserializer.is_human_readable() {
                    let encoded = String::deserialize(deserializer)?;
                    hex::decode(encoded).map_err(de::Error::custom)?
                } else {
                    Vec::<u8>::deserialize(deserializer)?
                };
                $name::from_bytes(&bytes).map_err(de::Error::custom)
            }
        }
    };
}

serde_bytes_key!(Ed25519PublicKey);
serde_bytes_key!(Ed25519Signature);
