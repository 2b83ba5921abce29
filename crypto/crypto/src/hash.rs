// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content hashes.
//!
//! A [`HashValue`] is the SHA-256 digest of some byte content. It identifies CorDapp
//! artifacts in the contract whitelist and names the signed node identity files that are
//! distributed between node directories.

use crate::CryptoMaterialError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{convert::TryFrom, fmt, io, str::FromStr};

/// Output value of the content hash function.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HashValue {
    hash: [u8; HashValue::LENGTH],
}

impl HashValue {
    /// The length of the hash in bytes.
    pub const LENGTH: usize = 32;

    /// Create a new [`HashValue`] from a byte array.
    pub fn new(hash: [u8; HashValue::LENGTH]) -> Self {
        HashValue { hash }
    }

    /// Create from a slice (e.g. retrieved from storage).
    pub fn from_slice(src: &[u8]) -> Result<Self, CryptoMaterialError> {
        <[u8; HashValue::LENGTH]>::try_from(src)
            .map(Self::new)
            .map_err(|_| CryptoMaterialError::WrongLengthError {
                expected: HashValue::LENGTH,
                found: src.len(),
            })
    }

    /// Hashes the given content.
    pub fn sha256_of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self::from_digest(hasher)
    }

    /// Hashes everything readable from `reader` without buffering it whole.
    pub fn sha256_of_reader<R: io::Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(Self::from_digest(hasher))
    }

    fn from_digest(hasher: Sha256) -> Self {
        let mut hash = [0u8; HashValue::LENGTH];
        hash.copy_from_slice(hasher.finalize().as_slice());
        Self::new(hash)
    }

    /// Dumps into a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    /// Full upper-case hex representation, the form used in file names.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.hash)
    }

    /// Parse a given hex string (either case) to a hash value.
    pub fn from_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, CryptoMaterialError> {
        let bytes =
            hex::decode(hex).map_err(|e| CryptoMaterialError::HexError(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        &self.hash
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue({})", self.to_hex())
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for HashValue {
    type Err = CryptoMaterialError;

    fn from_str(s: &str) -> Result<Self, CryptoMaterialError> {
        HashValue::from_hex(s)
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.hash)
        }
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            HashValue::from_hex(encoded).map_err(de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            HashValue::from_slice(&bytes).map_err(de::Error::custom)
        }
    }
}
