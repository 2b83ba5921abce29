// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while parsing or checking key, signature and hash material.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error type for key and signature validation issues.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum CryptoMaterialError {
    /// Struct to be signed does not serialize correctly.
    #[error("Struct to be signed does not serialize correctly")]
    SerializationError,
    /// Key or signature material does not deserialize correctly.
    #[error("Key or signature material does not deserialize correctly")]
    DeserializationError,
    /// Key or signature material has the wrong length.
    #[error("Wrong length: expected {expected}, found {found}")]
    WrongLengthError {
        /// Expected number of bytes.
        expected: usize,
        /// Number of bytes provided.
        found: usize,
    },
    /// Text form of a key or hash is not valid hex.
    #[error("Invalid hex encoding: {0}")]
    HexError(String),
    /// A signature does not verify under the given public key.
    #[error("Signature does not verify")]
    SignatureVerification,
}
