// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! Cryptographic primitives for the network bootstrapper: ed25519 identity keys and
//! signatures, and SHA-256 content hashes for artifacts and signed payloads.

pub mod ed25519;
pub mod error;
pub mod hash;

#[cfg(test)]
mod unit_tests;

pub use self::{
    ed25519::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature},
    error::CryptoMaterialError,
    hash::HashValue,
};
