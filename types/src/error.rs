// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid legal name {name:?}: {reason}")]
    InvalidLegalName { name: String, reason: String },
    #[error("Error (de)serializing {0}: {1}")]
    BCS(&'static str, #[source] bcs::Error),
    #[error("Certificate verification failed: {0}")]
    CertificateVerification(String),
    #[error("Signature verification failed for {0}")]
    SignatureVerification(String),
    #[error("Invalid network parameters: {0}")]
    InvalidNetworkParameters(String),
    #[error("Package ownership claims overlap: {0} and {1}")]
    PackageOverlap(String, String),
    #[error("Invalid package name: {0:?}")]
    InvalidPackageName(String),
}

pub fn invariant(cond: bool, msg: impl FnOnce() -> String) -> Result<(), Error> {
    if !cond {
        Err(Error::InvalidNetworkParameters(msg()))
    } else {
        Ok(())
    }
}
