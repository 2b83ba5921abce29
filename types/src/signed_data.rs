// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    certificate::{CertRole, Certificate, CertificateAuthority, CertificateChain},
    error::Error,
    network_parameters::NetworkParameters,
};
use netboot_crypto::Ed25519Signature;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;

/// A signature together with the certificate chain of the key that produced it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DigitalSignatureWithCert {
    pub by: CertificateChain,
    pub signature: Ed25519Signature,
}

/// A BCS-serialized payload of type `T` signed by a certified key. The payload is only
/// handed out after the signature and the chain have been verified against a root of
/// trust.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SignedDataWithCert<T> {
    raw: Vec<u8>,
    sig: DigitalSignatureWithCert,
    #[serde(skip)]
    _payload: PhantomData<T>,
}

pub type SignedNetworkParameters = SignedDataWithCert<NetworkParameters>;

impl<T: Serialize + DeserializeOwned> SignedDataWithCert<T> {
    pub fn sign(payload: &T, authority: &CertificateAuthority) -> Result<Self, Error> {
        let raw = bcs::to_bytes(payload).map_err(|e| Error::BCS("signed payload", e))?;
        let signature = authority.sign(&raw);
        Ok(Self {
            raw,
            sig: DigitalSignatureWithCert {
                by: authority.chain().clone(),
                signature,
            },
            _payload: PhantomData,
        })
    }

    /// Verifies the chain against `trust_root`, checks that the signing certificate has
    /// `expected_role`, then checks the signature and deserializes the payload.
    pub fn verified(&self, trust_root: &Certificate, expected_role: CertRole) -> Result<T, Error> {
        self.sig.by.verify(trust_root)?;
        let signer = self.signer().ok_or_else(|| {
            Error::CertificateVerification("signature carries no certificate".to_string())
        })?;
        if signer.role() != expected_role {
            return Err(Error::CertificateVerification(format!(
                "{} signed with role {:?}, expected {:?}",
                signer.subject(),
                signer.role(),
                expected_role
            )));
        }
        self.sig
            .signature
            .verify(&self.raw, signer.public_key())
            .map_err(|_| Error::SignatureVerification(signer.subject().to_string()))?;
        bcs::from_bytes(&self.raw).map_err(|e| Error::BCS("signed payload", e))
    }

    pub fn signer(&self) -> Option<&Certificate> {
        self.sig.by.leaf()
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bcs::to_bytes(self).map_err(|e| Error::BCS("signed data", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bcs::from_bytes(bytes).map_err(|e| Error::BCS("signed data", e))
    }
}
