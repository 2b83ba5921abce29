// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    certificate::{CertRole, Certificate, CertificateChain},
    error::Error,
    legal_name::LegalName,
};
use netboot_crypto::Ed25519PublicKey;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// A well known network participant: a legal name and the key that speaks for it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Party {
    pub name: LegalName,
    pub owning_key: Ed25519PublicKey,
}

impl Party {
    pub fn new(name: LegalName, owning_key: Ed25519PublicKey) -> Self {
        Self { name, owning_key }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A party together with the certificate chain that vouches for its identity key.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "CertificateChain", into = "CertificateChain")]
pub struct PartyAndCertificate {
    chain: CertificateChain,
}

impl PartyAndCertificate {
    pub fn new(chain: CertificateChain) -> Result<Self, Error> {
        match chain.leaf() {
            Some(leaf) if leaf.role() == CertRole::LegalIdentity => Ok(Self { chain }),
            Some(leaf) => Err(Error::CertificateVerification(format!(
                "identity certificate for {} has role {:?}",
                leaf.subject(),
                leaf.role()
            ))),
            None => Err(Error::CertificateVerification(
                "empty identity certificate chain".to_string(),
            )),
        }
    }

    fn leaf(&self) -> &Certificate {
        // Non-empty with a legal identity leaf by construction.
        &self.chain.certificates()[0]
    }

    pub fn party(&self) -> Party {
        Party::new(self.name().clone(), self.owning_key().clone())
    }

    pub fn name(&self) -> &LegalName {
        self.leaf().subject()
    }

    pub fn owning_key(&self) -> &Ed25519PublicKey {
        self.leaf().public_key()
    }

    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    pub fn verify(&self, trust_root: &Certificate) -> Result<(), Error> {
        if self.leaf().role() != CertRole::LegalIdentity {
            return Err(Error::CertificateVerification(format!(
                "{} is not a legal identity certificate",
                self.name()
            )));
        }
        self.chain.verify(trust_root)
    }
}

impl TryFrom<CertificateChain> for PartyAndCertificate {
    type Error = Error;

    fn try_from(chain: CertificateChain) -> Result<Self, Error> {
        Self::new(chain)
    }
}

impl From<PartyAndCertificate> for CertificateChain {
    fn from(identity: PartyAndCertificate) -> Self {
        identity.chain
    }
}
