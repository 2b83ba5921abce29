// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! A minimal certificate hierarchy used to establish trust in signed network artifacts.
//!
//! Every certificate binds a subject name and public key to a role and is signed by its
//! issuer. A [`CertificateChain`] lists certificates leaf first, ending with the
//! certificate issued directly by the root of trust; the root itself is never part of a
//! chain and is supplied separately by whoever verifies.

use crate::{error::Error, legal_name::LegalName};
use netboot_crypto::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CertRole {
    RootCa,
    IntermediateCa,
    NetworkMap,
    LegalIdentity,
}

impl CertRole {
    /// Whether a certificate with this role may sign other certificates.
    pub fn is_authority(self) -> bool {
        matches!(self, CertRole::RootCa | CertRole::IntermediateCa)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct CertificateBody {
    subject: LegalName,
    issuer: LegalName,
    role: CertRole,
    public_key: Ed25519PublicKey,
}

impl CertificateBody {
    fn signing_bytes(&self) -> Result<Vec<u8>, Error> {
        bcs::to_bytes(self).map_err(|e| Error::BCS("certificate", e))
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Certificate {
    body: CertificateBody,
    signature: Ed25519Signature,
}

impl Certificate {
    /// Creates the self-signed certificate of a root of trust.
    pub fn self_signed(subject: LegalName, key: &Ed25519PrivateKey) -> Result<Self, Error> {
        let body = CertificateBody {
            issuer: subject.clone(),
            subject,
            role: CertRole::RootCa,
            public_key: key.public_key(),
        };
        let signature = key.sign(&body.signing_bytes()?);
        Ok(Self { body, signature })
    }

    pub fn subject(&self) -> &LegalName {
        &self.body.subject
    }

    pub fn issuer(&self) -> &LegalName {
        &self.body.issuer
    }

    pub fn role(&self) -> CertRole {
        self.body.role
    }

    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.body.public_key
    }

    /// Checks that `issuer` is an authority, is named as this certificate's issuer and
    /// produced its signature.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> Result<(), Error> {
        if !issuer.role().is_authority() {
            return Err(Error::CertificateVerification(format!(
                "{} ({:?}) is not allowed to issue certificates",
                issuer.subject(),
                issuer.role()
            )));
        }
        if self.issuer() != issuer.subject() {
            return Err(Error::CertificateVerification(format!(
                "certificate for {} names issuer {} but was presented with {}",
                self.subject(),
                self.issuer(),
                issuer.subject()
            )));
        }
        self.signature
            .verify(&self.body.signing_bytes()?, issuer.public_key())
            .map_err(|_| {
                Error::CertificateVerification(format!(
                    "certificate for {} was not signed by {}",
                    self.subject(),
                    issuer.subject()
                ))
            })
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CertificateChain(Vec<Certificate>);

impl CertificateChain {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self(certificates)
    }

    /// The end-entity certificate, absent only for an empty chain.
    pub fn leaf(&self) -> Option<&Certificate> {
        self.0.first()
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.0
    }

    /// Verifies every link of the chain, and that the last certificate was issued by
    /// `trust_root`.
    pub fn verify(&self, trust_root: &Certificate) -> Result<(), Error> {
        if trust_root.role() != CertRole::RootCa || trust_root.subject() != trust_root.issuer()
        {
            return Err(Error::CertificateVerification(format!(
                "{} is not a root of trust",
                trust_root.subject()
            )));
        }
        if self.0.is_empty() {
            return Err(Error::CertificateVerification(
                "empty certificate chain".to_string(),
            ));
        }
        for pair in self.0.windows(2) {
            pair[0].verify_issued_by(&pair[1])?;
        }
        match self.0.last() {
            Some(last) => last.verify_issued_by(trust_root),
            None => Ok(()),
        }
    }
}

/// A certificate together with the private key that may sign with it.
#[derive(Debug)]
pub struct CertificateAuthority {
    certificate: Certificate,
    chain: CertificateChain,
    key: Ed25519PrivateKey,
}

impl CertificateAuthority {
    /// The root of trust: a self-signed authority whose chain is empty.
    pub fn root(subject: LegalName, key: Ed25519PrivateKey) -> Result<Self, Error> {
        Ok(Self {
            certificate: Certificate::self_signed(subject, &key)?,
            chain: CertificateChain::new(vec![]),
            key,
        })
    }

    /// Issues a certificate for `public_key` signed by this authority.
    pub fn issue(
        &self,
        subject: LegalName,
        role: CertRole,
        public_key: Ed25519PublicKey,
    ) -> Result<Certificate, Error> {
        if !self.certificate.role().is_authority() {
            return Err(Error::CertificateVerification(format!(
                "{} ({:?}) cannot issue a certificate for {}",
                self.certificate.subject(),
                self.certificate.role(),
                subject
            )));
        }
        let body = CertificateBody {
            subject,
            issuer: self.certificate.subject().clone(),
            role,
            public_key,
        };
        let signature = self.key.sign(&body.signing_bytes()?);
        Ok(Certificate { body, signature })
    }

    /// Issues a certificate for `key` and returns the resulting signer.
    pub fn issue_authority(
        &self,
        subject: LegalName,
        role: CertRole,
        key: Ed25519PrivateKey,
    ) -> Result<CertificateAuthority, Error> {
        let certificate = self.issue(subject, role, key.public_key())?;
        Ok(CertificateAuthority {
            chain: self.chain_for(&certificate),
            certificate,
            key,
        })
    }

    /// The chain from `certificate`, which this authority issued, up to but excluding the
    /// root of trust.
    pub fn chain_for(&self, certificate: &Certificate) -> CertificateChain {
        let mut certificates = vec![certificate.clone()];
        if self.certificate.role() != CertRole::RootCa {
            certificates.push(self.certificate.clone());
            certificates.extend(self.chain.certificates().iter().skip(1).cloned());
        }
        CertificateChain::new(certificates)
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// This authority's own chain, leaf first, excluding the root of trust.
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.key.sign(message)
    }
}
