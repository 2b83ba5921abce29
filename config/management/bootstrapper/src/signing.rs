// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The certificate authorities a bootstrapped network trusts.

use crate::error::Error;
use netboot_crypto::{Ed25519PrivateKey, Ed25519PublicKey};
use netboot_types::{
    CertRole, Certificate, CertificateAuthority, LegalName, NetworkParameters, NodeInfo,
    PartyAndCertificate, SignedNetworkParameters, SignedNodeInfo,
};
use std::path::Path;

const DEV_ROOT_SEED: [u8; 32] = [0x11; 32];
const DEV_INTERMEDIATE_SEED: [u8; 32] = [0x22; 32];
const DEV_NETWORK_MAP_SEED: [u8; 32] = [0x33; 32];

/// Keys for the three authorities of a network.
#[derive(Debug)]
pub struct AuthorityKeys {
    pub root: Ed25519PrivateKey,
    pub intermediate: Ed25519PrivateKey,
    pub network_map: Ed25519PrivateKey,
}

/// Root of trust, the intermediate CA that certifies node identities and the network map
/// authority that signs network parameters.
#[derive(Debug)]
pub struct SigningAuthority {
    root: CertificateAuthority,
    intermediate: CertificateAuthority,
    network_map: CertificateAuthority,
}

fn issuing(what: &str) -> impl FnOnce(netboot_types::Error) -> Error + '_ {
    move |e| Error::Certificate(what.to_string(), e)
}

fn authority_name(organisation: &str) -> Result<LegalName, Error> {
    LegalName::new(organisation, "London", "GB").map_err(issuing(organisation))
}

impl SigningAuthority {
    pub fn new(keys: AuthorityKeys) -> Result<Self, Error> {
        let root = CertificateAuthority::root(authority_name("Netboot Root CA")?, keys.root)
            .map_err(issuing("root certificate"))?;
        let intermediate = root
            .issue_authority(
                authority_name("Netboot Intermediate CA")?,
                CertRole::IntermediateCa,
                keys.intermediate,
            )
            .map_err(issuing("intermediate certificate"))?;
        let network_map = intermediate
            .issue_authority(
                authority_name("Netboot Network Map")?,
                CertRole::NetworkMap,
                keys.network_map,
            )
            .map_err(issuing("network map certificate"))?;
        Ok(Self {
            root,
            intermediate,
            network_map,
        })
    }

    /// The development authority. Every run derives the same certificates, so networks
    /// bootstrapped separately trust each other.
    pub fn dev() -> Result<Self, Error> {
        Self::new(AuthorityKeys {
            root: Ed25519PrivateKey::from_seed(DEV_ROOT_SEED),
            intermediate: Ed25519PrivateKey::from_seed(DEV_INTERMEDIATE_SEED),
            network_map: Ed25519PrivateKey::from_seed(DEV_NETWORK_MAP_SEED),
        })
    }

    pub fn trust_root(&self) -> &Certificate {
        self.root.certificate()
    }

    /// Certifies `public_key` as the legal identity `name`.
    pub fn issue_identity(
        &self,
        name: &LegalName,
        public_key: Ed25519PublicKey,
    ) -> Result<PartyAndCertificate, Error> {
        let certificate = self
            .intermediate
            .issue(name.clone(), CertRole::LegalIdentity, public_key)
            .map_err(|e| Error::Certificate(format!("identity certificate for {}", name), e))?;
        PartyAndCertificate::new(self.intermediate.chain_for(&certificate))
            .map_err(|e| Error::Certificate(format!("identity certificate for {}", name), e))
    }

    pub fn sign_network_parameters(
        &self,
        parameters: &NetworkParameters,
    ) -> Result<SignedNetworkParameters, Error> {
        SignedNetworkParameters::sign(parameters, &self.network_map)
            .map_err(issuing("network parameters"))
    }

    pub fn verify_network_parameters(
        &self,
        signed: &SignedNetworkParameters,
        path: &Path,
    ) -> Result<NetworkParameters, Error> {
        signed
            .verified(self.trust_root(), CertRole::NetworkMap)
            .map_err(|e| Error::SignatureVerification {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    pub fn verify_node_info(&self, signed: &SignedNodeInfo, path: &Path) -> Result<NodeInfo, Error> {
        signed
            .verified(self.trust_root())
            .map_err(|e| Error::SignatureVerification {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
