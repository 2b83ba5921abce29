// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    certificate::Certificate,
    error::Error,
    legal_name::LegalName,
    party::{Party, PartyAndCertificate},
};
use netboot_crypto::{Ed25519PrivateKey, Ed25519Signature, HashValue};
use serde::{Deserialize, Serialize};

/// File name prefix of a signed node info; the rest of the name is the content hash.
pub const NODE_INFO_FILE_PREFIX: &str = "nodeInfo-";

/// Published identity record of a node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeInfo {
    pub addresses: Vec<String>,
    pub legal_identities_and_certs: Vec<PartyAndCertificate>,
    pub platform_version: u32,
    pub serial: u64,
}

impl NodeInfo {
    /// The node's main identity, the first of its legal identities.
    pub fn legal_identity(&self) -> Option<Party> {
        self.legal_identities_and_certs
            .first()
            .map(PartyAndCertificate::party)
    }

    pub fn legal_name(&self) -> Option<&LegalName> {
        self.legal_identities_and_certs
            .first()
            .map(PartyAndCertificate::name)
    }

    /// Whether `other` only differs from this node info by its serial.
    pub fn same_content_as(&self, other: &NodeInfo) -> bool {
        self.addresses == other.addresses
            && self.legal_identities_and_certs == other.legal_identities_and_certs
            && self.platform_version == other.platform_version
    }

    /// Signs with one key per legal identity, in the same order.
    pub fn sign(&self, keys: &[&Ed25519PrivateKey]) -> Result<SignedNodeInfo, Error> {
        if keys.len() != self.legal_identities_and_certs.len() {
            return Err(Error::SignatureVerification(format!(
                "node info has {} identities but {} signing keys were given",
                self.legal_identities_and_certs.len(),
                keys.len()
            )));
        }
        for (identity, key) in self.legal_identities_and_certs.iter().zip(keys) {
            if &key.public_key() != identity.owning_key() {
                return Err(Error::SignatureVerification(format!(
                    "signing key does not match the identity key of {}",
                    identity.name()
                )));
            }
        }
        let raw = bcs::to_bytes(self).map_err(|e| Error::BCS("node info", e))?;
        let signatures = keys.iter().map(|key| key.sign(&raw)).collect();
        Ok(SignedNodeInfo { raw, signatures })
    }
}

/// A node info signed by each of its legal identity keys.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SignedNodeInfo {
    raw: Vec<u8>,
    signatures: Vec<Ed25519Signature>,
}

impl SignedNodeInfo {
    /// Verifies each identity certificate chain against `trust_root` and each signature
    /// against the matching identity key.
    pub fn verified(&self, trust_root: &Certificate) -> Result<NodeInfo, Error> {
        let node_info: NodeInfo =
            bcs::from_bytes(&self.raw).map_err(|e| Error::BCS("node info", e))?;
        let name = node_info
            .legal_name()
            .map(ToString::to_string)
            .ok_or_else(|| {
                Error::SignatureVerification("node info without legal identities".to_string())
            })?;
        if node_info.legal_identities_and_certs.len() != self.signatures.len() {
            return Err(Error::SignatureVerification(format!(
                "{}: expected {} signatures, found {}",
                name,
                node_info.legal_identities_and_certs.len(),
                self.signatures.len()
            )));
        }
        for (identity, signature) in node_info
            .legal_identities_and_certs
            .iter()
            .zip(&self.signatures)
        {
            identity.verify(trust_root)?;
            signature
                .verify(&self.raw, identity.owning_key())
                .map_err(|_| Error::SignatureVerification(identity.name().to_string()))?;
        }
        Ok(node_info)
    }

    /// Content hash of the signed node info.
    pub fn hash(&self) -> HashValue {
        HashValue::sha256_of(&self.raw)
    }

    /// `nodeInfo-<hash>`, the name under which the record is distributed.
    pub fn file_name(&self) -> String {
        format!("{}{}", NODE_INFO_FILE_PREFIX, self.hash())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bcs::to_bytes(self).map_err(|e| Error::BCS("signed node info", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bcs::from_bytes(bytes).map_err(|e| Error::BCS("signed node info", e))
    }
}
