// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Node identity keys and signed node infos.

use crate::{
    constants::{ADDITIONAL_NODE_INFOS_DIR, CERTIFICATES_DIR, IDENTITY_KEY_FILE},
    error::{io_error, Error},
    node_config::NodeConfig,
    signing::SigningAuthority,
};
use netboot_crypto::Ed25519PrivateKey;
use netboot_types::{node_info::NODE_INFO_FILE_PREFIX, NodeInfo, SignedNodeInfo};
use rand::{CryptoRng, RngCore};
use slog::{debug, info, Logger};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn identity_key_path(directory: &Path) -> PathBuf {
    directory.join(CERTIFICATES_DIR).join(IDENTITY_KEY_FILE)
}

/// Reads the node's identity key, or generates one when there is none yet. A generated
/// key is only returned, never written.
pub fn load_or_generate_key<R: RngCore + CryptoRng>(
    directory: &Path,
    rng: &mut R,
) -> Result<(Ed25519PrivateKey, bool), Error> {
    let path = identity_key_path(directory);
    if !path.exists() {
        return Ok((Ed25519PrivateKey::generate(rng), true));
    }
    let encoded = fs::read_to_string(&path).map_err(io_error(&path))?;
    let key = Ed25519PrivateKey::from_encoded_string(&encoded).map_err(|e| {
        Error::InvalidNodeConfig {
            path: path.clone(),
            reason: format!("unreadable identity key: {}", e),
        }
    })?;
    Ok((key, false))
}

/// A signed node info read back from disk.
#[derive(Clone, Debug)]
pub struct StoredNodeInfo {
    pub path: PathBuf,
    pub signed: SignedNodeInfo,
    pub node_info: NodeInfo,
}

fn is_node_info_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with(NODE_INFO_FILE_PREFIX))
}

/// Reads and verifies every `nodeInfo-*` file directly under `directory`.
pub fn read_node_infos(
    directory: &Path,
    authority: &SigningAuthority,
) -> Result<Vec<StoredNodeInfo>, Error> {
    if !directory.is_dir() {
        return Ok(vec![]);
    }
    let mut paths = vec![];
    for entry in fs::read_dir(directory).map_err(io_error(directory))? {
        let path = entry.map_err(io_error(directory))?.path();
        if is_node_info_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut node_infos = vec![];
    for path in paths {
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let signed =
            SignedNodeInfo::from_bytes(&bytes).map_err(|e| Error::SignatureVerification {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let node_info = authority.verify_node_info(&signed, &path)?;
        node_infos.push(StoredNodeInfo {
            path,
            signed,
            node_info,
        });
    }
    Ok(node_infos)
}

/// Node infos previously distributed to `directory`.
pub fn read_distributed_node_infos(
    directory: &Path,
    authority: &SigningAuthority,
) -> Result<Vec<StoredNodeInfo>, Error> {
    read_node_infos(&directory.join(ADDITIONAL_NODE_INFOS_DIR), authority)
}

/// Everything a node's identity needs written, prepared without touching the disk.
#[derive(Debug)]
pub struct NodeIdentity {
    pub key: Ed25519PrivateKey,
    pub key_generated: bool,
    pub node_info: NodeInfo,
    pub signed: SignedNodeInfo,
    /// The node's own node info files that the new one replaces.
    pub stale_node_infos: Vec<PathBuf>,
}

impl NodeIdentity {
    pub fn prepare<R: RngCore + CryptoRng>(
        directory: &Path,
        config: &NodeConfig,
        authority: &SigningAuthority,
        rng: &mut R,
        logger: &Logger,
    ) -> Result<NodeIdentity, Error> {
        let (key, key_generated) = load_or_generate_key(directory, rng)?;
        if key_generated {
            info!(logger, "Generated identity key"; "node" => %config.legal_name);
        }
        let identity = authority.issue_identity(&config.legal_name, key.public_key())?;
        let previous = read_node_infos(directory, authority)?;

        let mut node_info = NodeInfo {
            addresses: config.p2p_address.iter().cloned().collect(),
            legal_identities_and_certs: vec![identity],
            platform_version: config.platform_version,
            serial: 1,
        };
        let own: Vec<&StoredNodeInfo> = previous
            .iter()
            .filter(|stored| stored.node_info.legal_name() == Some(&config.legal_name))
            .collect();
        if let Some(unchanged) = own
            .iter()
            .find(|stored| stored.node_info.same_content_as(&node_info))
        {
            node_info.serial = unchanged.node_info.serial;
            debug!(logger, "Node info unchanged"; "node" => %config.legal_name, "serial" => node_info.serial);
        } else if let Some(latest) = own.iter().map(|stored| stored.node_info.serial).max() {
            node_info.serial = latest + 1;
            info!(logger, "Node info changed"; "node" => %config.legal_name, "serial" => node_info.serial);
        }

        let signed = node_info.sign(&[&key]).map_err(|e| {
            Error::Certificate(format!("node info for {}", config.legal_name), e)
        })?;
        let file_name = signed.file_name();
        let stale_node_infos = previous
            .into_iter()
            .map(|stored| stored.path)
            .filter(|path| path.file_name().map_or(true, |name| name != file_name.as_str()))
            .collect();

        Ok(NodeIdentity {
            key,
            key_generated,
            node_info,
            signed,
            stale_node_infos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netboot_logger::test_logger;
    use rand::{rngs::StdRng, SeedableRng};

    fn config(p2p_address: &str) -> NodeConfig {
        NodeConfig {
            legal_name: "O=Bank A,L=London,C=GB".parse().unwrap(),
            notary: None,
            p2p_address: Some(p2p_address.to_string()),
            platform_version: 4,
            dev_mode: true,
        }
    }

    fn persist(directory: &Path, identity: &NodeIdentity) {
        let key_path = identity_key_path(directory);
        fs::create_dir_all(key_path.parent().unwrap()).unwrap();
        fs::write(&key_path, identity.key.to_encoded_string()).unwrap();
        for stale in &identity.stale_node_infos {
            fs::remove_file(stale).unwrap();
        }
        fs::write(
            directory.join(identity.signed.file_name()),
            identity.signed.to_bytes().unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_serial_follows_content() {
        let dir = tempfile::tempdir().unwrap();
        let authority = SigningAuthority::dev().unwrap();
        let mut rng = StdRng::from_seed([5; 32]);
        let logger = test_logger();

        let first = NodeIdentity::prepare(dir.path(), &config("a:1"), &authority, &mut rng, &logger)
            .unwrap();
        assert!(first.key_generated);
        assert_eq!(first.node_info.serial, 1);
        assert!(first.stale_node_infos.is_empty());
        persist(dir.path(), &first);

        let again = NodeIdentity::prepare(dir.path(), &config("a:1"), &authority, &mut rng, &logger)
            .unwrap();
        assert!(!again.key_generated);
        assert_eq!(again.node_info.serial, 1);
        assert_eq!(again.signed, first.signed);
        assert!(again.stale_node_infos.is_empty());

        let moved = NodeIdentity::prepare(dir.path(), &config("b:2"), &authority, &mut rng, &logger)
            .unwrap();
        assert_eq!(moved.node_info.serial, 2);
        assert_eq!(
            moved.stale_node_infos,
            vec![dir.path().join(first.signed.file_name())]
        );
    }

    #[test]
    fn test_tampered_node_info_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("nodeInfo-ABC"), b"garbage").unwrap();
        let authority = SigningAuthority::dev().unwrap();
        assert!(matches!(
            read_node_infos(dir.path(), &authority),
            Err(Error::SignatureVerification { .. })
        ));
    }

    #[test]
    fn test_corrupt_identity_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = identity_key_path(dir.path());
        fs::create_dir_all(key_path.parent().unwrap()).unwrap();
        fs::write(&key_path, "not hex").unwrap();
        let mut rng = StdRng::from_seed([0; 32]);
        assert!(load_or_generate_key(dir.path(), &mut rng).is_err());
    }
}
