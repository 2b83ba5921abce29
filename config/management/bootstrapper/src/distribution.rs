// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Writes the assembled network to disk.

use crate::{
    constants::ADDITIONAL_NODE_INFOS_DIR,
    error::{io_error, Error},
    identity::{identity_key_path, NodeIdentity},
    parameters::network_parameters_path,
    scanner::NodeUnit,
};
use netboot_types::SignedNodeInfo;
use slog::{debug, info, Logger};
use std::{
    fs::{self, Permissions},
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Replaces `path` with `bytes` through a temporary file in the same directory. A file
/// that already holds `bytes` is left alone. Returns whether anything was written.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<bool, Error> {
    write_atomic_from(path, bytes, None)
}

/// Same as [`write_atomic`]. The written file keeps the permissions of the file it
/// replaces, or else takes those of `source`.
pub fn write_atomic_from(path: &Path, bytes: &[u8], source: Option<&Path>) -> Result<bool, Error> {
    if path.is_file() && fs::read(path).map_err(io_error(path))? == bytes {
        return Ok(false);
    }
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory).map_err(io_error(directory))?;
    let permissions = match (path.is_file(), source) {
        (true, _) => Some(fs::metadata(path).map_err(io_error(path))?.permissions()),
        (false, Some(source)) => {
            Some(fs::metadata(source).map_err(io_error(source))?.permissions())
        }
        (false, None) => default_permissions(),
    };
    let mut file = NamedTempFile::new_in(directory).map_err(io_error(directory))?;
    file.write_all(bytes).map_err(io_error(path))?;
    if let Some(permissions) = permissions {
        file.as_file().set_permissions(permissions).map_err(io_error(path))?;
    }
    file.as_file().sync_all().map_err(io_error(path))?;
    file.persist(path).map_err(|e| Error::IO(path.display().to_string(), e.error))?;
    Ok(true)
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

/// Creates the working directory and installs the node configuration.
pub fn install_node_conf(unit: &NodeUnit, logger: &Logger) -> Result<(), Error> {
    fs::create_dir_all(&unit.directory).map_err(io_error(&unit.directory))?;
    if unit.copy_conf {
        let bytes = fs::read(&unit.conf_file).map_err(io_error(&unit.conf_file))?;
        if write_atomic_from(&unit.node_conf(), &bytes, Some(unit.conf_file.as_path()))? {
            info!(logger, "Installed node configuration"; "node" => &unit.name);
        }
    }
    Ok(())
}

/// Persists a generated identity key and the node's own signed node info, replacing
/// the stale ones.
pub fn publish_identity(directory: &Path, identity: &NodeIdentity, logger: &Logger) -> Result<(), Error> {
    if identity.key_generated {
        write_atomic(&identity_key_path(directory), identity.key.to_encoded_string().as_bytes())?;
    }
    for stale in &identity.stale_node_infos {
        fs::remove_file(stale).map_err(io_error(stale))?;
        debug!(logger, "Removed stale node info"; "path" => %stale.display());
    }
    write_node_info(directory, &identity.signed, logger)
}

fn write_node_info(directory: &Path, signed: &SignedNodeInfo, logger: &Logger) -> Result<(), Error> {
    let path = directory.join(signed.file_name());
    let bytes = signed
        .to_bytes()
        .map_err(|e| Error::Certificate(path.display().to_string(), e))?;
    if write_atomic(&path, &bytes)? {
        debug!(logger, "Wrote node info"; "path" => %path.display());
    }
    Ok(())
}

/// Copies every node info into every node's `additional-node-infos`. Copies from earlier
/// runs stay.
pub fn distribute_node_infos(
    directories: &[&Path],
    node_infos: &[&SignedNodeInfo],
    logger: &Logger,
) -> Result<(), Error> {
    for directory in directories {
        let target = directory.join(ADDITIONAL_NODE_INFOS_DIR);
        for signed in node_infos {
            write_node_info(&target, signed, logger)?;
        }
    }
    info!(
        logger,
        "Distributed node infos";
        "node_infos" => node_infos.len(),
        "nodes" => directories.len()
    );
    Ok(())
}

/// Removes distributed node infos of nodes that are no longer part of the network.
pub fn remove_departed_node_infos(paths: &[PathBuf], logger: &Logger) -> Result<(), Error> {
    for path in paths {
        fs::remove_file(path).map_err(io_error(path))?;
        info!(logger, "Removed node info of departed node"; "path" => %path.display());
    }
    Ok(())
}

pub fn write_network_parameters(
    directories: &[&Path],
    bytes: &[u8],
    logger: &Logger,
) -> Result<(), Error> {
    for directory in directories {
        let path = network_parameters_path(directory);
        if write_atomic(&path, bytes)? {
            debug!(logger, "Wrote network parameters"; "path" => %path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file");
        assert!(write_atomic(&path, b"one").unwrap());
        assert!(!write_atomic(&path, b"one").unwrap());
        assert!(write_atomic(&path, b"two").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        let dir = tempfile::tempdir().unwrap();

        let fresh = dir.path().join("fresh");
        write_atomic(&fresh, b"one").unwrap();
        assert_eq!(mode(&fresh), 0o644);

        let source = dir.path().join("source");
        fs::write(&source, b"conf").unwrap();
        fs::set_permissions(&source, Permissions::from_mode(0o640)).unwrap();
        let copy = dir.path().join("copy");
        write_atomic_from(&copy, b"conf", Some(&source)).unwrap();
        assert_eq!(mode(&copy), 0o640);

        fs::set_permissions(&copy, Permissions::from_mode(0o664)).unwrap();
        assert!(write_atomic_from(&copy, b"changed", Some(&source)).unwrap());
        assert_eq!(mode(&copy), 0o664);
    }
}
