// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Discovery of the nodes under a root directory.
//!
//! A node is either a `<name>_node.conf` file directly under the root, whose working
//! directory `<root>/<name>` is created when the network is written, or a subdirectory
//! holding a `node.conf`. A conf file and a directory with the same name are the same
//! node, and the conf file wins.

use crate::{
    constants::{NODE_CONF, NODE_CONF_SUFFIX, RUNTIME_ARTIFACT},
    error::{io_error, Error},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeUnit {
    /// Name of the working directory, unique under the root.
    pub name: String,
    pub directory: PathBuf,
    /// The configuration to read.
    pub conf_file: PathBuf,
    /// Set when `conf_file` lives under the root and must be copied into `directory`.
    pub copy_conf: bool,
}

impl NodeUnit {
    pub fn node_conf(&self) -> PathBuf {
        self.directory.join(NODE_CONF)
    }
}

/// Lists the nodes under `root` ordered by directory name. Nothing is written.
pub fn scan(root: &Path) -> Result<Vec<NodeUnit>, Error> {
    let mut units = BTreeMap::new();
    let mut directories = vec![];

    let entries = fs::read_dir(root).map_err(io_error(root))?;
    for entry in entries {
        let entry = entry.map_err(io_error(root))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;
        let file_name = match entry.file_name().into_string() {
            Ok(file_name) => file_name,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            directories.push((file_name, path));
        } else if let Some(name) = file_name.strip_suffix(NODE_CONF_SUFFIX) {
            if name.is_empty() {
                continue;
            }
            units.insert(
                name.to_string(),
                NodeUnit {
                    name: name.to_string(),
                    directory: root.join(name),
                    conf_file: path,
                    copy_conf: true,
                },
            );
        }
    }

    for (name, directory) in directories {
        if units.contains_key(&name) {
            continue;
        }
        let conf_file = directory.join(NODE_CONF);
        if conf_file.is_file() {
            units.insert(
                name.clone(),
                NodeUnit {
                    name,
                    directory,
                    conf_file,
                    copy_conf: false,
                },
            );
        } else if directory.join(RUNTIME_ARTIFACT).exists() {
            return Err(Error::MissingNodeConf(directory));
        }
    }

    if units.is_empty() {
        return Err(Error::NoNodesFound(root.to_path_buf()));
    }
    Ok(units.into_iter().map(|(_, unit)| unit).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_layouts() {
        let root = tempfile::tempdir().unwrap();
        let root = root.path();
        fs::write(root.join("bankb_node.conf"), "").unwrap();
        fs::write(root.join("notary_node.conf"), "").unwrap();
        fs::create_dir(root.join("banka")).unwrap();
        fs::write(root.join("banka").join(NODE_CONF), "").unwrap();
        fs::create_dir(root.join("notary")).unwrap();
        fs::write(root.join("notary").join(NODE_CONF), "stale").unwrap();
        fs::create_dir(root.join("empty")).unwrap();
        fs::write(root.join("other.conf"), "").unwrap();

        let units = scan(root).unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["banka", "bankb", "notary"]);
        assert!(!units[0].copy_conf);
        assert_eq!(units[0].conf_file, root.join("banka").join(NODE_CONF));
        assert!(units[1].copy_conf);
        assert_eq!(units[1].directory, root.join("bankb"));
        assert_eq!(units[2].conf_file, root.join("notary_node.conf"));
        assert!(!root.join("bankb").exists());
    }

    #[test]
    fn test_empty_root() {
        let root = tempfile::tempdir().unwrap();
        let error = scan(root.path()).unwrap_err();
        assert!(error.to_string().starts_with("No nodes found"));
    }

    #[test]
    fn test_artifact_without_conf() {
        let root = tempfile::tempdir().unwrap();
        let node = root.path().join("lonely");
        fs::create_dir(&node).unwrap();
        fs::write(node.join(RUNTIME_ARTIFACT), b"jar").unwrap();
        fs::write(root.path().join("banka_node.conf"), "").unwrap();
        match scan(root.path()) {
            Err(Error::MissingNodeConf(path)) => assert_eq!(path, node),
            other => panic!("unexpected {:?}", other),
        }
    }
}
