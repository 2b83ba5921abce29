// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::constants::{NODE_CONF, RUNTIME_ARTIFACT};
use netboot_config::ConfigError;
use netboot_types::LegalName;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No nodes found in {}", .0.display())]
    NoNodesFound(PathBuf),
    #[error("{} contains {} but no {}", .0.display(), RUNTIME_ARTIFACT, NODE_CONF)]
    MissingNodeConf(PathBuf),
    #[error("Nodes must have unique legal names: {}", describe_duplicates(.0))]
    DuplicateLegalNames(Vec<(LegalName, Vec<String>)>),
    #[error("Artifact problem with {subject}: {reason}")]
    ArtifactConsistency { subject: String, reason: String },
    #[error("Package ownership claims overlap: {first} and {second}")]
    PackageOwnership { first: String, second: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid node configuration {}: {reason}", .path.display())]
    InvalidNodeConfig { path: PathBuf, reason: String },
    #[error("Invalid bootstrapper settings: {0}")]
    InvalidSettings(String),
    #[error("Signature verification failed for {}: {reason}", .path.display())]
    SignatureVerification { path: PathBuf, reason: String },
    #[error("Node directories disagree on network parameters: {}", .0.join(", "))]
    InconsistentNetworkParameters(Vec<String>),
    #[error("Invalid network parameters: {0}")]
    InvalidNetworkParameters(String),
    #[error("Error issuing {0}: {1}")]
    Certificate(String, #[source] netboot_types::Error),
    #[error("Error accessing {0}: {1}")]
    IO(String, #[source] std::io::Error),
    #[error("Error (de)serializing {0}: {1}")]
    BCS(&'static str, #[source] bcs::Error),
}

fn describe_duplicates(duplicates: &[(LegalName, Vec<String>)]) -> String {
    duplicates
        .iter()
        .map(|(name, nodes)| format!("{} is used by {}", name, nodes.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn io_error(context: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let context = context.into();
    move |e| Error::IO(context.display().to_string(), e)
}
