// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! The parts of a node's `node.conf` the bootstrapper needs.

use crate::error::Error;
use netboot_config::{ConfigSource, Configuration, Property, PropertyType, Specification};
use netboot_types::LegalName;
use std::{path::Path, sync::Arc};

pub const MY_LEGAL_NAME: Property<String> = Property::new("my_legal_name");
pub const NOTARY_VALIDATING: Property<bool> = Property::new("notary.validating");
pub const P2P_ADDRESS: Property<String> = Property::new("p2p_address");
pub const PLATFORM_VERSION: Property<u32> = Property::new("platform_version");
pub const DEV_MODE: Property<bool> = Property::new("dev_mode");

pub const DEFAULT_PLATFORM_VERSION: i64 = 4;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NotaryConfig {
    pub validating: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeConfig {
    pub legal_name: LegalName,
    pub notary: Option<NotaryConfig>,
    pub p2p_address: Option<String>,
    pub platform_version: u32,
    pub dev_mode: bool,
}

/// Node configurations carry many settings irrelevant here, so undeclared keys are
/// ignored.
pub fn node_config_spec() -> Result<Arc<Specification>, Error> {
    let notary = Specification::builder("notary")
        .required(
            "validating",
            PropertyType::Bool,
            "whether the notary validates transactions",
        )
        .build()?;
    Ok(Specification::builder("node")
        .required(
            "my_legal_name",
            PropertyType::String,
            "X.500 name of the node, e.g. O=Bank A,L=London,C=GB",
        )
        .nested("notary", notary, false, "present when the node runs a notary")
        .optional("p2p_address", PropertyType::String, "advertised host:port")
        .with_default(
            "platform_version",
            PropertyType::Int,
            DEFAULT_PLATFORM_VERSION,
            "platform version the node runs",
        )
        .with_default("dev_mode", PropertyType::Bool, true, "development mode")
        .build()?)
}

impl NodeConfig {
    /// Reads `path`, with `overlay` layered on top when given.
    pub fn load(path: &Path, overlay: Option<ConfigSource>) -> Result<NodeConfig, Error> {
        let spec = node_config_spec()?;
        let mut builder = Configuration::builder().from(ConfigSource::file(path));
        if let Some(overlay) = overlay {
            builder = builder.from(overlay);
        }
        let configuration = builder.build(&spec)?;
        Self::from_configuration(path, &configuration)
    }

    fn from_configuration(path: &Path, configuration: &Configuration) -> Result<NodeConfig, Error> {
        let invalid = |reason: String| Error::InvalidNodeConfig {
            path: path.to_path_buf(),
            reason,
        };

        let legal_name = configuration
            .get(&MY_LEGAL_NAME)?
            .parse::<LegalName>()
            .map_err(|e| invalid(e.to_string()))?;
        let notary = configuration
            .get_optional(&NOTARY_VALIDATING)?
            .map(|validating| NotaryConfig { validating });
        let platform_version = configuration
            .get(&PLATFORM_VERSION)
            .map_err(|_| invalid("platform_version does not fit in 32 bits".into()))?;
        if platform_version == 0 {
            return Err(invalid("platform_version must be at least 1".into()));
        }

        Ok(NodeConfig {
            legal_name,
            notary,
            p2p_address: configuration.get_optional(&P2P_ADDRESS)?,
            platform_version,
            dev_mode: configuration.get(&DEV_MODE)?,
        })
    }
}
