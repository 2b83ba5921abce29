// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! File and directory names of the on-disk network layout.

pub const NODE_CONF: &str = "node.conf";
/// Suffix of node configurations kept directly under the root: `<name>_node.conf`.
pub const NODE_CONF_SUFFIX: &str = "_node.conf";
pub const RUNTIME_ARTIFACT: &str = "corda.jar";
pub const CORDAPP_EXTENSION: &str = "jar";
pub const CORDAPPS_DIR: &str = "cordapps";
/// Extension of the sidecar listing a CorDapp's contract classes: `<cordapp>.jar.contracts`.
pub const CONTRACTS_MANIFEST_EXTENSION: &str = "contracts";
pub const EXCLUDE_WHITELIST_FILE: &str = "exclude_whitelist.txt";
pub const NETWORK_PARAMETERS_FILE: &str = "network-parameters";
pub const ADDITIONAL_NODE_INFOS_DIR: &str = "additional-node-infos";
pub const CERTIFICATES_DIR: &str = "certificates";
pub const IDENTITY_KEY_FILE: &str = "identity.key";

/// Optional bootstrapper settings file under the root.
pub const BOOTSTRAPPER_CONF: &str = "bootstrapper.conf";
pub const DEFAULTS_RESOURCE: &str = "bootstrapper.defaults.toml";
/// Environment prefix of the bootstrapper's own settings.
pub const SETTINGS_ENV_PREFIX: &str = "NETBOOT";
/// Environment prefix of the overlay applied to every node configuration.
pub const NODE_ENV_PREFIX: &str = "NETBOOT_NODE";
