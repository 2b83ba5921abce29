// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Settings of the bootstrapper itself, resolved through the layered configuration.
//!
//! Layers, later ones winning: the built-in defaults, `<root>/bootstrapper.conf`, the
//! file given with `--config`, `NETBOOT_*` environment variables, command line flags.

use crate::{
    artifacts::CopyCordapps,
    bootstrapper::BootstrapOptions,
    constants::{BOOTSTRAPPER_CONF, DEFAULTS_RESOURCE, SETTINGS_ENV_PREFIX},
    error::Error,
    parameters::NetworkParametersOverrides,
};
use netboot_config::{
    ConfigSource, Configuration, EmbeddedResources, Property, PropertyType, Specification, Value,
};
use netboot_crypto::Ed25519PublicKey;
use netboot_logger::{parse_level, LoggerConfig};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

const DEFAULTS: &[u8] = include_bytes!("../bootstrapper.defaults.toml");

pub const COPY_CORDAPPS: Property<String> = Property::new("copy_cordapps");
pub const NODE_ENVIRONMENT: Property<bool> = Property::new("node_environment");
pub const LOG_LEVEL: Property<String> = Property::new("logger.level");
pub const LOG_ASYNC: Property<bool> = Property::new("logger.is_async");
pub const LOG_CHAN_SIZE: Property<usize> = Property::new("logger.chan_size");
pub const MINIMUM_PLATFORM_VERSION: Property<u32> =
    Property::new("network_parameters.minimum_platform_version");
pub const MAX_MESSAGE_SIZE: Property<u32> = Property::new("network_parameters.max_message_size");
pub const MAX_TRANSACTION_SIZE: Property<u32> =
    Property::new("network_parameters.max_transaction_size");
pub const EVENT_HORIZON: Property<Duration> = Property::new("network_parameters.event_horizon");
pub const PACKAGE_OWNERSHIP: Property<Vec<Configuration>> =
    Property::new("network_parameters.package_ownership");
pub const UNREGISTER_PACKAGES: Property<Vec<String>> =
    Property::new("network_parameters.unregister_packages");

const PACKAGE_NAME: Property<String> = Property::new("package_name");
const PUBLIC_KEY: Property<String> = Property::new("public_key");

const LOG_LEVELS: [&str; 7] = ["critical", "error", "warning", "warn", "info", "debug", "trace"];

pub fn settings_spec() -> Result<Arc<Specification>, Error> {
    let logger = Specification::builder("logger")
        .with_default(
            "level",
            PropertyType::enumeration(LOG_LEVELS.iter().copied()),
            "info",
            "minimum level of emitted records",
        )
        .with_default("is_async", PropertyType::Bool, false, "log from a background thread")
        .with_default("chan_size", PropertyType::Int, 256i64, "queue size of the async logger")
        .build()?;
    let package_owner = Specification::builder("package_owner")
        .required("package_name", PropertyType::String, "dotted package namespace")
        .required("public_key", PropertyType::String, "hex ed25519 key of the owner")
        .build()?;
    let network_parameters = Specification::builder("network_parameters")
        .optional("minimum_platform_version", PropertyType::Int, "")
        .optional("max_message_size", PropertyType::Int, "bytes")
        .optional("max_transaction_size", PropertyType::Int, "bytes")
        .optional("event_horizon", PropertyType::Duration, "")
        .optional(
            "package_ownership",
            PropertyType::list(PropertyType::Object(package_owner)),
            "packages to register",
        )
        .with_default(
            "unregister_packages",
            PropertyType::list(PropertyType::String),
            Value::List(vec![]),
            "packages to unregister",
        )
        .build()?;
    Ok(Specification::builder("bootstrapper")
        .with_default(
            "copy_cordapps",
            PropertyType::enumeration(CopyCordapps::VARIANTS.iter().copied()),
            "first_run_only",
            "when staged CorDapps are copied into node directories",
        )
        .with_default(
            "node_environment",
            PropertyType::Bool,
            false,
            "overlay NETBOOT_NODE_* variables on every node configuration",
        )
        .nested_with_defaults("logger", logger, "logging")
        .nested_with_defaults(
            "network_parameters",
            network_parameters,
            "changes to the network parameters",
        )
        .build()?)
}

/// The standard layers for a run against `root`.
pub fn settings_sources(
    root: &Path,
    config_file: Option<&Path>,
    properties: BTreeMap<String, String>,
) -> Vec<ConfigSource> {
    let defaults = EmbeddedResources::new().with(DEFAULTS_RESOURCE, DEFAULTS);
    let mut sources = vec![
        ConfigSource::resource(DEFAULTS_RESOURCE, Arc::new(defaults)),
        ConfigSource::optional_file(root.join(BOOTSTRAPPER_CONF)),
    ];
    if let Some(config_file) = config_file {
        sources.push(ConfigSource::file(config_file));
    }
    sources.push(ConfigSource::environment(SETTINGS_ENV_PREFIX));
    sources.push(ConfigSource::properties(None, properties));
    sources
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub options: BootstrapOptions,
    pub logger: LoggerConfig,
    pub resolved: Configuration,
}

impl Settings {
    pub fn load(
        root: &Path,
        config_file: Option<PathBuf>,
        properties: BTreeMap<String, String>,
    ) -> Result<Settings, Error> {
        Self::from_sources(settings_sources(root, config_file.as_deref(), properties))
    }

    pub fn from_sources(sources: Vec<ConfigSource>) -> Result<Settings, Error> {
        let spec = settings_spec()?;
        let mut builder = Configuration::builder();
        for source in sources {
            builder = builder.from(source);
        }
        let configuration = builder.build(&spec)?;
        Self::from_configuration(configuration)
    }

    fn from_configuration(configuration: Configuration) -> Result<Settings, Error> {
        let copy_cordapps = configuration.get(&COPY_CORDAPPS)?.parse::<CopyCordapps>()?;
        let level = parse_level(&configuration.get(&LOG_LEVEL)?).map_err(Error::InvalidSettings)?;
        let logger = LoggerConfig {
            is_async: configuration.get(&LOG_ASYNC)?,
            chan_size: configuration.get(&LOG_CHAN_SIZE)?,
            level,
            ..LoggerConfig::default()
        };

        let mut package_ownership = BTreeMap::new();
        for owner in configuration
            .get_optional(&PACKAGE_OWNERSHIP)?
            .unwrap_or_default()
        {
            let package = owner.get(&PACKAGE_NAME)?;
            let key = owner
                .get(&PUBLIC_KEY)?
                .parse::<Ed25519PublicKey>()
                .map_err(|e| {
                    Error::InvalidSettings(format!("public key of {}: {}", package, e))
                })?;
            package_ownership.insert(package, Some(key));
        }
        for package in configuration.get(&UNREGISTER_PACKAGES)? {
            package_ownership.insert(package, None);
        }

        let overrides = NetworkParametersOverrides {
            minimum_platform_version: configuration.get_optional(&MINIMUM_PLATFORM_VERSION)?,
            max_message_size: configuration.get_optional(&MAX_MESSAGE_SIZE)?,
            max_transaction_size: configuration.get_optional(&MAX_TRANSACTION_SIZE)?,
            event_horizon: configuration.get_optional(&EVENT_HORIZON)?,
            package_ownership,
        };
        Ok(Settings {
            options: BootstrapOptions {
                copy_cordapps,
                overrides,
                fallback_artifact: None,
                node_environment: configuration.get(&NODE_ENVIRONMENT)?,
            },
            logger,
            resolved: configuration,
        })
    }
}
