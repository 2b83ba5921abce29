// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Assembles the nodes under a root directory into one network.
//!
//! A run reads and checks everything first and only then writes, so any error before
//! the write phase leaves the directory tree as it was.

use crate::{
    artifacts::{self, ContractsScanner, CopyCordapps, ManifestContractsScanner},
    constants::NODE_ENV_PREFIX,
    distribution,
    error::Error,
    identity::{read_distributed_node_infos, NodeIdentity},
    node_config::NodeConfig,
    parameters::{
        build_network_parameters, load_baseline, EpochChange, NetworkParametersOverrides,
        ParametersInput,
    },
    scanner::{scan, NodeUnit},
    signing::SigningAuthority,
};
use netboot_config::ConfigSource;
use netboot_types::{LegalName, NetworkParameters, NotaryInfo, Party};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use slog::{info, o, Logger};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Clone, Debug, Default)]
pub struct BootstrapOptions {
    pub copy_cordapps: CopyCordapps,
    pub overrides: NetworkParametersOverrides,
    /// Runtime artifact used for nodes when neither they nor the root have one.
    pub fallback_artifact: Option<Vec<u8>>,
    /// Layer `NETBOOT_NODE_*` environment variables over every node configuration.
    pub node_environment: bool,
}

#[derive(Clone, Debug)]
pub struct BootstrapSummary {
    pub nodes: Vec<LegalName>,
    pub network_parameters: NetworkParameters,
    pub epoch_change: EpochChange,
}

impl BootstrapSummary {
    pub fn epoch_advanced(&self) -> bool {
        self.epoch_change == EpochChange::Advanced
    }
}

struct PreparedNode {
    unit: NodeUnit,
    config: NodeConfig,
    identity: NodeIdentity,
}

pub struct NetworkBootstrapper {
    authority: SigningAuthority,
    contracts_scanner: Box<dyn ContractsScanner>,
    logger: Logger,
}

impl NetworkBootstrapper {
    pub fn new(authority: SigningAuthority) -> Self {
        Self {
            authority,
            contracts_scanner: Box::new(ManifestContractsScanner),
            logger: netboot_logger::discard(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_contracts_scanner<S: ContractsScanner + 'static>(mut self, scanner: S) -> Self {
        self.contracts_scanner = Box::new(scanner);
        self
    }

    pub fn authority(&self) -> &SigningAuthority {
        &self.authority
    }

    pub fn bootstrap(&self, root: &Path, options: &BootstrapOptions) -> Result<BootstrapSummary, Error> {
        self.bootstrap_with_rng(root, options, &mut OsRng)
    }

    /// Same as [`NetworkBootstrapper::bootstrap`], drawing new identity keys from `rng`.
    pub fn bootstrap_with_rng<R: RngCore + CryptoRng>(
        &self,
        root: &Path,
        options: &BootstrapOptions,
        rng: &mut R,
    ) -> Result<BootstrapSummary, Error> {
        let logger = self.logger.new(o!("root" => root.display().to_string()));

        let units = scan(root)?;
        info!(logger, "Found nodes"; "count" => units.len());

        let mut configs = vec![];
        for unit in &units {
            let overlay = if options.node_environment {
                Some(ConfigSource::environment(NODE_ENV_PREFIX))
            } else {
                None
            };
            let config = NodeConfig::load(&unit.conf_file, overlay)?;
            info!(logger, "Read node configuration"; "node" => &unit.name, "legal_name" => %config.legal_name);
            configs.push(config);
        }
        check_unique_names(&units, &configs)?;

        let directories: Vec<PathBuf> = units.iter().map(|unit| unit.directory.clone()).collect();
        let baseline = load_baseline(&directories, &self.authority)?;
        let current_names: BTreeSet<&LegalName> =
            configs.iter().map(|config| &config.legal_name).collect();
        let mut distributed_names = BTreeSet::new();
        let mut departed_node_infos = vec![];
        for directory in &directories {
            for stored in read_distributed_node_infos(directory, &self.authority)? {
                if let Some(name) = stored.node_info.legal_name() {
                    if !current_names.contains(name) {
                        departed_node_infos.push(stored.path.clone());
                    }
                    distributed_names.insert(name.clone());
                }
            }
        }
        let node_set_changed = !distributed_names.iter().eq(current_names.iter().copied());
        let first_run = baseline.is_none();

        let artifact_plan = artifacts::plan_runtime_artifacts(
            root,
            &directories,
            options.fallback_artifact.is_some(),
        )?;
        let scanner = self.contracts_scanner.as_ref();
        let staged = artifacts::staged_cordapps(root, scanner)?;
        let copy_cordapps = options.copy_cordapps.should_copy(first_run);
        let mut installed = vec![];
        for directory in &directories {
            installed.extend(artifacts::node_cordapps(directory, scanner)?);
        }
        let contract_implementations =
            artifacts::contract_implementations(staged.iter().chain(installed.iter()));
        let excluded_contracts = artifacts::whitelist_exclusions(root)?;

        let mut nodes = vec![];
        for (unit, config) in units.into_iter().zip(configs) {
            let identity =
                NodeIdentity::prepare(&unit.directory, &config, &self.authority, rng, &logger)?;
            nodes.push(PreparedNode {
                unit,
                config,
                identity,
            });
        }

        let notaries = nodes
            .iter()
            .filter_map(|node| {
                node.config.notary.as_ref().map(|notary| NotaryInfo {
                    identity: Party::new(node.config.legal_name.clone(), node.identity.key.public_key()),
                    validating: notary.validating,
                })
            })
            .collect();
        let input = ParametersInput {
            notaries,
            contract_implementations,
            excluded_contracts,
            node_set_changed,
        };
        let (network_parameters, epoch_change) = build_network_parameters(
            baseline.as_ref().map(|baseline| &baseline.parameters),
            input,
            &options.overrides,
            now_millis(),
        )?;
        let parameters_bytes = match (&baseline, epoch_change) {
            (Some(baseline), EpochChange::Unchanged) => baseline.bytes.clone(),
            _ => self
                .authority
                .sign_network_parameters(&network_parameters)?
                .to_bytes()
                .map_err(|e| Error::Certificate("network parameters".to_string(), e))?,
        };
        info!(
            logger,
            "Network parameters ready";
            "epoch" => network_parameters.epoch,
            "change" => ?epoch_change,
            "notaries" => network_parameters.notaries.len()
        );

        for node in &nodes {
            distribution::install_node_conf(&node.unit, &logger)?;
        }
        let _fallback_guard = artifact_plan.install(options.fallback_artifact.as_deref(), &logger)?;
        if copy_cordapps {
            for node in &nodes {
                artifacts::copy_cordapps(&staged, &node.unit.directory, &logger)?;
            }
        }
        for node in &nodes {
            distribution::publish_identity(&node.unit.directory, &node.identity, &logger)?;
        }
        let directories: Vec<&Path> = nodes.iter().map(|node| node.unit.directory.as_path()).collect();
        let node_infos: Vec<_> = nodes.iter().map(|node| &node.identity.signed).collect();
        distribution::remove_departed_node_infos(&departed_node_infos, &logger)?;
        distribution::distribute_node_infos(&directories, &node_infos, &logger)?;
        distribution::write_network_parameters(&directories, &parameters_bytes, &logger)?;
        info!(logger, "Bootstrap complete"; "epoch" => network_parameters.epoch);

        Ok(BootstrapSummary {
            nodes: nodes.into_iter().map(|node| node.config.legal_name).collect(),
            network_parameters,
            epoch_change,
        })
    }
}

fn check_unique_names(units: &[NodeUnit], configs: &[NodeConfig]) -> Result<(), Error> {
    let mut by_name: BTreeMap<&LegalName, Vec<String>> = BTreeMap::new();
    for (unit, config) in units.iter().zip(configs) {
        by_name
            .entry(&config.legal_name)
            .or_default()
            .push(unit.name.clone());
    }
    let duplicates: Vec<_> = by_name
        .into_iter()
        .filter(|(_, nodes)| nodes.len() > 1)
        .map(|(name, nodes)| (name.clone(), nodes))
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateLegalNames(duplicates))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
