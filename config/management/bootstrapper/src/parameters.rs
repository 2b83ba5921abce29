// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation of network parameters across runs.

use crate::{
    constants::NETWORK_PARAMETERS_FILE,
    error::{io_error, Error},
    signing::SigningAuthority,
};
use netboot_crypto::{Ed25519PublicKey, HashValue};
use netboot_types::{
    network_parameters::{find_overlapping_packages, is_package_valid},
    NetworkParameters, NotaryInfo, SignedNetworkParameters,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Parameter values requested for this run. `None` keeps what the network already has.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NetworkParametersOverrides {
    pub minimum_platform_version: Option<u32>,
    pub max_message_size: Option<u32>,
    pub max_transaction_size: Option<u32>,
    pub event_horizon: Option<Duration>,
    /// `Some(key)` registers the package to `key`, `None` unregisters it.
    pub package_ownership: BTreeMap<String, Option<Ed25519PublicKey>>,
}

/// The network parameters the node directories already share.
#[derive(Clone, Debug)]
pub struct Baseline {
    pub parameters: NetworkParameters,
    /// The file as found, rewritten verbatim when nothing changes.
    pub bytes: Vec<u8>,
}

pub fn network_parameters_path(directory: &Path) -> PathBuf {
    directory.join(NETWORK_PARAMETERS_FILE)
}

/// Reads and verifies the network parameters of every node directory that has them.
/// All of them must agree.
pub fn load_baseline(
    directories: &[PathBuf],
    authority: &SigningAuthority,
) -> Result<Option<Baseline>, Error> {
    let mut found: Vec<(PathBuf, NetworkParameters, Vec<u8>)> = vec![];
    for directory in directories {
        let path = network_parameters_path(directory);
        if !path.is_file() {
            continue;
        }
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        let signed = SignedNetworkParameters::from_bytes(&bytes).map_err(|e| {
            Error::SignatureVerification {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        let parameters = authority.verify_network_parameters(&signed, &path)?;
        found.push((path, parameters, bytes));
    }

    let mut found = found.into_iter();
    let (_, parameters, bytes) = match found.next() {
        Some(first) => first,
        None => return Ok(None),
    };
    let disagreeing: Vec<String> = found
        .filter(|(_, other, _)| *other != parameters)
        .map(|(path, other, _)| format!("{} (epoch {})", path.display(), other.epoch))
        .collect();
    if !disagreeing.is_empty() {
        return Err(Error::InconsistentNetworkParameters(disagreeing));
    }
    Ok(Some(Baseline { parameters, bytes }))
}

/// How this run's parameters relate to the baseline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EpochChange {
    /// No node had parameters; the network starts at epoch 1.
    Initial,
    /// Nothing changed; the baseline is kept as is.
    Unchanged,
    Advanced,
}

/// Inputs gathered from the scanned nodes.
#[derive(Clone, Debug, Default)]
pub struct ParametersInput {
    pub notaries: Vec<NotaryInfo>,
    pub contract_implementations: BTreeMap<String, Vec<HashValue>>,
    pub excluded_contracts: BTreeSet<String>,
    /// Set when the scanned legal names differ from the ones distributed by earlier runs.
    pub node_set_changed: bool,
}

pub fn build_network_parameters(
    baseline: Option<&NetworkParameters>,
    input: ParametersInput,
    overrides: &NetworkParametersOverrides,
    modified_time: u64,
) -> Result<(NetworkParameters, EpochChange), Error> {
    let initial = NetworkParameters::initial(modified_time);
    let prior = baseline.unwrap_or(&initial);

    let mut notaries = input.notaries;
    notaries.sort_by(|a, b| a.identity.name.cmp(&b.identity.name));

    let mut whitelist = prior.whitelisted_contract_implementations.clone();
    for (contract, hashes) in input.contract_implementations {
        if input.excluded_contracts.contains(&contract) {
            continue;
        }
        let existing = whitelist.entry(contract).or_default();
        for hash in hashes {
            if !existing.contains(&hash) {
                existing.push(hash);
            }
        }
    }

    let package_ownership = apply_ownership(&prior.package_ownership, &overrides.package_ownership)?;

    let mut parameters = NetworkParameters {
        minimum_platform_version: overrides
            .minimum_platform_version
            .unwrap_or(prior.minimum_platform_version),
        notaries,
        max_message_size: overrides.max_message_size.unwrap_or(prior.max_message_size),
        max_transaction_size: overrides
            .max_transaction_size
            .unwrap_or(prior.max_transaction_size),
        modified_time,
        epoch: 1,
        whitelisted_contract_implementations: whitelist,
        event_horizon: overrides.event_horizon.unwrap_or(prior.event_horizon),
        package_ownership,
    };

    let change = match baseline {
        None => EpochChange::Initial,
        Some(baseline) if parameters.equivalent_to(baseline) && !input.node_set_changed => {
            parameters = baseline.clone();
            EpochChange::Unchanged
        }
        Some(baseline) => {
            parameters.epoch = baseline.epoch.checked_add(1).ok_or_else(|| {
                Error::InvalidNetworkParameters("epoch cannot advance past u32::MAX".to_string())
            })?;
            EpochChange::Advanced
        }
    };

    parameters.validate().map_err(|e| match e {
        netboot_types::Error::PackageOverlap(first, second) => {
            Error::PackageOwnership { first, second }
        }
        other => Error::InvalidNetworkParameters(other.to_string()),
    })?;
    Ok((parameters, change))
}

fn apply_ownership(
    existing: &BTreeMap<String, Ed25519PublicKey>,
    changes: &BTreeMap<String, Option<Ed25519PublicKey>>,
) -> Result<BTreeMap<String, Ed25519PublicKey>, Error> {
    let mut ownership = existing.clone();
    for (package, owner) in changes {
        match owner {
            Some(key) => {
                if !is_package_valid(package) {
                    return Err(Error::InvalidNetworkParameters(format!(
                        "invalid package name {:?}",
                        package
                    )));
                }
                ownership.insert(package.clone(), key.clone());
            }
            None => {
                ownership.remove(package);
            }
        }
    }
    if let Some((first, second)) = find_overlapping_packages(ownership.keys()) {
        return Err(Error::PackageOwnership { first, second });
    }
    Ok(ownership)
}
