// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{invariant, Error},
    party::Party,
};
use netboot_crypto::{Ed25519PublicKey, HashValue};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

pub const DEFAULT_MINIMUM_PLATFORM_VERSION: u32 = 4;
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 10_485_760;
pub const DEFAULT_MAX_TRANSACTION_SIZE: u32 = 524_288_000;
pub const DEFAULT_EVENT_HORIZON: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct NotaryInfo {
    pub identity: Party,
    pub validating: bool,
}

/// Network-wide parameters every node must agree on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkParameters {
    pub minimum_platform_version: u32,
    pub notaries: Vec<NotaryInfo>,
    pub max_message_size: u32,
    pub max_transaction_size: u32,
    /// Milliseconds since the unix epoch.
    pub modified_time: u64,
    pub epoch: u32,
    /// Contract class name to the hashes of the attachments allowed to implement it.
    pub whitelisted_contract_implementations: BTreeMap<String, Vec<HashValue>>,
    pub event_horizon: Duration,
    /// Package namespace to the key that owns it.
    pub package_ownership: BTreeMap<String, Ed25519PublicKey>,
}

impl NetworkParameters {
    /// Parameters of a fresh network with no notaries, whitelist or package owners.
    pub fn initial(modified_time: u64) -> Self {
        Self {
            minimum_platform_version: DEFAULT_MINIMUM_PLATFORM_VERSION,
            notaries: vec![],
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_transaction_size: DEFAULT_MAX_TRANSACTION_SIZE,
            modified_time,
            epoch: 1,
            whitelisted_contract_implementations: BTreeMap::new(),
            event_horizon: DEFAULT_EVENT_HORIZON,
            package_ownership: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        invariant(self.epoch >= 1, || {
            format!("epoch must be at least 1, was {}", self.epoch)
        })?;
        invariant(self.minimum_platform_version >= 1, || {
            format!(
                "minimum platform version must be at least 1, was {}",
                self.minimum_platform_version
            )
        })?;
        invariant(self.max_message_size > 0, || {
            "max message size must be positive".to_string()
        })?;
        invariant(self.max_transaction_size > 0, || {
            "max transaction size must be positive".to_string()
        })?;
        invariant(self.event_horizon > Duration::from_secs(0), || {
            "event horizon must be positive".to_string()
        })?;

        let mut notary_names = BTreeSet::new();
        for notary in &self.notaries {
            invariant(notary_names.insert(&notary.identity.name), || {
                format!("duplicate notary {}", notary.identity.name)
            })?;
        }

        for package in self.package_ownership.keys() {
            if !is_package_valid(package) {
                return Err(Error::InvalidPackageName(package.clone()));
            }
        }
        if let Some((a, b)) = find_overlapping_packages(self.package_ownership.keys()) {
            return Err(Error::PackageOverlap(a, b));
        }
        Ok(())
    }

    /// Whether the two parameter sets differ only by epoch and modified time.
    pub fn equivalent_to(&self, other: &NetworkParameters) -> bool {
        self.minimum_platform_version == other.minimum_platform_version
            && self.notaries == other.notaries
            && self.max_message_size == other.max_message_size
            && self.max_transaction_size == other.max_transaction_size
            && self.whitelisted_contract_implementations
                == other.whitelisted_contract_implementations
            && self.event_horizon == other.event_horizon
            && self.package_ownership == other.package_ownership
    }
}

/// A package name is a non-empty sequence of dot separated Java style identifiers.
pub fn is_package_valid(package: &str) -> bool {
    !package.is_empty()
        && package.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() || first == '_' || first == '$' => chars
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$'),
                _ => false,
            }
        })
}

/// Two packages overlap when they are equal or one is a namespace prefix of the other:
/// `com.example` overlaps `com.example.cash` but not `com.examples`.
pub fn packages_overlap(a: &str, b: &str) -> bool {
    let is_prefix = |short: &str, long: &str| {
        long.starts_with(short) && long[short.len()..].starts_with('.')
    };
    a == b || is_prefix(a, b) || is_prefix(b, a)
}

/// Returns the first pair of overlapping packages, in sorted order.
pub fn find_overlapping_packages<'a, I>(packages: I) -> Option<(String, String)>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut sorted: Vec<&String> = packages.into_iter().collect();
    sorted.sort();
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            if packages_overlap(a, b) {
                return Some(((*a).clone(), (*b).clone()));
            }
        }
    }
    None
}
