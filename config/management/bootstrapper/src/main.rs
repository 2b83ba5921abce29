// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use anyhow::{anyhow, Context, Result};
use netboot_bootstrapper::{NetworkBootstrapper, Settings, SigningAuthority};
use netboot_crypto::Ed25519PublicKey;
use netboot_logger::build_logger;
use slog::{debug, info};
use std::{collections::BTreeMap, fs, path::PathBuf, str::FromStr};
use structopt::StructOpt;

#[derive(Debug)]
struct PackageOwner {
    package: String,
    key: Ed25519PublicKey,
}

impl FromStr for PackageOwner {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, '=');
        let package = parts.next().unwrap_or_default().trim();
        let key = parts
            .next()
            .ok_or_else(|| anyhow!("expected <package>=<hex public key>, got {:?}", s))?;
        Ok(PackageOwner {
            package: package.to_string(),
            key: key.parse().context("invalid package owner key")?,
        })
    }
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Bootstraps a network from a directory of node configurations")]
struct Args {
    #[structopt(long, default_value = ".", parse(from_os_str))]
    /// Root directory holding the node directories and `<name>_node.conf` files
    dir: PathBuf,
    #[structopt(long, parse(from_os_str))]
    /// Settings file layered over `<dir>/bootstrapper.conf`
    config: Option<PathBuf>,
    #[structopt(long, possible_values = &["always", "first_run_only", "no"])]
    /// When to copy staged CorDapps into the node directories
    copy_cordapps: Option<String>,
    #[structopt(long)]
    minimum_platform_version: Option<u32>,
    #[structopt(long)]
    /// Maximum message size in bytes
    max_message_size: Option<u32>,
    #[structopt(long)]
    /// Maximum transaction size in bytes
    max_transaction_size: Option<u32>,
    #[structopt(long)]
    /// Event horizon, e.g. `30d` or `12h`
    event_horizon: Option<String>,
    #[structopt(long = "register-package-owner")]
    /// `<package>=<hex public key>`, may be repeated
    register_package_owner: Vec<PackageOwner>,
    #[structopt(long = "unregister-package-owner")]
    /// Package to unregister, may be repeated
    unregister_package_owner: Vec<String>,
    #[structopt(long, parse(from_os_str))]
    /// Runtime artifact to install when neither a node nor the root has one
    runtime_artifact: Option<PathBuf>,
    #[structopt(long)]
    log_level: Option<String>,
}

impl Args {
    fn properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                properties.insert(key.to_string(), value);
            }
        };
        set("copy_cordapps", self.copy_cordapps.clone());
        set("logger.level", self.log_level.clone());
        set(
            "network_parameters.minimum_platform_version",
            self.minimum_platform_version.map(|v| v.to_string()),
        );
        set(
            "network_parameters.max_message_size",
            self.max_message_size.map(|v| v.to_string()),
        );
        set(
            "network_parameters.max_transaction_size",
            self.max_transaction_size.map(|v| v.to_string()),
        );
        set("network_parameters.event_horizon", self.event_horizon.clone());
        if !self.unregister_package_owner.is_empty() {
            set(
                "network_parameters.unregister_packages",
                Some(self.unregister_package_owner.join(",")),
            );
        }
        properties
    }
}

fn main() -> Result<()> {
    let args = Args::from_args();

    let mut settings = Settings::load(&args.dir, args.config.clone(), args.properties())?;
    for owner in &args.register_package_owner {
        settings
            .options
            .overrides
            .package_ownership
            .insert(owner.package.clone(), Some(owner.key.clone()));
    }
    if let Some(path) = &args.runtime_artifact {
        settings.options.fallback_artifact = Some(
            fs::read(path).with_context(|| format!("reading {}", path.display()))?,
        );
    }

    let logger = build_logger(&settings.logger);
    if let Ok(rendered) = settings.resolved.to_toml_string() {
        debug!(logger, "Resolved settings"; "settings" => rendered);
    }

    let bootstrapper = NetworkBootstrapper::new(SigningAuthority::dev()?).with_logger(logger.clone());
    let summary = bootstrapper.bootstrap(&args.dir, &settings.options)?;
    info!(
        logger,
        "Bootstrapped network";
        "nodes" => summary.nodes.len(),
        "epoch" => summary.network_parameters.epoch,
        "epoch_advanced" => summary.epoch_advanced()
    );
    for name in &summary.nodes {
        info!(logger, "Network member"; "legal_name" => %name);
    }
    Ok(())
}
