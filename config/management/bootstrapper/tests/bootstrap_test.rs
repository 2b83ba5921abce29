// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use netboot_bootstrapper::{
    constants::{
        ADDITIONAL_NODE_INFOS_DIR, CORDAPPS_DIR, NETWORK_PARAMETERS_FILE, NODE_CONF,
        RUNTIME_ARTIFACT,
    },
    BootstrapOptions, CopyCordapps, EpochChange, Error, NetworkBootstrapper, SigningAuthority,
};
use netboot_crypto::{Ed25519PrivateKey, Ed25519PublicKey, HashValue};
use netboot_logger::test_logger;
use netboot_types::{LegalName, NetworkParameters, SignedNetworkParameters};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

const RUNTIME: &[u8] = b"runtime artifact";

fn new_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join(RUNTIME_ARTIFACT), RUNTIME).unwrap();
    root
}

fn node_conf(legal_name: &str, notary: Option<bool>) -> String {
    let mut conf = format!(
        "my_legal_name = \"{}\"\np2p_address = \"localhost:10002\"\n",
        legal_name
    );
    if let Some(validating) = notary {
        conf.push_str(&format!("[notary]\nvalidating = {}\n", validating));
    }
    conf
}

fn add_node(root: &Path, directory: &str, legal_name: &str, notary: Option<bool>) -> PathBuf {
    let directory = root.join(directory);
    fs::create_dir_all(&directory).unwrap();
    fs::write(directory.join(NODE_CONF), node_conf(legal_name, notary)).unwrap();
    directory
}

fn bootstrapper() -> NetworkBootstrapper {
    NetworkBootstrapper::new(SigningAuthority::dev().unwrap()).with_logger(test_logger())
}

fn read_parameters(directory: &Path) -> NetworkParameters {
    let path = directory.join(NETWORK_PARAMETERS_FILE);
    let signed = SignedNetworkParameters::from_bytes(&fs::read(&path).unwrap()).unwrap();
    SigningAuthority::dev()
        .unwrap()
        .verify_network_parameters(&signed, &path)
        .unwrap()
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(directory) = pending.pop() {
        for entry in fs::read_dir(&directory).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.insert(path.clone(), fs::read(&path).unwrap());
            }
        }
    }
    files
}

fn node_info_files(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.starts_with("nodeInfo-"))
        .collect();
    names.sort();
    names
}

fn owner_key(seed: u8) -> Ed25519PublicKey {
    Ed25519PrivateKey::from_seed([seed; 32]).public_key()
}

fn register(packages: &[(&str, u8)]) -> BootstrapOptions {
    let mut options = BootstrapOptions::default();
    for (package, seed) in packages {
        options
            .overrides
            .package_ownership
            .insert(package.to_string(), Some(owner_key(*seed)));
    }
    options
}

#[test]
fn test_network_without_notaries() {
    let root = new_root();
    let bank_a = add_node(root.path(), "bank-a", "O=Bank A,L=London,C=GB", None);
    let bank_b = add_node(root.path(), "bank-b", "O=Bank B,L=New York,C=US", None);

    let summary = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(summary.epoch_change, EpochChange::Initial);
    assert_eq!(summary.network_parameters.epoch, 1);
    assert!(summary.network_parameters.notaries.is_empty());
    assert_eq!(summary.nodes.len(), 2);

    for directory in &[&bank_a, &bank_b] {
        assert_eq!(read_parameters(directory), summary.network_parameters);
        assert_eq!(fs::read(directory.join(RUNTIME_ARTIFACT)).unwrap(), RUNTIME);
        assert!(directory.join("certificates").join("identity.key").is_file());
        assert_eq!(node_info_files(directory).len(), 1);
        assert_eq!(
            node_info_files(&directory.join(ADDITIONAL_NODE_INFOS_DIR)).len(),
            2
        );
    }
}

#[test]
fn test_empty_root() {
    let root = tempfile::tempdir().unwrap();
    let error = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap_err();
    assert!(matches!(error, Error::NoNodesFound(_)));
    assert!(error.to_string().contains("No nodes found"));
}

#[test]
fn test_runtime_artifact_without_node_conf() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    let stray = root.path().join("stray");
    fs::create_dir(&stray).unwrap();
    fs::write(stray.join(RUNTIME_ARTIFACT), b"stray runtime").unwrap();
    let before = snapshot(root.path());

    let error = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap_err();
    match &error {
        Error::MissingNodeConf(directory) => assert_eq!(directory, &stray),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(error.to_string().contains("stray"));
    assert_eq!(fs::read(stray.join(RUNTIME_ARTIFACT)).unwrap(), b"stray runtime");
    assert_eq!(snapshot(root.path()), before);
    assert!(!bank.join(NETWORK_PARAMETERS_FILE).exists());
}

#[test]
fn test_duplicate_legal_names() {
    let root = new_root();
    add_node(root.path(), "one", "O=Bank A,L=London,C=GB", None);
    add_node(root.path(), "two", "O=Bank A, L=London, C=GB", None);
    let before = snapshot(root.path());

    match bootstrapper().bootstrap(root.path(), &BootstrapOptions::default()) {
        Err(Error::DuplicateLegalNames(duplicates)) => {
            assert_eq!(duplicates.len(), 1);
            assert_eq!(duplicates[0].1, vec!["one", "two"]);
        }
        other => panic!("expected a uniqueness error, got {:?}", other),
    }
    assert_eq!(snapshot(root.path()), before);
}

#[test]
fn test_rerun_is_idempotent() {
    let root = new_root();
    add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    fs::write(
        root.path().join("notary_node.conf"),
        node_conf("O=Notary,L=Zurich,C=CH", Some(true)),
    )
    .unwrap();
    fs::write(root.path().join("cash.jar"), b"cash contracts").unwrap();
    fs::write(root.path().join("cash.jar.contracts"), "com.example.Cash\n").unwrap();

    let first = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(
        fs::read(root.path().join("notary").join(NODE_CONF)).unwrap(),
        fs::read(root.path().join("notary_node.conf")).unwrap()
    );
    let before = snapshot(root.path());

    let second = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(second.epoch_change, EpochChange::Unchanged);
    assert!(!second.epoch_advanced());
    assert_eq!(second.network_parameters, first.network_parameters);
    assert_eq!(snapshot(root.path()), before);
}

#[test]
fn test_adding_a_notary_advances_the_epoch() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    let first = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(first.network_parameters.epoch, 1);

    let notary = add_node(root.path(), "notary", "O=Notary,L=Zurich,C=CH", Some(false));
    let second = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert!(second.epoch_advanced());
    let parameters = &second.network_parameters;
    assert_eq!(parameters.epoch, 2);
    assert_eq!(parameters.notaries.len(), 1);
    assert_eq!(
        parameters.notaries[0].identity.name,
        "O=Notary,L=Zurich,C=CH".parse::<LegalName>().unwrap()
    );
    assert!(!parameters.notaries[0].validating);
    assert_eq!(read_parameters(&bank), *parameters);
    assert_eq!(read_parameters(&notary), *parameters);
    assert_eq!(node_info_files(&bank.join(ADDITIONAL_NODE_INFOS_DIR)).len(), 2);
}

#[test]
fn test_removing_a_node_advances_the_epoch() {
    let root = new_root();
    let bank_a = add_node(root.path(), "bank-a", "O=Bank A,L=London,C=GB", None);
    let bank_b = add_node(root.path(), "bank-b", "O=Bank B,L=Paris,C=FR", None);
    let first = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(first.network_parameters.epoch, 1);
    assert_eq!(node_info_files(&bank_a.join(ADDITIONAL_NODE_INFOS_DIR)).len(), 2);

    fs::remove_dir_all(&bank_b).unwrap();
    let second = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(second.epoch_change, EpochChange::Advanced);
    assert_eq!(second.network_parameters.epoch, 2);
    assert_eq!(second.nodes.len(), 1);
    assert_eq!(read_parameters(&bank_a), second.network_parameters);
    assert_eq!(
        node_info_files(&bank_a.join(ADDITIONAL_NODE_INFOS_DIR)),
        node_info_files(&bank_a)
    );

    let third = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert_eq!(third.epoch_change, EpochChange::Unchanged);
    assert_eq!(third.network_parameters.epoch, 2);
}

#[test]
fn test_overlapping_package_leaves_network_unchanged() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    bootstrapper()
        .bootstrap(root.path(), &register(&[("com.example", 1)]))
        .unwrap();
    let persisted = fs::read(bank.join(NETWORK_PARAMETERS_FILE)).unwrap();

    match bootstrapper().bootstrap(root.path(), &register(&[("com.example.cash", 2)])) {
        Err(Error::PackageOwnership { first, second }) => {
            assert_eq!(first, "com.example");
            assert_eq!(second, "com.example.cash");
        }
        other => panic!("expected an overlap error, got {:?}", other),
    }
    assert_eq!(fs::read(bank.join(NETWORK_PARAMETERS_FILE)).unwrap(), persisted);
    let ownership = read_parameters(&bank).package_ownership;
    assert_eq!(ownership.len(), 1);
    assert_eq!(ownership["com.example"], owner_key(1));
}

#[test]
fn test_unregister_all_packages() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    bootstrapper()
        .bootstrap(root.path(), &register(&[("com.example", 1), ("org.other", 2)]))
        .unwrap();
    assert_eq!(read_parameters(&bank).package_ownership.len(), 2);

    let mut options = BootstrapOptions::default();
    for package in &["com.example", "org.other"] {
        options
            .overrides
            .package_ownership
            .insert(package.to_string(), None);
    }
    let summary = bootstrapper().bootstrap(root.path(), &options).unwrap();
    assert!(summary.network_parameters.package_ownership.is_empty());
    assert!(read_parameters(&bank).package_ownership.is_empty());
    assert_eq!(summary.network_parameters.epoch, 2);
}

#[test]
fn test_cordapps_and_whitelist() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    fs::write(root.path().join("cash.jar"), b"cash v1").unwrap();
    fs::write(
        root.path().join("cash.jar.contracts"),
        "com.example.Cash\ncom.example.Secret # excluded\n",
    )
    .unwrap();
    fs::write(
        root.path().join("exclude_whitelist.txt"),
        "com.example.Secret\n",
    )
    .unwrap();

    let first = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    let cordapps = bank.join(CORDAPPS_DIR);
    assert_eq!(fs::read(cordapps.join("cash.jar")).unwrap(), b"cash v1");
    assert!(cordapps.join("cash.jar.contracts").is_file());
    let whitelist = &first.network_parameters.whitelisted_contract_implementations;
    assert_eq!(whitelist["com.example.Cash"], vec![HashValue::sha256_of(b"cash v1")]);
    assert!(!whitelist.contains_key("com.example.Secret"));

    fs::write(root.path().join("cash-v2.jar"), b"cash v2").unwrap();
    fs::write(root.path().join("cash-v2.jar.contracts"), "com.example.Cash\n").unwrap();
    let second = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();
    assert!(!cordapps.join("cash-v2.jar").exists());
    assert_eq!(
        second.network_parameters.whitelisted_contract_implementations["com.example.Cash"],
        vec![HashValue::sha256_of(b"cash v1"), HashValue::sha256_of(b"cash v2")]
    );
    assert_eq!(second.network_parameters.epoch, 2);

    let always = BootstrapOptions {
        copy_cordapps: CopyCordapps::Always,
        ..Default::default()
    };
    bootstrapper().bootstrap(root.path(), &always).unwrap();
    assert_eq!(fs::read(cordapps.join("cash-v2.jar")).unwrap(), b"cash v2");
}

#[test]
fn test_fallback_runtime_artifact() {
    let root = tempfile::tempdir().unwrap();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    let local = add_node(root.path(), "local", "O=Bank B,L=Paris,C=FR", None);
    fs::write(local.join(RUNTIME_ARTIFACT), b"node local").unwrap();

    let error = bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap_err();
    assert!(matches!(error, Error::ArtifactConsistency { .. }));

    let options = BootstrapOptions {
        fallback_artifact: Some(b"embedded".to_vec()),
        ..Default::default()
    };
    bootstrapper().bootstrap(root.path(), &options).unwrap();
    assert_eq!(fs::read(bank.join(RUNTIME_ARTIFACT)).unwrap(), b"embedded");
    assert_eq!(fs::read(local.join(RUNTIME_ARTIFACT)).unwrap(), b"node local");
    assert!(!root.path().join(RUNTIME_ARTIFACT).exists());
}

#[test]
fn test_tampered_network_parameters_rejected() {
    let root = new_root();
    let bank = add_node(root.path(), "bank", "O=Bank A,L=London,C=GB", None);
    bootstrapper()
        .bootstrap(root.path(), &BootstrapOptions::default())
        .unwrap();

    let path = bank.join(NETWORK_PARAMETERS_FILE);
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    match bootstrapper().bootstrap(root.path(), &BootstrapOptions::default()) {
        Err(Error::SignatureVerification { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a signature error, got {:?}", other),
    }
}
