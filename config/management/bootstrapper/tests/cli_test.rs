// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use netboot_bootstrapper::constants::{NETWORK_PARAMETERS_FILE, NODE_CONF, RUNTIME_ARTIFACT};
use std::{fs, process::Command};

#[test]
fn test_successful_run_writes_nothing_to_stdout() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join(RUNTIME_ARTIFACT), b"runtime artifact").unwrap();
    let bank = root.path().join("bank");
    fs::create_dir_all(&bank).unwrap();
    fs::write(
        bank.join(NODE_CONF),
        "my_legal_name = \"O=Bank A,L=London,C=GB\"\np2p_address = \"localhost:10002\"\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_network-bootstrapper"))
        .arg("--dir")
        .arg(root.path())
        .output()
        .unwrap();
    if !output.status.success() {
        panic!("network-bootstrapper failed, output: {:?}", output);
    }
    assert!(output.stdout.is_empty(), "stdout: {:?}", output.stdout);
    assert!(bank.join(NETWORK_PARAMETERS_FILE).is_file());
}
