// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Turns a directory of node configurations into a network whose nodes share signed
//! network parameters and know each other's identities.
//!
//! ```no_run
//! use netboot_bootstrapper::{BootstrapOptions, NetworkBootstrapper, SigningAuthority};
//! use std::path::Path;
//!
//! let bootstrapper = NetworkBootstrapper::new(SigningAuthority::dev().unwrap());
//! let summary = bootstrapper
//!     .bootstrap(Path::new("nodes"), &BootstrapOptions::default())
//!     .unwrap();
//! println!("epoch {}", summary.network_parameters.epoch);
//! ```

pub mod artifacts;
pub mod bootstrapper;
pub mod constants;
pub mod distribution;
pub mod error;
pub mod identity;
pub mod node_config;
pub mod parameters;
pub mod scanner;
pub mod settings;
pub mod signing;

pub use crate::{
    artifacts::{ContractsScanner, CopyCordapps, ManifestContractsScanner},
    bootstrapper::{BootstrapOptions, BootstrapSummary, NetworkBootstrapper},
    error::Error,
    parameters::{EpochChange, NetworkParametersOverrides},
    settings::Settings,
    signing::{AuthorityKeys, SigningAuthority},
};
