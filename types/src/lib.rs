// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod certificate;
pub mod error;
pub mod legal_name;
pub mod network_parameters;
pub mod node_info;
pub mod party;
pub mod signed_data;

#[cfg(test)]
mod unit_tests;

pub use crate::{
    certificate::{CertRole, Certificate, CertificateAuthority, CertificateChain},
    error::Error,
    legal_name::LegalName,
    network_parameters::{NetworkParameters, NotaryInfo},
    node_info::{NodeInfo, SignedNodeInfo},
    party::{Party, PartyAndCertificate},
    signed_data::{SignedDataWithCert, SignedNetworkParameters},
};
