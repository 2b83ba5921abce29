// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::legal_name::LegalName;

#[test]
fn test_parse_and_display() {
    let name: LegalName = "o=Bank A,  L=London ,C=GB".parse().unwrap();
    assert_eq!(name.organisation(), "Bank A");
    assert_eq!(name.locality(), "London");
    assert_eq!(name.country(), "GB");
    assert_eq!(name.to_string(), "O=Bank A, L=London, C=GB");

    let full: LegalName = "C=US, ST=New York, O=Notary, L=New York City, CN=Service, OU=Ops"
        .parse()
        .unwrap();
    assert_eq!(
        full.to_string(),
        "CN=Service, OU=Ops, O=Notary, L=New York City, ST=New York, C=US"
    );
    assert_eq!(full.to_string().parse::<LegalName>().unwrap(), full);
}

#[test]
fn test_attribute_order_does_not_matter() {
    let a: LegalName = "O=Bank A, L=London, C=GB".parse().unwrap();
    let b: LegalName = "C=GB,O=Bank A,L=London".parse().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_invalid_names() {
    for text in &[
        "",
        "O=Bank A, L=London",
        "O=Bank A, L=London, C=gb",
        "O=Bank A, L=London, C=GBR",
        "O=Bank A, O=Bank B, L=London, C=GB",
        "O=Bank A, L=London, C=GB, X=1",
        "O=, L=London, C=GB",
        "Bank A, L=London, C=GB",
    ] {
        assert!(text.parse::<LegalName>().is_err(), "{:?} parsed", text);
    }
    LegalName::new("Bank A", "London", "XX1").unwrap_err();
    LegalName::new("Bank A", "London", "GB")
        .unwrap()
        .with_common_name(" ")
        .unwrap_err();
}

#[test]
fn test_serde_uses_text_form() {
    let name = LegalName::new("Bank A", "London", "GB").unwrap();
    let json = serde_json::to_string(&name).unwrap();
    assert_eq!(json, "\"O=Bank A, L=London, C=GB\"");
    assert_eq!(serde_json::from_str::<LegalName>(&json).unwrap(), name);
    serde_json::from_str::<LegalName>("\"O=Bank A\"").unwrap_err();
}
