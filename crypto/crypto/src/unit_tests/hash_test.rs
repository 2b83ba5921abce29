// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::HashValue;
use std::io::Cursor;

#[test]
fn sha256_matches_known_vector() {
    assert_eq!(
        HashValue::sha256_of(b"abc").to_hex(),
        "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
    );
}

#[test]
fn reader_and_slice_hashes_agree() {
    let content = vec![42u8; 20_000];
    let from_reader = HashValue::sha256_of_reader(Cursor::new(&content)).unwrap();
    assert_eq!(from_reader, HashValue::sha256_of(&content));
}

#[test]
fn hex_parsing_accepts_either_case() {
    let hash = HashValue::sha256_of(b"cordapp");
    assert_eq!(hash.to_string().parse::<HashValue>().unwrap(), hash);
    assert_eq!(HashValue::from_hex(hash.to_hex().to_lowercase()).unwrap(), hash);
    assert!(HashValue::from_hex("ABCD").is_err());
}
