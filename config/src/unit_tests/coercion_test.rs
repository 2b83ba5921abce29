// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::ConfigError,
    raw::RawValue,
    spec::PropertyType,
    value::{coerce, format_duration, parse_bool, parse_duration, Value},
};
use proptest::prelude::*;
use std::time::Duration;

fn string(s: &str) -> RawValue {
    RawValue::String(s.to_string())
}

#[test]
fn test_strings_coerce_to_scalars() {
    assert_eq!(
        coerce(&string(" 42 "), &PropertyType::Int, "p").unwrap(),
        Value::Int(42)
    );
    assert_eq!(
        coerce(&string("2.5"), &PropertyType::Float, "p").unwrap(),
        Value::Float(2.5)
    );
    assert_eq!(
        coerce(&string("yes"), &PropertyType::Bool, "p").unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        coerce(&string("30d"), &PropertyType::Duration, "p").unwrap(),
        Value::Duration(Duration::from_secs(30 * 86_400))
    );
}

#[test]
fn test_scalars_coerce_to_string() {
    assert_eq!(
        coerce(&RawValue::Int(7), &PropertyType::String, "p").unwrap(),
        Value::String("7".into())
    );
    assert_eq!(
        coerce(&RawValue::Bool(false), &PropertyType::String, "p").unwrap(),
        Value::String("false".into())
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        coerce(&RawValue::Int(3), &PropertyType::Float, "p").unwrap(),
        Value::Float(3.0)
    );
    assert_eq!(
        coerce(&RawValue::Float(3.0), &PropertyType::Int, "p").unwrap(),
        Value::Int(3)
    );
    coerce(&RawValue::Float(3.5), &PropertyType::Int, "p").unwrap_err();
    coerce(&RawValue::Bool(true), &PropertyType::Int, "p").unwrap_err();
}

#[test]
fn test_bare_duration_is_milliseconds() {
    assert_eq!(
        coerce(&RawValue::Int(1500), &PropertyType::Duration, "p").unwrap(),
        Value::Duration(Duration::from_millis(1500))
    );
    assert_eq!(parse_duration("250"), Some(Duration::from_millis(250)));
    coerce(&RawValue::Int(-1), &PropertyType::Duration, "p").unwrap_err();
}

#[test]
fn test_duration_units() {
    assert_eq!(parse_duration("10ns"), Some(Duration::from_nanos(10)));
    assert_eq!(parse_duration("10 us"), Some(Duration::from_micros(10)));
    assert_eq!(parse_duration("10ms"), Some(Duration::from_millis(10)));
    assert_eq!(parse_duration("10s"), Some(Duration::from_secs(10)));
    assert_eq!(parse_duration("10 seconds"), Some(Duration::from_secs(10)));
    assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
    assert_eq!(parse_duration("2 minutes"), Some(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3_600)));
    assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5_400)));
    assert_eq!(parse_duration("2 days"), Some(Duration::from_secs(172_800)));
    assert_eq!(parse_duration("2 fortnights"), None);
    assert_eq!(parse_duration("h"), None);
    assert_eq!(parse_duration("-1s"), None);
}

#[test]
fn test_out_of_range_durations() {
    assert_eq!(parse_duration("18446744073709551616.0s"), None);
    assert_eq!(parse_duration("99999999999999999999999.5d"), None);
    assert_eq!(parse_duration("18446744073709551616s"), None);
    assert!(matches!(
        coerce(&string("18446744073709551616.0s"), &PropertyType::Duration, "p"),
        Err(ConfigError::WrongType { .. })
    ));
}

#[test]
fn test_bools() {
    for text in &["true", "YES", "on", "1"] {
        assert_eq!(parse_bool(text), Some(true));
    }
    for text in &["false", "No", "OFF", "0"] {
        assert_eq!(parse_bool(text), Some(false));
    }
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
fn test_enum_matching_keeps_declared_spelling() {
    let ty = PropertyType::enumeration(vec!["Always", "FirstRunOnly", "No"]);
    assert_eq!(
        coerce(&string("firstrunonly"), &ty, "p").unwrap(),
        Value::String("FirstRunOnly".into())
    );
    match coerce(&string("sometimes"), &ty, "copy") {
        Err(ConfigError::WrongType { path, .. }) => assert_eq!(path, "copy"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lists() {
    let ty = PropertyType::list(PropertyType::Int);
    assert_eq!(
        coerce(&string("1, 2,3"), &ty, "p").unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_eq!(coerce(&string(""), &ty, "p").unwrap(), Value::List(vec![]));
    assert_eq!(
        coerce(&RawValue::List(vec![string("4"), RawValue::Int(5)]), &ty, "p").unwrap(),
        Value::List(vec![Value::Int(4), Value::Int(5)])
    );
    match coerce(&RawValue::List(vec![RawValue::Int(1), string("x")]), &ty, "p") {
        Err(ConfigError::WrongType { path, .. }) => assert_eq!(path, "p[1]"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_composites_never_become_scalars() {
    let list = RawValue::List(vec![RawValue::Int(1)]);
    let object = RawValue::Object(Default::default());
    for ty in &[
        PropertyType::String,
        PropertyType::Int,
        PropertyType::Bool,
        PropertyType::Duration,
    ] {
        coerce(&list, ty, "p").unwrap_err();
        coerce(&object, ty, "p").unwrap_err();
    }
}

proptest! {
    #[test]
    fn test_format_duration_parses_back(nanos in 0u64..u64::MAX / 2) {
        let duration = Duration::from_nanos(nanos);
        prop_assert_eq!(parse_duration(&format_duration(duration)), Some(duration));
    }
}
