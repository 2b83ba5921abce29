// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::ConfigError,
    raw::{Format, RawValue},
    source::{ConfigSource, DirectoryResources, EmbeddedResources},
};
use std::{fs, io::Cursor, sync::Arc};

fn string(value: &str) -> RawValue {
    RawValue::String(value.to_string())
}

#[test]
fn test_file_format_follows_extension() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("settings.yaml");
    fs::write(&yaml, "a:\n  b: 1\n").unwrap();
    let loaded = ConfigSource::file(&yaml).load().unwrap().unwrap();
    assert_eq!(loaded.get_path("a.b"), Some(&RawValue::Int(1)));

    let unknown = dir.path().join("settings.ini");
    fs::write(&unknown, "a = 1").unwrap();
    assert!(matches!(
        ConfigSource::file(&unknown).load(),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        ConfigSource::file(&missing).load(),
        Err(ConfigError::IO(..))
    ));
    assert!(ConfigSource::optional_file(&missing).load().unwrap().is_none());
}

#[test]
fn test_resources() {
    let embedded = Arc::new(EmbeddedResources::new().with("defaults.toml", b"a = 1\n"));
    let loaded = ConfigSource::resource("defaults.toml", embedded.clone())
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(loaded.get_path("a"), Some(&RawValue::Int(1)));
    assert!(matches!(
        ConfigSource::resource("other.toml", embedded).load(),
        Err(ConfigError::Read { .. })
    ));

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("defaults.json"), r#"{"a": 2}"#).unwrap();
    let loaded = ConfigSource::resource("defaults.json", Arc::new(DirectoryResources::new(dir.path())))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(loaded.get_path("a"), Some(&RawValue::Int(2)));
}

#[test]
fn test_stream_and_string() {
    let stream = ConfigSource::stream("stdin", Format::Json, Cursor::new(br#"{"a": true}"#.to_vec()));
    assert_eq!(stream.origin(), "stdin");
    assert_eq!(
        stream.load().unwrap().unwrap().get_path("a"),
        Some(&RawValue::Bool(true))
    );
    let inline = ConfigSource::string(Format::Yaml, "a: [1, 2]");
    assert_eq!(
        inline.load().unwrap().unwrap().get_path("a"),
        Some(&RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)]))
    );
}

#[test]
fn test_environment_mapping() {
    let vars = vec![
        ("APP_PORT".to_string(), "9000".to_string()),
        ("APP_LOGGER__LEVEL".to_string(), "debug".to_string()),
        ("APP_COPY_CORDAPPS".to_string(), "no".to_string()),
        ("APP_".to_string(), "ignored".to_string()),
        ("OTHER_PORT".to_string(), "1".to_string()),
    ];
    let loaded = ConfigSource::environment_from("APP", vars)
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(loaded.get_path("port"), Some(&string("9000")));
    assert_eq!(loaded.get_path("logger.level"), Some(&string("debug")));
    assert_eq!(loaded.get_path("copy_cordapps"), Some(&string("no")));
    assert_eq!(loaded.as_object().unwrap().len(), 3);
}

#[test]
fn test_properties_prefix() {
    let source = ConfigSource::properties(
        Some("app"),
        vec![("app.logger.level", "warn"), ("app.port", "1"), ("other.port", "2")],
    );
    let loaded = source.load().unwrap().unwrap();
    assert_eq!(loaded.get_path("logger.level"), Some(&string("warn")));
    assert_eq!(loaded.get_path("port"), Some(&string("1")));
    assert_eq!(loaded.as_object().unwrap().len(), 2);
}
