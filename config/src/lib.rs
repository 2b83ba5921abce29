// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Typed, layered configuration.
//!
//! ```
//! use netboot_config::{Configuration, ConfigSource, Format, Property, PropertyType, Specification};
//!
//! const PORT: Property<u16> = Property::new("port");
//!
//! let spec = Specification::builder("server")
//!     .with_default("port", PropertyType::Int, 8080i64, "listen port")
//!     .build()
//!     .unwrap();
//! let config = Configuration::builder()
//!     .from(ConfigSource::string(Format::Toml, "port = 9000"))
//!     .build(&spec)
//!     .unwrap();
//! assert_eq!(config.get(&PORT).unwrap(), 9000);
//! ```

pub mod configuration;
pub mod error;
pub mod raw;
pub mod source;
pub mod spec;
pub mod value;

#[cfg(test)]
mod unit_tests;

pub use crate::{
    configuration::{Configuration, ConfigurationBuilder, MutableConfiguration},
    error::ConfigError,
    raw::{Format, MergePolicy, MergedTree, RawValue},
    source::{ConfigSource, DirectoryResources, EmbeddedResources, ResourceLoader},
    spec::{PropertyDescriptor, PropertyType, Specification, SpecificationBuilder},
    value::{format_duration, parse_bool, parse_duration, ConfigType, Property, Value},
};
