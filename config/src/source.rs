// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Where configuration comes from.
//!
//! A [`ConfigSource`] is one layer of a cascade. Loading a source yields a [`RawValue`]
//! object tree plus a short origin description used in error messages.

use crate::{
    error::ConfigError,
    raw::{Format, RawValue},
};
use std::{
    collections::BTreeMap,
    fmt, fs,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Separator between nesting levels in environment variable names: `PREFIX_A__B` is `a.b`.
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// Named, read-only blobs bundled with or shipped next to a program, the equivalent of
/// classpath resources.
pub trait ResourceLoader: Send + Sync {
    /// Returns the content of `name`, or `None` when the loader does not have it.
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ConfigError>;

    fn describe(&self) -> String;
}

/// Resources compiled into the binary, typically with `include_bytes!`.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedResources {
    resources: BTreeMap<String, &'static [u8]>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, content: &'static [u8]) -> Self {
        self.resources.insert(name.to_string(), content);
        self
    }
}

impl ResourceLoader for EmbeddedResources {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.resources.get(name).map(|content| content.to_vec()))
    }

    fn describe(&self) -> String {
        "embedded resources".to_string()
    }
}

/// Resources looked up relative to a directory.
#[derive(Clone, Debug)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirectoryResources {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| ConfigError::IO(path.display().to_string(), e))
    }

    fn describe(&self) -> String {
        format!("resources in {}", self.root.display())
    }
}

pub enum ConfigSource {
    /// A file whose format follows its extension. Missing files are an error.
    File(PathBuf),
    /// Like `File`, but a missing file contributes nothing.
    OptionalFile(PathBuf),
    Resource {
        name: String,
        format: Format,
        loader: Arc<dyn ResourceLoader>,
    },
    Stream {
        origin: String,
        format: Format,
        reader: Box<dyn Read>,
    },
    Str {
        origin: String,
        format: Format,
        text: String,
    },
    /// Variables `<prefix>_<key>`, with `__` separating nesting levels. Keys are lower
    /// cased; values are strings and are coerced like any other string.
    Environment {
        prefix: String,
        vars: Vec<(String, String)>,
    },
    /// Dotted `key = value` pairs, such as command line overrides. With a prefix, only
    /// keys below `<prefix>.` are taken and the prefix is stripped.
    Properties {
        prefix: Option<String>,
        entries: BTreeMap<String, String>,
    },
}

impl ConfigSource {
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        ConfigSource::File(path.as_ref().to_path_buf())
    }

    pub fn optional_file<P: AsRef<Path>>(path: P) -> Self {
        ConfigSource::OptionalFile(path.as_ref().to_path_buf())
    }

    /// A resource whose format follows its name's extension, TOML when it has none.
    pub fn resource(name: &str, loader: Arc<dyn ResourceLoader>) -> Self {
        ConfigSource::Resource {
            name: name.to_string(),
            format: Format::from_path(Path::new(name)).unwrap_or(Format::Toml),
            loader,
        }
    }

    pub fn stream<R: Read + 'static>(origin: &str, format: Format, reader: R) -> Self {
        ConfigSource::Stream {
            origin: origin.to_string(),
            format,
            reader: Box::new(reader),
        }
    }

    pub fn string(format: Format, text: &str) -> Self {
        ConfigSource::Str {
            origin: format!("inline {}", format),
            format,
            text: text.to_string(),
        }
    }

    /// Snapshot of the process environment under `prefix`.
    pub fn environment(prefix: &str) -> Self {
        Self::environment_from(prefix, std::env::vars())
    }

    pub fn environment_from<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        ConfigSource::Environment {
            prefix: prefix.to_string(),
            vars: vars.into_iter().collect(),
        }
    }

    pub fn properties<I, K, V>(prefix: Option<&str>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ConfigSource::Properties {
            prefix: prefix.map(str::to_string),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Short description used in error messages.
    pub fn origin(&self) -> String {
        match self {
            ConfigSource::File(path) | ConfigSource::OptionalFile(path) => {
                path.display().to_string()
            }
            ConfigSource::Resource { name, loader, .. } => {
                format!("resource {} ({})", name, loader.describe())
            }
            ConfigSource::Stream { origin, .. } | ConfigSource::Str { origin, .. } => {
                origin.clone()
            }
            ConfigSource::Environment { prefix, .. } => format!("environment {}_*", prefix),
            ConfigSource::Properties { prefix: Some(prefix), .. } => {
                format!("properties {}.*", prefix)
            }
            ConfigSource::Properties { prefix: None, .. } => "properties".to_string(),
        }
    }

    /// Reads and parses the source. `None` means the source is absent and contributes
    /// nothing.
    pub fn load(self) -> Result<Option<RawValue>, ConfigError> {
        let origin = self.origin();
        match self {
            ConfigSource::File(path) => load_file(&path, &origin).map(Some),
            ConfigSource::OptionalFile(path) => {
                if path.exists() {
                    load_file(&path, &origin).map(Some)
                } else {
                    Ok(None)
                }
            }
            ConfigSource::Resource {
                name,
                format,
                loader,
            } => {
                let bytes = loader.load(&name)?.ok_or_else(|| ConfigError::Read {
                    path: name.clone(),
                    reason: format!("not found in {}", loader.describe()),
                })?;
                let text = utf8(bytes, &origin)?;
                RawValue::parse(&text, format, &origin).map(Some)
            }
            ConfigSource::Stream {
                format, mut reader, ..
            } => {
                let mut text = String::new();
                reader
                    .read_to_string(&mut text)
                    .map_err(|e| ConfigError::IO(origin.clone(), e))?;
                RawValue::parse(&text, format, &origin).map(Some)
            }
            ConfigSource::Str { format, text, .. } => {
                RawValue::parse(&text, format, &origin).map(Some)
            }
            ConfigSource::Environment { prefix, vars } => {
                let env_prefix = format!("{}_", prefix);
                let pairs = vars.into_iter().filter_map(|(name, value)| {
                    let rest = name.strip_prefix(&env_prefix)?;
                    if rest.is_empty() {
                        return None;
                    }
                    let key = rest
                        .to_ascii_lowercase()
                        .split(ENV_NESTING_SEPARATOR)
                        .collect::<Vec<_>>()
                        .join(".");
                    Some((key, RawValue::String(value)))
                });
                Ok(Some(RawValue::from_dotted_pairs(pairs)))
            }
            ConfigSource::Properties { prefix, entries } => {
                let pairs = entries.into_iter().filter_map(|(key, value)| {
                    let key = match &prefix {
                        Some(prefix) => key
                            .strip_prefix(prefix.as_str())?
                            .strip_prefix('.')?
                            .to_string(),
                        None => key,
                    };
                    Some((key, RawValue::String(value)))
                });
                Ok(Some(RawValue::from_dotted_pairs(pairs)))
            }
        }
    }
}

impl fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigSource({})", self.origin())
    }
}

fn load_file(path: &Path, origin: &str) -> Result<RawValue, ConfigError> {
    let format = Format::from_path(path).ok_or_else(|| ConfigError::Parse {
        origin: origin.to_string(),
        message: "cannot tell the format from the file extension".to_string(),
    })?;
    let text = fs::read_to_string(path).map_err(|e| ConfigError::IO(origin.to_string(), e))?;
    RawValue::parse(&text, format, origin)
}

fn utf8(bytes: Vec<u8>, origin: &str) -> Result<String, ConfigError> {
    String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}
