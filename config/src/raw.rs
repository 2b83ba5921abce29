// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Untyped configuration trees.
//!
//! Every source, whatever its syntax, is normalized into a [`RawValue`] whose top level
//! is an object. Keys containing dots are expanded into nested objects, so `a.b = 1`
//! and `a { b = 1 }` describe the same tree. Trees from successive sources are combined
//! by [`MergedTree`].

use crate::error::ConfigError;
use std::{collections::BTreeMap, convert::TryFrom, fmt, path::Path};

pub type RawObject = BTreeMap<String, RawValue>;

#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<RawValue>),
    Object(RawObject),
}

/// Text syntaxes a source can be written in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// Infers the format from a file extension. `.conf` files are TOML.
    pub fn from_path(path: &Path) -> Option<Format> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "toml" | "conf" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Toml => "toml",
            Format::Yaml => "yaml",
            Format::Json => "json",
        };
        write!(f, "{}", name)
    }
}

impl RawValue {
    /// Parses `text` into a tree whose top level is an object. `origin` names the source
    /// in error messages.
    pub fn parse(text: &str, format: Format, origin: &str) -> Result<RawValue, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            origin: origin.to_string(),
            message,
        };
        let value = match format {
            Format::Toml => {
                let value: toml::Value =
                    toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                RawValue::from(value)
            }
            Format::Yaml => {
                if text.trim().is_empty() {
                    RawValue::Object(RawObject::new())
                } else {
                    let value: serde_yaml::Value =
                        serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                    RawValue::try_from(value).map_err(parse_error)?
                }
            }
            Format::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                RawValue::try_from(value).map_err(parse_error)?
            }
        };
        match value {
            RawValue::Object(_) => Ok(value.expand_dotted_keys()),
            RawValue::Null => Ok(RawValue::Object(RawObject::new())),
            other => Err(parse_error(format!(
                "top level must be an object, found {}",
                other.type_name()
            ))),
        }
    }

    /// Builds an object tree from `(dotted key, value)` pairs.
    pub fn from_dotted_pairs<I, K>(pairs: I) -> RawValue
    where
        I: IntoIterator<Item = (K, RawValue)>,
        K: Into<String>,
    {
        let object = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        RawValue::Object(object).expand_dotted_keys()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::List(_) => "list",
            RawValue::Object(_) => "object",
        }
    }

    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            RawValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up a dotted path.
    pub fn get_path(&self, path: &str) -> Option<&RawValue> {
        path.split('.')
            .try_fold(self, |node, segment| node.as_object()?.get(segment))
    }

    /// Rewrites object keys containing dots into nested objects, recursively.
    pub fn expand_dotted_keys(self) -> RawValue {
        match self {
            RawValue::Object(object) => {
                let mut expanded = RawObject::new();
                for (key, value) in object {
                    let value = value.expand_dotted_keys();
                    let mut segments: Vec<&str> = key.split('.').collect();
                    let last = segments.pop().unwrap_or_default().to_string();
                    let nested = segments.into_iter().rev().fold(
                        (last, value),
                        |(inner_key, inner_value), segment| {
                            let mut wrapper = RawObject::new();
                            wrapper.insert(inner_key, inner_value);
                            (segment.to_string(), RawValue::Object(wrapper))
                        },
                    );
                    insert_merging(&mut expanded, nested.0, nested.1);
                }
                RawValue::Object(expanded)
            }
            RawValue::List(items) => {
                RawValue::List(items.into_iter().map(RawValue::expand_dotted_keys).collect())
            }
            other => other,
        }
    }

    /// Renders the tree as TOML. Nulls have no TOML form and are dropped.
    pub fn to_toml(&self) -> Option<toml::Value> {
        Some(match self {
            RawValue::Null => return None,
            RawValue::Bool(b) => toml::Value::Boolean(*b),
            RawValue::Int(i) => toml::Value::Integer(*i),
            RawValue::Float(f) => toml::Value::Float(*f),
            RawValue::String(s) => toml::Value::String(s.clone()),
            RawValue::List(items) => {
                toml::Value::Array(items.iter().filter_map(RawValue::to_toml).collect())
            }
            RawValue::Object(object) => toml::Value::Table(
                object
                    .iter()
                    .filter_map(|(k, v)| Some((k.clone(), v.to_toml()?)))
                    .collect(),
            ),
        })
    }
}

fn insert_merging(object: &mut RawObject, key: String, value: RawValue) {
    match (object.get_mut(&key), value) {
        (Some(RawValue::Object(existing)), RawValue::Object(incoming)) => {
            for (k, v) in incoming {
                insert_merging(existing, k, v);
            }
        }
        (_, value) => {
            object.insert(key, value);
        }
    }
}

impl From<toml::Value> for RawValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => RawValue::String(s),
            toml::Value::Integer(i) => RawValue::Int(i),
            toml::Value::Float(f) => RawValue::Float(f),
            toml::Value::Boolean(b) => RawValue::Bool(b),
            toml::Value::Datetime(d) => RawValue::String(d.to_string()),
            toml::Value::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
            toml::Value::Table(table) => RawValue::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, RawValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for RawValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, String> {
        Ok(match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => number(n.as_i64(), n.as_f64(), &n)?,
            serde_json::Value::String(s) => RawValue::String(s),
            serde_json::Value::Array(items) => RawValue::List(
                items
                    .into_iter()
                    .map(RawValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(map) => RawValue::Object(
                map.into_iter()
                    .map(|(k, v)| Ok((k, RawValue::try_from(v)?)))
                    .collect::<Result<_, String>>()?,
            ),
        })
    }
}

impl TryFrom<serde_yaml::Value> for RawValue {
    type Error = String;

    fn try_from(value: serde_yaml::Value) -> Result<Self, String> {
        Ok(match value {
            serde_yaml::Value::Null => RawValue::Null,
            serde_yaml::Value::Bool(b) => RawValue::Bool(b),
            serde_yaml::Value::Number(n) => number(n.as_i64(), n.as_f64(), &n)?,
            serde_yaml::Value::String(s) => RawValue::String(s),
            serde_yaml::Value::Sequence(items) => RawValue::List(
                items
                    .into_iter()
                    .map(RawValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut object = RawObject::new();
                for (k, v) in map {
                    let key = match k {
                        serde_yaml::Value::String(s) => s,
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        other => return Err(format!("unsupported mapping key {:?}", other)),
                    };
                    object.insert(key, RawValue::try_from(v)?);
                }
                RawValue::Object(object)
            }
        })
    }
}

fn number(
    int: Option<i64>,
    float: Option<f64>,
    text: &dyn fmt::Display,
) -> Result<RawValue, String> {
    // Integers beyond i64 are rejected rather than silently turned into floats.
    let text = text.to_string();
    match (int, float) {
        (Some(i), _) => Ok(RawValue::Int(i)),
        (None, Some(f)) if text.parse::<u64>().is_err() => Ok(RawValue::Float(f)),
        _ => Err(format!("number {} is out of range", text)),
    }
}

/// Accumulates source trees in order, remembering which source defined each leaf.
#[derive(Clone, Debug)]
pub struct MergedTree {
    root: RawObject,
    origins: BTreeMap<String, String>,
}

/// What happens when a later source defines a leaf an earlier source already defined.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergePolicy {
    /// The later value wins.
    Override,
    /// A different later value is a [`ConfigError::MergeConflict`].
    Forbid,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Override
    }
}

impl Default for MergedTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MergedTree {
    pub fn new() -> Self {
        Self {
            root: RawObject::new(),
            origins: BTreeMap::new(),
        }
    }

    /// Merges `layer` over everything merged so far. Objects are merged key by key,
    /// anything else replaces what was there. Under [`MergePolicy::Forbid`] every
    /// conflicting leaf is reported.
    pub fn merge(
        &mut self,
        layer: RawValue,
        origin: &str,
        policy: MergePolicy,
    ) -> Result<(), ConfigError> {
        let layer = match layer {
            RawValue::Object(object) => object,
            other => {
                return Err(ConfigError::Parse {
                    origin: origin.to_string(),
                    message: format!("top level must be an object, found {}", other.type_name()),
                })
            }
        };
        let mut conflicts = vec![];
        merge_object(
            &mut self.root,
            layer,
            "",
            origin,
            policy,
            &mut self.origins,
            &mut conflicts,
        );
        match ConfigError::from_problems(conflicts) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn root(&self) -> &RawObject {
        &self.root
    }

    /// The source that defined `path`, or the first source defining anything beneath it.
    pub fn origin_of(&self, path: &str) -> Option<String> {
        origin_under(&self.origins, path)
    }

    pub fn into_raw(self) -> RawValue {
        RawValue::Object(self.root)
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn merge_object(
    base: &mut RawObject,
    layer: RawObject,
    prefix: &str,
    origin: &str,
    policy: MergePolicy,
    origins: &mut BTreeMap<String, String>,
    conflicts: &mut Vec<ConfigError>,
) {
    for (key, incoming) in layer {
        let path = join(prefix, &key);
        match (base.get_mut(&key), incoming) {
            (Some(RawValue::Object(existing)), RawValue::Object(incoming)) => {
                merge_object(existing, incoming, &path, origin, policy, origins, conflicts);
            }
            (None, RawValue::Object(incoming)) => {
                let mut fresh = RawObject::new();
                merge_object(&mut fresh, incoming, &path, origin, policy, origins, conflicts);
                base.insert(key, RawValue::Object(fresh));
            }
            (Some(existing), incoming) => {
                if policy == MergePolicy::Forbid && *existing != incoming {
                    let first = origin_under(origins, &path)
                        .unwrap_or_else(|| "an earlier source".to_string());
                    conflicts.push(ConfigError::MergeConflict {
                        path,
                        first,
                        second: origin.to_string(),
                    });
                    continue;
                }
                forget_under(origins, &path);
                origins.insert(path, origin.to_string());
                *existing = incoming;
            }
            (None, incoming) => {
                origins.insert(path, origin.to_string());
                base.insert(key, incoming);
            }
        }
    }
}

fn origin_under(origins: &BTreeMap<String, String>, path: &str) -> Option<String> {
    if let Some(origin) = origins.get(path) {
        return Some(origin.clone());
    }
    let prefix = format!("{}.", path);
    origins
        .iter()
        .find(|(key, _)| key.starts_with(&prefix))
        .map(|(_, origin)| origin.clone())
}

fn forget_under(origins: &mut BTreeMap<String, String>, path: &str) {
    let prefix = format!("{}.", path);
    origins.retain(|key, _| key != path && !key.starts_with(&prefix));
}
