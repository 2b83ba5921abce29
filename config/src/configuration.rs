// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolved configurations.
//!
//! A [`Configuration`] is an immutable snapshot of typed values checked against a
//! [`Specification`]. It is cheap to clone. [`Configuration::mutable`] forks a
//! [`MutableConfiguration`] that shares storage with its source until its first write,
//! so writes never leak into the snapshot it came from or into sibling forks.

use crate::{
    error::ConfigError,
    raw::{MergePolicy, MergedTree, RawObject, RawValue},
    source::ConfigSource,
    spec::{split_path, PropertyType, Specification},
    value::{coerce, ConfigType, Property, Value},
};
use std::{collections::BTreeMap, fmt, ops::Deref, sync::Arc};

#[derive(Clone)]
pub struct Configuration {
    spec: Arc<Specification>,
    values: Arc<BTreeMap<String, Value>>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn spec(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// Reads a property that must have a value.
    pub fn get<T: ConfigType>(&self, property: &Property<T>) -> Result<T, ConfigError> {
        self.get_optional(property)?.ok_or_else(|| ConfigError::Read {
            path: property.key().to_string(),
            reason: "no value".to_string(),
        })
    }

    /// Reads a property that may be absent. Reading a key the specification does not
    /// declare is an error rather than `None`.
    pub fn get_optional<T: ConfigType>(
        &self,
        property: &Property<T>,
    ) -> Result<Option<T>, ConfigError> {
        let path = property.key();
        if self.spec.descriptor_at(path).is_none() {
            return Err(ConfigError::Read {
                path: path.to_string(),
                reason: format!("not declared by {}", self.spec.name()),
            });
        }
        match self.value_at(path) {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| ConfigError::Read {
                path: path.to_string(),
                reason: format!("holds a {}, not a {}", value.type_name(), T::type_name()),
            }),
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Reads a dotted path through nested objects.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        let (head, rest) = split_path(path);
        match (self.values.get(head)?, rest) {
            (value, None) => Some(value),
            (Value::Object(nested), Some(rest)) => nested.value_at(rest),
            (_, Some(_)) => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.value_at(path).is_some()
    }

    /// Keys that hold a value, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn mutable(&self) -> MutableConfiguration {
        MutableConfiguration {
            inner: self.clone(),
        }
    }

    /// The resolved values as a source tree that builds back into an equal configuration.
    pub fn to_raw(&self) -> RawValue {
        RawValue::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), value.to_raw()))
                .collect(),
        )
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let value = self.to_raw().to_toml().unwrap_or_else(|| {
            toml::Value::Table(toml::value::Table::new())
        });
        toml::to_string(&value).map_err(|e| ConfigError::Parse {
            origin: format!("rendering of {}", self.spec.name()),
            message: e.to_string(),
        })
    }

    /// Resolves `tree` against `spec` leniently, without provenance.
    pub(crate) fn resolve_raw(
        spec: &Arc<Specification>,
        tree: &RawObject,
    ) -> Result<Configuration, ConfigError> {
        let mut resolver = Resolver {
            strict: false,
            merged: None,
            problems: vec![],
        };
        let configuration = resolver.resolve(spec, Some(tree), "");
        match ConfigError::from_problems(resolver.problems) {
            Some(error) => Err(error),
            None => Ok(configuration),
        }
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

/// A private, writable fork of a [`Configuration`].
#[derive(Clone, Debug, PartialEq)]
pub struct MutableConfiguration {
    inner: Configuration,
}

impl MutableConfiguration {
    /// Writes a property, type checked against its declaration. Writing a nested object
    /// replaces it as a whole; writing below it through a dotted key replaces only that
    /// leaf.
    pub fn set<T: ConfigType>(
        &mut self,
        property: &Property<T>,
        value: T,
    ) -> Result<(), ConfigError> {
        let path = property.key();
        let value = value.into_value().map_err(|reason| ConfigError::WrongType {
            path: path.to_string(),
            expected: T::type_name(),
            found: reason,
        })?;
        self.set_value(path, value)
    }

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        let (head, rest) = split_path(path);
        let descriptor = self.inner.spec.descriptor(head).ok_or_else(|| ConfigError::Read {
            path: path.to_string(),
            reason: format!("not declared by {}", self.inner.spec.name()),
        })?;
        let value = match rest {
            None => {
                if !value.conforms_to(&descriptor.ty) {
                    return Err(ConfigError::WrongType {
                        path: path.to_string(),
                        expected: descriptor.ty.to_string(),
                        found: value.type_name().to_string(),
                    });
                }
                value
            }
            Some(rest) => {
                let mut nested = match self.inner.values.get(head) {
                    Some(Value::Object(nested)) => nested.mutable(),
                    _ => {
                        return Err(ConfigError::Read {
                            path: path.to_string(),
                            reason: format!("{} holds no object", head),
                        })
                    }
                };
                nested.set_value(rest, value)?;
                Value::Object(nested.freeze())
            }
        };
        Arc::make_mut(&mut self.inner.values).insert(head.to_string(), value);
        Ok(())
    }

    /// Removes a value, reverting to the declared default when there is one. Required
    /// properties cannot be unset.
    pub fn unset<T>(&mut self, property: &Property<T>) -> Result<(), ConfigError> {
        self.unset_path(property.key())
    }

    pub fn unset_path(&mut self, path: &str) -> Result<(), ConfigError> {
        let (head, rest) = split_path(path);
        let descriptor = self.inner.spec.descriptor(head).ok_or_else(|| ConfigError::Read {
            path: path.to_string(),
            reason: format!("not declared by {}", self.inner.spec.name()),
        })?;
        match rest {
            None => {
                if descriptor.required {
                    return Err(ConfigError::Missing {
                        path: path.to_string(),
                        description: descriptor.description.clone(),
                    });
                }
                let default = descriptor.default.clone();
                let values = Arc::make_mut(&mut self.inner.values);
                match default {
                    Some(default) => values.insert(head.to_string(), default),
                    None => values.remove(head),
                };
            }
            Some(rest) => {
                let mut nested = match self.inner.values.get(head) {
                    Some(Value::Object(nested)) => nested.mutable(),
                    _ => return Ok(()),
                };
                nested.unset_path(rest)?;
                Arc::make_mut(&mut self.inner.values)
                    .insert(head.to_string(), Value::Object(nested.freeze()));
            }
        }
        Ok(())
    }

    pub fn freeze(self) -> Configuration {
        self.inner
    }
}

impl Deref for MutableConfiguration {
    type Target = Configuration;

    fn deref(&self) -> &Configuration {
        &self.inner
    }
}

/// Cascades sources in order, later sources over earlier ones, and resolves the result
/// against a specification.
#[derive(Default)]
pub struct ConfigurationBuilder {
    sources: Vec<ConfigSource>,
    policy: MergePolicy,
    strict: bool,
}

impl ConfigurationBuilder {
    pub fn from(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// In strict mode keys the specification does not declare are errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Loads every source, merges them and resolves the result. Parse and read errors
    /// stop the build at the failing source; everything else is collected so one build
    /// reports every problem.
    pub fn build(self, spec: &Arc<Specification>) -> Result<Configuration, ConfigError> {
        let mut merged = MergedTree::new();
        let mut problems = vec![];
        for source in self.sources {
            let origin = source.origin();
            if let Some(layer) = source.load()? {
                match merged.merge(layer, &origin, self.policy) {
                    Ok(()) => (),
                    Err(ConfigError::Invalid(conflicts)) => problems.extend(conflicts),
                    Err(e) => problems.push(e),
                }
            }
        }

        let mut resolver = Resolver {
            strict: self.strict,
            merged: Some(&merged),
            problems,
        };
        let configuration = resolver.resolve(spec, Some(merged.root()), "");
        match ConfigError::from_problems(resolver.problems) {
            Some(error) => Err(error),
            None => Ok(configuration),
        }
    }
}

struct Resolver<'a> {
    strict: bool,
    merged: Option<&'a MergedTree>,
    problems: Vec<ConfigError>,
}

impl<'a> Resolver<'a> {
    fn resolve(
        &mut self,
        spec: &Arc<Specification>,
        tree: Option<&RawObject>,
        prefix: &str,
    ) -> Configuration {
        let mut values = BTreeMap::new();
        for descriptor in spec.properties() {
            let path = join(prefix, &descriptor.key);
            let raw = tree
                .and_then(|tree| tree.get(&descriptor.key))
                .filter(|raw| **raw != RawValue::Null);
            let resolved = match raw {
                Some(raw) => self.resolve_value(raw, &descriptor.ty, &path),
                None => match &descriptor.default {
                    Some(default) => Some(default.clone()),
                    None if descriptor.required => {
                        self.problems.push(ConfigError::Missing {
                            path: path.clone(),
                            description: descriptor.description.clone(),
                        });
                        None
                    }
                    None => None,
                },
            };
            if let Some(value) = resolved {
                values.insert(descriptor.key.clone(), value);
            }
        }

        if self.strict {
            if let Some(tree) = tree {
                for key in tree.keys() {
                    if spec.descriptor(key).is_none() {
                        let path = join(prefix, key);
                        let origin = self
                            .merged
                            .and_then(|merged| merged.origin_of(&path))
                            .unwrap_or_else(|| "an unknown source".to_string());
                        self.problems
                            .push(ConfigError::UnknownProperty { path, origin });
                    }
                }
            }
        }

        Configuration {
            spec: spec.clone(),
            values: Arc::new(values),
        }
    }

    fn resolve_value(&mut self, raw: &RawValue, ty: &PropertyType, path: &str) -> Option<Value> {
        match (raw, ty) {
            (RawValue::Object(object), PropertyType::Object(nested)) => {
                Some(Value::Object(self.resolve(nested, Some(object), path)))
            }
            (RawValue::List(items), PropertyType::List(item_type)) if !item_type.is_scalar() => {
                let mut values = Vec::with_capacity(items.len());
                let mut complete = true;
                for (i, item) in items.iter().enumerate() {
                    match self.resolve_value(item, item_type, &format!("{}[{}]", path, i)) {
                        Some(value) => values.push(value),
                        None => complete = false,
                    }
                }
                if complete {
                    Some(Value::List(values))
                } else {
                    None
                }
            }
            _ => match coerce(raw, ty, path) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.problems.push(e);
                    None
                }
            },
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
