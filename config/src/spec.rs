// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration schemas.
//!
//! A [`Specification`] is an ordered list of property declarations. Specifications nest
//! by reference: an object property points at an already built specification, so the
//! nesting is always a tree.

use crate::{
    configuration::Configuration,
    error::ConfigError,
    raw::RawObject,
    value::Value,
};
use std::{collections::BTreeSet, fmt, sync::Arc};

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyType {
    String,
    Bool,
    Int,
    Float,
    Duration,
    /// A string restricted to the listed spellings, matched case-insensitively.
    Enum(Vec<String>),
    List(Box<PropertyType>),
    Object(Arc<Specification>),
}

impl PropertyType {
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyType::Enum(variants.into_iter().map(Into::into).collect())
    }

    pub fn list(item_type: PropertyType) -> Self {
        PropertyType::List(Box::new(item_type))
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, PropertyType::List(_) | PropertyType::Object(_))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::String => write!(f, "string"),
            PropertyType::Bool => write!(f, "boolean"),
            PropertyType::Int => write!(f, "integer"),
            PropertyType::Float => write!(f, "float"),
            PropertyType::Duration => write!(f, "duration"),
            PropertyType::Enum(variants) => write!(f, "one of [{}]", variants.join(", ")),
            PropertyType::List(item_type) => write!(f, "list of {}", item_type),
            PropertyType::Object(spec) => write!(f, "object {}", spec.name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    pub key: String,
    pub ty: PropertyType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
}

#[derive(Debug, PartialEq)]
pub struct Specification {
    name: String,
    properties: Vec<PropertyDescriptor>,
}

impl Specification {
    pub fn builder(name: &str) -> SpecificationBuilder {
        SpecificationBuilder {
            name: name.to_string(),
            properties: vec![],
            problems: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn descriptor(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Resolves a dotted path through nested object declarations.
    pub fn descriptor_at(&self, path: &str) -> Option<&PropertyDescriptor> {
        let (head, rest) = split_path(path);
        let descriptor = self.descriptor(head)?;
        match (rest, &descriptor.ty) {
            (None, _) => Some(descriptor),
            (Some(rest), PropertyType::Object(nested)) => nested.descriptor_at(rest),
            (Some(_), _) => None,
        }
    }
}

pub(crate) fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.find('.') {
        Some(i) => (&path[..i], Some(&path[i + 1..])),
        None => (path, None),
    }
}

pub struct SpecificationBuilder {
    name: String,
    properties: Vec<PropertyDescriptor>,
    problems: Vec<String>,
}

impl SpecificationBuilder {
    /// A property every build must find in some source.
    pub fn required(self, key: &str, ty: PropertyType, description: &str) -> Self {
        self.declare(key, ty, true, None, description)
    }

    /// A property that may be absent.
    pub fn optional(self, key: &str, ty: PropertyType, description: &str) -> Self {
        self.declare(key, ty, false, None, description)
    }

    /// A property that takes `default` when no source defines it.
    pub fn with_default<V: Into<Value>>(
        self,
        key: &str,
        ty: PropertyType,
        default: V,
        description: &str,
    ) -> Self {
        self.declare(key, ty, false, Some(default.into()), description)
    }

    /// An object property described by `spec`.
    pub fn nested(
        self,
        key: &str,
        spec: Arc<Specification>,
        required: bool,
        description: &str,
    ) -> Self {
        self.declare(key, PropertyType::Object(spec), required, None, description)
    }

    /// An object property that resolves from the nested defaults when absent. Every
    /// property of `spec` must be optional.
    pub fn nested_with_defaults(
        mut self,
        key: &str,
        spec: Arc<Specification>,
        description: &str,
    ) -> Self {
        match Configuration::resolve_raw(&spec, &RawObject::new()) {
            Ok(defaults) => self.declare(
                key,
                PropertyType::Object(spec),
                false,
                Some(Value::Object(defaults)),
                description,
            ),
            Err(e) => {
                self.problems
                    .push(format!("{} has no complete defaults: {}", key, e));
                self
            }
        }
    }

    fn declare(
        mut self,
        key: &str,
        ty: PropertyType,
        required: bool,
        default: Option<Value>,
        description: &str,
    ) -> Self {
        if key.is_empty() || key.contains('.') {
            self.problems
                .push(format!("{:?} is not a valid property key", key));
        }
        if let Some(default) = &default {
            if !default.conforms_to(&ty) {
                self.problems.push(format!(
                    "default of {} is a {}, expected {}",
                    key,
                    default.type_name(),
                    ty
                ));
            }
        }
        if let PropertyType::Enum(variants) = &ty {
            if variants.is_empty() {
                self.problems.push(format!("{} has no enum variants", key));
            }
        }
        self.properties.push(PropertyDescriptor {
            key: key.to_string(),
            ty,
            required,
            default,
            description: description.to_string(),
        });
        self
    }

    pub fn build(mut self) -> Result<Arc<Specification>, ConfigError> {
        let mut seen = BTreeSet::new();
        for property in &self.properties {
            if !seen.insert(property.key.as_str()) {
                self.problems
                    .push(format!("duplicate property {}", property.key));
            }
        }
        if self.problems.is_empty() {
            Ok(Arc::new(Specification {
                name: self.name,
                properties: self.properties,
            }))
        } else {
            Err(ConfigError::InvalidSpecification {
                name: self.name,
                reason: self.problems.join("; "),
            })
        }
    }
}
