// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed values and the coercions from raw source values into them.

use crate::{configuration::Configuration, error::ConfigError, raw::RawValue, spec::PropertyType};
use std::{convert::TryFrom, marker::PhantomData, time::Duration};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
    List(Vec<Value>),
    Object(Configuration),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Whether the value may be stored under a property of type `ty` as is.
    pub fn conforms_to(&self, ty: &PropertyType) -> bool {
        match (self, ty) {
            (Value::String(_), PropertyType::String)
            | (Value::Bool(_), PropertyType::Bool)
            | (Value::Int(_), PropertyType::Int)
            | (Value::Float(_), PropertyType::Float)
            | (Value::Duration(_), PropertyType::Duration) => true,
            (Value::String(s), PropertyType::Enum(variants)) => variants.contains(s),
            (Value::List(items), PropertyType::List(item_type)) => {
                items.iter().all(|item| item.conforms_to(item_type))
            }
            (Value::Object(configuration), PropertyType::Object(spec)) => {
                configuration.spec() == spec
            }
            _ => false,
        }
    }

    pub fn to_raw(&self) -> RawValue {
        match self {
            Value::String(s) => RawValue::String(s.clone()),
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Int(i) => RawValue::Int(*i),
            Value::Float(f) => RawValue::Float(*f),
            Value::Duration(d) => RawValue::String(format_duration(*d)),
            Value::List(items) => RawValue::List(items.iter().map(Value::to_raw).collect()),
            Value::Object(configuration) => configuration.to_raw(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Configuration> for Value {
    fn from(configuration: Configuration) -> Self {
        Value::Object(configuration)
    }
}

/// Coerces a non-null raw scalar or list into `ty`. Objects are resolved by the caller
/// since they need the nested specification walk.
pub(crate) fn coerce(raw: &RawValue, ty: &PropertyType, path: &str) -> Result<Value, ConfigError> {
    let wrong_type = || ConfigError::WrongType {
        path: path.to_string(),
        expected: ty.to_string(),
        found: describe(raw),
    };

    match (ty, raw) {
        (_, RawValue::Object(_)) | (_, RawValue::Null) => Err(wrong_type()),
        (PropertyType::List(item_type), RawValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| coerce(item, item_type, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (PropertyType::List(item_type), RawValue::String(text)) if item_type.is_scalar() => {
            let items = text.trim();
            if items.is_empty() {
                return Ok(Value::List(vec![]));
            }
            items
                .split(',')
                .enumerate()
                .map(|(i, item)| {
                    coerce(
                        &RawValue::String(item.trim().to_string()),
                        item_type,
                        &format!("{}[{}]", path, i),
                    )
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        (_, RawValue::List(_)) | (PropertyType::List(_), _) | (PropertyType::Object(_), _) => {
            Err(wrong_type())
        }

        (PropertyType::String, RawValue::String(s)) => Ok(Value::String(s.clone())),
        (PropertyType::String, RawValue::Bool(b)) => Ok(Value::String(b.to_string())),
        (PropertyType::String, RawValue::Int(i)) => Ok(Value::String(i.to_string())),
        (PropertyType::String, RawValue::Float(f)) => Ok(Value::String(f.to_string())),

        (PropertyType::Bool, RawValue::Bool(b)) => Ok(Value::Bool(*b)),
        (PropertyType::Bool, RawValue::String(s)) => {
            parse_bool(s).map(Value::Bool).ok_or_else(wrong_type)
        }
        (PropertyType::Bool, _) => Err(wrong_type()),

        (PropertyType::Int, RawValue::Int(i)) => Ok(Value::Int(*i)),
        (PropertyType::Int, RawValue::Float(f)) if f.fract() == 0.0 && f.abs() < 9.0e18 => {
            Ok(Value::Int(*f as i64))
        }
        (PropertyType::Int, RawValue::String(s)) => {
            s.trim().parse().map(Value::Int).map_err(|_| wrong_type())
        }
        (PropertyType::Int, _) => Err(wrong_type()),

        (PropertyType::Float, RawValue::Float(f)) => Ok(Value::Float(*f)),
        (PropertyType::Float, RawValue::Int(i)) => Ok(Value::Float(*i as f64)),
        (PropertyType::Float, RawValue::String(s)) => {
            s.trim().parse().map(Value::Float).map_err(|_| wrong_type())
        }
        (PropertyType::Float, _) => Err(wrong_type()),

        (PropertyType::Duration, RawValue::Int(ms)) => u64::try_from(*ms)
            .map(|ms| Value::Duration(Duration::from_millis(ms)))
            .map_err(|_| wrong_type()),
        (PropertyType::Duration, RawValue::Float(ms)) if *ms >= 0.0 && *ms < 1.0e21 => {
            Ok(Value::Duration(Duration::from_secs_f64(ms / 1000.0)))
        }
        (PropertyType::Duration, RawValue::String(s)) => {
            parse_duration(s).map(Value::Duration).ok_or_else(wrong_type)
        }
        (PropertyType::Duration, _) => Err(wrong_type()),

        (PropertyType::Enum(variants), RawValue::String(s)) => variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(s.trim()))
            .map(|variant| Value::String(variant.clone()))
            .ok_or_else(wrong_type),
        (PropertyType::Enum(_), _) => Err(wrong_type()),
    }
}

fn describe(raw: &RawValue) -> String {
    match raw {
        RawValue::String(s) => format!("string {:?}", s),
        RawValue::Bool(b) => format!("boolean {}", b),
        RawValue::Int(i) => format!("integer {}", i),
        RawValue::Float(f) => format!("float {}", f),
        other => other.type_name().to_string(),
    }
}

/// `true`, `yes`, `on` and `1` are true; `false`, `no`, `off` and `0` are false.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        "us" | "micro" | "micros" | "microsecond" | "microseconds" => 1_000,
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1_000_000,
        "s" | "second" | "seconds" => NANOS_PER_SEC,
        "m" | "minute" | "minutes" => 60 * NANOS_PER_SEC,
        "h" | "hour" | "hours" => 3_600 * NANOS_PER_SEC,
        "d" | "day" | "days" => 86_400 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parses `30d`, `10 s`, `1.5h` or a bare number of milliseconds.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or_else(|| text.len());
    let (number, unit) = text.split_at(split);
    let unit = unit_nanos(unit.trim())?;
    if number.is_empty() {
        return None;
    }
    if number.contains('.') {
        let value: f64 = number.parse().ok()?;
        let secs = value * unit as f64 / 1e9;
        if !secs.is_finite() || secs >= u64::MAX as f64 {
            return None;
        }
        return Some(Duration::from_secs_f64(secs));
    }
    let nanos = number.parse::<u128>().ok()?.checked_mul(unit)?;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// Renders a duration in the largest unit that represents it exactly.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    let units: [(&str, u128); 6] = [
        ("d", 86_400 * NANOS_PER_SEC),
        ("h", 3_600 * NANOS_PER_SEC),
        ("m", 60 * NANOS_PER_SEC),
        ("s", NANOS_PER_SEC),
        ("ms", 1_000_000),
        ("us", 1_000),
    ];
    if nanos == 0 {
        return "0ms".to_string();
    }
    for (unit, size) in units.iter() {
        if nanos % size == 0 {
            return format!("{}{}", nanos / size, unit);
        }
    }
    format!("{}ns", nanos)
}

/// Rust types a property can be read as or written from.
pub trait ConfigType: Sized {
    fn type_name() -> String;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Result<Value, String>;
}

impl ConfigType for String {
    fn type_name() -> String {
        "string".into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        Ok(Value::String(self))
    }
}

impl ConfigType for bool {
    fn type_name() -> String {
        "boolean".into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        Ok(Value::Bool(self))
    }
}

macro_rules! integer_config_type {
    ($($t:ty),*) => {
        $(
            impl ConfigType for $t {
                fn type_name() -> String {
                    stringify!($t).into()
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$t>::try_from(*i).ok(),
                        _ => None,
                    }
                }

                fn into_value(self) -> Result<Value, String> {
                    i64::try_from(self)
                        .map(Value::Int)
                        .map_err(|_| format!("{} does not fit in a 64 bit integer", self))
                }
            }
        )*
    };
}

integer_config_type!(i32, i64, u16, u32, u64, usize);

impl ConfigType for f64 {
    fn type_name() -> String {
        "float".into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        Ok(Value::Float(self))
    }
}

impl ConfigType for Duration {
    fn type_name() -> String {
        "duration".into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        Ok(Value::Duration(self))
    }
}

impl ConfigType for Configuration {
    fn type_name() -> String {
        "object".into()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(configuration) => Some(configuration.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        Ok(Value::Object(self))
    }
}

impl<T: ConfigType> ConfigType for Vec<T> {
    fn type_name() -> String {
        format!("list<{}>", T::type_name())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn into_value(self) -> Result<Value, String> {
        self.into_iter()
            .map(T::into_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

/// Typed handle on a property, usually declared as a constant next to the specification
/// that declares the key. The key may be a dotted path into nested objects.
pub struct Property<T> {
    key: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _type: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property({})", self.key)
    }
}
