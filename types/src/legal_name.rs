// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::Error;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

const MAX_ATTRIBUTE_LENGTH: usize = 128;

/// X.500 distinguished name identifying a network participant, e.g.
/// `O=Bank A, L=London, C=GB`. Organisation, locality and country are mandatory; common
/// name, organisation unit and state are optional.
///
/// Two names are equal when their attributes are equal, regardless of the order or
/// spacing used in the text they were parsed from.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LegalName {
    organisation: String,
    locality: String,
    country: String,
    common_name: Option<String>,
    organisation_unit: Option<String>,
    state: Option<String>,
}

impl LegalName {
    pub fn new(organisation: &str, locality: &str, country: &str) -> Result<Self, Error> {
        let name = Self {
            organisation: organisation.to_string(),
            locality: locality.to_string(),
            country: country.to_string(),
            common_name: None,
            organisation_unit: None,
            state: None,
        };
        name.validate(&format!("O={}, L={}, C={}", organisation, locality, country))?;
        Ok(name)
    }

    pub fn with_common_name(mut self, common_name: &str) -> Result<Self, Error> {
        self.common_name = Some(common_name.to_string());
        self.validate(&self.to_string())?;
        Ok(self)
    }

    pub fn organisation(&self) -> &str {
        &self.organisation
    }

    pub fn locality(&self) -> &str {
        &self.locality
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub fn organisation_unit(&self) -> Option<&str> {
        self.organisation_unit.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn validate(&self, text: &str) -> Result<(), Error> {
        let invalid = |reason: String| Error::InvalidLegalName {
            name: text.to_string(),
            reason,
        };

        let attributes = [
            ("O", Some(&self.organisation)),
            ("L", Some(&self.locality)),
            ("C", Some(&self.country)),
            ("CN", self.common_name.as_ref()),
            ("OU", self.organisation_unit.as_ref()),
            ("ST", self.state.as_ref()),
        ];
        for (attribute, value) in attributes.iter() {
            if let Some(value) = value {
                if value.trim().is_empty() {
                    return Err(invalid(format!("{} must not be blank", attribute)));
                }
                if value.trim() != value.as_str() {
                    return Err(invalid(format!(
                        "{} must not have leading or trailing whitespace",
                        attribute
                    )));
                }
                if value.len() > MAX_ATTRIBUTE_LENGTH {
                    return Err(invalid(format!(
                        "{} exceeds {} characters",
                        attribute, MAX_ATTRIBUTE_LENGTH
                    )));
                }
                if value.contains(|c: char| c == ',' || c == '=') {
                    return Err(invalid(format!("{} contains a reserved character", attribute)));
                }
            }
        }

        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid(format!(
                "country code {:?} is not a two letter ISO 3166 code",
                self.country
            )));
        }
        Ok(())
    }
}

impl FromStr for LegalName {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidLegalName {
            name: text.to_string(),
            reason,
        };

        let mut organisation = None;
        let mut locality = None;
        let mut country = None;
        let mut common_name = None;
        let mut organisation_unit = None;
        let mut state = None;

        for component in text.split(',') {
            let mut parts = component.splitn(2, '=');
            let attribute = parts.next().unwrap_or_default().trim().to_ascii_uppercase();
            let value = parts
                .next()
                .ok_or_else(|| invalid(format!("{:?} is not of the form ATTR=value", component)))?
                .trim()
                .to_string();

            let slot = match attribute.as_str() {
                "O" => &mut organisation,
                "L" => &mut locality,
                "C" => &mut country,
                "CN" => &mut common_name,
                "OU" => &mut organisation_unit,
                "ST" => &mut state,
                other => return Err(invalid(format!("unsupported attribute {:?}", other))),
            };
            if slot.replace(value).is_some() {
                return Err(invalid(format!("duplicate attribute {}", attribute)));
            }
        }

        let name = LegalName {
            organisation: organisation
                .ok_or_else(|| invalid("missing organisation (O)".to_string()))?,
            locality: locality.ok_or_else(|| invalid("missing locality (L)".to_string()))?,
            country: country.ok_or_else(|| invalid("missing country (C)".to_string()))?,
            common_name,
            organisation_unit,
            state,
        };
        name.validate(text)?;
        Ok(name)
    }
}

impl fmt::Display for LegalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(common_name) = &self.common_name {
            write!(f, "CN={}, ", common_name)?;
        }
        if let Some(organisation_unit) = &self.organisation_unit {
            write!(f, "OU={}, ", organisation_unit)?;
        }
        write!(f, "O={}, L={}, ", self.organisation, self.locality)?;
        if let Some(state) = &self.state {
            write!(f, "ST={}, ", state)?;
        }
        write!(f, "C={}", self.country)
    }
}

impl Serialize for LegalName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LegalName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
