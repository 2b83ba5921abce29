// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("Error accessing {0}: {1}")]
    IO(String, #[source] std::io::Error),
    #[error("Property {path} expects {expected} but found {found}")]
    WrongType {
        path: String,
        expected: String,
        found: String,
    },
    #[error("Missing required property {path} ({description})")]
    Missing { path: String, description: String },
    #[error("Property {path} is defined by {first} and redefined by {second}")]
    MergeConflict {
        path: String,
        first: String,
        second: String,
    },
    #[error("Unknown property {path} in {origin}")]
    UnknownProperty { path: String, origin: String },
    #[error("Cannot read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Invalid specification {name}: {reason}")]
    InvalidSpecification { name: String, reason: String },
    #[error("Invalid configuration: {}", describe_all(.0))]
    Invalid(Vec<ConfigError>),
}

impl ConfigError {
    /// Folds the problems of one build: a single problem is reported as itself.
    pub(crate) fn from_problems(mut problems: Vec<ConfigError>) -> Option<ConfigError> {
        match problems.len() {
            0 => None,
            1 => problems.pop(),
            _ => Some(ConfigError::Invalid(problems)),
        }
    }

    /// Flattened list of the individual problems.
    pub fn problems(&self) -> Vec<&ConfigError> {
        match self {
            ConfigError::Invalid(problems) => problems.iter().flat_map(|p| p.problems()).collect(),
            other => vec![other],
        }
    }
}

fn describe_all(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
