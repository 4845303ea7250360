use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_yaml::Error as YamlError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum QualiError {
    /// Cannot determine a single target paragraph (empty line, multi-line or
    /// multiple selections). Aborts the operation with no state mutated.
    #[error("Cannot determine the target paragraph: {0}")]
    AmbiguousScope(String),
    #[error("Expected a block anchor but found none: {0}")]
    MissingAnchor(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// A template or frontmatter lacks required structure. Fatal for the
    /// operation; the user must fix the template before retrying.
    #[error("Invalid template: {0}")]
    Template(String),
    #[error("File system error: {0}")]
    Io(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Participant dialog cancellation event")]
    OperationCancelled,
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<io::Error> for QualiError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => QualiError::NotFound(format!("{x}")),
            io::ErrorKind::AlreadyExists => QualiError::AlreadyExists(format!("{x}")),
            io::ErrorKind::PermissionDenied => QualiError::PermissionDenied,
            _ => QualiError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<StripPrefixError> for QualiError {
    fn from(src: StripPrefixError) -> QualiError {
        QualiError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for QualiError {
    fn from(src: toml::de::Error) -> QualiError {
        QualiError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for QualiError {
    fn from(src: toml::ser::Error) -> QualiError {
        QualiError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<YamlError> for QualiError {
    fn from(src: YamlError) -> QualiError {
        QualiError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<RegexError> for QualiError {
    fn from(x: RegexError) -> Self {
        QualiError::Serialization(format!("Regex parse failed: {x}"))
    }
}

impl From<fmt::Error> for QualiError {
    fn from(x: fmt::Error) -> Self {
        QualiError::Custom(format!("{x}"))
    }
}
