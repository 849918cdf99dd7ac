//! Error types and result definitions.
//!
//! Every failure of a configuration read or write surfaces as a
//! [`ConfigError`]. In-memory edits and `restore_defaults` never fail.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// A single field whose raw on-disk value could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: expected {expected}, got {actual}")]
pub struct MalformedValue {
    /// Property field the value belongs to.
    pub field: String,
    /// Human readable description of the accepted values.
    pub expected: String,
    /// The raw value as found on disk.
    pub actual: String,
}

/// List of malformed fields collected while reading a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MalformedValues(pub Vec<MalformedValue>);

impl fmt::Display for MalformedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Errors raised by the configuration core.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file to read does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not a well-formed configuration object.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// One or more fields hold values their property cannot decode.
    #[error("invalid values in {}: {values}", .path.display())]
    InvalidValues {
        path: PathBuf,
        values: MalformedValues,
    },

    /// A single value was rejected by its property.
    #[error(transparent)]
    MalformedValue(#[from] MalformedValue),

    /// A schema or language definition is inconsistent.
    #[error("schema error: {0}")]
    Schema(String),

    /// No schema is registered under the requested name.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// No property carries the requested field.
    #[error("unknown property: {0}")]
    UnknownProperty(String),
}

impl ConfigError {
    /// Maps an I/O failure on `path` to the matching error kind.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound { path }
        } else {
            ConfigError::Io { path, source }
        }
    }

    /// Whether this error reports malformed file contents.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConfigError::Parse { .. } | ConfigError::InvalidValues { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished() {
        let err = ConfigError::from_io(
            "missing.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let err = ConfigError::from_io(
            "locked.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_values_lists_every_field() {
        let err = ConfigError::InvalidValues {
            path: PathBuf::from("cfg.json"),
            values: MalformedValues(vec![
                MalformedValue {
                    field: "fov_value".into(),
                    expected: "integer".into(),
                    actual: "\"wide\"".into(),
                },
                MalformedValue {
                    field: "enable_braid".into(),
                    expected: "boolean".into(),
                    actual: "3".into(),
                },
            ]),
        };
        let text = err.to_string();
        assert!(text.contains("fov_value"));
        assert!(text.contains("enable_braid"));
        assert!(err.is_parse_error());
    }
}
