//! Core configuration.
//!
//! Loaded from environment variables or a TOML file. Only the store location
//! and the fixed distinguished-name attributes are configurable; key size,
//! exponent, validity period and hash are fixed by the data model (see
//! [`crate::crypto`]).

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Distinguished-name attributes placed alongside the common name in every
/// certificate subject (and, since certificates are self-signed, issuer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectTemplate {
    /// Country (C)
    pub country: String,
    /// State or province (ST)
    pub state: String,
    /// Locality (L)
    pub locality: String,
    /// Organization (O)
    pub organization: String,
}

impl Default for SubjectTemplate {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            state: "State".to_string(),
            locality: "City".to_string(),
            organization: "PKI System".to_string(),
        }
    }
}

/// Configuration for a DocSign instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding `keys/`, `certs/` and `signed_docs/`
    pub root_dir: PathBuf,
    /// Subject attributes for newly issued certificates
    pub subject: SubjectTemplate,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            subject: SubjectTemplate::default(),
        }
    }
}

impl CoreConfig {
    /// Configuration rooted at `root_dir` with default subject attributes
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `DOCSIGN_HOME` | `root_dir` |
    /// | `DOCSIGN_COUNTRY` | `subject.country` |
    /// | `DOCSIGN_STATE` | `subject.state` |
    /// | `DOCSIGN_LOCALITY` | `subject.locality` |
    /// | `DOCSIGN_ORG` | `subject.organization` |
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            root_dir: env::var("DOCSIGN_HOME")
                .map(PathBuf::from)
                .unwrap_or(defaults.root_dir),
            subject: SubjectTemplate {
                country: env::var("DOCSIGN_COUNTRY").unwrap_or(defaults.subject.country),
                state: env::var("DOCSIGN_STATE").unwrap_or(defaults.subject.state),
                locality: env::var("DOCSIGN_LOCALITY").unwrap_or(defaults.subject.locality),
                organization: env::var("DOCSIGN_ORG").unwrap_or(defaults.subject.organization),
            },
        }
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject subject attributes that cannot be placed in an RFC 4514 name
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("country", &self.subject.country),
            ("state", &self.subject.state),
            ("locality", &self.subject.locality),
            ("organization", &self.subject.organization),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("subject.{} must not be empty", field)));
            }
            if value.chars().any(|c| matches!(c, ',' | '+' | '=' | '"' | '\\' | '<' | '>' | ';')) {
                return Err(Error::ConfigError(format!(
                    "subject.{} contains a reserved character: {}",
                    field, value
                )));
            }
        }

        // Encoded as PrintableString, so letters only
        let country = &self.subject.country;
        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::ConfigError(format!(
                "subject.country must be a two-letter code, got {}",
                self.subject.country
            )));
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_source_subject() {
        let config = CoreConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.subject.country, "US");
        assert_eq!(config.subject.organization, "PKI System");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CoreConfig::from_toml_str(
            r#"
            root_dir = "/var/lib/docsign"

            [subject]
            organization = "Acme"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/var/lib/docsign"));
        assert_eq!(config.subject.organization, "Acme");
        assert_eq!(config.subject.locality, "City");
    }

    #[test]
    fn test_rejects_reserved_characters() {
        let result = CoreConfig::from_toml_str(
            r#"
            [subject]
            organization = "Acme, Inc"
            "#,
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_bad_country() {
        let result = CoreConfig::from_toml_str(
            r#"
            [subject]
            country = "USA"
            "#,
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));

        let mut config = CoreConfig::default();
        for country in ["U_", "ü1", "é", "U1", "  "] {
            config.subject.country = country.to_string();
            assert!(
                matches!(config.validate(), Err(Error::ConfigError(_))),
                "{:?} accepted",
                country
            );
        }

        config.subject.country = "DE".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            CoreConfig::from_toml_str("root_dir = ["),
            Err(Error::ConfigError(_))
        ));
    }
}
