//! # Error Handling
//!
//! Error types for DocSign Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── InvalidUsername       - Username is empty / not alphanumeric  │
//! │  │   └── DuplicateIdentity     - Username already registered           │
//! │  │                                                                      │
//! │  ├── Session Errors                                                    │
//! │  │   ├── InvalidKeyFilename    - Key file not named <user>_private.pem │
//! │  │   ├── NotAuthenticated      - Signing attempted without a session   │
//! │  │   └── NoActiveSession       - Logout attempted without a session    │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── KeyParseError         - Private key PEM did not decode        │
//! │  │   ├── CertParseError        - Certificate PEM did not decode        │
//! │  │   ├── KeyGenerationFailed   - RSA key generation failed             │
//! │  │   ├── CertificateBuildFailed- Certificate construction failed       │
//! │  │   ├── SigningError          - RSA-PSS signing failed                │
//! │  │   └── CertificateSignatureInvalid - Bad self-signature              │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── FileNotFound          - Artifact or input file missing        │
//! │  │   ├── StorageError          - Any other I/O failure                 │
//! │  │   └── InvalidArtifactName   - Name is not a single path component   │
//! │  │                                                                      │
//! │  └── Config Errors                                                     │
//! │      ├── ConfigError           - Bad configuration file / value        │
//! │      └── EncodingError         - Serialization failure                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed signature verification is *not* an error. It is reported as
//! [`VerificationResult::Invalid`](crate::verifier::VerificationResult).

use thiserror::Error;

/// Result type alias for DocSign Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for DocSign Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Identity Errors (200-299)
    // ========================================================================

    /// Username is empty or contains characters outside `[A-Za-z0-9]`
    #[error("Invalid username '{0}': must be non-empty and contain only letters and numbers")]
    InvalidUsername(String),

    /// An identity with this username already exists
    #[error("User '{0}' already exists")]
    DuplicateIdentity(String),

    // ========================================================================
    // Session Errors (300-399)
    // ========================================================================

    /// Private key file does not follow the `<username>_private.pem` convention
    #[error("Invalid private key file name: {0}")]
    InvalidKeyFilename(String),

    /// Operation requires an authenticated session
    #[error("Not authenticated. Log in with a private key and certificate first.")]
    NotAuthenticated,

    /// Logout called with no session active
    #[error("No active session")]
    NoActiveSession,

    // ========================================================================
    // Crypto Errors (400-499)
    // ========================================================================

    /// Private key could not be parsed
    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    /// Certificate could not be parsed
    #[error("Failed to parse certificate: {0}")]
    CertParseError(String),

    /// RSA key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Certificate construction or signing failed
    #[error("Failed to build certificate: {0}")]
    CertificateBuildFailed(String),

    /// Signing the document failed
    #[error("Signing failed: {0}")]
    SigningError(String),

    /// Certificate is not signed by its own key
    #[error("Certificate signature invalid: {0}")]
    CertificateSignatureInvalid(String),

    // ========================================================================
    // Storage Errors (500-599)
    // ========================================================================

    /// File or artifact not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Any other I/O failure while reading or writing artifacts
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Artifact name is empty or not a single path component
    #[error("Invalid artifact name: {0:?}")]
    InvalidArtifactName(String),

    // ========================================================================
    // Config Errors (600-699)
    // ========================================================================

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Encoding a value failed
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl Error {
    /// Numeric error code for front-ends
    ///
    /// - 200-299: Identity
    /// - 300-399: Session
    /// - 400-499: Crypto
    /// - 500-599: Storage
    /// - 600-699: Config
    pub fn code(&self) -> i32 {
        match self {
            // Identity (200-299)
            Error::InvalidUsername(_) => 200,
            Error::DuplicateIdentity(_) => 201,

            // Session (300-399)
            Error::InvalidKeyFilename(_) => 300,
            Error::NotAuthenticated => 301,
            Error::NoActiveSession => 302,

            // Crypto (400-499)
            Error::KeyParseError(_) => 400,
            Error::CertParseError(_) => 401,
            Error::KeyGenerationFailed(_) => 402,
            Error::CertificateBuildFailed(_) => 403,
            Error::SigningError(_) => 404,
            Error::CertificateSignatureInvalid(_) => 405,

            // Storage (500-599)
            Error::FileNotFound(_) => 500,
            Error::StorageError(_) => 501,
            Error::InvalidArtifactName(_) => 502,

            // Config (600-699)
            Error::ConfigError(_) => 600,
            Error::EncodingError(_) => 601,
        }
    }

    /// Check if this error can be fixed by the user changing their input
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::InvalidUsername(_)
                | Error::DuplicateIdentity(_)
                | Error::InvalidKeyFilename(_)
                | Error::NotAuthenticated
                | Error::FileNotFound(_)
                | Error::KeyParseError(_)
                | Error::CertParseError(_)
                | Error::InvalidArtifactName(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(err.to_string()),
            _ => Error::StorageError(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::EncodingError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
