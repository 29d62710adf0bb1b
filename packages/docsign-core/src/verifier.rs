//! # Verification Engine
//!
//! Stateless verification of a (document, signature, certificate) triple.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VERIFICATION OUTCOMES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  certificate ──► parse ──► RSA public key ──► self-signature ──► PSS    │
//! │                    │             │                 │            │       │
//! │                    ✗             ✗                 ✗            ✗       │
//! │                    └─────────────┴────────┬────────┴────────────┘       │
//! │                                           ▼                             │
//! │                                 Invalid { fixed reason }               │
//! │                                                                         │
//! │  all steps pass ──► Valid { common_name from the subject }             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The certificate must carry a valid signature by its own key, so a
//! certificate whose subject was edited after issuance is rejected even
//! though its public key still matches the document signature.
//!
//! [`verify`] reports every failure with the same reason. [`diagnose`]
//! returns the specific [`VerifyFailure`] for logs and tooling.

use serde::Serialize;
use thiserror::Error;

use crate::crypto::{
    certificate_public_key, common_name_of, parse_certificate_pem, verify_pss,
    verify_self_signature,
};

/// Reason carried by every [`VerificationResult::Invalid`]
pub const INVALID_REASON: &str = "signature verification failed";

/// Outcome of verifying a signed triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// The signature matches
    Valid {
        /// Common name of the certificate subject
        common_name: String,
    },
    /// Anything else
    Invalid {
        /// Always [`INVALID_REASON`]
        reason: String,
    },
}

impl VerificationResult {
    /// Whether the result is `Valid`
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid { .. })
    }

    /// The signer's common name, if valid
    pub fn common_name(&self) -> Option<&str> {
        match self {
            VerificationResult::Valid { common_name } => Some(common_name),
            VerificationResult::Invalid { .. } => None,
        }
    }
}

/// Why a triple failed to verify
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// The certificate bytes are not a PEM X.509 certificate
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// The certificate's key is not an RSA key
    #[error("unsupported certificate key: {0}")]
    UnsupportedKey(String),

    /// The certificate is not signed by its own key
    #[error("certificate self-signature invalid: {0}")]
    BadSelfSignature(String),

    /// The certificate subject has no common name
    #[error("certificate subject has no common name")]
    MissingCommonName,

    /// The signature does not match the document under the certificate's key
    #[error("signature does not match document")]
    SignatureMismatch,
}

/// Verify `signature` over `document` with the key in `certificate`
///
/// Every failure cause collapses to `Invalid` with [`INVALID_REASON`].
pub fn verify(document: &[u8], signature: &[u8], certificate: &[u8]) -> VerificationResult {
    match diagnose(document, signature, certificate) {
        Ok(common_name) => {
            tracing::debug!(common_name = common_name.as_str(), "Signature valid");
            VerificationResult::Valid { common_name }
        }
        Err(failure) => {
            tracing::debug!(%failure, "Signature invalid");
            VerificationResult::Invalid {
                reason: INVALID_REASON.to_string(),
            }
        }
    }
}

/// Verify and return the specific failure cause
///
/// On success returns the certificate subject's common name.
pub fn diagnose(
    document: &[u8],
    signature: &[u8],
    certificate: &[u8],
) -> std::result::Result<String, VerifyFailure> {
    let cert = parse_certificate_pem(certificate)
        .map_err(|e| VerifyFailure::MalformedCertificate(e.to_string()))?;
    let public_key =
        certificate_public_key(&cert).map_err(|e| VerifyFailure::UnsupportedKey(e.to_string()))?;
    verify_self_signature(&cert).map_err(|e| VerifyFailure::BadSelfSignature(e.to_string()))?;

    if !verify_pss(&public_key, document, signature) {
        return Err(VerifyFailure::SignatureMismatch);
    }

    common_name_of(&cert.tbs_certificate.subject).ok_or(VerifyFailure::MissingCommonName)
}

// ============================================================================
// TESTS
// ============================================================================
