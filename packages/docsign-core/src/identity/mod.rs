//! # Identity Module
//!
//! Creation and lookup of per-user identities.
//!
//! ## Identity Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         IDENTITY SYSTEM                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  username "alice"  ([A-Za-z0-9]+, unique in the store)                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────┐      ┌──────────────────────────────────┐         │
//! │  │ RSA-2048 key    │─────►│ Self-signed X.509 certificate    │         │
//! │  │ pair (e=65537)  │ signs│ subject = issuer = CN=alice      │         │
//! │  └────────┬────────┘      │ 365 days, random serial          │         │
//! │           │               └───────────────┬──────────────────┘         │
//! │           ▼                               ▼                            │
//! │  keys/alice_private.pem            certs/alice_cert.pem                │
//! │  keys/alice_public.pem                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Registration Flow
//!
//! 1. Validate the username and reject it if `keys/<username>_private.pem`
//!    already exists.
//! 2. Generate the key pair and build the certificate (blocking).
//! 3. Write private key, public key and certificate, in that order.
//!
//! Identities are immutable once created; there is no key rotation.
//!
//! The three writes are independent. If one fails, earlier artifacts stay
//! on disk. [`IdentityRegistry::audit`] tells a caller which artifacts of an
//! identity exist so a partial registration can be detected before retrying.

mod username;

pub use username::{
    certificate_name, private_key_name, public_key_name, username_from_private_key_name,
    validate_username, CERTIFICATE_SUFFIX, PRIVATE_KEY_SUFFIX, PUBLIC_KEY_SUFFIX,
};

use std::path::PathBuf;

use rsa::RsaPublicKey;
use serde::Serialize;

use crate::config::SubjectTemplate;
use crate::crypto::{
    build_self_signed, certificate_pem, certificate_public_key, parse_certificate_pem,
    Certificate, CertificateInfo, RsaKeyPair,
};
use crate::error::{Error, Result};
use crate::storage::{ArtifactStore, Category};

/// Paths of the three artifacts that make up an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// `keys/<username>_private.pem`
    pub private_key: PathBuf,
    /// `keys/<username>_public.pem`
    pub public_key: PathBuf,
    /// `certs/<username>_cert.pem`
    pub certificate: PathBuf,
}

impl ArtifactPaths {
    fn for_user(store: &ArtifactStore, username: &str) -> Result<Self> {
        Ok(Self {
            private_key: store.path(Category::Keys, &private_key_name(username))?,
            public_key: store.path(Category::Keys, &public_key_name(username))?,
            certificate: store.path(Category::Certs, &certificate_name(username))?,
        })
    }
}

/// A registered user: username, certificate and artifact locations
///
/// The private key is never held here; it stays in the store until a
/// session loads it.
#[derive(Debug, Clone)]
pub struct Identity {
    username: String,
    certificate: Certificate,
    certificate_pem: String,
    info: CertificateInfo,
    paths: ArtifactPaths,
}

impl Identity {
    /// The username (certificate common name)
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The self-signed certificate
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// PEM encoding of the certificate
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// Certificate summary (serial, validity, fingerprint)
    pub fn certificate_info(&self) -> &CertificateInfo {
        &self.info
    }

    /// Where the identity's artifacts live
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// The public key embedded in the certificate
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        certificate_public_key(&self.certificate)
    }
}

/// Which artifacts of an identity exist in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityAudit {
    /// `keys/<username>_private.pem` exists
    pub private_key: bool,
    /// `keys/<username>_public.pem` exists
    pub public_key: bool,
    /// `certs/<username>_cert.pem` exists
    pub certificate: bool,
}

impl IdentityAudit {
    /// All three artifacts are present
    pub fn is_complete(&self) -> bool {
        self.private_key && self.public_key && self.certificate
    }

    /// None of the artifacts are present
    pub fn is_absent(&self) -> bool {
        !(self.private_key || self.public_key || self.certificate)
    }

    /// Some but not all artifacts are present (interrupted registration)
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && !self.is_absent()
    }
}

/// Creates and loads identities in an [`ArtifactStore`]
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    store: ArtifactStore,
    subject: SubjectTemplate,
}

impl IdentityRegistry {
    /// Registry over `store`, issuing certificates with `subject` attributes
    pub fn new(store: ArtifactStore, subject: SubjectTemplate) -> Self {
        Self { store, subject }
    }

    /// Register a new identity
    ///
    /// ## Errors
    ///
    /// - `InvalidUsername` if the name is empty or not alphanumeric
    /// - `DuplicateIdentity` if `keys/<username>_private.pem` already exists
    /// - `StorageError` if a write fails; earlier writes are not rolled back
    pub fn register(&self, username: &str) -> Result<Identity> {
        let username = validate_username(username)?;

        if self.store.exists(Category::Keys, &private_key_name(&username))? {
            return Err(Error::DuplicateIdentity(username));
        }

        tracing::info!(username = username.as_str(), "Generating RSA key pair");
        let keypair = RsaKeyPair::generate()?;

        tracing::debug!(username = username.as_str(), "Creating self-signed certificate");
        let certificate = build_self_signed(&keypair, &username, &self.subject)?;

        let private_pem = keypair.private_key_pem()?;
        let public_pem = keypair.public_key_pem()?;
        let cert_pem = certificate_pem(&certificate)?;

        let private_key =
            self.store.save(Category::Keys, &private_key_name(&username), private_pem.as_bytes())?;
        let public_key =
            self.store.save(Category::Keys, &public_key_name(&username), public_pem.as_bytes())?;
        let cert_path =
            self.store.save(Category::Certs, &certificate_name(&username), cert_pem.as_bytes())?;

        let info = CertificateInfo::from_certificate(&certificate)?;
        tracing::info!(
            username = username.as_str(),
            serial = info.serial_hex.as_str(),
            not_after = %info.not_after,
            "Registered identity"
        );

        Ok(Identity {
            username,
            certificate,
            certificate_pem: cert_pem,
            info,
            paths: ArtifactPaths {
                private_key,
                public_key,
                certificate: cert_path,
            },
        })
    }

    /// Load an existing identity's certificate from the store
    ///
    /// The private key is not read.
    pub fn load(&self, username: &str) -> Result<Identity> {
        let username = validate_username(username)?;
        let paths = ArtifactPaths::for_user(&self.store, &username)?;

        if !self.store.exists(Category::Keys, &private_key_name(&username))? {
            return Err(Error::FileNotFound(paths.private_key.display().to_string()));
        }

        let cert_bytes = self.store.load(Category::Certs, &certificate_name(&username))?;
        let certificate = parse_certificate_pem(&cert_bytes)?;
        let info = CertificateInfo::from_certificate(&certificate)?;

        if info.common_name != username {
            return Err(Error::CertParseError(format!(
                "certificate common name '{}' does not match user '{}'",
                info.common_name, username
            )));
        }

        let certificate_pem = String::from_utf8(cert_bytes)
            .map_err(|e| Error::CertParseError(format!("certificate is not UTF-8: {}", e)))?;

        Ok(Identity {
            username,
            certificate,
            certificate_pem,
            info,
            paths,
        })
    }

    /// Whether a private key artifact exists for `username`
    pub fn exists(&self, username: &str) -> Result<bool> {
        let username = validate_username(username)?;
        self.store.exists(Category::Keys, &private_key_name(&username))
    }

    /// Usernames that own a private key artifact, sorted
    pub fn list_users(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list(Category::Keys)?
            .iter()
            .filter_map(|name| username_from_private_key_name(name))
            .map(str::to_string)
            .collect())
    }

    /// Report which of the three artifacts of `username` exist
    pub fn audit(&self, username: &str) -> Result<IdentityAudit> {
        let username = validate_username(username)?;
        let audit = IdentityAudit {
            private_key: self.store.exists(Category::Keys, &private_key_name(&username))?,
            public_key: self.store.exists(Category::Keys, &public_key_name(&username))?,
            certificate: self.store.exists(Category::Certs, &certificate_name(&username))?,
        };
        if audit.is_partial() {
            tracing::warn!(username = username.as_str(), ?audit, "Identity is incomplete");
        }
        Ok(audit)
    }

    /// Artifact paths for `username`, whether or not they exist
    pub fn paths(&self, username: &str) -> Result<ArtifactPaths> {
        let username = validate_username(username)?;
        ArtifactPaths::for_user(&self.store, &username)
    }
}

// ============================================================================
// TESTS
// ============================================================================
