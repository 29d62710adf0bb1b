//! # DocSign Core
//!
//! Self-signed RSA identities and detached RSA-PSS document signatures,
//! stored as plain PEM and binary files on the local filesystem.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DOCSIGN CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │   Session   │  │   Signer    │  │   Verifier   │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Register  │─►│ - Login     │─►│ - RSA-PSS   │  │ - Stateless  │   │
//! │  │ - Load      │  │ - Logout    │  │ - Persist   │  │ - Valid /    │   │
//! │  │ - Audit     │  │ - Current   │  │   triple    │  │   Invalid    │   │
//! │  └──────┬──────┘  └─────────────┘  └──────┬──────┘  └──────────────┘   │
//! │         │                                 │                             │
//! │         └────────────────┬────────────────┘                             │
//! │                          ▼                                              │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────┐  │
//! │  │          Storage            │  │            Crypto               │  │
//! │  │                             │  │                                 │  │
//! │  │ - keys/  certs/             │  │ - RSA-2048 key pairs            │  │
//! │  │ - signed_docs/              │  │ - Self-signed X.509             │  │
//! │  └─────────────────────────────┘  │ - RSA-PSS (MGF1-SHA-256)        │  │
//! │                                   └─────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Store location and certificate subject attributes
//! - [`crypto`] - RSA keys, certificates and signatures
//! - [`storage`] - Filesystem artifact store
//! - [`identity`] - Registration and lookup of users
//! - [`session`] - Login / logout and the active session
//! - [`signer`] - Signing with the active session
//! - [`verifier`] - Verification of signed triples
//! - [`status`] - Store summary
//!
//! ## Trust Model
//!
//! Every certificate is a self-signed leaf. A `Valid` verification result
//! means the certificate carries a valid signature by its own key and the
//! document signature was made by that same key. It says nothing about who
//! issued that certificate. There is no chain
//! validation, no revocation and no encryption of private keys at rest.
//!
//! ## Example
//!
//! ```ignore
//! use docsign_core::{CoreConfig, DocSign};
//!
//! let mut docsign = DocSign::open(CoreConfig::with_root("/tmp/pki"))?;
//! let alice = docsign.register("alice")?;
//! docsign.login(&alice.paths().private_key, &alice.paths().certificate)?;
//! let signed = docsign.sign_bytes("hello.txt", b"hello")?;
//! let result = docsign.verify_files(&signed.document, &signed.signature, &signed.certificate)?;
//! assert_eq!(result.common_name(), Some("alice"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod session;
pub mod signer;
pub mod status;
pub mod storage;
/// Wall-clock helpers.
pub mod time;
pub mod verifier;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{CoreConfig, SubjectTemplate};
pub use crypto::{CertificateInfo, DocumentSignature, RsaKeyPair};
pub use error::{Error, Result};
pub use identity::{ArtifactPaths, Identity, IdentityAudit, IdentityRegistry};
pub use session::{Session, SessionManager};
pub use signer::{SignatureBundle, SignedDocumentPaths};
pub use status::SystemStatus;
pub use storage::{ArtifactStore, Category};
pub use verifier::{VerificationResult, VerifyFailure};

use std::path::Path;

// ============================================================================
// CORE INSTANCE
// ============================================================================

/// A DocSign instance over one artifact store
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                        DOCSIGN LIFECYCLE                                │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  1. Open                                                               │
/// │     DocSign::open(config) ──► validate config, create store dirs       │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  2. Register (any number of users)                                     │
/// │     register(username) ──► keys/<u>_private.pem, keys/<u>_public.pem,  │
/// │                            certs/<u>_cert.pem                          │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  3. Login                                                              │
/// │     login(key_path, cert_path) ──► one active session                  │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  4. Sign                                                               │
/// │     sign_document(path) ──► signed_docs/<name>, .sig, _cert.pem        │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  5. Logout                                                             │
/// │     logout() ──► key dropped                                           │
/// │                                                                         │
/// │  verify_files(doc, sig, cert) works at any point, logged in or not.    │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug)]
pub struct DocSign {
    config: CoreConfig,
    store: ArtifactStore,
    registry: IdentityRegistry,
    sessions: SessionManager,
}

impl DocSign {
    /// Open (creating if needed) the store described by `config`
    pub fn open(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Opening DocSign v{} at {}",
            env!("CARGO_PKG_VERSION"),
            config.root_dir.display()
        );

        let store = ArtifactStore::open(&config.root_dir)?;
        let registry = IdentityRegistry::new(store.clone(), config.subject.clone());

        Ok(Self {
            config,
            store,
            registry,
            sessions: SessionManager::new(),
        })
    }

    /// Register a new user
    pub fn register(&self, username: &str) -> Result<Identity> {
        self.registry.register(username)
    }

    /// Log in with a private key file and certificate file
    pub fn login(
        &mut self,
        private_key_path: impl AsRef<Path>,
        certificate_path: impl AsRef<Path>,
    ) -> Result<&Session> {
        self.sessions.login(private_key_path, certificate_path)
    }

    /// Log out the active session
    pub fn logout(&mut self) -> Result<()> {
        self.sessions.logout()
    }

    /// Sign the file at `path` and store the triple under its base name
    pub fn sign_document(&self, path: impl AsRef<Path>) -> Result<SignedDocumentPaths> {
        if !self.sessions.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }

        let path = path.as_ref();
        let name = signer::document_name(path)?;
        let document = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
            _ => Error::from(e),
        })?;

        self.sign_bytes(&name, &document)
    }

    /// Sign `document` and store the triple as `name`
    pub fn sign_bytes(&self, name: &str, document: &[u8]) -> Result<SignedDocumentPaths> {
        // Validate the name before spending a signature on it
        self.store.path(Category::SignedDocs, name)?;

        let bundle = signer::sign(self.sessions.current(), document)?;
        signer::persist(&self.store, name, document, &bundle)
    }

    /// Verify a signed triple read from three files
    ///
    /// I/O failures are errors; anything wrong with the contents is
    /// reported as [`VerificationResult::Invalid`].
    pub fn verify_files(
        &self,
        document: impl AsRef<Path>,
        signature: impl AsRef<Path>,
        certificate: impl AsRef<Path>,
    ) -> Result<VerificationResult> {
        let document = read_input(document.as_ref())?;
        let signature = read_input(signature.as_ref())?;
        let certificate = read_input(certificate.as_ref())?;
        Ok(verifier::verify(&document, &signature, &certificate))
    }

    /// Users, signed documents and the logged-in user
    pub fn status(&self) -> Result<SystemStatus> {
        SystemStatus::collect(&self.store, self.sessions.current_user())
    }

    /// Configuration this instance was opened with
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The underlying artifact store
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The identity registry
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    /// Username of the active session, if any
    pub fn current_user(&self) -> Option<&str> {
        self.sessions.current_user()
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
        _ => Error::StorageError(format!("{}: {}", path.display(), e)),
    })
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of DocSign Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::OS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, DocSign) {
        let dir = TempDir::new().unwrap();
        let docsign = DocSign::open(CoreConfig::with_root(dir.path())).unwrap();
        (dir, docsign)
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, version());
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        let mut config = CoreConfig::with_root(dir.path());
        config.subject.country = "USA".to_string();
        assert!(matches!(DocSign::open(config), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_sign_requires_login() {
        let (dir, docsign) = open();
        let doc = dir.path().join("doc.txt");
        std::fs::write(&doc, b"content").unwrap();

        assert!(matches!(docsign.sign_document(&doc), Err(Error::NotAuthenticated)));
        assert!(matches!(docsign.sign_bytes("doc.txt", b"x"), Err(Error::NotAuthenticated)));
        assert!(docsign.status().unwrap().signed_documents.is_empty());
    }

    #[test]
    fn test_sign_document_and_verify_files() {
        let (dir, mut docsign) = open();
        let alice = docsign.register("alice").unwrap();
        docsign
            .login(&alice.paths().private_key, &alice.paths().certificate)
            .unwrap();

        let doc = dir.path().join("contract.txt");
        std::fs::write(&doc, b"terms").unwrap();
        let signed = docsign.sign_document(&doc).unwrap();
        assert_eq!(signed.document, dir.path().join("signed_docs/contract.txt"));

        let result = docsign
            .verify_files(&signed.document, &signed.signature, &signed.certificate)
            .unwrap();
        assert_eq!(result.common_name(), Some("alice"));

        let status = docsign.status().unwrap();
        assert_eq!(status.users, vec!["alice"]);
        assert_eq!(status.signed_documents, vec!["contract.txt"]);
        assert_eq!(status.current_user.as_deref(), Some("alice"));

        docsign.logout().unwrap();
        assert!(docsign.current_user().is_none());
        assert!(matches!(docsign.logout(), Err(Error::NoActiveSession)));
    }

    #[test]
    fn test_sign_missing_document() {
        let (dir, mut docsign) = open();
        let alice = docsign.register("alice").unwrap();
        docsign
            .login(&alice.paths().private_key, &alice.paths().certificate)
            .unwrap();

        let result = docsign.sign_document(dir.path().join("nope.txt"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_verify_files_missing_input() {
        let (dir, docsign) = open();
        let missing = dir.path().join("missing");
        assert!(matches!(
            docsign.verify_files(&missing, &missing, &missing),
            Err(Error::FileNotFound(_))
        ));
    }
}
