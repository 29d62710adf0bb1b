//! # Signing Engine
//!
//! Detached RSA-PSS signatures made with the active session's key, and
//! persistence of the signed triple.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNING PIPELINE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Option<&Session> ──► sign(bytes) ──► SignatureBundle                  │
//! │        │                                 ├── signature (RSA-PSS)       │
//! │        └── None → NotAuthenticated       ├── certificate_pem (copy)    │
//! │                                          └── signer                    │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                             persist(store, docname, bytes, bundle)     │
//! │                                 1. signed_docs/<docname>               │
//! │                                 2. signed_docs/<docname>.sig           │
//! │                                 3. signed_docs/<docname>_cert.pem      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persisting under a name that already exists overwrites the previous
//! triple. The three writes are independent and not rolled back on failure.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crypto::{sign_pss, DocumentSignature};
use crate::error::{Error, Result};
use crate::identity::CERTIFICATE_SUFFIX;
use crate::session::Session;
use crate::storage::{ArtifactStore, Category};

/// Extension of a detached signature artifact
pub const SIGNATURE_EXTENSION: &str = ".sig";

/// Output of a signing operation, ready to be persisted
#[derive(Debug, Clone)]
pub struct SignatureBundle {
    /// Detached RSA-PSS signature over the document bytes
    pub signature: DocumentSignature,
    /// Copy of the signer's certificate as read at login
    pub certificate_pem: Vec<u8>,
    /// Username of the signing session
    pub signer: String,
    /// When the signature was made
    pub signed_at: DateTime<Utc>,
}

/// Where a signed triple was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedDocumentPaths {
    /// `signed_docs/<docname>`
    pub document: PathBuf,
    /// `signed_docs/<docname>.sig`
    pub signature: PathBuf,
    /// `signed_docs/<docname>_cert.pem`
    pub certificate: PathBuf,
}

/// Sign `document` with the session's private key
///
/// Fails with `NotAuthenticated` when `session` is `None`.
pub fn sign(session: Option<&Session>, document: &[u8]) -> Result<SignatureBundle> {
    let session = session.ok_or(Error::NotAuthenticated)?;

    let signature = sign_pss(session.private_key(), document)?;
    tracing::debug!(
        signer = session.current_user(),
        document_len = document.len(),
        signature_len = signature.len(),
        "Signed document"
    );

    Ok(SignatureBundle {
        signature,
        certificate_pem: session.certificate_pem().to_vec(),
        signer: session.current_user().to_string(),
        signed_at: crate::time::now(),
    })
}

/// Write the signed triple to `signed_docs/`
///
/// Order: document, signature, certificate copy.
pub fn persist(
    store: &ArtifactStore,
    doc_name: &str,
    document: &[u8],
    bundle: &SignatureBundle,
) -> Result<SignedDocumentPaths> {
    let paths = SignedDocumentPaths {
        document: store.save(Category::SignedDocs, doc_name, document)?,
        signature: store.save(
            Category::SignedDocs,
            &signature_name(doc_name),
            bundle.signature.as_bytes(),
        )?,
        certificate: store.save(
            Category::SignedDocs,
            &certificate_copy_name(doc_name),
            &bundle.certificate_pem,
        )?,
    };

    tracing::info!(
        document = doc_name,
        signer = bundle.signer.as_str(),
        signed_at = %crate::time::format_utc(&bundle.signed_at),
        "Stored signed document"
    );
    Ok(paths)
}

/// Base name of a document path, used as `<docname>`
pub fn document_name(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidArtifactName(path.display().to_string()))
}

/// `<docname>.sig`
pub fn signature_name(doc_name: &str) -> String {
    format!("{}{}", doc_name, SIGNATURE_EXTENSION)
}

/// `<docname>_cert.pem`
pub fn certificate_copy_name(doc_name: &str) -> String {
    format!("{}{}", doc_name, CERTIFICATE_SUFFIX)
}

/// Whether a `signed_docs/` entry is a signature or certificate copy
/// rather than a document
pub fn is_companion_artifact(name: &str) -> bool {
    name.ends_with(SIGNATURE_EXTENSION) || name.ends_with(CERTIFICATE_SUFFIX)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubjectTemplate;
    use crate::crypto::{certificate_public_key, parse_certificate_pem, verify_pss};
    use crate::identity::IdentityRegistry;
    use crate::session::SessionManager;
    use tempfile::TempDir;

    fn logged_in(username: &str) -> (TempDir, ArtifactStore, SessionManager) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let identity = IdentityRegistry::new(store.clone(), SubjectTemplate::default())
            .register(username)
            .unwrap();
        let mut manager = SessionManager::new();
        manager
            .login(&identity.paths().private_key, &identity.paths().certificate)
            .unwrap();
        (dir, store, manager)
    }

    #[test]
    fn test_sign_requires_session() {
        assert!(matches!(sign(None, b"hello"), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn test_sign_bundle() {
        let (_dir, _store, manager) = logged_in("alice");
        let session = manager.current().unwrap();

        let bundle = sign(Some(session), b"hello").unwrap();
        assert_eq!(bundle.signer, "alice");
        assert!(bundle.signed_at >= session.logged_in_at());
        assert!(bundle.signed_at <= crate::time::now());
        assert_eq!(bundle.certificate_pem, session.certificate_pem());

        let cert = parse_certificate_pem(&bundle.certificate_pem).unwrap();
        let key = certificate_public_key(&cert).unwrap();
        assert!(verify_pss(&key, b"hello", bundle.signature.as_bytes()));
    }

    #[test]
    fn test_signatures_are_not_deterministic() {
        let (_dir, _store, manager) = logged_in("alice");
        let a = sign(manager.current(), b"same bytes").unwrap();
        let b = sign(manager.current(), b"same bytes").unwrap();
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_persist_triple_and_overwrite() {
        let (dir, store, manager) = logged_in("alice");

        let first = sign(manager.current(), b"first").unwrap();
        let paths = persist(&store, "report.txt", b"first", &first).unwrap();

        let signed = dir.path().join("signed_docs");
        assert_eq!(paths.document, signed.join("report.txt"));
        assert_eq!(paths.signature, signed.join("report.txt.sig"));
        assert_eq!(paths.certificate, signed.join("report.txt_cert.pem"));
        assert_eq!(std::fs::read(&paths.signature).unwrap(), first.signature.as_bytes());

        let second = sign(manager.current(), b"second").unwrap();
        persist(&store, "report.txt", b"second", &second).unwrap();
        assert_eq!(std::fs::read(&paths.document).unwrap(), b"second");
        assert_eq!(std::fs::read(&paths.signature).unwrap(), second.signature.as_bytes());
        assert_eq!(store.list(Category::SignedDocs).unwrap().len(), 3);
    }

    #[test]
    fn test_document_name() {
        assert_eq!(document_name("/tmp/reports/q3.pdf").unwrap(), "q3.pdf");
        assert_eq!(document_name("notes").unwrap(), "notes");
        assert!(matches!(document_name("/"), Err(Error::InvalidArtifactName(_))));
        assert!(matches!(document_name(".."), Err(Error::InvalidArtifactName(_))));
    }

    #[test]
    fn test_companion_names() {
        assert_eq!(signature_name("a.txt"), "a.txt.sig");
        assert_eq!(certificate_copy_name("a.txt"), "a.txt_cert.pem");
        assert!(is_companion_artifact("a.txt.sig"));
        assert!(is_companion_artifact("a.txt_cert.pem"));
        assert!(!is_companion_artifact("a.txt"));
    }
}
