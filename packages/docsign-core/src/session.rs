//! # Session Module
//!
//! Login with a (private key, certificate) pair and hold the resulting
//! authenticated session.
//!
//! ## Session Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SESSION LIFECYCLE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────────┐   login(key, cert)    ┌──────────────────────┐      │
//! │   │  Logged out  │ ─────────────────────►│  Active Session      │      │
//! │   │  (None)      │                       │  current_user        │      │
//! │   │              │◄───────────────────── │  private key         │      │
//! │   └──────────────┘        logout()       │  certificate         │      │
//! │                                          └──────────┬───────────┘      │
//! │                                                     │ login(...)       │
//! │                                                     ▼                  │
//! │                                          replaces the previous session │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Login Checks
//!
//! In order, each failing fast:
//!
//! 1. The key file is named `<username>_private.pem` → `InvalidKeyFilename`
//! 2. The key file exists → `FileNotFound`
//! 3. The certificate file exists → `FileNotFound`
//! 4. The key decodes as an unencrypted RSA private key → `KeyParseError`
//! 5. The certificate decodes as X.509 → `CertParseError`
//!
//! Login does not check that the certificate's public key belongs to the
//! private key, nor that the certificate's common name equals the username
//! taken from the key file name. [`Session::key_matches_certificate`] reports
//! the first of these for callers that want to enforce it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::crypto::{certificate_public_key, parse_certificate_pem, parse_private_key_pem, Certificate};
use crate::error::{Error, Result};
use crate::identity::username_from_private_key_name;

/// An authenticated session
///
/// Holds the signing key in memory. Dropping the session zeroizes the key.
pub struct Session {
    current_user: String,
    private_key: RsaPrivateKey,
    certificate_path: PathBuf,
    certificate_pem: Vec<u8>,
    certificate: Certificate,
    logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Username taken from the private key file name
    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    /// The loaded signing key
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Path the certificate was loaded from
    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    /// Certificate bytes exactly as read at login
    pub fn certificate_pem(&self) -> &[u8] {
        &self.certificate_pem
    }

    /// Parsed certificate
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// When the session was established
    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    /// Whether the certificate embeds the public half of the session key
    ///
    /// Not checked at login.
    pub fn key_matches_certificate(&self) -> bool {
        match certificate_public_key(&self.certificate) {
            Ok(public_key) => public_key == self.private_key.to_public_key(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("current_user", &self.current_user)
            .field("certificate_path", &self.certificate_path)
            .field("logged_in_at", &self.logged_in_at)
            .finish_non_exhaustive()
    }
}

/// Owns the single optional session of a process
#[derive(Debug, Default)]
pub struct SessionManager {
    session: Option<Session>,
}

impl SessionManager {
    /// A manager with nobody logged in
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with a private key file and a certificate file
    ///
    /// On success any previous session is replaced.
    pub fn login(
        &mut self,
        private_key_path: impl AsRef<Path>,
        certificate_path: impl AsRef<Path>,
    ) -> Result<&Session> {
        let private_key_path = private_key_path.as_ref();
        let session = Self::authenticate(private_key_path, certificate_path.as_ref())
            .map_err(|e| {
                tracing::warn!(key = %private_key_path.display(), error = %e, "Login rejected");
                e
            })?;

        if let Some(previous) = self.session.take() {
            tracing::debug!(user = previous.current_user.as_str(), "Replacing active session");
        }

        let session = self.session.insert(session);
        tracing::info!(user = session.current_user.as_str(), "Logged in");
        Ok(&*session)
    }

    fn authenticate(private_key_path: &Path, certificate_path: &Path) -> Result<Session> {
        let key_file_name = private_key_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let username = username_from_private_key_name(key_file_name)
            .ok_or_else(|| Error::InvalidKeyFilename(private_key_path.display().to_string()))?
            .to_string();

        if !private_key_path.is_file() {
            return Err(Error::FileNotFound(private_key_path.display().to_string()));
        }
        if !certificate_path.is_file() {
            return Err(Error::FileNotFound(certificate_path.display().to_string()));
        }

        let key_bytes = Zeroizing::new(std::fs::read(private_key_path)?);
        let key_pem = std::str::from_utf8(&key_bytes)
            .map_err(|_| Error::KeyParseError("private key is not PEM text".into()))?;
        let private_key = parse_private_key_pem(key_pem)?;

        let certificate_pem = std::fs::read(certificate_path)?;
        let certificate = parse_certificate_pem(&certificate_pem)?;

        Ok(Session {
            current_user: username,
            private_key,
            certificate_path: certificate_path.to_path_buf(),
            certificate_pem,
            certificate,
            logged_in_at: crate::time::now(),
        })
    }

    /// End the active session, dropping its key
    ///
    /// Returns `NoActiveSession` if nobody is logged in.
    pub fn logout(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(Error::NoActiveSession)?;
        tracing::info!(user = session.current_user.as_str(), "Logged out");
        drop(session);
        Ok(())
    }

    /// The active session, if any
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Username of the active session, if any
    pub fn current_user(&self) -> Option<&str> {
        self.session.as_ref().map(Session::current_user)
    }

    /// Whether a session is active
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubjectTemplate;
    use crate::identity::{Identity, IdentityRegistry};
    use crate::storage::ArtifactStore;
    use tempfile::TempDir;

    fn setup(users: &[&str]) -> (TempDir, Vec<Identity>) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let registry = IdentityRegistry::new(store, SubjectTemplate::default());
        let identities = users.iter().map(|u| registry.register(u).unwrap()).collect();
        (dir, identities)
    }

    #[test]
    fn test_login_logout() {
        let (_dir, ids) = setup(&["alice"]);
        let paths = ids[0].paths();
        let mut manager = SessionManager::new();
        assert!(!manager.is_authenticated());

        let session = manager.login(&paths.private_key, &paths.certificate).unwrap();
        assert_eq!(session.current_user(), "alice");
        assert_eq!(session.certificate_path(), paths.certificate.as_path());
        assert_eq!(session.certificate_pem(), ids[0].certificate_pem().as_bytes());
        assert!(session.key_matches_certificate());

        assert!(manager.is_authenticated());
        assert_eq!(manager.current_user(), Some("alice"));

        manager.logout().unwrap();
        assert!(!manager.is_authenticated());
        assert!(manager.current().is_none());
        assert!(manager.current_user().is_none());
    }

    #[test]
    fn test_logout_without_session() {
        let mut manager = SessionManager::new();
        assert!(matches!(manager.logout(), Err(Error::NoActiveSession)));
    }

    #[test]
    fn test_login_replaces_session() {
        let (_dir, ids) = setup(&["alice", "bob"]);
        let mut manager = SessionManager::new();

        manager.login(&ids[0].paths().private_key, &ids[0].paths().certificate).unwrap();
        manager.login(&ids[1].paths().private_key, &ids[1].paths().certificate).unwrap();
        assert_eq!(manager.current_user(), Some("bob"));
    }

    #[test]
    fn test_invalid_key_filename_checked_first() {
        let (dir, ids) = setup(&["alice"]);
        let renamed = dir.path().join("alice.pem");
        std::fs::copy(&ids[0].paths().private_key, &renamed).unwrap();

        let mut manager = SessionManager::new();
        let result = manager.login(&renamed, &ids[0].paths().certificate);
        assert!(matches!(result, Err(Error::InvalidKeyFilename(_))));

        // Name is checked before the file is even opened
        let result = manager.login(dir.path().join("missing.pem"), dir.path().join("nope"));
        assert!(matches!(result, Err(Error::InvalidKeyFilename(_))));
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_missing_files() {
        let (dir, ids) = setup(&["alice"]);
        let mut manager = SessionManager::new();

        let result = manager.login(dir.path().join("ghost_private.pem"), &ids[0].paths().certificate);
        assert!(matches!(result, Err(Error::FileNotFound(_))));

        let result = manager.login(&ids[0].paths().private_key, dir.path().join("ghost_cert.pem"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_unparseable_files() {
        let (dir, ids) = setup(&["alice"]);
        let bogus_key = dir.path().join("mallory_private.pem");
        std::fs::write(&bogus_key, b"not a key").unwrap();
        let bogus_cert = dir.path().join("bogus_cert.pem");
        std::fs::write(&bogus_cert, b"not a certificate").unwrap();

        let mut manager = SessionManager::new();
        assert!(matches!(
            manager.login(&bogus_key, &ids[0].paths().certificate),
            Err(Error::KeyParseError(_))
        ));
        assert!(matches!(
            manager.login(&ids[0].paths().private_key, &bogus_cert),
            Err(Error::CertParseError(_))
        ));
    }

    #[test]
    fn test_mismatched_pair_still_logs_in() {
        let (_dir, ids) = setup(&["alice", "bob"]);
        let mut manager = SessionManager::new();

        let session = manager
            .login(&ids[0].paths().private_key, &ids[1].paths().certificate)
            .unwrap();
        assert_eq!(session.current_user(), "alice");
        assert!(!session.key_matches_certificate());
    }
}
