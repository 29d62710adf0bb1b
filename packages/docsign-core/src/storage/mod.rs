//! # Storage Module
//!
//! On-disk artifact storage for keys, certificates and signed documents.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ARTIFACT STORE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  <root>/                                                               │
//! │  ├── keys/                                                             │
//! │  │   ├── alice_private.pem      PKCS#8 PEM, unencrypted               │
//! │  │   └── alice_public.pem       SubjectPublicKeyInfo PEM               │
//! │  ├── certs/                                                            │
//! │  │   └── alice_cert.pem         self-signed X.509 PEM                  │
//! │  └── signed_docs/                                                      │
//! │      ├── report.txt             copy of the signed document            │
//! │      ├── report.txt.sig         raw RSA-PSS signature bytes            │
//! │      └── report.txt_cert.pem    copy of the signer's certificate       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store has no business logic and no locking. Every write is an
//! independent file write; a multi-artifact operation that fails partway
//! leaves the earlier artifacts in place.

mod artifact_store;

pub use artifact_store::{ArtifactStore, Category};
