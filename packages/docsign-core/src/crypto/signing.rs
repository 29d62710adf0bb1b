//! # Digital Signatures Module
//!
//! RSA-PSS detached signatures over raw document bytes.
//!
//! ## Signature Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SIGNING FLOW                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  document bytes ──► SHA-256 ──► EMSA-PSS encode ──► RSA private op     │
//! │                                  │                                      │
//! │                                  ├── MGF1 with SHA-256                  │
//! │                                  └── random salt, 222 bytes             │
//! │                                      (emLen - hLen - 2 for 2048 bits)  │
//! │                                                                         │
//! │  Verification runs the same encoding backwards with the public key     │
//! │  and the same salt length.                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Description |
//! |----------|-------------|
//! | Authenticity | Only the private key holder can produce a valid signature |
//! | Integrity | Any change to the document invalidates the signature |
//! | Probabilistic | Signing the same bytes twice gives different signatures |
//! | Detached | The signature is stored apart from the document |

use rand::rngs::OsRng;
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A detached RSA-PSS signature
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentSignature(Vec<u8>);

impl DocumentSignature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw signature bytes, as written to `<docname>.sig`
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for DocumentSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for DocumentSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentSignature({} bytes)", self.0.len())
    }
}

/// Largest PSS salt the key allows with SHA-256: `emLen - hLen - 2`,
/// where `emLen = ceil((modBits - 1) / 8)`.
pub fn max_pss_salt_len(key: &RsaPublicKey) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = (em_bits + 7) / 8;
    em_len.saturating_sub(Sha256::output_size() + 2)
}

/// Sign `message` with RSA-PSS (MGF1-SHA-256, maximum salt length)
///
/// The message is hashed internally. Output is non-deterministic.
pub fn sign_pss(key: &RsaPrivateKey, message: &[u8]) -> Result<DocumentSignature> {
    let salt_len = max_pss_salt_len(&key.to_public_key());
    let signing_key = BlindedSigningKey::<Sha256>::new_with_salt_len(key.clone(), salt_len);
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, message)
        .map_err(|e| Error::SigningError(e.to_string()))?;
    Ok(DocumentSignature(signature.to_vec()))
}

/// Verify an RSA-PSS signature (MGF1-SHA-256, maximum salt length)
///
/// Returns `false` for any mismatch, including malformed signature bytes.
pub fn verify_pss(key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let salt_len = max_pss_salt_len(key);
    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(key.clone(), salt_len);
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RsaKeyPair;

    #[test]
    fn test_max_salt_len_for_2048_bits() {
        let keypair = RsaKeyPair::generate().unwrap();
        assert_eq!(max_pss_salt_len(keypair.public_key()), 222);
    }

    #[test]
    fn test_sign_verify() {
        let keypair = RsaKeyPair::generate().unwrap();
        let message = b"Hello, World!";

        let signature = sign_pss(keypair.private_key(), message).unwrap();
        assert_eq!(signature.len(), 256);
        assert!(verify_pss(keypair.public_key(), message, signature.as_bytes()));
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let keypair = RsaKeyPair::generate().unwrap();
        let signature = sign_pss(keypair.private_key(), b"Hello, World!").unwrap();
        assert!(!verify_pss(keypair.public_key(), b"Wrong message!", signature.as_bytes()));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let keypair1 = RsaKeyPair::generate().unwrap();
        let keypair2 = RsaKeyPair::generate().unwrap();
        let signature = sign_pss(keypair1.private_key(), b"Hello").unwrap();
        assert!(!verify_pss(keypair2.public_key(), b"Hello", signature.as_bytes()));
    }

    #[test]
    fn test_probabilistic_signatures() {
        let keypair = RsaKeyPair::generate().unwrap();
        let message = b"Hello, World!";

        let sig1 = sign_pss(keypair.private_key(), message).unwrap();
        let sig2 = sign_pss(keypair.private_key(), message).unwrap();

        // PSS salts are random
        assert_ne!(sig1, sig2);
        assert!(verify_pss(keypair.public_key(), message, sig1.as_bytes()));
        assert!(verify_pss(keypair.public_key(), message, sig2.as_bytes()));
    }

    #[test]
    fn test_malformed_signature_bytes() {
        let keypair = RsaKeyPair::generate().unwrap();
        assert!(!verify_pss(keypair.public_key(), b"doc", b""));
        assert!(!verify_pss(keypair.public_key(), b"doc", &[0u8; 13]));
        assert!(!verify_pss(keypair.public_key(), b"doc", &[0xffu8; 256]));
    }
}
