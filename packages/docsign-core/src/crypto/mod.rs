//! # Cryptography Module
//!
//! RSA key pairs, self-signed X.509 certificates and RSA-PSS signatures.
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose | Parameters |
//! |-----------|---------|------------|
//! | RSA | Identity key pair | 2048-bit modulus, e = 65537 |
//! | PKCS#8 PEM | Private key encoding | unencrypted |
//! | SPKI PEM | Public key encoding | |
//! | X.509 v1 | Self-signed certificate | sha256WithRSAEncryption, 365 days, no extensions |
//! | RSA-PSS | Document signatures | MGF1-SHA-256, maximum salt length |
//!
//! ## Security Considerations
//!
//! 1. **Secure Random**: keys, serial numbers and PSS salts come from `rand::rngs::OsRng`
//! 2. **Key Zeroization**: `RsaPrivateKey` zeroizes on drop; PEM text is held in `Zeroizing<String>`
//! 3. **Probabilistic Signatures**: the same document signed twice yields different bytes
//! 4. **No encryption at rest**: private keys are written as plain PKCS#8 PEM

mod certificate;
mod keys;
mod signing;

pub use certificate::{
    build_self_signed, certificate_pem, certificate_public_key, common_name_of,
    parse_certificate_pem, verify_self_signature, Certificate, CertificateInfo,
    CERT_VALIDITY_DAYS, SERIAL_NUMBER_BYTES,
};
pub use keys::{parse_private_key_pem, RsaKeyPair, KEY_BITS, PUBLIC_EXPONENT};
pub use signing::{max_pss_salt_len, sign_pss, verify_pss, DocumentSignature};
