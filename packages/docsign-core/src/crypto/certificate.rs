//! # Self-Signed Certificates
//!
//! Every identity owns exactly one X.509 v1 certificate that it signs
//! itself.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CERTIFICATE CONTENTS                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  subject   C=US, ST=State, L=City, O=PKI System, CN=<username>         │
//! │  issuer    identical to subject                                        │
//! │  serial    159 random bits, always positive                            │
//! │  validity  [now, now + 365 days]                                       │
//! │  key       the identity's RSA-2048 public key                          │
//! │  extensions none                                                       │
//! │  signature sha256WithRSAEncryption, by the identity's own private key  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing only accepts canonical DER, and [`verify_self_signature`] checks
//! the certificate against its own key. Together they make any change to a
//! certificate's bytes detectable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1v15::{Signature as Pkcs1v15Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::RsaPublicKey;
use serde::Serialize;
use rsa::signature::Verifier;
use sha2::{Digest, Sha256};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::der::asn1::{ObjectIdentifier, SetOfVec};
use x509_cert::der::pem::{self, LineEnding};
use x509_cert::der::{Any, Decode, Encode, EncodePem, Tag, Tagged};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};

pub use x509_cert::Certificate;

use crate::config::SubjectTemplate;
use crate::crypto::RsaKeyPair;
use crate::error::{Error, Result};

/// Validity period of every issued certificate
pub const CERT_VALIDITY_DAYS: u64 = 365;

/// Length of the random serial number in bytes (top bit cleared)
pub const SERIAL_NUMBER_BYTES: usize = 20;

const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

const PEM_LABEL: &str = "CERTIFICATE";

/// Build and sign a self-signed certificate for `common_name`
///
/// Subject and issuer are the same name: the template attributes followed
/// by the common name. No extensions are added, so the certificate is a
/// plain leaf rather than a CA.
pub fn build_self_signed(
    keypair: &RsaKeyPair,
    common_name: &str,
    template: &SubjectTemplate,
) -> Result<Certificate> {
    let subject = subject_name(common_name, template)?;
    let serial_number = random_serial_number()?;
    let validity = Validity::from_now(Duration::from_secs(CERT_VALIDITY_DAYS * 24 * 60 * 60))
        .map_err(|e| Error::CertificateBuildFailed(format!("validity: {}", e)))?;

    let spki_der = keypair
        .public_key()
        .to_public_key_der()
        .map_err(|e| Error::EncodingError(format!("public key: {}", e)))?;
    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes())
        .map_err(|e| Error::CertificateBuildFailed(format!("public key info: {}", e)))?;

    let signer = SigningKey::<Sha256>::new(keypair.private_key().clone());
    let builder = CertificateBuilder::new(
        Profile::Manual { issuer: None },
        serial_number,
        validity,
        subject,
        spki,
        &signer,
    )
    .map_err(|e| Error::CertificateBuildFailed(e.to_string()))?;

    builder
        .build::<Pkcs1v15Signature>()
        .map_err(|e| Error::CertificateBuildFailed(e.to_string()))
}

/// Parse a PEM-encoded certificate
///
/// The body must be canonical DER: re-encoding the parsed certificate has to
/// reproduce it byte for byte.
pub fn parse_certificate_pem(pem_bytes: &[u8]) -> Result<Certificate> {
    let (label, der) =
        pem::decode_vec(pem_bytes).map_err(|e| Error::CertParseError(e.to_string()))?;
    if label != PEM_LABEL {
        return Err(Error::CertParseError(format!("unexpected PEM label {}", label)));
    }

    let cert = Certificate::from_der(&der).map_err(|e| Error::CertParseError(e.to_string()))?;
    let reencoded = cert
        .to_der()
        .map_err(|e| Error::CertParseError(e.to_string()))?;
    if reencoded != der {
        return Err(Error::CertParseError("certificate is not canonical DER".into()));
    }

    Ok(cert)
}

/// Check that a certificate is signed by the key it embeds
///
/// Requires sha256WithRSAEncryption in both the outer and the signed
/// algorithm identifier.
pub fn verify_self_signature(cert: &Certificate) -> Result<()> {
    let algorithm = &cert.signature_algorithm;
    if algorithm.oid != OID_SHA256_WITH_RSA || *algorithm != cert.tbs_certificate.signature {
        return Err(Error::CertificateSignatureInvalid(format!(
            "unsupported signature algorithm {}",
            algorithm.oid
        )));
    }

    let public_key = certificate_public_key(cert)?;
    let signature_bytes = cert.signature.as_bytes().ok_or_else(|| {
        Error::CertificateSignatureInvalid("signature is not a whole number of bytes".into())
    })?;
    let signature = Pkcs1v15Signature::try_from(signature_bytes)
        .map_err(|e| Error::CertificateSignatureInvalid(e.to_string()))?;
    let tbs = cert
        .tbs_certificate
        .to_der()
        .map_err(|e| Error::EncodingError(format!("certificate body: {}", e)))?;

    VerifyingKey::<Sha256>::new(public_key)
        .verify(&tbs, &signature)
        .map_err(|_| Error::CertificateSignatureInvalid("self-signature does not verify".into()))
}

/// PEM encoding of a certificate
pub fn certificate_pem(cert: &Certificate) -> Result<String> {
    cert.to_pem(LineEnding::LF)
        .map_err(|e| Error::EncodingError(format!("certificate: {}", e)))
}

/// RSA public key embedded in a certificate
pub fn certificate_public_key(cert: &Certificate) -> Result<RsaPublicKey> {
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::CertParseError(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| Error::CertParseError(format!("not an RSA public key: {}", e)))
}

/// First common name in a distinguished name
pub fn common_name_of(name: &Name) -> Option<String> {
    attribute_value(name, OID_COMMON_NAME)
}

fn attribute_value(name: &Name, oid: ObjectIdentifier) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == oid)
        .and_then(|atv| directory_string(&atv.value))
}

fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            std::str::from_utf8(value.value()).ok().map(str::to_string)
        }
        _ => None,
    }
}

fn subject_name(common_name: &str, template: &SubjectTemplate) -> Result<Name> {
    let attributes = [
        (OID_COUNTRY, Tag::PrintableString, template.country.as_str()),
        (OID_STATE, Tag::Utf8String, template.state.as_str()),
        (OID_LOCALITY, Tag::Utf8String, template.locality.as_str()),
        (OID_ORGANIZATION, Tag::Utf8String, template.organization.as_str()),
        (OID_COMMON_NAME, Tag::Utf8String, common_name),
    ];

    let mut rdns = Vec::with_capacity(attributes.len());
    for (oid, tag, value) in attributes {
        let value = Any::new(tag, value.as_bytes())
            .map_err(|e| Error::CertificateBuildFailed(format!("name attribute: {}", e)))?;
        let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])
            .map_err(|e| Error::CertificateBuildFailed(format!("name attribute: {}", e)))?;
        rdns.push(RelativeDistinguishedName(set));
    }

    Ok(RdnSequence(rdns))
}

fn random_serial_number() -> Result<SerialNumber> {
    let mut bytes = [0u8; SERIAL_NUMBER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    // Positive, and never a leading zero octet
    bytes[0] &= 0x7f;
    bytes[0] |= 0x40;
    SerialNumber::new(&bytes)
        .map_err(|e| Error::CertificateBuildFailed(format!("serial number: {}", e)))
}

fn to_datetime(time: &Time) -> Result<DateTime<Utc>> {
    let secs = time.to_unix_duration().as_secs();
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| Error::CertParseError(format!("time out of range: {}", secs)))
}

/// Human-facing summary of a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    /// Subject common name
    pub common_name: String,
    /// Issuer common name (equal to `common_name` for our certificates)
    pub issuer_common_name: Option<String>,
    /// Serial number, hex
    pub serial_hex: String,
    /// Start of validity
    pub not_before: DateTime<Utc>,
    /// End of validity
    pub not_after: DateTime<Utc>,
    /// SHA-256 of the DER encoding, hex
    pub fingerprint_sha256: String,
}

impl CertificateInfo {
    /// Summarise a parsed certificate
    pub fn from_certificate(cert: &Certificate) -> Result<Self> {
        let tbs = &cert.tbs_certificate;
        let common_name = common_name_of(&tbs.subject)
            .ok_or_else(|| Error::CertParseError("subject has no common name".into()))?;
        let der = cert
            .to_der()
            .map_err(|e| Error::EncodingError(format!("certificate: {}", e)))?;

        Ok(Self {
            common_name,
            issuer_common_name: common_name_of(&tbs.issuer),
            serial_hex: hex::encode(tbs.serial_number.as_bytes()),
            not_before: to_datetime(&tbs.validity.not_before)?,
            not_after: to_datetime(&tbs.validity.not_after)?,
            fingerprint_sha256: hex::encode(Sha256::digest(&der)),
        })
    }

    /// Summarise a PEM-encoded certificate
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Self::from_certificate(&parse_certificate_pem(pem)?)
    }

    /// Whether the certificate is self-issued
    pub fn is_self_issued(&self) -> bool {
        self.issuer_common_name.as_deref() == Some(self.common_name.as_str())
    }

    /// Whether `at` falls inside the validity window
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(name: &str) -> (RsaKeyPair, Certificate) {
        let keypair = RsaKeyPair::generate().unwrap();
        let cert = build_self_signed(&keypair, name, &SubjectTemplate::default()).unwrap();
        (keypair, cert)
    }

    #[test]
    fn test_self_signed_fields() {
        let before = Utc::now();
        let (keypair, cert) = issue("alice");

        assert_eq!(cert.tbs_certificate.subject, cert.tbs_certificate.issuer);

        let info = CertificateInfo::from_certificate(&cert).unwrap();
        assert_eq!(info.common_name, "alice");
        assert!(info.is_self_issued());
        assert!(!info.serial_hex.is_empty());
        assert_eq!(
            info.not_after - info.not_before,
            chrono::Duration::days(CERT_VALIDITY_DAYS as i64)
        );
        assert!(info.not_before >= before - chrono::Duration::seconds(2));
        assert!(info.is_valid_at(Utc::now()));

        let embedded = certificate_public_key(&cert).unwrap();
        assert_eq!(&embedded, keypair.public_key());
        assert!(verify_self_signature(&cert).is_ok());
    }

    #[test]
    fn test_certificate_is_not_a_ca() {
        let (_keypair, cert) = issue("alice");

        assert_eq!(cert.tbs_certificate.version, x509_cert::Version::V1);

        // Basic constraints, key usage and key identifiers are all absent
        let extensions = cert.tbs_certificate.extensions.as_deref().unwrap_or_default();
        assert!(extensions.is_empty(), "unexpected extensions: {:?}", extensions);
        assert!(!extensions
            .iter()
            .any(|ext| ext.extn_id == ObjectIdentifier::new_unwrap("2.5.29.19")));
    }

    #[test]
    fn test_self_signature_detects_body_change() {
        let (_keypair, mut cert) = issue("alice");
        cert.tbs_certificate.serial_number = random_serial_number().unwrap();
        assert!(matches!(
            verify_self_signature(&cert),
            Err(Error::CertificateSignatureInvalid(_))
        ));
    }

    #[test]
    fn test_self_signature_detects_foreign_key() {
        let (_alice_key, mut alice) = issue("alice");
        let (_bob_key, bob) = issue("bob");
        alice.tbs_certificate.subject_public_key_info =
            bob.tbs_certificate.subject_public_key_info.clone();
        assert!(verify_self_signature(&alice).is_err());
    }

    #[test]
    fn test_rejects_non_canonical_der() {
        let (_keypair, cert) = issue("carol");
        let mut der = cert.to_der().unwrap();
        // Trailing garbage after the certificate
        der.push(0);
        let pem = pem::encode_string(PEM_LABEL, LineEnding::LF, &der).unwrap();
        assert!(matches!(
            parse_certificate_pem(pem.as_bytes()),
            Err(Error::CertParseError(_))
        ));

        let key_pem = pem::encode_string("PUBLIC KEY", LineEnding::LF, &cert.to_der().unwrap()).unwrap();
        assert!(matches!(
            parse_certificate_pem(key_pem.as_bytes()),
            Err(Error::CertParseError(_))
        ));
    }

    #[test]
    fn test_subject_template_attributes() {
        let keypair = RsaKeyPair::generate().unwrap();
        let template = SubjectTemplate {
            organization: "Acme".to_string(),
            ..SubjectTemplate::default()
        };
        let cert = build_self_signed(&keypair, "bob", &template).unwrap();

        let subject = &cert.tbs_certificate.subject;
        assert_eq!(attribute_value(subject, OID_ORGANIZATION).as_deref(), Some("Acme"));
        assert_eq!(attribute_value(subject, OID_COUNTRY).as_deref(), Some("US"));
        assert_eq!(common_name_of(subject).as_deref(), Some("bob"));
    }

    #[test]
    fn test_pem_roundtrip_and_serial_is_positive() {
        let (_keypair, cert) = issue("carol");

        let pem = certificate_pem(&cert).unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));

        let parsed = parse_certificate_pem(pem.as_bytes()).unwrap();
        assert_eq!(parsed, cert);

        let serial = parsed.tbs_certificate.serial_number.as_bytes();
        assert!(!serial.is_empty());
        assert_eq!(serial[0] & 0x80, 0);
    }

    #[test]
    fn test_serial_numbers_differ() {
        let a = random_serial_number().unwrap();
        let b = random_serial_number().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_certificate_pem(b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n"),
            Err(Error::CertParseError(_))
        ));
        assert!(matches!(
            CertificateInfo::from_pem(b"hello"),
            Err(Error::CertParseError(_))
        ));
    }
}
