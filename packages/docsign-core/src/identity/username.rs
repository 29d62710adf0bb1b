//! Username validation and the artifact naming convention derived from it.

use crate::error::{Error, Result};

/// Suffix of a private key artifact: `<username>_private.pem`
pub const PRIVATE_KEY_SUFFIX: &str = "_private.pem";

/// Suffix of a public key artifact: `<username>_public.pem`
pub const PUBLIC_KEY_SUFFIX: &str = "_public.pem";

/// Suffix of a certificate artifact: `<username>_cert.pem`
pub const CERTIFICATE_SUFFIX: &str = "_cert.pem";

/// Validate a username and return its canonical form.
///
/// Surrounding whitespace is trimmed; what remains must be non-empty and
/// ASCII alphanumeric.
pub fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidUsername(raw.to_string()));
    }
    Ok(username.to_string())
}

/// `keys/` artifact name of a user's private key
pub fn private_key_name(username: &str) -> String {
    format!("{}{}", username, PRIVATE_KEY_SUFFIX)
}

/// `keys/` artifact name of a user's public key
pub fn public_key_name(username: &str) -> String {
    format!("{}{}", username, PUBLIC_KEY_SUFFIX)
}

/// `certs/` artifact name of a user's certificate
pub fn certificate_name(username: &str) -> String {
    format!("{}{}", username, CERTIFICATE_SUFFIX)
}

/// Claimed username of a private key file name, if it follows the
/// `<username>_private.pem` convention
pub fn username_from_private_key_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PRIVATE_KEY_SUFFIX)
        .filter(|username| !username.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert_eq!(validate_username("alice").unwrap(), "alice");
        assert_eq!(validate_username("Bob42").unwrap(), "Bob42");
        assert_eq!(validate_username("  carol \n").unwrap(), "carol");
    }

    #[test]
    fn test_invalid_usernames() {
        for raw in ["", "   ", "alice_b", "a.b", "a/b", "a b", "ünïcode", "../x"] {
            assert!(
                matches!(validate_username(raw), Err(Error::InvalidUsername(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(private_key_name("alice"), "alice_private.pem");
        assert_eq!(public_key_name("alice"), "alice_public.pem");
        assert_eq!(certificate_name("alice"), "alice_cert.pem");
    }

    #[test]
    fn test_username_from_key_name() {
        assert_eq!(username_from_private_key_name("alice_private.pem"), Some("alice"));
        assert_eq!(username_from_private_key_name("_private.pem"), None);
        assert_eq!(username_from_private_key_name("alice_public.pem"), None);
        assert_eq!(username_from_private_key_name("alice_private.pem.bak"), None);
        assert_eq!(username_from_private_key_name("alice.pem"), None);
    }
}
