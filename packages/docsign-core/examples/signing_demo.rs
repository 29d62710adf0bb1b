//! # Digital Signature Demo
//!
//! Login, RSA-PSS signing and verification of a stored document triple.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use docsign_core::{CoreConfig, DocSign, VerificationResult};

fn main() {
    println!("=== DocSign Core: Digital Signature Demo ===\n");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut docsign =
        DocSign::open(CoreConfig::with_root(dir.path())).expect("Failed to open store");

    // Step 1: Identity and login
    println!("Step 1: Registering and logging in as 'alice'...");
    let alice = docsign.register("alice").expect("Failed to register");
    docsign
        .login(&alice.paths().private_key, &alice.paths().certificate)
        .expect("Failed to log in");
    println!("  {}", docsign.status().expect("Failed to read status"));
    println!();

    // Step 2: Explain the signing process
    println!("Step 2: Understanding RSA-PSS Signatures");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                   SIGNATURE FLOW                            │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │  SIGNING (logged-in user only):                            │");
    println!("  │                                                             │");
    println!("  │    Document ─► SHA-256 ─► PSS (random salt) ─► RSA ─► .sig │");
    println!("  │                                                             │");
    println!("  │  VERIFICATION (anyone with the certificate):               │");
    println!("  │                                                             │");
    println!("  │    Document + .sig + certificate ─► Valid(CN) / Invalid    │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 3: Sign
    println!("Step 3: Signing a document...");
    let message = b"This document was signed by alice and has not been tampered with.";
    let signed = docsign
        .sign_bytes("statement.txt", message)
        .expect("Failed to sign");
    let signature = std::fs::read(&signed.signature).expect("Failed to read signature");
    println!("  Document:  {}", signed.document.display());
    println!("  Signature: {} ({} bytes)", signed.signature.display(), signature.len());
    println!("  Cert copy: {}", signed.certificate.display());
    println!();

    // Step 4: Verify
    println!("Step 4: Verifying the signature...");
    report(
        docsign
            .verify_files(&signed.document, &signed.signature, &signed.certificate)
            .expect("Failed to read files"),
    );
    println!();

    // Step 5: Tamper detection
    println!("Step 5: Tampering with the stored document...");
    std::fs::write(&signed.document, b"This document was signed by mallory.")
        .expect("Failed to overwrite");
    report(
        docsign
            .verify_files(&signed.document, &signed.signature, &signed.certificate)
            .expect("Failed to read files"),
    );

    docsign.logout().expect("Failed to log out");
    println!("\n=== Demo Complete ===");
}

fn report(result: VerificationResult) {
    match result {
        VerificationResult::Valid { common_name } => {
            println!("  [VALID] Signed by {}", common_name)
        }
        VerificationResult::Invalid { reason } => println!("  [INVALID] {}", reason),
    }
}
