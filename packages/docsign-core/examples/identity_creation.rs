//! # Identity Creation Example
//!
//! Registers a user and prints the issued self-signed certificate.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example identity_creation
//! ```

use docsign_core::{CoreConfig, DocSign};

fn main() {
    println!("=== DocSign Core: Identity Creation Example ===\n");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let docsign = DocSign::open(CoreConfig::with_root(dir.path())).expect("Failed to open store");

    // Step 1: Register
    println!("Step 1: Registering 'alice' (RSA-2048 key generation takes a moment)...");
    let identity = docsign.register("alice").expect("Failed to register");

    println!("  Identity created successfully!");
    println!("  Private key: {}", identity.paths().private_key.display());
    println!("  Public key:  {}", identity.paths().public_key.display());
    println!("  Certificate: {}", identity.paths().certificate.display());
    println!();

    // Step 2: Certificate details
    let info = identity.certificate_info();
    println!("Step 2: Certificate");
    println!("  ┌────────────────────────────────────────────────────────┐");
    println!("  │ Self-signed: subject and issuer are the same name     │");
    println!("  │ Valid for 365 days from creation                      │");
    println!("  └────────────────────────────────────────────────────────┘");
    println!("  Subject CN:  {}", info.common_name);
    println!("  Issuer CN:   {}", info.issuer_common_name.as_deref().unwrap_or("-"));
    println!("  Serial:      {}", info.serial_hex);
    println!("  Not before:  {}", info.not_before);
    println!("  Not after:   {}", info.not_after);
    println!("  SHA-256:     {}", info.fingerprint_sha256);
    println!();

    // Step 3: Duplicate registration
    println!("Step 3: Registering 'alice' again...");
    match docsign.register("alice") {
        Ok(_) => println!("  [FAILED] Duplicate registration was accepted!"),
        Err(e) => println!("  [OK] Rejected: {}", e),
    }
    println!();

    println!("Step 4: Audit");
    let audit = docsign.registry().audit("alice").expect("Failed to audit");
    if audit.is_complete() {
        println!("  [OK] All three artifacts present");
    } else {
        println!("  [FAILED] Incomplete identity: {:?}", audit);
    }

    println!("\n=== Example Complete ===");
}
