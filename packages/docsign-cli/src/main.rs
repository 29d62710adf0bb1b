//! DocSign command line
//!
//! Thin front-end over `docsign-core`:
//!
//! 1. **register**: create a user's key pair and self-signed certificate.
//! 2. **sign**: log in with a key and certificate, sign one document, log out.
//! 3. **verify**: check a (document, signature, certificate) triple. Exits
//!    with status 1 when the signature is invalid.
//! 4. **inspect**: print a certificate summary.
//! 5. **status**: list users and signed documents.
//!
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use docsign_core::verifier;
use docsign_core::{CertificateInfo, CoreConfig, DocSign, VerificationResult};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "docsign", version, about = "Self-signed identities and detached document signatures")]
struct Args {
    /// Directory holding keys/, certs/ and signed_docs/
    #[arg(long, global = true, env = "DOCSIGN_HOME")]
    home: Option<PathBuf>,

    /// TOML configuration file (defaults come from DOCSIGN_* variables)
    #[arg(long, global = true, env = "DOCSIGN_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new user
    Register {
        /// Letters and digits only
        username: String,
    },

    /// Sign a document and store it under signed_docs/
    Sign {
        /// Private key file, named <username>_private.pem
        #[arg(long)]
        key: PathBuf,

        /// Certificate file
        #[arg(long)]
        cert: PathBuf,

        /// Document to sign
        document: PathBuf,
    },

    /// Verify a document against a detached signature and certificate
    Verify {
        /// Original document
        document: PathBuf,
        /// Detached signature (.sig)
        signature: PathBuf,
        /// Signer's certificate
        certificate: PathBuf,

        /// Print the specific failure cause
        #[arg(long)]
        explain: bool,
    },

    /// Show a certificate's subject, serial and validity
    Inspect {
        /// PEM certificate file
        certificate: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show registered users and signed documents
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse();

    let default_filter = if args.verbose {
        "info,docsign_core=debug"
    } else {
        "warn,docsign_core=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = load_config(args.config.as_deref(), args.home)?;
    run(args.command, config)
}

fn load_config(file: Option<&Path>, home: Option<PathBuf>) -> color_eyre::Result<CoreConfig> {
    let mut config = match file {
        Some(path) => CoreConfig::from_toml_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => CoreConfig::from_env(),
    };
    if let Some(home) = home {
        config.root_dir = home;
    }
    Ok(config)
}

fn run(command: Command, config: CoreConfig) -> color_eyre::Result<ExitCode> {
    match command {
        Command::Register { username } => {
            let docsign = DocSign::open(config)?;
            let identity = docsign.register(&username)?;
            let info = identity.certificate_info();
            println!("Registered {}", identity.username());
            println!("  private key  {}", identity.paths().private_key.display());
            println!("  public key   {}", identity.paths().public_key.display());
            println!("  certificate  {}", identity.paths().certificate.display());
            println!("  valid until  {}", docsign_core::time::format_utc(&info.not_after));
        }

        Command::Sign {
            key,
            cert,
            document,
        } => {
            let mut docsign = DocSign::open(config)?;
            let user = docsign.login(&key, &cert)?.current_user().to_string();
            let signed = docsign.sign_document(&document);
            docsign.logout()?;
            let signed = signed.wrap_err_with(|| format!("signing {}", document.display()))?;

            println!("Signed by {}", user);
            println!("  document     {}", signed.document.display());
            println!("  signature    {}", signed.signature.display());
            println!("  certificate  {}", signed.certificate.display());
        }

        Command::Verify {
            document,
            signature,
            certificate,
            explain,
        } => {
            let document = read(&document)?;
            let signature = read(&signature)?;
            let certificate = read(&certificate)?;

            match verifier::verify(&document, &signature, &certificate) {
                VerificationResult::Valid { common_name } => {
                    println!("VALID: signed by {}", common_name);
                }
                VerificationResult::Invalid { reason } => {
                    println!("INVALID: {}", reason);
                    if explain {
                        if let Err(failure) = verifier::diagnose(&document, &signature, &certificate) {
                            println!("  cause: {}", failure);
                        }
                    }
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Inspect { certificate, json } => {
            let info = CertificateInfo::from_pem(&read(&certificate)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_certificate(&info);
            }
        }

        Command::Status { json } => {
            let docsign = DocSign::open(config)?;
            let status = docsign.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", status);
                for user in &status.users {
                    println!("  user      {}", user);
                }
                for doc in &status.signed_documents {
                    println!("  document  {}", doc);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read(path: &Path) -> color_eyre::Result<Vec<u8>> {
    if !path.is_file() {
        return Err(eyre!("file not found: {}", path.display()));
    }
    std::fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))
}

fn print_certificate(info: &CertificateInfo) {
    let now = docsign_core::time::now();
    println!("Subject CN   {}", info.common_name);
    println!(
        "Issuer CN    {}{}",
        info.issuer_common_name.as_deref().unwrap_or("-"),
        if info.is_self_issued() { " (self-signed)" } else { "" }
    );
    println!("Serial       {}", info.serial_hex);
    println!("Not before   {}", docsign_core::time::format_utc(&info.not_before));
    println!("Not after    {}", docsign_core::time::format_utc(&info.not_after));
    println!(
        "Status       {}",
        if info.is_valid_at(now) { "within validity period" } else { "outside validity period" }
    );
    println!("SHA-256      {}", info.fingerprint_sha256);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_sign() {
        let args = Args::try_parse_from([
            "docsign", "--home", "/tmp/pki", "sign", "--key", "k_private.pem", "--cert", "c.pem",
            "doc.txt",
        ])
        .unwrap();
        assert_eq!(args.home.as_deref(), Some(Path::new("/tmp/pki")));
        match args.command {
            Command::Sign { key, cert, document } => {
                assert_eq!(key, PathBuf::from("k_private.pem"));
                assert_eq!(cert, PathBuf::from("c.pem"));
                assert_eq!(document, PathBuf::from("doc.txt"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_requires_three_paths() {
        assert!(Args::try_parse_from(["docsign", "verify", "doc", "sig"]).is_err());
    }

    #[test]
    fn test_config_file_and_home_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("docsign.toml");
        std::fs::write(&file, "root_dir = \"/srv/pki\"\n[subject]\norganization = \"Acme\"\n").unwrap();

        let config = load_config(Some(&file), None).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/srv/pki"));
        assert_eq!(config.subject.organization, "Acme");

        let config = load_config(Some(&file), Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.root_dir, dir.path());
    }

    #[test]
    fn test_register_then_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CoreConfig::with_root(dir.path());

        run(
            Command::Register {
                username: "alice".into(),
            },
            config.clone(),
        )
        .unwrap();
        assert!(dir.path().join("certs/alice_cert.pem").is_file());

        assert!(run(
            Command::Register {
                username: "alice".into()
            },
            config,
        )
        .is_err());
    }
}
