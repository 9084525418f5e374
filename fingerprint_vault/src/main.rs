//! Fingerprint Vault - CLI
//!
//! Command-line interface for hashing scans and protecting files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use fingerprint_vault::{
    payload, CipherEngine, Enrollment, FingerprintDigest, FingerprintError, FingerprintPipeline,
    FpResult, VaultConfig,
};

#[derive(Parser)]
#[command(name = "fpvault")]
#[command(version = fingerprint_vault::VERSION)]
#[command(about = "Fingerprint Vault - fingerprint digests and fingerprint-keyed file protection")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the key material comes from
#[derive(Args)]
#[group(required = true, multiple = false)]
struct KeySource {
    /// Registered digest (64 hex characters)
    #[arg(short, long)]
    digest: Option<String>,

    /// Fingerprint scan to digest
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the digest of a fingerprint scan
    Hash {
        /// Scan image (PNG, JPEG, BMP, ...)
        image: PathBuf,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Digest a base64 or data-URL upload stored in a file
    HashPayload {
        /// File holding the payload text
        path: PathBuf,
    },

    /// Check a scan against registered digests
    Verify {
        /// Scan image
        image: PathBuf,

        /// Registered digest (repeatable)
        #[arg(short, long = "digest", required = true)]
        digests: Vec<String>,
    },

    /// Encrypt a file
    Encrypt {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        key: KeySource,
    },

    /// Decrypt a file
    Decrypt {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        key: KeySource,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> FpResult<VaultConfig> {
    match path {
        Some(path) => VaultConfig::load(path),
        None => Ok(VaultConfig::default()),
    }
}

fn resolve_key(key: &KeySource, pipeline: &FingerprintPipeline) -> FpResult<Vec<u8>> {
    let digest = match (&key.digest, &key.image) {
        (Some(hex), _) => FingerprintDigest::from_hex(hex)?,
        (None, Some(image)) => pipeline.hash(&std::fs::read(image)?)?,
        (None, None) => {
            return Err(FingerprintError::InvalidConfig(
                "either --digest or --image is required".into(),
            ))
        }
    };
    Ok(digest.key_material())
}

fn run(cli: Cli) -> FpResult<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = FingerprintPipeline::new(config.pipeline.clone())?;
    let engine = CipherEngine::new(&config.cipher)?;

    match cli.command {
        Commands::Hash { image, json } => {
            let bytes = std::fs::read(&image)?;
            let analysis = pipeline.analyze(&bytes)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", analysis.digest);
            }
        }

        Commands::HashPayload { path } => {
            let text = std::fs::read_to_string(&path)?;
            let digest = payload::hash_payload(&pipeline, &text)?;
            println!("{}", digest);
        }

        Commands::Verify { image, digests } => {
            let enrollment = Enrollment::from_stored(&digests)?;
            let candidate = pipeline.hash(&std::fs::read(&image)?)?;

            match enrollment.position(&candidate) {
                Some(index) => println!("match: digest #{}", index),
                None => {
                    println!("no match");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Encrypt { input, output, key } => {
            let key = resolve_key(&key, &pipeline)?;
            let plaintext = std::fs::read(&input)?;
            let blob = engine.encrypt_bytes(&plaintext, &key)?;
            std::fs::write(&output, &blob)?;

            log::info!("Encrypted {} -> {}", input.display(), output.display());
            println!("{} bytes written to {}", blob.len(), output.display());
        }

        Commands::Decrypt { input, output, key } => {
            let key = resolve_key(&key, &pipeline)?;
            let blob = std::fs::read(&input)?;
            let plaintext = engine.decrypt_bytes(&blob, &key)?;
            std::fs::write(&output, &plaintext)?;

            log::info!("Decrypted {} -> {}", input.display(), output.display());
            println!("{} bytes written to {}", plaintext.len(), output.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
