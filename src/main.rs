use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signature_print::{HasRecoverySuggestion, PipelineConfig, SignatureError, SignatureSession};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Signature fingerprinting and verification:
/// - capture: normalize one signature image and print its fingerprint
/// - verify: score a live signature against one or more references
#[derive(Parser, Debug)]
#[command(name = "sigprint")]
#[command(about = "✍️  Fingerprint and verify handwritten signatures")]
#[command(long_about = "Normalize handwritten signature images into a fixed canvas, derive a keypoint fingerprint
and verify a live signature against stored references. Results are printed as JSON.")]
struct Cli {
    /// Log filter (e.g. info, debug, signature_print=trace). Overrides RUST_LOG.
    #[arg(long, global = true, help = "Log filter, overrides RUST_LOG (default: info)")]
    log_level: Option<String>,

    /// Pipeline configuration file (JSON, partial files allowed)
    #[arg(
        long,
        global = true,
        help = "JSON configuration file; missing fields keep their defaults"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the fingerprint of one signature image
    Capture {
        #[arg(help = "Signature image (PNG, JPEG, BMP, TIFF, WebP)")]
        image: PathBuf,

        #[arg(
            short,
            long,
            help = "Also write vis.png, roi.png and normalized.png into this directory"
        )]
        out_dir: Option<PathBuf>,
    },
    /// Verify a live signature against one or more references
    Verify {
        #[arg(help = "Live signature image")]
        live: PathBuf,

        #[arg(required = true, num_args = 1.., help = "Reference signature image(s)")]
        references: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<SignatureError>() {
                Some(signature_err) => {
                    if let Some(hint) = signature_err.recovery_suggestion() {
                        eprintln!("Hint: {hint}");
                    }
                    if signature_err.is_caller_fault() {
                        ExitCode::from(2)
                    } else {
                        ExitCode::FAILURE
                    }
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let session = SignatureSession::new(config)?;

    match cli.command {
        Command::Capture { image, out_dir } => {
            let bytes = read_input(&image).await?;
            let report = session
                .capture(bytes)
                .await
                .with_context(|| format!("Capturing fingerprint of {}", image.display()))?;

            if let Some(dir) = out_dir {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    let path = Some(dir.display().to_string());
                    SignatureError::io("create output directory", path, e)
                })?;
                for encoded in report.processed_images.iter() {
                    let path = dir.join(encoded.kind.file_name());
                    tokio::fs::write(&path, &encoded.png).await.map_err(|e| {
                        SignatureError::io("write image", Some(path.display().to_string()), e)
                    })?;
                }
                info!(dir = %dir.display(), "wrote processed images");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Verify { live, references } => {
            let live_bytes = read_input(&live).await?;
            let mut reference_bytes = Vec::with_capacity(references.len());
            for path in &references {
                reference_bytes.push(read_input(path).await?);
            }

            if reference_bytes.len() == 1 {
                let reference = reference_bytes.remove(0);
                let report = session.verify(live_bytes, reference).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let reports = session.verify_against(live_bytes, reference_bytes).await?;
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
    }
    Ok(())
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SignatureError::io("read image", Some(path.display().to_string()), e))?;
    Ok(bytes)
}
