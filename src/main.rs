//! IdVerifier - command-line ID document verification
//!
//! Verifies one ID document image against a template and prints the verdict.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use id_verifier::config::{self, VerifierConfig};
use id_verifier::{
    NccCorrelator, ProgressEvent, RunOptions, TesseractOcr, VerificationPipeline,
    VerificationResult,
};

/// IdVerifier - ID document verification
#[derive(Parser, Debug)]
#[command(name = "id-verifier")]
#[command(about = "Verify an ID document image against a layout template")]
struct Args {
    /// ID document image
    #[arg(long, required_unless_present = "write_default_config")]
    id: Option<PathBuf>,

    /// Template image
    #[arg(long, required_unless_present = "write_default_config")]
    template: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Some(path) = args.write_default_config {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        config::save_config(&VerifierConfig::default(), &path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_or_default_config(args.config.as_deref())?;
    let (Some(id_path), Some(template_path)) = (args.id, args.template) else {
        anyhow::bail!("Both --id and --template are required");
    };

    let id_image = std::fs::read(&id_path)
        .with_context(|| format!("Failed to read ID image {}", id_path.display()))?;
    let template_image = std::fs::read(&template_path)
        .with_context(|| format!("Failed to read template image {}", template_path.display()))?;

    let pipeline = VerificationPipeline::new(
        config.clone(),
        Arc::new(TesseractOcr::new(config.ocr.clone())),
        Arc::new(NccCorrelator::new()),
    );
    pipeline.initialize().await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling after the current stage");
                cancel.cancel();
            }
        });
    }

    let (progress_tx, progress_rx) = crossbeam_channel::unbounded::<ProgressEvent>();
    let printer = std::thread::spawn(move || {
        for event in progress_rx {
            eprintln!("[{:>3}%] {}", event.percent, event.description);
        }
    });

    let options = RunOptions::default()
        .with_progress(progress_tx)
        .with_cancellation(cancel);
    let outcome = pipeline
        .run(Some(id_image.as_slice()), Some(template_image.as_slice()), options)
        .await;

    // The run dropped its sender, so the printer drains and exits
    let _ = printer.join();

    if let Err(e) = pipeline.shutdown().await {
        warn!("Shutdown failed: {}", e);
    }

    let result = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(if result.overall.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Load configuration from the given file, the default location, or defaults
fn load_or_default_config(path: Option<&Path>) -> Result<VerifierConfig> {
    if let Some(path) = path {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_path) = config::default_config_path() {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring unreadable configuration {:?}: {:#}", config_path, e),
            }
        }
    }

    info!("Using default configuration");
    Ok(VerifierConfig::default())
}

fn print_summary(result: &VerificationResult) {
    let verdict = if result.overall.is_valid {
        "VALID"
    } else {
        "NOT VALID"
    };
    println!(
        "Verdict: {} (confidence {:.1}%)",
        verdict,
        result.overall.confidence * 100.0
    );
    println!();
    println!("Template match: {}", result.template_match.details);
    println!("Text extraction: {}", result.text_extraction.details);

    if !result.text_extraction.extracted_data.is_empty() {
        println!();
        for (label, value) in &result.text_extraction.extracted_data {
            println!("  {label}: {value}");
        }
    }
}
