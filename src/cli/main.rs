//! Command-line interface driving a full removal session
//!
//! Mirrors the two entry modes of the service: a local file upload or a
//! remote image URL, auto-detected from the input argument. The session
//! runs end to end: select, submit, pick a background, download the
//! artifact.

use crate::client::{HttpProcessingClient, ProcessedResult, ProcessingService};
use crate::config::{ClientConfig, DEFAULT_SERVICE_BASE_URL};
use crate::error::{ClientError, Result as ClientResult};
use crate::export::ArtifactExporter;
use crate::input::{self, CandidateImage, SelectedInput};
use crate::palette::BackgroundSpec;
use crate::session::{submit_candidate, Session, SessionStatus};
use crate::tracing_config::TracingConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Background removal client CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-client")]
pub struct Cli {
    /// Input image: a local file path or an http(s) URL
    #[arg(value_name = "INPUT", required_unless_present = "check")]
    pub input: Option<String>,

    /// Output file path [default: suggested name in the current directory]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Background to composite under the result
    /// (transparent, white, black, red, green, blue, or #rrggbb)
    #[arg(short, long, default_value = "transparent")]
    pub background: String,

    /// Base address of the removal service
    #[arg(short, long, default_value = DEFAULT_SERVICE_BASE_URL)]
    pub service_url: String,

    /// Transmit a local file base64-encoded instead of as a multipart upload
    #[arg(long)]
    pub base64: bool,

    /// Check that the service is reachable and exit
    #[arg(long)]
    pub check: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Sends a file candidate through the base64 endpoint while keeping the
/// session's submission gate
struct Base64Submitter<'a> {
    client: &'a HttpProcessingClient,
}

#[async_trait]
impl ProcessingService for Base64Submitter<'_> {
    async fn submit(&self, candidate: &CandidateImage) -> ClientResult<ProcessedResult> {
        match candidate {
            CandidateImage::File { bytes, .. } => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                self.client.submit_base64(&encoded).await
            },
            CandidateImage::Url(_) => Err(ClientError::processing(
                "base64 mode requires a local file input",
            )),
        }
    }
}

/// CLI entry point
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    TracingConfig::from_verbosity(cli.verbose).init();

    let config = ClientConfig::builder()
        .service_base_url(&cli.service_url)
        .build()
        .context("Invalid service configuration")?;
    let client = HttpProcessingClient::new(config.clone())?;

    if cli.check {
        let status = client.health_check().await?;
        println!("Service at {}: {} ({})", cli.service_url, status.status, status.message);
        return Ok(());
    }

    let input = cli.input.as_deref().context("No input given")?;
    let background: BackgroundSpec = cli
        .background
        .parse()
        .context("Invalid background selection")?;

    let selected = select_input(input).context("Input rejected")?;
    if cli.base64 && matches!(selected.candidate, CandidateImage::Url(_)) {
        bail!("--base64 requires a local file input");
    }

    let mut session = Session::new();
    session.select(selected);
    if let Some(preview) = session.preview_address() {
        tracing::info!(preview = %preview, "previewing candidate");
    }

    let spinner = submission_spinner();
    let status = if cli.base64 {
        let submitter = Base64Submitter { client: &client };
        submit_candidate(&mut session, &submitter).await?
    } else {
        submit_candidate(&mut session, &client).await?
    };
    spinner.finish_and_clear();

    match status {
        SessionStatus::Completed => {},
        SessionStatus::Failed => {
            let message = session.error_message().unwrap_or("Processing failed");
            bail!("{message}");
        },
        other => bail!("Unexpected session state after submission: {other}"),
    }

    session.set_background(background);

    let exporter = ArtifactExporter::new(&config)?;
    let artifact = download_artifact(&exporter, &session, cli.output.as_deref()).await?;
    match artifact {
        Some(path) => println!("Saved {}", path.display()),
        None => println!("Download discarded: result no longer current"),
    }
    Ok(())
}

/// Auto-detect the entry mode from the input argument
fn select_input(input: &str) -> ClientResult<SelectedInput> {
    if input.starts_with("http://") || input.starts_with("https://") {
        input::select_url(input)
    } else {
        input::select_file(Path::new(input))
    }
}

/// Run the download flow, honoring an explicit output path when given
async fn download_artifact(
    exporter: &ArtifactExporter,
    session: &Session,
    output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    match output {
        None => Ok(exporter.download(session, Path::new(".")).await?),
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let saved = exporter
                .download(session, dir.unwrap_or_else(|| Path::new(".")))
                .await?;
            match saved {
                Some(saved) => {
                    if saved != path {
                        std::fs::rename(&saved, path).with_context(|| {
                            format!("Cannot move artifact to '{}'", path.display())
                        })?;
                    }
                    Ok(Some(path.to_path_buf()))
                },
                None => Ok(None),
            }
        },
    }
}

fn submission_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Removing background...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
