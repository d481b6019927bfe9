#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Client
//!
//! Client-side session pipeline for a remote background-removal service:
//! input acquisition (file upload or remote URL), remote-call orchestration,
//! session state management, and compositing/export of the processed
//! (alpha-transparent) result over a chosen background color.
//!
//! The pipeline is organized around a single [`Session`] state machine
//! (`Idle → Previewing → Submitting → Completed | Failed`) that owns the
//! current attempt; every other component reads it and requests
//! transitions:
//!
//! - [`input`] normalizes a file selection or URL string into a
//!   [`CandidateImage`] plus a previewable address
//! - [`client`] submits candidates to the service over HTTP
//! - [`palette`] enumerates the selectable background specs
//! - [`composite`](composite::composite) flattens the processed image over a
//!   solid color with source-over alpha blending
//! - [`export`] fetches, composites, and atomically saves the final PNG
//!   artifact, guarding against stale results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_client::{
//!     ArtifactExporter, BackgroundSpec, ClientConfig, HttpProcessingClient,
//!     Session, SessionStatus, submit_candidate,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::builder()
//!     .service_base_url("http://localhost:8000")
//!     .build()?;
//! let client = HttpProcessingClient::new(config.clone())?;
//!
//! let mut session = Session::new();
//! session.select(bgremove_client::input::select_file(Path::new("photo.jpg"))?);
//!
//! if submit_candidate(&mut session, &client).await? == SessionStatus::Completed {
//!     session.set_background("#0000ff".parse()?);
//!     let exporter = ArtifactExporter::new(&config)?;
//!     exporter.download(&session, Path::new(".")).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI Usage
//!
//! All pipeline functionality is available by default as a library; the
//! `cli` feature (on by default) adds the `bgremove-client` binary and its
//! progress/tracing dependencies. For library-only usage:
//!
//! ```toml
//! [dependencies]
//! bgremove-client = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod composite;
pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod palette;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;

pub use client::{HttpProcessingClient, ProcessedResult, ProcessingService, ServiceStatus};
pub use composite::composite;
pub use config::{ClientConfig, DEFAULT_SERVICE_BASE_URL};
pub use error::{ClientError, Result};
pub use export::{ArtifactExporter, ExportSnapshot, DEFAULT_ARTIFACT_NAME};
pub use input::{CandidateImage, PreviewAddress, SelectedInput};
pub use palette::{BackgroundPalette, BackgroundSpec, NamedColor};
pub use session::{
    submit_candidate, Session, SessionStatus, SubmissionId, GENERIC_FAILURE_MESSAGE,
};

use std::path::Path;

/// Run a full removal session for a local file: select, submit, and return
/// the session holding the outcome
///
/// # Errors
/// - `UnsupportedType`/`InvalidUrl`/`Io` if the input is rejected (no
///   session enters `Failed` for these)
/// - `InvalidConfig` if the configuration is invalid
pub async fn process_file(path: &Path, config: &ClientConfig) -> Result<Session> {
    let client = HttpProcessingClient::new(config.clone())?;
    let mut session = Session::new();
    session.select(input::select_file(path)?);
    submit_candidate(&mut session, &client).await?;
    Ok(session)
}

/// Run a full removal session for a remote image URL
///
/// # Errors
/// - `InvalidUrl` if the string is rejected locally
/// - `InvalidConfig` if the configuration is invalid
pub async fn process_url(url: &str, config: &ClientConfig) -> Result<Session> {
    let client = HttpProcessingClient::new(config.clone())?;
    let mut session = Session::new();
    session.select(input::select_url(url)?);
    submit_candidate(&mut session, &client).await?;
    Ok(session)
}
