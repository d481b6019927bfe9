//! Background Removal Client CLI
//!
//! Command-line interface for the bgremove-client library: submits an image
//! to the removal service and downloads the composited result.

use bgremove_client::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
