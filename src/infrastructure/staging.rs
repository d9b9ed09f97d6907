use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Creates the staging directory if it does not exist yet.
pub async fn setup_staging_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create staging directory {}", path.display()))?;
    info!("📂 Staging directory: {}", path.display());
    Ok(())
}
