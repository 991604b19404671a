//! Avatar upload handler.

use std::path::Path;

use portal_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(portal: &Portal, file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' is not a file name", file.display()),
        })?;
    let bytes = tokio::fs::read(file).await?;
    if bytes.is_empty() {
        return Err(CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' is empty", file.display()),
        });
    }

    tracing::debug!(file = file_name, size = bytes.len(), "uploading avatar");
    portal.upload_avatar(file_name, bytes).await?;

    if !global.quiet {
        eprintln!("Avatar updated");
    }
    Ok(())
}
