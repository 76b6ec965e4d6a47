//! Writing generated codes to disk and handing them to an image viewer

use crate::error::{Error, Result};
use std::path::Path;
use tokio::process::Command;

/// Write PNG bytes to `path`, creating missing parent directories.
pub async fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {e}", parent.display()),
                ))
            })?;
        }
    }

    tokio::fs::write(path, png).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {e}", path.display()),
        ))
    })?;
    tracing::info!(path = %path.display(), bytes = png.len(), "Wrote QR code image");
    Ok(())
}

/// Open `path` with the given viewer program and wait for it to exit.
pub async fn open_viewer(viewer: &str, path: &Path) -> Result<()> {
    let status = Command::new(viewer)
        .arg(path)
        .status()
        .await
        .map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to start viewer '{viewer}': {e}"),
            ))
        })?;

    if !status.success() {
        return Err(Error::Other(format!(
            "Viewer '{viewer}' exited with {status}"
        )));
    }
    Ok(())
}
