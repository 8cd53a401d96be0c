//! Saving image content blocks to disk.

use base64::Engine;
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::error::AgentError;

fn extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/svg+xml" => "svg",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Decode and write one image, returning its path.
pub async fn save_image(dir: &Path, stem: &str, data: &str, mime_type: &str) -> Result<PathBuf, AgentError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| AgentError::Image(format!("invalid base64: {}", e)))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AgentError::Image(format!("{}: {}", dir.display(), e)))?;

    let name = format!(
        "{}-{}.{}",
        Local::now().format("%Y%m%d-%H%M%S"),
        sanitize(stem),
        extension(mime_type)
    );
    let path = dir.join(name);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AgentError::Image(format!("{}: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), "Saved image");
    Ok(path)
}

fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_svg() {
        let dir = tempfile::tempdir().unwrap();
        let data = base64::engine::general_purpose::STANDARD.encode("<svg></svg>");

        let path = save_image(dir.path(), "call/1", &data, "image/svg+xml").await.unwrap();

        assert_eq!(path.extension().unwrap(), "svg");
        assert!(path.file_name().unwrap().to_string_lossy().contains("call_1"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg></svg>");
    }

    #[tokio::test]
    async fn test_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_image(dir.path(), "x", "not base64!!", "image/png").await.unwrap_err();
        assert!(matches!(err, AgentError::Image(_)));
    }
}
