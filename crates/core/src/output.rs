//! Subtitle files written beside their video.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Errors writing a subtitle file.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write subtitle {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `<dir>/<stem>.<language>.srt` for a video at `<dir>/<stem>.<ext>`.
pub fn subtitle_path(video: &Path, language: &str) -> PathBuf {
    video.with_extension(format!("{}.srt", language))
}

/// Write `content` as the subtitle for `video` in `language`, replacing any
/// previous file. Returns the path written.
///
/// Content goes to a temporary sibling first and is renamed into place, so a
/// reader never sees a partial file.
pub async fn write_subtitle(
    video: &Path,
    language: &str,
    content: &[u8],
) -> Result<PathBuf, OutputError> {
    let destination = subtitle_path(video, language);
    let partial = destination.with_extension("srt.part");

    let write = async {
        let mut file = fs::File::create(&partial).await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&partial, &destination).await
    };

    if let Err(source) = write.await {
        let _ = fs::remove_file(&partial).await;
        return Err(OutputError::WriteFailed {
            path: destination,
            source,
        });
    }

    Ok(destination)
}
