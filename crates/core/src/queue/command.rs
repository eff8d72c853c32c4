use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unit of work for the queue worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Start a new generation for `path` and download initial subtitles.
    AddVideo { path: String, display_name: String },
    /// Look for better subtitles for every incomplete video.
    CheckForBetter,
}

impl Command {
    /// Add command for `path`; the display name falls back to the path.
    pub fn add_video(path: impl Into<String>, display_name: Option<String>) -> Self {
        let path = path.into();
        let display_name = display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| path.clone());
        Command::AddVideo { path, display_name }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AddVideo { .. } => "add_video",
            Command::CheckForBetter => "check_for_better",
        }
    }
}

/// Errors enqueuing a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Command queue is closed")]
    Closed,
}

/// Anything commands can be enqueued on.
///
/// Enqueue returns immediately; it never waits for the command to run.
pub trait CommandSink: Send + Sync {
    fn enqueue(&self, command: Command) -> Result<(), QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_video_defaults_name_to_path() {
        assert_eq!(
            Command::add_video("/tv/a.mkv", None),
            Command::AddVideo {
                path: "/tv/a.mkv".to_string(),
                display_name: "/tv/a.mkv".to_string()
            }
        );
        assert_eq!(
            Command::add_video("/tv/a.mkv", Some("  ".to_string())),
            Command::add_video("/tv/a.mkv", None)
        );
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_value(Command::CheckForBetter).unwrap();
        assert_eq!(json["type"], "check_for_better");
        assert_eq!(Command::CheckForBetter.name(), "check_for_better");
    }
}
