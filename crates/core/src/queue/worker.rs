use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::handle::QueueCounters;
use super::Command;
use crate::catalog::{CatalogError, VideoCatalog};
use crate::output::{self, OutputError};
use crate::scoring::{select_best, AcceptanceRule, ScoreThresholds};
use crate::source::{SourceError, SubtitleSession, SubtitleSource};
use crate::video::{ContentHasher, HashError, Identity, MediaIdentifier};

/// Errors that abort a single command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("Hashing task failed: {0}")]
    HashTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Failed to open subtitle session: {0}")]
    Session(#[from] SourceError),
}

/// Settings the worker applies to every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub languages: Vec<String>,
    /// Gate for downloads on add.
    pub minimum: ScoreThresholds,
    /// Scores at or above these leave a video out of rechecks.
    pub desired: ScoreThresholds,
    /// Videos added longer ago than this are not rechecked.
    pub search_for_days: u32,
}

/// The external collaborators a worker talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SubtitleSource>,
    pub identifier: Arc<dyn MediaIdentifier>,
    pub hasher: Arc<dyn ContentHasher>,
}

/// Executes one command at a time. Owns the catalog.
struct CommandProcessor {
    catalog: Box<dyn VideoCatalog>,
    collaborators: Collaborators,
    settings: WorkerSettings,
}

/// Single consumer of the command queue.
pub struct CommandWorker {
    rx: mpsc::UnboundedReceiver<Command>,
    pending: Arc<watch::Sender<usize>>,
    counters: Arc<QueueCounters>,
    processor: CommandProcessor,
}

impl CommandWorker {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Command>,
        pending: Arc<watch::Sender<usize>>,
        counters: Arc<QueueCounters>,
        catalog: Box<dyn VideoCatalog>,
        collaborators: Collaborators,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            rx,
            pending,
            counters,
            processor: CommandProcessor {
                catalog,
                collaborators,
                settings,
            },
        }
    }

    /// Run the worker, consuming commands until every queue handle is dropped.
    ///
    /// This should be spawned as a background task. The catalog is closed when it returns.
    /// A command that panics counts as failed; the worker moves on to the next one.
    pub async fn run(mut self) {
        info!("Command worker started");

        while let Some(command) = self.rx.recv().await {
            let name = command.name();
            debug!(command = name, "Executing command");

            let outcome = AssertUnwindSafe(self.processor.execute(&command))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {
                    self.counters.processed.fetch_add(1, Ordering::Relaxed);
                    debug!(command = name, "Command finished");
                }
                Ok(Err(e)) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    error!(command = name, error = %e, "Command failed");
                }
                Err(panic) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    error!(command = name, panic = panic_message(panic.as_ref()), "Command panicked");
                }
            }

            self.pending
                .send_modify(|pending| *pending = pending.saturating_sub(1));
        }

        info!("Command worker shutting down");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Oldest `added_at` a recheck still considers.
///
/// Saturates at the Unix epoch, which every catalog timestamp follows.
fn recheck_cutoff(now: DateTime<Utc>, search_for_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(search_for_days))
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |cutoff| cutoff.max(DateTime::<Utc>::UNIX_EPOCH))
}

impl CommandProcessor {
    async fn execute(&self, command: &Command) -> Result<(), CommandError> {
        let source = &self.collaborators.source;
        let mut session = source.open_session().await?;

        let result = match command {
            Command::AddVideo { path, display_name } => {
                self.add_video(session.as_mut(), path, display_name).await
            }
            Command::CheckForBetter => self.check_for_better(session.as_mut()).await,
        };

        session.close().await;
        result
    }

    async fn add_video(
        &self,
        session: &mut dyn SubtitleSession,
        path: &str,
        display_name: &str,
    ) -> Result<(), CommandError> {
        info!(path, name = display_name, "Adding video");

        let hasher = Arc::clone(&self.collaborators.hasher);
        let file = Path::new(path).to_path_buf();
        let content = tokio::task::spawn_blocking(move || hasher.hash(&file)).await??;
        let identity = self
            .collaborators
            .identifier
            .identify(display_name)
            .with_content(content);

        self.catalog.upsert_video(path, &identity, Utc::now())?;

        let minimum = self.settings.minimum.for_kind(identity.kind());
        for language in &self.settings.languages {
            self.download_best(session, path, &identity, language, AcceptanceRule::AtLeast(minimum))
                .await?;
        }

        Ok(())
    }

    async fn check_for_better(&self, session: &mut dyn SubtitleSession) -> Result<(), CommandError> {
        let cutoff = recheck_cutoff(Utc::now(), self.settings.search_for_days);
        let incomplete =
            self.catalog
                .incomplete_videos(&self.settings.languages, &self.settings.desired, cutoff)?;

        info!(videos = incomplete.len(), "Checking for better subtitles");

        for video in &incomplete {
            for need in &video.needs {
                self.download_best(
                    session,
                    &video.path,
                    &video.identity,
                    &need.language,
                    AcceptanceRule::Exceeds(need.current_score),
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Download the best unseen candidate for one language if `rule` accepts it.
    ///
    /// Source failures are logged and leave the language without a download.
    async fn download_best(
        &self,
        session: &mut dyn SubtitleSession,
        path: &str,
        identity: &Identity,
        language: &str,
        rule: AcceptanceRule,
    ) -> Result<Option<u32>, CommandError> {
        let source = &self.collaborators.source;
        let candidates = match session
            .list_candidates(identity, &[language.to_string()])
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(path, language, provider = source.name(), error = %e, "Listing subtitles failed");
                Vec::new()
            }
        };

        let downloads = self.catalog.downloads_for(path)?;
        let already = downloads.get(language).map(Vec::as_slice).unwrap_or(&[]);
        let kind = identity.kind();

        let selection = select_best(identity, language, &candidates, already, |provider| {
            source.score_weights(provider, kind)
        });
        let Some(candidate) = selection.candidate else {
            debug!(path, language, "No new subtitle candidates");
            return Ok(None);
        };

        if !rule.accepts(selection.score) {
            info!(
                path,
                language,
                score = selection.score,
                rule = ?rule,
                "Best subtitle not good enough"
            );
            return Ok(None);
        }

        let content = match session.fetch_content(candidate).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path,
                    language,
                    provider = %candidate.provider,
                    subtitle_id = %candidate.subtitle_id,
                    error = %e,
                    "Subtitle download failed"
                );
                return Ok(None);
            }
        };

        let written = output::write_subtitle(Path::new(path), language, &content).await?;
        self.catalog.record_download(
            path,
            &candidate.provider,
            &candidate.subtitle_id,
            language,
            selection.score,
        )?;

        info!(
            path,
            language,
            score = selection.score,
            provider = %candidate.provider,
            subtitle = %written.display(),
            "Downloaded subtitle"
        );

        Ok(Some(selection.score))
    }
}
