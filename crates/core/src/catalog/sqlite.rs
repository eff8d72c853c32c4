//! SQLite-backed video catalog implementation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CatalogError, DownloadRecord, IncompleteVideo, Need, VideoCatalog, VideoRecord};
use crate::scoring::ScoreThresholds;
use crate::video::Identity;

/// SQLite-backed video catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- One row per generation; the latest row for a path is current
            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                identity TEXT NOT NULL,
                added_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_videos_added_at ON videos(added_at);

            CREATE TABLE IF NOT EXISTS downloads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                provider TEXT NOT NULL,
                subtitle_id TEXT NOT NULL,
                language TEXT NOT NULL,
                score INTEGER NOT NULL CHECK (score >= 0),
                downloaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_downloads_video ON downloads(video_id, language);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Storage("catalog connection poisoned".to_string()))
    }

    fn video_id(conn: &Connection, path: &str) -> Result<Option<i64>, CatalogError> {
        Ok(conn
            .query_row("SELECT id FROM videos WHERE path = ?", params![path], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Best recorded score per language for one generation.
    fn best_scores(conn: &Connection, video_id: i64) -> Result<BTreeMap<String, u32>, CatalogError> {
        let mut stmt = conn.prepare(
            "SELECT language, MAX(score) FROM downloads WHERE video_id = ? GROUP BY language",
        )?;
        let rows = stmt.query_map(params![video_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut best = BTreeMap::new();
        for row in rows {
            let (language, score) = row?;
            best.insert(language, score);
        }
        Ok(best)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed width so lexical order matches chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CatalogError::Serialization(format!("invalid timestamp {:?}: {}", s, e)))
}

impl VideoCatalog for SqliteCatalog {
    fn upsert_video(
        &self,
        path: &str,
        identity: &Identity,
        added_at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let identity_json = serde_json::to_string(identity)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM downloads WHERE video_id IN (SELECT id FROM videos WHERE path = ?)",
            params![path],
        )?;
        tx.execute("DELETE FROM videos WHERE path = ?", params![path])?;
        tx.execute(
            "INSERT INTO videos (path, kind, identity, added_at) VALUES (?, ?, ?, ?)",
            params![
                path,
                identity.kind().as_str(),
                &identity_json,
                format_timestamp(added_at),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_download(
        &self,
        path: &str,
        provider: &str,
        subtitle_id: &str,
        language: &str,
        score: u32,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let video_id =
            Self::video_id(&conn, path)?.ok_or_else(|| CatalogError::NotFound(path.to_string()))?;

        conn.execute(
            "INSERT INTO downloads (video_id, provider, subtitle_id, language, score, downloaded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                video_id,
                provider,
                subtitle_id,
                language,
                score,
                format_timestamp(Utc::now()),
            ],
        )?;

        Ok(())
    }

    fn downloads_for(&self, path: &str) -> Result<BTreeMap<String, Vec<DownloadRecord>>, CatalogError> {
        let conn = self.lock()?;
        let video_id =
            Self::video_id(&conn, path)?.ok_or_else(|| CatalogError::NotFound(path.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT provider, subtitle_id, language, score, downloaded_at
             FROM downloads WHERE video_id = ?
             ORDER BY score DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![video_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut by_language: BTreeMap<String, Vec<DownloadRecord>> = BTreeMap::new();
        for row in rows {
            let (provider, subtitle_id, language, score, downloaded_at) = row?;
            let record = DownloadRecord {
                provider,
                subtitle_id,
                language,
                score,
                downloaded_at: parse_timestamp(&downloaded_at)?,
            };
            by_language
                .entry(record.language.clone())
                .or_default()
                .push(record);
        }
        Ok(by_language)
    }

    fn incomplete_videos(
        &self,
        languages: &[String],
        desired: &ScoreThresholds,
        not_older_than: DateTime<Utc>,
    ) -> Result<Vec<IncompleteVideo>, CatalogError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, path, identity FROM videos WHERE added_at >= ? ORDER BY added_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![format_timestamp(not_older_than)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut videos = Vec::new();
        for row in rows {
            videos.push(row?);
        }

        let mut incomplete = Vec::new();
        for (video_id, path, identity_json) in videos {
            let identity: Identity = serde_json::from_str(&identity_json)?;
            let threshold = desired.satisfied_at(identity.kind());
            let best = Self::best_scores(&conn, video_id)?;

            let needs: Vec<Need> = languages
                .iter()
                .map(|language| Need {
                    language: language.clone(),
                    current_score: best.get(language).copied().unwrap_or(0),
                })
                .filter(|need| threshold.is_none_or(|t| need.current_score < t))
                .collect();

            if !needs.is_empty() {
                incomplete.push(IncompleteVideo {
                    path,
                    identity,
                    needs,
                });
            }
        }

        Ok(incomplete)
    }

    fn video(&self, path: &str) -> Result<Option<VideoRecord>, CatalogError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT path, identity, added_at FROM videos WHERE path = ?",
                params![path],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((path, identity_json, added_at)) => Ok(Some(VideoRecord {
                path,
                identity: serde_json::from_str(&identity_json)?,
                added_at: parse_timestamp(&added_at)?,
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::MediaTarget;
    use chrono::Duration;

    fn create_test_catalog() -> SqliteCatalog {
        SqliteCatalog::in_memory().unwrap()
    }

    fn movie(title: &str) -> Identity {
        Identity::new(
            format!("{}.2016.mkv", title),
            MediaTarget::Movie {
                title: title.to_string(),
                year: Some(2016),
            },
        )
    }

    fn episode() -> Identity {
        Identity::new(
            "Series.S01E01.mkv",
            MediaTarget::Episode {
                series: "Series".to_string(),
                season: 1,
                episode: 1,
                title: None,
                year: None,
            },
        )
    }

    fn desired() -> ScoreThresholds {
        ScoreThresholds::new(40, 100)
    }

    fn languages() -> Vec<String> {
        vec!["en".to_string(), "pt-BR".to_string()]
    }

    #[test]
    fn test_upsert_and_get_video() {
        let catalog = create_test_catalog();
        let now = Utc::now();
        catalog.upsert_video("/m/a.mkv", &movie("A"), now).unwrap();

        let record = catalog.video("/m/a.mkv").unwrap().unwrap();
        assert_eq!(record.identity, movie("A"));
        assert_eq!(record.added_at.timestamp_micros(), now.timestamp_micros());
        assert!(catalog.video("/m/missing.mkv").unwrap().is_none());
    }

    #[test]
    fn test_record_download_requires_generation() {
        let catalog = create_test_catalog();
        let result = catalog.record_download("/m/a.mkv", "fake", "1", "en", 10);
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_downloads_sorted_by_score_desc() {
        let catalog = create_test_catalog();
        catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "1", "en", 30).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "2", "en", 50).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "3", "pt-BR", 20).unwrap();

        let downloads = catalog.downloads_for("/m/a.mkv").unwrap();
        let en: Vec<_> = downloads["en"].iter().map(|d| d.score).collect();
        assert_eq!(en, vec![50, 30]);
        assert_eq!(downloads["pt-BR"].len(), 1);
        assert_eq!(downloads["pt-BR"][0].subtitle_id, "3");
    }

    #[test]
    fn test_upsert_replaces_generation() {
        let catalog = create_test_catalog();
        catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "1", "en", 30).unwrap();

        catalog.upsert_video("/m/a.mkv", &movie("B"), Utc::now()).unwrap();

        assert!(catalog.downloads_for("/m/a.mkv").unwrap().is_empty());
        assert_eq!(catalog.video("/m/a.mkv").unwrap().unwrap().identity, movie("B"));
    }

    #[test]
    fn test_downloads_for_unknown_path() {
        let catalog = create_test_catalog();
        assert!(matches!(
            catalog.downloads_for("/nope"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_incomplete_videos_reports_missing_languages() {
        let catalog = create_test_catalog();
        catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "1", "en", 25).unwrap();

        let incomplete = catalog
            .incomplete_videos(&languages(), &desired(), Utc::now() - Duration::days(7))
            .unwrap();

        assert_eq!(incomplete.len(), 1);
        assert_eq!(
            incomplete[0].needs,
            vec![
                Need {
                    language: "en".to_string(),
                    current_score: 25
                },
                Need {
                    language: "pt-BR".to_string(),
                    current_score: 0
                },
            ]
        );
    }

    #[test]
    fn test_incomplete_videos_omits_satisfied_pairs() {
        let catalog = create_test_catalog();
        catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "1", "en", 40).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "2", "pt-BR", 41).unwrap();

        // Movie threshold is 40: both satisfied, video omitted entirely.
        let incomplete = catalog
            .incomplete_videos(&languages(), &desired(), Utc::now() - Duration::days(7))
            .unwrap();
        assert!(incomplete.is_empty());

        // The same scores fall short of the episode threshold.
        catalog.upsert_video("/e/s.mkv", &episode(), Utc::now()).unwrap();
        catalog.record_download("/e/s.mkv", "fake", "3", "en", 99).unwrap();
        let incomplete = catalog
            .incomplete_videos(&["en".to_string()], &desired(), Utc::now() - Duration::days(7))
            .unwrap();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].path, "/e/s.mkv");
        assert_eq!(incomplete[0].needs[0].current_score, 99);
    }

    #[test]
    fn test_generic_video_always_needs_rechecking() {
        let catalog = create_test_catalog();
        let generic = Identity::new("home-video.mkv", MediaTarget::Generic);
        catalog.upsert_video("/g/a.mkv", &generic, Utc::now()).unwrap();
        catalog.record_download("/g/a.mkv", "fake", "1", "en", 500).unwrap();

        let incomplete = catalog
            .incomplete_videos(&["en".to_string()], &desired(), Utc::now() - Duration::days(7))
            .unwrap();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].needs[0].current_score, 500);
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let catalog = create_test_catalog();
        catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
        catalog.record_download("/m/a.mkv", "fake", "1", "en", 30).unwrap();
        catalog
            .lock()
            .unwrap()
            .execute_batch(
                "UPDATE videos SET added_at = 'yesterday';
                 UPDATE downloads SET downloaded_at = 'soon';",
            )
            .unwrap();

        assert!(matches!(
            catalog.video("/m/a.mkv"),
            Err(CatalogError::Serialization(_))
        ));
        assert!(matches!(
            catalog.downloads_for("/m/a.mkv"),
            Err(CatalogError::Serialization(_))
        ));
    }

    #[test]
    fn test_incomplete_videos_respects_cutoff() {
        let catalog = create_test_catalog();
        let now = Utc::now();
        catalog
            .upsert_video("/m/old.mkv", &movie("Old"), now - Duration::days(30))
            .unwrap();
        catalog.upsert_video("/m/new.mkv", &movie("New"), now).unwrap();

        let incomplete = catalog
            .incomplete_videos(&languages(), &desired(), now - Duration::days(7))
            .unwrap();
        let paths: Vec<_> = incomplete.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/m/new.mkv"]);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let catalog = create_test_catalog();
        let added = Utc::now() - Duration::days(3);
        catalog.upsert_video("/m/a.mkv", &movie("A"), added).unwrap();

        let incomplete = catalog.incomplete_videos(&languages(), &desired(), added).unwrap();
        assert_eq!(incomplete.len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("catalog.db");

        {
            let catalog = SqliteCatalog::new(&db).unwrap();
            catalog.upsert_video("/m/a.mkv", &movie("A"), Utc::now()).unwrap();
            catalog.record_download("/m/a.mkv", "fake", "1", "en", 12).unwrap();
        }

        let catalog = SqliteCatalog::new(&db).unwrap();
        assert_eq!(catalog.downloads_for("/m/a.mkv").unwrap()["en"][0].score, 12);
    }
}
