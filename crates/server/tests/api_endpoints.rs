mod common;

use axum::http::StatusCode;
use serde_json::json;
use subrecall_core::managers::ResolvedFile;
use subrecall_core::output::subtitle_path;
use subrecall_core::VideoCatalog;

use common::{fixtures, TestFixture};

const MOVIE_FILE: &str = "Arrival.2016.1080p.BluRay.x264-GRP.mkv";

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["opensubtitles"]["api_key_configured"], true);
    assert_eq!(response.body["sonarr"]["url"], "http://sonarr.local:8989");
    assert_eq!(response.body["couchpotato"]["poll_attempts"], 3);
    assert_eq!(response.body["subtitles"]["languages"], json!(["en"]));

    let text = response.body.to_string();
    assert!(!text.contains("secret-key"));
    assert!(!text.contains("sonarr-key"));
    assert!(!text.contains("couchpotato-key"));
}

#[tokio::test]
async fn test_queue_status_starts_empty() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/queue").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"pending": 0, "processed": 0, "failed": 0})
    );
}

// ============================================================================
// Direct add
// ============================================================================

#[tokio::test]
async fn test_add_downloads_subtitle_after_drain() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .add_candidate(
            fixtures::movie_candidate("101", "en", "Arrival", Some(2016)),
            "1\n00:00:01,000 --> 00:00:02,000\nHello\n",
        )
        .await;
    let video = fixture.video_path(MOVIE_FILE);

    let response = fixture
        .post("/add", json!({"path": video.to_string_lossy()}))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "queued");

    let drained = fixture.post_empty("/queue/drain").await;
    assert_status!(drained, StatusCode::OK);
    assert_eq!(drained.body["pending"], 0);
    assert_eq!(drained.body["processed"], 1);

    let content = std::fs::read_to_string(subtitle_path(&video, "en")).unwrap();
    assert!(content.contains("Hello"));

    let downloads = fixture
        .catalog()
        .downloads_for(&video.to_string_lossy())
        .unwrap();
    assert_eq!(downloads["en"][0].subtitle_id, "101");
    assert_eq!(downloads["en"][0].score, 45);
}

#[tokio::test]
async fn test_add_uses_display_name_for_identification() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .add_candidate(fixtures::movie_candidate("101", "en", "Arrival", Some(2016)), "x")
        .await;
    // The file name alone identifies nothing useful
    let video = fixture.video_path("movie.mkv");

    let response = fixture
        .post(
            "/add",
            json!({"path": video.to_string_lossy(), "name": MOVIE_FILE}),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    fixture.post_empty("/queue/drain").await;

    assert!(subtitle_path(&video, "en").exists());
}

#[tokio::test]
async fn test_add_rejects_empty_path() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/add", json!({"path": "  "})).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.queue.status().pending, 0);
}

#[tokio::test]
async fn test_add_rejects_malformed_json() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw("/add", "{not json").await;

    assert!(response.status.is_client_error());
    assert_eq!(fixture.queue.status().pending, 0);
}

#[tokio::test]
async fn test_add_rejects_missing_path() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/add", json!({"name": "Arrival"})).await;

    assert!(response.status.is_client_error());
    assert_eq!(fixture.queue.status().pending, 0);
}

// ============================================================================
// Episode manager events
// ============================================================================

#[tokio::test]
async fn test_episode_event_enqueues_resolved_files() {
    let fixture = TestFixture::new().await;
    let video = fixture.video_path("Show.S01E02.mkv");
    fixture
        .episode_manager
        .insert(
            7,
            ResolvedFile {
                path: video.to_string_lossy().to_string(),
                scene_name: Some("Show.S01E02.720p.HDTV.x264-GRP".to_string()),
            },
        )
        .await;
    fixture
        .source
        .add_candidate(
            fixtures::episode_candidate("e1", "en", "Show", 1, 2, Some("GRP")),
            "episode",
        )
        .await;

    let response = fixture
        .post(
            "/add/episode-event",
            json!({"EventType": "Download", "Episodes": [{"Id": 7}]}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["enqueued"], 1);

    fixture.post_empty("/queue/drain").await;
    assert_eq!(
        std::fs::read_to_string(subtitle_path(&video, "en")).unwrap(),
        "episode"
    );
    let downloads = fixture
        .catalog()
        .downloads_for(&video.to_string_lossy())
        .unwrap();
    assert_eq!(downloads["en"][0].score, 120);
}

#[tokio::test]
async fn test_episode_probe_event_is_ignored() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/add/episode-event", json!({"EventType": "Test"}))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ignored");
    assert_eq!(fixture.episode_manager.call_count().await, 0);
    assert_eq!(fixture.queue.status().pending, 0);
}

#[tokio::test]
async fn test_episode_event_skips_unknown_episodes() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/add/episode-event",
            json!({"EventType": "Download", "Episodes": [{"Id": 99}]}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["enqueued"], 0);
    assert_eq!(fixture.episode_manager.recorded_calls().await, vec![99]);
}

// ============================================================================
// Movie manager events
// ============================================================================

#[tokio::test]
async fn test_movie_event_polls_then_enqueues() {
    let fixture = TestFixture::new().await;
    let video = fixture.video_path(MOVIE_FILE);
    // Not listed yet on the first lookup
    fixture.movie_manager.push_response(Ok(None)).await;
    fixture
        .movie_manager
        .push_response(Ok(Some(ResolvedFile {
            path: video.to_string_lossy().to_string(),
            scene_name: None,
        })))
        .await;
    fixture
        .source
        .add_candidate(fixtures::movie_candidate("101", "en", "Arrival", Some(2016)), "x")
        .await;

    let response = fixture
        .post_form(
            "/add/movie-event",
            "message=Downloaded+Arrival+%282016%29&imdb_id=tt2543164",
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "polling");

    fixture.wait_for_commands(1).await;
    assert_eq!(fixture.movie_manager.recorded_calls().await, vec!["tt2543164"; 2]);
    assert!(subtitle_path(&video, "en").exists());
}

#[tokio::test]
async fn test_movie_event_other_messages_are_ignored() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form("/add/movie-event", "message=Snatched+Arrival&imdb_id=tt2543164")
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ignored");
    assert_eq!(fixture.movie_manager.call_count().await, 0);
}

#[tokio::test]
async fn test_movie_event_without_id_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form("/add/movie-event", "message=Downloaded+Arrival")
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.movie_manager.call_count().await, 0);
}

// ============================================================================
// Rechecks
// ============================================================================

#[tokio::test]
async fn test_check_enqueues_recheck() {
    let fixture = TestFixture::new().await;
    let video = fixture.video_path(MOVIE_FILE);
    fixture
        .source
        .add_candidate(fixtures::movie_candidate("1", "en", "Arrival", None), "title only")
        .await;

    // Title-only match (15) is under the minimum of 20
    fixture
        .post("/add", json!({"path": video.to_string_lossy()}))
        .await;
    fixture.post_empty("/queue/drain").await;
    assert!(!subtitle_path(&video, "en").exists());

    fixture
        .source
        .add_candidate(fixtures::movie_candidate("2", "en", "Arrival", Some(2016)), "better")
        .await;
    let response = fixture.post_empty("/check").await;
    assert_status!(response, StatusCode::ACCEPTED);

    let drained = fixture.post_empty("/queue/drain").await;
    assert_eq!(drained.body["processed"], 2);
    assert_eq!(
        std::fs::read_to_string(subtitle_path(&video, "en")).unwrap(),
        "better"
    );
}
