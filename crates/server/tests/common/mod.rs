//! Common test utilities for endpoint testing with mocks.
//!
//! The fixture builds the real router, queue, worker and SQLite catalog and
//! injects mocks for the subtitle source, the media managers and the video
//! identifier/hasher, so no network or real video file is needed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use subrecall_core::normalizer::PollSettings;
use subrecall_core::testing::{
    MockEpisodeManager, MockHasher, MockIdentifier, MockMovieManager, MockSubtitleSource,
};
use subrecall_core::{
    create_command_queue, load_config_from_str, CommandQueue, CommandSink, EpisodeManager,
    EventNormalizer, MovieManager, SqliteCatalog,
};
use subrecall_server::state::AppState;

/// Re-export fixtures for test convenience
pub use subrecall_core::testing::fixtures;

/// Test fixture with the full request path wired to mock collaborators.
///
/// Thresholds are 20 (minimum) and 40 (desired) for every kind, with
/// [`fixtures::weights`] as the source's weights.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock subtitle source - configure candidates
    pub source: MockSubtitleSource,
    /// Mock episode manager - configure episode files
    pub episode_manager: Arc<MockEpisodeManager>,
    /// Mock movie manager - configure release lookups
    pub movie_manager: Arc<MockMovieManager>,
    /// Queue handle shared with the router
    pub queue: CommandQueue,
    /// Temporary directory for the database and video files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 5000

[subtitles]
languages = ["en"]
min_movie_score = 20
min_episode_score = 20
desired_movie_score = 40
desired_episode_score = 40

[opensubtitles]
api_key = "secret-key"

[sonarr]
url = "http://sonarr.local:8989"
api_key = "sonarr-key"

[couchpotato]
url = "http://couchpotato.local:5050"
api_key = "couchpotato-key"
poll_attempts = 3
"#;

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");
        config.database.path = db_path.clone();

        let source = MockSubtitleSource::new(fixtures::weights());
        let episode_manager = Arc::new(MockEpisodeManager::new());
        let movie_manager = Arc::new(MockMovieManager::new());

        let catalog = SqliteCatalog::new(&db_path).expect("Failed to create catalog");
        let (queue, worker) = create_command_queue(
            Box::new(catalog),
            fixtures::collaborators(&source, MockIdentifier::new(), MockHasher::new()),
            config.subtitles.worker_settings(),
        );
        tokio::spawn(worker.run());

        let sink: Arc<dyn CommandSink> = Arc::new(queue.clone());
        let normalizer = EventNormalizer::new(sink)
            .with_episode_manager(Arc::clone(&episode_manager) as Arc<dyn EpisodeManager>)
            .with_movie_manager(
                Arc::clone(&movie_manager) as Arc<dyn MovieManager>,
                PollSettings::new(3, Duration::from_millis(10)),
            );

        let state = Arc::new(AppState::new(config, normalizer, queue.clone()));
        let router = subrecall_server::api::create_router(state);

        Self {
            router,
            source,
            episode_manager,
            movie_manager,
            queue,
            temp_dir,
        }
    }

    /// A path for a video inside the fixture's temp dir. The file is not created;
    /// hashing is mocked.
    pub fn video_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join(file_name)
    }

    /// A second connection to the fixture's database for inspecting results.
    pub fn catalog(&self) -> SqliteCatalog {
        SqliteCatalog::new(&self.temp_dir.path().join("test.db")).expect("Failed to open catalog")
    }

    /// Wait until the worker has finished `count` commands, successful or not.
    pub async fn wait_for_commands(&self, count: u64) {
        for _ in 0..200 {
            let status = self.queue.status();
            if status.processed + status.failed >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Worker did not finish {} commands in time", count);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with a form-encoded body.
    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/x-www-form-urlencoded")
            .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
