//! End-to-end tests of the HTTP API over in-memory stores and fake
//! collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use sara_domain::clock::ManualClock;
use sara_domain::config::{Config, ResetPolicy, ServiceQuota, SERVICE_LLM};
use sara_domain::error::{Error, Result};
use sara_gateway::bootstrap::{self, Stores};
use sara_gateway::state::AppState;
use sara_providers::{Completer, CompletionRequest, TranscriptSegment, TranscriptSource};
use sara_storage::{FileStore, KvStore, MemoryStore};

const VIDEO: &str = "dQw4w9WgXcQ";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fakes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct FakeTranscripts {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if video_id == "noCaptions1" {
            return Err(Error::TranscriptUnavailable(video_id.to_owned()));
        }
        Ok(vec![
            TranscriptSegment {
                text: "rust is".into(),
                offset_ms: 0,
                duration_ms: 1000,
            },
            TranscriptSegment {
                text: "memory safe".into(),
                offset_ms: 1000,
                duration_ms: 1500,
            },
        ])
    }
}

#[derive(Default)]
struct FakeLlm {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl Completer for FakeLlm {
    async fn complete(&self, req: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::collaborator("llm", "upstream 503", true));
        }
        if req.prompt.contains("TLDR") {
            Ok("• one\n• two\n• three\n• four\n• five".into())
        } else {
            Ok("Introduction\nRust is memory safe.\n\nConclusion\nUse it.".into())
        }
    }

    fn completer_id(&self) -> &str {
        "fake"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Harness {
    app: Router,
    state: AppState,
    transcripts: Arc<FakeTranscripts>,
    llm: Arc<FakeLlm>,
    clock: Arc<ManualClock>,
}

fn harness_with(config: Config, store: Arc<dyn KvStore>, llm: FakeLlm) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let transcripts = Arc::new(FakeTranscripts::default());
    let llm = Arc::new(llm);
    let stores = Stores::over(&config, store, clock.clone());
    let state = bootstrap::assemble(Arc::new(config), stores, transcripts.clone(), llm.clone());
    let app = sara_gateway::api::router().with_state(state.clone());
    Harness {
        app,
        state,
        transcripts,
        llm,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(
        Config::default(),
        Arc::new(MemoryStore::new()),
        FakeLlm::default(),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health & quotas
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_lists_services() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"], json!(["llm", "transcript"]));
}

#[tokio::test]
async fn fresh_quotas_have_full_remaining() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/v1/quotas", None).await;
    assert_eq!(status, StatusCode::OK);
    for q in body["quotas"].as_array().unwrap() {
        assert_eq!(q["remaining"], q["ceiling"]);
        assert_eq!(q["used"], 0);
    }

    let (status, body) = send(&h.app, "GET", "/v1/quotas/llm", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ceiling"], 50);

    let (status, body) = send(&h.app, "GET", "/v1/quotas/youtube", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Metered content
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn transcript_is_cached_after_first_fetch() {
    let h = harness();
    let uri = format!("/v1/transcript?videoId={VIDEO}");

    let (status, first) = send(&h.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fromCache"], false);
    assert_eq!(first["quotaRemaining"], 99);
    assert_eq!(first["data"][1]["text"], "memory safe");
    assert_eq!(first["data"][1]["offset"], 1000);

    let (status, second) = send(&h.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fromCache"], true);
    assert_eq!(second["data"], first["data"]);

    assert_eq!(h.transcripts.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.state.quota.quota_info("transcript").unwrap().used, 1);
}

#[tokio::test]
async fn transcript_accepts_urls_and_rejects_garbage() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        "GET",
        &format!("/v1/transcript?videoId=https%3A%2F%2Fyoutu.be%2F{VIDEO}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], false);

    let (status, body) = send(&h.app, "GET", "/v1/transcript?videoId=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn missing_captions_spend_nothing() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/v1/transcript?videoId=noCaptions1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_AVAILABLE");
    assert_eq!(h.state.quota.quota_info("transcript").unwrap().used, 0);
}

#[tokio::test]
async fn article_spends_one_unit_of_each_service() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/article",
        Some(json!({ "videoId": VIDEO, "title": "Why Rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Why Rust");
    assert_eq!(body["data"]["sections"][0]["heading"], "Introduction");
    assert_eq!(body["data"]["sections"][1]["paragraphs"][0], "Use it.");
    assert_eq!(body["data"]["estimatedReadMinutes"], 1);

    assert_eq!(h.state.quota.quota_info("llm").unwrap().used, 1);
    assert_eq!(h.state.quota.quota_info("transcript").unwrap().used, 1);

    // A repeat is served from cache and spends nothing further.
    let (_, again) = send(
        &h.app,
        "POST",
        "/v1/article",
        Some(json!({ "videoId": VIDEO, "title": "Why Rust" })),
    )
    .await;
    assert_eq!(again["fromCache"], true);
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.state.quota.quota_info("llm").unwrap().used, 1);
}

#[tokio::test]
async fn llm_failure_is_bad_gateway_and_free() {
    let h = harness_with(
        Config::default(),
        Arc::new(MemoryStore::new()),
        FakeLlm {
            fail: true,
            ..FakeLlm::default()
        },
    );
    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/summary",
        Some(json!({ "videoId": VIDEO, "title": "T", "article": "Some text." })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "API_ERROR");
    assert_eq!(body["details"]["transient"], true);
    let info = h.state.quota.quota_info("llm").unwrap();
    assert_eq!(info.used, 0);
    assert_eq!(info.pending, 0);
}

#[tokio::test]
async fn summary_requires_article_text() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/summary",
        Some(json!({ "videoId": VIDEO, "title": "T", "article": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_quota_is_rate_limited_until_reset() {
    let mut config = Config::default();
    config.quota.services.insert(
        SERVICE_LLM.into(),
        ServiceQuota {
            ceiling: 2,
            reset: ResetPolicy::Rolling { window_secs: 3600 },
        },
    );
    let h = harness_with(config, Arc::new(MemoryStore::new()), FakeLlm::default());

    for video in ["aaaaaaaaaaa", "bbbbbbbbbbb"] {
        let (status, _) = send(
            &h.app,
            "POST",
            "/v1/summary",
            Some(json!({ "videoId": video, "article": "text" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/summary",
        Some(json!({ "videoId": "ccccccccccc", "article": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMIT");
    assert_eq!(body["details"]["service"], "llm");
    assert_eq!(body["details"]["remaining"], 0);
    assert_eq!(body["details"]["ceiling"], 2);
    assert!(body["details"]["resetAt"].is_string());
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 2);

    // Cached results are still served while the quota is exhausted.
    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/summary",
        Some(json!({ "videoId": "aaaaaaaaaaa", "article": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], true);

    h.clock.advance(Duration::hours(1));
    let (status, _) = send(
        &h.app,
        "POST",
        "/v1/summary",
        Some(json!({ "videoId": "ccccccccccc", "article": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cache administration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn cache_stats_remove_and_clear() {
    let h = harness();
    send(&h.app, "GET", &format!("/v1/transcript?videoId={VIDEO}"), None).await;

    let (status, stats) = send(&h.app, "GET", "/v1/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalEntries"], 1);
    assert_eq!(stats["misses"], 1);
    assert!(stats["totalSizeBytes"].as_u64().unwrap() > 0);

    let key = format!("transcript_{VIDEO}");
    let (status, _) = send(&h.app, "DELETE", &format!("/v1/cache/{key}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&h.app, "DELETE", &format!("/v1/cache/{key}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    h.state.cache.set("other", json!(1), None).unwrap();
    let (status, _) = send(&h.app, "DELETE", "/v1/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.state.cache.stats().total_entries, 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// History
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn history_lifecycle() {
    let h = harness();

    let (status, entry) = send(
        &h.app,
        "POST",
        "/v1/history",
        Some(json!({ "videoId": VIDEO, "title": "Song" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["readingProgress"], 0);

    let (status, body) = send(
        &h.app,
        "PUT",
        &format!("/v1/history/{VIDEO}/progress"),
        Some(json!({ "progress": 180 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["readingProgress"], 100);

    let (_, body) = send(&h.app, "POST", &format!("/v1/history/{VIDEO}/favorite"), None).await;
    assert_eq!(body["favorite"], true);

    let (_, favorites) = send(&h.app, "GET", "/v1/history/favorites", None).await;
    assert_eq!(favorites["entries"].as_array().unwrap().len(), 1);

    let (status, export) = send(&h.app, "GET", "/v1/history/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["entries"][0]["videoId"], VIDEO);
    assert!(export["lastUpdated"].is_number());

    let (status, _) = send(&h.app, "DELETE", "/v1/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = send(&h.app, "GET", "/v1/history", None).await;
    assert!(list["entries"].as_array().unwrap().is_empty());

    let (status, body) = send(&h.app, "POST", &format!("/v1/history/{VIDEO}/favorite"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn history_updates_for_unknown_ids_are_not_found() {
    let h = harness();
    let (status, _) = send(
        &h.app,
        "PUT",
        "/v1/history/aaaaaaaaaaa/progress",
        Some(json!({ "progress": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&h.app, "POST", "/v1/history/aaaaaaaaaaa/favorite", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_failure_on_history_write_is_500() {
    let store = Arc::new(MemoryStore::new());
    let h = harness_with(Config::default(), store.clone(), FakeLlm::default());
    store.fail_writes(true);
    let (status, body) = send(
        &h.app,
        "POST",
        "/v1/history",
        Some(json!({ "videoId": VIDEO, "title": "Song" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "STORAGE_ERROR");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Restart
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn state_survives_restart_on_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let open = || -> Arc<dyn KvStore> { Arc::new(FileStore::open(dir.path()).unwrap()) };

    let first = harness_with(Config::default(), open(), FakeLlm::default());
    send(&first.app, "GET", &format!("/v1/transcript?videoId={VIDEO}"), None).await;
    send(
        &first.app,
        "POST",
        "/v1/history",
        Some(json!({ "videoId": VIDEO, "title": "Song" })),
    )
    .await;
    let (_, before) = send(&first.app, "GET", "/v1/quotas", None).await;

    let second = harness_with(Config::default(), open(), FakeLlm::default());
    let (_, after) = send(&second.app, "GET", "/v1/quotas", None).await;
    assert_eq!(before, after);

    let uri = format!("/v1/transcript?videoId={VIDEO}");
    let (_, cached) = send(&second.app, "GET", &uri, None).await;
    assert_eq!(cached["fromCache"], true);
    assert_eq!(second.transcripts.calls.load(Ordering::SeqCst), 0);

    let (_, list) = send(&second.app, "GET", "/v1/history", None).await;
    assert_eq!(list["entries"][0]["title"], "Song");
}
