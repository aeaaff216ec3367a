use std::sync::Arc;

use driftnet_core::{canonicalize, DeviceProfile, IngestOutcome};
use driftnet_engine::{ContentStore, HttpRenderer, Ingestor, SqliteStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn harness() -> (TempDir, Arc<SqliteStore>, Ingestor) {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(
        SqliteStore::connect(&dir.path().join("ingest.db"))
            .await
            .expect("connect"),
    );
    let renderer = Arc::new(HttpRenderer::default());
    let ingestor = Ingestor::new(store.clone(), renderer);
    (dir, store, ingestor)
}

async fn serve_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn a_fresh_link_is_fetched_and_stored_once() {
    let (_dir, store, ingestor) = harness().await;
    let server = MockServer::start().await;
    serve_page(&server, "/article", "<html>story</html>").await;
    let url = format!("{}/article", server.uri());

    let first = ingestor
        .ingest(&url, "Story", "feed", "tester", DeviceProfile::Desktop)
        .await;
    assert_eq!(first, IngestOutcome::Stored);

    let second = ingestor
        .ingest(&url, "Story", "feed", "tester", DeviceProfile::Desktop)
        .await;
    assert_eq!(second, IngestOutcome::SkippedDuplicate);

    let link = canonicalize(&url).expect("canonical");
    assert!(store
        .exists(&link, DeviceProfile::Desktop)
        .await
        .expect("exists"));
    assert!(!store
        .exists(&link, DeviceProfile::Mobile)
        .await
        .expect("exists"));
}

#[tokio::test]
async fn an_empty_candidate_is_skipped_without_a_fetch() {
    let (_dir, _store, ingestor) = harness().await;
    let outcome = ingestor
        .ingest("   ", "t", "feed", "tester", DeviceProfile::Desktop)
        .await;
    assert_eq!(outcome, IngestOutcome::SkippedEmptyLink);
}

#[tokio::test]
async fn an_unreachable_link_reports_failure_and_stores_nothing() {
    let (_dir, store, ingestor) = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let url = format!("{}/gone", server.uri());

    let outcome = ingestor
        .ingest(&url, "t", "feed", "tester", DeviceProfile::Desktop)
        .await;
    assert!(matches!(outcome, IngestOutcome::Failed(_)));

    let link = canonicalize(&url).expect("canonical");
    assert!(!store
        .exists(&link, DeviceProfile::Desktop)
        .await
        .expect("exists"));
}

#[tokio::test]
async fn items_are_keyed_under_the_redirect_landing_link() {
    let (_dir, store, ingestor) = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/full-story"))
        .mount(&server)
        .await;
    serve_page(&server, "/full-story", "<html>full</html>").await;

    let outcome = ingestor
        .ingest(
            &format!("{}/short", server.uri()),
            "t",
            "feed",
            "tester",
            DeviceProfile::Desktop,
        )
        .await;
    assert_eq!(outcome, IngestOutcome::Stored);

    let landing = canonicalize(&format!("{}/full-story", server.uri())).expect("canonical");
    assert!(store
        .exists(&landing, DeviceProfile::Desktop)
        .await
        .expect("exists"));
}

#[tokio::test]
async fn candidates_collapsing_onto_one_landing_link_store_a_single_item() {
    let (_dir, store, ingestor) = harness().await;
    let server = MockServer::start().await;
    for route in ["/mirror-a", "/mirror-b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/final"))
            .mount(&server)
            .await;
    }
    serve_page(&server, "/final", "<html>final</html>").await;

    let first = ingestor
        .ingest(
            &format!("{}/mirror-a", server.uri()),
            "t",
            "feed",
            "tester",
            DeviceProfile::Desktop,
        )
        .await;
    assert_eq!(first, IngestOutcome::Stored);

    // The second candidate passes the pre-fetch dedup check (its own
    // link is unseen) and only collides on the landing link at persist
    // time.
    let second = ingestor
        .ingest(
            &format!("{}/mirror-b", server.uri()),
            "t",
            "feed",
            "tester",
            DeviceProfile::Desktop,
        )
        .await;
    assert_eq!(second, IngestOutcome::SkippedDuplicate);

    let landing = canonicalize(&format!("{}/final", server.uri())).expect("canonical");
    assert!(store
        .exists(&landing, DeviceProfile::Desktop)
        .await
        .expect("exists"));
    for route in ["/mirror-a", "/mirror-b"] {
        let candidate = canonicalize(&format!("{}{route}", server.uri())).expect("canonical");
        assert!(!store
            .exists(&candidate, DeviceProfile::Desktop)
            .await
            .expect("exists"));
    }
}

#[tokio::test]
async fn stored_content_is_transliterated_to_ascii() {
    let (_dir, store, ingestor) = harness().await;
    let server = MockServer::start().await;
    serve_page(&server, "/cafe", "<html>caf\u{e9} on the corner</html>").await;
    let url = format!("{}/cafe", server.uri());

    let outcome = ingestor
        .ingest(&url, "Cafe", "feed", "tester", DeviceProfile::Desktop)
        .await;
    assert_eq!(outcome, IngestOutcome::Stored);

    let sampled = store
        .sample_random(DeviceProfile::Desktop)
        .await
        .expect("sample")
        .expect("stored");
    assert_eq!(
        String::from_utf8(sampled.content).expect("utf8"),
        "<html>cafe on the corner</html>"
    );
}
