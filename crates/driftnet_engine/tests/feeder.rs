use std::sync::Arc;
use std::time::Duration;

use driftnet_core::{canonicalize, DeviceProfile};
use driftnet_engine::{
    ContentStore, FeedIngestor, FeederSettings, HttpRenderer, Ingestor, SqliteStore,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> FeederSettings {
    FeederSettings {
        entry_delay: Duration::from_millis(1),
        profile_delay: Duration::from_millis(1),
        default_submitter: "feeder-test".to_string(),
    }
}

async fn harness() -> (TempDir, Arc<SqliteStore>, FeedIngestor) {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(
        SqliteStore::connect(&dir.path().join("feeder.db"))
            .await
            .expect("connect"),
    );
    let renderer = Arc::new(HttpRenderer::default());
    let ingestor = Ingestor::new(store.clone(), renderer.clone());
    let feeder = FeedIngestor::new(renderer, ingestor, fast_settings());
    (dir, store, feeder)
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn a_feed_pass_stores_every_reachable_entry() {
    let (_dir, store, feeder) = harness().await;
    let server = MockServer::start().await;
    serve(&server, "/a", "<html>a</html>".to_string()).await;
    serve(&server, "/b", "<html>b</html>".to_string()).await;
    let rss = format!(
        "<rss><channel>\
         <item><title>A</title><link>{0}/a</link></item>\
         <item><title>B</title><link>{0}/b</link></item>\
         </channel></rss>",
        server.uri()
    );
    serve(&server, "/feed.xml", rss).await;

    let summary = feeder
        .ingest_feed(&format!("{}/feed.xml", server.uri()), DeviceProfile::Desktop)
        .await
        .expect("feed ok");

    assert_eq!(summary.stored, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    for route in ["/a", "/b"] {
        let link = canonicalize(&format!("{}{route}", server.uri())).expect("canonical");
        assert!(store
            .exists(&link, DeviceProfile::Desktop)
            .await
            .expect("exists"));
    }
}

#[tokio::test]
async fn a_second_pass_skips_what_the_first_stored() {
    let (_dir, _store, feeder) = harness().await;
    let server = MockServer::start().await;
    serve(&server, "/a", "<html>a</html>".to_string()).await;
    let rss = format!(
        "<rss><channel><item><title>A</title><link>{}/a</link></item></channel></rss>",
        server.uri()
    );
    serve(&server, "/feed.xml", rss).await;
    let feed_url = format!("{}/feed.xml", server.uri());

    let first = feeder
        .ingest_feed(&feed_url, DeviceProfile::Desktop)
        .await
        .expect("feed ok");
    assert_eq!((first.stored, first.skipped), (1, 0));

    let second = feeder
        .ingest_feed(&feed_url, DeviceProfile::Desktop)
        .await
        .expect("feed ok");
    assert_eq!((second.stored, second.skipped), (0, 1));
}

#[tokio::test]
async fn broken_entries_are_tallied_without_aborting_the_feed() {
    let (_dir, store, feeder) = harness().await;
    let server = MockServer::start().await;
    serve(&server, "/good", "<html>good</html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let rss = format!(
        "<rss><channel>\
         <item><title>Bad</title><link>{0}/bad</link></item>\
         <item><title>Good</title><link>{0}/good</link></item>\
         </channel></rss>",
        server.uri()
    );
    serve(&server, "/feed.xml", rss).await;

    let summary = feeder
        .ingest_feed(&format!("{}/feed.xml", server.uri()), DeviceProfile::Desktop)
        .await
        .expect("feed ok");

    assert_eq!(summary.stored, 1);
    assert_eq!(summary.failed, 1);
    let good = canonicalize(&format!("{}/good", server.uri())).expect("canonical");
    assert!(store
        .exists(&good, DeviceProfile::Desktop)
        .await
        .expect("exists"));
}

#[tokio::test]
async fn the_batch_pass_covers_both_profiles() {
    let (_dir, store, feeder) = harness().await;
    let server = MockServer::start().await;
    serve(&server, "/a", "<html>a</html>".to_string()).await;
    let rss = format!(
        "<rss><channel><item><title>A</title><link>{}/a</link></item></channel></rss>",
        server.uri()
    );
    serve(&server, "/feed.xml", rss).await;

    feeder
        .ingest_all_feeds(&[format!("{}/feed.xml", server.uri())])
        .await;

    let link = canonicalize(&format!("{}/a", server.uri())).expect("canonical");
    assert!(store
        .exists(&link, DeviceProfile::Desktop)
        .await
        .expect("exists"));
    assert!(store
        .exists(&link, DeviceProfile::Mobile)
        .await
        .expect("exists"));
}

#[tokio::test]
async fn an_unreachable_feed_is_an_error() {
    let (_dir, _store, feeder) = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(feeder
        .ingest_feed(&format!("{}/feed.xml", server.uri()), DeviceProfile::Desktop)
        .await
        .is_err());
}
