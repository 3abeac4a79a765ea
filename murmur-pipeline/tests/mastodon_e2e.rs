use murmur_pipeline::{word_count_histogram, Pipeline, PipelineOptions, Step, DEFAULT_BINS};
use murmur_social::MastodonApi;
use murmur_store::{SqliteStore, Store, TableKind};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account(id: &str, username: &str, note: &str) -> serde_json::Value {
    json!({
        "id": id,
        "username": username,
        "display_name": username,
        "locked": false,
        "created_at": "2022-11-03T00:00:00.000Z",
        "followers_count": 12,
        "following_count": 3,
        "statuses_count": 40,
        "last_status_at": "2024-05-01",
        "note": note
    })
}

#[tokio::test]
async fn unavailable_timeline_leaves_the_database_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/timelines/public"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("murmur.db"));
    let api = MastodonApi::new(&server.uri(), "token".into()).unwrap();
    let pipeline = Pipeline::new(api, store, PipelineOptions::default());

    let (report, table) = pipeline.run_toots().await;

    assert_eq!(report.halted_at(), Some(Step::Fetch));
    assert!(table.is_empty());
    assert!(!dir.path().join("murmur.db").exists());
}

#[tokio::test]
async fn toots_flow_feeds_the_histogram() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/timelines/public"))
        .and(query_param("limit", "10"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "109", "content": "<p>hello there</p>", "account": { "id": "1", "username": "a" } },
            { "id": "108", "content": "<p>a b c d</p>", "account": { "id": "2", "username": "b" } },
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("murmur.db"));
    let api = MastodonApi::new(&server.uri(), "token".into()).unwrap();
    let pipeline = Pipeline::new(api, store, PipelineOptions::default());

    let (report, table) = pipeline.run_toots().await;
    assert!(report.is_clean(), "{report}");

    let bodies: Vec<&str> = table
        .column("content")
        .unwrap()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(bodies, vec!["<p>a b c d</p>", "<p>hello there</p>"]);

    let histogram = word_count_histogram(bodies, DEFAULT_BINS);
    assert_eq!(histogram.total(), 2);
    assert_eq!(histogram.counts.first(), Some(&1));
    assert_eq!(histogram.counts.last(), Some(&1));
}

#[tokio::test]
async fn profiles_flow_projects_the_note_and_labels_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/search"))
        .and(query_param("q", "popsci"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            account("5001", "popsci", "<p>We <b>love</b> science!</p>")
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/search"))
        .and(query_param("q", "cricket"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("murmur.db"));
    let api = MastodonApi::new(&server.uri(), "token".into()).unwrap();
    let pipeline = Pipeline::new(api, store, PipelineOptions::default());

    let report = pipeline.run_profiles().await;
    assert_eq!(report.halted_at(), None);
    assert_eq!(report.rows(Step::StoreDerived), Some(1));

    let profiles = pipeline.store().read_all(TableKind::Profiles, None).await.unwrap();
    assert_eq!(profiles.get_i64(0, "id"), Some(5001));
    assert_eq!(profiles.get_i64(0, "statuses_count"), Some(40));
    assert_eq!(profiles.get_str(0, "created_at"), Some("2022-11-03T00:00:00"));
    assert_eq!(profiles.get_str(0, "last_status_at"), Some("2024-05-01T00:00:00"));

    let sentiment = pipeline.store().read_all(TableKind::Sentiment, None).await.unwrap();
    assert_eq!(sentiment.get_str(0, "username"), Some("popsci"));
    assert_eq!(sentiment.get_str(0, "clean_content"), Some("We love science!"));
    assert_eq!(sentiment.get_str(0, "sentiment"), Some("positive"));
}
