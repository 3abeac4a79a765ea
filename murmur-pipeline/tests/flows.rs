mod common;

use common::{init_test_tracing, profile, CountingStore, FakeSource};
use murmur_common::{Sentiment, Toot};
use murmur_pipeline::{Pipeline, PipelineOptions, Step, StepStatus, StoreFailurePolicy};
use murmur_store::{SqliteStore, Store, TableKind};
use tempfile::TempDir;

fn options(usernames: &[&str]) -> PipelineOptions {
    PipelineOptions {
        usernames: usernames.iter().map(|u| u.to_string()).collect(),
        ..PipelineOptions::default()
    }
}

fn sqlite() -> (TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("murmur.db"));
    (dir, store)
}

/// A store whose database directory does not exist, so every connect fails.
fn broken_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(dir.path().join("missing").join("murmur.db"))
}

#[tokio::test]
async fn failed_timeline_fetch_never_touches_the_store() {
    init_test_tracing();
    let source = FakeSource::default();
    let pipeline = Pipeline::new(source, CountingStore::default(), options(&[]));

    let (report, table) = pipeline.run_toots().await;

    assert_eq!(report.halted_at(), Some(Step::Fetch));
    assert!(table.is_empty());
    assert_eq!(pipeline.store().total_calls(), 0);
}

#[tokio::test]
async fn all_searches_failing_stops_before_any_write() {
    init_test_tracing();
    let source = FakeSource::default()
        .failing_for("popsci")
        .failing_for("cricket");
    let pipeline = Pipeline::new(source, CountingStore::default(), options(&["popsci", "cricket"]));

    let report = pipeline.run_profiles().await;

    assert_eq!(report.halted_at(), Some(Step::Fetch));
    assert!(matches!(report.status(Step::Fetch), Some(StepStatus::Failed { .. })));
    assert_eq!(pipeline.store().total_calls(), 0);
}

#[tokio::test]
async fn one_failed_search_is_skipped() {
    init_test_tracing();
    let source = FakeSource::default()
        .with_account("popsci", vec![profile(1, "popsci", "<p>I love science</p>")])
        .failing_for("cricket");
    let (_dir, store) = sqlite();
    let pipeline = Pipeline::new(source, store, options(&["popsci", "cricket"]));

    let report = pipeline.run_profiles().await;

    assert_eq!(report.halted_at(), None);
    assert_eq!(report.rows(Step::Fetch), Some(1));
    assert_eq!(report.rows(Step::StoreDerived), Some(1));
}

#[tokio::test]
async fn profile_bios_are_cleaned_labelled_and_stored() {
    init_test_tracing();
    let source = FakeSource::default()
        .with_account(
            "popsci",
            vec![
                profile(10, "popsci", "<p>I love this</p>"),
                profile(11, "popsci_fan", "<p>I hate this</p>"),
            ],
        )
        .with_account("cricket", vec![profile(20, "cricket", "")]);
    let (_dir, store) = sqlite();
    let pipeline = Pipeline::new(source, store, options(&["popsci", "cricket"]));

    let report = pipeline.run_profiles().await;
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.rows(Step::StoreRaw), Some(3));
    assert_eq!(report.rows(Step::Classify), Some(3));

    let rows = pipeline
        .store()
        .read_all(TableKind::Sentiment, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.get_str(0, "clean_content"), Some("I love this"));
    assert_eq!(rows.get_str(0, "sentiment"), Some("positive"));
    assert_eq!(rows.get_str(1, "username"), Some("popsci_fan"));
    assert_eq!(rows.get_str(1, "sentiment"), Some("negative"));
    assert_eq!(rows.get_str(2, "clean_content"), Some(""));
    assert_eq!(rows.get_str(2, "sentiment"), Some("neutral"));
}

#[tokio::test]
async fn rerun_overwrites_labels_in_place() {
    init_test_tracing();
    let (dir, store) = sqlite();
    let source = || {
        FakeSource::default().with_account("popsci", vec![profile(1, "popsci", "<b>I love this</b>")])
    };

    let first = Pipeline::new(source(), store, options(&["popsci"]));
    assert!(first.run_profiles().await.is_clean());

    let store = SqliteStore::open(dir.path().join("murmur.db"));
    let second = Pipeline::new(source(), store, options(&["popsci"])).with_scorer(|_: &str| -0.5);
    let report = second.run_profiles().await;
    assert!(report.is_clean(), "{report}");
    // Profiles are insert-only, so the rerun stores nothing new.
    assert_eq!(report.rows(Step::StoreRaw), Some(0));

    let rows = second
        .store()
        .read_all(TableKind::Sentiment, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.get_str(0, "username"), Some("popsci"));
    assert_eq!(rows.get_str(0, "sentiment"), Some(Sentiment::Negative.as_str()));
}

#[tokio::test]
async fn reset_schema_replaces_previous_profiles() {
    init_test_tracing();
    let (dir, store) = sqlite();
    let reset = PipelineOptions {
        reset_schema: true,
        ..options(&["popsci"])
    };

    let first = FakeSource::default().with_account("popsci", vec![profile(1, "popsci", "a")]);
    Pipeline::new(first, store, reset.clone()).run_profiles().await;

    let second = FakeSource::default().with_account("popsci", vec![profile(2, "popsci", "b")]);
    let store = SqliteStore::open(dir.path().join("murmur.db"));
    let pipeline = Pipeline::new(second, store, reset);
    assert!(pipeline.run_profiles().await.is_clean());

    let profiles = pipeline.store().read_all(TableKind::Profiles, None).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.get_i64(0, "id"), Some(2));
    let sentiment = pipeline.store().read_all(TableKind::Sentiment, None).await.unwrap();
    assert_eq!(sentiment.get_i64(0, "id"), Some(2));
}

#[tokio::test]
async fn abort_policy_stops_at_the_first_store_failure() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::default().with_account("popsci", vec![profile(1, "popsci", "x")]);
    let opts = PipelineOptions {
        store_failure: StoreFailurePolicy::Abort,
        ..options(&["popsci"])
    };
    let pipeline = Pipeline::new(source, broken_store(&dir), opts);

    let report = pipeline.run_profiles().await;

    assert_eq!(report.halted_at(), Some(Step::StoreRaw));
    assert_eq!(report.status(Step::ReadBack), None);
    assert_eq!(report.status(Step::StoreDerived), None);
}

#[tokio::test]
async fn continue_policy_records_every_store_failure() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::default().with_account("popsci", vec![profile(1, "popsci", "x")]);
    let pipeline = Pipeline::new(source, broken_store(&dir), options(&["popsci"]));

    let report = pipeline.run_profiles().await;

    assert_eq!(report.halted_at(), None);
    let failed: Vec<Step> = report.failures().map(|o| o.step).collect();
    assert_eq!(failed, vec![Step::StoreRaw, Step::ReadBack, Step::StoreDerived]);
    assert_eq!(report.rows(Step::Classify), Some(0));
}

#[tokio::test]
async fn discovery_adds_timeline_authors_once() {
    init_test_tracing();
    let source = FakeSource {
        timeline_users: vec!["alice".into(), "popsci".into(), "alice".into(), "bob".into()],
        ..FakeSource::default()
    };
    let opts = PipelineOptions {
        discover_limit: Some(3),
        ..options(&["popsci", "cricket"])
    };
    let pipeline = Pipeline::new(source, CountingStore::default(), opts);

    let report = pipeline.run_profiles().await;

    assert_eq!(report.rows(Step::Discover), Some(3));
    assert_eq!(pipeline.source().searched(), vec!["popsci", "cricket", "alice"]);
}

#[tokio::test]
async fn toots_are_stored_once_and_read_back_in_id_order() {
    init_test_tracing();
    let toots = vec![
        Toot { id: 3, content: "<p>three words here</p>".into() },
        Toot { id: 1, content: "<p>one</p>".into() },
    ];
    let source = FakeSource {
        posts: Some(toots),
        ..FakeSource::default()
    };
    let (_dir, store) = sqlite();
    let pipeline = Pipeline::new(source, store, options(&[]));

    let (report, table) = pipeline.run_toots().await;
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.rows(Step::StoreRaw), Some(2));
    assert_eq!(table.get_i64(0, "id"), Some(1));

    let (again, table) = pipeline.run_toots().await;
    assert_eq!(again.rows(Step::StoreRaw), Some(0));
    assert_eq!(table.len(), 2);
}

#[tokio::test]
async fn whoami_returns_the_account_id() {
    let pipeline = Pipeline::new(FakeSource::default(), CountingStore::default(), options(&[]));
    assert_eq!(pipeline.whoami().await.unwrap(), 42);
}
