use crate::outcome::{Flow, RunReport, Step};
use crate::source::SocialSource;
use murmur_common::{Result, SentimentRow};
use murmur_store::{Projection, Store, StoreError, Table, TableKind};
use murmur_text::{strip_markup, Labeler, PolarityScorer, VaderScorer};
use tracing::{error, info, warn};

/// Field of the profile blob that carries the free-text bio.
const NOTE_FIELD: &str = "note";
const NOTE_COLUMN: &str = "note_content";

/// What a run does after a store step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Record the failure and carry on with empty data.
    #[default]
    Continue,
    /// Stop the run at the failing step.
    Abort,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub usernames: Vec<String>,
    pub toot_limit: u32,
    /// Also analyse the authors of this many public-timeline posts.
    pub discover_limit: Option<u32>,
    /// Drop and recreate the profile and sentiment tables before writing.
    pub reset_schema: bool,
    pub store_failure: StoreFailurePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            usernames: vec!["popsci".into(), "cricket".into()],
            toot_limit: 10,
            discover_limit: None,
            reset_schema: false,
            store_failure: StoreFailurePolicy::Continue,
        }
    }
}

pub struct Pipeline<S, D, P = VaderScorer> {
    source: S,
    store: D,
    labeler: Labeler<P>,
    options: PipelineOptions,
}

impl<S: SocialSource, D: Store> Pipeline<S, D, VaderScorer> {
    pub fn new(source: S, store: D, options: PipelineOptions) -> Self {
        Self {
            source,
            store,
            labeler: Labeler::vader(),
            options,
        }
    }
}

impl<S: SocialSource, D: Store, P: PolarityScorer> Pipeline<S, D, P> {
    pub fn with_scorer<Q: PolarityScorer>(self, scorer: Q) -> Pipeline<S, D, Q> {
        Pipeline {
            source: self.source,
            store: self.store,
            labeler: Labeler::new(scorer),
            options: self.options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Id of the account behind the configured token.
    pub async fn whoami(&self) -> Result<i64> {
        self.source
            .verify_credentials()
            .await
            .inspect_err(|e| warn!(error = %e, "pipeline.whoami.failed"))
    }

    /// Fetch one page of public toots, store them, and read the table back.
    ///
    /// Returns the toots table for visualisation; it is empty when the run
    /// halted or the read failed, which the report records.
    pub async fn run_toots(&self) -> (RunReport, Table) {
        let mut report = RunReport::new(Flow::Toots);
        let limit = self.options.toot_limit;

        let toots = match self.source.list_public_posts(limit).await {
            Ok(toots) => {
                report.done(Step::Fetch, toots.len());
                toots
            }
            Err(err) => {
                error!(error = %err, limit, "pipeline.fetch.failed");
                report.failed(Step::Fetch, &err);
                report.halt(Step::Fetch);
                return (report, Table::default());
            }
        };

        let stored = async {
            self.store.ensure_schema(TableKind::Toots, false).await?;
            self.store.upsert_toots(&toots).await
        }
        .await;
        match stored {
            Ok(n) => report.done(Step::StoreRaw, n),
            Err(err) => {
                if !self.store_failed(&mut report, Step::StoreRaw, err) {
                    return (report, Table::default());
                }
            }
        }

        let table = match self.store.read_all(TableKind::Toots, None).await {
            Ok(table) => {
                report.done(Step::ReadBack, table.len());
                table
            }
            Err(err) => {
                self.store_failed(&mut report, Step::ReadBack, err);
                Table::default()
            }
        };

        info!(fetched = toots.len(), stored = table.len(), "pipeline.toots.done");
        (report, table)
    }

    /// Search the configured accounts, store their profiles, label each
    /// profile's bio and store the labels.
    pub async fn run_profiles(&self) -> RunReport {
        let mut report = RunReport::new(Flow::Profiles);
        let usernames = self.usernames(&mut report).await;

        let mut profiles = Vec::new();
        let mut failed = 0usize;
        for username in &usernames {
            match self.source.search_accounts(username).await {
                Ok(found) => profiles.extend(found),
                Err(err) => {
                    failed += 1;
                    warn!(username = %username, error = %err, "pipeline.search.skipped");
                }
            }
        }
        if !usernames.is_empty() && failed == usernames.len() {
            error!(usernames = usernames.len(), "pipeline.fetch.failed");
            report.failed(Step::Fetch, format!("all {failed} account searches failed"));
            report.halt(Step::Fetch);
            return report;
        }
        report.done(Step::Fetch, profiles.len());

        let reset = self.options.reset_schema;
        let stored = async {
            self.store.ensure_schema(TableKind::Profiles, reset).await?;
            self.store.upsert_profiles(&profiles).await
        }
        .await;
        match stored {
            Ok(n) => report.done(Step::StoreRaw, n),
            Err(err) => {
                if !self.store_failed(&mut report, Step::StoreRaw, err) {
                    return report;
                }
            }
        }

        let projection = Projection::new(NOTE_FIELD, NOTE_COLUMN);
        let table = match self
            .store
            .read_all(TableKind::Profiles, Some(&projection))
            .await
        {
            Ok(table) => {
                report.done(Step::ReadBack, table.len());
                table
            }
            Err(err) => {
                if !self.store_failed(&mut report, Step::ReadBack, err) {
                    return report;
                }
                Table::default()
            }
        };

        let rows = self.label(&table);
        report.done(Step::Classify, rows.len());

        let stored = async {
            self.store.ensure_schema(TableKind::Sentiment, reset).await?;
            self.store.upsert_sentiment(&rows).await
        }
        .await;
        match stored {
            Ok(n) => report.done(Step::StoreDerived, n),
            Err(err) => {
                if !self.store_failed(&mut report, Step::StoreDerived, err) {
                    return report;
                }
            }
        }

        info!(
            profiles = profiles.len(),
            labelled = rows.len(),
            clean = report.is_clean(),
            "pipeline.profiles.done"
        );
        report
    }

    /// Configured usernames, extended with public-timeline authors when
    /// discovery is on. Duplicates are dropped, first occurrence wins.
    async fn usernames(&self, report: &mut RunReport) -> Vec<String> {
        let mut names = self.options.usernames.clone();
        if let Some(limit) = self.options.discover_limit {
            match self.source.public_usernames(limit).await {
                Ok(found) => {
                    report.done(Step::Discover, found.len());
                    names.extend(found);
                }
                Err(err) => {
                    warn!(error = %err, limit, "pipeline.discover.failed");
                    report.failed(Step::Discover, &err);
                }
            }
        }
        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        names
    }

    /// Strip markup from each bio and label it. Rows without an id are skipped.
    fn label(&self, table: &Table) -> Vec<SentimentRow> {
        (0..table.len())
            .filter_map(|i| {
                let id = table.get_i64(i, "id")?;
                let clean = strip_markup(table.get_str(i, NOTE_COLUMN));
                Some(SentimentRow {
                    id,
                    username: table.get_str(i, "username").map(str::to_owned),
                    sentiment: self.labeler.classify(clean.as_deref()),
                    clean_content: clean,
                })
            })
            .collect()
    }

    /// Record a store failure; `false` means the run must stop here.
    fn store_failed(&self, report: &mut RunReport, step: Step, err: StoreError) -> bool {
        let policy = self.options.store_failure;
        error!(step = step.as_str(), ?policy, error = %err, "pipeline.store.failed");
        report.failed(step, &err);
        match policy {
            StoreFailurePolicy::Continue => true,
            StoreFailurePolicy::Abort => {
                report.halt(step);
                false
            }
        }
    }
}
