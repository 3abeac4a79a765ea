use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, pipeline_options};
use murmur_common::observability::{LogConfig, init_logging};
use murmur_config::{Backend, MurmurConfig, MurmurConfigLoader, config_error};
use murmur_pipeline::{Pipeline, RunReport, word_count_histogram};
use murmur_social::MastodonApi;
use murmur_store::{PgStore, SqliteStore, Store};
use std::process::ExitCode;
use std::time::Duration;
mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => MurmurConfigLoader::new().with_file(path),
        None => MurmurConfigLoader::new().with_optional_file("murmur.yaml"),
    };
    let cfg: MurmurConfig = loader.load().map_err(config_error)?;

    let log_path = init_logging(LogConfig {
        app_name: "murmur",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::debug!(config = ?cfg, log_dir = %log_path.display(), "murmur.config.loaded");

    let api = MastodonApi::new(&cfg.mastodon.base_url, cfg.mastodon.access_token.clone())?
        .with_timeout(Duration::from_secs(cfg.mastodon.timeout_secs));
    let options = pipeline_options(&cfg.pipeline, &cli.command);

    let db = &cfg.database;
    match db.backend {
        Backend::Postgres => {
            let store = PgStore::from_params(&db.host, db.port, &db.dbname, &db.user, &db.password);
            run(Pipeline::new(api, store, options), &cli.command).await
        }
        Backend::Sqlite => {
            let store = SqliteStore::open(&db.path);
            run(Pipeline::new(api, store, options), &cli.command).await
        }
    }
}

async fn run<D: Store>(pipeline: Pipeline<MastodonApi, D>, command: &Command) -> Result<ExitCode> {
    match command {
        Command::Whoami => {
            let id = pipeline.whoami().await?;
            println!("{id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Toots { bins, .. } => {
            let (report, table) = pipeline.run_toots().await;
            if report.halted_at().is_none() {
                let bodies = table
                    .column("content")
                    .into_iter()
                    .flatten()
                    .filter_map(|v| v.as_str());
                print!("{}", word_count_histogram(bodies, *bins));
            }
            Ok(finish(&report))
        }
        Command::Profiles { .. } => {
            let report = pipeline.run_profiles().await;
            Ok(finish(&report))
        }
    }
}

/// Surface a non-clean report and map a halted run to a failing exit code.
fn finish(report: &RunReport) -> ExitCode {
    if report.is_clean() {
        tracing::info!(flow = report.flow.as_str(), "murmur.run.done");
    } else {
        eprintln!("{report}");
    }
    match report.halted_at() {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
