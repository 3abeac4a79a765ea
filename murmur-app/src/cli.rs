use clap::{Parser, Subcommand};
use murmur_config::{OnStoreFailure, PipelineConfig};
use murmur_pipeline::{DEFAULT_BINS, PipelineOptions, StoreFailurePolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "murmur",
    version,
    about = "Collect Mastodon toots and profiles, and label profile sentiment"
)]
pub struct Cli {
    /// YAML config file. Without it `murmur.yaml` is used when present.
    #[arg(long, short, env = "MURMUR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store one page of the public timeline and print its word-count histogram.
    Toots {
        /// Posts to fetch (defaults to `pipeline.toot_limit`).
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },
    /// Store the profiles of the given accounts and label their bios.
    Profiles {
        /// Account to search for; repeatable. Replaces `pipeline.usernames`.
        #[arg(short = 'u', long = "username")]
        usernames: Vec<String>,
        /// Also analyse the authors of this many public-timeline posts (100 when no count is given).
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "100")]
        discover: Option<u32>,
        /// Drop the profile and sentiment tables first. Existing rows are lost.
        #[arg(long)]
        reset_schema: bool,
    },
    /// Print the id of the account that owns the access token.
    Whoami,
}

/// Config values overlaid with whatever the subcommand sets explicitly.
pub fn pipeline_options(cfg: &PipelineConfig, command: &Command) -> PipelineOptions {
    let mut opts = PipelineOptions {
        usernames: cfg.usernames.clone(),
        toot_limit: cfg.toot_limit,
        discover_limit: cfg.discover_limit,
        reset_schema: cfg.reset_schema,
        store_failure: match cfg.on_store_failure {
            OnStoreFailure::Continue => StoreFailurePolicy::Continue,
            OnStoreFailure::Abort => StoreFailurePolicy::Abort,
        },
    };

    match command {
        Command::Toots { limit, .. } => {
            if let Some(limit) = limit {
                opts.toot_limit = *limit;
            }
        }
        Command::Profiles {
            usernames,
            discover,
            reset_schema,
        } => {
            if !usernames.is_empty() {
                opts.usernames = usernames.clone();
            }
            if discover.is_some() {
                opts.discover_limit = *discover;
            }
            opts.reset_schema |= *reset_schema;
        }
        Command::Whoami => {}
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("murmur").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn profiles_flags_override_config() {
        let cli = parse(&["profiles", "-u", "nasa", "--username", "esa", "--discover", "50", "--reset-schema"]);
        let opts = pipeline_options(&PipelineConfig::default(), &cli.command);

        assert_eq!(opts.usernames, vec!["nasa", "esa"]);
        assert_eq!(opts.discover_limit, Some(50));
        assert!(opts.reset_schema);
        assert_eq!(opts.store_failure, StoreFailurePolicy::Continue);
    }

    #[test]
    fn bare_discover_flag_samples_one_hundred_posts() {
        let cli = parse(&["profiles", "--discover", "-u", "nasa"]);
        let opts = pipeline_options(&PipelineConfig::default(), &cli.command);

        assert_eq!(opts.discover_limit, Some(100));
        assert_eq!(opts.usernames, vec!["nasa"]);

        let cli = parse(&["profiles"]);
        let opts = pipeline_options(&PipelineConfig::default(), &cli.command);
        assert_eq!(opts.discover_limit, None);
    }

    #[test]
    fn config_values_apply_when_flags_are_absent() {
        let cfg = PipelineConfig {
            toot_limit: 25,
            reset_schema: true,
            on_store_failure: OnStoreFailure::Abort,
            ..PipelineConfig::default()
        };
        let cli = parse(&["--config", "alt.yaml", "toots"]);
        let opts = pipeline_options(&cfg, &cli.command);

        assert_eq!(cli.config, Some(PathBuf::from("alt.yaml")));
        assert_eq!(opts.toot_limit, 25);
        assert_eq!(opts.usernames, vec!["popsci", "cricket"]);
        assert!(opts.reset_schema);
        assert_eq!(opts.store_failure, StoreFailurePolicy::Abort);
        assert!(matches!(cli.command, Command::Toots { limit: None, bins: DEFAULT_BINS }));
    }

    #[test]
    fn toot_limit_flag_wins() {
        let cli = parse(&["toots", "--limit", "3"]);
        let opts = pipeline_options(&PipelineConfig::default(), &cli.command);
        assert_eq!(opts.toot_limit, 3);
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Cli::try_parse_from(["murmur"]).is_err());
    }
}
