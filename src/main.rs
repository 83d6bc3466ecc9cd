//! # revwatch CLI
//!
//! ## Usage
//!
//! ```bash
//! revwatch --config ./config/revwatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `revwatch run` | Fetch, filter, print and optionally deliver new reviews |
//! | `revwatch sources` | Show which stores and delivery targets are configured |
//! | `revwatch watermark show` | Print the persisted watermark |
//! | `revwatch watermark reset` | Delete the watermark (next run is a first run) |
//! | `revwatch watermark set <value>` | Write an explicit watermark |
//!
//! ## Examples
//!
//! ```bash
//! # Interactive: asks for anything not given on the command line
//! revwatch run
//!
//! # Cron-friendly: both stores, post to Slack, no prompts
//! revwatch run --store both --send-to-slack yes --no-prompt
//!
//! # Re-send the latest three Apple reviews regardless of the watermark
//! revwatch run --store apple --reviews 3 --ignore-watermark yes --send-to-slack yes
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revwatch::config;
use revwatch::prompt::{self, ConfigSource, RunFlags};
use revwatch::run;
use revwatch::sources;
use revwatch::watermark::{parse_watermark, WatermarkStore, WatermarkStrategy};

/// revwatch: relay new app-store reviews to the console and Slack.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Credentials are normally supplied through the environment or a
/// `.env` file.
#[derive(Parser)]
#[command(
    name = "revwatch",
    about = "Relay new App Store and Google Play reviews to the console and Slack",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/revwatch.toml`. A missing file means built-in
    /// defaults plus environment variables.
    #[arg(long, global = true, default_value = "./config/revwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch reviews, keep the ones newer than the watermark, and report them.
    ///
    /// Options left off the command line are asked for interactively when
    /// stdin is a terminal, unless `--no-prompt` is given.
    Run {
        /// Which store to poll: `apple`, `google`, or `both`.
        #[arg(long)]
        store: Option<String>,

        /// Maximum number of reviews to report per store.
        #[arg(long)]
        reviews: Option<usize>,

        /// Report the latest reviews regardless of the watermark (`yes`/`no`).
        #[arg(long, alias = "ignore-last-run", value_parser = prompt::parse_yes_no)]
        ignore_watermark: Option<bool>,

        /// Post each reported review to Slack (`yes`/`no`).
        #[arg(long, value_parser = prompt::parse_yes_no)]
        send_to_slack: Option<bool>,

        /// Verbose logging and raw vendor records in the report (`yes`/`no`).
        #[arg(long, value_parser = prompt::parse_yes_no)]
        debug: Option<bool>,

        /// Print only: never post to Slack, never update the watermark.
        #[arg(long)]
        dry_run: bool,

        /// How the next watermark is chosen: `now` or `max_seen`.
        #[arg(long)]
        watermark_strategy: Option<WatermarkStrategy>,

        /// Never prompt; omitted options take their defaults.
        #[arg(long)]
        no_prompt: bool,
    },

    /// List stores and delivery targets and whether they are configured.
    Sources,

    /// Inspect or change the persisted watermark.
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },
}

#[derive(Subcommand)]
enum WatermarkAction {
    /// Print the current watermark.
    Show,
    /// Delete the watermark file.
    Reset,
    /// Write an explicit watermark (epoch seconds or RFC 3339).
    Set { value: String },
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "revwatch=debug" } else { "revwatch=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = matches!(
        cli.command,
        Commands::Run {
            debug: Some(true),
            ..
        }
    );
    init_tracing(debug);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            store,
            reviews,
            ignore_watermark,
            send_to_slack,
            debug,
            dry_run,
            watermark_strategy,
            no_prompt,
        } => {
            let flags = RunFlags {
                store,
                reviews,
                ignore_watermark,
                send_to_webhook: send_to_slack,
                debug,
                dry_run: dry_run.then_some(true),
                strategy: watermark_strategy,
            };
            let source = if no_prompt || !atty::is(atty::Stream::Stdin) {
                ConfigSource::FromFlags
            } else {
                ConfigSource::FromPrompt
            };
            let run_config = {
                let stdin = io::stdin();
                let mut input = stdin.lock();
                let mut output = io::stdout();
                prompt::resolve_run_config(flags, source, &cfg, &mut input, &mut output)?
            };
            run::execute(&cfg, &run_config).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Watermark { action } => {
            let store = WatermarkStore::new(cfg.watermark.path.clone());
            match action {
                WatermarkAction::Show => match store.read() {
                    Some(at) => println!("{} ({})", at.timestamp(), at.to_rfc3339()),
                    None => println!("no watermark ({})", store.path().display()),
                },
                WatermarkAction::Reset => {
                    if store.reset()? {
                        println!("watermark reset ({})", store.path().display());
                    } else {
                        println!("no watermark to reset ({})", store.path().display());
                    }
                }
                WatermarkAction::Set { value } => {
                    let Some(at) = parse_watermark(&value) else {
                        bail!(
                            "invalid watermark '{}': expected epoch seconds or an RFC 3339 timestamp",
                            value
                        );
                    };
                    if !store.save(at) {
                        bail!("failed to write watermark to {}", store.path().display());
                    }
                    println!("watermark set to {} ({})", at.timestamp(), at.to_rfc3339());
                }
            }
        }
    }

    Ok(())
}
