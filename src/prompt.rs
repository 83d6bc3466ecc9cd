//! Run option resolution.
//!
//! Options come from command-line flags. When stdin is a terminal, any
//! option left off the command line is asked for interactively; otherwise
//! the built-in defaults apply. Either way the result is one immutable
//! [`RunConfig`] built before the run starts.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::config::Config;
use crate::models::StoreSelection;
use crate::run::RunConfig;
use crate::watermark::WatermarkStrategy;

/// Where values for omitted flags come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Omitted flags take their defaults.
    FromFlags,
    /// Omitted flags are asked for on the terminal.
    FromPrompt,
}

/// Flags as given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    pub store: Option<String>,
    pub reviews: Option<usize>,
    pub ignore_watermark: Option<bool>,
    pub send_to_webhook: Option<bool>,
    pub debug: Option<bool>,
    pub dry_run: Option<bool>,
    pub strategy: Option<WatermarkStrategy>,
}

/// Parse a `yes`/`no` flag value.
pub fn parse_yes_no(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        other => Err(format!("expected yes or no, got '{}'", other)),
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

struct Prompter<'a, R: BufRead, W: Write> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question).context("Failed to write prompt")?;
        self.output.flush().context("Failed to write prompt")?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("Failed to read answer")?;
        Ok(answer.trim().to_string())
    }
}

/// Resolve flags (and prompts, if enabled) into a [`RunConfig`].
pub fn resolve_run_config<R: BufRead, W: Write>(
    flags: RunFlags,
    source: ConfigSource,
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Result<RunConfig> {
    let time_zone = config.time_zone()?;
    let strategy = flags.strategy.unwrap_or(config.watermark.strategy);

    let (store, max_count, ignore_watermark, send_to_webhook, debug, dry_run) = match source {
        ConfigSource::FromFlags => (
            flags.store.unwrap_or_else(|| "both".to_string()),
            flags.reviews,
            flags.ignore_watermark.unwrap_or(false),
            flags.send_to_webhook.unwrap_or(false),
            flags.debug.unwrap_or(false),
            flags.dry_run.unwrap_or(false),
        ),
        ConfigSource::FromPrompt => {
            let mut p = Prompter { input, output };

            let store = match flags.store {
                Some(s) => s,
                None => p.ask(
                    "Which app store do you want to retrieve reviews from? (apple/google/both): ",
                )?,
            };
            let dry_run = match flags.dry_run {
                Some(d) => d,
                None => p
                    .ask("Run in test mode or production mode? (test/prod): ")?
                    .eq_ignore_ascii_case("test"),
            };
            // Anything that is not a positive number means one review.
            let max_count = match flags.reviews {
                Some(n) => Some(n),
                None => Some(
                    p.ask("How many of the latest reviews would you like to retrieve? ")?
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .unwrap_or(1),
                ),
            };
            let ignore_watermark = match flags.ignore_watermark {
                Some(b) => b,
                None => is_yes(&p.ask(
                    "Do you want to ignore the last run timestamp and retrieve the latest reviews regardless? (yes/no): ",
                )?),
            };
            let send_to_webhook = match flags.send_to_webhook {
                Some(b) => b,
                None => {
                    let channel = config.slack.channel.as_deref().unwrap_or("not configured");
                    is_yes(&p.ask(&format!(
                        "Do you want to send the reviews to Slack? (yes/no) [Channel: {}] ",
                        channel
                    ))?)
                }
            };
            let debug = match flags.debug {
                Some(b) => b,
                None => is_yes(&p.ask("Enable debug mode? (yes/no): ")?),
            };
            (store, max_count, ignore_watermark, send_to_webhook, debug, dry_run)
        }
    };

    let stores: StoreSelection = store.parse()?;

    Ok(RunConfig {
        stores,
        max_count,
        ignore_watermark,
        send_to_webhook,
        debug,
        dry_run,
        strategy,
        time_zone,
    })
}
