//! Command-line interface

use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{info, warn};

use crate::aggregator;
use crate::analyzer::ContentAnalyzer;
use crate::candidates::CandidateStore;
use crate::config::Config;
use crate::error::Result;
use crate::executor::UnsubscribeExecutor;
use crate::history::HistoryStore;
use crate::models::{BatchResult, CandidateOutcome};
use crate::source::MessageSource;

#[derive(Parser, Debug)]
#[command(name = "mailmute")]
#[command(version = "0.1.0")]
#[command(about = "Detects bulk email lists and automates unsubscribe attempts", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a mail directory and attempt unsubscribes
    Run {
        /// Directory containing .eml message files
        #[arg(short, long)]
        maildir: PathBuf,

        /// Analyze and report only; make no HTTP requests
        #[arg(long)]
        dry_run: bool,

        /// Write a flat-text results report to this path
        #[arg(long)]
        export: Option<PathBuf>,

        /// Override the configured confidence threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Override the configured message limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show recent unsubscribe attempts
    History {
        /// Maximum number of attempts to show
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },

    /// Show sender statistics, ordered by email volume
    Senders {
        /// Maximum number of senders to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Truncate a string to max_len characters, adding "..." if truncated
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!(
            "{}...",
            s.chars().take(max_len.saturating_sub(3)).collect::<String>()
        )
    }
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ProgressReporter {
    pub fn new() -> Self {
        // Use {elapsed} for human-readable format (e.g., "1s", "234ms")
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar_style = ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-");

        Self {
            multi: MultiProgress::new(),
            spinner_style,
            bar_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn add_progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(self.bar_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        println!("  ✓ {}", msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Main orchestration function for one analyze-and-unsubscribe run
///
/// Coordinates the modules to:
/// 1. Fetch raw messages from the source
/// 2. Analyze each into a candidate and filter by confidence threshold
/// 3. Attempt unsubscribe strategies per candidate (skipped in dry run)
/// 4. Record results in history and fold them into a batch summary
///
/// Per-message and per-attempt failures never abort the run; only setup
/// failures (source, config, history) return `Err`.
pub async fn run_pipeline(
    source: &dyn MessageSource,
    history: &mut dyn HistoryStore,
    config: &Config,
    reporter: &ProgressReporter,
) -> Result<BatchResult> {
    // Step 1: Fetch messages
    let fetch_spinner = reporter.add_spinner("Fetching messages...");
    let messages = source.fetch_messages(config.analysis.email_limit).await?;
    reporter.finish_spinner(
        &fetch_spinner,
        &format!("Fetched {} messages", messages.len()),
    );

    // Step 2: Analyze
    let analyze_bar = reporter.add_progress_bar(messages.len() as u64, "Analyzing messages...");
    let analyzer = ContentAnalyzer::new();
    let mut store = CandidateStore::new(config.analysis.confidence_threshold);
    let mut analyzed = 0usize;

    for message in &messages {
        let candidate = analyzer.analyze_bytes(&message.bytes);
        analyzed += 1;
        history.note_candidate(&candidate.sender, candidate.date)?;
        store.push_if_confident(candidate);
        analyze_bar.set_message(format!("analyzed {}/{}", analyzed, messages.len()));
        analyze_bar.inc(1);
    }

    analyze_bar.finish_with_message(format!(
        "Found {} candidates above threshold {:.2}",
        store.len(),
        store.threshold()
    ));

    if store.is_empty() {
        info!("No unsubscribe candidates found");
        return Ok(aggregator::aggregate(Vec::new()));
    }

    // Step 3: Execute
    let candidates = store.into_candidates();
    let mut results = Vec::with_capacity(candidates.len());

    if config.execution.dry_run {
        for candidate in candidates {
            info!(
                "[DRY RUN] Would attempt {} strategies for {} (confidence {:.2})",
                crate::executor::UnsubscribeStrategy::strategies_for(&candidate).len(),
                candidate.sender,
                candidate.confidence
            );
            results.push(CandidateOutcome::new(candidate, Vec::new()));
        }
        return Ok(aggregator::aggregate(results));
    }

    let executor = UnsubscribeExecutor::with_timeout(Duration::from_secs(
        config.execution.timeout_secs,
    ))?;

    // Ctrl-C stops cleanly between attempts
    let cancel = executor.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current attempt...");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let total = candidates.len();
    let unsub_bar = reporter.add_progress_bar(total as u64, "Unsubscribing...");

    for (i, candidate) in candidates.into_iter().enumerate() {
        unsub_bar.set_message(format!(
            "unsubscribing from {} ({}/{})",
            truncate_string(&candidate.sender, 40),
            i + 1,
            total
        ));

        let outcomes = executor.execute(&candidate).await;
        let result = CandidateOutcome::new(candidate, outcomes);
        history.record_result(&result)?;
        results.push(result);
        unsub_bar.inc(1);
    }

    let batch = aggregator::aggregate(results);
    unsub_bar.finish_with_message(format!(
        "Unsubscribed from {}/{} senders",
        batch.successful_count, batch.total_count
    ));

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MuteError;
    use crate::history::SqliteHistory;
    use crate::source::{EmlDirSource, MessageSource, RawMessage};
    use clap::CommandFactory;
    use mockall::mock;

    mock! {
        Source {}

        #[async_trait::async_trait]
        impl MessageSource for Source {
            async fn fetch_messages(&self, limit: usize) -> Result<Vec<RawMessage>>;
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("exactly-ten", 11), "exactly-ten");
        assert_eq!(truncate_string("a-rather-long-sender", 10), "a-rathe...");
    }

    const PROMO_EML: &str = "From: Promo Team <promo@shop.example>\r\n\
Subject: Unsubscribe from our deals\r\n\
List-Unsubscribe: <mailto:unsub@shop.example>, <https://shop.example/unsub>\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><a href=\"https://shop.example/unsub\">Unsubscribe</a></body></html>\r\n";

    const PLAIN_EML: &str = "From: alice@friends.example\r\n\
Subject: Lunch tomorrow?\r\n\
Content-Type: text/plain\r\n\
\r\n\
See you at noon.\r\n";

    #[tokio::test]
    async fn test_dry_run_pipeline_filters_and_skips_execution() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("promo.eml"), PROMO_EML)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("plain.eml"), PLAIN_EML)
            .await
            .unwrap();

        let source = EmlDirSource::new(dir.path());
        let mut history = SqliteHistory::open_in_memory().unwrap();
        let mut config = Config::default();
        config.execution.dry_run = true;

        let reporter = ProgressReporter::new();
        let batch = run_pipeline(&source, &mut history, &config, &reporter)
            .await
            .unwrap();

        // Only the bulk message clears the threshold; nothing was attempted
        assert_eq!(batch.total_count, 1);
        assert_eq!(batch.successful_count, 0);
        assert_eq!(batch.results[0].candidate.sender, "promo@shop.example");
        assert!(batch.results[0].outcomes.is_empty());

        // Both senders were still counted in stats
        let stats = history.top_senders(10).unwrap();
        assert_eq!(stats.len(), 2);
    }

    #[tokio::test]
    async fn test_source_failure_aborts_the_run() {
        let mut source = MockSource::new();
        source
            .expect_fetch_messages()
            .returning(|_| Err(MuteError::SourceError("connection refused".to_string())));

        let mut history = SqliteHistory::open_in_memory().unwrap();
        let config = Config::default();
        let reporter = ProgressReporter::new();

        let err = run_pipeline(&source, &mut history, &config, &reporter)
            .await
            .unwrap_err();
        assert!(err.is_batch_fatal());
    }

    #[tokio::test]
    async fn test_pipeline_respects_email_limit() {
        let mut source = MockSource::new();
        source.expect_fetch_messages().returning(|limit| {
            assert_eq!(limit, 3);
            Ok(Vec::new())
        });

        let mut history = SqliteHistory::open_in_memory().unwrap();
        let mut config = Config::default();
        config.analysis.email_limit = 3;
        let reporter = ProgressReporter::new();

        let batch = run_pipeline(&source, &mut history, &config, &reporter)
            .await
            .unwrap();
        assert_eq!(batch.total_count, 0);
    }

    #[tokio::test]
    async fn test_pipeline_with_empty_maildir() {
        let dir = tempfile::tempdir().unwrap();
        let source = EmlDirSource::new(dir.path());
        let mut history = SqliteHistory::open_in_memory().unwrap();
        let config = Config::default();

        let reporter = ProgressReporter::new();
        let batch = run_pipeline(&source, &mut history, &config, &reporter)
            .await
            .unwrap();
        assert_eq!(batch.total_count, 0);
    }
}
