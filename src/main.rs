use anyhow::Result;
use clap::Parser;
use mailmute::cli::{self, Cli, Commands, ProgressReporter};
use mailmute::config::Config;
use mailmute::error::MuteError;
use mailmute::history::{HistoryStore, SqliteHistory};
use mailmute::source::EmlDirSource;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: mailmute --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with level based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailmute=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mailmute=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match cli.command {
        Commands::Run {
            maildir,
            dry_run,
            export,
            threshold,
            limit,
        } => {
            tracing::info!("Starting unsubscribe run over {:?}", maildir);
            if dry_run {
                println!("Running in DRY RUN mode - no unsubscribe requests will be made");
            }

            let mut config = Config::load(&cli.config).await?;
            if dry_run {
                config.execution.dry_run = true;
            }
            if let Some(threshold) = threshold {
                config.analysis.confidence_threshold = threshold;
            }
            if let Some(limit) = limit {
                config.analysis.email_limit = limit;
            }
            config.validate()?;

            let source = EmlDirSource::new(&maildir);
            let mut history = SqliteHistory::open(&config.history.db_path)?;
            let reporter = ProgressReporter::new();

            let batch = cli::run_pipeline(&source, &mut history, &config, &reporter).await?;

            println!("\n========================================");
            println!("Unsubscribe Run Summary");
            println!("========================================");
            println!("Candidates attempted: {}", batch.total_count);
            println!("Successful: {}", batch.successful_count);
            println!(
                "Failed: {}",
                batch.total_count - batch.successful_count
            );
            println!("========================================");

            for result in &batch.results {
                let status = if result.overall_success { "SUCCESS" } else { "FAILED" };
                println!("{} - {}", result.candidate.sender, status);
                for outcome in &result.outcomes {
                    println!("  {}: {}", outcome.strategy_label, outcome.outcome_text);
                }
            }

            if let Some(export_path) = export {
                mailmute::aggregator::export_to_file(&batch, &export_path).await?;
                println!("\nResults exported to {:?}", export_path);
            }

            Ok(())
        }

        Commands::History { limit } => {
            let config = Config::load(&cli.config).await?;
            let history = SqliteHistory::open(&config.history.db_path)?;
            let entries = history.recent_attempts(limit)?;

            if entries.is_empty() {
                println!("No unsubscribe attempts recorded yet.");
                return Ok(());
            }

            println!("Recent unsubscribe attempts (newest first):\n");
            for entry in entries {
                let status = if entry.succeeded { "SUCCESS" } else { "FAILED" };
                println!(
                    "[{}] {} - {}",
                    entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.sender,
                    status
                );
                println!("  {}: {}", entry.strategy_label, entry.outcome_text);
            }

            Ok(())
        }

        Commands::Senders { limit } => {
            let config = Config::load(&cli.config).await?;
            let history = SqliteHistory::open(&config.history.db_path)?;
            let stats = history.top_senders(limit)?;

            if stats.is_empty() {
                println!("No sender statistics recorded yet.");
                return Ok(());
            }

            println!("Top senders by email volume:\n");
            for (i, s) in stats.iter().enumerate() {
                let flag = if s.unsubscribed { " [unsubscribed]" } else { "" };
                println!(
                    "{}. {} - {} emails, last seen {}{}",
                    i + 1,
                    s.sender,
                    s.total_emails,
                    s.last_seen.format("%Y-%m-%d"),
                    flag
                );
            }

            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating example configuration file");

            if output.exists() && !force {
                return Err(MuteError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(&output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nPlease edit this file to customize your settings.");
            println!("Key settings to review:");
            println!("  - analysis.confidence_threshold: Minimum score to attempt an unsubscribe");
            println!("  - analysis.email_limit: Maximum messages analyzed per run");
            println!("  - execution.timeout_secs: Per-request timeout for unsubscribe links");
            println!("  - history.db_path: Where attempt history is stored");

            Ok(())
        }
    }
}
