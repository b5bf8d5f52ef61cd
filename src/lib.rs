//! MailMute
//!
//! An email unsubscribe automation pipeline: it analyzes raw messages for
//! bulk-mail signals, scores how likely each one is to be actionable, and
//! works through the available unsubscribe channels for the confident ones.
//!
//! # Overview
//!
//! The pipeline runs in four stages:
//! - **Analysis**: parse each RFC822 message, extract unsubscribe links and
//!   headers, and compute a confidence score in [0, 1]
//! - **Filtering**: keep only candidates at or above the configured threshold
//! - **Execution**: try each unsubscribe strategy in priority order (header
//!   mailto stub, then each link), stopping at the first success
//! - **Aggregation**: fold per-candidate outcomes into a batch summary and an
//!   exportable report, with every attempt recorded in a SQLite history
//!
//! # Example Usage
//!
//! ```no_run
//! use mailmute::analyzer::ContentAnalyzer;
//! use mailmute::executor::UnsubscribeExecutor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let raw = tokio::fs::read("message.eml").await?;
//!
//!     let analyzer = ContentAnalyzer::new();
//!     let candidate = analyzer.analyze_bytes(&raw);
//!
//!     if candidate.confidence >= 0.5 {
//!         let executor = UnsubscribeExecutor::new()?;
//!         for outcome in executor.execute(&candidate).await {
//!             println!("{}: {}", outcome.strategy_label, outcome.outcome_text);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`analyzer`] - Message parsing and confidence scoring
//! - [`aggregator`] - Batch summaries and the flat-text export report
//! - [`candidates`] - Threshold-filtered candidate collection
//! - [`cli`] - Command-line interface and pipeline orchestration
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result alias
//! - [`executor`] - Unsubscribe strategies and HTTP execution
//! - [`history`] - SQLite-backed attempt history and sender statistics
//! - [`models`] - Core data structures
//! - [`patterns`] - Shared pattern library (regexes, blacklists, phrases)
//! - [`source`] - Message sources (maildir of `.eml` files)

pub mod aggregator;
pub mod analyzer;
pub mod candidates;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod models;
pub mod patterns;
pub mod source;

// Re-export commonly used types for convenience
pub use error::{MuteError, Result};

// Core data models
pub use models::{AttemptOutcome, BatchResult, CandidateOutcome, UnsubscribeCandidate};

// Pipeline stages
pub use analyzer::ContentAnalyzer;
pub use candidates::CandidateStore;
pub use executor::{UnsubscribeExecutor, UnsubscribeStrategy};

// History types
pub use history::{HistoryEntry, HistoryStore, SenderStats, SqliteHistory};

// Source types
pub use source::{EmlDirSource, MessageSource, RawMessage};

// Config types
pub use config::{AnalysisConfig, Config, ExecutionConfig, HistoryConfig};

// CLI types (for binary usage)
pub use cli::{Cli, Commands, ProgressReporter};
