//! Persistent record of unsubscribe attempts and per-sender counters

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::CandidateOutcome;

/// One stored attempt, newest-first in queries
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub email_id: String,
    pub sender: String,
    pub subject: String,
    /// Label of the decisive strategy (the successful one, or the last tried)
    pub strategy_label: String,
    pub outcome_text: String,
    pub succeeded: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate counters for one sender
#[derive(Debug, Clone)]
pub struct SenderStats {
    pub sender: String,
    pub total_emails: u64,
    pub unsubscribed: bool,
    pub last_seen: DateTime<Utc>,
}

/// Storage seam for attempt history; the pipeline only sees this trait
pub trait HistoryStore: Send {
    /// Bump the sender's email counter for one analyzed candidate
    fn note_candidate(&mut self, sender: &str, seen_at: DateTime<Utc>) -> Result<()>;

    /// Record the final result for a candidate, replacing any earlier row
    /// for the same message
    fn record_result(&mut self, result: &CandidateOutcome) -> Result<()>;

    /// Most recent attempts, newest first
    fn recent_attempts(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Senders by email volume, descending
    fn top_senders(&self, limit: usize) -> Result<Vec<SenderStats>>;
}

/// SQLite-backed history store
///
/// Attempts are keyed on the message id: re-running a batch over the same
/// mailbox updates rows in place instead of duplicating them.
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS unsubscribe_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id TEXT UNIQUE NOT NULL,
                sender TEXT NOT NULL,
                subject TEXT NOT NULL,
                strategy_label TEXT NOT NULL,
                outcome_text TEXT NOT NULL,
                succeeded INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sender_stats (
                sender TEXT PRIMARY KEY,
                total_emails INTEGER NOT NULL DEFAULT 0,
                unsubscribed INTEGER NOT NULL DEFAULT 0,
                last_seen TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// The outcome that decided the candidate: the success if there was one,
    /// otherwise the last attempt made
    fn decisive_outcome(result: &CandidateOutcome) -> Option<(&str, &str)> {
        result
            .outcomes
            .iter()
            .find(|o| o.succeeded)
            .or_else(|| result.outcomes.last())
            .map(|o| (o.strategy_label.as_str(), o.outcome_text.as_str()))
    }
}

impl HistoryStore for SqliteHistory {
    fn note_candidate(&mut self, sender: &str, seen_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sender_stats (sender, total_emails, last_seen)
             VALUES (?1, 1, ?2)
             ON CONFLICT(sender) DO UPDATE SET
                total_emails = total_emails + 1,
                last_seen = excluded.last_seen",
            params![sender, seen_at],
        )?;
        Ok(())
    }

    fn record_result(&mut self, result: &CandidateOutcome) -> Result<()> {
        // Cancelled candidates can arrive with no outcomes at all
        let Some((label, text)) = Self::decisive_outcome(result) else {
            return Ok(());
        };

        let candidate = &result.candidate;
        self.conn.execute(
            "INSERT INTO unsubscribe_history
                (email_id, sender, subject, strategy_label, outcome_text, succeeded, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(email_id) DO UPDATE SET
                sender = excluded.sender,
                subject = excluded.subject,
                strategy_label = excluded.strategy_label,
                outcome_text = excluded.outcome_text,
                succeeded = excluded.succeeded,
                recorded_at = excluded.recorded_at",
            params![
                candidate.id,
                candidate.sender,
                candidate.subject,
                label,
                text,
                result.overall_success,
                Utc::now(),
            ],
        )?;

        if result.overall_success {
            self.conn.execute(
                "UPDATE sender_stats SET unsubscribed = 1 WHERE sender = ?1",
                params![candidate.sender],
            )?;
        }

        debug!(
            "Recorded attempt for {} ({})",
            candidate.sender,
            if result.overall_success { "success" } else { "failed" }
        );
        Ok(())
    }

    fn recent_attempts(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT email_id, sender, subject, strategy_label, outcome_text, succeeded, recorded_at
             FROM unsubscribe_history
             ORDER BY recorded_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                email_id: row.get(0)?,
                sender: row.get(1)?,
                subject: row.get(2)?,
                strategy_label: row.get(3)?,
                outcome_text: row.get(4)?,
                succeeded: row.get(5)?,
                recorded_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn top_senders(&self, limit: usize) -> Result<Vec<SenderStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT sender, total_emails, unsubscribed, last_seen
             FROM sender_stats
             ORDER BY total_emails DESC, sender ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SenderStats {
                sender: row.get(0)?,
                total_emails: row.get::<_, i64>(1)? as u64,
                unsubscribed: row.get(2)?,
                last_seen: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
