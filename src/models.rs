use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of the stored content preview, excluding the ellipsis
pub const PREVIEW_LIMIT: usize = 200;

/// An analyzed email with extracted unsubscribe signals and a confidence score
///
/// Immutable after creation; one is produced per message per analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeCandidate {
    /// Message-ID header, or a fallback hash when absent
    pub id: String,
    /// Normalized sender address (bracketed part of "Name <addr>" if present)
    pub sender: String,
    pub subject: String,
    /// Distinct HTTP(S) unsubscribe URLs in first-seen order (header first,
    /// then body links in document order); this order drives execution
    pub links: Vec<String>,
    /// Address parsed from a `mailto:` directive in List-Unsubscribe
    pub unsubscribe_mail_address: Option<String>,
    /// Raw List-Unsubscribe header value, kept for audit
    pub list_unsubscribe_header: Option<String>,
    /// Heuristic estimate in [0.0, 1.0] that this is actionable bulk mail
    pub confidence: f64,
    /// Date header, or analysis time when missing or unparseable
    pub date: DateTime<Utc>,
    /// Plain-text excerpt of the HTML body, at most 200 chars + "..."
    pub content_preview: String,
}

/// The classified result of one strategy attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Strategy identifier, e.g. "email", "link_1"
    pub strategy_label: String,
    /// Human-readable classification text
    pub outcome_text: String,
    pub succeeded: bool,
}

impl AttemptOutcome {
    /// Create an outcome, deriving `succeeded` from the outcome text
    ///
    /// An outcome counts as a success when its text carries the "success"
    /// marker, which only genuine success classifications do.
    pub fn new(strategy_label: impl Into<String>, outcome_text: impl Into<String>) -> Self {
        let outcome_text = outcome_text.into();
        let succeeded = outcome_text.to_lowercase().contains("success");
        Self {
            strategy_label: strategy_label.into(),
            outcome_text,
            succeeded,
        }
    }
}

/// Per-candidate execution result: all outcomes in strategy-priority order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateOutcome {
    pub candidate: UnsubscribeCandidate,
    pub outcomes: Vec<AttemptOutcome>,
    /// True if any single outcome for this candidate succeeded
    pub overall_success: bool,
}

impl CandidateOutcome {
    pub fn new(candidate: UnsubscribeCandidate, outcomes: Vec<AttemptOutcome>) -> Self {
        let overall_success = outcomes.iter().any(|o| o.succeeded);
        Self {
            candidate,
            outcomes,
            overall_success,
        }
    }
}

/// Summary of one execution pass over a set of candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Per-candidate results in processed order
    pub results: Vec<CandidateOutcome>,
    /// Candidates with at least one successful outcome
    pub successful_count: usize,
    /// Candidates actually attempted (not total found)
    pub total_count: usize,
}
