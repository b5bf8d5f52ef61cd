//! Unsubscribe execution: tries strategies in priority order per candidate

use reqwest::redirect::Policy;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MuteError, Result};
use crate::models::{AttemptOutcome, UnsubscribeCandidate};
use crate::patterns;

/// Fixed timeout for every outbound unsubscribe request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Conventional browser user-agent; some list providers reject obvious bots
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Cooperative cancellation flag checked between attempts
pub type CancelFlag = Arc<AtomicBool>;

/// One concrete way to attempt unsubscribing from a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeStrategy {
    /// Mail the List-Unsubscribe mailto target. Capability stub: the outcome
    /// reports the address a request would be sent to, nothing is delivered.
    Email { address: String },
    /// Visit one extracted link (1-indexed in candidate link order)
    Link { index: usize, url: String },
}

impl UnsubscribeStrategy {
    /// Label used in outcome records and history rows
    pub fn label(&self) -> String {
        match self {
            UnsubscribeStrategy::Email { .. } => "email".to_string(),
            UnsubscribeStrategy::Link { index, .. } => format!("link_{}", index),
        }
    }

    /// Build the strategy list for a candidate, in priority order
    ///
    /// The email stub comes first and only when the candidate carries both a
    /// List-Unsubscribe header and a parsed mailto address; links follow in
    /// the candidate's deterministic first-seen order.
    pub fn strategies_for(candidate: &UnsubscribeCandidate) -> Vec<Self> {
        let mut strategies = Vec::new();
        if candidate.list_unsubscribe_header.is_some() {
            if let Some(address) = &candidate.unsubscribe_mail_address {
                strategies.push(UnsubscribeStrategy::Email {
                    address: address.clone(),
                });
            }
        }
        for (i, url) in candidate.links.iter().enumerate() {
            strategies.push(UnsubscribeStrategy::Link {
                index: i + 1,
                url: url.clone(),
            });
        }
        strategies
    }
}

/// Executes unsubscribe strategies over a shared HTTP client
///
/// The client (connection pool, default headers, timeout) is built once and
/// shared read-only across all invocations.
pub struct UnsubscribeExecutor {
    client: reqwest::Client,
    cancel: CancelFlag,
}

impl UnsubscribeExecutor {
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Build an executor with a custom request timeout (used by tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .build()
            .map_err(|e| MuteError::Unknown(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag a caller can set to stop the executor between attempts
    pub fn cancel_flag(&self) -> CancelFlag {
        Arc::clone(&self.cancel)
    }

    /// Attempt every strategy for one candidate, in order, short-circuiting
    /// after the first success
    ///
    /// Never returns an error: each failure is recorded as a classified
    /// outcome and the next strategy proceeds. A cancelled run simply stops
    /// early, leaving fewer outcomes than strategies.
    pub async fn execute(&self, candidate: &UnsubscribeCandidate) -> Vec<AttemptOutcome> {
        let mut outcomes = Vec::new();

        for strategy in UnsubscribeStrategy::strategies_for(candidate) {
            if self.cancel.load(Ordering::Relaxed) {
                info!(
                    "Cancellation requested, stopping attempts for {}",
                    candidate.sender
                );
                break;
            }

            let outcome = self.attempt(&strategy).await;
            debug!(
                "Strategy {} for {}: {}",
                outcome.strategy_label, candidate.sender, outcome.outcome_text
            );
            let succeeded = outcome.succeeded;
            outcomes.push(outcome);

            // First success wins; remaining links are skipped
            if succeeded {
                break;
            }
        }

        outcomes
    }

    async fn attempt(&self, strategy: &UnsubscribeStrategy) -> AttemptOutcome {
        let text = match strategy {
            UnsubscribeStrategy::Email { address } => email_stub_outcome(address),
            UnsubscribeStrategy::Link { url, .. } => self.attempt_link(url).await,
        };
        AttemptOutcome::new(strategy.label(), text)
    }

    /// Visit one unsubscribe link and classify what happened
    async fn attempt_link(&self, url: &str) -> String {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status != StatusCode::OK {
                    return format!("Failed to visit {} - Status Code: {}", url, status.as_u16());
                }
                match response.text().await {
                    Ok(body) => classify_page(url, &body),
                    Err(e) => format!("Error accessing {}: {}", url, e),
                }
            }
            Err(e) if e.is_timeout() => format!("Timeout accessing: {}", url),
            Err(e) => format!("Error accessing {}: {}", url, e),
        }
    }
}

/// SMTP delivery is a stated capability gap; the outcome text is the contract
fn email_stub_outcome(address: &str) -> String {
    format!("Email unsubscribe request would be sent to: {}", address)
}

fn classify_page(url: &str, body: &str) -> String {
    if patterns::contains_success_phrase(body) {
        format!("Successfully unsubscribed via: {}", url)
    } else if page_has_unsubscribe_form(body) {
        format!(
            "Found unsubscribe form at {} (auto-submission not implemented for safety)",
            url
        )
    } else {
        format!(
            "Visited {} but unclear whether the unsubscribe took effect",
            url
        )
    }
}

/// Look for a form whose visible text marks it as an unsubscribe form
fn page_has_unsubscribe_form(html: &str) -> bool {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").expect("static selector");
    for form in document.select(&form_selector) {
        let form_text = form.text().collect::<String>().to_lowercase();
        if patterns::FORM_KEYWORDS
            .iter()
            .any(|word| form_text.contains(word))
        {
            return true;
        }
    }
    false
}
