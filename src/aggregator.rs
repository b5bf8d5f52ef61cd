//! Folds per-candidate outcomes into a batch summary and a text report

use chrono::{DateTime, Local};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{BatchResult, CandidateOutcome};

/// Fold per-candidate results into a `BatchResult`
///
/// Pure function: counts are derived from the results alone, and the input
/// order is preserved.
pub fn aggregate(results: Vec<CandidateOutcome>) -> BatchResult {
    let successful_count = results.iter().filter(|r| r.overall_success).count();
    let total_count = results.len();
    BatchResult {
        results,
        successful_count,
        total_count,
    }
}

/// Render the flat-text export report
///
/// The layout (header, 50-char rule, timestamp, numbered entries with
/// indented per-strategy lines) is a stable export format; downstream
/// tooling parses it, so change nothing casually.
pub fn render_report(batch: &BatchResult, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str("AI Email Unsubscriber Results\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    for (i, result) in batch.results.iter().enumerate() {
        let status = if result.overall_success {
            "SUCCESS"
        } else {
            "FAILED"
        };
        out.push_str(&format!("{}. {} - {}\n", i + 1, result.candidate.sender, status));
        for outcome in &result.outcomes {
            out.push_str(&format!(
                "  {}: {}\n",
                outcome.strategy_label, outcome.outcome_text
            ));
        }
        out.push('\n');
    }

    out
}

/// Write the report for a batch to a file, stamped with the current time
pub async fn export_to_file(batch: &BatchResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let report = render_report(batch, Local::now());
    tokio::fs::write(path, report).await?;
    info!("Exported results for {} senders to {}", batch.total_count, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttemptOutcome, UnsubscribeCandidate};
    use chrono::{TimeZone, Utc};

    fn outcome_for(sender: &str, outcomes: Vec<AttemptOutcome>) -> CandidateOutcome {
        let candidate = UnsubscribeCandidate {
            id: format!("<{}>", sender),
            sender: sender.to_string(),
            subject: "sale".to_string(),
            links: Vec::new(),
            unsubscribe_mail_address: None,
            list_unsubscribe_header: None,
            confidence: 0.8,
            date: Utc::now(),
            content_preview: String::new(),
        };
        CandidateOutcome::new(candidate, outcomes)
    }

    #[test]
    fn test_aggregate_counts() {
        let results = vec![
            outcome_for(
                "a@x.example",
                vec![AttemptOutcome::new(
                    "link_1",
                    "Successfully unsubscribed via: https://x.example/u",
                )],
            ),
            outcome_for(
                "b@y.example",
                vec![AttemptOutcome::new(
                    "link_1",
                    "Timeout accessing: https://y.example/u",
                )],
            ),
            outcome_for("c@z.example", Vec::new()),
        ];
        let batch = aggregate(results);
        assert_eq!(batch.total_count, 3);
        assert_eq!(batch.successful_count, 1);
        assert_eq!(batch.results[0].candidate.sender, "a@x.example");
    }

    #[test]
    fn test_aggregate_empty() {
        let batch = aggregate(Vec::new());
        assert_eq!(batch.total_count, 0);
        assert_eq!(batch.successful_count, 0);
        assert!(batch.results.is_empty());
    }

    #[test]
    fn test_report_layout() {
        let results = vec![
            outcome_for(
                "promo@shop.example",
                vec![
                    AttemptOutcome::new(
                        "email",
                        "Email unsubscribe request would be sent to: u@shop.example",
                    ),
                    AttemptOutcome::new(
                        "link_1",
                        "Successfully unsubscribed via: https://shop.example/u",
                    ),
                ],
            ),
            outcome_for(
                "news@daily.example",
                vec![AttemptOutcome::new(
                    "link_1",
                    "Failed to visit https://daily.example/u - Status Code: 404",
                )],
            ),
        ];
        let batch = aggregate(results);
        let stamp = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let report = render_report(&batch, stamp);

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "AI Email Unsubscriber Results");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "Generated: 2024-03-05 09:30:00");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "1. promo@shop.example - SUCCESS");
        assert_eq!(
            lines[5],
            "  email: Email unsubscribe request would be sent to: u@shop.example"
        );
        assert_eq!(
            lines[6],
            "  link_1: Successfully unsubscribed via: https://shop.example/u"
        );
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "2. news@daily.example - FAILED");
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        let batch = aggregate(vec![outcome_for(
            "a@x.example",
            vec![AttemptOutcome::new(
                "link_1",
                "Timeout accessing: https://x.example/u",
            )],
        )]);
        export_to_file(&batch, &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.starts_with("AI Email Unsubscriber Results"));
        assert!(written.contains("1. a@x.example - FAILED"));
    }
}
