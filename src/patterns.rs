//! Textual pattern library shared by analysis and success detection

use once_cell::sync::Lazy;
use regex::Regex;

/// Regexes matching words or phrases that indicate an unsubscribe action.
///
/// Order matters: subject scoring only consults the first five entries.
pub static UNSUBSCRIBE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"unsubscribe",
        r"opt.?out",
        r"remove.*list",
        r"stop.*email",
        r"cancel.*subscription",
        r"manage.*preferences",
        r"email.*settings",
        r"notification.*settings",
        r"mailing.*list.*remove",
        r"leave.*list",
        r"turn.*off.*notifications",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect()
});

/// Number of leading patterns consulted when scoring the subject line
pub const SUBJECT_PATTERN_COUNT: usize = 5;

/// Substrings that mark a sender address as a bulk-mail sender
pub static SENDER_BLACKLIST: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
    "newsletter",
    "marketing",
    "promo",
    "deals",
];

/// Phrases a confirmation page uses to announce a completed unsubscribe
pub static SUCCESS_PHRASES: &[&str] = &[
    "successfully unsubscribed",
    "removed from list",
    "unsubscribe successful",
    "email preferences updated",
    "subscription cancelled",
];

/// Words identifying a form on a page as an unsubscribe form
pub static FORM_KEYWORDS: &[&str] = &["unsubscribe", "remove", "opt out"];

/// Check whether any unsubscribe pattern matches the given text
pub fn matches_any_pattern(text: &str) -> bool {
    UNSUBSCRIBE_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Count how many DISTINCT patterns match the text (not occurrences)
pub fn count_matching_patterns(text: &str) -> usize {
    UNSUBSCRIBE_PATTERNS
        .iter()
        .filter(|p| p.is_match(text))
        .count()
}

/// Check whether a sender string contains any blacklist substring
pub fn sender_is_blacklisted(sender: &str) -> bool {
    let sender_lower = sender.to_lowercase();
    SENDER_BLACKLIST
        .iter()
        .any(|term| sender_lower.contains(term))
}

/// Check whether a subject matches one of the leading unsubscribe patterns
pub fn subject_matches(subject: &str) -> bool {
    UNSUBSCRIBE_PATTERNS
        .iter()
        .take(SUBJECT_PATTERN_COUNT)
        .any(|p| p.is_match(subject))
}

/// Check whether page content announces a successful unsubscribe
pub fn contains_success_phrase(html: &str) -> bool {
    let content_lower = html.to_lowercase();
    SUCCESS_PHRASES
        .iter()
        .any(|phrase| content_lower.contains(phrase))
}
