//! Email content analysis: extracts unsubscribe signals and scores confidence

use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::models::{UnsubscribeCandidate, PREVIEW_LIMIT};
use crate::patterns;

/// First mailto target inside angle brackets of a List-Unsubscribe header
static MAILTO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<mailto:([^>]+)>").unwrap());

/// All http(s) targets inside angle brackets of a List-Unsubscribe header
static HEADER_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(https?://[^>]+)>").unwrap());

/// First http(s) URL embedded in an inline click handler
static ONCLICK_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s'"]+"#).unwrap());

/// Intermediate plain-text buffer length used for content scoring
const TEXT_BUFFER_LIMIT: usize = 500;

/// Analyzes a single message into an [`UnsubscribeCandidate`]
///
/// Analysis never fails: every field degrades to a safe default (empty
/// string, "now", empty collections) so one malformed message cannot abort
/// a batch.
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw RFC822 bytes and analyze them
    ///
    /// A message that cannot be parsed at all still yields a candidate, with
    /// defaults everywhere and zero confidence.
    pub fn analyze_bytes(&self, raw: &[u8]) -> UnsubscribeCandidate {
        match mailparse::parse_mail(raw) {
            Ok(mail) => self.analyze(&mail),
            Err(e) => {
                debug!("Unparseable message ({}), emitting default candidate", e);
                UnsubscribeCandidate {
                    id: fallback_id("", "", ""),
                    sender: "Unknown Sender".to_string(),
                    subject: "No Subject".to_string(),
                    links: Vec::new(),
                    unsubscribe_mail_address: None,
                    list_unsubscribe_header: None,
                    confidence: 0.0,
                    date: Utc::now(),
                    content_preview: String::new(),
                }
            }
        }
    }

    /// Analyze a parsed message
    pub fn analyze(&self, mail: &ParsedMail) -> UnsubscribeCandidate {
        let from_raw = mail.headers.get_first_value("From");
        let sender = extract_sender(from_raw.as_deref());
        let subject = mail
            .headers
            .get_first_value("Subject")
            .unwrap_or_else(|| "No Subject".to_string());
        let date_raw = mail.headers.get_first_value("Date");
        let date = parse_date(date_raw.as_deref());
        let id = mail
            .headers
            .get_first_value("Message-ID")
            .unwrap_or_else(|| fallback_id(&sender, &subject, date_raw.as_deref().unwrap_or("")));

        let mut links: Vec<String> = Vec::new();
        let mut unsubscribe_mail_address = None;
        let list_unsubscribe_header = mail.headers.get_first_value("List-Unsubscribe");

        if let Some(header) = &list_unsubscribe_header {
            let (mailto, header_links) = parse_list_unsubscribe(header);
            unsubscribe_mail_address = mailto;
            for link in header_links {
                push_link(&mut links, link);
            }
        }

        let mut text_buffer = String::new();
        if let Some(html) = extract_html_content(mail) {
            text_buffer = extract_text(&html, TEXT_BUFFER_LIMIT);
            for link in extract_unsubscribe_links(&html) {
                push_link(&mut links, link);
            }
        }

        let confidence = confidence_score(
            &sender,
            &subject,
            links.len(),
            &text_buffer,
            list_unsubscribe_header.is_some(),
        );

        UnsubscribeCandidate {
            id,
            sender,
            subject,
            links,
            unsubscribe_mail_address,
            list_unsubscribe_header,
            confidence,
            date,
            content_preview: truncate_preview(&text_buffer),
        }
    }
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the address from a "Display Name <addr>" From header
fn extract_sender(from: Option<&str>) -> String {
    let from = match from {
        Some(f) => f,
        None => return "Unknown Sender".to_string(),
    };
    if let (Some(open), Some(close)) = (from.find('<'), from.rfind('>')) {
        if open < close {
            return from[open + 1..close].to_string();
        }
    }
    from.to_string()
}

/// Parse the Date header; malformed dates fall back to the current time
///
/// `mailparse::dateparse` reports unparseable input as `Ok(0)` rather than
/// an error, so a bare zero from it is treated as a failed parse. A genuine
/// epoch date still comes through the strict RFC 2822 path.
fn parse_date(date: Option<&str>) -> DateTime<Utc> {
    let raw = match date {
        Some(d) => d.trim(),
        None => return Utc::now(),
    };
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return parsed.with_timezone(&Utc);
    }
    match mailparse::dateparse(raw) {
        Ok(secs) if secs != 0 => DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now),
        _ => Utc::now(),
    }
}

/// Stable identifier for messages that lack a Message-ID header
fn fallback_id(sender: &str, subject: &str, date: &str) -> String {
    let mut hasher = DefaultHasher::new();
    sender.hash(&mut hasher);
    subject.hash(&mut hasher);
    date.hash(&mut hasher);
    format!("<mailmute-{:016x}>", hasher.finish())
}

/// Parse a List-Unsubscribe header into (mailto address, http links)
fn parse_list_unsubscribe(header: &str) -> (Option<String>, Vec<String>) {
    let mailto = MAILTO_RE
        .captures(header)
        .map(|c| c[1].to_string());
    let links = HEADER_LINK_RE
        .captures_iter(header)
        .map(|c| c[1].to_string())
        .collect();
    (mailto, links)
}

/// Locate and decode the first HTML-typed part of the message
///
/// Decoding tries the declared transfer encoding and charset first, then raw
/// Latin-1; a part that cannot be decoded either way is skipped without
/// failing the message.
fn extract_html_content(mail: &ParsedMail) -> Option<String> {
    let part = find_html_part(mail)?;
    if let Ok(body) = part.get_body() {
        return Some(body);
    }
    match part.get_body_raw() {
        Ok(raw) => Some(raw.iter().map(|&b| b as char).collect()),
        Err(e) => {
            debug!("Skipping undecodable HTML part: {}", e);
            None
        }
    }
}

fn find_html_part<'a>(mail: &'a ParsedMail<'a>) -> Option<&'a ParsedMail<'a>> {
    if mail.ctype.mimetype.eq_ignore_ascii_case("text/html") {
        return Some(mail);
    }
    mail.subparts.iter().find_map(find_html_part)
}

/// Flatten HTML to plain text, keeping at most `limit` characters
fn extract_text(html: &str, limit: usize) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    for chunk in document.root_element().text() {
        for ch in chunk.chars() {
            if text.chars().count() >= limit {
                return text;
            }
            text.push(ch);
        }
    }
    text
}

/// Truncate the stored preview to 200 characters plus an ellipsis marker
fn truncate_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_LIMIT {
        format!("{}...", text.chars().take(PREVIEW_LIMIT).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Extract unsubscribe links from anchors and button click handlers
///
/// An element contributes at most one link; matching stops at the first
/// pattern hit. Only http(s) URLs are kept.
fn extract_unsubscribe_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let anchor_selector = Selector::parse("a[href]").expect("static selector");
    for anchor in document.select(&anchor_selector) {
        let href = match anchor.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        let href_lower = href.to_lowercase();
        let link_text = anchor.text().collect::<String>().trim().to_lowercase();

        let matched =
            patterns::matches_any_pattern(&href_lower) || patterns::matches_any_pattern(&link_text);
        if matched && is_http_url(href) {
            links.push(href.to_string());
        }
    }

    let button_selector =
        Selector::parse(r#"button[type="button"], input[type="button"]"#).expect("static selector");
    for button in document.select(&button_selector) {
        let button_text = button.text().collect::<String>().trim().to_lowercase();
        let onclick = button.value().attr("onclick").unwrap_or("");

        let matched =
            patterns::matches_any_pattern(&button_text) || patterns::matches_any_pattern(onclick);
        if matched {
            if let Some(url) = ONCLICK_URL_RE.find(onclick) {
                links.push(url.as_str().to_string());
            }
        }
    }

    links
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Append a link, enforcing http(s)-only and first-seen deduplication
fn push_link(links: &mut Vec<String>, link: String) {
    if is_http_url(&link) && !links.contains(&link) {
        links.push(link);
    }
}

/// Additive confidence score, each contribution independent, clamped to 1.0
fn confidence_score(
    sender: &str,
    subject: &str,
    link_count: usize,
    content: &str,
    has_header: bool,
) -> f64 {
    let mut score: f64 = 0.0;

    if has_header {
        score += 0.4;
    }

    if link_count > 0 {
        score += 0.3 + (link_count as f64 * 0.1).min(0.2);
    }

    if patterns::sender_is_blacklisted(sender) {
        score += 0.1;
    }

    if patterns::subject_matches(subject) {
        score += 0.1;
    }

    let matched = patterns::count_matching_patterns(content);
    score += (matched as f64 * 0.05).min(0.2);

    score.min(1.0)
}
