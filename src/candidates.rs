//! Ordered, threshold-filtered collection of analyzed candidates

use crate::models::UnsubscribeCandidate;

/// Holds the candidates from one analysis run, in analysis order
///
/// Only candidates at or above the confidence threshold are admitted; the
/// store feeds the executor and any presentation layer.
#[derive(Debug)]
pub struct CandidateStore {
    threshold: f64,
    candidates: Vec<UnsubscribeCandidate>,
}

impl CandidateStore {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            candidates: Vec::new(),
        }
    }

    /// Admit a candidate if it meets the threshold; returns whether it did
    pub fn push_if_confident(&mut self, candidate: UnsubscribeCandidate) -> bool {
        if candidate.confidence >= self.threshold {
            self.candidates.push(candidate);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnsubscribeCandidate> {
        self.candidates.iter()
    }

    pub fn into_candidates(self) -> Vec<UnsubscribeCandidate> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(confidence: f64) -> UnsubscribeCandidate {
        UnsubscribeCandidate {
            id: format!("<c-{}>", confidence),
            sender: "promo@shop.example".to_string(),
            subject: "sale".to_string(),
            links: Vec::new(),
            unsubscribe_mail_address: None,
            list_unsubscribe_header: None,
            confidence,
            date: Utc::now(),
            content_preview: String::new(),
        }
    }

    #[test]
    fn test_threshold_filter() {
        let mut store = CandidateStore::new(0.5);
        assert!(store.push_if_confident(candidate(0.9)));
        assert!(store.push_if_confident(candidate(0.5)));
        assert!(!store.push_if_confident(candidate(0.49)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = CandidateStore::new(0.0);
        store.push_if_confident(candidate(0.3));
        store.push_if_confident(candidate(0.9));
        store.push_if_confident(candidate(0.6));
        let confidences: Vec<f64> = store.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.3, 0.9, 0.6]);
    }
}
