//! Event search
//!
//! Ranks indexed event identifiers against a free-text query so consumers
//! can find an event without knowing its exact name.

use super::store::{EventIndexStore, EventStoreError, EventSummary};
use serde::{Deserialize, Serialize};

/// Structured search query
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Text to look for inside event names
    pub text: Option<String>,
    /// Only events handled in at least this many files
    pub min_files: Option<usize>,
    /// Maximum results to return
    pub limit: Option<usize>,
}

impl EventQuery {
    /// Create a simple text search query
    pub fn text(query: &str) -> Self {
        Self {
            text: Some(query.to_string()),
            limit: Some(50),
            ..Default::default()
        }
    }

    /// Add a limit to the query
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only keep events subscribed from several files
    pub fn with_min_files(mut self, min_files: usize) -> Self {
        self.min_files = Some(min_files);
        self
    }
}

/// Search result with relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSearchResult {
    pub summary: EventSummary,
    /// Relevance score (0.0 to 1.0)
    pub score: f32,
}

/// Execute a search query against the event index
pub fn execute_search(
    store: &EventIndexStore,
    query: &EventQuery,
) -> Result<Vec<EventSearchResult>, EventStoreError> {
    let limit = query.limit.unwrap_or(50);
    let text = query.text.as_deref().unwrap_or("");

    // rank every candidate before the limit applies
    let mut results: Vec<EventSearchResult> = store
        .search_events(text, query.min_files.unwrap_or(0))?
        .into_iter()
        .map(|summary| {
            let score = calculate_relevance(&summary.event, text);
            EventSearchResult { summary, score }
        })
        .filter(|r| r.score > 0.0)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.summary.event.cmp(&b.summary.event))
    });
    results.truncate(limit);

    Ok(results)
}

/// Calculate relevance score between query and event name
fn calculate_relevance(event: &str, query: &str) -> f32 {
    if query.is_empty() {
        return 1.0;
    }

    let event_lower = event.to_lowercase();
    let query_lower = query.to_lowercase();

    // Exact match
    if event_lower == query_lower {
        return 1.0;
    }

    // Suffix match: the namespace part is what people type
    if event_lower.ends_with(&query_lower) {
        return 0.9;
    }

    match event_lower.find(&query_lower) {
        Some(pos) => {
            let len = event_lower.len() as f32;
            0.7 - (pos as f32 / len) * 0.3
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::{aggregate, EventSubscription};

    fn store_with(events: &[(&str, &str)]) -> EventIndexStore {
        let store = EventIndexStore::in_memory().unwrap();
        for (file, event) in events {
            let payload = aggregate(vec![EventSubscription::new(
                format!("{}.svc", event),
                event.to_string(),
                "svc".to_string(),
                "Vendor.Subscriber.onSvc".to_string(),
            )]);
            let existing = store.file_payload(file).unwrap().unwrap_or_default();
            let merged = aggregate(
                existing
                    .events()
                    .flat_map(|(_, subs)| subs.iter().cloned())
                    .chain(payload.events().flat_map(|(_, subs)| subs.iter().cloned())),
            );
            store.put(file, "h", &merged).unwrap();
        }
        store
    }

    #[test]
    fn test_relevance_exact_match() {
        assert_eq!(calculate_relevance("Enlight_Bootstrap_InitResource_a", "enlight_bootstrap_initresource_a"), 1.0);
    }

    #[test]
    fn test_relevance_suffix_beats_contains() {
        let suffix = calculate_relevance("Enlight_Bootstrap_InitResource_swagcoupons", "swagcoupons");
        let contains = calculate_relevance("Enlight_Bootstrap_InitResource_swagcoupons_extra", "swagcoupons");
        assert!(suffix > contains);
        assert_eq!(calculate_relevance("Enlight_Bootstrap_InitResource_a", "zzz"), 0.0);
    }

    #[test]
    fn test_search_ranks_and_limits() {
        let store = store_with(&[
            ("A.php", "Enlight_Bootstrap_InitResource_mail_extra"),
            ("B.php", "Enlight_Bootstrap_InitResource_mail"),
            ("C.php", "Enlight_Bootstrap_InitResource_router"),
        ]);

        let results = execute_search(&store, &EventQuery::text("mail")).unwrap();
        let events: Vec<_> = results.iter().map(|r| r.summary.event.as_str()).collect();
        assert_eq!(
            events,
            vec!["Enlight_Bootstrap_InitResource_mail", "Enlight_Bootstrap_InitResource_mail_extra"]
        );

        let limited = execute_search(&store, &EventQuery::text("mail").with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_best_match_survives_limit() {
        let store = store_with(&[
            ("A1.php", "Enlight_Bootstrap_InitResource_amail_1"),
            ("A2.php", "Enlight_Bootstrap_InitResource_amail_2"),
            ("A3.php", "Enlight_Bootstrap_InitResource_amail_3"),
            ("A4.php", "Enlight_Bootstrap_InitResource_amail_4"),
            ("Z.php", "Enlight_Bootstrap_InitResource_zmail"),
        ]);

        let results = execute_search(&store, &EventQuery::text("mail").with_limit(1)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary.event, "Enlight_Bootstrap_InitResource_zmail");
        assert_eq!(results[0].score, 0.9);
    }

    #[test]
    fn test_min_files_applies_before_limit() {
        let store = store_with(&[
            ("A1.php", "Enlight_Bootstrap_InitResource_a1"),
            ("A2.php", "Enlight_Bootstrap_InitResource_a2"),
            ("A3.php", "Enlight_Bootstrap_InitResource_a3"),
            ("A4.php", "Enlight_Bootstrap_InitResource_a4"),
            ("Z1.php", "Enlight_Bootstrap_InitResource_z"),
            ("Z2.php", "Enlight_Bootstrap_InitResource_z"),
        ]);

        let query = EventQuery::default().with_min_files(2).with_limit(1);
        let results = execute_search(&store, &query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary.event, "Enlight_Bootstrap_InitResource_z");
    }

    #[test]
    fn test_wildcard_characters_do_not_match() {
        let store = store_with(&[("A.php", "Enlight_Bootstrap_InitResource_swagcoupons")]);

        assert!(execute_search(&store, &EventQuery::text("swa_coupons")).unwrap().is_empty());
        assert!(execute_search(&store, &EventQuery::text("swag%pons")).unwrap().is_empty());
    }

    #[test]
    fn test_search_min_files() {
        let store = store_with(&[
            ("A.php", "Enlight_Bootstrap_InitResource_shared"),
            ("B.php", "Enlight_Bootstrap_InitResource_shared"),
            ("B.php", "Enlight_Bootstrap_InitResource_single"),
        ]);

        let results = execute_search(&store, &EventQuery::default().with_min_files(2)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary.file_count, 2);
    }
}
