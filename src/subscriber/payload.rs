//! Subscription records and their per-file grouping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resolved event-to-handler binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscription {
    /// Key exactly as written in the subscriber array
    pub raw_key: String,
    /// Event the handler is registered for
    pub target_event: String,
    /// Service named by the key
    pub service_name: String,
    /// `Fully.Qualified.Type.method`
    pub signature: String,
}

impl EventSubscription {
    pub fn new(
        raw_key: String,
        target_event: String,
        service_name: String,
        signature: String,
    ) -> Self {
        Self {
            raw_key,
            target_event,
            service_name,
            signature,
        }
    }
}

/// Build a handler signature from a namespaced type name and a method.
///
/// `\Shopware\Plugins\Foo\Subscriber` + `onInit` becomes
/// `Shopware.Plugins.Foo.Subscriber.onInit`.
pub fn handler_signature(type_name: &str, method_name: &str) -> Option<String> {
    let stripped = type_name.trim_matches('\\');
    if stripped.is_empty() || method_name.is_empty() {
        return None;
    }
    Some(format!("{}.{}", stripped.replace('\\', "."), method_name))
}

/// Subscriptions of one file grouped by target event.
///
/// Groups are ordered by event name so encodings are deterministic; each
/// group keeps extraction order and duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    events: BTreeMap<String, Vec<EventSubscription>>,
}

impl FilePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn get(&self, target_event: &str) -> Option<&[EventSubscription]> {
        self.events.get(target_event).map(Vec::as_slice)
    }

    pub fn events(&self) -> impl Iterator<Item = (&str, &[EventSubscription])> {
        self.events
            .iter()
            .map(|(event, subs)| (event.as_str(), subs.as_slice()))
    }

    pub(crate) fn insert_group(&mut self, target_event: String, subscriptions: Vec<EventSubscription>) {
        self.events.entry(target_event).or_default().extend(subscriptions);
    }
}

/// Group subscriptions by target event, preserving order within each group.
pub fn aggregate<I>(subscriptions: I) -> FilePayload
where
    I: IntoIterator<Item = EventSubscription>,
{
    let mut payload = FilePayload::new();
    for subscription in subscriptions {
        payload
            .events
            .entry(subscription.target_event.clone())
            .or_default()
            .push(subscription);
    }
    payload
}
