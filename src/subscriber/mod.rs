//! Subscriber extraction
//!
//! Turns a parsed PHP file into the subscriptions its
//! `getSubscribedEvents()` methods declare, grouped by target event.
//!
//! - `syntax`: capability interface over the host AST
//! - `key`: event key micro-syntax
//! - `handler`: handler method names from array values
//! - `locator`: finds the designated methods
//! - `extractor`: array entries to subscriptions
//! - `payload`: per-file grouping
//! - `pipeline`: ties it together for one file

mod extractor;
mod handler;
mod key;
mod locator;
mod payload;
mod pipeline;
mod syntax;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::{Skip, SubscriptionExtractor};
pub use handler::resolve_handler_name;
pub use key::{
    parse_event_key, KeyConvention, ParsedEventKey, AFTER_INIT_RESOURCE_MARKER,
    DEFAULT_SEPARATOR, INIT_RESOURCE_MARKER,
};
pub use locator::{locate_declarations, SUBSCRIBED_EVENTS_METHOD};
pub use payload::{aggregate, handler_signature, EventSubscription, FilePayload};
pub use pipeline::{ExtractionRules, SubscriptionPipeline};
pub use syntax::{NodeKind, SyntaxNode};
