//! Subscription extraction from `getSubscribedEvents()` bodies
//!
//! ```php
//! public static function getSubscribedEvents() {
//!     return [
//!         'Enlight_Bootstrap_InitResource_swagcoupons.basket_helper' => 'onInitBasketHelper',
//!     ];
//! }
//! ```
//!
//! Every return statement in the body whose argument is an array literal is
//! inspected; each entry either becomes one [`EventSubscription`] or is
//! skipped on its own.

use super::handler::resolve_handler_name;
use super::key::KeyConvention;
use super::payload::{handler_signature, EventSubscription};
use super::syntax::{NodeKind, SyntaxNode};

/// Why an array entry produced no subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Key or value shape not recognised
    NoMatch,
    /// The declaration has no named enclosing type
    MissingContext,
}

/// Extracts subscriptions from one located declaration.
pub struct SubscriptionExtractor<'a> {
    convention: &'a KeyConvention,
}

impl<'a> SubscriptionExtractor<'a> {
    pub fn new(convention: &'a KeyConvention) -> Self {
        Self { convention }
    }

    pub fn extract<N: SyntaxNode>(&self, declaration: &N) -> Vec<EventSubscription> {
        let owner = declaration.enclosing_type_name();
        let mut subscriptions = Vec::new();

        for entry in array_entries_returned_by(declaration) {
            match self.entry_to_subscription(&entry, owner.as_deref()) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(Skip::MissingContext) => {
                    tracing::debug!(
                        "[SubscriptionExtractor] Skipping entry of {:?}: no enclosing type",
                        declaration.declared_name()
                    );
                }
                Err(Skip::NoMatch) => {}
            }
        }

        subscriptions
    }

    fn entry_to_subscription<N: SyntaxNode>(
        &self,
        entry: &N,
        owner: Option<&str>,
    ) -> Result<EventSubscription, Skip> {
        let key = entry
            .entry_key()
            .filter(|k| k.kind() == NodeKind::StringLiteral)
            .ok_or(Skip::NoMatch)?;
        let raw_key = key.literal_text().ok_or(Skip::NoMatch)?;
        let parsed = self.convention.parse(&raw_key).ok_or(Skip::NoMatch)?;

        let value = entry.entry_value().ok_or(Skip::NoMatch)?;
        let method_name = resolve_handler_name(&value).ok_or(Skip::NoMatch)?;

        let owner = owner.ok_or(Skip::MissingContext)?;
        let signature = handler_signature(owner, &method_name).ok_or(Skip::MissingContext)?;

        Ok(EventSubscription::new(
            raw_key,
            parsed.target_event,
            parsed.service_name,
            signature,
        ))
    }
}

/// Entries of every array literal directly returned inside `declaration`.
fn array_entries_returned_by<N: SyntaxNode>(declaration: &N) -> Vec<N> {
    declaration
        .descendants()
        .into_iter()
        .filter(|node| node.kind() == NodeKind::ReturnStatement)
        .filter_map(|ret| ret.children().into_iter().next())
        .filter(|argument| argument.kind() == NodeKind::ArrayLiteral)
        .flat_map(|array| {
            array
                .children()
                .into_iter()
                .filter(|entry| entry.kind() == NodeKind::ArrayEntry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::testing::SyntheticNode;

    const OWNER: &str = "Shopware\\Plugins\\SwagCoupons\\Subscriber";

    fn extract(decl: &SyntheticNode) -> Vec<EventSubscription> {
        let convention = KeyConvention::default();
        SubscriptionExtractor::new(&convention).extract(&decl)
    }

    #[test]
    fn test_extract_single_entry() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            Some(OWNER),
            vec![SyntheticNode::ret(SyntheticNode::array(vec![SyntheticNode::pair(
                "Enlight_Bootstrap_InitResource_swagcoupons.basket_helper",
                "onInitBasketHelper",
            )]))],
        );

        let subs = extract(&decl);
        assert_eq!(
            subs,
            vec![EventSubscription::new(
                "Enlight_Bootstrap_InitResource_swagcoupons.basket_helper".to_string(),
                "Enlight_Bootstrap_InitResource_swagcoupons".to_string(),
                "basket_helper".to_string(),
                "Shopware.Plugins.SwagCoupons.Subscriber.onInitBasketHelper".to_string(),
            )]
        );
    }

    #[test]
    fn test_non_string_key_skips_only_that_entry() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            Some(OWNER),
            vec![SyntheticNode::ret(SyntheticNode::array(vec![
                SyntheticNode::pair("Enlight_Bootstrap_InitResource_a.one", "onOne"),
                SyntheticNode::entry(SyntheticNode::opaque(), SyntheticNode::string("onConst")),
                SyntheticNode::pair("Enlight_Bootstrap_InitResource_a.two", "onTwo"),
            ]))],
        );

        let subs = extract(&decl);
        let services: Vec<_> = subs.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(services, vec!["one", "two"]);
    }

    #[test]
    fn test_skips_unrelated_and_unresolvable_entries() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            Some(OWNER),
            vec![SyntheticNode::ret(SyntheticNode::array(vec![
                SyntheticNode::pair("Enlight_Controller_Action_PostDispatch", "onPostDispatch"),
                SyntheticNode::pair("Enlight_Bootstrap_InitResource_a.blank", "  "),
                SyntheticNode::entry(
                    SyntheticNode::string("Enlight_Bootstrap_InitResource_a.nested"),
                    SyntheticNode::array(vec![SyntheticNode::list_entry(SyntheticNode::string("onNested"))]),
                ),
                SyntheticNode::list_entry(SyntheticNode::string("onListed")),
                SyntheticNode::pair("Enlight_Bootstrap_InitResource_a.kept", "onKept"),
            ]))],
        );

        let subs = extract(&decl);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].signature, "Shopware.Plugins.SwagCoupons.Subscriber.onKept");
    }

    #[test]
    fn test_missing_owner_drops_entries() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            None,
            vec![SyntheticNode::ret(SyntheticNode::array(vec![SyntheticNode::pair(
                "Enlight_Bootstrap_InitResource_a.b",
                "onB",
            )]))],
        );

        assert!(extract(&decl).is_empty());
    }

    #[test]
    fn test_every_return_is_processed() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            Some(OWNER),
            vec![
                SyntheticNode::other(vec![SyntheticNode::ret(SyntheticNode::array(vec![
                    SyntheticNode::pair("Enlight_Bootstrap_InitResource_a.first", "onFirst"),
                ]))]),
                SyntheticNode::ret(SyntheticNode::array(vec![SyntheticNode::pair(
                    "Enlight_Bootstrap_InitResource_a.second",
                    "onSecond",
                )])),
            ],
        );

        let subs = extract(&decl);
        let services: Vec<_> = subs.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(services, vec!["first", "second"]);
    }

    #[test]
    fn test_non_array_return_yields_nothing() {
        let decl = SyntheticNode::method(
            "getSubscribedEvents",
            Some(OWNER),
            vec![SyntheticNode::ret(SyntheticNode::opaque())],
        );

        assert!(extract(&decl).is_empty());
    }
}
