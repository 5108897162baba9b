//! Locates the methods that declare subscriptions.

use super::syntax::{NodeKind, SyntaxNode};

/// Method name Shopware subscribers implement.
pub const SUBSCRIBED_EVENTS_METHOD: &str = "getSubscribedEvents";

/// Collect every method declaration under `root` named exactly `method_name`.
pub fn locate_declarations<N: SyntaxNode>(root: &N, method_name: &str) -> Vec<N> {
    root.descendants()
        .into_iter()
        .filter(|node| {
            node.kind() == NodeKind::MethodDeclaration
                && node.declared_name().as_deref() == Some(method_name)
        })
        .collect()
}
