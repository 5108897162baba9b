//! Handler method resolution for subscriber array values.

use super::syntax::{NodeKind, SyntaxNode};

/// Name of the method a subscriber array value points at.
///
/// Only plain string literals are understood; nested arrays, constants and
/// other expressions resolve to `None` and the entry is skipped.
pub fn resolve_handler_name<N: SyntaxNode>(value: &N) -> Option<String> {
    match value.kind() {
        NodeKind::StringLiteral => {
            let text = value.literal_text()?;
            let name = text.trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        }
        NodeKind::MethodDeclaration
        | NodeKind::ReturnStatement
        | NodeKind::ArrayLiteral
        | NodeKind::ArrayEntry
        | NodeKind::Other => None,
    }
}
