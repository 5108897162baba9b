//! Syntax capability interface
//!
//! The extraction code never touches a concrete tree. It sees nodes through
//! [`SyntaxNode`], which a tree-sitter adapter and the in-memory test trees
//! both implement.

/// The node shapes extraction cares about. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    MethodDeclaration,
    ReturnStatement,
    ArrayLiteral,
    ArrayEntry,
    StringLiteral,
    Other,
}

pub trait SyntaxNode: Clone {
    fn kind(&self) -> NodeKind;

    /// Named children in source order, comments excluded.
    fn children(&self) -> Vec<Self>;

    /// Identifier of a declaration node (`None` for anything else).
    fn declared_name(&self) -> Option<String>;

    /// Decoded contents of a string literal (`None` for anything else,
    /// including interpolated strings).
    fn literal_text(&self) -> Option<String>;

    /// Fully-qualified name of the type declaring this node, with `\`
    /// namespace separators as written in source.
    fn enclosing_type_name(&self) -> Option<String>;

    /// Key expression of an `ArrayEntry`, absent for list-style entries.
    fn entry_key(&self) -> Option<Self> {
        if self.kind() != NodeKind::ArrayEntry {
            return None;
        }
        let mut children = self.children();
        if children.len() == 2 {
            Some(children.swap_remove(0))
        } else {
            None
        }
    }

    /// Value expression of an `ArrayEntry`.
    fn entry_value(&self) -> Option<Self> {
        if self.kind() != NodeKind::ArrayEntry {
            return None;
        }
        self.children().pop()
    }

    /// Every node below this one in pre-order (source order).
    ///
    /// Iterative so that deeply nested files cannot overflow the stack.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }
}
