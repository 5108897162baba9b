//! In-memory syntax trees for exercising extraction without a parser.

use super::syntax::{NodeKind, SyntaxNode};

#[derive(Debug, Clone)]
pub struct SyntheticNode {
    kind: NodeKind,
    name: Option<String>,
    text: Option<String>,
    owner: Option<String>,
    children: Vec<SyntheticNode>,
}

impl SyntheticNode {
    fn new(kind: NodeKind, children: Vec<SyntheticNode>) -> Self {
        Self {
            kind,
            name: None,
            text: None,
            owner: None,
            children,
        }
    }

    pub fn other(children: Vec<SyntheticNode>) -> Self {
        Self::new(NodeKind::Other, children)
    }

    /// A leaf of no interest, e.g. a variable or a constant fetch.
    pub fn opaque() -> Self {
        Self::other(Vec::new())
    }

    pub fn string(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::new(NodeKind::StringLiteral, Vec::new())
        }
    }

    pub fn method(name: &str, owner: Option<&str>, body: Vec<SyntheticNode>) -> Self {
        Self {
            name: Some(name.to_string()),
            owner: owner.map(str::to_string),
            ..Self::new(NodeKind::MethodDeclaration, body)
        }
    }

    pub fn ret(argument: SyntheticNode) -> Self {
        Self::new(NodeKind::ReturnStatement, vec![argument])
    }

    pub fn array(entries: Vec<SyntheticNode>) -> Self {
        Self::new(NodeKind::ArrayLiteral, entries)
    }

    pub fn entry(key: SyntheticNode, value: SyntheticNode) -> Self {
        Self::new(NodeKind::ArrayEntry, vec![key, value])
    }

    pub fn list_entry(value: SyntheticNode) -> Self {
        Self::new(NodeKind::ArrayEntry, vec![value])
    }

    /// Shorthand for `'key' => 'value'`.
    pub fn pair(key: &str, value: &str) -> Self {
        Self::entry(Self::string(key), Self::string(value))
    }
}

impl<'a> SyntaxNode for &'a SyntheticNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn children(&self) -> Vec<Self> {
        self.children.iter().collect()
    }

    fn declared_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn literal_text(&self) -> Option<String> {
        self.text.clone()
    }

    fn enclosing_type_name(&self) -> Option<String> {
        self.owner.clone()
    }
}
