//! PHP syntax nodes
//!
//! Adapts tree-sitter-php nodes to the [`SyntaxNode`] capability interface
//! used by subscription extraction.

use tree_sitter::{Node, Tree};

use crate::subscriber::{NodeKind, SyntaxNode};

/// Node kinds that declare a named type members can live in
const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "trait_declaration",
    "interface_declaration",
    "enum_declaration",
];

/// A tree-sitter-php node together with the source it was parsed from.
#[derive(Debug, Clone, Copy)]
pub struct PhpNode<'a> {
    node: Node<'a>,
    source: &'a str,
}

impl<'a> PhpNode<'a> {
    pub fn root(tree: &'a Tree, source: &'a str) -> Self {
        Self::new(tree.root_node(), source)
    }

    fn new(node: Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }

    fn text_of(&self, node: Node<'a>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn field_text(&self, field: &str) -> Option<&'a str> {
        self.node
            .child_by_field_name(field)
            .map(|n| self.text_of(n))
            .filter(|t| !t.is_empty())
    }

    fn has_arrow(&self) -> bool {
        (0..self.node.child_count())
            .filter_map(|i| self.node.child(i))
            .any(|c| c.kind() == "=>")
    }

    fn is_plain_encapsed(&self) -> bool {
        let mut cursor = self.node.walk();
        let plain = self
            .node
            .named_children(&mut cursor)
            .all(|c| matches!(c.kind(), "string_content" | "string_value" | "escape_sequence"));
        plain
    }

    /// Namespace in effect for a type declaration.
    fn namespace_of(&self, type_node: Node<'a>) -> Option<&'a str> {
        let mut top = type_node;
        let mut current = type_node.parent();
        while let Some(node) = current {
            if node.kind() == "namespace_definition" {
                // braced form: `namespace Foo { ... }`
                return node
                    .child_by_field_name("name")
                    .map(|n| self.text_of(n));
            }
            if node.kind() == "program" {
                break;
            }
            top = node;
            current = node.parent();
        }

        // statement form: `namespace Foo;` applies to the statements after it
        let mut sibling = top.prev_sibling();
        while let Some(node) = sibling {
            if node.kind() == "namespace_definition" {
                if node.child_by_field_name("body").is_some() {
                    return None;
                }
                return node
                    .child_by_field_name("name")
                    .map(|n| self.text_of(n));
            }
            sibling = node.prev_sibling();
        }
        None
    }
}

impl<'a> SyntaxNode for PhpNode<'a> {
    fn kind(&self) -> NodeKind {
        match self.node.kind() {
            "method_declaration" => NodeKind::MethodDeclaration,
            "return_statement" => NodeKind::ReturnStatement,
            "array_creation_expression" => NodeKind::ArrayLiteral,
            "array_element_initializer" => NodeKind::ArrayEntry,
            "string" | "encapsed_string" => NodeKind::StringLiteral,
            _ => NodeKind::Other,
        }
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        let children = self
            .node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| Self::new(c, self.source))
            .collect();
        children
    }

    fn declared_name(&self) -> Option<String> {
        match self.node.kind() {
            "method_declaration" | "function_definition" => {
                self.field_text("name").map(str::to_string)
            }
            kind if TYPE_DECLARATIONS.contains(&kind) => self.field_text("name").map(str::to_string),
            _ => None,
        }
    }

    fn literal_text(&self) -> Option<String> {
        let text = self.text_of(self.node);
        let text = text
            .strip_prefix('b')
            .or_else(|| text.strip_prefix('B'))
            .unwrap_or(text);

        match self.node.kind() {
            "string" => {
                let body = text.strip_prefix('\'')?.strip_suffix('\'')?;
                Some(unescape_single_quoted(body))
            }
            "encapsed_string" if self.is_plain_encapsed() => {
                let body = text.strip_prefix('"')?.strip_suffix('"')?;
                Some(unescape_double_quoted(body))
            }
            _ => None,
        }
    }

    fn enclosing_type_name(&self) -> Option<String> {
        // method_declaration -> declaration_list -> class_declaration
        let owner = self.node.parent()?.parent()?;
        if !TYPE_DECLARATIONS.contains(&owner.kind()) {
            return None;
        }
        let name = self.text_of(owner.child_by_field_name("name")?);
        if name.is_empty() {
            return None;
        }

        match self.namespace_of(owner) {
            Some(ns) if !ns.is_empty() => Some(format!("\\{}\\{}", ns, name)),
            _ => Some(format!("\\{}", name)),
        }
    }

    fn entry_key(&self) -> Option<Self> {
        if self.kind() != NodeKind::ArrayEntry || !self.has_arrow() {
            return None;
        }
        self.children().into_iter().next()
    }
}

fn unescape_single_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn unescape_double_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.peek() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('v') => '\u{0b}',
            Some('e') => '\u{1b}',
            Some('f') => '\u{0c}',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('$') => '$',
            Some('"') => '"',
            // unknown escapes are kept verbatim
            _ => {
                out.push('\\');
                continue;
            }
        };
        out.push(decoded);
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_sitter::{SourceParser, TreeSitterParser};

    fn with_tree<R>(source: &str, f: impl FnOnce(PhpNode<'_>) -> R) -> R {
        let mut parser = TreeSitterParser::new().unwrap();
        let tree = parser.parse_php(source).unwrap();
        f(PhpNode::root(&tree, source))
    }

    fn owners_of_methods(source: &str) -> Vec<Option<String>> {
        with_tree(source, |root| {
            root.descendants()
                .into_iter()
                .filter(|n| n.kind() == NodeKind::MethodDeclaration)
                .map(|n| n.enclosing_type_name())
                .collect()
        })
    }

    fn string_literals(source: &str) -> Vec<Option<String>> {
        with_tree(source, |root| {
            root.descendants()
                .into_iter()
                .filter(|n| n.kind() == NodeKind::StringLiteral)
                .map(|n| n.literal_text())
                .collect()
        })
    }

    #[test]
    fn test_statement_namespace() {
        let owners = owners_of_methods(
            "<?php\nnamespace Shopware\\Plugins\\SwagCoupons;\n\nclass Subscriber { public function a() {} }\n",
        );
        assert_eq!(owners, vec![Some("\\Shopware\\Plugins\\SwagCoupons\\Subscriber".to_string())]);
    }

    #[test]
    fn test_braced_namespace() {
        let owners = owners_of_methods(
            "<?php\nnamespace First { class A { function a() {} } }\nnamespace { class B { function b() {} } }\n",
        );
        assert_eq!(owners, vec![Some("\\First\\A".to_string()), Some("\\B".to_string())]);
    }

    #[test]
    fn test_global_class_and_trait() {
        let owners = owners_of_methods(
            "<?php\nclass Plain { function a() {} }\ntrait Helper { function b() {} }\n",
        );
        assert_eq!(owners, vec![Some("\\Plain".to_string()), Some("\\Helper".to_string())]);
    }

    #[test]
    fn test_anonymous_class_has_no_owner() {
        let owners = owners_of_methods(
            "<?php\n$x = new class { public function a() {} };\n",
        );
        assert_eq!(owners, vec![None]);
    }

    #[test]
    fn test_method_name() {
        let names: Vec<_> = with_tree(
            "<?php\nclass A { public static function getSubscribedEvents() { return []; } }\n",
            |root| {
                root.descendants()
                    .into_iter()
                    .filter(|n| n.kind() == NodeKind::MethodDeclaration)
                    .filter_map(|n| n.declared_name())
                    .collect()
            },
        );
        assert_eq!(names, vec!["getSubscribedEvents"]);
    }

    #[test]
    fn test_string_decoding() {
        let literals = string_literals(
            "<?php\n$a = ['it\\'s', \"tab\\there\", \"cost \\$5\", \"hi $name\", 'C:\\\\path'];\n",
        );
        assert_eq!(
            literals,
            vec![
                Some("it's".to_string()),
                Some("tab\there".to_string()),
                Some("cost $5".to_string()),
                None,
                Some("C:\\path".to_string()),
            ]
        );
    }

    #[test]
    fn test_array_entries() {
        let entries: Vec<(Option<String>, Option<String>)> = with_tree(
            "<?php\n$a = ['key' => 'value', 'listed'];\n",
            |root| {
                root.descendants()
                    .into_iter()
                    .filter(|n| n.kind() == NodeKind::ArrayEntry)
                    .map(|n| {
                        (
                            n.entry_key().and_then(|k| k.literal_text()),
                            n.entry_value().and_then(|v| v.literal_text()),
                        )
                    })
                    .collect()
            },
        );
        assert_eq!(
            entries,
            vec![
                (Some("key".to_string()), Some("value".to_string())),
                (None, Some("listed".to_string())),
            ]
        );
    }

    #[test]
    fn test_comments_are_not_children() {
        let kinds: Vec<NodeKind> = with_tree(
            "<?php\nfunction f() { return [ /* note */ 'a' => 'b' ]; }\n",
            |root| {
                root.descendants()
                    .into_iter()
                    .filter(|n| n.kind() == NodeKind::ArrayLiteral)
                    .flat_map(|n| n.children())
                    .map(|n| n.kind())
                    .collect()
            },
        );
        assert_eq!(kinds, vec![NodeKind::ArrayEntry]);
    }
}
