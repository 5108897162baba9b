//! File-level subscription pipeline: locate, extract, aggregate.

use serde::{Deserialize, Serialize};

use super::extractor::SubscriptionExtractor;
use super::key::KeyConvention;
use super::locator::{locate_declarations, SUBSCRIBED_EVENTS_METHOD};
use super::payload::{aggregate, FilePayload};
use super::syntax::SyntaxNode;
use crate::tree_sitter::{PhpNode, SourceParser};

/// What the pipeline looks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    pub method_name: String,
    pub convention: KeyConvention,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            method_name: SUBSCRIBED_EVENTS_METHOD.to_string(),
            convention: KeyConvention::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionPipeline {
    rules: ExtractionRules,
}

impl SubscriptionPipeline {
    pub fn new(rules: ExtractionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Parse `source` and build its payload.
    ///
    /// A disabled project short-circuits before the parser is touched. A
    /// parser failure yields an empty payload.
    pub fn run<P: SourceParser>(&self, parser: &mut P, source: &str, enabled: bool) -> FilePayload {
        if !enabled {
            return FilePayload::new();
        }

        let tree = match parser.parse_php(source) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("[SubscriptionPipeline] Parse failed: {}", e);
                return FilePayload::new();
            }
        };

        self.map_tree(&PhpNode::root(&tree, source))
    }

    /// Build the payload of an already parsed file.
    pub fn map_tree<N: SyntaxNode>(&self, root: &N) -> FilePayload {
        let declarations = locate_declarations(root, &self.rules.method_name);
        if declarations.is_empty() {
            return FilePayload::new();
        }

        let extractor = SubscriptionExtractor::new(&self.rules.convention);
        let per_declaration: Vec<_> = declarations
            .iter()
            .map(|declaration| extractor.extract(declaration))
            .collect();

        aggregate(per_declaration.into_iter().flatten())
    }
}
