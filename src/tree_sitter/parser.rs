//! Tree-sitter parser management
//!
//! Owns the tree-sitter parsers for the languages the subscriber index
//! understands and hands out syntax trees for source buffers.

use std::collections::HashMap;
use tree_sitter::{Parser, Tree};

/// Supported programming languages for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Php,
}

impl Language {
    /// Detect language from file path extension
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "php" | "phtml" => Some(Language::Php),
            _ => None,
        }
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Php => "PHP",
        }
    }
}

/// Error type for tree-sitter operations
#[derive(Debug, thiserror::Error)]
pub enum TreeSitterError {
    #[error("Unsupported language")]
    UnsupportedLanguage,
    #[error("Failed to parse code")]
    ParseFailed,
    #[error("Failed to initialize language: {0}")]
    LanguageInitFailed(String),
}

/// Anything that can turn a PHP source buffer into a syntax tree.
///
/// The subscription pipeline only talks to this seam, so callers can swap the
/// parser for a double that records invocations.
pub trait SourceParser {
    fn parse_php(&mut self, code: &str) -> Result<Tree, TreeSitterError>;
}

/// Tree-sitter parser manager
///
/// Not `Sync`: every indexing worker owns its own instance.
pub struct TreeSitterParser {
    parsers: HashMap<Language, Parser>,
}

impl TreeSitterParser {
    /// Create a new parser manager with all supported languages initialized
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parsers = HashMap::new();

        let mut php_parser = Parser::new();
        php_parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| TreeSitterError::LanguageInitFailed(e.to_string()))?;
        parsers.insert(Language::Php, php_parser);

        Ok(Self { parsers })
    }

    /// Parse source code for the given language
    pub fn parse(&mut self, code: &str, language: Language) -> Result<Tree, TreeSitterError> {
        let parser = self
            .parsers
            .get_mut(&language)
            .ok_or(TreeSitterError::UnsupportedLanguage)?;

        parser.parse(code, None).ok_or(TreeSitterError::ParseFailed)
    }

    /// Check if a language is supported
    pub fn supports_language(&self, language: Language) -> bool {
        self.parsers.contains_key(&language)
    }
}

impl SourceParser for TreeSitterParser {
    fn parse_php(&mut self, code: &str) -> Result<Tree, TreeSitterError> {
        self.parse(code, Language::Php)
    }
}
