//! Tree-sitter integration
//!
//! Native PHP parsing for subscriber extraction. The parser produces
//! tree-sitter trees; [`PhpNode`] exposes them through the syntax capability
//! interface the extraction code is written against.

mod node;
mod parser;

pub use node::PhpNode;
pub use parser::{Language, SourceParser, TreeSitterError, TreeSitterParser};
