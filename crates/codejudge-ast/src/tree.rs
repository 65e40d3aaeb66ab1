//! Parse-tree access for the feature extractor.
//!
//! The extractor never touches a concrete tree library. It works against
//! the [`AstNode`] capability set -- a `type` tag, a text slice, ordered
//! children, and named-field access -- and [`SourceNode`] implements that
//! set over tree-sitter for the bundled C and C++ grammars. Tests drive
//! the extractor with hand-built mock trees through the same trait.

use serde::{Deserialize, Serialize};
use tree_sitter::Parser;

use crate::error::AstError;

/// Source languages with a bundled grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Parses a language tag; `c++` is accepted as an alias for `cpp`.
    pub fn from_tag(tag: &str) -> Result<Self, AstError> {
        match tag.to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(AstError::UnsupportedLanguage(other.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

/// The node capabilities the feature extractor relies on.
pub trait AstNode: Sized {
    /// The node's type tag (grammar kind).
    fn kind(&self) -> &str;
    /// The source text this node spans.
    fn text(&self) -> &str;
    /// All children in order, anonymous tokens included.
    fn children(&self) -> Vec<Self>;
    /// A child addressed by grammar field name, when present.
    fn field(&self, name: &str) -> Option<Self>;
}

/// An owned parse result: the tree plus the source it indexes into.
pub struct ParsedTree {
    tree: tree_sitter::Tree,
    source: String,
}

impl ParsedTree {
    pub fn root(&self) -> SourceNode<'_> {
        SourceNode {
            node: self.tree.root_node(),
            source: &self.source,
        }
    }
}

/// Parses one source program with the bundled grammar for `language`.
pub fn parse_source(language: Language, source: &str) -> Result<ParsedTree, AstError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|err| AstError::ParserInit(err.to_string()))?;
    let tree = parser.parse(source, None).ok_or(AstError::RootlessTree)?;
    Ok(ParsedTree {
        tree,
        source: source.to_string(),
    })
}

/// A tree-sitter node paired with the source text it slices.
#[derive(Clone, Copy)]
pub struct SourceNode<'a> {
    node: tree_sitter::Node<'a>,
    source: &'a str,
}

impl<'a> AstNode for SourceNode<'a> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn text(&self) -> &str {
        self.node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| SourceNode {
                node,
                source: self.source,
            })
            .collect()
    }

    fn field(&self, name: &str) -> Option<Self> {
        self.node.child_by_field_name(name).map(|node| SourceNode {
            node,
            source: self.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_tags_round_trip() {
        assert_eq!(Language::from_tag("c").unwrap(), Language::C);
        assert_eq!(Language::from_tag("cpp").unwrap(), Language::Cpp);
        assert_eq!(Language::from_tag("C++").unwrap(), Language::Cpp);
        assert!(matches!(
            Language::from_tag("rust"),
            Err(AstError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn parses_c_translation_unit() {
        let tree = parse_source(Language::C, "int main() { return 0; }").unwrap();
        let root = tree.root();
        assert_eq!(root.kind(), "translation_unit");
        assert!(!root.children().is_empty());
    }

    #[test]
    fn parses_cpp_translation_unit() {
        let tree = parse_source(Language::Cpp, "int f(int x) { return x * 2; }").unwrap();
        assert_eq!(tree.root().kind(), "translation_unit");
    }

    #[test]
    fn field_access_resolves_declarator() {
        let tree = parse_source(Language::C, "int add(int a, int b) { return a + b; }").unwrap();
        let root = tree.root();
        let function = root
            .children()
            .into_iter()
            .find(|c| c.kind() == "function_definition")
            .unwrap();
        let declarator = function.field("declarator").unwrap();
        assert_eq!(declarator.kind(), "function_declarator");
        assert_eq!(declarator.field("declarator").unwrap().text(), "add");
    }

    #[test]
    fn empty_source_parses_to_bare_root() {
        let tree = parse_source(Language::C, "").unwrap();
        let root = tree.root();
        assert_eq!(root.kind(), "translation_unit");
        assert!(root.children().is_empty());
    }
}
