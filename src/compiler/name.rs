//! Block names: static identifiers checked at compile time, or runtime expressions

use std::fmt;

use super::expr::Expr;
use super::tokenizer::{Word, WordKind};

/// Leading character that tags a static block name as a snippet
pub const SNIPPET_MARKER: char = '_';

/// Check the identifier grammar: `[_a-zA-Z\x7F-]` followed by `[_a-zA-Z0-9\x7F-]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii())
}

/// A block name known at compile time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockIdent(String);

impl BlockIdent {
    /// Validate `name` against the identifier grammar
    pub fn new(name: &str) -> Option<Self> {
        is_identifier(name).then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Snippet blocks are independently invalidatable
    pub fn is_snippet(&self) -> bool {
        self.0.starts_with(SNIPPET_MARKER)
    }

    /// Name of the snippet on its component (marker stripped)
    pub fn snippet_name(&self) -> Option<&str> {
        self.0.strip_prefix(SNIPPET_MARKER)
    }
}

impl fmt::Display for BlockIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a declared or referenced block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockName {
    /// Identifier resolved through the compile-time block stacks
    Static(BlockIdent),
    /// Computed name, looked up by its runtime value
    Dynamic(Expr),
}

impl BlockName {
    /// Classify a declared name. `prefix` is prepended for snippets.
    ///
    /// A word that is not a valid identifier (quoted, `$var`, or containing
    /// other characters) becomes a dynamic name.
    pub fn declared(word: &Word, prefix: &str) -> Self {
        let text = word.text.trim_start_matches('#');
        if word.kind == WordKind::Bare {
            let name = format!("{}{}", prefix, text);
            if let Some(ident) = BlockIdent::new(&name) {
                return BlockName::Static(ident);
            }
        }
        let expr = match word.kind {
            WordKind::Variable if prefix.is_empty() => word.to_expr(),
            WordKind::Variable => Expr::interpolated(&format!("{}${}", prefix, text)),
            WordKind::Bare | WordKind::DoubleQuoted => {
                Expr::interpolated(&format!("{}{}", prefix, text))
            }
            WordKind::SingleQuoted => Expr::Literal(format!("{}{}", prefix, text)),
        };
        BlockName::Dynamic(expr)
    }

    pub fn is_static(&self) -> bool {
        matches!(self, BlockName::Static(_))
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockName::Static(ident) => write!(f, "{}", ident),
            BlockName::Dynamic(expr) => write!(f, "{}", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(s: &str) -> Word {
        Word {
            text: s.to_string(),
            kind: WordKind::Bare,
        }
    }

    #[test]
    fn test_identifier_grammar() {
        assert!(is_identifier("content"));
        assert!(is_identifier("_snippet1"));
        assert!(is_identifier("název"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("$x"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_declared_static() {
        let name = BlockName::declared(&bare("#content"), "");
        assert_eq!(name, BlockName::Static(BlockIdent::new("content").unwrap()));
    }

    #[test]
    fn test_declared_snippet_prefix() {
        match BlockName::declared(&bare("items"), "_") {
            BlockName::Static(ident) => {
                assert!(ident.is_snippet());
                assert_eq!(ident.snippet_name(), Some("items"));
            }
            other => panic!("Expected static name, got {:?}", other),
        }
    }

    #[test]
    fn test_declared_dynamic() {
        let var = Word {
            text: "name".to_string(),
            kind: WordKind::Variable,
        };
        assert_eq!(
            BlockName::declared(&var, ""),
            BlockName::Dynamic(Expr::Variable("name".to_string()))
        );

        let quoted = Word {
            text: "item".to_string(),
            kind: WordKind::DoubleQuoted,
        };
        assert!(!BlockName::declared(&quoted, "").is_static());

        assert!(!BlockName::declared(&bare("item-$i"), "").is_static());
    }
}
