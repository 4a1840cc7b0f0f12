//! Compiled template units and their block implementations

use std::fmt;
use std::sync::Arc;

use crate::compiler::{ContentType, Expr, Op};

/// Identity of one compiled template unit instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a unit declared about its ancestor
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExtendsDecl {
    /// No `{extends}`: the caller may still supply an ancestor
    #[default]
    Undeclared,
    /// `{extends none}`
    None,
    /// `{extends auto}`: the caller-supplied layout
    Auto,
    /// `{extends "file"}` / `{extends $var}`
    Target(Expr),
}

/// An executable block body owned by exactly one unit
#[derive(Debug, Clone, PartialEq)]
pub struct BlockImpl {
    /// Registry key; for dynamic blocks the source form of the name expression
    pub name: String,
    pub owner: UnitId,
    /// Position in the owner's declaration order
    pub position: usize,
    pub snippet: bool,
    pub dynamic: bool,
    pub body: Vec<Op>,
}

impl BlockImpl {
    /// Snippet name on the component, for snippet blocks
    pub fn snippet_name(&self) -> Option<&str> {
        if self.snippet {
            self.name.strip_prefix(crate::compiler::SNIPPET_MARKER)
        } else {
            None
        }
    }
}

/// One compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUnit {
    pub name: String,
    pub id: UnitId,
    pub extends: ExtendsDecl,
    /// Statically declared blocks, in declaration order
    pub blocks: Vec<Arc<BlockImpl>>,
    pub body: Vec<Op>,
    /// Escaping context in effect at the end of the template
    pub content_type: ContentType,
    /// MIME type given to `{contentType}`, if any
    pub mime: Option<String>,
}
