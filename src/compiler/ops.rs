//! Executable operations a template body or block compiles to

use std::sync::Arc;

use super::expr::{Arg, Expr};
use super::name::BlockName;
use super::translators::ContentType;
use crate::parser::Modifier;
use crate::template::BlockImpl;

/// Which variables a block call starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgScope {
    /// Variables visible at the call site
    Locals,
    /// Parameters the template was rendered with
    Template,
}

/// A dispatch (or parent-dispatch) of a named block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCall {
    pub name: BlockName,
    pub parent: bool,
    pub args: Vec<Arg>,
    pub scope: ArgScope,
    pub modifiers: Vec<Modifier>,
}

impl BlockCall {
    /// Plain call of a block at its declaration site
    pub fn at_site(name: BlockName, scope: ArgScope, modifiers: Vec<Modifier>) -> Self {
        Self {
            name,
            parent: false,
            args: Vec::new(),
            scope,
            modifiers,
        }
    }
}

/// One `{ifset}` condition
#[derive(Debug, Clone, PartialEq)]
pub enum IfSetTerm {
    /// `#name`: the block stack is non-empty
    Block(BlockName),
    /// `$name`: the variable is defined
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Literal output
    Text(String),
    /// Escaped expression output
    Print {
        expr: Expr,
        modifiers: Vec<Modifier>,
        context: ContentType,
    },
    /// Dispatch a block
    Call(BlockCall),
    /// Dispatch a top-level block unless the template turned out to extend another
    CallUnlessExtending(BlockCall),
    /// Snippet site: wrap the call in a container carrying the snippet id.
    /// Skipped while the template delegates to an ancestor.
    Snippet {
        name: String,
        tag: String,
        call: BlockCall,
    },
    /// Anonymous block with modifiers: capture output, apply modifiers once
    Capture {
        body: Vec<Op>,
        modifiers: Vec<Modifier>,
    },
    /// Register a dynamically named block under its runtime name, then call it
    DefineDynamic {
        name: Expr,
        site: usize,
        block: Arc<BlockImpl>,
        modifiers: Vec<Modifier>,
    },
    /// Render `body` only when every term holds
    IfSet {
        terms: Vec<IfSetTerm>,
        body: Vec<Op>,
    },
    /// Render a child component
    Control {
        name: Expr,
        method: Option<String>,
        args: Vec<Arg>,
    },
    /// Resolve and print a link
    Link {
        destination: Expr,
        args: Vec<Arg>,
        presenter: bool,
        context: ContentType,
    },
    /// Render another template; `share_blocks` keeps the current registry
    IncludeTemplate {
        target: Expr,
        args: Vec<Arg>,
        share_blocks: bool,
        modifiers: Vec<Modifier>,
    },
}
