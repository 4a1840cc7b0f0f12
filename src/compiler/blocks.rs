//! Block directive compiler
//!
//! Walks a directive tree once, in source order, and produces a
//! [`TemplateUnit`]. Named blocks are lifted out of the body into block
//! implementations; the inline site is replaced with a call so the block can
//! be re-invoked later by descendants' parent calls or by the snippet sweep.

use std::collections::HashSet;
use std::sync::Arc;

use super::error::CompileError;
use super::name::{BlockIdent, BlockName};
use super::ops::{ArgScope, BlockCall, IfSetTerm, Op};
use super::tokenizer::{ArgTokenizer, Word, WordKind};
use super::translators::{self, ContentType};
use crate::config::EngineConfig;
use crate::parser::{Directive, DirectiveHead, Document, Node, Span, Spanned};
use crate::template::{BlockImpl, ExtendsDecl, TemplateUnit, UnitId};

/// Which block-like directive opened a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Block,
    Define,
    Snippet,
}

impl BlockKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "block" => Some(BlockKind::Block),
            "define" => Some(BlockKind::Define),
            "snippet" => Some(BlockKind::Snippet),
            _ => None,
        }
    }
}

/// Single-pass compiler for one template unit
pub struct Compiler<'c> {
    name: String,
    id: UnitId,
    config: &'c EngineConfig,
    named_blocks: HashSet<String>,
    blocks: Vec<Arc<BlockImpl>>,
    extends: Option<ExtendsDecl>,
    /// Enclosing block scopes, innermost last; `None` for anonymous blocks
    scopes: Vec<Option<BlockName>>,
    /// Number of directives enclosing the current position
    depth: usize,
    content_type: ContentType,
    mime: Option<String>,
    dynamic_sites: usize,
    unterminated: Vec<(String, Span)>,
}

impl<'c> Compiler<'c> {
    pub fn new(name: impl Into<String>, id: UnitId, config: &'c EngineConfig) -> Self {
        Self {
            name: name.into(),
            id,
            config,
            named_blocks: HashSet::new(),
            blocks: Vec::new(),
            extends: None,
            scopes: Vec::new(),
            depth: 0,
            content_type: config.content_type,
            mime: None,
            dynamic_sites: 0,
            unterminated: Vec::new(),
        }
    }

    /// Compile a whole document into a template unit
    pub fn compile(mut self, document: &Document) -> Result<TemplateUnit, CompileError> {
        let body = self.compile_nodes(&document.nodes)?;
        self.finalize()?;
        self.blocks.sort_by_key(|b| b.position);

        log::debug!(
            "compiled template '{}' ({}): {} blocks, extends {:?}",
            self.name,
            self.id,
            self.blocks.len(),
            self.extends
        );

        Ok(TemplateUnit {
            name: self.name,
            id: self.id,
            extends: self.extends.unwrap_or_default(),
            blocks: self.blocks,
            body,
            content_type: self.content_type,
            mime: self.mime,
        })
    }

    /// Close out the pass: the last block still open at end of input is
    /// closed on the author's behalf, anything else left open is an error
    fn finalize(&mut self) -> Result<(), CompileError> {
        match self.unterminated.as_slice() {
            [] => Ok(()),
            [(name, span)] if name == "block" && !self.config.strict_blocks => {
                log::debug!("auto-closing {{block}} at {:?} in '{}'", span, self.name);
                Ok(())
            }
            [.., (name, span)] => Err(CompileError::Unterminated {
                name: name.clone(),
                span: span.clone(),
            }),
        }
    }

    fn compile_nodes(&mut self, nodes: &[Spanned<Node>]) -> Result<Vec<Op>, CompileError> {
        let mut ops = Vec::new();
        for node in nodes {
            match &node.node {
                Node::Text(text) => push_op(&mut ops, Op::Text(text.clone())),
                Node::Directive(directive) => {
                    if directive.paired && !directive.closed {
                        self.unterminated
                            .push((directive.head.name.clone(), node.span.clone()));
                    }
                    for op in self.compile_directive(directive, &node.span)? {
                        push_op(&mut ops, op);
                    }
                }
            }
        }
        Ok(ops)
    }

    /// Compile children one level deeper, optionally inside a block scope
    fn compile_children(
        &mut self,
        children: &[Spanned<Node>],
        scope: Option<Option<BlockName>>,
    ) -> Result<Vec<Op>, CompileError> {
        let pushed = scope.is_some();
        if let Some(scope) = scope {
            self.scopes.push(scope);
        }
        self.depth += 1;
        let result = self.compile_nodes(children);
        self.depth -= 1;
        if pushed {
            self.scopes.pop();
        }
        result
    }

    fn compile_directive(
        &mut self,
        directive: &Directive,
        span: &Span,
    ) -> Result<Vec<Op>, CompileError> {
        let head = &directive.head;
        if let Some(kind) = BlockKind::from_name(&head.name) {
            return self.declare_block(directive, kind, span);
        }

        match head.name.as_str() {
            DirectiveHead::PRINT => Ok(self.print(head).into_iter().collect()),
            "include" => self.resolve_include(head, span).map(|op| vec![op]),
            "includeblock" => Ok(vec![self.include_template(head, span, true)?]),
            "extends" | "layout" => self.declare_extends(head, span).map(|_| Vec::new()),
            "ifset" => self.ifset(directive),
            "control" | "widget" => Ok(vec![translators::control(head, span)?]),
            "link" | "plink" => Ok(vec![translators::link(head, span, self.content_type)?]),
            "contentType" => {
                let (context, mime) = translators::content_type(head);
                self.content_type = context;
                if mime.is_some() {
                    self.mime = mime;
                }
                Ok(Vec::new())
            }
            other => Err(CompileError::UnknownDirective {
                name: other.to_string(),
                span: span.clone(),
            }),
        }
    }

    /// `{block [[#]name]}`, `{define [#]name}`, `{snippet [name [,] [tag]]}`
    fn declare_block(
        &mut self,
        directive: &Directive,
        kind: BlockKind,
        span: &Span,
    ) -> Result<Vec<Op>, CompileError> {
        let head = &directive.head;
        let mut tokens = ArgTokenizer::new(&head.args);
        let word = tokens.fetch_word();

        if kind == BlockKind::Block && word.is_none() {
            let body = self.compile_children(&directive.children, Some(None))?;
            return Ok(if head.modifiers.is_empty() {
                body
            } else {
                vec![Op::Capture {
                    body,
                    modifiers: head.modifiers.clone(),
                }]
            });
        }

        let name = match (&word, kind) {
            (Some(word), BlockKind::Snippet) => BlockName::declared(word, "_"),
            (Some(word), _) if !word.text.trim_start_matches('#').is_empty() => {
                BlockName::declared(word, "")
            }
            (None, BlockKind::Snippet) => BlockName::declared(
                &Word {
                    text: String::new(),
                    kind: WordKind::Bare,
                },
                "_",
            ),
            _ => {
                return Err(CompileError::MissingBlockName {
                    directive: head.name.clone(),
                    span: span.clone(),
                })
            }
        };

        let ident = match name {
            BlockName::Static(ident) => ident,
            BlockName::Dynamic(expr) => {
                let body = self.compile_children(
                    &directive.children,
                    Some(Some(BlockName::Dynamic(expr.clone()))),
                )?;
                let site = self.dynamic_sites;
                self.dynamic_sites += 1;
                let block = Arc::new(BlockImpl {
                    name: expr.to_string(),
                    owner: self.id,
                    position: site,
                    snippet: false,
                    dynamic: true,
                    body,
                });
                return Ok(vec![Op::DefineDynamic {
                    name: expr,
                    site,
                    block,
                    modifiers: head.modifiers.clone(),
                }]);
            }
        };

        if !self.named_blocks.insert(ident.as_str().to_string()) {
            return Err(CompileError::DuplicateBlock {
                name: ident.as_str().to_string(),
                span: span.clone(),
            });
        }
        // declaration order is the order blocks are opened in
        let position = self.named_blocks.len() - 1;
        let top = self.depth == 0;

        let body = self.compile_children(
            &directive.children,
            Some(Some(BlockName::Static(ident.clone()))),
        )?;
        self.blocks.push(Arc::new(BlockImpl {
            name: ident.as_str().to_string(),
            owner: self.id,
            position,
            snippet: ident.is_snippet(),
            dynamic: false,
            body,
        }));

        let scope = if kind == BlockKind::Snippet {
            ArgScope::Template
        } else {
            ArgScope::Locals
        };
        let call = BlockCall::at_site(
            BlockName::Static(ident.clone()),
            scope,
            head.modifiers.clone(),
        );

        let site = match kind {
            BlockKind::Snippet => {
                let tag = tokens
                    .fetch_word()
                    .map(|w| w.text.trim_matches(|c| c == '<' || c == '>').to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| self.config.snippet_tag.clone());
                Some(Op::Snippet {
                    name: ident.snippet_name().unwrap_or_default().to_string(),
                    tag,
                    call,
                })
            }
            BlockKind::Define => None,
            BlockKind::Block if !top => Some(Op::Call(call)),
            BlockKind::Block => Some(Op::CallUnlessExtending(call)),
        };
        Ok(site.into_iter().collect())
    }

    /// `{include #block [,] [params]}`; without `#` another template is included
    fn resolve_include(&mut self, head: &DirectiveHead, span: &Span) -> Result<Op, CompileError> {
        let mut tokens = ArgTokenizer::new(&head.args);
        let word = tokens
            .fetch_word()
            .ok_or_else(|| CompileError::MissingDestination {
                directive: head.name.clone(),
                span: span.clone(),
            })?;

        if word.kind != WordKind::Bare || !word.text.starts_with('#') {
            return self.include_template(head, span, false);
        }

        let destination = word.text.trim_start_matches('#');
        let valid = match destination.strip_prefix('$') {
            Some(var) => super::name::is_identifier(var),
            None => super::name::is_identifier(destination),
        };
        if !valid {
            return Err(CompileError::InvalidIncludeName {
                name: destination.to_string(),
                span: span.clone(),
            });
        }

        let parent = destination == "parent";
        let name = if parent || destination == "this" {
            self.enclosing_block()
                .ok_or_else(|| CompileError::OutsideBlock {
                    reference: destination.to_string(),
                    span: span.clone(),
                })?
        } else if let Some(var) = destination.strip_prefix('$') {
            BlockName::Dynamic(super::expr::Expr::Variable(var.to_string()))
        } else {
            BlockName::Static(BlockIdent::new(destination).ok_or_else(|| {
                CompileError::InvalidIncludeName {
                    name: destination.to_string(),
                    span: span.clone(),
                }
            })?)
        };

        Ok(Op::Call(BlockCall {
            name,
            parent,
            args: tokens.fetch_args(),
            scope: ArgScope::Template,
            modifiers: head.modifiers.clone(),
        }))
    }

    /// Nearest named block enclosing the current position
    fn enclosing_block(&self) -> Option<BlockName> {
        self.scopes.iter().rev().flatten().next().cloned()
    }

    fn include_template(
        &mut self,
        head: &DirectiveHead,
        span: &Span,
        share_blocks: bool,
    ) -> Result<Op, CompileError> {
        let mut tokens = ArgTokenizer::new(&head.args);
        let target = tokens
            .fetch_word()
            .ok_or_else(|| CompileError::MissingDestination {
                directive: head.name.clone(),
                span: span.clone(),
            })?;
        Ok(Op::IncludeTemplate {
            target: target.to_expr(),
            args: tokens.fetch_args(),
            share_blocks,
            modifiers: head.modifiers.clone(),
        })
    }

    /// `{extends auto | none | $var | "file"}`
    fn declare_extends(&mut self, head: &DirectiveHead, span: &Span) -> Result<(), CompileError> {
        let mut tokens = ArgTokenizer::new(&head.args);
        let word = tokens
            .fetch_word()
            .ok_or_else(|| CompileError::MissingDestination {
                directive: head.name.clone(),
                span: span.clone(),
            })?;
        if self.depth > 0 {
            return Err(CompileError::MisplacedExtends {
                directive: head.name.clone(),
                span: span.clone(),
            });
        }
        if self.extends.is_some() {
            return Err(CompileError::MultipleExtends { span: span.clone() });
        }

        self.extends = Some(match (word.kind, word.text.as_str()) {
            (WordKind::Bare, "none") => ExtendsDecl::None,
            (WordKind::Bare, "auto") => ExtendsDecl::Auto,
            _ => ExtendsDecl::Target(word.to_expr()),
        });
        Ok(())
    }

    /// `{ifset #block, $var}...{/ifset}`
    fn ifset(&mut self, directive: &Directive) -> Result<Vec<Op>, CompileError> {
        let mut tokens = ArgTokenizer::new(&directive.head.args);
        let mut terms = Vec::new();
        while let Some(word) = tokens.fetch_word() {
            let term = match word.kind {
                WordKind::Variable => IfSetTerm::Variable(word.text),
                _ if word.text.starts_with('#') => {
                    IfSetTerm::Block(BlockName::declared(&word, ""))
                }
                _ => IfSetTerm::Variable(word.text.trim_start_matches('$').to_string()),
            };
            terms.push(term);
        }
        let body = self.compile_children(&directive.children, None)?;
        Ok(vec![Op::IfSet { terms, body }])
    }

    /// `{$var}` / `{=expr}`
    fn print(&self, head: &DirectiveHead) -> Option<Op> {
        let word = ArgTokenizer::new(&head.args).fetch_word()?;
        Some(Op::Print {
            expr: word.to_expr(),
            modifiers: head.modifiers.clone(),
            context: self.content_type,
        })
    }
}

/// Append an op, merging adjacent text
fn push_op(ops: &mut Vec<Op>, op: Op) {
    match (ops.last_mut(), op) {
        (Some(Op::Text(prev)), Op::Text(text)) => prev.push_str(&text),
        (_, op) => ops.push(op),
    }
}
