//! Link, control and content-type directives

use serde::Deserialize;

use super::error::CompileError;
use super::expr::Expr;
use super::ops::Op;
use super::tokenizer::{ArgTokenizer, WordKind};
use crate::parser::{DirectiveHead, Span};

/// Escaping context selected by `{contentType}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Html,
    Xml,
    Js,
    Css,
    Plain,
    None,
}

impl ContentType {
    /// Pick the context for a `{contentType ...}` argument
    pub fn select(args: &str) -> Self {
        if args.contains("html") {
            ContentType::Html
        } else if args.contains("xml") {
            ContentType::Xml
        } else if args.contains("javascript") {
            ContentType::Js
        } else if args.contains("css") {
            ContentType::Css
        } else if args.contains("plain") {
            ContentType::Plain
        } else {
            ContentType::None
        }
    }
}

/// `{contentType ...}`: returns the new context and, for MIME arguments, the type itself
pub fn content_type(head: &DirectiveHead) -> (ContentType, Option<String>) {
    let context = ContentType::select(&head.args);
    let mime = head
        .args
        .contains('/')
        .then(|| ArgTokenizer::new(&head.args).fetch_word())
        .flatten()
        .map(|w| w.text);
    (context, mime)
}

/// `{link destination [,] [params]}` and `{plink ...}`
pub fn link(head: &DirectiveHead, span: &Span, context: ContentType) -> Result<Op, CompileError> {
    let mut tokens = ArgTokenizer::new(&head.args);
    let destination = tokens
        .fetch_word()
        .ok_or_else(|| CompileError::MissingDestination {
            directive: head.name.clone(),
            span: span.clone(),
        })?;
    Ok(Op::Link {
        destination: destination.to_expr(),
        args: tokens.fetch_args(),
        presenter: head.name == "plink",
        context,
    })
}

/// `{control name[:method] [params]}`
pub fn control(head: &DirectiveHead, span: &Span) -> Result<Op, CompileError> {
    let mut tokens = ArgTokenizer::new(&head.args);
    let word = tokens
        .fetch_word()
        .ok_or_else(|| CompileError::MissingControlName {
            directive: head.name.clone(),
            span: span.clone(),
        })?;

    let (name, method) = match word.text.split_once(':') {
        Some((name, method)) => (name.to_string(), Some(method)),
        None => (word.text.clone(), None),
    };
    let name = match word.kind {
        WordKind::Variable => Expr::Variable(name),
        WordKind::DoubleQuoted => Expr::interpolated(&name),
        WordKind::Bare | WordKind::SingleQuoted => Expr::Literal(name),
    };
    let method = method
        .filter(|m| !m.is_empty())
        .map(|m| {
            let mut chars = m.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        });

    Ok(Op::Control {
        name,
        method,
        args: tokens.fetch_args(),
    })
}
