//! Snippet Layout - template block inheritance with partial snippet updates
//!
//! Templates declare named blocks that descendant templates override along an
//! `{extends}` chain. Blocks tagged as snippets can be re-rendered on their own
//! when the component that owns them is invalidated, producing a payload of
//! fresh fragments keyed by snippet id instead of a full page.
//!
//! # Example
//!
//! ```rust
//! use snippet_layout::render;
//!
//! let html = render("{block title}Hello{/block}").unwrap();
//! assert_eq!(html, "Hello");
//! ```

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod parser;
pub mod runtime;
pub mod snippet;
pub mod template;

pub use compiler::{CompileError, ContentType, Params};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, RenderRequest, Rendered};
pub use error::ParseError;
pub use loader::{FileLoader, LoadError, MemoryLoader, TemplateLoader};
pub use parser::{parse, Document};
pub use runtime::RenderError;
pub use snippet::{Component, ComponentNode, Payload};

use thiserror::Error;

/// Errors of the convenience entry points
#[derive(Debug, Error)]
pub enum Error {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Error::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Name under which the convenience entry points register their source
const INLINE_TEMPLATE: &str = "inline";

/// Render a single template source with no parameters
///
/// # Example
///
/// ```rust
/// use snippet_layout::render;
///
/// let html = render("{define item}<li>{$label}</li>{/define}<ul>{include #item, label => a}</ul>").unwrap();
/// assert_eq!(html, "<ul><li>a</li></ul>");
/// ```
pub fn render(source: &str) -> Result<String, Error> {
    render_with_params(source, Params::new())
}

/// Render a single template source with parameters
///
/// # Example
///
/// ```rust
/// use snippet_layout::{render_with_params, Params};
///
/// let params = Params::from([("name".to_string(), "<world>".to_string())]);
/// let html = render_with_params("Hello {$name|upper}", params).unwrap();
/// assert_eq!(html, "Hello &lt;WORLD&gt;");
/// ```
pub fn render_with_params(source: &str, params: Params) -> Result<String, Error> {
    let engine = Engine::new(MemoryLoader::new().with_template(INLINE_TEMPLATE, source));
    let root = ComponentNode::root();
    let rendered = engine.render(
        INLINE_TEMPLATE,
        RenderRequest::new(&root).with_params(params),
    )?;
    Ok(rendered.output)
}

/// Parse and compile a source without rendering it
pub fn check(source: &str) -> Result<template::TemplateUnit, Error> {
    let document = parse(source)?;
    let config = EngineConfig::default();
    Ok(compiler::compile(
        INLINE_TEMPLATE,
        template::UnitId(0),
        &document,
        &config,
    )?)
}
