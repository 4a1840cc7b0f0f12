//! Render-time errors

use thiserror::Error;

use crate::compiler::CompileError;
use crate::error::ParseError;
use crate::loader::LoadError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Dispatch of a name with no registered implementation
    #[error("cannot include undefined block '{name}'")]
    MissingBlock { name: String },

    /// Parent dispatch past the oldest implementation
    #[error("cannot include undefined parent block '{name}'")]
    MissingParentBlock { name: String },

    #[error("undefined variable ${name}")]
    UndefinedVariable { name: String },

    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },

    /// `{control}` names a component the current control does not have
    #[error("component '{name}' does not exist")]
    MissingControl { name: String },

    /// Component asked to render without a template
    #[error("component '{component}' has no template")]
    MissingTemplate { component: String },

    #[error("maximum render depth exceeded")]
    RecursionLimit,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("syntax errors in template '{name}': {}", format_parse_errors(.errors))]
    Parse { name: String, errors: Vec<ParseError> },

    #[error("cannot compile template '{name}': {source}")]
    Compile { name: String, source: CompileError },
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
