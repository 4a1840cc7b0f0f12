//! Compile-time errors for template directives

use thiserror::Error;

use crate::parser::Span;

/// Errors that make a template unit fail to compile
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// Static block declared twice in one template
    #[error("cannot redeclare static block '{name}'")]
    DuplicateBlock { name: String, span: Span },

    /// Block or snippet directive without a usable name
    #[error("missing block name in {{{directive}}}")]
    MissingBlockName { directive: String, span: Span },

    /// Included block name does not follow the identifier grammar
    #[error("included block name must be alphanumeric string, '{name}' given")]
    InvalidIncludeName { name: String, span: Span },

    /// `#parent` / `#this` with no enclosing named block
    #[error("cannot include {reference} block outside of any block")]
    OutsideBlock { reference: String, span: Span },

    /// Directive requires a destination argument
    #[error("missing destination in {{{directive}}}")]
    MissingDestination { directive: String, span: Span },

    /// `{extends}` nested inside another directive
    #[error("{{{directive}}} must be placed outside any directive")]
    MisplacedExtends { directive: String, span: Span },

    /// Second `{extends}` in one template
    #[error("multiple {{extends}} declarations are not allowed")]
    MultipleExtends { span: Span },

    /// `{control}` without a component name
    #[error("missing control name in {{{directive}}}")]
    MissingControlName { directive: String, span: Span },

    /// Directive name not known to the compiler
    #[error("unknown directive {{{name}}}")]
    UnknownDirective { name: String, span: Span },

    /// Paired directive never closed
    #[error("missing {{/{name}}}")]
    Unterminated { name: String, span: Span },
}

impl CompileError {
    /// Source span of the offending directive
    pub fn span(&self) -> &Span {
        match self {
            Self::DuplicateBlock { span, .. }
            | Self::MissingBlockName { span, .. }
            | Self::InvalidIncludeName { span, .. }
            | Self::OutsideBlock { span, .. }
            | Self::MissingDestination { span, .. }
            | Self::MisplacedExtends { span, .. }
            | Self::MultipleExtends { span }
            | Self::MissingControlName { span, .. }
            | Self::UnknownDirective { span, .. }
            | Self::Unterminated { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let message = self.to_string();
        crate::error::render_report(source, filename, self.span(), &message, &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = CompileError::DuplicateBlock {
            name: "content".to_string(),
            span: 0..15,
        };
        assert_eq!(err.to_string(), "cannot redeclare static block 'content'");
    }

    #[test]
    fn test_directive_names_in_messages() {
        let err = CompileError::MissingDestination {
            directive: "extends".to_string(),
            span: 0..9,
        };
        assert_eq!(err.to_string(), "missing destination in {extends}");

        let err = CompileError::Unterminated {
            name: "snippet".to_string(),
            span: 0..9,
        };
        assert_eq!(err.to_string(), "missing {/snippet}");
    }

    #[test]
    fn test_span_accessor() {
        let err = CompileError::MultipleExtends { span: 4..20 };
        assert_eq!(err.span(), &(4..20));
    }
}
