//! Template compiler
//!
//! Turns the directive tree produced by [`crate::parser`] into a
//! [`TemplateUnit`]: block implementations lifted out of the body, plus a
//! flat list of operations for the renderer.

mod blocks;
mod error;
pub mod expr;
mod name;
mod ops;
mod tokenizer;
mod translators;

pub use blocks::{BlockKind, Compiler};
pub use error::CompileError;
pub use expr::{eval_args, merge_params, Arg, Expr, Params, Segment};
pub use name::{is_identifier, BlockIdent, BlockName, SNIPPET_MARKER};
pub use ops::{ArgScope, BlockCall, IfSetTerm, Op};
pub use translators::ContentType;

use crate::config::EngineConfig;
use crate::parser::Document;
use crate::template::{TemplateUnit, UnitId};

/// Compile a parsed document into a template unit
pub fn compile(
    name: &str,
    id: UnitId,
    document: &Document,
    config: &EngineConfig,
) -> Result<TemplateUnit, CompileError> {
    Compiler::new(name, id, config).compile(document)
}
