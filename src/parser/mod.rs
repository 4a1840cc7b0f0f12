//! Reference front end turning template source into a directive tree
//!
//! The compiler only depends on the [`Document`] tree; any other front end
//! producing the same shape can be used instead.

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
