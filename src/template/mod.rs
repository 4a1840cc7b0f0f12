//! Compiled templates and their render-time block storage
//!
//! A [`TemplateUnit`] is what the compiler produces. At render time each
//! extends chain shares one [`BlockRegistry`], which maps block names to
//! override stacks, and every unit in the chain goes through an
//! [`InheritanceResolver`] that picks how its body is rendered.

mod registry;
mod resolver;
mod unit;

pub use registry::{BlockRegistry, BlockStack, Dispatch, Lookup};
pub use resolver::{select_strategy, InheritanceResolver, Strategy, UnitState};
pub use unit::{BlockImpl, ExtendsDecl, TemplateUnit, UnitId};
