//! Template execution: rendering, output buffering, filters and escaping

mod buffer;
mod error;
mod escape;
mod filters;
pub(crate) mod renderer;

pub use buffer::{Disposition, OutputBuffer};
pub use error::RenderError;
pub use escape::{Escaper, HtmlEscaper};
pub use filters::{is_raw, Filter, FilterSet, NOESCAPE};
