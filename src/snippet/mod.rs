//! Partial updates driven by component invalidation
//!
//! Components flag snippets as stale; a render with a partial request skips
//! full output and collects the re-rendered snippets into a [`Payload`]
//! keyed by snippet id.

mod component;
mod payload;
mod sweep;

pub use component::{Component, ComponentNode, InvalidLink, DEFAULT_SNIPPET_PREFIX};
pub use payload::Payload;
