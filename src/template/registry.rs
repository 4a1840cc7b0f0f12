//! Block registry: per-render storage of block override stacks

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::unit::{BlockImpl, TemplateUnit, UnitId};
use crate::compiler::SNIPPET_MARKER;
use crate::runtime::RenderError;

/// Implementations sharing one block name, most-derived first
#[derive(Debug, Default)]
pub struct BlockStack {
    entries: Vec<Arc<BlockImpl>>,
    /// Entry currently executing, if a call into this stack is active
    cursor: Option<usize>,
}

impl BlockStack {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry at or after `from`, skipping dynamic entries when `statics_only`
    fn next_from(&self, from: usize, statics_only: bool) -> Option<usize> {
        (from..self.entries.len()).find(|&i| !(statics_only && self.entries[i].dynamic))
    }
}

/// An active call into a block stack
///
/// Hand it back to [`BlockRegistry::leave`] once the body has run so the
/// stack's cursor returns to the caller's position.
#[derive(Debug)]
#[must_use]
pub struct Dispatch {
    pub block: Arc<BlockImpl>,
    name: String,
    previous: Option<usize>,
}

/// Where in a stack a call starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Most-derived implementation of any kind
    Front,
    /// Most-derived statically declared implementation
    Static,
    /// Implementation after the one currently executing
    Parent,
}

/// Block stacks for one template chain
#[derive(Debug, Default)]
pub struct BlockRegistry {
    stacks: HashMap<String, BlockStack>,
    /// Static names in order of first registration
    static_order: Vec<String>,
    registered: HashSet<UnitId>,
    dynamic_sites: HashSet<(UnitId, usize, String)>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every static block of `unit`; a unit already registered is skipped
    pub fn register_unit(&mut self, unit: &TemplateUnit) -> bool {
        if !self.registered.insert(unit.id) {
            log::trace!("unit '{}' ({}) already registered", unit.name, unit.id);
            return false;
        }
        for block in &unit.blocks {
            self.push(block.name.clone(), Arc::clone(block));
        }
        log::trace!(
            "registered {} blocks of '{}' ({})",
            unit.blocks.len(),
            unit.name,
            unit.id
        );
        true
    }

    /// Register a dynamically named block under its evaluated name
    ///
    /// Guarded per declaration site and name, so re-executing the same site
    /// with the same value never stacks a second copy.
    pub fn register_dynamic(
        &mut self,
        owner: UnitId,
        site: usize,
        name: &str,
        block: Arc<BlockImpl>,
    ) -> bool {
        if !self
            .dynamic_sites
            .insert((owner, site, name.to_string()))
        {
            return false;
        }
        let stack = self.stacks.entry(name.to_string()).or_default();
        stack.entries.push(block);
        log::trace!("registered dynamic block '{}' from {}", name, owner);
        true
    }

    fn push(&mut self, name: String, block: Arc<BlockImpl>) {
        if !self.static_order.contains(&name) {
            self.static_order.push(name.clone());
        }
        self.stacks.entry(name).or_default().entries.push(block);
    }

    pub fn enter_with(&mut self, name: &str, lookup: Lookup) -> Result<Dispatch, RenderError> {
        match lookup {
            Lookup::Front => self.enter(name),
            Lookup::Static => self.enter_static(name),
            Lookup::Parent => self.enter_parent(name),
        }
    }

    /// Start a call of the most-derived implementation of `name`
    pub fn enter(&mut self, name: &str) -> Result<Dispatch, RenderError> {
        self.enter_front(name, false)
    }

    /// Like [`enter`](Self::enter), but dynamically named definitions that
    /// landed on the same stack are passed over
    pub fn enter_static(&mut self, name: &str) -> Result<Dispatch, RenderError> {
        self.enter_front(name, true)
    }

    fn enter_front(&mut self, name: &str, statics_only: bool) -> Result<Dispatch, RenderError> {
        let missing = || RenderError::MissingBlock {
            name: name.to_string(),
        };
        let stack = self.stacks.get_mut(name).ok_or_else(missing)?;
        let index = stack.next_from(0, statics_only).ok_or_else(missing)?;
        let previous = stack.cursor.replace(index);
        Ok(Dispatch {
            block: Arc::clone(&stack.entries[index]),
            name: name.to_string(),
            previous,
        })
    }

    /// Start a call of the implementation after the one currently executing
    ///
    /// A static implementation's parent is the next static one.
    pub fn enter_parent(&mut self, name: &str) -> Result<Dispatch, RenderError> {
        let missing = || RenderError::MissingParentBlock {
            name: name.to_string(),
        };
        let stack = self.stacks.get_mut(name).ok_or_else(missing)?;
        let statics_only = match stack.cursor {
            Some(c) => !stack.entries[c].dynamic,
            None => true,
        };
        let from = stack.cursor.map_or(1, |c| c + 1);
        let next = stack.next_from(from, statics_only).ok_or_else(missing)?;
        let previous = stack.cursor.replace(next);
        Ok(Dispatch {
            block: Arc::clone(&stack.entries[next]),
            name: name.to_string(),
            previous,
        })
    }

    /// Finish a call started by [`enter`](Self::enter) or [`enter_parent`](Self::enter_parent)
    pub fn leave(&mut self, dispatch: Dispatch) {
        if let Some(stack) = self.stacks.get_mut(&dispatch.name) {
            stack.cursor = dispatch.previous;
        }
    }

    /// Whether `name` has at least one implementation
    pub fn contains(&self, name: &str) -> bool {
        self.stacks.get(name).is_some_and(|s| !s.is_empty())
    }

    pub fn stack(&self, name: &str) -> Option<&BlockStack> {
        self.stacks.get(name)
    }

    /// Statically registered snippet block names, in registration order
    pub fn snippet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.static_order
            .iter()
            .map(String::as_str)
            .filter(|n| n.starts_with(SNIPPET_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{ContentType, Op};
    use crate::template::ExtendsDecl;

    fn block(name: &str, owner: u64, text: &str) -> Arc<BlockImpl> {
        Arc::new(BlockImpl {
            name: name.to_string(),
            owner: UnitId(owner),
            position: 0,
            snippet: name.starts_with(SNIPPET_MARKER),
            dynamic: false,
            body: vec![Op::Text(text.to_string())],
        })
    }

    fn unit(id: u64, blocks: Vec<Arc<BlockImpl>>) -> TemplateUnit {
        TemplateUnit {
            name: format!("unit{}", id),
            id: UnitId(id),
            extends: ExtendsDecl::Undeclared,
            blocks,
            body: Vec::new(),
            content_type: ContentType::Html,
            mime: None,
        }
    }

    fn body_text(dispatch: &Dispatch) -> &str {
        match &dispatch.block.body[0] {
            Op::Text(t) => t,
            other => panic!("Expected text, got {:?}", other),
        }
    }

    /// A extends B extends C; A registers first because it runs first
    fn chain() -> BlockRegistry {
        let mut registry = BlockRegistry::new();
        registry.register_unit(&unit(1, vec![block("x", 1, "A")]));
        registry.register_unit(&unit(2, vec![block("x", 2, "B")]));
        registry.register_unit(&unit(3, vec![block("x", 3, "C")]));
        registry
    }

    #[test]
    fn test_override_order() {
        let mut registry = chain();

        let a = registry.enter("x").unwrap();
        assert_eq!(body_text(&a), "A");
        let b = registry.enter_parent("x").unwrap();
        assert_eq!(body_text(&b), "B");
        let c = registry.enter_parent("x").unwrap();
        assert_eq!(body_text(&c), "C");
        assert!(matches!(
            registry.enter_parent("x"),
            Err(RenderError::MissingParentBlock { name }) if name == "x"
        ));

        registry.leave(c);
        registry.leave(b);
        registry.leave(a);
    }

    #[test]
    fn test_parent_cursor_restored_after_call() {
        let mut registry = chain();
        let a = registry.enter("x").unwrap();

        let first = registry.enter_parent("x").unwrap();
        registry.leave(first);
        let second = registry.enter_parent("x").unwrap();
        assert_eq!(body_text(&second), "B");
        registry.leave(second);
        registry.leave(a);

        // an independent pass starts again from the front
        let again = registry.enter("x").unwrap();
        assert_eq!(body_text(&again), "A");
        registry.leave(again);
    }

    #[test]
    fn test_missing_block() {
        let mut registry = BlockRegistry::new();
        assert!(matches!(
            registry.enter("nope"),
            Err(RenderError::MissingBlock { name }) if name == "nope"
        ));
    }

    #[test]
    fn test_unit_registered_once() {
        let mut registry = BlockRegistry::new();
        let u = unit(7, vec![block("x", 7, "A")]);
        assert!(registry.register_unit(&u));
        assert!(!registry.register_unit(&u));
        assert_eq!(registry.stack("x").map(BlockStack::len), Some(1));
    }

    #[test]
    fn test_dynamic_registration_guard() {
        let mut registry = BlockRegistry::new();
        let b = block("$name", 1, "D");
        assert!(registry.register_dynamic(UnitId(1), 0, "item", Arc::clone(&b)));
        assert!(!registry.register_dynamic(UnitId(1), 0, "item", Arc::clone(&b)));
        assert!(registry.register_dynamic(UnitId(1), 0, "other", b));
        assert!(registry.contains("item"));
        assert_eq!(registry.stack("item").map(BlockStack::len), Some(1));
    }

    #[test]
    fn test_snippet_names_are_static_only() {
        let mut registry = BlockRegistry::new();
        registry.register_unit(&unit(
            1,
            vec![block("_header", 1, "h"), block("title", 1, "t")],
        ));
        registry.register_dynamic(UnitId(1), 0, "_dyn", block("_dyn", 1, "d"));
        registry.register_unit(&unit(2, vec![block("_footer", 2, "f"), block("_header", 2, "H")]));

        let names: Vec<&str> = registry.snippet_names().collect();
        assert_eq!(names, vec!["_header", "_footer"]);
        assert_eq!(registry.stack("_header").map(BlockStack::len), Some(2));
    }

    fn dynamic(name: &str, owner: u64, text: &str) -> Arc<BlockImpl> {
        let mut b = (*block(name, owner, text)).clone();
        b.snippet = false;
        b.dynamic = true;
        Arc::new(b)
    }

    #[test]
    fn test_static_entry_skips_colliding_dynamic_block() {
        let mut registry = BlockRegistry::new();
        registry.register_dynamic(UnitId(1), 0, "_content", dynamic("\"_$n\"", 1, "DYN"));
        registry.register_unit(&unit(2, vec![block("_content", 2, "L")]));

        let front = registry.enter("_content").unwrap();
        assert_eq!(body_text(&front), "DYN");
        registry.leave(front);

        let static_front = registry.enter_static("_content").unwrap();
        assert_eq!(body_text(&static_front), "L");
        assert!(matches!(
            registry.enter_parent("_content"),
            Err(RenderError::MissingParentBlock { .. })
        ));
        registry.leave(static_front);
    }

    #[test]
    fn test_static_entry_missing_when_only_dynamic() {
        let mut registry = BlockRegistry::new();
        registry.register_dynamic(UnitId(1), 0, "item", dynamic("$name", 1, "D"));
        assert!(registry.enter("item").is_ok());
        assert!(matches!(
            registry.enter_static("item"),
            Err(RenderError::MissingBlock { name }) if name == "item"
        ));
    }
}
