//! Component collaborator: the live UI tree a render is driven by

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::compiler::Params;

/// Snippet id prefix used by [`ComponentNode`] unless configured otherwise
pub const DEFAULT_SNIPPET_PREFIX: &str = "snippet";

/// A link destination the component could not resolve
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid link '{destination}': {reason}")]
pub struct InvalidLink {
    pub destination: String,
    pub reason: String,
}

/// Narrow view of a host component used by templates and the snippet sweep
///
/// State is read and updated through `&self`: the host owns the tree and the
/// renderer never copies or takes ownership of it.
pub trait Component {
    /// Stable identity, unique within the tree; empty for the root
    fn unique_id(&self) -> &str;

    /// With `None`: whether anything in or below this component needs a
    /// redraw. With a snippet name: whether that snippet of this component does.
    fn is_invalid(&self, snippet: Option<&str>) -> bool;

    /// Client-side id of one of this component's snippets
    fn snippet_id(&self, snippet: &str) -> String;

    fn components(&self, recursive: bool) -> Vec<&dyn Component>;

    fn component(&self, name: &str) -> Option<&dyn Component>;

    /// Template rendered for `method` (`None` is the default render)
    fn template(&self, method: Option<&str>) -> Option<String>;

    /// Parameters the component's own template is rendered with
    fn params(&self) -> Params {
        Params::new()
    }

    /// Mark a snippet (or with `None`, the whole component) as up to date
    fn validate(&self, _snippet: Option<&str>) {}

    fn link(&self, destination: &str, _params: &Params) -> Result<String, InvalidLink> {
        Err(InvalidLink {
            destination: destination.to_string(),
            reason: "component does not resolve links".to_string(),
        })
    }
}

/// In-memory component tree node
#[derive(Debug, Clone)]
pub struct ComponentNode {
    name: String,
    unique_id: String,
    snippet_prefix: String,
    templates: BTreeMap<String, String>,
    params: Params,
    links: BTreeMap<String, String>,
    children: Vec<ComponentNode>,
    invalid_all: Cell<bool>,
    invalid_snippets: RefCell<BTreeSet<String>>,
    validated: RefCell<BTreeSet<String>>,
}

impl ComponentNode {
    /// Root of a tree (the presenter)
    pub fn root() -> Self {
        Self::new("")
    }

    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            unique_id: name.clone(),
            name,
            snippet_prefix: DEFAULT_SNIPPET_PREFIX.to_string(),
            templates: BTreeMap::new(),
            params: Params::new(),
            links: BTreeMap::new(),
            children: Vec::new(),
            invalid_all: Cell::new(false),
            invalid_snippets: RefCell::new(BTreeSet::new()),
            validated: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template for the default render
    pub fn with_template(self, template: impl Into<String>) -> Self {
        self.with_method_template("", template)
    }

    /// Template for `{control name:method}`
    pub fn with_method_template(mut self, method: &str, template: impl Into<String>) -> Self {
        self.templates.insert(method.to_string(), template.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_link(mut self, destination: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.insert(destination.into(), url.into());
        self
    }

    pub fn with_snippet_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.snippet_prefix = prefix.into();
        let (id, prefix) = (self.unique_id.clone(), self.snippet_prefix.clone());
        for child in &mut self.children {
            child.attach(&id, &prefix);
        }
        self
    }

    /// Attach a child; its id is derived from this node's id and its name
    pub fn with_child(mut self, mut child: ComponentNode) -> Self {
        child.attach(&self.unique_id, &self.snippet_prefix);
        self.children.push(child);
        self
    }

    fn attach(&mut self, parent_id: &str, prefix: &str) {
        self.unique_id = if parent_id.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", parent_id, self.name)
        };
        self.snippet_prefix = prefix.to_string();
        let id = self.unique_id.clone();
        for child in &mut self.children {
            child.attach(&id, prefix);
        }
    }

    pub fn child(&self, name: &str) -> Option<&ComponentNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Find a descendant by a `-` separated path of names
    pub fn find(&self, path: &str) -> Option<&ComponentNode> {
        path.split('-')
            .try_fold(self, |node, name| node.child(name))
    }

    /// Mark a snippet (or with `None`, the whole component) for redraw
    pub fn invalidate(&self, snippet: Option<&str>) {
        match snippet {
            Some(name) => {
                self.validated.borrow_mut().remove(name);
                self.invalid_snippets.borrow_mut().insert(name.to_string());
            }
            None => {
                self.validated.borrow_mut().clear();
                self.invalid_all.set(true);
            }
        }
    }
}

impl Component for ComponentNode {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn is_invalid(&self, snippet: Option<&str>) -> bool {
        match snippet {
            Some(name) => {
                (self.invalid_all.get() && !self.validated.borrow().contains(name))
                    || self.invalid_snippets.borrow().contains(name)
            }
            None => {
                self.invalid_all.get()
                    || !self.invalid_snippets.borrow().is_empty()
                    || self.children.iter().any(|c| c.is_invalid(None))
            }
        }
    }

    fn snippet_id(&self, snippet: &str) -> String {
        if self.unique_id.is_empty() {
            format!("{}-{}", self.snippet_prefix, snippet)
        } else {
            format!("{}-{}-{}", self.snippet_prefix, self.unique_id, snippet)
        }
    }

    fn components(&self, recursive: bool) -> Vec<&dyn Component> {
        let mut found: Vec<&dyn Component> = Vec::new();
        for child in &self.children {
            found.push(child);
            if recursive {
                found.extend(child.components(true));
            }
        }
        found
    }

    fn component(&self, name: &str) -> Option<&dyn Component> {
        self.child(name).map(|c| c as &dyn Component)
    }

    fn template(&self, method: Option<&str>) -> Option<String> {
        self.templates.get(method.unwrap_or("")).cloned()
    }

    fn params(&self) -> Params {
        self.params.clone()
    }

    fn validate(&self, snippet: Option<&str>) {
        match snippet {
            Some(name) => {
                self.invalid_snippets.borrow_mut().remove(name);
                self.validated.borrow_mut().insert(name.to_string());
            }
            None => {
                self.invalid_all.set(false);
                self.invalid_snippets.borrow_mut().clear();
                self.validated.borrow_mut().clear();
            }
        }
    }

    fn link(&self, destination: &str, params: &Params) -> Result<String, InvalidLink> {
        let url = self.links.get(destination).ok_or_else(|| InvalidLink {
            destination: destination.to_string(),
            reason: format!("no route in '{}'", self.name),
        })?;
        if params.is_empty() {
            return Ok(url.clone());
        }
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(format!("{}?{}", url, query))
    }
}
