//! Template engine: loading, compile cache and render entry point

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::compiler::{self, Params};
use crate::config::EngineConfig;
use crate::loader::TemplateLoader;
use crate::parser;
use crate::runtime::renderer::{Frame, Renderer};
use crate::runtime::{Escaper, FilterSet, HtmlEscaper, RenderError};
use crate::snippet::{Component, Payload};
use crate::template::{TemplateUnit, UnitId};

/// Compiled units keyed by template name
#[derive(Debug, Default)]
struct TemplateCache {
    units: HashMap<String, Arc<TemplateUnit>>,
    next_id: u64,
}

/// Parameters of one render pass
pub struct RenderRequest<'a> {
    control: &'a dyn Component,
    presenter: Option<&'a dyn Component>,
    params: Params,
    partial: bool,
    layout: Option<String>,
    extends: Option<String>,
}

impl<'a> RenderRequest<'a> {
    /// Render with `control` as the current component (and presenter)
    pub fn new(control: &'a dyn Component) -> Self {
        Self {
            control,
            presenter: None,
            params: Params::new(),
            partial: false,
            layout: None,
            extends: None,
        }
    }

    /// Component `{plink}` resolves against
    pub fn with_presenter(mut self, presenter: &'a dyn Component) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Request a partial update: invalid snippets go to the payload
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Layout used by `{extends auto}`
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Ancestor for a template that does not declare `{extends}`
    pub fn with_extends(mut self, extends: impl Into<String>) -> Self {
        self.extends = Some(extends.into());
        self
    }
}

/// Result of one render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Full output; empty when the whole pass was a snippet sweep
    pub output: String,
    pub payload: Payload,
}

/// Shareable template engine
pub struct Engine {
    loader: Box<dyn TemplateLoader>,
    config: EngineConfig,
    filters: FilterSet,
    escaper: Box<dyn Escaper>,
    cache: Mutex<TemplateCache>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(loader: impl TemplateLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            config: EngineConfig::default(),
            filters: FilterSet::default(),
            escaper: Box::new(HtmlEscaper),
            cache: Mutex::new(TemplateCache::default()),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a custom filter usable as `|name:args`
    pub fn with_filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&str, &[String]) -> String + Send + Sync + 'static,
    {
        self.filters.register(name, filter);
        self
    }

    pub fn with_escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.escaper = Box::new(escaper);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn escaper(&self) -> &dyn Escaper {
        self.escaper.as_ref()
    }

    /// Load and compile a template, reusing the cached unit when present
    pub fn load(&self, name: &str) -> Result<Arc<TemplateUnit>, RenderError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(unit) = cache.units.get(name) {
            log::trace!("template cache hit for '{}'", name);
            return Ok(Arc::clone(unit));
        }

        let source = self.loader.load(name)?;
        cache.next_id += 1;
        let unit = Arc::new(self.compile_with_id(name, &source, UnitId(cache.next_id))?);
        log::debug!("cached template '{}' as {}", name, unit.id);
        cache.units.insert(name.to_string(), Arc::clone(&unit));
        Ok(unit)
    }

    /// Compile source text without caching it
    pub fn compile(&self, name: &str, source: &str) -> Result<TemplateUnit, RenderError> {
        let id = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.next_id += 1;
            UnitId(cache.next_id)
        };
        self.compile_with_id(name, source, id)
    }

    fn compile_with_id(
        &self,
        name: &str,
        source: &str,
        id: UnitId,
    ) -> Result<TemplateUnit, RenderError> {
        let document = parser::parse(source).map_err(|errors| RenderError::Parse {
            name: name.to_string(),
            errors,
        })?;
        compiler::compile(name, id, &document, &self.config).map_err(|source| {
            RenderError::Compile {
                name: name.to_string(),
                source,
            }
        })
    }

    /// Drop every cached unit
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.units.clear();
    }

    /// Render template `name`
    ///
    /// With a partial request and an invalid control, full output is replaced
    /// by the snippet sweep and the result carries the payload instead.
    pub fn render(&self, name: &str, request: RenderRequest<'_>) -> Result<Rendered, RenderError> {
        let unit = self.load(name)?;
        let presenter = request.presenter.unwrap_or(request.control);
        let params = compiler::merge_params(request.params, &request.control.params());

        let mut renderer = Renderer::new(self, presenter, request.partial, request.layout);
        let mut frame = Frame::new(request.control).with_extends(request.extends);
        let mut output = String::new();
        renderer.render_unit(&mut frame, unit, &params, &mut output)?;

        Ok(Rendered {
            output,
            payload: renderer.into_payload(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::snippet::ComponentNode;

    #[test]
    fn test_units_are_cached() {
        let engine = Engine::new(MemoryLoader::new().with_template("a", "A"));
        let first = engine.load("a").unwrap();
        let second = engine.load("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        engine.clear_cache();
        let third = engine.load("a").unwrap();
        assert_ne!(first.id, third.id);
    }

    #[test]
    fn test_compile_errors_carry_template_name() {
        let engine = Engine::new(MemoryLoader::new().with_template("bad", "{extends}"));
        let root = ComponentNode::root();
        let err = engine.render("bad", RenderRequest::new(&root)).unwrap_err();
        assert!(matches!(err, RenderError::Compile { name, .. } if name == "bad"));
    }

    #[test]
    fn test_request_params_override_component_params() {
        let engine = Engine::new(MemoryLoader::new().with_template("hi", "{$greeting} {$name}"));
        let root = ComponentNode::root()
            .with_param("greeting", "Hello")
            .with_param("name", "nobody");
        let rendered = engine
            .render("hi", RenderRequest::new(&root).with_param("name", "world"))
            .unwrap();
        assert_eq!(rendered.output, "Hello world");
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Engine>();
    }
}
