//! Executes compiled templates
//!
//! A [`Renderer`] lives for one render pass. Every extends chain runs inside a
//! [`Frame`] owning its block registry; `{include "file"}`, `{control}` and
//! child components of the snippet sweep start fresh frames, while the
//! ancestors of a unit and `{includeblock}` share the frame they were reached from.

use std::sync::Arc;

use super::buffer::{Disposition, OutputBuffer};
use super::error::RenderError;
use super::filters::is_raw;
use crate::compiler::{
    eval_args, merge_params, ArgScope, BlockCall, BlockName, ContentType, IfSetTerm, Op, Params,
};
use crate::engine::Engine;
use crate::parser::Modifier;
use crate::snippet::{Component, Payload};
use crate::template::{
    BlockRegistry, ExtendsDecl, InheritanceResolver, Lookup, Strategy, TemplateUnit,
};

/// Render state of one extends chain
pub(crate) struct Frame<'r> {
    pub control: &'r dyn Component,
    pub registry: BlockRegistry,
    /// The unit whose body is executing delegates to an ancestor
    pub extending: bool,
    /// Whether this frame may hand its unit over to the snippet sweep
    sweepable: bool,
    /// Caller-supplied ancestor for a unit without `{extends}`
    extends_override: Option<String>,
}

impl<'r> Frame<'r> {
    pub fn new(control: &'r dyn Component) -> Self {
        Self {
            control,
            registry: BlockRegistry::new(),
            extending: false,
            sweepable: true,
            extends_override: None,
        }
    }

    pub fn with_extends(mut self, extends: Option<String>) -> Self {
        self.extends_override = extends;
        self
    }

    fn included(control: &'r dyn Component) -> Self {
        Self {
            sweepable: false,
            ..Self::new(control)
        }
    }
}

/// Variables visible to the ops being executed
#[derive(Clone, Copy)]
pub(crate) struct Scope<'s> {
    /// Locals of the current block (or the template parameters at top level)
    pub vars: &'s Params,
    /// Parameters the template was rendered with
    pub template: &'s Params,
}

pub(crate) struct Renderer<'r> {
    engine: &'r Engine,
    presenter: &'r dyn Component,
    partial: bool,
    layout: Option<String>,
    payload: Payload,
    depth: usize,
}

impl<'r> Renderer<'r> {
    pub fn new(
        engine: &'r Engine,
        presenter: &'r dyn Component,
        partial: bool,
        layout: Option<String>,
    ) -> Self {
        Self {
            engine,
            presenter,
            partial,
            layout,
            payload: Payload::new(),
            depth: 0,
        }
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    fn descend(&mut self) -> Result<(), RenderError> {
        if self.depth >= self.engine.config().max_depth {
            return Err(RenderError::RecursionLimit);
        }
        self.depth += 1;
        Ok(())
    }

    /// Render one unit: register its blocks, pick a strategy, carry it out
    pub fn render_unit(
        &mut self,
        frame: &mut Frame<'r>,
        unit: Arc<TemplateUnit>,
        params: &Params,
        out: &mut String,
    ) -> Result<(), RenderError> {
        self.descend()?;
        let enclosing = frame.extending;
        let result = self.run_unit(frame, &unit, params, out);
        frame.extending = enclosing;
        self.depth -= 1;
        result
    }

    fn run_unit(
        &mut self,
        frame: &mut Frame<'r>,
        unit: &TemplateUnit,
        params: &Params,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let mut resolver = InheritanceResolver::new(unit.name.as_str());
        resolver.begin();
        frame.registry.register_unit(unit);

        let ancestor = self.ancestor(frame, unit, params)?;
        let partial = self.partial && frame.sweepable && frame.control.is_invalid(None);
        let strategy = resolver.choose(ancestor, partial);

        let scope = Scope {
            vars: params,
            template: params,
        };
        match strategy {
            Strategy::InPlace => {
                frame.extending = false;
                self.exec(&unit.body, frame, scope, out)?;
            }
            Strategy::Ancestor(name) => {
                frame.extending = true;
                {
                    let mut buffer = OutputBuffer::discarding(out);
                    self.exec(&unit.body, frame, scope, buffer.out())?;
                }
                frame.extending = false;
                let parent = self.engine.load(&name)?;
                self.render_unit(frame, parent, params, out)?;
            }
            Strategy::Sweep => self.sweep(frame, scope)?,
        }
        resolver.finish();
        Ok(())
    }

    fn ancestor(
        &self,
        frame: &mut Frame<'r>,
        unit: &TemplateUnit,
        params: &Params,
    ) -> Result<Option<String>, RenderError> {
        let supplied = frame.extends_override.take();
        Ok(match &unit.extends {
            ExtendsDecl::Undeclared => supplied,
            ExtendsDecl::None => None,
            ExtendsDecl::Auto => self.layout.clone(),
            ExtendsDecl::Target(expr) => Some(expr.eval(params)?),
        })
    }

    /// Render a component's template with its own registry
    pub fn render_component(
        &mut self,
        component: &'r dyn Component,
        method: Option<&str>,
        params: &Params,
    ) -> Result<String, RenderError> {
        let name = component
            .template(method)
            .ok_or_else(|| RenderError::MissingTemplate {
                component: component.unique_id().to_string(),
            })?;
        let unit = self.engine.load(&name)?;
        let mut frame = Frame::new(component);
        let mut out = String::new();
        self.render_unit(&mut frame, unit, params, &mut out)?;
        Ok(out)
    }

    pub fn exec(
        &mut self,
        ops: &[Op],
        frame: &mut Frame<'r>,
        scope: Scope<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for op in ops {
            self.exec_op(op, frame, scope, out)?;
        }
        Ok(())
    }

    fn exec_op(
        &mut self,
        op: &Op,
        frame: &mut Frame<'r>,
        scope: Scope<'_>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        match op {
            Op::Text(text) => out.push_str(text),

            Op::Print {
                expr,
                modifiers,
                context,
            } => {
                let value = self.engine.filters().apply(modifiers, expr.eval(scope.vars)?)?;
                if is_raw(modifiers) {
                    out.push_str(&value);
                } else {
                    out.push_str(&self.engine.escaper().escape(*context, &value));
                }
            }

            Op::Call(call) => self.call_block(frame, scope, call, out)?,

            Op::CallUnlessExtending(call) => {
                if !frame.extending {
                    self.call_block(frame, scope, call, out)?;
                }
            }

            Op::Snippet { name, tag, call } => {
                if frame.extending {
                    return Ok(());
                }
                let id = frame.control.snippet_id(name);
                out.push_str(&format!(
                    "<{} id=\"{}\">",
                    tag,
                    self.engine.escaper().escape(ContentType::Html, &id)
                ));
                self.call_block(frame, scope, call, out)?;
                out.push_str(&format!("</{}>", tag));
            }

            Op::Capture { body, modifiers } => {
                let mut captured = String::new();
                self.exec(body, frame, scope, &mut captured)?;
                out.push_str(&self.engine.filters().apply(modifiers, captured)?);
            }

            Op::DefineDynamic {
                name,
                site,
                block,
                modifiers,
            } => {
                let name = name.eval(scope.vars)?;
                frame
                    .registry
                    .register_dynamic(block.owner, *site, &name, Arc::clone(block));
                self.dispatch(
                    frame,
                    scope,
                    &name,
                    Lookup::Front,
                    scope.vars.clone(),
                    modifiers,
                    out,
                )?;
            }

            Op::IfSet { terms, body } => {
                let mut holds = true;
                for term in terms {
                    holds &= match term {
                        IfSetTerm::Block(name) => {
                            frame.registry.contains(&resolve_name(name, scope)?)
                        }
                        IfSetTerm::Variable(var) => scope.vars.contains_key(var),
                    };
                }
                if holds {
                    self.exec(body, frame, scope, out)?;
                }
            }

            Op::Control { name, method, args } => {
                let name = name.eval(scope.vars)?;
                let control = frame.control;
                let child = control
                    .component(&name)
                    .ok_or_else(|| RenderError::MissingControl { name: name.clone() })?;
                child.validate(None);
                let params = merge_params(eval_args(args, scope.vars)?, &child.params());
                let html = self.render_component(child, method.as_deref(), &params)?;
                out.push_str(&html);
            }

            Op::Link {
                destination,
                args,
                presenter,
                context,
            } => {
                let destination = destination.eval(scope.vars)?;
                let params = eval_args(args, scope.vars)?;
                let target = if *presenter {
                    self.presenter
                } else {
                    frame.control
                };
                let url = match target.link(&destination, &params) {
                    Ok(url) => url,
                    Err(e) => {
                        log::warn!("{}", e);
                        self.engine.config().invalid_link.clone()
                    }
                };
                out.push_str(&self.engine.escaper().escape(*context, &url));
            }

            Op::IncludeTemplate {
                target,
                args,
                share_blocks,
                modifiers,
            } => {
                let name = target.eval(scope.vars)?;
                let params = merge_params(eval_args(args, scope.vars)?, scope.vars);
                let unit = self.engine.load(&name)?;
                let mut captured = String::new();
                if *share_blocks {
                    self.render_unit(frame, unit, &params, &mut captured)?;
                } else {
                    let mut included = Frame::included(frame.control);
                    self.render_unit(&mut included, unit, &params, &mut captured)?;
                }
                out.push_str(&self.engine.filters().apply(modifiers, captured)?);
            }
        }
        Ok(())
    }

    fn call_block(
        &mut self,
        frame: &mut Frame<'r>,
        scope: Scope<'_>,
        call: &BlockCall,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let name = resolve_name(&call.name, scope)?;
        let inherited = match call.scope {
            ArgScope::Locals => scope.vars,
            ArgScope::Template => scope.template,
        };
        let vars = merge_params(eval_args(&call.args, scope.vars)?, inherited);
        let lookup = if call.parent {
            Lookup::Parent
        } else if call.name.is_static() {
            Lookup::Static
        } else {
            Lookup::Front
        };
        self.dispatch(frame, scope, &name, lookup, vars, &call.modifiers, out)
    }

    /// Run the implementation of `name` that `lookup` selects
    ///
    /// A snippet block marks its snippet valid once its body has run, unless
    /// the output is being suppressed for an ancestor.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &mut self,
        frame: &mut Frame<'r>,
        scope: Scope<'_>,
        name: &str,
        lookup: Lookup,
        vars: Params,
        modifiers: &[Modifier],
        out: &mut String,
    ) -> Result<(), RenderError> {
        self.descend()?;
        let dispatch = match frame.registry.enter_with(name, lookup) {
            Ok(d) => d,
            Err(e) => {
                self.depth -= 1;
                return Err(e);
            }
        };
        let block = Arc::clone(&dispatch.block);

        let mut buffer = OutputBuffer::new(out, Disposition::Discard);
        let inner = Scope {
            vars: &vars,
            template: scope.template,
        };
        let result = self.exec(&block.body, frame, inner, buffer.out());
        frame.registry.leave(dispatch);
        self.depth -= 1;
        result?;

        if let Some(local) = block.snippet_name() {
            if !frame.extending {
                frame.control.validate(Some(local));
            }
        }

        if modifiers.is_empty() {
            buffer.set_disposition(Disposition::Flush);
            drop(buffer);
        } else {
            let captured = buffer.take();
            out.push_str(&self.engine.filters().apply(modifiers, captured)?);
        }
        Ok(())
    }
}

fn resolve_name(name: &BlockName, scope: Scope<'_>) -> Result<String, RenderError> {
    match name {
        BlockName::Static(ident) => Ok(ident.as_str().to_string()),
        BlockName::Dynamic(expr) => expr.eval(scope.vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::snippet::ComponentNode;

    #[test]
    fn test_failed_ancestor_lookup_restores_state() {
        let engine = Engine::new(
            MemoryLoader::new().with_template("page", "{extends $layout}{block c}!{/block}"),
        );
        let root = ComponentNode::root();
        let unit = engine.load("page").unwrap();

        let mut renderer = Renderer::new(&engine, &root, false, None);
        let mut frame = Frame::new(&root);
        frame.extending = true;
        let mut out = String::new();

        let err = renderer
            .render_unit(&mut frame, unit, &Params::new(), &mut out)
            .unwrap_err();

        assert!(matches!(err, RenderError::UndefinedVariable { name } if name == "layout"));
        assert_eq!(renderer.depth, 0);
        assert!(frame.extending);
        assert_eq!(out, "");
    }
}
