//! Invalidation sweep: re-render only what a partial update needs

use crate::compiler::SNIPPET_MARKER;
use crate::runtime::renderer::{Frame, Renderer, Scope};
use crate::runtime::RenderError;
use crate::template::Lookup;

impl<'r> Renderer<'r> {
    /// Render the invalid snippets of `frame.control` into the payload, then
    /// let each invalid child component run its own sweep
    ///
    /// Only statically declared snippet blocks are enumerated and run, even
    /// when a dynamic block shares their stack. Snippets of a
    /// component that is not invalid are skipped, and so are child components
    /// that have nothing to redraw.
    pub(crate) fn sweep(&mut self, frame: &mut Frame<'r>, scope: Scope<'_>) -> Result<(), RenderError> {
        let control = frame.control;
        let names: Vec<String> = frame.registry.snippet_names().map(str::to_string).collect();
        log::trace!(
            "sweeping '{}': {} snippet blocks",
            control.unique_id(),
            names.len()
        );

        for name in names {
            let local = name.strip_prefix(SNIPPET_MARKER).unwrap_or(&name);
            if !control.is_invalid(Some(local)) {
                continue;
            }
            let mut fragment = String::new();
            self.dispatch(
                frame,
                scope,
                &name,
                Lookup::Static,
                scope.template.clone(),
                &[],
                &mut fragment,
            )?;
            self.payload_mut().insert(control.snippet_id(local), fragment);
        }

        for child in control.components(false) {
            if !child.is_invalid(None) {
                continue;
            }
            if child.template(None).is_none() {
                log::debug!("skipping '{}': no template to render", child.unique_id());
                continue;
            }
            let params = child.params();
            self.render_component(child, None, &params)?;
        }
        Ok(())
    }
}
