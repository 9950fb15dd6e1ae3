//! Adapter to the minijinja engine (`"{{ items | length }} items"`)
//!
//! Only functional with the `jinja` cargo feature. Without it every call with
//! a template fails with `EngineUnavailable`.

use super::TemplateRenderer;
use crate::capability::Capabilities;
use crate::error::TemplateRenderingFailure;
use crate::vars::TemplateVars;

/// Renders Jinja templates through minijinja
#[derive(Debug, Clone, Copy, Default)]
pub struct JinjaRenderer;

impl TemplateRenderer for JinjaRenderer {
    const NAME: &'static str = "jinja";

    fn ensure_available() -> Result<(), TemplateRenderingFailure> {
        Capabilities::get()
            .require_jinja()
            .map_err(|e| TemplateRenderingFailure::new(Self::NAME, e))
    }

    fn render(
        template: Option<&str>,
        vars: &TemplateVars,
        ignore_missing: bool,
    ) -> Result<Option<String>, TemplateRenderingFailure> {
        let Some(source) = template else {
            return Ok(None);
        };
        Self::ensure_available()?;
        tracing::debug!(
            renderer = Self::NAME,
            variables = vars.len(),
            ignore_missing,
            "rendering template"
        );

        engine::render(source, vars, ignore_missing)
            .map(Some)
            .map_err(|cause| TemplateRenderingFailure::new(Self::NAME, cause))
    }

    /// Uses the engine's undeclared-variable analysis, sorted by name
    fn variable_names(template: &str) -> Result<Vec<String>, TemplateRenderingFailure> {
        Self::ensure_available()?;
        engine::undeclared_variables(template)
            .map_err(|cause| TemplateRenderingFailure::new(Self::NAME, cause))
    }
}

#[cfg(feature = "jinja")]
mod engine {
    use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};

    use crate::error::{RenderCause, RenderError};
    use crate::renderer::MISSING_PLACEHOLDER;
    use crate::vars::TemplateVars;

    fn engine_error(err: Error) -> RenderCause {
        RenderCause::Render(RenderError::Engine(err.to_string()))
    }

    fn environment<'source>(ignore_missing: bool) -> Environment<'source> {
        let mut env = Environment::new();
        if ignore_missing {
            env.set_undefined_behavior(UndefinedBehavior::Chainable);
            env.set_formatter(|out, state, value| {
                if value.is_undefined() {
                    out.write_str(MISSING_PLACEHOLDER).map_err(|_| {
                        Error::new(ErrorKind::WriteFailure, "could not write placeholder")
                    })
                } else {
                    minijinja::escape_formatter(out, state, value)
                }
            });
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        env
    }

    pub(super) fn render(
        source: &str,
        vars: &TemplateVars,
        ignore_missing: bool,
    ) -> Result<String, RenderCause> {
        let env = environment(ignore_missing);
        let template = env.template_from_str(source).map_err(engine_error)?;

        match template.render(vars.as_map()) {
            Ok(rendered) => Ok(rendered),
            Err(err) if err.kind() == ErrorKind::UndefinedError => {
                let mut missing: Vec<String> = template
                    .undeclared_variables(false)
                    .into_iter()
                    .filter(|name| !vars.contains(name))
                    .collect();
                missing.sort();
                match missing.into_iter().next() {
                    Some(name) => Err(RenderCause::MissingVariable { name }),
                    None => Err(engine_error(err)),
                }
            }
            Err(err) => Err(engine_error(err)),
        }
    }

    pub(super) fn undeclared_variables(source: &str) -> Result<Vec<String>, RenderCause> {
        let env = Environment::new();
        let template = env.template_from_str(source).map_err(engine_error)?;
        let mut names: Vec<String> = template.undeclared_variables(false).into_iter().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(not(feature = "jinja"))]
mod engine {
    use crate::capability::Capabilities;
    use crate::error::RenderCause;
    use crate::vars::TemplateVars;

    fn unavailable() -> RenderCause {
        Capabilities::jinja_unavailable().into()
    }

    pub(super) fn render(
        _source: &str,
        _vars: &TemplateVars,
        _ignore_missing: bool,
    ) -> Result<String, RenderCause> {
        Err(unavailable())
    }

    pub(super) fn undeclared_variables(_source: &str) -> Result<Vec<String>, RenderCause> {
        Err(unavailable())
    }
}
