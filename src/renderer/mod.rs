//! Template renderers
//!
//! A renderer turns a template plus [`TemplateVars`] into a message. The
//! renderer used by an error type is chosen at the type level through
//! [`MessageTemplate::Renderer`](crate::MessageTemplate::Renderer).

mod brace;
pub mod format;
mod jinja;

pub use brace::BraceRenderer;
pub use jinja::JinjaRenderer;

use serde_json::Value;

use crate::config;
use crate::error::{RenderError, TemplateRenderingFailure};
use crate::vars::TemplateVars;

/// Substituted for every missing variable in tolerant rendering.
///
/// The placeholder replaces the whole field: `{items[0]}` with `items`
/// missing renders as `...`, not as the first character of `...`.
pub const MISSING_PLACEHOLDER: &str = "...";

/// A template rendering strategy
pub trait TemplateRenderer: 'static {
    /// Short name used in errors and logs
    const NAME: &'static str;

    /// Fail if the renderer cannot run in this build
    fn ensure_available() -> Result<(), TemplateRenderingFailure> {
        Ok(())
    }

    /// Render `template` with `vars`.
    ///
    /// Returns `Ok(None)` when there is no template. With `ignore_missing`
    /// every missing variable renders as [`MISSING_PLACEHOLDER`]; otherwise a
    /// missing variable fails with a `MissingVariable` cause.
    fn render(
        template: Option<&str>,
        vars: &TemplateVars,
        ignore_missing: bool,
    ) -> Result<Option<String>, TemplateRenderingFailure>;

    /// Names of the variables `template` references, in discovery order
    fn variable_names(template: &str) -> Result<Vec<String>, TemplateRenderingFailure> {
        discover_by_rendering::<Self>(template, config::discovery_limit())
    }
}

/// Discover variable names by rendering strictly with a growing set of names.
///
/// Each failed attempt must name one missing variable; it is bound to `""`
/// and rendering is retried. Discovery stops at the first successful render
/// or at a failure that names no new variable, and fails with
/// [`RenderError::DiscoveryLimit`] once more than `limit` names are needed.
pub fn discover_by_rendering<R: TemplateRenderer + ?Sized>(
    template: &str,
    limit: usize,
) -> Result<Vec<String>, TemplateRenderingFailure> {
    let mut names: Vec<String> = Vec::new();

    loop {
        let probe: TemplateVars = names
            .iter()
            .map(|name| (name.clone(), Value::from("")))
            .collect();

        let failure = match R::render(Some(template), &probe, false) {
            Ok(_) => return Ok(names),
            Err(failure) if failure.is_engine_unavailable() => return Err(failure),
            Err(failure) => failure,
        };

        let Some(missing) = failure.missing_variable() else {
            tracing::trace!(renderer = R::NAME, error = %failure.report(), "discovery halted");
            return Ok(names);
        };
        if names.iter().any(|name| name == missing) {
            tracing::trace!(renderer = R::NAME, name = missing, "variable reported twice");
            return Ok(names);
        }
        if names.len() >= limit {
            return Err(TemplateRenderingFailure::new(
                R::NAME,
                RenderError::DiscoveryLimit { limit },
            ));
        }

        tracing::trace!(renderer = R::NAME, name = missing, "discovered variable");
        names.push(missing.to_string());
    }
}
