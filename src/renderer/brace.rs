//! Built-in brace-substitution renderer (`"Hello {name}"`)

use std::borrow::Cow;

use serde_json::Value;

use super::format::{apply_spec, convert, kind_name};
use super::{TemplateRenderer, MISSING_PLACEHOLDER};
use crate::error::{RenderCause, RenderError, TemplateRenderingFailure};
use crate::parser::ast::{Accessor, BraceTemplate, Field, FieldRoot, Segment};
use crate::parser::parse;
use crate::vars::TemplateVars;

/// Renders `{name}`, `{name[0]}` and `{name.attr:>10}` style templates.
///
/// Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceRenderer;

impl TemplateRenderer for BraceRenderer {
    const NAME: &'static str = "brace";

    fn render(
        template: Option<&str>,
        vars: &TemplateVars,
        ignore_missing: bool,
    ) -> Result<Option<String>, TemplateRenderingFailure> {
        let Some(source) = template else {
            return Ok(None);
        };
        tracing::debug!(
            renderer = Self::NAME,
            variables = vars.len(),
            ignore_missing,
            "rendering template"
        );

        let fail = |cause: RenderCause| TemplateRenderingFailure::new(Self::NAME, cause);
        let parsed = parse(source).map_err(|e| fail(e.into()))?;
        render_parsed(&parsed, vars, ignore_missing)
            .map(Some)
            .map_err(fail)
    }

    /// Reads the names straight from the parsed template
    fn variable_names(template: &str) -> Result<Vec<String>, TemplateRenderingFailure> {
        parse(template)
            .map(|parsed| parsed.variable_names())
            .map_err(|e| TemplateRenderingFailure::new(Self::NAME, e))
    }
}

/// Missing roots render as [`MISSING_PLACEHOLDER`] in tolerant mode, skipping
/// the field's accessors, conversion and format spec.
fn render_parsed(
    template: &BraceTemplate,
    vars: &TemplateVars,
    ignore_missing: bool,
) -> Result<String, RenderCause> {
    let mut out = String::new();
    for segment in &template.segments {
        match &segment.node {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(field) => match resolve_root(field, vars)? {
                Some(value) => out.push_str(&render_field(field, value)?),
                None if ignore_missing => out.push_str(MISSING_PLACEHOLDER),
                None => {
                    return Err(RenderCause::MissingVariable {
                        name: field.path.root.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}

/// Look up the root variable; `Ok(None)` means it is missing
fn resolve_root<'v>(field: &Field, vars: &'v TemplateVars) -> Result<Option<&'v Value>, RenderCause> {
    match &field.path.root {
        FieldRoot::Named(name) => Ok(vars.get(name)),
        FieldRoot::Positional(_) => Err(RenderError::substitution(
            &field.source,
            "positional fields are not supported, name the variable",
        )
        .into()),
    }
}

fn render_field(field: &Field, root: &Value) -> Result<String, RenderError> {
    let mut value = Cow::Borrowed(root);
    for accessor in &field.path.accessors {
        value = Cow::Owned(access(&value, accessor).map_err(|reason| {
            RenderError::substitution(&field.source, reason)
        })?);
    }

    let value = match field.conversion {
        Some(conversion) => Cow::Owned(convert(&value, conversion)),
        None => value,
    };

    apply_spec(&value, &field.spec).map_err(|reason| RenderError::substitution(&field.source, reason))
}

fn access(value: &Value, accessor: &Accessor) -> Result<Value, String> {
    match (value, accessor) {
        (Value::Object(map), Accessor::Attr(name) | Accessor::Key(name)) => map
            .get(name)
            .cloned()
            .ok_or_else(|| format!("object has no member '{}'", name)),
        (Value::Object(map), Accessor::Index(index)) => map
            .get(&index.to_string())
            .cloned()
            .ok_or_else(|| format!("object has no member '{}'", index)),
        (Value::Array(items), Accessor::Index(index)) => items
            .get(*index)
            .cloned()
            .ok_or_else(|| format!("index {} out of range for array of length {}", index, items.len())),
        (Value::String(s), Accessor::Index(index)) => s
            .chars()
            .nth(*index)
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| format!("index {} out of range for string", index)),
        (other, Accessor::Attr(name)) => Err(format!("{} has no attribute '{}'", kind_name(other), name)),
        (other, _) => Err(format!("{} is not subscriptable", kind_name(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SAMPLE_TEMPLATE: &str = "
    Some message template that takes three elements:
    - {variable_a}
    - {variable_b}
    - {variable_c[0]}
    ";

    fn render(template: &str, vars: &TemplateVars, ignore_missing: bool) -> Result<String, TemplateRenderingFailure> {
        BraceRenderer::render(Some(template), vars, ignore_missing).map(|s| s.expect("template given"))
    }

    fn sample_vars() -> TemplateVars {
        TemplateVars::new()
            .with("variable_a", 1)
            .with("variable_b", 1)
            .with("variable_c", vec![1])
    }

    #[test]
    fn test_render_complete_mapping() {
        let rendered = render(SAMPLE_TEMPLATE, &sample_vars(), false).expect("renders");
        assert_eq!(
            rendered,
            "
    Some message template that takes three elements:
    - 1
    - 1
    - 1
    "
        );
    }

    #[test]
    fn test_render_none_template() {
        let rendered = BraceRenderer::render(None, &sample_vars(), false).expect("no failure");
        assert_eq!(rendered, None);
    }

    #[test]
    fn test_render_missing_strict() {
        let err = render(SAMPLE_TEMPLATE, &TemplateVars::new(), false).expect_err("missing");
        assert_eq!(err.renderer, "brace");
        assert_eq!(err.missing_variable(), Some("variable_a"));
    }

    #[test]
    fn test_render_missing_tolerant() {
        let vars = TemplateVars::new().with("variable_b", "bee");
        let rendered = render(SAMPLE_TEMPLATE, &vars, true).expect("renders");
        assert!(rendered.contains("- ...\n    - bee\n    - ...\n"));
    }

    #[test]
    fn test_render_wrong_type_is_render_error() {
        let vars = sample_vars().with("variable_c", 1);
        let err = render(SAMPLE_TEMPLATE, &vars, false).expect_err("not subscriptable");
        assert!(err.missing_variable().is_none());
        assert_eq!(
            err.cause,
            RenderCause::Render(RenderError::substitution(
                "variable_c[0]",
                "number is not subscriptable"
            ))
        );
    }

    #[test]
    fn test_render_wrong_type_fails_even_when_tolerant() {
        let vars = sample_vars().with("variable_c", 1);
        assert!(render(SAMPLE_TEMPLATE, &vars, true).is_err());
    }

    #[test]
    fn test_render_list_display() {
        let vars = TemplateVars::new().with("lst", vec![1, 2, 3]);
        let rendered = render("The list you provided was not empty: {lst}.", &vars, false).expect("renders");
        assert_eq!(rendered, "The list you provided was not empty: [1, 2, 3].");
    }

    #[test]
    fn test_render_nested_access() {
        let vars = TemplateVars::new().with(
            "user",
            json!({"name": "ada", "emails": ["a@x", "b@x"], "0": "zero"}),
        );
        let rendered = render("{user.name} <{user[emails][1]}> {user[0]}", &vars, false).expect("renders");
        assert_eq!(rendered, "ada <b@x> zero");
    }

    #[test]
    fn test_render_string_index() {
        let vars = TemplateVars::new().with("word", "hello");
        assert_eq!(render("{word[1]}", &vars, false).expect("renders"), "e");
    }

    #[test]
    fn test_render_missing_member() {
        let vars = TemplateVars::new().with("user", json!({"name": "ada"}));
        let err = render("{user.email}", &vars, true).expect_err("no member");
        assert!(err.report().contains("no member 'email'"));
    }

    #[test]
    fn test_render_escaped_braces() {
        let vars = TemplateVars::new().with("x", 5);
        assert_eq!(render("{{x}} = {x}", &vars, false).expect("renders"), "{x} = 5");
    }

    #[test]
    fn test_render_conversion_and_spec() {
        let vars = TemplateVars::new().with("name", "ada").with("ratio", 0.5);
        let rendered = render("{name!r:>7}|{ratio:.0%}", &vars, false).expect("renders");
        assert_eq!(rendered, "  \"ada\"|50%");
    }

    #[test]
    fn test_render_positional_field_fails() {
        let err = render("{0}", &TemplateVars::new(), true).expect_err("positional");
        assert!(err.report().contains("positional fields are not supported"));
    }

    #[test]
    fn test_render_syntax_error() {
        let err = render("broken {", &TemplateVars::new(), true).expect_err("syntax");
        assert!(matches!(
            err.cause,
            RenderCause::Render(RenderError::Syntax(_))
        ));
    }

    #[test]
    fn test_variable_names_static_analysis() {
        let names = BraceRenderer::variable_names(SAMPLE_TEMPLATE).expect("parses");
        assert_eq!(names, vec!["variable_a", "variable_b", "variable_c"]);
    }

    #[test]
    fn test_variable_names_syntax_error() {
        assert!(BraceRenderer::variable_names("{").is_err());
    }
}
