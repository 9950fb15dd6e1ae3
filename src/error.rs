//! Error types for template parsing, rendering and templated errors

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A brace template that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at {span:?}: {message}")]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// Shift the span by `offset` bytes (used when a field is parsed on its own)
    pub(crate) fn offset(mut self, offset: usize) -> Self {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.clone()))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Renderer failures other than a missing variable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The template is not valid for the renderer
    #[error("invalid template: {0}")]
    Syntax(#[from] SyntaxError),

    /// A field could not be resolved or formatted with the supplied values
    #[error("cannot substitute field '{field}': {reason}")]
    Substitution { field: String, reason: String },

    /// Variable discovery did not converge
    #[error("variable discovery gave up after {limit} names")]
    DiscoveryLimit { limit: usize },

    /// Failure reported by an external templating engine
    #[error("engine error: {0}")]
    Engine(String),
}

impl RenderError {
    /// Create a substitution error for `field`
    pub fn substitution(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Substitution {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The optional templating engine was not compiled into this build
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "the {engine} templating engine is not available in this build; \
     enable the `{feature}` cargo feature or use `BraceRenderer` instead"
)]
pub struct EngineUnavailable {
    pub engine: &'static str,
    pub feature: &'static str,
}

/// Why a renderer failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderCause {
    /// The template references a variable absent from the mapping
    #[error("missing template variable '{name}'")]
    MissingVariable { name: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    EngineUnavailable(#[from] EngineUnavailable),
}

impl From<SyntaxError> for RenderCause {
    fn from(err: SyntaxError) -> Self {
        RenderCause::Render(RenderError::Syntax(err))
    }
}

/// Failure at the boundary between a renderer and the templated error type.
///
/// Always carries the original cause, reachable through `source()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to render {renderer} template")]
pub struct TemplateRenderingFailure {
    pub renderer: &'static str,
    #[source]
    pub cause: RenderCause,
}

impl TemplateRenderingFailure {
    pub fn new(renderer: &'static str, cause: impl Into<RenderCause>) -> Self {
        Self {
            renderer,
            cause: cause.into(),
        }
    }

    /// Name of the missing variable, if that is what failed
    pub fn missing_variable(&self) -> Option<&str> {
        match &self.cause {
            RenderCause::MissingVariable { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self.cause, RenderCause::EngineUnavailable(_))
    }

    /// Render the failure and its cause chain on one line
    pub fn report(&self) -> String {
        format!("{}: {}", self, self.cause)
    }
}

/// Errors surfaced by templated error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The renderer selected by the error type cannot run in this build
    #[error("cannot construct {kind}: templating engine unavailable")]
    EngineUnavailable {
        kind: &'static str,
        #[source]
        source: TemplateRenderingFailure,
    },

    /// Rendering failed while describing an error and debug mode is on
    #[error("internal error while rendering the message of {kind} (debug mode is on)")]
    Internal {
        kind: &'static str,
        #[source]
        source: TemplateRenderingFailure,
    },
}

impl Error {
    /// The underlying rendering failure
    pub fn failure(&self) -> &TemplateRenderingFailure {
        match self {
            Self::EngineUnavailable { source, .. } | Self::Internal { source, .. } => source,
        }
    }
}
