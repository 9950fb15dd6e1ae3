//! Error types whose message is rendered from a type-level template
//!
//! A concrete error type is a marker implementing [`MessageTemplate`],
//! usually declared with [`templated_error!`](crate::templated_error), used
//! through [`Templated<K>`]:
//!
//! ```rust
//! use templated_errors::{templated_error, Templated};
//!
//! templated_error! {
//!     /// Raised when a list should have been empty
//!     pub NonEmptyList => "The list you provided was not empty: {lst}.";
//! }
//!
//! let err = Templated::<NonEmptyList>::builder()
//!     .var("lst", vec![1, 2, 3])
//!     .build()
//!     .unwrap();
//! assert_eq!(err.to_string(), "The list you provided was not empty: [1, 2, 3].");
//!
//! // An explicit message always wins over the template
//! let err = Templated::<NonEmptyList>::with_message("custom msg").unwrap();
//! assert_eq!(err.to_string(), "custom msg");
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::config;
use crate::error::{Error, TemplateRenderingFailure};
use crate::renderer::format::{display, repr};
use crate::renderer::TemplateRenderer;
use crate::vars::TemplateVars;

/// Shown when an error has neither a message nor a usable template
pub const NO_MESSAGE: &str = "no message";

/// Type-level declaration of an error message template
pub trait MessageTemplate: 'static {
    /// Renderer that understands [`TEMPLATE`](Self::TEMPLATE)
    type Renderer: TemplateRenderer;

    /// Name of the error type, for logs and debug output
    const NAME: &'static str;

    /// The message template, `None` for a plain error
    const TEMPLATE: Option<&'static str>;
}

/// Declare marker types implementing [`MessageTemplate`].
///
/// ```rust
/// use templated_errors::{templated_error, JinjaRenderer, MessageTemplate};
///
/// templated_error! {
///     pub NotFound => "no {kind} named {name}";
///     pub Plain;
///     pub Summary(JinjaRenderer) => "{{ items | length }} items";
/// }
///
/// assert_eq!(NotFound::TEMPLATE, Some("no {kind} named {name}"));
/// assert_eq!(Plain::TEMPLATE, None);
/// assert_eq!(Summary::NAME, "Summary");
/// ```
#[macro_export]
macro_rules! templated_error {
    () => {};
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident $(($renderer:ty))? $(=> $template:expr)?;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis enum $name {}

        impl $crate::MessageTemplate for $name {
            type Renderer = $crate::__templated_renderer!($($renderer)?);
            const NAME: &'static str = stringify!($name);
            const TEMPLATE: ::core::option::Option<&'static str> =
                $crate::__templated_template!($($template)?);
        }

        $crate::templated_error!($($rest)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __templated_renderer {
    () => {
        $crate::BraceRenderer
    };
    ($renderer:ty) => {
        $renderer
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __templated_template {
    () => {
        ::core::option::Option::None
    };
    ($template:expr) => {
        ::core::option::Option::Some($template)
    };
}

/// Result of rendering an error's template for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    NoTemplate,
    Failed(TemplateRenderingFailure),
}

/// An error instance of the templated type `K`
pub struct Templated<K: MessageTemplate> {
    args: Vec<Value>,
    vars: TemplateVars,
    has_message: bool,
    _template: PhantomData<fn() -> K>,
}

/// Builder for [`Templated`]
pub struct TemplatedBuilder<K: MessageTemplate> {
    args: Vec<Value>,
    vars: TemplateVars,
    passthrough: bool,
    _template: PhantomData<fn() -> K>,
}

impl<K: MessageTemplate> TemplatedBuilder<K> {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            vars: TemplateVars::new(),
            passthrough: false,
            _template: PhantomData,
        }
    }

    /// Add a positional argument; any argument replaces the template
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Add a template variable
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name, value);
        self
    }

    /// Add several template variables
    pub fn vars(mut self, vars: TemplateVars) -> Self {
        for (name, value) in &vars {
            self.vars.insert(name.clone(), value.clone());
        }
        self
    }

    /// Render the template at construction and keep it as the first argument
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// Build the error.
    ///
    /// Fails when the type's renderer is unavailable in this build, or, in
    /// debug mode, when passthrough rendering fails.
    pub fn build(self) -> Result<Templated<K>, Error> {
        K::Renderer::ensure_available().map_err(|source| Error::EngineUnavailable {
            kind: K::NAME,
            source,
        })?;

        let has_message = !self.args.is_empty();
        let args = if has_message {
            self.args
        } else if self.passthrough {
            match Templated::<K>::template_with(&self.vars) {
                Ok(Some(rendered)) => vec![Value::String(rendered)],
                Ok(None) => Vec::new(),
                Err(failure) => {
                    Templated::<K>::absorb(failure)?;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Templated {
            args,
            vars: self.vars,
            has_message,
            _template: PhantomData,
        })
    }
}

impl<K: MessageTemplate> Templated<K> {
    pub fn builder() -> TemplatedBuilder<K> {
        TemplatedBuilder::new()
    }

    /// An error without message or variables
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// An error with a literal message, bypassing the template
    pub fn with_message(message: impl Into<Value>) -> Result<Self, Error> {
        Self::builder().arg(message).build()
    }

    /// An error whose message is rendered from `vars`
    pub fn with_vars(vars: TemplateVars) -> Result<Self, Error> {
        Self::builder().vars(vars).build()
    }

    pub fn name() -> &'static str {
        K::NAME
    }

    /// The type's template, unrendered
    pub fn template() -> Option<&'static str> {
        K::TEMPLATE
    }

    /// Render the type's template with `vars`, tolerating missing variables.
    ///
    /// Without variables the template comes back unrendered.
    pub fn template_with(vars: &TemplateVars) -> Result<Option<String>, TemplateRenderingFailure> {
        match K::TEMPLATE {
            None => Ok(None),
            Some(template) if vars.is_empty() => Ok(Some(template.to_string())),
            Some(template) => K::Renderer::render(Some(template), vars, true),
        }
    }

    /// Variables referenced by the type's template
    pub fn variable_names() -> Result<Vec<String>, TemplateRenderingFailure> {
        match K::TEMPLATE {
            None => Ok(Vec::new()),
            Some(template) => K::Renderer::variable_names(template),
        }
    }

    /// Argument record: the literal arguments, or the passthrough rendering
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn vars(&self) -> &TemplateVars {
        &self.vars
    }

    /// Whether a literal message was given at construction
    pub fn has_message(&self) -> bool {
        self.has_message
    }

    /// Render the template for this instance
    pub fn outcome(&self) -> RenderOutcome {
        match Self::template_with(&self.vars) {
            Ok(Some(rendered)) => RenderOutcome::Rendered(rendered),
            Ok(None) => RenderOutcome::NoTemplate,
            Err(failure) => RenderOutcome::Failed(failure),
        }
    }

    /// The message shown for this error.
    ///
    /// Rendering failures fall back to the generic description unless debug
    /// mode is on, in which case they are returned as [`Error::Internal`].
    /// Prefer this over `to_string()` in debug mode: `Display` can only report
    /// `fmt::Error`, which makes `to_string()` and `format!` panic without the
    /// cause.
    pub fn describe(&self) -> Result<String, Error> {
        if self.has_message {
            return Ok(self.generic_description());
        }
        match self.outcome() {
            RenderOutcome::Rendered(message) => Ok(message),
            RenderOutcome::NoTemplate => Ok(self.generic_description()),
            RenderOutcome::Failed(failure) => {
                Self::absorb(failure)?;
                Ok(self.generic_description())
            }
        }
    }

    fn generic_description(&self) -> String {
        match self.args.as_slice() {
            [] => NO_MESSAGE.to_string(),
            [single] => display(single),
            many => {
                let items: Vec<String> = many.iter().map(repr).collect();
                format!("({})", items.join(", "))
            }
        }
    }

    fn absorb(failure: TemplateRenderingFailure) -> Result<(), Error> {
        if config::debug_enabled() {
            return Err(Error::Internal {
                kind: K::NAME,
                source: failure,
            });
        }
        tracing::warn!(
            kind = K::NAME,
            error = %failure.report(),
            "ignoring template rendering failure"
        );
        Ok(())
    }
}

impl<K: MessageTemplate> Clone for Templated<K> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
            vars: self.vars.clone(),
            has_message: self.has_message,
            _template: PhantomData,
        }
    }
}

impl<K: MessageTemplate> fmt::Debug for Templated<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::NAME)
            .field("args", &self.args)
            .field("vars", &self.vars)
            .finish()
    }
}

/// Writes [`Templated::describe`].
///
/// In debug mode a rendering failure is logged with `tracing::error!` and
/// surfaces as `fmt::Error`, so `to_string()` panics. Call `describe()` to get
/// the failure itself.
impl<K: MessageTemplate> fmt::Display for Templated<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Ok(message) => f.write_str(&message),
            Err(err) => {
                tracing::error!(
                    kind = K::NAME,
                    error = %err,
                    cause = %err.failure().report(),
                    "cannot display templated error"
                );
                Err(fmt::Error)
            }
        }
    }
}

impl<K: MessageTemplate> std::error::Error for Templated<K> {}
