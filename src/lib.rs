//! Templated Errors - error types whose messages come from type-level templates
//!
//! Each error type declares a message template once. Instances carry the
//! variables substituted into it, or a literal message that replaces it.
//! Rendering failures never stop an error from being reported unless debug
//! mode is on.
//!
//! # Example
//!
//! ```rust
//! use templated_errors::{templated_error, Templated};
//!
//! templated_error! {
//!     pub QuotaExceeded => "user {user} is over quota by {excess:.1f} MB";
//! }
//!
//! let err = Templated::<QuotaExceeded>::builder()
//!     .var("user", "ada")
//!     .var("excess", 12.34)
//!     .build()
//!     .unwrap();
//! assert_eq!(err.to_string(), "user ada is over quota by 12.3 MB");
//!
//! // Missing variables are shown as "..."
//! let err = Templated::<QuotaExceeded>::builder()
//!     .var("user", "ada")
//!     .build()
//!     .unwrap();
//! assert_eq!(err.to_string(), "user ada is over quota by ... MB");
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod templated;
pub mod vars;

pub use capability::Capabilities;
pub use config::{Settings, SettingsError};
pub use error::{EngineUnavailable, Error, RenderCause, RenderError, SyntaxError, TemplateRenderingFailure};
pub use renderer::{BraceRenderer, JinjaRenderer, TemplateRenderer, MISSING_PLACEHOLDER};
pub use templated::{MessageTemplate, RenderOutcome, Templated, TemplatedBuilder, NO_MESSAGE};
pub use vars::TemplateVars;

/// Render a brace template strictly: every referenced variable must be present.
///
/// ```rust
/// use templated_errors::{render, TemplateVars};
///
/// let vars = TemplateVars::new().with("n", 3);
/// assert_eq!(render("{n} retries left", &vars).unwrap(), "3 retries left");
/// assert!(render("{missing}", &vars).is_err());
/// ```
pub fn render(template: &str, vars: &TemplateVars) -> Result<String, TemplateRenderingFailure> {
    BraceRenderer::render(Some(template), vars, false).map(Option::unwrap_or_default)
}

/// Load settings from the environment and install them process-wide
pub fn init_from_env() -> Settings {
    let settings = Settings::from_env();
    settings.apply();
    settings
}
