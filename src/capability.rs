//! Optional engine capabilities of this build

use std::sync::OnceLock;

use crate::error::EngineUnavailable;

/// Which optional templating engines this build can use.
///
/// Detected once, on first use, and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub jinja: bool,
}

impl Capabilities {
    /// Capabilities compiled into this build
    pub fn detect() -> Self {
        Self {
            jinja: cfg!(feature = "jinja"),
        }
    }

    /// The process-wide capabilities
    pub fn get() -> &'static Capabilities {
        static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();
        CAPABILITIES.get_or_init(|| {
            let detected = Self::detect();
            tracing::debug!(jinja = detected.jinja, "detected templating engines");
            detected
        })
    }

    pub fn require_jinja(&self) -> Result<(), EngineUnavailable> {
        if self.jinja {
            Ok(())
        } else {
            Err(Self::jinja_unavailable())
        }
    }

    pub(crate) fn jinja_unavailable() -> EngineUnavailable {
        EngineUnavailable {
            engine: "jinja",
            feature: "jinja",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_matches_feature() {
        assert_eq!(Capabilities::detect().jinja, cfg!(feature = "jinja"));
        assert_eq!(Capabilities::get(), &Capabilities::detect());
    }

    #[test]
    fn test_require_missing_engine() {
        let err = Capabilities { jinja: false }
            .require_jinja()
            .expect_err("engine missing");
        assert_eq!(err.engine, "jinja");
        assert!(Capabilities { jinja: true }.require_jinja().is_ok());
    }
}
