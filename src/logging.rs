//! Tracing subscriber initialization.
//!
//! Logs go to stderr. `RUST_LOG` takes precedence over the configured level.

use crate::error::LoggingError;

/// Level used when neither `RUST_LOG` nor the config file set one.
pub const DEFAULT_LEVEL: &str = "info";

/// Filter directive used when `RUST_LOG` is unset or invalid.
pub fn default_directive(level: Option<&str>) -> String {
    let level = level.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LEVEL);
    // Keep winit/wgpu quiet unless asked for explicitly.
    format!("{level},wgpu_core=warn,wgpu_hal=warn,naga=warn,winit=warn")
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns [`LoggingError::SubscriberAlreadySet`] if a global subscriber is
/// already installed.
pub fn init(level: Option<&str>) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn directive_uses_configured_level() {
        assert!(default_directive(Some("debug")).starts_with("debug,"));
        assert!(default_directive(Some("  ")).starts_with("info,"));
        assert!(default_directive(None).starts_with("info,"));
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_fails() {
        // The first call may already fail if another test installed a subscriber.
        let _ = init(Some("warn"));
        assert!(matches!(init(None), Err(LoggingError::SubscriberAlreadySet)));
    }
}
