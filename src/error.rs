//! Error types for mapclick.
//!
//! Only [`QueryError`] can occur while the map is running, and it is handled at
//! the call site (logged, optionally surfaced in the UI). The remaining types
//! cover startup: configuration, feature data and logging. They convert into
//! [`AppError`] so `main` can use `?` throughout.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a spatial query issued against a feature layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// The map has no queryable (feature-type) layer.
    #[error("no feature layer available to query")]
    NoFeatureLayer,

    /// The query carried no geometry to test against.
    #[error("query has no geometry")]
    MissingGeometry,

    /// The engine cannot evaluate the given query geometry.
    #[error("unsupported query geometry: {0}")]
    UnsupportedGeometry(&'static str),

    /// The engine dropped the query without producing a result.
    #[error("query on layer '{layer}' was abandoned before it completed")]
    Abandoned {
        /// Layer the query was issued against.
        layer: String,
    },

    /// Engine-specific failure.
    #[error("query engine error: {0}")]
    Engine(String),
}

/// Configuration file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML or has unknown/mistyped keys.
    #[error("invalid config in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Feature data (GeoJSON) problems.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read feature data at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feature data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally valid JSON that is not a usable GeoJSON document.
    #[error("invalid GeoJSON: {0}")]
    GeoJson(String),
}

/// Tracing subscriber initialisation failure.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Top-level error returned from the binary's startup path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("UI error: {0}")]
    Ui(String),
}

impl From<eframe::Error> for AppError {
    fn from(e: eframe::Error) -> Self {
        AppError::Ui(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_messages_name_the_layer() {
        let e = QueryError::Abandoned {
            layer: "cities".into(),
        };
        assert!(e.to_string().contains("cities"));
    }

    #[test]
    fn data_error_converts_into_app_error() {
        let err: AppError = DataError::GeoJson("no features".into()).into();
        assert!(matches!(err, AppError::Data(_)));
        assert_eq!(err.to_string(), "invalid GeoJSON: no features");
    }
}
