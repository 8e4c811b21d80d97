//! Error types for manifest rendering.
//!
//! Every variant is a local, synchronous failure. Nothing here is retryable:
//! rendering is deterministic, so a retry reproduces the same error.

use thiserror::Error;

/// Error type for rendering operations
#[derive(Error, Debug)]
pub enum Error {
    /// Component identity is not a valid object name
    #[error("invalid component identity '{identity}': {reason}")]
    InvalidIdentity { identity: String, reason: String },

    /// A port entry failed validation
    #[error("invalid port spec '{name}': {reason}")]
    InvalidPortSpec { name: String, reason: String },

    /// Service generation was invoked with no ports
    #[error("no ports declared: a component without ports must not render a service")]
    NoPorts,

    /// Required value missing from the render context
    #[error("missing render context value: {field}")]
    MissingContext { field: &'static str },

    /// Component registered twice in the same registry
    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),

    /// Two components emitted the same object
    #[error("duplicate object {kind} {namespace}/{name}")]
    DuplicateObject {
        kind: String,
        namespace: String,
        name: String,
    },

    /// A component renderer failed
    #[error("component '{component}' failed to render: {source}")]
    Component {
        component: String,
        #[source]
        source: Box<Error>,
    },

    /// One or more components failed in collect-all mode
    #[error("{} component(s) failed to render: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<Error>),

    /// Config file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Manifest serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

impl Error {
    /// Check if this error comes from input validation
    pub fn is_validation(&self) -> bool {
        match self {
            Error::InvalidIdentity { .. }
            | Error::InvalidPortSpec { .. }
            | Error::NoPorts
            | Error::MissingContext { .. } => true,
            Error::Component { source, .. } => source.is_validation(),
            Error::Aggregate(errors) => errors.iter().all(Error::is_validation),
            _ => false,
        }
    }

    /// Name of the component an error is attributed to, if any
    pub fn component(&self) -> Option<&str> {
        match self {
            Error::Component { component, .. } => Some(component),
            _ => None,
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;
