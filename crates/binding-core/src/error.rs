//! Error types for member discovery and value adaptation.

use crate::config::ConfigError;
use crate::convert::Direction;

/// Result alias used throughout the crate.
pub type Result<T, E = BindError> = std::result::Result<T, E>;

/// Errors raised while building or using binding metadata.
///
/// Configuration defects (`InvalidDeclaredType`, `UnsupportedCapability`) are
/// always reported while class metadata is being built. Steady-state reads and
/// writes only fail with `ConverterFailure`, `IllegalArgument` or misuse
/// (`IllegalState`, `AssertionFailure`).
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// A member, converter or canonical type is declared in a way that cannot
    /// be bound.
    #[error("{message}")]
    InvalidDeclaredType { message: String },

    /// The requested scan or feature level is not supported.
    #[error("{message}")]
    UnsupportedCapability { message: String },

    /// A user-supplied converter failed.
    #[error("Converter {converter} failed when {direction} property {property}: {source}")]
    ConverterFailure {
        property: String,
        direction: Direction,
        converter: String,
        #[source]
        source: anyhow::Error,
    },

    /// A value of the wrong type reached a checked boundary at runtime.
    #[error("{message}")]
    IllegalArgument { message: String },

    /// The operation is not valid for the current state of the member or
    /// metadata (e.g. reading a property without a getter).
    #[error("{message}")]
    IllegalState { message: String },

    /// Internal invariant violated by the caller, such as using identity-only
    /// metadata for full access.
    #[error("{message}")]
    AssertionFailure { message: String },

    /// Binding configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BindError {
    pub fn invalid_declared_type(message: impl Into<String>) -> Self {
        Self::InvalidDeclaredType {
            message: message.into(),
        }
    }

    pub fn unsupported_capability(message: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            message: message.into(),
        }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    pub fn assertion_failure(message: impl Into<String>) -> Self {
        Self::AssertionFailure {
            message: message.into(),
        }
    }

    /// True for the configuration-time error kinds.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDeclaredType { .. } | Self::UnsupportedCapability { .. }
        )
    }
}
