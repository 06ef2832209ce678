//! Binding configuration.
//!
//! Controls which members are discovered and what happens when one of them
//! cannot be bound. Usually built in code, but can also be loaded from YAML
//! or TOML:
//!
//! ```yaml
//! field_visibility: private
//! accessor_visibility: public
//! member_kinds: [field, accessor]
//! failure_policy: fail_fast
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Types
// ============================================================================

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Error parsing TOML
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Member visibility, ordered from most to least visible.
///
/// A visibility threshold includes every member at that level or more
/// visible: `Protected` includes public and protected members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Default,
    Private,
}

impl Visibility {
    /// Whether a member with visibility `member` passes this threshold.
    pub fn includes(&self, member: Visibility) -> bool {
        member <= *self
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Protected => f.write_str("protected"),
            Self::Default => f.write_str("default"),
            Self::Private => f.write_str("private"),
        }
    }
}

/// How a member is exposed on its containing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// A data member read and written directly
    Field,
    /// A getter/setter pair
    Accessor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("field"),
            Self::Accessor => f.write_str("accessor"),
        }
    }
}

/// What to do when a discovered member cannot be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, record it on the class metadata and drop the member
    #[default]
    Skip,
    /// Fail the whole class
    FailFast,
}

fn default_field_visibility() -> Visibility {
    Visibility::Private
}

fn default_accessor_visibility() -> Visibility {
    Visibility::Public
}

fn default_member_kinds() -> Vec<MemberKind> {
    vec![MemberKind::Field, MemberKind::Accessor]
}

/// Configuration for member discovery and class metadata construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Least visible direct member that is still discovered.
    #[serde(default = "default_field_visibility")]
    pub field_visibility: Visibility,

    /// Least visible accessor pair that is still discovered.
    ///
    /// Only `public` is supported; anything else is rejected when the member
    /// finder is built.
    #[serde(default = "default_accessor_visibility")]
    pub accessor_visibility: Visibility,

    /// Member kinds to discover, fields before accessors.
    #[serde(default = "default_member_kinds")]
    pub member_kinds: Vec<MemberKind>,

    /// What to do with members that fail validation.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            field_visibility: default_field_visibility(),
            accessor_visibility: default_accessor_visibility(),
            member_kinds: default_member_kinds(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BindingConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that fails class construction on the first bad member.
    pub fn fail_fast() -> Self {
        Self {
            failure_policy: FailurePolicy::FailFast,
            ..Self::default()
        }
    }

    /// Create a config that only discovers direct members.
    pub fn fields_only() -> Self {
        Self {
            member_kinds: vec![MemberKind::Field],
            ..Self::default()
        }
    }

    pub fn with_field_visibility(mut self, visibility: Visibility) -> Self {
        self.field_visibility = visibility;
        self
    }

    pub fn with_accessor_visibility(mut self, visibility: Visibility) -> Self {
        self.accessor_visibility = visibility;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Parse config from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load config from a `.yaml`/`.yml` or `.toml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = fs::read_to_string(path)?;
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn includes_kind(&self, kind: MemberKind) -> bool {
        self.member_kinds.contains(&kind)
    }
}
