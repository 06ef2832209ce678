//! Member discovery, metadata caching and value adaptation for
//! property-binding.
//!
//! Given a type that describes its members, this crate builds cached,
//! validated metadata for each member and converts between each member's
//! declared representation and a canonical value-wrapper type:
//!
//! - [`MemberFinder`] - Enumerates members by visibility, kind and filter
//! - [`PropertyTypeHandler`] - Validates adaptation once per member
//! - [`ValueSyncer`] / [`SimpleValueSyncer`] - Perform the conversions
//! - [`SafeOneWayAdaptor`] - Type-checked, numeric-coercing converter wrapper
//! - [`ClassMetadata`] / [`InstanceMetadata`] - Per-type and per-object views
//! - [`MetadataFactory`] - Thread-safe class metadata cache
//!
//! # Architecture
//!
//! ```text
//! MetadataFactory
//!    │
//!    └─── ClassMetadata<T>        (built once per type)
//!            │
//!            ├─── MemberFinder    (ClassSchema<T> → MemberHandle<T>)
//!            └─── PropertyDefinition<T>
//!                    │
//!                    └─── PropertyTypeHandler
//!                            └─── ValueSyncer → SafeOneWayAdaptor → Converter
//!
//! InstanceMetadata<T>  (one per bound object)
//!    └─── Property<T>  (definition × target)
//! ```
//!
//! Canonical value-wrapper types themselves live in domain crates such as
//! `binding-types`; this crate only defines their contract.

pub mod class;
pub mod config;
pub mod convert;
pub mod definition;
pub mod error;
pub mod factory;
pub mod finder;
pub mod handler;
pub mod instance;
pub mod member;
pub mod syncer;
pub mod types;
pub mod value;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use class::{ClassMetadata, SkippedMember};
pub use config::{BindingConfig, ConfigError, FailurePolicy, MemberKind, Visibility};
pub use convert::{
    Converter, ConverterSpec, DeclaredConverter, Direction, NumericCast, SafeOneWayAdaptor,
};
pub use definition::{PropertyDefinition, PropertyInfo};
pub use error::{BindError, Result};
pub use factory::MetadataFactory;
pub use finder::{AnyMemberFilter, FnMemberFilter, MemberFilter, MemberFinder};
pub use handler::{BindingDomain, PropertyTypeHandler};
pub use instance::{InstanceMetadata, Property};
pub use member::{AdaptTag, ClassSchema, MemberDecl, MemberHandle, MemberInfo, MemberTags, PropertyContainer};
pub use syncer::{CycleSafeConverter, SimpleValueSyncer, ValueSyncer};
pub use types::{CanonicalType, CanonicalTypeInfo, DeclaredType, LiteralType, TypeBound};
pub use value::{
    AttachToken, CanonicalValue, FieldValue, OpaqueValue, Value, WrapperCore, WrapperRef,
};

// parking_lot is part of the public API through shared targets
pub use parking_lot::RwLock;
