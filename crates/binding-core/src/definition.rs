//! Property definitions: per-class, per-member binding metadata.

use std::fmt;
use std::sync::Arc;

use crate::config::MemberKind;
use crate::error::{BindError, Result};
use crate::handler::{BindingDomain, PropertyTypeHandler};
use crate::member::{MemberHandle, MemberInfo, MemberTags, PropertyContainer};
use crate::types::{CanonicalType, DeclaredType};
use crate::value::{Value, WrapperRef};

/// Type-erased part of a [`PropertyDefinition`].
///
/// This is what canonical value-wrappers point back to after being read or
/// written through a property.
#[derive(Debug)]
pub struct PropertyInfo {
    member: Arc<MemberInfo>,
    canonical_type: CanonicalType,
    type_adapted: bool,
}

impl PropertyInfo {
    pub fn member(&self) -> &MemberInfo {
        &self.member
    }

    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub fn qualified_name(&self) -> String {
        self.member.qualified_name()
    }

    pub fn class_name(&self) -> &'static str {
        self.member.class_name()
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.canonical_type
    }

    pub fn declared_type(&self) -> DeclaredType {
        self.member.declared_type()
    }

    pub fn is_type_adapted(&self) -> bool {
        self.type_adapted
    }

    pub fn is_primary_key(&self) -> bool {
        self.member.is_primary_key()
    }

    /// The explicit external name, or the member name.
    pub fn column_name(&self) -> &str {
        self.member
            .tags()
            .column
            .as_deref()
            .unwrap_or_else(|| self.member.name())
    }
}

impl PartialEq for PropertyInfo {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
    }
}

impl Eq for PropertyInfo {}

impl fmt::Display for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.canonical_type,
            self.member.qualified_name(),
            self.member.declared_type()
        )
    }
}

/// Binding metadata for one member of `T`.
///
/// Immutable once built. Two definitions are equal when they describe the
/// same member of the same type.
pub struct PropertyDefinition<T> {
    info: Arc<PropertyInfo>,
    handle: MemberHandle<T>,
    handler: PropertyTypeHandler,
}

impl<T: PropertyContainer> PropertyDefinition<T> {
    /// Validates `handle` and builds its definition.
    pub fn new(handle: MemberHandle<T>, domain: &dyn BindingDomain, identity_only: bool) -> Result<Self> {
        let handler = PropertyTypeHandler::new(handle.info(), domain, identity_only)?;
        let info = Arc::new(PropertyInfo {
            member: handle.info().clone(),
            canonical_type: handler.canonical_type(),
            type_adapted: handler.is_type_adapted(),
        });
        Ok(Self {
            info,
            handle,
            handler,
        })
    }
}

impl<T> PropertyDefinition<T> {
    pub fn info(&self) -> &Arc<PropertyInfo> {
        &self.info
    }

    pub fn handle(&self) -> &MemberHandle<T> {
        &self.handle
    }

    pub fn handler(&self) -> &PropertyTypeHandler {
        &self.handler
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn qualified_name(&self) -> String {
        self.info.qualified_name()
    }

    pub fn class_name(&self) -> &'static str {
        self.info.class_name()
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.info.canonical_type()
    }

    /// The member's type as declared, before any adaptation.
    pub fn declared_type(&self) -> DeclaredType {
        self.info.declared_type()
    }

    /// Whether values of this property are `canonical` values.
    pub fn is_instance_of(&self, canonical: CanonicalType) -> bool {
        canonical.is_assignable_from(self.info.canonical_type())
    }

    pub fn is_readable(&self) -> bool {
        self.handle.is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.handle.is_writable()
    }

    pub fn is_type_adapted(&self) -> bool {
        self.info.is_type_adapted()
    }

    pub fn is_primary_key(&self) -> bool {
        self.info.is_primary_key()
    }

    pub fn column_name(&self) -> &str {
        self.info.column_name()
    }

    pub fn tags(&self) -> &MemberTags {
        self.handle.tags()
    }

    pub fn kind(&self) -> MemberKind {
        self.handle.kind()
    }

    /// Reads the property of `target` as a canonical value, adapting it if
    /// needed. The returned wrapper points back to this definition.
    ///
    /// # Errors
    ///
    /// - [`BindError::IllegalState`] if the member is not readable
    /// - [`BindError::AssertionFailure`] if built in identity-only mode
    /// - [`BindError::ConverterFailure`] if the converter fails
    pub fn read(&self, target: &T) -> Result<Option<WrapperRef>> {
        if !self.is_readable() {
            return Err(BindError::illegal_state(format!(
                "Attempt to read non-readable property {}",
                self.qualified_name()
            )));
        }
        let value = self.handler.read_canonical_value(&self.handle, target)?;
        if let Some(wrapper) = &value {
            wrapper.attach_definition(self.info.clone());
        }
        Ok(value)
    }

    /// Writes a canonical value into the property of `target`, adapting it
    /// if needed.
    pub fn write(&self, target: &mut T, value: Option<WrapperRef>) -> Result<()> {
        if !self.is_writable() {
            return Err(BindError::illegal_state(format!(
                "Attempt to write non-writable property {}",
                self.qualified_name()
            )));
        }
        if let Some(wrapper) = &value {
            wrapper.attach_definition(self.info.clone());
        }
        self.handler.write_canonical_value(&self.handle, target, value)
    }

    /// Reads the member's declared value, bypassing adaptation.
    pub fn raw_value(&self, target: &T) -> Result<Value> {
        self.handle.get(target)
    }

    /// Writes the member's declared value, bypassing adaptation.
    pub fn set_raw_value(&self, target: &mut T, value: Value) -> Result<()> {
        self.handle.set(target, value)
    }
}

impl<T> PartialEq for PropertyDefinition<T> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl<T> fmt::Display for PropertyDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.info.fmt(f)
    }
}

impl<T> fmt::Debug for PropertyDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("property", &self.info.qualified_name())
            .field("canonical_type", &self.info.canonical_type())
            .field("type_adapted", &self.info.is_type_adapted())
            .finish()
    }
}
