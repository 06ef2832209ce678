//! Instance metadata and properties: class metadata bound to one object.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::ClassMetadata;
use crate::definition::PropertyDefinition;
use crate::error::Result;
use crate::types::CanonicalType;
use crate::value::{Value, WrapperRef};

/// A property definition bound to one target object.
///
/// Cheap to create. Two properties are equal when they share a definition and
/// the very same target object; equal-valued but distinct targets do not
/// count.
pub struct Property<T> {
    definition: Arc<PropertyDefinition<T>>,
    target: Arc<RwLock<T>>,
}

impl<T> Property<T> {
    pub fn new(definition: Arc<PropertyDefinition<T>>, target: Arc<RwLock<T>>) -> Self {
        Self { definition, target }
    }

    pub fn definition(&self) -> &Arc<PropertyDefinition<T>> {
        &self.definition
    }

    pub fn target(&self) -> &Arc<RwLock<T>> {
        &self.target
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn qualified_name(&self) -> String {
        self.definition.qualified_name()
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.definition.canonical_type()
    }

    pub fn is_readable(&self) -> bool {
        self.definition.is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.definition.is_writable()
    }

    pub fn is_type_adapted(&self) -> bool {
        self.definition.is_type_adapted()
    }

    /// Reads the property as a canonical value.
    pub fn read(&self) -> Result<Option<WrapperRef>> {
        let target = self.target.read();
        self.definition.read(&target)
    }

    /// Writes a canonical value into the property.
    pub fn write(&self, value: Option<WrapperRef>) -> Result<()> {
        let mut target = self.target.write();
        self.definition.write(&mut target, value)
    }

    pub fn raw_value(&self) -> Result<Value> {
        let target = self.target.read();
        self.definition.raw_value(&target)
    }

    pub fn set_raw_value(&self, value: Value) -> Result<()> {
        let mut target = self.target.write();
        self.definition.set_raw_value(&mut target, value)
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition && Arc::ptr_eq(&self.target, &other.target)
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("definition", &self.definition)
            .field("target", &Arc::as_ptr(&self.target))
            .finish()
    }
}

impl<T> fmt::Display for Property<T> {
    /// Shows the definition and the raw member value. Never runs converters,
    /// and does not wait on a target that is currently locked for writing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.definition)?;
        let Some(target) = self.target.try_read() else {
            return f.write_str("<locked>");
        };
        match self.definition.raw_value(&target) {
            Ok(raw) => write!(f, "{raw}"),
            Err(_) => f.write_str("<unreadable>"),
        }
    }
}

/// Class metadata bound to one target object, with one [`Property`] per
/// definition.
pub struct InstanceMetadata<T> {
    class: Arc<ClassMetadata<T>>,
    target: Arc<RwLock<T>>,
    properties: Vec<Property<T>>,
}

impl<T> InstanceMetadata<T> {
    pub(crate) fn new(class: Arc<ClassMetadata<T>>, target: Arc<RwLock<T>>) -> Self {
        let properties = class
            .definitions()
            .iter()
            .map(|definition| Property::new(definition.clone(), target.clone()))
            .collect();
        Self {
            class,
            target,
            properties,
        }
    }

    pub fn class_metadata(&self) -> &Arc<ClassMetadata<T>> {
        &self.class
    }

    pub fn target(&self) -> &Arc<RwLock<T>> {
        &self.target
    }

    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    pub fn property_by_name(&self, name: &str) -> Option<&Property<T>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property_definitions(&self) -> &[Arc<PropertyDefinition<T>>] {
        self.class.definitions()
    }

    /// The property whose raw value is `wrapper` itself (by identity).
    pub fn property_of(&self, wrapper: &WrapperRef) -> Option<&Property<T>> {
        self.properties.iter().find(|property| {
            property.is_readable()
                && matches!(property.raw_value(), Ok(Value::Wrapper(held)) if held.ptr_eq(wrapper))
        })
    }
}

impl<T: PartialEq> PartialEq for InstanceMetadata<T> {
    fn eq(&self, other: &Self) -> bool {
        if !Arc::ptr_eq(&self.class, &other.class) {
            return false;
        }
        Arc::ptr_eq(&self.target, &other.target) || *self.target.read() == *other.target.read()
    }
}

impl<T> fmt::Debug for InstanceMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceMetadata")
            .field("class", &self.class.class_name())
            .field("properties", &self.properties.len())
            .finish()
    }
}
