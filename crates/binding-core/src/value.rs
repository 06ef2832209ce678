//! Literal values and the canonical value-wrapper contract.
//!
//! [`Value`] is the dynamic representation of anything that crosses a member
//! boundary. Canonical value-wrappers implement [`CanonicalValue`] and are
//! shared as [`WrapperRef`]s so that identity is preserved across reads,
//! writes and cycle-aware conversion.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::definition::PropertyInfo;
use crate::error::{BindError, Result};
use crate::types::{short_type_name, CanonicalType, LiteralType};

/// Dynamic literal value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// 16-bit signed integer
    Short(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// String value
    String(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// UUID value
    Uuid(Uuid),

    /// Date/time with timezone
    DateTime(DateTime<Utc>),

    /// Reference to a canonical value-wrapper instance
    Wrapper(WrapperRef),

    /// Application value of a type this layer does not interpret
    Opaque(OpaqueValue),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Literal type of this value, `None` for null.
    pub fn literal_type(&self) -> Option<LiteralType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => LiteralType::Bool,
            Self::Short(_) => LiteralType::Short,
            Self::Int(_) => LiteralType::Int,
            Self::Long(_) => LiteralType::Long,
            Self::Float(_) => LiteralType::Float,
            Self::Double(_) => LiteralType::Double,
            Self::String(_) => LiteralType::String,
            Self::Bytes(_) => LiteralType::Bytes,
            Self::Uuid(_) => LiteralType::Uuid,
            Self::DateTime(_) => LiteralType::DateTime,
            Self::Wrapper(w) => LiteralType::Canonical(w.canonical_type()),
            Self::Opaque(o) => LiteralType::Opaque(o.type_name()),
        })
    }

    /// Whether this value is an instance of `ty`. Null is an instance of
    /// every type.
    pub fn is_instance_of(&self, ty: &LiteralType) -> bool {
        if *ty == LiteralType::Any {
            return true;
        }
        match self.literal_type() {
            None => true,
            Some(actual) => ty.is_assignable_from(&actual),
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> String {
        match self.literal_type() {
            None => "null".to_string(),
            Some(t) => t.to_string(),
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Short(i) => Some(*i as i64),
            Self::Int(i) => Some(*i as i64),
            Self::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64, widening any number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Short(i) => Some(*i as f64),
            Self::Int(i) => Some(*i as f64),
            Self::Long(i) => Some(*i as f64),
            Self::Float(f) => Some(*f as f64),
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a DateTime.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Try to get this value as a canonical wrapper reference.
    pub fn as_wrapper(&self) -> Option<&WrapperRef> {
        match self {
            Self::Wrapper(w) => Some(w),
            _ => None,
        }
    }

    /// Try to get this value as an opaque application value.
    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Self::Opaque(o) => Some(o),
            _ => None,
        }
    }
}

impl From<Option<WrapperRef>> for Value {
    fn from(wrapper: Option<WrapperRef>) -> Self {
        wrapper.map_or(Value::Null, Value::Wrapper)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "bool[{b}]"),
            Self::Short(i) => write!(f, "i16[{i}]"),
            Self::Int(i) => write!(f, "i32[{i}]"),
            Self::Long(i) => write!(f, "i64[{i}]"),
            Self::Float(v) => write!(f, "f32[{v}]"),
            Self::Double(v) => write!(f, "f64[{v}]"),
            Self::String(s) => write!(f, "string[{s}]"),
            Self::Bytes(b) => write!(f, "bytes[{} bytes]", b.len()),
            Self::Uuid(u) => write!(f, "uuid[{u}]"),
            Self::DateTime(dt) => write!(f, "date_time[{}]", dt.to_rfc3339()),
            Self::Wrapper(w) => fmt::Debug::fmt(w, f),
            Self::Opaque(o) => write!(f, "{}[..]", short_type_name(o.type_name())),
        }
    }
}

// ============================================================================
// Opaque application values
// ============================================================================

/// Shared, type-erased application value.
///
/// Equality is by identity: two `OpaqueValue`s are equal only when they share
/// the same allocation.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn new<V: Any + Send + Sync>(value: V) -> Self {
        Self {
            type_name: std::any::type_name::<V>(),
            inner: Arc::new(value),
        }
    }

    /// The `LiteralType` that values of `V` report.
    pub fn literal_type_of<V: Any>() -> LiteralType {
        LiteralType::Opaque(std::any::type_name::<V>())
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.inner.downcast_ref::<V>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue({})", self.type_name)
    }
}

// ============================================================================
// Canonical value-wrapper contract
// ============================================================================

/// Proof that the framework, not an implementer, is attaching a property
/// definition to a wrapper. Only this crate can create one.
pub struct AttachToken(());

impl AttachToken {
    pub(crate) fn new() -> Self {
        Self(())
    }
}

/// Contract implemented by canonical value-wrapper types.
///
/// Most implementations embed a [`WrapperCore`] and delegate to it; only
/// `canonical_type` and `set_value` usually need real logic.
pub trait CanonicalValue: Send + 'static {
    /// The canonical type this instance belongs to.
    fn canonical_type(&self) -> CanonicalType;

    /// Current literal value (null when unset).
    fn value(&self) -> Value;

    /// Replaces the literal value. Implementations reject values of the wrong
    /// literal type with [`BindError::IllegalArgument`].
    fn set_value(&mut self, value: Value) -> Result<()>;

    fn is_null(&self) -> bool {
        self.value().is_null()
    }

    fn clear(&mut self);

    /// The property definition this instance was last read from or written
    /// through, if any.
    fn property_definition(&self) -> Option<&Arc<PropertyInfo>>;

    /// Called by the framework on every read and write.
    fn attach_definition(&mut self, definition: Arc<PropertyInfo>, token: AttachToken);
}

/// Reusable state for [`CanonicalValue`] implementations.
#[derive(Debug, Clone, Default)]
pub struct WrapperCore {
    literal: Value,
    definition: Option<Arc<PropertyInfo>>,
}

impl WrapperCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_literal(literal: Value) -> Self {
        Self {
            literal,
            definition: None,
        }
    }

    pub fn literal(&self) -> &Value {
        &self.literal
    }

    pub fn set_literal(&mut self, literal: Value) {
        self.literal = literal;
    }

    pub fn is_null(&self) -> bool {
        self.literal.is_null()
    }

    pub fn clear(&mut self) {
        self.literal = Value::Null;
    }

    pub fn definition(&self) -> Option<&Arc<PropertyInfo>> {
        self.definition.as_ref()
    }

    pub fn attach(&mut self, definition: Arc<PropertyInfo>, _token: AttachToken) {
        self.definition = Some(definition);
    }
}

/// Shared handle onto a canonical value-wrapper instance.
///
/// Cloning shares the instance. Equality is identity. The canonical type is
/// fixed at construction and readable without taking the lock.
#[derive(Clone)]
pub struct WrapperRef(Arc<WrapperCell>);

struct WrapperCell {
    canonical_type: CanonicalType,
    inner: Mutex<Box<dyn CanonicalValue>>,
}

impl WrapperRef {
    pub fn new<W: CanonicalValue>(wrapper: W) -> Self {
        Self(Arc::new(WrapperCell {
            canonical_type: wrapper.canonical_type(),
            inner: Mutex::new(Box::new(wrapper)),
        }))
    }

    pub fn lock(&self) -> MutexGuard<'_, Box<dyn CanonicalValue>> {
        self.0.inner.lock()
    }

    pub fn ptr_eq(&self, other: &WrapperRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.0.canonical_type
    }

    pub fn value(&self) -> Value {
        self.lock().value()
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        self.lock().set_value(value)
    }

    pub fn is_null(&self) -> bool {
        self.lock().is_null()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    pub fn property_definition(&self) -> Option<Arc<PropertyInfo>> {
        self.lock().property_definition().cloned()
    }

    pub(crate) fn attach_definition(&self, definition: Arc<PropertyInfo>) {
        self.lock()
            .attach_definition(definition, AttachToken::new());
    }
}

impl PartialEq for WrapperRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Wrappers may reference themselves, so only the type and address are shown.
impl fmt::Debug for WrapperRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = Arc::as_ptr(&self.0) as usize;
        write!(f, "{}@{addr:#x}", self.0.canonical_type)
    }
}

// ============================================================================
// Natural member types
// ============================================================================

/// Rust types that can be stored in a bound member.
///
/// Implemented for the scalar types [`Value`] can hold, for `Option` of any
/// of them, and for `Option<WrapperRef>`. Application types implement it by
/// going through [`OpaqueValue`].
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Literal type reported for members of this type.
    fn literal_type() -> LiteralType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &LiteralType, value: &Value) -> Result<T> {
    Err(BindError::illegal_argument(format!(
        "Cannot assign {} to a {expected} member",
        value.type_name()
    )))
}

macro_rules! scalar_field_value {
    ($ty:ty, $variant:ident, $literal:expr) => {
        impl FieldValue for $ty {
            fn literal_type() -> LiteralType {
                $literal
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => mismatch(&$literal, &other),
                }
            }
        }
    };
}

scalar_field_value!(bool, Bool, LiteralType::Bool);
scalar_field_value!(i16, Short, LiteralType::Short);
scalar_field_value!(i32, Int, LiteralType::Int);
scalar_field_value!(i64, Long, LiteralType::Long);
scalar_field_value!(f32, Float, LiteralType::Float);
scalar_field_value!(f64, Double, LiteralType::Double);
scalar_field_value!(String, String, LiteralType::String);
scalar_field_value!(Vec<u8>, Bytes, LiteralType::Bytes);
scalar_field_value!(Uuid, Uuid, LiteralType::Uuid);
scalar_field_value!(DateTime<Utc>, DateTime, LiteralType::DateTime);

impl<F: FieldValue> FieldValue for Option<F> {
    fn literal_type() -> LiteralType {
        F::literal_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => F::from_value(other).map(Some),
        }
    }
}

impl FieldValue for WrapperRef {
    /// Wrapper members declare their precise canonical type at registration.
    fn literal_type() -> LiteralType {
        LiteralType::Any
    }

    fn to_value(&self) -> Value {
        Value::Wrapper(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Wrapper(w) => Ok(w),
            other => mismatch(&LiteralType::Any, &other),
        }
    }
}
