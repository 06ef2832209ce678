//! Type descriptors for literal values, canonical value-wrappers and
//! converter bounds.
//!
//! Nothing here is discovered at runtime: a binding domain declares its
//! canonical types as static [`CanonicalTypeInfo`] descriptors, and every
//! converter declares its external/internal [`TypeBound`]s when it is
//! registered.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::WrapperRef;

/// Type of a literal value as seen by the adaptation machinery.
///
/// `Number` and `Any` are abstract: no value ever reports them, but they are
/// valid as converter bounds and accept every numeric / every value
/// respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    /// Any value at all
    Any,
    /// Any numeric value
    Number,
    /// Boolean
    Bool,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 floating point
    Float,
    /// 64-bit IEEE 754 floating point
    Double,
    /// UTF-8 string
    String,
    /// Binary data
    Bytes,
    /// UUID (128-bit)
    Uuid,
    /// Date/time with timezone (UTC)
    DateTime,
    /// A canonical value-wrapper instance
    Canonical(CanonicalType),
    /// An application type, identified by its Rust type name
    Opaque(&'static str),
}

impl LiteralType {
    /// Whether this is one of the concrete numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }

    /// Whether this is a canonical value-wrapper type.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }

    /// Whether a value of type `source` may be used where `self` is expected,
    /// without any coercion.
    pub fn is_assignable_from(&self, source: &LiteralType) -> bool {
        match (self, source) {
            (a, b) if a == b => true,
            (Self::Any, _) => true,
            (Self::Number, s) => s.is_numeric(),
            (Self::Canonical(a), Self::Canonical(b)) => a.is_assignable_from(*b),
            _ => false,
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Number => f.write_str("number"),
            Self::Bool => f.write_str("bool"),
            Self::Short => f.write_str("i16"),
            Self::Int => f.write_str("i32"),
            Self::Long => f.write_str("i64"),
            Self::Float => f.write_str("f32"),
            Self::Double => f.write_str("f64"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Uuid => f.write_str("uuid"),
            Self::DateTime => f.write_str("date_time"),
            Self::Canonical(c) => f.write_str(c.name()),
            Self::Opaque(name) => f.write_str(short_type_name(name)),
        }
    }
}

/// Strips the module path from a Rust type name, keeping generics intact.
pub(crate) fn short_type_name(name: &str) -> &str {
    let head = name.split('<').next().unwrap_or(name);
    match head.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

// ============================================================================
// Canonical value-wrapper types
// ============================================================================

/// Static description of a canonical value-wrapper type.
///
/// A binding domain declares one of these per wrapper type:
///
/// ```rust,ignore
/// pub static INTEGER: CanonicalTypeInfo = CanonicalTypeInfo {
///     name: "integer",
///     literal_type: LiteralType::Long,
///     parent: Some(&NUMBER),
///     constructor: Some(IntegerValue::new_ref),
/// };
/// ```
pub struct CanonicalTypeInfo {
    /// Unique name of the type within its domain
    pub name: &'static str,

    /// Literal type held by instances of this wrapper
    pub literal_type: LiteralType,

    /// Super-type, if this type refines another canonical type
    pub parent: Option<&'static CanonicalTypeInfo>,

    /// Creates an empty (null) instance; `None` marks the type as abstract
    pub constructor: Option<fn() -> WrapperRef>,
}

/// Cheap, copyable handle onto a [`CanonicalTypeInfo`].
#[derive(Clone, Copy)]
pub struct CanonicalType(&'static CanonicalTypeInfo);

impl CanonicalType {
    pub const fn of(info: &'static CanonicalTypeInfo) -> Self {
        Self(info)
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn literal_type(&self) -> LiteralType {
        self.0.literal_type
    }

    pub fn parent(&self) -> Option<CanonicalType> {
        self.0.parent.map(CanonicalType)
    }

    /// Concrete types can be instantiated.
    pub fn is_concrete(&self) -> bool {
        self.0.constructor.is_some()
    }

    /// Creates a new null instance, or `None` for abstract types.
    pub fn instantiate(&self) -> Option<WrapperRef> {
        self.0.constructor.map(|ctor| ctor())
    }

    /// True if `other` is this type or one of its descendants.
    pub fn is_assignable_from(&self, other: CanonicalType) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if ty == *self {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// True if either type is assignable from the other.
    pub fn is_related_to(&self, other: CanonicalType) -> bool {
        self.is_assignable_from(other) || other.is_assignable_from(*self)
    }
}

impl PartialEq for CanonicalType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0) || self.0.name == other.0.name
    }
}

impl Eq for CanonicalType {}

impl Hash for CanonicalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalType({})", self.0.name)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

// ============================================================================
// Member and converter type declarations
// ============================================================================

/// The type a member is declared with on its containing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// A plain Rust value (scalar or application type)
    Literal(LiteralType),
    /// A canonical value-wrapper
    Canonical(CanonicalType),
}

impl DeclaredType {
    pub fn canonical(&self) -> Option<CanonicalType> {
        match self {
            Self::Canonical(c) => Some(*c),
            Self::Literal(LiteralType::Canonical(c)) => Some(*c),
            Self::Literal(_) => None,
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical().is_some()
    }

    /// The literal type as seen by the one-way adaptors.
    pub fn as_literal(&self) -> LiteralType {
        match self {
            Self::Literal(l) => *l,
            Self::Canonical(c) => LiteralType::Canonical(*c),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(l) => l.fmt(f),
            Self::Canonical(c) => c.fmt(f),
        }
    }
}

/// Declared bound of one of a converter's type parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBound {
    /// Nothing is known about the type; validation is skipped
    Unbounded,
    /// Exactly one upper bound
    Single(LiteralType),
    /// Several upper bounds; rejected when binding a member
    Multi(Vec<LiteralType>),
}

impl TypeBound {
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(bounds) if bounds.len() > 1)
    }

    /// The single upper bound, if there is exactly one.
    pub fn upper(&self) -> Option<LiteralType> {
        match self {
            Self::Single(t) => Some(*t),
            Self::Multi(bounds) if bounds.len() == 1 => Some(bounds[0]),
            _ => None,
        }
    }

    /// All upper bounds, empty when unbounded.
    pub fn uppers(&self) -> &[LiteralType] {
        match self {
            Self::Unbounded => &[],
            Self::Single(t) => std::slice::from_ref(t),
            Self::Multi(bounds) => bounds,
        }
    }
}
