//! Converters and the safe one-way adaptor.
//!
//! A [`Converter`] is user code that maps between a member's external
//! representation and the literal held by a canonical value-wrapper. It is
//! registered through a [`ConverterSpec`] that declares its external and
//! internal type bounds up front, so everything can be validated when class
//! metadata is built.
//!
//! [`SafeOneWayAdaptor`] wraps one direction of a converter with type checks,
//! automatic numeric widening/narrowing and uniform error wrapping.

use std::fmt;
use std::sync::Arc;

use crate::error::{BindError, Result};
use crate::types::{LiteralType, TypeBound};
use crate::value::Value;

/// Direction of a single conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the member's declared representation to the canonical value
    ToInternal,
    /// From the canonical value to the member's declared representation
    ToExternal,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToInternal => f.write_str("reading"),
            Self::ToExternal => f.write_str("writing"),
        }
    }
}

/// Bidirectional, user-supplied value converter.
///
/// Null values never reach a converter: the adaptor maps null to null
/// without calling it.
pub trait Converter: Send + Sync {
    /// Converts a value of the member's declared type into the canonical
    /// literal.
    fn to_internal(&self, external: Value) -> anyhow::Result<Value>;

    /// Converts a canonical literal back into the member's declared type.
    fn to_external(&self, internal: Value) -> anyhow::Result<Value>;
}

/// Converter types that declare their own name and bounds.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct YearAsText;
///
/// impl DeclaredConverter for YearAsText {
///     const NAME: &'static str = "YearAsText";
///     fn external_bound() -> TypeBound { TypeBound::Single(LiteralType::String) }
///     fn internal_bound() -> TypeBound { TypeBound::Single(LiteralType::Long) }
/// }
/// ```
pub trait DeclaredConverter: Converter + Default + 'static {
    const NAME: &'static str;

    fn external_bound() -> TypeBound;

    fn internal_bound() -> TypeBound;
}

type ConverterCtor = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Converter>> + Send + Sync>;

/// Registration record for a converter: its name, declared bounds and how to
/// construct it. A spec without a constructor describes an abstract
/// converter, which can never be bound.
#[derive(Clone)]
pub struct ConverterSpec {
    name: String,
    external: TypeBound,
    internal: TypeBound,
    constructor: Option<ConverterCtor>,
}

impl ConverterSpec {
    /// Spec for a converter type that declares its own bounds.
    pub fn of<C: DeclaredConverter>() -> Self {
        Self {
            name: C::NAME.to_string(),
            external: C::external_bound(),
            internal: C::internal_bound(),
            constructor: Some(Arc::new(|| Ok(Arc::new(C::default()) as Arc<dyn Converter>))),
        }
    }

    /// Spec with an explicit constructor, which may fail.
    pub fn new<F>(name: impl Into<String>, external: TypeBound, internal: TypeBound, ctor: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Converter>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            external,
            internal,
            constructor: Some(Arc::new(ctor)),
        }
    }

    /// Spec built from a pair of closures.
    pub fn from_fns<I, E>(
        name: impl Into<String>,
        external: TypeBound,
        internal: TypeBound,
        to_internal: I,
        to_external: E,
    ) -> Self
    where
        I: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
        E: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let converter: Arc<dyn Converter> = Arc::new(FnConverter {
            to_internal: Box::new(to_internal),
            to_external: Box::new(to_external),
        });
        Self::new(name, external, internal, move || Ok(converter.clone()))
    }

    /// Spec for an abstract converter (declared, but not constructible).
    pub fn abstract_converter(
        name: impl Into<String>,
        external: TypeBound,
        internal: TypeBound,
    ) -> Self {
        Self {
            name: name.into(),
            external,
            internal,
            constructor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_bound(&self) -> &TypeBound {
        &self.external
    }

    pub fn internal_bound(&self) -> &TypeBound {
        &self.internal
    }

    pub fn is_concrete(&self) -> bool {
        self.constructor.is_some()
    }

    /// Constructs the converter for use on `property`.
    pub fn instantiate(&self, property: &str) -> Result<Arc<dyn Converter>> {
        let ctor = self.constructor.as_ref().ok_or_else(|| {
            BindError::invalid_declared_type(format!(
                "Converter {} must not be abstract, on property {property}",
                self.name
            ))
        })?;
        ctor().map_err(|e| {
            BindError::invalid_declared_type(format!(
                "Converter {} could not be constructed, on property {property}: {e:#}",
                self.name
            ))
        })
    }
}

impl fmt::Debug for ConverterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSpec")
            .field("name", &self.name)
            .field("external", &self.external)
            .field("internal", &self.internal)
            .field("concrete", &self.is_concrete())
            .finish()
    }
}

type ConvertFn = Box<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

struct FnConverter {
    to_internal: ConvertFn,
    to_external: ConvertFn,
}

impl Converter for FnConverter {
    fn to_internal(&self, external: Value) -> anyhow::Result<Value> {
        (self.to_internal)(external)
    }

    fn to_external(&self, internal: Value) -> anyhow::Result<Value> {
        (self.to_external)(internal)
    }
}

// ============================================================================
// Numeric coercion
// ============================================================================

/// Automatic numeric widening/narrowing applied around a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericCast {
    ToShort,
    ToInt,
    ToLong,
    ToFloat,
    ToDouble,
}

const NUMERIC_CASTS: [NumericCast; 5] = [
    NumericCast::ToShort,
    NumericCast::ToInt,
    NumericCast::ToLong,
    NumericCast::ToFloat,
    NumericCast::ToDouble,
];

enum Number {
    Integral(i64),
    Floating(f64),
}

impl NumericCast {
    /// Finds the cast that turns `source` values into `target` values.
    ///
    /// Only applies when both sides are numeric and differ; abstract targets
    /// (`Number`, `Any`) never need one.
    pub fn find(source: &LiteralType, target: &LiteralType) -> Option<NumericCast> {
        if source == target || !(source.is_numeric() || *source == LiteralType::Number) {
            return None;
        }
        NUMERIC_CASTS
            .into_iter()
            .find(|cast| cast.target_type() == *target)
    }

    pub fn target_type(&self) -> LiteralType {
        match self {
            Self::ToShort => LiteralType::Short,
            Self::ToInt => LiteralType::Int,
            Self::ToLong => LiteralType::Long,
            Self::ToFloat => LiteralType::Float,
            Self::ToDouble => LiteralType::Double,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ToShort => "to_short",
            Self::ToInt => "to_int",
            Self::ToLong => "to_long",
            Self::ToFloat => "to_float",
            Self::ToDouble => "to_double",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        value.is_null() || value.literal_type().is_some_and(|t| t.is_numeric())
    }

    /// Casts with Rust `as` semantics: integers wrap, floats saturate.
    pub fn cast(&self, value: Value) -> Result<Value> {
        let number = match value {
            Value::Null => return Ok(Value::Null),
            Value::Short(v) => Number::Integral(v as i64),
            Value::Int(v) => Number::Integral(v as i64),
            Value::Long(v) => Number::Integral(v),
            Value::Float(v) => Number::Floating(v as f64),
            Value::Double(v) => Number::Floating(v),
            other => {
                return Err(BindError::illegal_argument(format!(
                    "Cannot cast {} with {}",
                    other.type_name(),
                    self.name()
                )))
            }
        };
        Ok(match (self, number) {
            (Self::ToShort, Number::Integral(i)) => Value::Short(i as i16),
            (Self::ToShort, Number::Floating(f)) => Value::Short(f as i16),
            (Self::ToInt, Number::Integral(i)) => Value::Int(i as i32),
            (Self::ToInt, Number::Floating(f)) => Value::Int(f as i32),
            (Self::ToLong, Number::Integral(i)) => Value::Long(i),
            (Self::ToLong, Number::Floating(f)) => Value::Long(f as i64),
            (Self::ToFloat, Number::Integral(i)) => Value::Float(i as f32),
            (Self::ToFloat, Number::Floating(f)) => Value::Float(f as f32),
            (Self::ToDouble, Number::Integral(i)) => Value::Double(i as f64),
            (Self::ToDouble, Number::Floating(f)) => Value::Double(f),
        })
    }
}

// ============================================================================
// Safe one-way adaptor
// ============================================================================

/// One direction of a converter, with type checking and numeric coercion.
#[derive(Clone)]
pub struct SafeOneWayAdaptor {
    property_name: String,
    converter_name: String,
    direction: Direction,
    converter: Arc<dyn Converter>,
    source_type: Option<LiteralType>,
    source_cast: Option<NumericCast>,
    target_type: Option<LiteralType>,
    target_cast: Option<NumericCast>,
}

impl SafeOneWayAdaptor {
    /// Builds an adaptor for `direction` of `converter`.
    ///
    /// When `source_type` is given it must be accepted by the converter's
    /// declared source bound, directly or through a numeric cast. When
    /// `target_type` is given, the converter's declared target bound must be
    /// convertible to it. Without a caller type, the declared bound (if
    /// single) is used for runtime checks.
    ///
    /// # Errors
    ///
    /// [`BindError::IllegalArgument`] when a caller type is incompatible with
    /// the corresponding declared bound.
    pub fn new(
        property_name: impl Into<String>,
        spec: &ConverterSpec,
        converter: Arc<dyn Converter>,
        direction: Direction,
        source_type: Option<LiteralType>,
        target_type: Option<LiteralType>,
    ) -> Result<Self> {
        let property_name = property_name.into();
        let (source_bound, target_bound) = match direction {
            Direction::ToExternal => (spec.internal_bound(), spec.external_bound()),
            Direction::ToInternal => (spec.external_bound(), spec.internal_bound()),
        };

        let incompatible = |ty: &LiteralType| {
            BindError::illegal_argument(format!(
                "Converter {} cannot be used with {ty} values, on property {property_name}",
                spec.name()
            ))
        };

        let (source_type, source_cast) = match source_type {
            Some(src) if !source_bound.uppers().is_empty() => {
                let cast = source_bound
                    .uppers()
                    .iter()
                    .find_map(|bound| {
                        if bound.is_assignable_from(&src) {
                            Some(None)
                        } else {
                            NumericCast::find(&src, bound).map(Some)
                        }
                    })
                    .ok_or_else(|| incompatible(&src))?;
                (Some(src), cast)
            }
            Some(src) => (Some(src), None),
            None => (source_bound.upper(), None),
        };

        let (target_type, target_cast) = match target_type {
            Some(tgt) if !target_bound.uppers().is_empty() => {
                let cast = target_bound
                    .uppers()
                    .iter()
                    .find_map(|bound| {
                        if tgt.is_assignable_from(bound) {
                            Some(None)
                        } else {
                            NumericCast::find(bound, &tgt).map(Some)
                        }
                    })
                    .ok_or_else(|| incompatible(&tgt))?;
                (Some(tgt), cast)
            }
            Some(tgt) => (Some(tgt), None),
            None => (target_bound.upper(), None),
        };

        Ok(Self {
            property_name,
            converter_name: spec.name().to_string(),
            direction,
            converter,
            source_type,
            source_cast,
            target_type,
            target_cast,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Expected type of values passed to [`convert`](Self::convert).
    pub fn source_type(&self) -> Option<LiteralType> {
        self.source_type
    }

    /// Type of converted values, after any numeric cast.
    pub fn target_type(&self) -> Option<LiteralType> {
        self.target_type
    }

    /// Converts `value` in the configured direction.
    ///
    /// # Errors
    ///
    /// - [`BindError::IllegalArgument`] if the input or output has the wrong type
    /// - [`BindError::ConverterFailure`] if the converter itself fails
    pub fn convert(&self, value: Value) -> Result<Value> {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return self.convert_checked(value);
        }
        let input = value.to_string();
        match self.convert_checked(value) {
            Ok(result) => {
                tracing::debug!(adaptor = %self, %input, output = %result, "Converted value");
                Ok(result)
            }
            Err(e) => {
                tracing::debug!(adaptor = %self, %input, error = %e, "Conversion failed");
                Err(e)
            }
        }
    }

    fn convert_checked(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        // validate source
        let accepted = match (&self.source_cast, &self.source_type) {
            (Some(cast), _) => cast.accepts(&value),
            (None, Some(ty)) => value.is_instance_of(ty),
            (None, None) => true,
        };
        if !accepted {
            return Err(BindError::illegal_argument(format!(
                "Cannot pass {} to {}, on property {}",
                value.type_name(),
                self.method_name(),
                self.property_name
            )));
        }

        let value = match &self.source_cast {
            Some(cast) => cast.cast(value)?,
            None => value,
        };

        let converted = match self.direction {
            Direction::ToInternal => self.converter.to_internal(value),
            Direction::ToExternal => self.converter.to_external(value),
        }
        .map_err(|source| BindError::ConverterFailure {
            property: self.property_name.clone(),
            direction: self.direction,
            converter: self.converter_name.clone(),
            source,
        })?;

        let result = match &self.target_cast {
            Some(cast) => cast.cast(converted)?,
            None => converted,
        };

        if let Some(ty) = &self.target_type {
            if !result.is_instance_of(ty) {
                return Err(BindError::illegal_argument(format!(
                    "Cannot cast {} to {ty}, on property {}",
                    result.type_name(),
                    self.property_name
                )));
            }
        }
        Ok(result)
    }

    fn method_name(&self) -> String {
        match self.direction {
            Direction::ToInternal => format!("{}::to_internal()", self.converter_name),
            Direction::ToExternal => format!("{}::to_external()", self.converter_name),
        }
    }
}

impl fmt::Display for SafeOneWayAdaptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_type {
            Some(t) => write!(f, "{t}-->")?,
            None => f.write_str("unknown-->")?,
        }
        if let Some(cast) = &self.source_cast {
            write!(f, "({})-->", cast.name())?;
        }
        write!(f, "{}-->", self.converter_name)?;
        if let Some(cast) = &self.target_cast {
            write!(f, "({})-->", cast.name())?;
        }
        match &self.target_type {
            Some(t) => write!(f, "{t}"),
            None => f.write_str("unknown"),
        }
    }
}

impl fmt::Debug for SafeOneWayAdaptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SafeOneWayAdaptor({self}, property={})", self.property_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::long_identity_spec;

    fn adaptor(
        direction: Direction,
        source: Option<LiteralType>,
        target: Option<LiteralType>,
    ) -> Result<SafeOneWayAdaptor> {
        let spec = long_identity_spec();
        let converter = spec.instantiate("Test.value")?;
        SafeOneWayAdaptor::new("Test.value", &spec, converter, direction, source, target)
    }

    #[test]
    fn test_numeric_cast_lookup() {
        assert_eq!(
            NumericCast::find(&LiteralType::Int, &LiteralType::Long),
            Some(NumericCast::ToLong)
        );
        assert_eq!(
            NumericCast::find(&LiteralType::Long, &LiteralType::Int),
            Some(NumericCast::ToInt)
        );
        assert_eq!(NumericCast::find(&LiteralType::Long, &LiteralType::Long), None);
        assert_eq!(NumericCast::find(&LiteralType::String, &LiteralType::Long), None);
        assert_eq!(NumericCast::find(&LiteralType::Int, &LiteralType::Number), None);
    }

    #[test]
    fn test_numeric_cast_semantics() {
        assert_eq!(
            NumericCast::ToInt.cast(Value::Long(i64::from(i32::MAX) + 1)).unwrap(),
            Value::Int(i32::MIN)
        );
        assert_eq!(NumericCast::ToLong.cast(Value::Int(-1)).unwrap(), Value::Long(-1));
        assert_eq!(NumericCast::ToDouble.cast(Value::Float(1.5)).unwrap(), Value::Double(1.5));
        assert_eq!(NumericCast::ToShort.cast(Value::Null).unwrap(), Value::Null);
        assert!(NumericCast::ToInt.cast(Value::String("1".into())).is_err());
    }

    #[test]
    fn test_widening_into_converter() {
        let to_internal = adaptor(
            Direction::ToInternal,
            Some(LiteralType::Int),
            Some(LiteralType::Long),
        )
        .unwrap();
        assert_eq!(to_internal.convert(Value::Int(7)).unwrap(), Value::Long(7));
        assert_eq!(to_internal.to_string(), "i32-->(to_long)-->LongIdentity-->i64");
    }

    #[test]
    fn test_narrowing_out_of_converter() {
        let to_external = adaptor(
            Direction::ToExternal,
            Some(LiteralType::Long),
            Some(LiteralType::Int),
        )
        .unwrap();
        assert_eq!(to_external.convert(Value::Long(-1)).unwrap(), Value::Int(-1));
        assert_eq!(to_external.target_type(), Some(LiteralType::Int));
    }

    #[test]
    fn test_convert_with_and_without_debug_logging() {
        let to_internal = adaptor(Direction::ToInternal, Some(LiteralType::Int), None).unwrap();
        let quiet = to_internal.convert(Value::Int(-3)).unwrap();

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let logged = tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
            to_internal.convert(Value::Int(-3)).unwrap()
        });

        assert_eq!(quiet, Value::Long(-3));
        assert_eq!(logged, quiet);
    }

    #[test]
    fn test_incompatible_caller_type_rejected() {
        let err = adaptor(Direction::ToInternal, Some(LiteralType::String), None).unwrap_err();
        assert!(matches!(err, BindError::IllegalArgument { .. }));
    }

    #[test]
    fn test_wrong_input_type_rejected_at_runtime() {
        let to_internal = adaptor(Direction::ToInternal, None, None).unwrap();
        let err = to_internal.convert(Value::String("x".into())).unwrap_err();
        assert!(matches!(err, BindError::IllegalArgument { .. }));
    }

    #[test]
    fn test_null_bypasses_converter() {
        let spec = ConverterSpec::from_fns(
            "Failing",
            TypeBound::Single(LiteralType::String),
            TypeBound::Single(LiteralType::String),
            |_| anyhow::bail!("should not be called"),
            |_| anyhow::bail!("should not be called"),
        );
        let converter = spec.instantiate("Test.value").unwrap();
        let adaptor = SafeOneWayAdaptor::new(
            "Test.value",
            &spec,
            converter,
            Direction::ToInternal,
            None,
            None,
        )
        .unwrap();
        assert_eq!(adaptor.convert(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_converter_error_is_wrapped() {
        let spec = ConverterSpec::from_fns(
            "Failing",
            TypeBound::Single(LiteralType::String),
            TypeBound::Single(LiteralType::Long),
            |_| anyhow::bail!("not a number"),
            |v| Ok(v),
        );
        let converter = spec.instantiate("Customer.year").unwrap();
        let adaptor = SafeOneWayAdaptor::new(
            "Customer.year",
            &spec,
            converter,
            Direction::ToInternal,
            Some(LiteralType::String),
            Some(LiteralType::Long),
        )
        .unwrap();

        let err = adaptor.convert(Value::String("abc".into())).unwrap_err();
        match err {
            BindError::ConverterFailure {
                property,
                direction,
                converter,
                source,
            } => {
                assert_eq!(property, "Customer.year");
                assert_eq!(direction, Direction::ToInternal);
                assert_eq!(converter, "Failing");
                assert_eq!(source.to_string(), "not a number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_converter_returning_wrong_type_rejected() {
        let spec = ConverterSpec::from_fns(
            "Liar",
            TypeBound::Single(LiteralType::String),
            TypeBound::Single(LiteralType::Long),
            |_| Ok(Value::String("oops".into())),
            |v| Ok(v),
        );
        let converter = spec.instantiate("Test.value").unwrap();
        let adaptor = SafeOneWayAdaptor::new(
            "Test.value",
            &spec,
            converter,
            Direction::ToInternal,
            None,
            None,
        )
        .unwrap();
        assert!(matches!(
            adaptor.convert(Value::String("1".into())),
            Err(BindError::IllegalArgument { .. })
        ));
    }

    #[test]
    fn test_abstract_converter_cannot_be_instantiated() {
        let spec = ConverterSpec::abstract_converter(
            "Abstract",
            TypeBound::Single(LiteralType::String),
            TypeBound::Single(LiteralType::Long),
        );
        assert!(!spec.is_concrete());
        assert!(matches!(
            spec.instantiate("Test.value"),
            Err(BindError::InvalidDeclaredType { .. })
        ));
    }
}
