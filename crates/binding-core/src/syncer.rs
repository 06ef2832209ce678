//! Value syncers: keep a canonical value-wrapper in step with a member's
//! declared representation through a pair of one-way adaptors.

use std::sync::Arc;

use crate::convert::{Converter, ConverterSpec, Direction, SafeOneWayAdaptor};
use crate::error::{BindError, Result};
use crate::types::{CanonicalType, LiteralType};
use crate::value::{Value, WrapperRef};

fn instantiate(canonical: CanonicalType, property: &str) -> Result<WrapperRef> {
    canonical.instantiate().ok_or_else(|| {
        BindError::invalid_declared_type(format!(
            "Canonical type {canonical} must be concrete, on property {property}"
        ))
    })
}

/// Syncs a canonical value against an external value-wrapper.
///
/// Holds one live internal instance. Each conversion walks the source
/// wrapper graph with a [`CycleSafeConverter`], so wrappers that refer back to
/// themselves convert to equally self-referential targets.
pub struct ValueSyncer {
    property_name: String,
    canonical_type: CanonicalType,
    external_type: Option<CanonicalType>,
    internal: Option<WrapperRef>,
    to_internal: SafeOneWayAdaptor,
    to_external: SafeOneWayAdaptor,
}

impl ValueSyncer {
    /// Creates a syncer and its initial (null) internal instance.
    ///
    /// `external_type` is the canonical type of the member itself when it is
    /// declared as a value-wrapper; it is used to create an external instance
    /// when writing to a member that is currently unset.
    pub fn new(
        property_name: impl Into<String>,
        canonical_type: CanonicalType,
        internal_literal: LiteralType,
        external_literal: LiteralType,
        external_type: Option<CanonicalType>,
        spec: &ConverterSpec,
        converter: Arc<dyn Converter>,
    ) -> Result<Self> {
        let property_name = property_name.into();
        let to_external = SafeOneWayAdaptor::new(
            property_name.clone(),
            spec,
            converter.clone(),
            Direction::ToExternal,
            Some(internal_literal),
            Some(external_literal),
        )?;
        let to_internal = SafeOneWayAdaptor::new(
            property_name.clone(),
            spec,
            converter,
            Direction::ToInternal,
            Some(external_literal),
            Some(internal_literal),
        )?;
        let internal = Some(instantiate(canonical_type, &property_name)?);
        Ok(Self {
            property_name,
            canonical_type,
            external_type,
            internal,
            to_internal,
            to_external,
        })
    }

    /// A syncer with the same configuration and its own new internal
    /// instance.
    pub fn fresh(&self) -> Result<Self> {
        Ok(Self {
            property_name: self.property_name.clone(),
            canonical_type: self.canonical_type,
            external_type: self.external_type,
            internal: Some(instantiate(self.canonical_type, &self.property_name)?),
            to_internal: self.to_internal.clone(),
            to_external: self.to_external.clone(),
        })
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.canonical_type
    }

    pub fn internal(&self) -> Option<&WrapperRef> {
        self.internal.as_ref()
    }

    pub fn to_internal_adaptor(&self) -> &SafeOneWayAdaptor {
        &self.to_internal
    }

    pub fn to_external_adaptor(&self) -> &SafeOneWayAdaptor {
        &self.to_external
    }

    /// Replaces the internal instance.
    ///
    /// # Errors
    ///
    /// [`BindError::IllegalArgument`] if `internal` is not exactly of the
    /// syncer's canonical type.
    pub fn set_internal(&mut self, internal: Option<WrapperRef>) -> Result<()> {
        if let Some(wrapper) = &internal {
            if wrapper.canonical_type() != self.canonical_type {
                return Err(BindError::illegal_argument(format!(
                    "Cannot assign {} to {} property {}",
                    wrapper.canonical_type(),
                    self.canonical_type,
                    self.property_name
                )));
            }
        }
        self.internal = internal;
        Ok(())
    }

    /// Sets the internal instance from the external wrapper and returns it.
    /// A missing external wrapper clears the internal instance.
    pub fn internal_from_external(&mut self, external: Option<&WrapperRef>) -> Result<Option<WrapperRef>> {
        let Some(external) = external else {
            self.internal = None;
            return Ok(None);
        };
        let internal = match &self.internal {
            Some(internal) => internal.clone(),
            None => {
                let created = instantiate(self.canonical_type, &self.property_name)?;
                self.internal = Some(created.clone());
                created
            }
        };
        let mut converter = CycleSafeConverter::new(self.canonical_type, &self.to_internal);
        converter.set_target_from_source(&internal, external)?;
        Ok(Some(internal))
    }

    /// Copies the internal value into `external` and returns the wrapper that
    /// now holds the external representation.
    ///
    /// Returns `None` when there is no internal value. When `external` is
    /// `None` but there is an internal value, a new wrapper of the member's
    /// declared canonical type is created.
    pub fn external_from_internal(&self, external: Option<WrapperRef>) -> Result<Option<WrapperRef>> {
        let Some(internal) = &self.internal else {
            return Ok(None);
        };
        let external = match external {
            Some(external) => external,
            None => {
                let declared = self.external_type.ok_or_else(|| {
                    BindError::illegal_state(format!(
                        "No external value-wrapper type known for property {}",
                        self.property_name
                    ))
                })?;
                instantiate(declared, &self.property_name)?
            }
        };
        let mut converter = CycleSafeConverter::new(external.canonical_type(), &self.to_external);
        converter.set_target_from_source(&external, internal)?;
        Ok(Some(external))
    }
}

impl std::fmt::Debug for ValueSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueSyncer")
            .field("property", &self.property_name)
            .field("canonical_type", &self.canonical_type)
            .field("to_internal", &self.to_internal)
            .field("to_external", &self.to_external)
            .finish()
    }
}

/// Syncer for members declared as a plain value rather than a wrapper.
///
/// Converts the scalar directly through the one-way adaptors; there is no
/// wrapper graph to walk.
#[derive(Debug)]
pub struct SimpleValueSyncer {
    inner: ValueSyncer,
}

impl SimpleValueSyncer {
    pub fn new(
        property_name: impl Into<String>,
        canonical_type: CanonicalType,
        internal_literal: LiteralType,
        external_literal: LiteralType,
        spec: &ConverterSpec,
        converter: Arc<dyn Converter>,
    ) -> Result<Self> {
        Ok(Self {
            inner: ValueSyncer::new(
                property_name,
                canonical_type,
                internal_literal,
                external_literal,
                None,
                spec,
                converter,
            )?,
        })
    }

    pub fn fresh(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.fresh()?,
        })
    }

    pub fn canonical_type(&self) -> CanonicalType {
        self.inner.canonical_type
    }

    pub fn internal(&self) -> Option<&WrapperRef> {
        self.inner.internal()
    }

    pub fn set_internal(&mut self, internal: Option<WrapperRef>) -> Result<()> {
        self.inner.set_internal(internal)
    }

    /// Converts `external` and stores it in the internal instance, which is
    /// returned.
    pub fn internal_from_external_value(&mut self, external: Value) -> Result<WrapperRef> {
        let literal = self.inner.to_internal.convert(external)?;
        let internal = match &self.inner.internal {
            Some(internal) => internal.clone(),
            None => {
                let created = instantiate(self.inner.canonical_type, &self.inner.property_name)?;
                self.inner.internal = Some(created.clone());
                created
            }
        };
        internal.set_value(literal)?;
        Ok(internal)
    }

    /// The internal instance's value in the member's declared representation.
    /// A missing internal instance converts to null.
    pub fn external_value_from_internal(&self) -> Result<Value> {
        match &self.inner.internal {
            Some(internal) => self.inner.to_external.convert(internal.value()),
            None => Ok(Value::Null),
        }
    }
}

// ============================================================================
// Cycle-safe wrapper conversion
// ============================================================================

/// Converts wrapper graphs into wrappers of one target type, remembering
/// every (source, target) pair seen during a single conversion.
///
/// Sources are matched by identity, so a graph that refers back to an already
/// converted wrapper reuses that wrapper's target instead of recursing.
pub struct CycleSafeConverter<'a> {
    target_type: CanonicalType,
    adaptor: &'a SafeOneWayAdaptor,
    observed: Vec<(WrapperRef, WrapperRef)>,
}

impl<'a> CycleSafeConverter<'a> {
    pub fn new(target_type: CanonicalType, adaptor: &'a SafeOneWayAdaptor) -> Self {
        Self {
            target_type,
            adaptor,
            observed: Vec::new(),
        }
    }

    fn observed_target(&self, source: &WrapperRef) -> Option<&WrapperRef> {
        self.observed
            .iter()
            .find(|(seen, _)| seen.ptr_eq(source))
            .map(|(_, target)| target)
    }

    /// Converts `source` into a wrapper of the target type, reusing the
    /// target of an already converted source.
    pub fn convert(&mut self, source: &WrapperRef) -> Result<WrapperRef> {
        if let Some(target) = self.observed_target(source) {
            return Ok(target.clone());
        }
        let target = instantiate(self.target_type, "cycle-safe conversion")?;
        match self.set_target_from_source(&target, source) {
            Ok(()) => {
                tracing::debug!(adaptor = %self.adaptor, ?source, ?target, "Converted wrapper");
                Ok(target)
            }
            Err(e) => {
                tracing::debug!(adaptor = %self.adaptor, ?source, error = %e, "Wrapper conversion failed");
                Err(e)
            }
        }
    }

    /// Sets `target`'s value from `source`'s value. Nested wrapper values are
    /// converted recursively; other values go through the adaptor.
    pub fn set_target_from_source(&mut self, target: &WrapperRef, source: &WrapperRef) -> Result<()> {
        if target.canonical_type() != self.target_type {
            return Err(BindError::illegal_state(format!(
                "Conversion target is a {} but {} was expected",
                target.canonical_type(),
                self.target_type
            )));
        }
        if self.observed_target(source).is_some() {
            return Ok(());
        }
        self.observed.push((source.clone(), target.clone()));

        // The source lock is released before recursing; the graph may loop back.
        let value = source.value();
        let converted = match value {
            Value::Wrapper(nested) => Value::Wrapper(self.convert(&nested)?),
            other => self.adaptor.convert(other)?,
        };
        target.set_value(converted)
    }
}
