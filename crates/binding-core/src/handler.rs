//! Type adaptation: validates, once per member, how a member's declared type
//! maps onto a canonical value-wrapper type, and wires the converter chain
//! used at read/write time.

use std::sync::Arc;

use crate::convert::NumericCast;
use crate::error::{BindError, Result};
use crate::finder::{AnyMemberFilter, MemberFilter};
use crate::member::{AdaptTag, MemberHandle, MemberInfo};
use crate::syncer::{SimpleValueSyncer, ValueSyncer};
use crate::types::{CanonicalType, DeclaredType, LiteralType};
use crate::value::{Value, WrapperRef};

/// Describes one family of canonical value-wrapper types.
///
/// A domain knows which canonical type stores each plain literal type, which
/// is how adapted members get their canonical type when none is given
/// explicitly.
pub trait BindingDomain: Send + Sync + 'static {
    /// Canonical type that naturally stores values of `literal`.
    fn inferred_canonical_type(&self, literal: &LiteralType) -> Option<CanonicalType>;

    /// Literal type held by instances of `canonical`.
    fn literal_type_of(&self, canonical: CanonicalType) -> LiteralType {
        canonical.literal_type()
    }

    /// Whether `literal` values can be stored in a `canonical` wrapper: the
    /// type inferred for `literal` must be `canonical`, a subtype or a
    /// supertype of it.
    fn is_literal_supported_by(&self, literal: &LiteralType, canonical: CanonicalType) -> bool {
        self.inferred_canonical_type(literal)
            .is_some_and(|inferred| inferred.is_related_to(canonical))
    }

    /// Filter applied to discovered members.
    fn member_filter(&self) -> Arc<dyn MemberFilter> {
        Arc::new(AnyMemberFilter)
    }
}

#[derive(Debug)]
enum Syncer {
    /// Member declared as a plain value
    Simple(SimpleValueSyncer),
    /// Member declared as a value-wrapper, adapted into another one
    Wrapper(ValueSyncer),
}

/// Validated adaptation state for one member.
#[derive(Debug)]
pub struct PropertyTypeHandler {
    qualified_name: String,
    canonical_type: CanonicalType,
    adapt: Option<AdaptTag>,
    identity_only: bool,
    syncer: Option<Syncer>,
}

impl PropertyTypeHandler {
    /// Validates `member` against `domain` and builds its converter chain.
    ///
    /// In identity-only mode the canonical type is still resolved and
    /// validated, but no converter is constructed and reads/writes are
    /// disabled.
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidDeclaredType`] for any configuration defect: a
    /// non-canonical member without an adapt tag, an abstract converter,
    /// multiply bounded converter types, wrapper types as converter bounds, a
    /// non-concrete or incompatible explicit canonical type, or a converter
    /// whose external type does not fit the member.
    pub fn new(member: &MemberInfo, domain: &dyn BindingDomain, identity_only: bool) -> Result<Self> {
        let qualified_name = member.qualified_name();
        let declared = member.declared_type();
        let invalid = |message: String| BindError::invalid_declared_type(format!("{message}, on {qualified_name}"));

        let Some(tag) = member.tags().adapt.clone() else {
            let canonical_type = declared.canonical().ok_or_else(|| {
                BindError::invalid_declared_type(format!(
                    "{declared} is not a supported type on {qualified_name}. Use one of the canonical \
                     value-wrapper types, or adapt the member through a converter"
                ))
            })?;
            return Ok(Self {
                qualified_name,
                canonical_type,
                adapt: None,
                identity_only,
                syncer: None,
            });
        };

        let spec = &tag.converter;
        if !spec.is_concrete() {
            return Err(invalid(format!("Converter {} must not be abstract", spec.name())));
        }
        if spec.external_bound().is_multi() || spec.internal_bound().is_multi() {
            return Err(invalid(format!(
                "Converter {} must not be declared with multiple bounds for one type",
                spec.name()
            )));
        }
        let external_bound = spec.external_bound().upper();
        let internal_bound = spec.internal_bound().upper();

        if external_bound.is_some_and(|t| t.is_canonical()) {
            return Err(invalid(format!(
                "Converter {}'s external type must not be a canonical value-wrapper",
                spec.name()
            )));
        }
        if internal_bound.is_some_and(|t| t.is_canonical()) {
            return Err(invalid(format!(
                "Converter {}'s internal type must not be a canonical value-wrapper",
                spec.name()
            )));
        }

        let explicit = tag.canonical_type;
        if let Some(explicit) = explicit {
            if !explicit.is_concrete() {
                return Err(invalid(format!(
                    "Explicit canonical type {explicit} must be a concrete type"
                )));
            }
        }

        if let Some(member_canonical) = declared.canonical() {
            if !member_canonical.is_concrete() {
                return Err(invalid(format!(
                    "Adapted member type {member_canonical} must be a concrete type"
                )));
            }
        }

        if let Some(external) = external_bound {
            match declared.canonical() {
                None => {
                    let member_type = declared.as_literal();
                    if !external.is_assignable_from(&member_type)
                        && NumericCast::find(&member_type, &external).is_none()
                    {
                        return Err(invalid(format!(
                            "Converter's external {external} type is not compatible with the member type {member_type}"
                        )));
                    }
                }
                Some(member_canonical) => {
                    if domain.inferred_canonical_type(&external).is_none() {
                        return Err(invalid(format!(
                            "Converter's external {external} type is not a supported simple type"
                        )));
                    }
                    if !domain.is_literal_supported_by(&external, member_canonical) {
                        return Err(invalid(format!(
                            "Converter's external {external} type is not compatible with a {member_canonical} member"
                        )));
                    }
                }
            }
        }

        let inferred = match internal_bound {
            Some(internal) => {
                let inferred = domain.inferred_canonical_type(&internal).ok_or_else(|| {
                    invalid(format!(
                        "Converter's internal {internal} type is not a supported simple type"
                    ))
                })?;
                if let Some(explicit) = explicit {
                    if !domain.is_literal_supported_by(&internal, explicit) {
                        return Err(invalid(format!(
                            "Converter's internal {internal} type is not compatible with {explicit}"
                        )));
                    }
                }
                Some(inferred)
            }
            None => None,
        };

        let canonical_type = explicit.or(inferred).ok_or_else(|| {
            invalid(format!(
                "Cannot determine the canonical type for converter {}; declare its internal type \
                 or give an explicit canonical type",
                spec.name()
            ))
        })?;

        if identity_only {
            return Ok(Self {
                qualified_name,
                canonical_type,
                adapt: Some(tag),
                identity_only,
                syncer: None,
            });
        }

        let converter = spec.instantiate(&qualified_name)?;
        let internal_literal = domain.literal_type_of(canonical_type);
        let syncer = match declared {
            DeclaredType::Canonical(member_canonical) => ValueSyncer::new(
                qualified_name.clone(),
                canonical_type,
                internal_literal,
                domain.literal_type_of(member_canonical),
                Some(member_canonical),
                spec,
                converter,
            )
            .map(Syncer::Wrapper),
            DeclaredType::Literal(member_type) => SimpleValueSyncer::new(
                qualified_name.clone(),
                canonical_type,
                internal_literal,
                member_type,
                spec,
                converter,
            )
            .map(Syncer::Simple),
        }
        .map_err(|e| match e {
            BindError::IllegalArgument { message } => BindError::invalid_declared_type(message),
            other => other,
        })?;

        tracing::debug!(
            property = %qualified_name,
            canonical = %canonical_type,
            converter = spec.name(),
            "Adapted member"
        );

        Ok(Self {
            qualified_name,
            canonical_type,
            adapt: Some(tag),
            identity_only,
            syncer: Some(syncer),
        })
    }

    /// Canonical type of values read from and written to the member.
    pub fn canonical_type(&self) -> CanonicalType {
        self.canonical_type
    }

    pub fn is_type_adapted(&self) -> bool {
        self.adapt.is_some()
    }

    pub fn is_identity_only(&self) -> bool {
        self.identity_only
    }

    pub fn adapt_tag(&self) -> Option<&AdaptTag> {
        self.adapt.as_ref()
    }

    fn check_full_access(&self, action: &str) -> Result<()> {
        if self.identity_only {
            return Err(BindError::assertion_failure(format!(
                "Attempt to {action} identity-only property {}",
                self.qualified_name
            )));
        }
        Ok(())
    }

    /// Reads the member of `target` as a canonical value.
    ///
    /// Adapted members produce a new wrapper on every call.
    pub fn read_canonical_value<T>(&self, handle: &MemberHandle<T>, target: &T) -> Result<Option<WrapperRef>> {
        self.check_full_access("read value from")?;
        match &self.syncer {
            None => match handle.get(target)? {
                Value::Null => Ok(None),
                Value::Wrapper(wrapper) => Ok(Some(wrapper)),
                other => Err(BindError::illegal_state(format!(
                    "Member {} holds {} rather than a {}",
                    self.qualified_name,
                    other.type_name(),
                    self.canonical_type
                ))),
            },
            Some(Syncer::Simple(template)) => {
                let external = handle.get(target)?;
                let mut syncer = template.fresh()?;
                syncer.internal_from_external_value(external).map(Some)
            }
            Some(Syncer::Wrapper(template)) => {
                let external = handle.get(target)?;
                let mut syncer = template.fresh()?;
                syncer.internal_from_external(external.as_wrapper())
            }
        }
    }

    /// Writes a canonical value into the member of `target`.
    pub fn write_canonical_value<T>(
        &self,
        handle: &MemberHandle<T>,
        target: &mut T,
        value: Option<WrapperRef>,
    ) -> Result<()> {
        self.check_full_access("write value to")?;
        match &self.syncer {
            None => {
                if let Some(wrapper) = &value {
                    if !self.canonical_type.is_assignable_from(wrapper.canonical_type()) {
                        return Err(BindError::illegal_argument(format!(
                            "Cannot assign {} to {} property {}",
                            wrapper.canonical_type(),
                            self.canonical_type,
                            self.qualified_name
                        )));
                    }
                }
                handle.set(target, Value::from(value))
            }
            Some(Syncer::Simple(template)) => {
                let mut syncer = template.fresh()?;
                syncer.set_internal(value)?;
                let external = syncer.external_value_from_internal()?;
                handle.set(target, external)
            }
            Some(Syncer::Wrapper(template)) => {
                let current = handle.get(target)?.as_wrapper().cloned();
                let mut syncer = template.fresh()?;
                syncer.set_internal(value)?;
                let updated = syncer.external_from_internal(current.clone())?;
                match (current, updated) {
                    (Some(_), None) => handle.set(target, Value::Null),
                    (None, Some(created)) => handle.set(target, Value::Wrapper(created)),
                    _ => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::ClassSchema;
    use crate::testing::{
        integer_ref, AbstractMemberModel, Account, AbstractConverterModel, IncompatibleExplicitModel,
        MultiBoundModel, TestDomain, UnadaptedModel, WrapperBoundModel, INTEGER, TEXT,
    };

    fn handler_for<T: crate::member::PropertyContainer>(name: &str) -> Result<PropertyTypeHandler> {
        let handles = ClassSchema::<T>::collect();
        let handle = handles
            .iter()
            .find(|h| h.name() == name)
            .expect("member declared");
        PropertyTypeHandler::new(handle.info(), &TestDomain, false)
    }

    #[test]
    fn test_wrapper_member_without_tag_is_not_adapted() {
        let handler = handler_for::<Account>("id").unwrap();
        assert!(!handler.is_type_adapted());
        assert_eq!(handler.canonical_type(), CanonicalType::of(&INTEGER));
    }

    #[test]
    fn test_adapted_member_infers_canonical_type() {
        let handler = handler_for::<Account>("balance").unwrap();
        assert!(handler.is_type_adapted());
        assert_eq!(handler.canonical_type(), CanonicalType::of(&INTEGER));

        let handler = handler_for::<Account>("legacy_code").unwrap();
        assert_eq!(handler.canonical_type(), CanonicalType::of(&TEXT));
    }

    #[test]
    fn test_plain_member_without_tag_rejected() {
        let err = handler_for::<UnadaptedModel>("note").unwrap_err();
        assert!(matches!(err, BindError::InvalidDeclaredType { .. }));
    }

    #[test]
    fn test_bad_converter_declarations_rejected() {
        for err in [
            handler_for::<AbstractConverterModel>("value").unwrap_err(),
            handler_for::<MultiBoundModel>("value").unwrap_err(),
            handler_for::<WrapperBoundModel>("value").unwrap_err(),
            handler_for::<IncompatibleExplicitModel>("value").unwrap_err(),
            handler_for::<AbstractMemberModel>("reading").unwrap_err(),
        ] {
            assert!(matches!(err, BindError::InvalidDeclaredType { .. }), "{err}");
        }
    }

    #[test]
    fn test_read_and_write_through_simple_syncer() {
        let handles = ClassSchema::<Account>::collect();
        let balance = handles.iter().find(|h| h.name() == "balance").unwrap();
        let handler = PropertyTypeHandler::new(balance.info(), &TestDomain, false).unwrap();

        let mut account = Account {
            balance: -1,
            ..Account::default()
        };
        let read = handler.read_canonical_value(balance, &account).unwrap().unwrap();
        assert_eq!(read.value(), Value::Long(-1));

        handler
            .write_canonical_value(balance, &mut account, Some(integer_ref(Some(i32::MAX as i64))))
            .unwrap();
        assert_eq!(account.balance, i32::MAX);
    }

    #[test]
    fn test_identity_only_handler_refuses_access() {
        let handles = ClassSchema::<Account>::collect();
        let id = &handles[0];
        let handler = PropertyTypeHandler::new(id.info(), &TestDomain, true).unwrap();
        let mut account = Account::default();
        assert!(matches!(
            handler.read_canonical_value(id, &account),
            Err(BindError::AssertionFailure { .. })
        ));
        assert!(matches!(
            handler.write_canonical_value(id, &mut account, None),
            Err(BindError::AssertionFailure { .. })
        ));
    }

    #[test]
    fn test_unadapted_write_checks_canonical_type() {
        let handles = ClassSchema::<Account>::collect();
        let id = &handles[0];
        let handler = PropertyTypeHandler::new(id.info(), &TestDomain, false).unwrap();
        let mut account = Account::default();
        let err = handler
            .write_canonical_value(id, &mut account, Some(crate::testing::composite_ref()))
            .unwrap_err();
        assert!(matches!(err, BindError::IllegalArgument { .. }));
    }
}
