//! Member handles and the registration schema.
//!
//! Bindable types do not get introspected at runtime. Instead they implement
//! [`PropertyContainer`] and describe their members once, in declaration
//! order, through a [`ClassSchema`]:
//!
//! ```rust,ignore
//! impl PropertyContainer for Customer {
//!     fn describe(schema: &mut ClassSchema<Self>) {
//!         schema.wrapper_field("id", &INTEGER, |c| &c.id, |c| &mut c.id).primary_key();
//!         schema.field("year", |c| &c.year, |c| &mut c.year).adapt(ConverterSpec::of::<YearAsLong>());
//!         schema.synthetic("schema_version");
//!     }
//! }
//! ```

use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::config::{MemberKind, Visibility};
use crate::convert::ConverterSpec;
use crate::error::{BindError, Result};
use crate::types::{short_type_name, CanonicalType, CanonicalTypeInfo, DeclaredType};
use crate::value::{FieldValue, Value, WrapperRef};

/// A type whose members can be bound.
pub trait PropertyContainer: Sized + Send + Sync + 'static {
    /// Declares the members of this type, in declaration order.
    fn describe(schema: &mut ClassSchema<Self>);

    /// Name used in qualified member names and diagnostics.
    fn class_name() -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

// ============================================================================
// Declarative tags
// ============================================================================

/// Adaptation tag: binds a member through a converter.
#[derive(Debug, Clone)]
pub struct AdaptTag {
    /// Converter between the member's type and the canonical literal
    pub converter: ConverterSpec,

    /// Canonical type to use instead of the one inferred from the converter
    pub canonical_type: Option<CanonicalType>,
}

impl AdaptTag {
    pub fn new(converter: ConverterSpec) -> Self {
        Self {
            converter,
            canonical_type: None,
        }
    }

    pub fn with_canonical_type(mut self, canonical: &'static CanonicalTypeInfo) -> Self {
        self.canonical_type = Some(CanonicalType::of(canonical));
        self
    }
}

/// Declarative tags attached to a member at registration.
#[derive(Debug, Clone, Default)]
pub struct MemberTags {
    /// Adapt the member through a converter
    pub adapt: Option<AdaptTag>,

    /// Member is (part of) the identity of its container
    pub primary_key: bool,

    /// Name of the referenced container type
    pub foreign_key: Option<String>,

    /// Explicit external name
    pub column: Option<String>,

    /// Tags this layer does not interpret
    pub extra: BTreeMap<String, String>,
}

impl MemberTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_adapted(&self) -> bool {
        self.adapt.is_some()
    }
}

// ============================================================================
// Member metadata
// ============================================================================

/// Type-erased description of one declared member.
///
/// Identity is (declaring type, member name, kind); two members with the same
/// name on structurally identical but distinct types are different members.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    class_name: &'static str,
    class_id: TypeId,
    name: String,
    kind: MemberKind,
    visibility: Visibility,
    declared_type: DeclaredType,
    tags: MemberTags,
    readable: bool,
    writable: bool,
    synthetic: bool,
}

impl MemberInfo {
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn class_id(&self) -> TypeId {
        self.class_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Class.member`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.name)
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    pub fn tags(&self) -> &MemberTags {
        &self.tags
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_primary_key(&self) -> bool {
        self.tags.primary_key
    }
}

impl PartialEq for MemberInfo {
    fn eq(&self, other: &Self) -> bool {
        self.class_id == other.class_id && self.kind == other.kind && self.name == other.name
    }
}

impl Eq for MemberInfo {}

impl Hash for MemberInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_id.hash(state);
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}.{}",
            self.kind, self.declared_type, self.class_name, self.name
        )
    }
}

// ============================================================================
// Member handles
// ============================================================================

type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

/// Uniform get/set access to one member of `T`, direct or accessor pair.
pub struct MemberHandle<T> {
    info: Arc<MemberInfo>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

impl<T> MemberHandle<T> {
    pub fn info(&self) -> &Arc<MemberInfo> {
        &self.info
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn qualified_name(&self) -> String {
        self.info.qualified_name()
    }

    pub fn kind(&self) -> MemberKind {
        self.info.kind()
    }

    pub fn declared_type(&self) -> DeclaredType {
        self.info.declared_type()
    }

    pub fn tags(&self) -> &MemberTags {
        self.info.tags()
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the member's current value from `target`.
    pub fn get(&self, target: &T) -> Result<Value> {
        let getter = self.getter.as_ref().ok_or_else(|| {
            BindError::illegal_state(format!(
                "Attempt to read non-readable member {}",
                self.info.qualified_name()
            ))
        })?;
        Ok(getter(target))
    }

    /// Replaces the member's value on `target`.
    pub fn set(&self, target: &mut T, value: Value) -> Result<()> {
        let setter = self.setter.as_ref().ok_or_else(|| {
            BindError::illegal_state(format!(
                "Attempt to write non-writable member {}",
                self.info.qualified_name()
            ))
        })?;
        setter(target, value).map_err(|e| match e {
            BindError::IllegalArgument { message } => BindError::illegal_argument(format!(
                "{message}, on {}",
                self.info.qualified_name()
            )),
            other => other,
        })
    }
}

impl<T> Clone for MemberHandle<T> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T> PartialEq for MemberHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl<T> fmt::Debug for MemberHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHandle")
            .field("member", &self.info.qualified_name())
            .field("kind", &self.info.kind())
            .field("declared_type", &self.info.declared_type())
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

// ============================================================================
// Registration schema
// ============================================================================

struct PendingMember<T> {
    info: MemberInfo,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

/// Collects member declarations for one [`PropertyContainer`] type.
pub struct ClassSchema<T> {
    members: Vec<PendingMember<T>>,
}

impl<T: PropertyContainer> ClassSchema<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Describes `T` and returns its member handles in declaration order.
    pub(crate) fn collect() -> Vec<MemberHandle<T>> {
        let mut schema = Self::new();
        T::describe(&mut schema);
        schema
            .members
            .into_iter()
            .map(|pending| MemberHandle {
                info: Arc::new(pending.info),
                getter: pending.getter,
                setter: pending.setter,
            })
            .collect()
    }

    fn push(
        &mut self,
        name: &str,
        kind: MemberKind,
        visibility: Visibility,
        declared_type: DeclaredType,
        getter: Option<Getter<T>>,
        setter: Option<Setter<T>>,
    ) -> MemberDecl<'_> {
        self.members.push(PendingMember {
            info: MemberInfo {
                class_name: T::class_name(),
                class_id: TypeId::of::<T>(),
                name: name.to_string(),
                kind,
                visibility,
                declared_type,
                tags: MemberTags::default(),
                readable: getter.is_some(),
                writable: setter.is_some(),
                synthetic: false,
            },
            getter,
            setter,
        });
        let last = self.members.len() - 1;
        MemberDecl {
            info: &mut self.members[last].info,
        }
    }

    /// Declares a direct member holding a plain value. Private by default.
    pub fn field<F, G, M>(&mut self, name: &str, get: G, get_mut: M) -> MemberDecl<'_>
    where
        F: FieldValue,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let getter: Getter<T> = Arc::new(move |target| get(target).to_value());
        let setter: Setter<T> = Arc::new(move |target, value| {
            *get_mut(target) = F::from_value(value)?;
            Ok(())
        });
        self.push(
            name,
            MemberKind::Field,
            Visibility::Private,
            DeclaredType::Literal(F::literal_type()),
            Some(getter),
            Some(setter),
        )
    }

    /// Declares a direct member holding a canonical value-wrapper of type
    /// `canonical`. Private by default.
    pub fn wrapper_field<G, M>(
        &mut self,
        name: &str,
        canonical: &'static CanonicalTypeInfo,
        get: G,
        get_mut: M,
    ) -> MemberDecl<'_>
    where
        G: Fn(&T) -> &Option<WrapperRef> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<WrapperRef> + Send + Sync + 'static,
    {
        let declared = CanonicalType::of(canonical);
        let getter: Getter<T> = Arc::new(move |target| Value::from(get(target).clone()));
        let setter: Setter<T> = Arc::new(move |target, value| {
            *get_mut(target) = Self::checked_wrapper(declared, value)?;
            Ok(())
        });
        self.push(
            name,
            MemberKind::Field,
            Visibility::Private,
            DeclaredType::Canonical(declared),
            Some(getter),
            Some(setter),
        )
    }

    /// Rejects wrappers the member's declared canonical type cannot hold.
    fn checked_wrapper(declared: CanonicalType, value: Value) -> Result<Option<WrapperRef>> {
        let wrapper = Option::<WrapperRef>::from_value(value)?;
        if let Some(w) = &wrapper {
            if !declared.is_assignable_from(w.canonical_type()) {
                return Err(BindError::illegal_argument(format!(
                    "Cannot store a {} value-wrapper in a {} member",
                    w.canonical_type(),
                    declared
                )));
            }
        }
        Ok(wrapper)
    }

    fn accessor_parts<F, G, S>(get: Option<G>, set: Option<S>) -> (Option<Getter<T>>, Option<Setter<T>>)
    where
        F: FieldValue,
        G: Fn(&T) -> F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let getter = get.map(|get| Arc::new(move |target: &T| get(target).to_value()) as Getter<T>);
        let setter = set.map(|set| {
            Arc::new(move |target: &mut T, value: Value| {
                set(target, F::from_value(value)?);
                Ok(())
            }) as Setter<T>
        });
        (getter, setter)
    }

    /// Declares a public getter/setter pair.
    pub fn accessor<F, G, S>(&mut self, name: &str, get: G, set: S) -> MemberDecl<'_>
    where
        F: FieldValue,
        G: Fn(&T) -> F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let (getter, setter) = Self::accessor_parts(Some(get), Some(set));
        self.push(
            name,
            MemberKind::Accessor,
            Visibility::Public,
            DeclaredType::Literal(F::literal_type()),
            getter,
            setter,
        )
    }

    /// Declares a public getter without a matching setter.
    pub fn accessor_read_only<F, G>(&mut self, name: &str, get: G) -> MemberDecl<'_>
    where
        F: FieldValue,
        G: Fn(&T) -> F + Send + Sync + 'static,
    {
        let (getter, setter) = Self::accessor_parts(Some(get), None::<fn(&mut T, F)>);
        self.push(
            name,
            MemberKind::Accessor,
            Visibility::Public,
            DeclaredType::Literal(F::literal_type()),
            getter,
            setter,
        )
    }

    /// Declares a public setter without a matching getter.
    pub fn accessor_write_only<F, S>(&mut self, name: &str, set: S) -> MemberDecl<'_>
    where
        F: FieldValue,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        let (getter, setter) = Self::accessor_parts(None::<fn(&T) -> F>, Some(set));
        self.push(
            name,
            MemberKind::Accessor,
            Visibility::Public,
            DeclaredType::Literal(F::literal_type()),
            getter,
            setter,
        )
    }

    /// Declares a public getter/setter pair over a canonical value-wrapper.
    pub fn wrapper_accessor<G, S>(
        &mut self,
        name: &str,
        canonical: &'static CanonicalTypeInfo,
        get: G,
        set: S,
    ) -> MemberDecl<'_>
    where
        G: Fn(&T) -> Option<WrapperRef> + Send + Sync + 'static,
        S: Fn(&mut T, Option<WrapperRef>) + Send + Sync + 'static,
    {
        let declared = CanonicalType::of(canonical);
        let (getter, _) = Self::accessor_parts(Some(get), None::<fn(&mut T, Option<WrapperRef>)>);
        let setter: Setter<T> = Arc::new(move |target, value| {
            set(target, Self::checked_wrapper(declared, value)?);
            Ok(())
        });
        self.push(
            name,
            MemberKind::Accessor,
            Visibility::Public,
            DeclaredType::Canonical(declared),
            getter,
            Some(setter),
        )
    }

    /// Declares an internal bookkeeping member. Never discovered.
    pub fn synthetic(&mut self, name: &str) -> MemberDecl<'_> {
        let mut decl = self.push(
            name,
            MemberKind::Field,
            Visibility::Private,
            DeclaredType::Literal(crate::types::LiteralType::Any),
            None,
            None,
        );
        decl.info.synthetic = true;
        decl
    }
}

/// Tags and visibility for the member just declared.
pub struct MemberDecl<'a> {
    info: &'a mut MemberInfo,
}

impl MemberDecl<'_> {
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.info.visibility = visibility;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.info.tags.primary_key = true;
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.info.tags.column = Some(name.into());
        self
    }

    pub fn foreign_key(mut self, referenced: impl Into<String>) -> Self {
        self.info.tags.foreign_key = Some(referenced.into());
        self
    }

    /// Adapts the member through `converter`, inferring the canonical type.
    pub fn adapt(mut self, converter: ConverterSpec) -> Self {
        self.info.tags.adapt = Some(AdaptTag::new(converter));
        self
    }

    /// Adapts the member through `converter` into an explicit canonical type.
    pub fn adapt_as(mut self, converter: ConverterSpec, canonical: &'static CanonicalTypeInfo) -> Self {
        self.info.tags.adapt = Some(AdaptTag::new(converter).with_canonical_type(canonical));
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.tags.extra.insert(key.into(), value.into());
        self
    }

    /// Replaces all tags at once.
    pub fn tags(mut self, tags: MemberTags) -> Self {
        self.info.tags = tags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{integer_ref, text_ref, Account, Ledger, INTEGER, NUMBER};
    use crate::types::LiteralType;

    #[test]
    fn test_schema_preserves_declaration_order() {
        let handles = ClassSchema::<Account>::collect();
        let names: Vec<_> = handles.iter().map(|h| h.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["id", "owner", "balance", "legacy_code", "serial_version", "label", "audit"]
        );
    }

    #[test]
    fn test_member_metadata() {
        let handles = ClassSchema::<Account>::collect();
        let id = &handles[0];
        assert_eq!(id.qualified_name(), "Account.id");
        assert!(id.tags().primary_key);
        assert_eq!(
            id.declared_type(),
            DeclaredType::Canonical(CanonicalType::of(&INTEGER))
        );

        let owner = &handles[1];
        assert_eq!(owner.declared_type(), DeclaredType::Literal(LiteralType::String));
        assert_eq!(owner.tags().column.as_deref(), Some("owner_name"));
        assert_eq!(owner.info().visibility(), Visibility::Public);

        let serial = &handles[4];
        assert!(serial.info().is_synthetic());
        assert!(!serial.is_readable());
    }

    #[test]
    fn test_field_get_and_set() {
        let handles = ClassSchema::<Account>::collect();
        let owner = &handles[1];
        let mut account = Account::default();
        owner.set(&mut account, Value::String("ada".into())).unwrap();
        assert_eq!(account.owner, "ada");
        assert_eq!(owner.get(&account).unwrap(), Value::String("ada".into()));

        let err = owner.set(&mut account, Value::Int(3)).unwrap_err();
        assert!(matches!(err, BindError::IllegalArgument { .. }));
        assert!(err.to_string().contains("Account.owner"));
    }

    #[test]
    fn test_read_only_accessor() {
        let handles = ClassSchema::<Account>::collect();
        let label = handles.iter().find(|h| h.name() == "label").unwrap();
        assert!(label.is_readable());
        assert!(!label.is_writable());
        let mut account = Account::default();
        assert!(matches!(
            label.set(&mut account, Value::String("x".into())),
            Err(BindError::IllegalState { .. })
        ));

        let audit = handles.iter().find(|h| h.name() == "audit").unwrap();
        assert!(!audit.is_readable());
        assert!(matches!(audit.get(&account), Err(BindError::IllegalState { .. })));
        audit.set(&mut account, Value::String("checked".into())).unwrap();
        assert_eq!(account.audit_log, vec!["checked".to_string()]);
    }

    #[derive(Debug, Default)]
    struct Meter {
        reading: Option<WrapperRef>,
    }

    impl PropertyContainer for Meter {
        fn describe(schema: &mut ClassSchema<Self>) {
            schema.wrapper_accessor(
                "reading",
                &NUMBER,
                |m| m.reading.clone(),
                |m, reading| m.reading = reading,
            );
        }
    }

    #[test]
    fn test_wrapper_accessor_checks_canonical_type() {
        let handles = ClassSchema::<Meter>::collect();
        let reading = &handles[0];
        let mut meter = Meter::default();

        // integer is-a number
        reading.set(&mut meter, Value::Wrapper(integer_ref(Some(5)))).unwrap();
        assert_eq!(
            meter.reading.as_ref().unwrap().canonical_type(),
            CanonicalType::of(&INTEGER)
        );

        let err = reading
            .set(&mut meter, Value::Wrapper(text_ref("five")))
            .unwrap_err();
        assert!(matches!(err, BindError::IllegalArgument { .. }));
        assert_eq!(meter.reading.as_ref().unwrap().value(), Value::Long(5));
    }

    #[test]
    fn test_member_identity_includes_declaring_type() {
        let account = ClassSchema::<Account>::collect();
        let ledger = ClassSchema::<Ledger>::collect();
        let again = ClassSchema::<Account>::collect();
        assert_eq!(account[0], again[0]);
        assert_eq!(account[0].name(), ledger[0].name());
        assert_ne!(account[0], ledger[0]);
    }
}
