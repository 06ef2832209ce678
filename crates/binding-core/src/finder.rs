//! Member discovery.

use std::sync::Arc;

use crate::config::{BindingConfig, MemberKind, Visibility};
use crate::error::{BindError, Result};
use crate::member::{ClassSchema, MemberHandle, MemberInfo, PropertyContainer};

/// Decides which discovered members are kept.
pub trait MemberFilter: Send + Sync {
    fn accepts_member(&self, member: &MemberInfo) -> bool;
}

/// Accepts every member.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyMemberFilter;

impl MemberFilter for AnyMemberFilter {
    fn accepts_member(&self, _member: &MemberInfo) -> bool {
        true
    }
}

/// Filter backed by a closure.
pub struct FnMemberFilter<F>(pub F);

impl<F> MemberFilter for FnMemberFilter<F>
where
    F: Fn(&MemberInfo) -> bool + Send + Sync,
{
    fn accepts_member(&self, member: &MemberInfo) -> bool {
        (self.0)(member)
    }
}

/// Enumerates the bindable members of a [`PropertyContainer`].
///
/// Direct members come first: public ones, then less visible ones down to
/// the field visibility threshold, each group in declaration order. Accessor
/// pairs follow in declaration order. A direct member and an accessor pair
/// exposing the same underlying value are both returned; callers that need a
/// single representation must filter one of them out.
///
/// Synthetic members are always skipped.
#[derive(Clone)]
pub struct MemberFinder {
    field_visibility: Visibility,
    accessor_visibility: Visibility,
    kinds: Vec<MemberKind>,
    filter: Arc<dyn MemberFilter>,
}

impl MemberFinder {
    /// Creates a finder.
    ///
    /// # Errors
    ///
    /// [`BindError::UnsupportedCapability`] if `accessor_visibility` is
    /// anything other than [`Visibility::Public`].
    pub fn new(
        field_visibility: Visibility,
        accessor_visibility: Visibility,
        filter: Arc<dyn MemberFilter>,
        kinds: &[MemberKind],
    ) -> Result<Self> {
        if accessor_visibility > Visibility::Public {
            return Err(BindError::unsupported_capability(format!(
                "Scanning for {accessor_visibility} accessors is not supported, only public"
            )));
        }
        let kinds = if kinds.is_empty() {
            vec![MemberKind::Field, MemberKind::Accessor]
        } else {
            kinds.to_vec()
        };
        Ok(Self {
            field_visibility,
            accessor_visibility,
            kinds,
            filter,
        })
    }

    /// Creates a finder from binding configuration.
    pub fn from_config(config: &BindingConfig, filter: Arc<dyn MemberFilter>) -> Result<Self> {
        Self::new(
            config.field_visibility,
            config.accessor_visibility,
            filter,
            &config.member_kinds,
        )
    }

    /// Finder over every non-synthetic member of any visibility.
    pub fn all() -> Self {
        Self {
            field_visibility: Visibility::Private,
            accessor_visibility: Visibility::Public,
            kinds: vec![MemberKind::Field, MemberKind::Accessor],
            filter: Arc::new(AnyMemberFilter),
        }
    }

    /// Returns the members of `T` that pass visibility, kind and filter rules.
    pub fn find<T: PropertyContainer>(&self) -> Vec<MemberHandle<T>> {
        let declared = ClassSchema::<T>::collect();
        let mut found = Vec::with_capacity(declared.len());

        if self.kinds.contains(&MemberKind::Field) {
            let fields = || {
                declared
                    .iter()
                    .filter(|h| h.kind() == MemberKind::Field && !h.info().is_synthetic())
            };
            let public = fields().filter(|h| h.info().visibility() == Visibility::Public);
            let hidden = fields().filter(|h| {
                let visibility = h.info().visibility();
                visibility > Visibility::Public && self.field_visibility.includes(visibility)
            });
            found.extend(
                public
                    .chain(hidden)
                    .filter(|h| self.filter.accepts_member(h.info()))
                    .cloned(),
            );
        }

        if self.kinds.contains(&MemberKind::Accessor) {
            found.extend(
                declared
                    .iter()
                    .filter(|h| h.kind() == MemberKind::Accessor && !h.info().is_synthetic())
                    .filter(|h| self.accessor_visibility.includes(h.info().visibility()))
                    .filter(|h| self.filter.accepts_member(h.info()))
                    .cloned(),
            );
        }

        tracing::debug!(
            class = T::class_name(),
            declared = declared.len(),
            found = found.len(),
            "Discovered members"
        );
        found
    }
}

impl std::fmt::Debug for MemberFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberFinder")
            .field("field_visibility", &self.field_visibility)
            .field("accessor_visibility", &self.accessor_visibility)
            .field("kinds", &self.kinds)
            .finish()
    }
}
