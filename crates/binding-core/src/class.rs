//! Class metadata: every property definition of one container type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{BindingConfig, FailurePolicy};
use crate::definition::PropertyDefinition;
use crate::error::{BindError, Result};
use crate::finder::MemberFinder;
use crate::handler::BindingDomain;
use crate::instance::InstanceMetadata;
use crate::member::PropertyContainer;

/// A member that was dropped while building class metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMember {
    /// Qualified member name
    pub member: String,
    /// Why the member could not be bound
    pub reason: String,
}

/// Cached binding metadata for one container type.
///
/// Built once and immutable afterwards, so it can be shared freely across
/// threads and across all instances of `T`.
pub struct ClassMetadata<T> {
    class_name: &'static str,
    identity_only: bool,
    definitions: Vec<Arc<PropertyDefinition<T>>>,
    by_name: HashMap<String, usize>,
    skipped: Vec<SkippedMember>,
}

impl<T: PropertyContainer> ClassMetadata<T> {
    /// Discovers and validates every member of `T`.
    ///
    /// Members that fail validation are handled according to the config's
    /// failure policy. Declaring more than one primary key always fails.
    pub fn build(domain: &dyn BindingDomain, config: &BindingConfig) -> Result<Self> {
        Self::build_with(domain, config, false)
    }

    /// Builds metadata restricted to the primary key members of `T`.
    ///
    /// Only identity information is available from the result; everything
    /// else fails with [`BindError::IllegalState`].
    pub fn build_identity_only(domain: &dyn BindingDomain, config: &BindingConfig) -> Result<Self> {
        Self::build_with(domain, config, true)
    }

    fn build_with(domain: &dyn BindingDomain, config: &BindingConfig, identity_only: bool) -> Result<Self> {
        let class_name = T::class_name();
        let finder = MemberFinder::from_config(config, domain.member_filter())?;

        let mut definitions = Vec::new();
        let mut skipped = Vec::new();
        for handle in finder.find::<T>() {
            if identity_only && !handle.tags().primary_key {
                continue;
            }
            let member = handle.qualified_name();
            match PropertyDefinition::new(handle, domain, identity_only) {
                Ok(definition) => definitions.push(Arc::new(definition)),
                Err(e) if config.failure_policy == FailurePolicy::Skip => {
                    tracing::warn!(%member, error = %e, "Skipping member that cannot be bound");
                    skipped.push(SkippedMember {
                        member,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let primary_keys: Vec<_> = definitions
            .iter()
            .filter(|d| d.is_primary_key())
            .map(|d| d.name().to_string())
            .collect();
        if primary_keys.len() > 1 {
            return Err(BindError::invalid_declared_type(format!(
                "{class_name} declares more than one primary key: {}",
                primary_keys.join(", ")
            )));
        }

        let by_name = definitions
            .iter()
            .enumerate()
            .map(|(idx, d)| (d.name().to_string(), idx))
            .collect();

        tracing::info!(
            class = class_name,
            definitions = definitions.len(),
            skipped = skipped.len(),
            identity_only,
            "Built class metadata"
        );

        Ok(Self {
            class_name,
            identity_only,
            definitions,
            by_name,
            skipped,
        })
    }

    /// Binds this metadata to one target object.
    pub fn instance_for(self: &Arc<Self>, target: Arc<RwLock<T>>) -> Result<InstanceMetadata<T>> {
        self.check_full_access()?;
        Ok(InstanceMetadata::new(self.clone(), target))
    }
}

impl<T> ClassMetadata<T> {
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn is_identity_only(&self) -> bool {
        self.identity_only
    }

    fn check_full_access(&self) -> Result<()> {
        if self.identity_only {
            return Err(BindError::illegal_state(format!(
                "Attempt to access non-identity information of identity-only metadata for {}",
                self.class_name
            )));
        }
        Ok(())
    }

    /// All property definitions, in discovery order.
    pub fn property_definitions(&self) -> Result<&[Arc<PropertyDefinition<T>>]> {
        self.check_full_access()?;
        Ok(&self.definitions)
    }

    pub fn property_definition_by_name(&self, name: &str) -> Result<Option<&Arc<PropertyDefinition<T>>>> {
        self.check_full_access()?;
        Ok(self.by_name.get(name).map(|&idx| &self.definitions[idx]))
    }

    /// Primary key definitions; available in both modes.
    pub fn primary_key_definitions(&self) -> Vec<&Arc<PropertyDefinition<T>>> {
        self.definitions.iter().filter(|d| d.is_primary_key()).collect()
    }

    /// Members dropped under [`FailurePolicy::Skip`].
    pub fn skipped_members(&self) -> &[SkippedMember] {
        &self.skipped
    }

    pub(crate) fn definitions(&self) -> &[Arc<PropertyDefinition<T>>] {
        &self.definitions
    }
}

impl<T> fmt::Debug for ClassMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMetadata")
            .field("class", &self.class_name)
            .field("identity_only", &self.identity_only)
            .field("definitions", &self.definitions)
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl<T> fmt::Display for ClassMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassMetadata<adapting:{}>", self.class_name)
    }
}
