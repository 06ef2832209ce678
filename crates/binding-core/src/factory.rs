//! Metadata factory: a thread-safe cache of class metadata.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::class::ClassMetadata;
use crate::config::BindingConfig;
use crate::error::{BindError, Result};
use crate::finder::MemberFinder;
use crate::handler::BindingDomain;
use crate::instance::InstanceMetadata;
use crate::member::PropertyContainer;

struct CacheEntry {
    class_name: &'static str,
    metadata: Arc<dyn Any + Send + Sync>,
}

/// Builds [`ClassMetadata`] once per type and hands out the cached result.
///
/// The cache lock is held across a build, so concurrent first requests for a
/// type never build it twice. Builds are rare and their results live for the
/// lifetime of the factory.
///
/// ```rust,ignore
/// let factory = MetadataFactory::new(DbTypeDomain, BindingConfig::default())?;
/// let customer = factory.class_metadata_for::<Customer>()?;
/// let instance = factory.instance_for(Arc::new(RwLock::new(Customer::default())))?;
/// ```
pub struct MetadataFactory {
    domain: Arc<dyn BindingDomain>,
    config: BindingConfig,
    cache: Mutex<HashMap<(TypeId, bool), CacheEntry>>,
    builds: AtomicUsize,
}

impl MetadataFactory {
    /// Creates an empty factory.
    ///
    /// # Errors
    ///
    /// [`BindError::UnsupportedCapability`] if `config` asks for something
    /// member discovery cannot do.
    pub fn new<D: BindingDomain>(domain: D, config: BindingConfig) -> Result<Self> {
        let domain: Arc<dyn BindingDomain> = Arc::new(domain);
        MemberFinder::from_config(&config, domain.member_filter())?;
        Ok(Self {
            domain,
            config,
            cache: Mutex::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        })
    }

    /// Creates an empty factory configured from a YAML or TOML file.
    ///
    /// # Errors
    ///
    /// - [`BindError::Config`] if the file cannot be read or parsed
    /// - [`BindError::UnsupportedCapability`] as for [`new`](Self::new)
    pub fn from_config_file<D: BindingDomain, P: AsRef<Path>>(domain: D, path: P) -> Result<Self> {
        let config = BindingConfig::from_file(path)?;
        tracing::debug!(?config, "Loaded binding configuration");
        Self::new(domain, config)
    }

    pub fn domain(&self) -> &Arc<dyn BindingDomain> {
        &self.domain
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Full metadata for `T`, built on first request.
    pub fn class_metadata_for<T: PropertyContainer>(&self) -> Result<Arc<ClassMetadata<T>>> {
        self.lookup_or_build::<T>(false)
    }

    /// Identity-only metadata for `T`, cached separately from the full one.
    pub fn identity_metadata_for<T: PropertyContainer>(&self) -> Result<Arc<ClassMetadata<T>>> {
        self.lookup_or_build::<T>(true)
    }

    /// Instance metadata for `target`, using the cached class metadata.
    pub fn instance_for<T: PropertyContainer>(&self, target: Arc<RwLock<T>>) -> Result<InstanceMetadata<T>> {
        self.class_metadata_for::<T>()?.instance_for(target)
    }

    /// Number of class metadata builds performed, successful or not.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Names of the types with cached metadata, sorted.
    pub fn cached_classes(&self) -> Vec<&'static str> {
        let cache = self.cache.lock();
        let mut names: Vec<_> = cache.values().map(|entry| entry.class_name).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn lookup_or_build<T: PropertyContainer>(&self, identity_only: bool) -> Result<Arc<ClassMetadata<T>>> {
        let key = (TypeId::of::<T>(), identity_only);
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(&key) {
            tracing::debug!(class = entry.class_name, identity_only, "Class metadata cache hit");
            return entry.metadata.clone().downcast::<ClassMetadata<T>>().map_err(|_| {
                BindError::illegal_state(format!(
                    "Cached metadata for {} has an unexpected type",
                    entry.class_name
                ))
            });
        }

        tracing::debug!(class = T::class_name(), identity_only, "Class metadata cache miss");
        self.builds.fetch_add(1, Ordering::SeqCst);
        let metadata = if identity_only {
            ClassMetadata::<T>::build_identity_only(self.domain.as_ref(), &self.config)?
        } else {
            ClassMetadata::<T>::build(self.domain.as_ref(), &self.config)?
        };
        let metadata = Arc::new(metadata);
        cache.insert(
            key,
            CacheEntry {
                class_name: T::class_name(),
                metadata: metadata.clone(),
            },
        );
        Ok(metadata)
    }
}

impl fmt::Debug for MetadataFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataFactory")
            .field("config", &self.config)
            .field("cached_classes", &self.cached_classes())
            .field("builds", &self.build_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, FailurePolicy, Visibility};
    use crate::testing::{Account, Ledger, TestDomain, TwoKeys};

    #[test]
    fn test_cache_returns_same_instance() {
        let factory = MetadataFactory::new(TestDomain, BindingConfig::default()).unwrap();
        let first = factory.class_metadata_for::<Account>().unwrap();
        let second = factory.class_metadata_for::<Account>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.build_count(), 1);
    }

    #[test]
    fn test_identity_metadata_cached_separately() {
        let factory = MetadataFactory::new(TestDomain, BindingConfig::default()).unwrap();
        let full = factory.class_metadata_for::<Account>().unwrap();
        let identity = factory.identity_metadata_for::<Account>().unwrap();
        assert!(!full.is_identity_only());
        assert!(identity.is_identity_only());
        assert_eq!(factory.build_count(), 2);
        assert_eq!(factory.cached_classes(), vec!["Account"]);

        factory.class_metadata_for::<Ledger>().unwrap();
        assert_eq!(factory.cached_classes(), vec!["Account", "Ledger"]);
    }

    #[test]
    fn test_failed_builds_are_not_cached() {
        let factory = MetadataFactory::new(TestDomain, BindingConfig::default()).unwrap();
        assert!(factory.class_metadata_for::<TwoKeys>().is_err());
        assert!(factory.class_metadata_for::<TwoKeys>().is_err());
        assert_eq!(factory.build_count(), 2);
        assert!(factory.cached_classes().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = BindingConfig::default().with_accessor_visibility(Visibility::Default);
        assert!(matches!(
            MetadataFactory::new(TestDomain, config),
            Err(BindError::UnsupportedCapability { .. })
        ));
    }

    #[test]
    fn test_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binding.yaml");
        std::fs::write(&path, "failure_policy: fail_fast\n").unwrap();
        let factory = MetadataFactory::from_config_file(TestDomain, &path).unwrap();
        assert_eq!(factory.config().failure_policy, FailurePolicy::FailFast);

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "failure_policy: sometimes\n").unwrap();
        assert!(matches!(
            MetadataFactory::from_config_file(TestDomain, &broken),
            Err(BindError::Config(ConfigError::YamlError(_)))
        ));
        assert!(matches!(
            MetadataFactory::from_config_file(TestDomain, dir.path().join("missing.toml")),
            Err(BindError::Config(ConfigError::IoError(_)))
        ));
    }

    #[test]
    fn test_instance_for_uses_cache() {
        let factory = MetadataFactory::new(TestDomain, BindingConfig::default()).unwrap();
        let target = Arc::new(RwLock::new(Account::default()));
        let instance = factory.instance_for(target.clone()).unwrap();
        let again = factory.instance_for(target).unwrap();
        assert!(Arc::ptr_eq(instance.class_metadata(), again.class_metadata()));
        assert_eq!(factory.build_count(), 1);
    }
}
