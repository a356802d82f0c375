use std::collections::BTreeMap;
use std::sync::Arc;

use propset_adapters::{BeanPropertyStore, EntityPropertyStore};
use propset_store::{
    AggregatePropertyStore, CachingPropertyStore, MapPropertyStore, MemoryPropertyStore,
    PropertyStore,
};
use tracing::debug;

use crate::args::{
    StoreArgs, BEAN, BULKLOAD, ENTITY_ID, ENTITY_NAME, MAP, PROPERTY_SET, PROPERTY_SETS,
    REPOSITORY,
};
use crate::config::{StoreConfig, SERIALIZABLE_NAME};
use crate::error::{RegistryError, RegistryResult};

/// Builds one store from its configuration and arguments.
pub type StoreFactory = fn(&StoreConfig, &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>>;

/// Maps backend names to store factories.
///
/// [`StoreRegistry::with_defaults`] knows the built-in backends:
///
/// | name | arguments | config |
/// |------|-----------|--------|
/// | `memory` | | |
/// | `serializable` | | |
/// | `map` | `map` (optional) | |
/// | `aggregate` | `PropertySets` (optional) | |
/// | `cached` | `PropertySet`, `bulkload` (optional) | `serializableName` |
/// | `bean` | `bean` | |
/// | `entity` | `repository`, `entityName`, `entityId` | |
#[derive(Clone, Default)]
pub struct StoreRegistry {
    factories: BTreeMap<String, StoreFactory>,
}

impl StoreRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in backend.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("memory", build_memory);
        registry.register("serializable", build_serializable);
        registry.register("map", build_map);
        registry.register("aggregate", build_aggregate);
        registry.register("cached", build_cached);
        registry.register("bean", build_bean);
        registry.register("entity", build_entity);
        registry
    }

    /// Register `factory` under `name`, returning the factory it replaces.
    pub fn register(&mut self, name: impl Into<String>, factory: StoreFactory) -> Option<StoreFactory> {
        self.factories.insert(name.into(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct a new store of backend `name`.
    pub fn create(
        &self,
        name: &str,
        config: &StoreConfig,
        args: &StoreArgs,
    ) -> RegistryResult<Arc<dyn PropertyStore>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownBackend(name.to_string()))?;
        debug!(backend = name, "creating store");
        factory(config, args)
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

fn build_memory(_: &StoreConfig, _: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    Ok(Arc::new(MemoryPropertyStore::new()))
}

fn build_serializable(_: &StoreConfig, _: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    Ok(Arc::new(MemoryPropertyStore::serializable()))
}

fn build_map(_: &StoreConfig, args: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    let store = match args.map(MAP)? {
        Some(map) => MapPropertyStore::from_map(map),
        None => MapPropertyStore::new(),
    };
    Ok(Arc::new(store))
}

fn build_aggregate(_: &StoreConfig, args: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    Ok(Arc::new(AggregatePropertyStore::new(args.stores(PROPERTY_SETS)?)))
}

fn build_cached(config: &StoreConfig, args: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    let backing = args.store(PROPERTY_SET)?;
    let preload = args.flag(BULKLOAD)?.unwrap_or(false);
    let cache = match config.get_or(SERIALIZABLE_NAME, "memory") {
        "memory" => MemoryPropertyStore::new(),
        "serializable" => MemoryPropertyStore::serializable(),
        other => {
            return Err(RegistryError::Config {
                key: SERIALIZABLE_NAME.to_string(),
                reason: format!("cache backend must be memory or serializable, got {other:?}"),
            })
        }
    };
    Ok(Arc::new(CachingPropertyStore::with_cache(backing, cache, preload)?))
}

fn build_bean(_: &StoreConfig, args: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    Ok(Arc::new(BeanPropertyStore::new(args.bean(BEAN)?)))
}

fn build_entity(_: &StoreConfig, args: &StoreArgs) -> RegistryResult<Arc<dyn PropertyStore>> {
    let repo = args.repository(REPOSITORY)?;
    let entity_name = args.text(ENTITY_NAME)?;
    let entity_id = args.integer(ENTITY_ID)?;
    Ok(Arc::new(EntityPropertyStore::new(repo, entity_name, entity_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::StoreArg;
    use propset_adapters::InMemoryEntityRepository;
    use propset_store::StoreError;
    use propset_types::{Kind, PropertyObject};

    #[test]
    fn default_backend_names() {
        let registry = StoreRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["aggregate", "bean", "cached", "entity", "map", "memory", "serializable"]
        );
    }

    #[test]
    fn unknown_backend() {
        let registry = StoreRegistry::with_defaults();
        assert!(matches!(
            registry.create("jdbc", &StoreConfig::new(), &StoreArgs::new()),
            Err(RegistryError::UnknownBackend(name)) if name == "jdbc"
        ));
    }

    #[test]
    fn each_create_returns_a_new_instance() {
        let registry = StoreRegistry::with_defaults();
        let a = registry.create("memory", &StoreConfig::new(), &StoreArgs::new()).unwrap();
        let b = registry.create("memory", &StoreConfig::new(), &StoreArgs::new()).unwrap();
        a.set_int("n", 1).unwrap();
        assert!(!b.exists("n").unwrap());
    }

    #[test]
    fn serializable_backend_rejects_opaque_objects() {
        let registry = StoreRegistry::with_defaults();
        let store = registry
            .create("serializable", &StoreConfig::new(), &StoreArgs::new())
            .unwrap();
        assert!(matches!(
            store.set_object("live", PropertyObject::opaque(5u32)),
            Err(StoreError::IllegalValue { .. })
        ));
    }

    #[test]
    fn aggregate_over_members() {
        let registry = StoreRegistry::with_defaults();
        let first: Arc<dyn PropertyStore> = Arc::new(MemoryPropertyStore::new());
        let second: Arc<dyn PropertyStore> = Arc::new(MemoryPropertyStore::new());
        second.set_string("region", "eu-west").unwrap();

        let args = StoreArgs::new().with(PROPERTY_SETS, StoreArg::Stores(vec![first.clone(), second]));
        let agg = registry.create("aggregate", &StoreConfig::new(), &args).unwrap();
        assert_eq!(agg.get_string("region").unwrap().as_deref(), Some("eu-west"));

        agg.set_int("n", 3).unwrap();
        assert_eq!(first.get_int("n").unwrap(), 3);
    }

    #[test]
    fn cached_with_preload_and_serializable_cache() {
        let registry = StoreRegistry::with_defaults();
        let backing: Arc<dyn PropertyStore> = Arc::new(MemoryPropertyStore::new());
        backing.set_long("hits", 10).unwrap();
        let args = StoreArgs::new()
            .with(PROPERTY_SET, StoreArg::Store(backing.clone()))
            .with(BULKLOAD, StoreArg::Flag(true));
        let config = StoreConfig::new().with(SERIALIZABLE_NAME, "serializable");

        let cached = registry.create("cached", &config, &args).unwrap();
        backing.set_long("hits", 11).unwrap();
        assert_eq!(cached.get_long("hits").unwrap(), 10);
        assert!(matches!(
            cached.set_object("live", PropertyObject::opaque(())),
            Err(StoreError::IllegalValue { .. })
        ));
    }

    #[test]
    fn cached_rejects_unknown_cache_backend() {
        let registry = StoreRegistry::with_defaults();
        let args = StoreArgs::new().with(
            PROPERTY_SET,
            StoreArg::Store(Arc::new(MemoryPropertyStore::new())),
        );
        let config = StoreConfig::new().with(SERIALIZABLE_NAME, "redis");
        assert!(matches!(
            registry.create("cached", &config, &args),
            Err(RegistryError::Config { .. })
        ));
        assert!(matches!(
            registry.create("cached", &StoreConfig::new(), &StoreArgs::new()),
            Err(RegistryError::MissingArgument { .. })
        ));
    }

    #[test]
    fn entity_backend() {
        let registry = StoreRegistry::with_defaults();
        let repo = Arc::new(InMemoryEntityRepository::new());
        let args = StoreArgs::new()
            .with(REPOSITORY, StoreArg::Repository(repo.clone()))
            .with(ENTITY_NAME, StoreArg::Text("Account".into()))
            .with(ENTITY_ID, StoreArg::Integer(9));
        let store = registry.create("entity", &StoreConfig::new(), &args).unwrap();
        store.set_bool("active", true).unwrap();
        assert!(!store.supports_kind(Kind::Object));
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[test]
    fn custom_factory_replaces_builtin() {
        fn always_serializable(
            _: &StoreConfig,
            _: &StoreArgs,
        ) -> RegistryResult<Arc<dyn PropertyStore>> {
            Ok(Arc::new(MemoryPropertyStore::serializable()))
        }
        let mut registry = StoreRegistry::with_defaults();
        assert!(registry.register("memory", always_serializable).is_some());
        assert!(registry.register("custom", always_serializable).is_none());
        assert!(registry.contains("custom"));
    }
}
