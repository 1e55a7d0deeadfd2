//! Dependency injection module using Shaku.
//!
//! `CacheModule` holds the store-facing singletons: the store client, the key
//! registry and the session manager. Catalog services are assembled on top of
//! it by [`Services::assemble`] because their repositories are supplied by the
//! caller.

use crate::admin::CacheAdminService;
use crate::cache::{
    create_pool, CacheAside, KeyRegistry, RedisStoreClient, RedisStoreClientParameters,
    StoreClient, TrackedKeyRegistry,
};
use crate::catalog::{CategoryService, CategoryServiceImpl, ProductService, ProductServiceImpl};
use crate::session::{
    SessionGate, SessionManager, SessionManagerComponent, SessionManagerComponentParameters,
};
use bazaar_config::{AppConfig, CacheConfig};
use bazaar_core::{module, BazaarResult, HasComponent};
use bazaar_repository::{CategoryRepository, ProductRepository};
use std::sync::Arc;
use tracing::{info, warn};

module! {
    pub CacheModule {
        components = [
            RedisStoreClient,
            TrackedKeyRegistry,
            SessionManagerComponent,
        ],
        providers = [],
    }
}

/// Builds the cache module from configuration and loads the key registry.
///
/// An unreachable store is logged, not fatal: every operation that needs it
/// will report `StoreUnavailable` until it comes back.
pub async fn build_cache_module(config: &AppConfig) -> BazaarResult<Arc<CacheModule>> {
    let pool = if config.store.enabled {
        Some(Arc::new(create_pool(&config.store)?))
    } else {
        None
    };

    let module = CacheModule::builder()
        .with_component_parameters::<RedisStoreClient>(RedisStoreClientParameters { pool })
        .with_component_parameters::<SessionManagerComponent>(SessionManagerComponentParameters {
            session_ttl: config.session.ttl(),
            password_reset_ttl: config.session.password_reset_ttl(),
        })
        .build();

    let store: Arc<dyn StoreClient> = module.resolve();
    if let Err(e) = store.ping().await {
        warn!("Key-value store is not reachable at startup: {}", e);
    }

    let registry: Arc<dyn KeyRegistry> = module.resolve();
    registry.load().await;

    info!("Cache module ready");
    Ok(Arc::new(module))
}

/// Every service the layer exposes, wired to one store and one registry.
#[derive(Clone)]
pub struct Services {
    pub products: Arc<dyn ProductService>,
    pub categories: Arc<dyn CategoryService>,
    pub sessions: Arc<dyn SessionManager>,
    pub gate: SessionGate,
    pub admin: Arc<CacheAdminService>,
}

impl Services {
    /// Assembles the services on top of a module's store, registry and session manager.
    pub fn assemble<M>(
        module: &M,
        product_repository: Arc<dyn ProductRepository>,
        category_repository: Arc<dyn CategoryRepository>,
        cache_config: &CacheConfig,
    ) -> Self
    where
        M: HasComponent<dyn StoreClient>
            + HasComponent<dyn KeyRegistry>
            + HasComponent<dyn SessionManager>,
    {
        let store = HasComponent::<dyn StoreClient>::resolve(module);
        let registry = HasComponent::<dyn KeyRegistry>::resolve(module);
        let sessions = HasComponent::<dyn SessionManager>::resolve(module);

        let cache = CacheAside::from_config(store.clone(), registry.clone(), cache_config);
        let products: Arc<dyn ProductService> =
            Arc::new(ProductServiceImpl::new(product_repository, cache.clone()));
        let categories: Arc<dyn CategoryService> =
            Arc::new(CategoryServiceImpl::new(category_repository, cache));
        let admin = Arc::new(CacheAdminService::new(
            store,
            registry,
            products.clone(),
            categories.clone(),
            cache_config.default_ttl(),
        ));

        Self {
            products,
            categories,
            gate: SessionGate::new(sessions.clone()),
            sessions,
            admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStoreClient, StoreExt};
    use bazaar_repository::{InMemoryCategoryRepository, InMemoryProductRepository};
    use bazaar_core::UserId;

    fn memory_module() -> CacheModule {
        CacheModule::builder()
            .with_component_override::<dyn StoreClient>(Box::new(MemoryStoreClient::new()))
            .build()
    }

    #[tokio::test]
    async fn test_components_share_one_store() {
        let module = memory_module();
        let sessions: Arc<dyn SessionManager> = module.resolve();
        let store: Arc<dyn StoreClient> = module.resolve();

        let session = sessions.create_session(UserId(1), "a@example.com").await.unwrap();
        let raw = store
            .get_value(&format!("session:{}", session.id))
            .await
            .unwrap();
        assert!(raw.is_some());
    }

    #[tokio::test]
    async fn test_disabled_store_builds() {
        let mut config = AppConfig::default();
        config.store.enabled = false;

        let module = build_cache_module(&config).await.unwrap();
        let store: Arc<dyn StoreClient> = module.resolve();
        assert!(!store.is_enabled());
    }

    #[tokio::test]
    async fn test_unreachable_store_still_builds() {
        let mut config = AppConfig::default();
        config.store.host = "127.0.0.1".to_string();
        config.store.port = 1;

        let module = build_cache_module(&config).await.unwrap();

        let registry: Arc<dyn KeyRegistry> = module.resolve();
        assert!(registry.tracked().is_empty());
        let sessions: Arc<dyn SessionManager> = module.resolve();
        let err = sessions
            .create_session(UserId(1), "a@example.com")
            .await
            .unwrap_err();
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn test_assemble_wires_cache_into_services() {
        let module = memory_module();
        let services = Services::assemble(
            &module,
            Arc::new(InMemoryProductRepository::default()),
            Arc::new(InMemoryCategoryRepository::new()),
            &CacheConfig::default(),
        );

        services.categories.find_all().await.unwrap();

        let registry: Arc<dyn KeyRegistry> = module.resolve();
        assert_eq!(registry.tracked(), vec!["categories_all"]);
        assert!(services.admin.status().await.unwrap().categories_all_cached);
    }
}
