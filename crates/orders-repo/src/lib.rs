#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!("Enable a repo feature: `memory` or `redis`.");

use orders_types::domain::order::Order;
use orders_types::ports::order_repository::{
    FindAllPage, FindResult, OrderRepository, RepoError,
};
use std::time::Duration;

pub mod kv;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use kv::KvOrderRepo;

#[cfg(feature = "redis")]
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

/// The order repository over whichever store backends are compiled in.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(KvOrderRepo<memory::InMemoryStore>),
    #[cfg(feature = "redis")]
    Redis(KvOrderRepo<redis_store::RedisStore>),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "redis")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        if let Some(url) = url {
            tracing::warn!(%url, "redis support not compiled in; using in-memory store");
        }
        Ok(Self::Memory(KvOrderRepo::default()))
    }

    #[cfg(all(feature = "redis", not(feature = "memory")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        let url = url.unwrap_or(DEFAULT_REDIS_URL);
        let store = redis_store::RedisStore::connect(url).await?;
        Ok(Self::Redis(KvOrderRepo::new(store)))
    }

    // If both features are enabled, an explicit url selects redis.
    #[cfg(all(feature = "redis", feature = "memory"))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        match url {
            Some(url) => {
                let store = redis_store::RedisStore::connect(url).await?;
                Ok(Self::Redis(KvOrderRepo::new(store)))
            }
            None => Ok(Self::Memory(KvOrderRepo::default())),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => Repo::Memory(r.with_timeout(timeout)),
            #[cfg(feature = "redis")]
            Repo::Redis(r) => Repo::Redis(r.with_timeout(timeout)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "redis")]
            Repo::Redis(_) => "redis",
        }
    }

    fn inner(&self) -> &dyn OrderRepository {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(r) => r,
            #[cfg(feature = "redis")]
            Repo::Redis(r) => r,
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn insert(&self, order: &Order) -> Result<(), RepoError> {
        self.inner().insert(order).await
    }

    async fn find_by_id(&self, id: u64) -> Result<Order, RepoError> {
        self.inner().find_by_id(id).await
    }

    async fn update(&self, order: &Order) -> Result<(), RepoError> {
        self.inner().update(order).await
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), RepoError> {
        self.inner().delete_by_id(id).await
    }

    async fn find_all(&self, page: FindAllPage) -> Result<FindResult, RepoError> {
        self.inner().find_all(page).await
    }
}
