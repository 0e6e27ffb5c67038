use async_trait::async_trait;

use crate::domain::order::Order;
use crate::ports::kv_store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("order {0} does not exist")]
    NotFound(u64),

    #[error("order {0} already exists")]
    AlreadyExists(u64),

    #[error("failed to encode order: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode order json: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound(_))
    }
}

/// Cursor request for [`OrderRepository::find_all`]. `offset` 0 starts a new
/// scan; `size` bounds the index entries visited, not the orders returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAllPage {
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindResult {
    pub orders: Vec<Order>,
    /// Where the next call should resume; 0 once the scan is exhausted.
    pub cursor: u64,
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn insert(&self, order: &Order) -> Result<(), RepoError>;
    async fn find_by_id(&self, id: u64) -> Result<Order, RepoError>;
    async fn update(&self, order: &Order) -> Result<(), RepoError>;
    async fn delete_by_id(&self, id: u64) -> Result<(), RepoError>;
    async fn find_all(&self, page: FindAllPage) -> Result<FindResult, RepoError>;
}
