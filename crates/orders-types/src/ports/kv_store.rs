use async_trait::async_trait;
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// One step of an all-or-nothing batch submitted through [`KvStore::atomic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    SetIfAbsent { key: String, value: Vec<u8> },
    SetIfPresent { key: String, value: Vec<u8> },
    Delete { key: String },
    AddToSet { set: String, member: String },
    RemoveFromSet { set: String, member: String },
}

/// One batch of a cursor scan. A `cursor` of 0 means the scan is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub members: Vec<String>,
    pub cursor: u64,
}

/// Key-value store contract consumed by the order repository.
///
/// Boolean results report whether the operation had an effect: the
/// conditional write applied, the key was removed, the member was added.
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;
    async fn set_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool, StoreError>;
    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    /// Resumes a scan of `set` at `cursor` (0 starts one), returning members
    /// matching the glob `pattern`. `count` is a hint for how many entries to
    /// visit. Members present for the whole scan are returned at least once;
    /// duplicates across batches are allowed.
    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<ScanPage, StoreError>;

    /// Values for `keys`, same length and order as the input.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError>;

    /// Applies every op or none of them. Returns one outcome per op.
    async fn atomic(&self, ops: Vec<BatchOp>) -> Result<Vec<bool>, StoreError>;
}
