use async_trait::async_trait;
use orders_types::domain::order::Order;
use orders_types::ports::kv_store::{BatchOp, KvStore, StoreError};
use orders_types::ports::order_repository::{FindAllPage, FindResult, OrderRepository, RepoError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const ORDER_KEY_PREFIX: &str = "order:";
/// Set holding the key of every stored order.
pub const ORDER_INDEX: &str = "orders";
const ORDER_KEY_PATTERN: &str = "order:*";

pub fn order_key(id: u64) -> String {
    format!("{ORDER_KEY_PREFIX}{id}")
}

/// Inverse of [`order_key`]. Only the canonical decimal form is accepted.
pub fn order_id_from_key(key: &str) -> Option<u64> {
    let digits = key.strip_prefix(ORDER_KEY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Order repository over any [`KvStore`].
///
/// Records live under `order:{id}` as JSON; the `orders` set indexes them for
/// paginated listing. Insert and delete touch both in one atomic batch.
pub struct KvOrderRepo<S> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S> Clone for KvOrderRepo<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: KvStore + Default> Default for KvOrderRepo<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: KvStore> KvOrderRepo<S> {
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bounds every store round trip; expiry surfaces as `StoreError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl<S: KvStore> OrderRepository for KvOrderRepo<S> {
    async fn insert(&self, order: &Order) -> Result<(), RepoError> {
        let data = serde_json::to_vec(order).map_err(RepoError::Encode)?;
        let key = order_key(order.order_id);

        let outcome = self
            .call(self.store.atomic(vec![
                BatchOp::SetIfAbsent {
                    key: key.clone(),
                    value: data,
                },
                BatchOp::AddToSet {
                    set: ORDER_INDEX.to_string(),
                    member: key.clone(),
                },
            ]))
            .await?;

        // The index add is a no-op on collision: the existing record already owns it.
        if !outcome.first().copied().unwrap_or(false) {
            return Err(RepoError::AlreadyExists(order.order_id));
        }
        tracing::debug!(order_id = order.order_id, %key, "order inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: u64) -> Result<Order, RepoError> {
        let key = order_key(id);
        let value = self
            .call(self.store.get(&key))
            .await?
            .ok_or(RepoError::NotFound(id))?;
        serde_json::from_slice(&value).map_err(RepoError::Decode)
    }

    async fn update(&self, order: &Order) -> Result<(), RepoError> {
        let data = serde_json::to_vec(order).map_err(RepoError::Encode)?;
        let key = order_key(order.order_id);

        if !self.call(self.store.set_if_present(&key, &data)).await? {
            return Err(RepoError::NotFound(order.order_id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), RepoError> {
        let key = order_key(id);

        let outcome = self
            .call(self.store.atomic(vec![
                BatchOp::Delete { key: key.clone() },
                BatchOp::RemoveFromSet {
                    set: ORDER_INDEX.to_string(),
                    member: key.clone(),
                },
            ]))
            .await?;

        if !outcome.first().copied().unwrap_or(false) {
            return Err(RepoError::NotFound(id));
        }
        tracing::debug!(order_id = id, %key, "order deleted");
        Ok(())
    }

    async fn find_all(&self, page: FindAllPage) -> Result<FindResult, RepoError> {
        let scan = self
            .call(self.store.scan_set(
                ORDER_INDEX,
                page.offset,
                ORDER_KEY_PATTERN,
                page.size.max(1),
            ))
            .await?;

        if scan.members.is_empty() {
            return Ok(FindResult {
                orders: Vec::new(),
                cursor: scan.cursor,
            });
        }

        let values = self.call(self.store.multi_get(&scan.members)).await?;

        let mut orders = Vec::with_capacity(values.len());
        for (key, value) in scan.members.iter().zip(values) {
            // Index entry whose record is gone: deleted mid-scan or left stale.
            let Some(value) = value else {
                tracing::debug!(%key, order_id = ?order_id_from_key(key), "skipping index entry without record");
                continue;
            };
            orders.push(serde_json::from_slice(&value).map_err(RepoError::Decode)?);
        }

        tracing::debug!(
            offset = page.offset,
            scanned = scan.members.len(),
            returned = orders.len(),
            cursor = scan.cursor,
            "orders page"
        );
        Ok(FindResult {
            orders,
            cursor: scan.cursor,
        })
    }
}
