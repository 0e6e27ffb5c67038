use crate::config::DEFAULT_LIST_PAGE_SIZE;
use crate::errors::AppError;
use chrono::Utc;
use orders_types::domain::order::{new_order_id, LineItem, Order, OrderStatus};
use orders_types::ports::order_repository::{FindAllPage, OrderRepository, RepoError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attempts at drawing a free identifier before giving up with a conflict.
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderPage {
    pub items: Vec<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
}

pub struct OrderService<R: OrderRepository> {
    repo: R,
    page_size: u64,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn create_order(
        &self,
        customer_id: Uuid,
        line_items: Vec<LineItem>,
    ) -> Result<Order, AppError> {
        let mut order =
            Order::new(customer_id, line_items).map_err(|e| AppError::BadRequest(e.to_string()))?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.repo.insert(&order).await {
                Ok(()) => {
                    tracing::info!(order_id = order.order_id, "order created");
                    return Ok(order);
                }
                Err(RepoError::AlreadyExists(id)) => {
                    tracing::warn!(order_id = id, attempt, "order id collision; drawing a new one");
                    order.order_id = new_order_id();
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Conflict(format!(
            "no free order id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    pub async fn get_order(&self, id: u64) -> Result<Order, AppError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn list_orders(&self, cursor: u64) -> Result<OrderPage, AppError> {
        let res = self
            .repo
            .find_all(FindAllPage {
                offset: cursor,
                size: self.page_size,
            })
            .await?;
        Ok(OrderPage {
            items: res.orders,
            next: (res.cursor != 0).then_some(res.cursor),
        })
    }

    /// Applies the lifecycle transition before anything is written; an
    /// illegal transition never reaches the repository.
    pub async fn update_status(&self, id: u64, status: OrderStatus) -> Result<Order, AppError> {
        let mut order = self.repo.find_by_id(id).await?;
        order
            .transition(status, Utc::now())
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.repo.update(&order).await?;
        tracing::info!(order_id = id, status = ?status, "order status updated");
        Ok(order)
    }

    pub async fn delete_order(&self, id: u64) -> Result<(), AppError> {
        self.repo.delete_by_id(id).await?;
        tracing::info!(order_id = id, "order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orders_repo::memory::InMemoryRepo;
    use orders_types::ports::order_repository::FindResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn items() -> Vec<LineItem> {
        vec![LineItem {
            item_id: Uuid::new_v4(),
            quantity: 2,
            price: 500,
        }]
    }

    /// Counts writes and can report the next `collisions` inserts as clashes.
    #[derive(Clone, Default)]
    struct CountingRepo {
        inner: InMemoryRepo,
        inserts: Arc<AtomicUsize>,
        updates: Arc<AtomicUsize>,
        collisions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OrderRepository for CountingRepo {
        async fn insert(&self, order: &Order) -> Result<(), RepoError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self
                .collisions
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(RepoError::AlreadyExists(order.order_id));
            }
            self.inner.insert(order).await
        }

        async fn find_by_id(&self, id: u64) -> Result<Order, RepoError> {
            self.inner.find_by_id(id).await
        }

        async fn update(&self, order: &Order) -> Result<(), RepoError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update(order).await
        }

        async fn delete_by_id(&self, id: u64) -> Result<(), RepoError> {
            self.inner.delete_by_id(id).await
        }

        async fn find_all(&self, page: FindAllPage) -> Result<FindResult, RepoError> {
            self.inner.find_all(page).await
        }
    }

    #[tokio::test]
    async fn create_and_get_order_in_memory() {
        let svc = OrderService::new(InMemoryRepo::default());
        let customer = Uuid::new_v4();
        let order = svc.create_order(customer, items()).await.unwrap();

        let got = svc.get_order(order.order_id).await.unwrap();
        assert_eq!(got, order);
        assert_eq!(got.customer_id, customer);
        assert_eq!(got.status(), OrderStatus::Created);
    }

    #[tokio::test]
    async fn ship_complete_and_delete() {
        let svc = OrderService::new(InMemoryRepo::default());
        let order = svc.create_order(Uuid::new_v4(), items()).await.unwrap();

        let shipped = svc
            .update_status(order.order_id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert!(shipped.shipped_at.is_some());

        let completed = svc
            .update_status(order.order_id, OrderStatus::Completed)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.created_at, order.created_at);
        assert_eq!(completed.line_items, order.line_items);

        let again = svc
            .update_status(order.order_id, OrderStatus::Completed)
            .await;
        assert!(matches!(again, Err(AppError::BadRequest(_))));

        svc.delete_order(order.order_id).await.unwrap();
        let missing = svc.get_order(order.order_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn completing_before_shipping_never_reaches_update() {
        let repo = CountingRepo::default();
        let svc = OrderService::new(repo.clone());
        let order = svc.create_order(Uuid::new_v4(), items()).await.unwrap();

        let res = svc
            .update_status(order.order_id, OrderStatus::Completed)
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert_eq!(repo.updates.load(Ordering::SeqCst), 0);

        let stored = svc.get_order(order.order_id).await.unwrap();
        assert!(stored.completed_at.is_none());
    }

    #[tokio::test]
    async fn id_collision_retries_with_fresh_id() {
        let repo = CountingRepo::default();
        repo.collisions.store(1, Ordering::SeqCst);
        let svc = OrderService::new(repo.clone());

        let order = svc.create_order(Uuid::new_v4(), items()).await.unwrap();
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 2);
        assert_eq!(svc.get_order(order.order_id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn persistent_collisions_surface_as_conflict() {
        let repo = CountingRepo::default();
        repo.collisions.store(10, Ordering::SeqCst);
        let svc = OrderService::new(repo.clone());

        let res = svc.create_order(Uuid::new_v4(), items()).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
        assert_eq!(repo.inserts.load(Ordering::SeqCst), MAX_ID_ATTEMPTS);
    }

    #[tokio::test]
    async fn validation_errors_propagate() {
        let svc = OrderService::new(InMemoryRepo::default());
        let res = svc.create_order(Uuid::new_v4(), vec![]).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        let res = svc.create_order(Uuid::nil(), items()).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn list_pages_until_exhausted() {
        let svc = OrderService::new(InMemoryRepo::default()).with_page_size(2);
        for _ in 0..5 {
            svc.create_order(Uuid::new_v4(), items()).await.unwrap();
        }

        let mut total = 0;
        let mut cursor = 0;
        loop {
            let page = svc.list_orders(cursor).await.unwrap();
            total += page.items.len();
            match page.next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn not_found_paths() {
        let svc = OrderService::new(InMemoryRepo::default());
        let missing = svc.get_order(12345).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let updated = svc.update_status(12345, OrderStatus::Shipped).await;
        assert!(matches!(updated, Err(AppError::NotFound(_))));

        let deleted = svc.delete_order(12345).await;
        assert!(matches!(deleted, Err(AppError::NotFound(_))));
    }
}
