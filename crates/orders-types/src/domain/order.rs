use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle stage, derived from which timestamps are set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Shipped,
    Completed,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order already shipped")]
    AlreadyShipped,

    #[error("order must be shipped before completion")]
    NotShipped,

    #[error("order already completed")]
    AlreadyCompleted,

    #[error("cannot transition order to {0:?}")]
    Unsupported(OrderStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub item_id: Uuid,
    pub quantity: u32,
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub order_id: u64,
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Random 64-bit order identifier taken from the high half of a v4 UUID.
///
/// Uniqueness is not guaranteed here; the repository reports a collision as
/// `AlreadyExists` and the caller draws again.
pub fn new_order_id() -> u64 {
    Uuid::new_v4().as_u64_pair().0
}

impl Order {
    pub fn new(customer_id: Uuid, line_items: Vec<LineItem>) -> anyhow::Result<Self> {
        if customer_id.is_nil() {
            anyhow::bail!("customer_id must not be nil");
        }
        if line_items.is_empty() {
            anyhow::bail!("line_items empty");
        }
        for it in &line_items {
            if it.quantity == 0 {
                anyhow::bail!("line item quantity must be > 0");
            }
        }
        Ok(Self {
            order_id: new_order_id(),
            customer_id,
            line_items,
            created_at: Utc::now(),
            shipped_at: None,
            completed_at: None,
        })
    }

    pub fn status(&self) -> OrderStatus {
        match (self.shipped_at, self.completed_at) {
            (_, Some(_)) => OrderStatus::Completed,
            (Some(_), None) => OrderStatus::Shipped,
            (None, None) => OrderStatus::Created,
        }
    }

    pub fn ship(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.shipped_at.is_some() {
            return Err(TransitionError::AlreadyShipped);
        }
        self.shipped_at = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.completed_at.is_some() {
            return Err(TransitionError::AlreadyCompleted);
        }
        if self.shipped_at.is_none() {
            return Err(TransitionError::NotShipped);
        }
        self.completed_at = Some(at);
        Ok(())
    }

    /// Moves the order to `status`. Only `shipped` and `completed` are
    /// reachable; identity, line items and `created_at` are never touched.
    pub fn transition(
        &mut self,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        match status {
            OrderStatus::Shipped => self.ship(at),
            OrderStatus::Completed => self.complete(at),
            OrderStatus::Created => Err(TransitionError::Unsupported(status)),
        }
    }
}
