use orders_hex::application::order_service::OrderService;
use orders_repo::memory::InMemoryRepo;
use orders_types::domain::order::{LineItem, OrderStatus};
use uuid::Uuid;

// End-to-end service flow against the in-memory adapter.
#[tokio::test]
async fn create_list_update_delete_flow() {
    let repo = InMemoryRepo::default();
    let svc = OrderService::new(repo.clone());

    let order = svc
        .create_order(
            Uuid::new_v4(),
            vec![LineItem {
                item_id: Uuid::new_v4(),
                quantity: 3,
                price: 700,
            }],
        )
        .await
        .unwrap();

    let page = svc.list_orders(0).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].order_id, order.order_id);
    assert_eq!(page.next, None);

    let shipped = svc
        .update_status(order.order_id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.status(), OrderStatus::Shipped);

    let completed = svc
        .update_status(order.order_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status(), OrderStatus::Completed);

    svc.delete_order(order.order_id).await.unwrap();
    let after_delete = svc.list_orders(0).await.unwrap();
    assert!(after_delete.items.is_empty());
    assert!(svc.delete_order(order.order_id).await.is_err());
}
