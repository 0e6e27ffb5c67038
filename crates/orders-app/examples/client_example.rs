///  To run :
///  cargo r --example client_example
use orders_client::{CreateOrderRequest, OrdersClient};
use orders_hex::application::order_service::OrderService;
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_repo::build_repo;
use orders_types::domain::order::{LineItem, OrderStatus};
use reqwest::StatusCode;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on ephemeral port with the in-memory store.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    let repo = build_repo(None).await?;
    let service = OrderService::new(repo);
    let server = HttpServer::new(
        service,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Use client against the running server.
    let client = OrdersClient::new(&addr)?;
    let created = client
        .create_order(CreateOrderRequest {
            customer_id: Uuid::new_v4(),
            line_items: vec![
                LineItem {
                    item_id: Uuid::new_v4(),
                    quantity: 1,
                    price: 500,
                },
                LineItem {
                    item_id: Uuid::new_v4(),
                    quantity: 2,
                    price: 350,
                },
            ],
        })
        .await?;
    println!("Created order id={}", created.order_id);
    assert_eq!(created.status(), OrderStatus::Created);

    let fetched = client.get_order(created.order_id).await?;
    println!("Fetched status={:?}", fetched.status());
    assert_eq!(fetched, created);

    let shipped = client
        .update_status(created.order_id, OrderStatus::Shipped)
        .await?;
    println!("Shipped at {:?}", shipped.shipped_at);

    let completed = client
        .update_status(created.order_id, OrderStatus::Completed)
        .await?;
    println!("Completed at {:?}", completed.completed_at);

    // A second completion is rejected by the lifecycle rules.
    match client
        .update_status(created.order_id, OrderStatus::Completed)
        .await
    {
        Ok(_) => anyhow::bail!("second completion unexpectedly succeeded"),
        Err(err) => {
            let status = err.downcast_ref::<reqwest::Error>().and_then(|e| e.status());
            assert_eq!(status, Some(StatusCode::BAD_REQUEST));
            println!("Second completion rejected with {:?}", status);
        }
    }

    let all = client.list_all_orders().await?;
    println!("Listed {} order(s)", all.len());

    client.delete_order(created.order_id).await?;
    println!("Deleted order id={}", created.order_id);

    handle.abort();
    Ok(())
}
