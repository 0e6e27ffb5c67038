use orders_hex::application::order_service::{OrderPage, OrderService};
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_repo::build_repo;
use orders_types::domain::order::{LineItem, Order, OrderStatus};
use serde::Serialize;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[derive(Serialize)]
struct OrderInput {
    customer_id: Uuid,
    line_items: Vec<LineItem>,
}

#[derive(Serialize)]
struct UpdateStatus {
    status: OrderStatus,
}

async fn start_server(page_size: u64) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
    };

    let repo = build_repo(None).await.expect("build repo");
    let service = OrderService::new(repo).with_page_size(page_size);
    let server = HttpServer::new(service, config).await.unwrap();

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    (format!("http://127.0.0.1:{}", port), handle)
}

fn input() -> OrderInput {
    OrderInput {
        customer_id: Uuid::new_v4(),
        line_items: vec![
            LineItem {
                item_id: Uuid::new_v4(),
                quantity: 1,
                price: 500,
            },
            LineItem {
                item_id: Uuid::new_v4(),
                quantity: 4,
                price: 125,
            },
        ],
    }
}

#[tokio::test]
async fn create_list_update_delete_over_http() {
    let (addr, handle) = start_server(50).await;
    let client = reqwest::Client::new();

    let create_body = input();
    let res = client
        .post(format!("{}/orders", addr))
        .json(&create_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let created: Order = res.json().await.unwrap();
    let id = created.order_id;
    assert_eq!(created.customer_id, create_body.customer_id);
    assert_eq!(created.line_items, create_body.line_items);
    assert!(created.shipped_at.is_none());

    let fetched: Order = client
        .get(format!("{}/orders/{}", addr, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    let list: OrderPage = client
        .get(format!("{}/orders", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].order_id, id);
    assert_eq!(list.next, None);

    let res = client
        .put(format!("{}/orders/{}", addr, id))
        .json(&UpdateStatus {
            status: OrderStatus::Shipped,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let updated: Order = res.json().await.unwrap();
    assert!(updated.shipped_at.is_some());

    let res = client
        .put(format!("{}/orders/{}", addr, id))
        .json(&UpdateStatus {
            status: OrderStatus::Completed,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    // Completing twice is an illegal transition.
    let res = client
        .put(format!("{}/orders/{}", addr, id))
        .json(&UpdateStatus {
            status: OrderStatus::Completed,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .delete(format!("{}/orders/{}", addr, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{}/orders/{}", addr, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    // stop server task
    handle.abort();
}

#[tokio::test]
async fn list_follows_cursor_over_http() {
    let (addr, handle) = start_server(2).await;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        let res = client
            .post(format!("{}/orders", addr))
            .json(&input())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    }

    let mut seen = 0;
    let mut cursor = 0u64;
    loop {
        let page: OrderPage = client
            .get(format!("{}/orders?cursor={}", addr, cursor))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        seen += page.items.len();
        match page.next {
            Some(next) => cursor = next,
            None => break,
        }
    }
    assert_eq!(seen, 5);

    handle.abort();
}

#[tokio::test]
async fn bad_request_and_not_found_paths() {
    let (addr, handle) = start_server(50).await;
    let client = reqwest::Client::new();

    let bad_body = OrderInput {
        customer_id: Uuid::new_v4(),
        line_items: vec![],
    };
    let res = client
        .post(format!("{}/orders", addr))
        .json(&bad_body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/orders/{}", addr, 424242))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("424242"));

    let res = client
        .get(format!("{}/orders/not-a-number", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/orders?cursor=-1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .put(format!("{}/orders/{}", addr, 424242))
        .json(&UpdateStatus {
            status: OrderStatus::Shipped,
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    handle.abort();
}
