use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    serve, Json, Router,
};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::{OrderPage, OrderService};
use crate::errors::AppError;
use orders_types::domain::order::{LineItem, Order, OrderStatus};
use orders_types::ports::order_repository::OrderRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

#[derive(Clone)]
pub struct HttpServer<R>
where
    R: OrderRepository,
{
    pub service: Arc<OrderService<R>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
}

fn parse_u64(raw: &str, what: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid {what}: {raw}")))
}

impl<R> HttpServer<R>
where
    R: OrderRepository + Send + Sync + 'static,
{
    pub async fn new(service: OrderService<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/orders", get(list_orders::<R>).post(create_order::<R>))
            .route(
                "/orders/{id}",
                get(get_order::<R>)
                    .put(update_status::<R>)
                    .delete(delete_order::<R>),
            )
            .layer(trace_layer)
            .with_state(self.service.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn create_order<R>(
    State(service): State<Arc<OrderService<R>>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let order = service
        .create_order(payload.customer_id, payload.line_items)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders<R>(
    State(service): State<Arc<OrderService<R>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderPage>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let cursor = match query.cursor.as_deref() {
        None | Some("") => 0,
        Some(raw) => parse_u64(raw, "cursor")?,
    };
    let page = service.list_orders(cursor).await?;
    Ok(Json(page))
}

async fn get_order<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_u64(&id, "order id")?;
    let order = service.get_order(id).await?;
    Ok(Json(order))
}

async fn update_status<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_u64(&id, "order id")?;
    let updated = service.update_status(id, payload.status).await?;
    Ok(Json(updated))
}

async fn delete_order<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let id = parse_u64(&id, "order id")?;
    service.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
