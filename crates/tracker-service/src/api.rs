//! HTTP API surface over the engine's stores and workflows.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracker_config::ApiConfig;
use tracker_core::{Engine, LifecycleState};
use tracker_quotes::{QuoteEntry, UnsupportedTokenEntry};
use tracker_types::{Address, ChainId, FeeQuoteParams, Order, OrderCreation, TrackerError};

#[derive(Clone)]
struct AppState {
	engine: Arc<Engine>,
}

type ApiError = (StatusCode, Json<Value>);

/// Every error leaves the process as a [`TrackerError`] category.
fn bad_request(error: TrackerError) -> ApiError {
	(
		StatusCode::BAD_REQUEST,
		Json(json!({ "error": error.to_string() })),
	)
}

pub async fn start_http_server(engine: Arc<Engine>, config: ApiConfig) -> anyhow::Result<()> {
	let state = AppState { engine };

	let app = Router::new()
		.route("/health", get(health_check))
		.route(
			"/api/v1/orders/{chain_id}",
			get(get_orders).post(submit_order),
		)
		.route(
			"/api/v1/orders/{chain_id}/{uid}",
			get(get_order).delete(cancel_order),
		)
		.route("/api/v1/quote", post(request_quote))
		.route("/api/v1/quotes/{chain_id}", get(get_quotes))
		.route("/api/v1/unsupported/{chain_id}", get(get_unsupported))
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive());

	let bind_address = format!("{}:{}", config.host, config.port);
	let listener = tokio::net::TcpListener::bind(&bind_address).await?;
	info!("API server listening on {}", bind_address);

	axum::serve(listener, app).await?;
	Ok(())
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
	let lifecycle_state = state.engine.state().await;
	let status = match lifecycle_state {
		LifecycleState::Running => StatusCode::OK,
		_ => StatusCode::SERVICE_UNAVAILABLE,
	};
	(status, Json(json!({ "state": lifecycle_state.to_string() })))
}

async fn get_orders(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
) -> Json<Vec<Order>> {
	Json(state.engine.context().orders.orders(ChainId(chain_id)).await)
}

async fn get_order(
	State(state): State<AppState>,
	Path((chain_id, uid)): Path<(u64, String)>,
) -> Result<Json<Order>, ApiError> {
	state
		.engine
		.context()
		.orders
		.get(ChainId(chain_id), &uid)
		.await
		.map(Json)
		.ok_or((
			StatusCode::NOT_FOUND,
			Json(json!({ "error": format!("Order {} is not tracked", uid) })),
		))
}

async fn submit_order(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
	Json(order): Json<OrderCreation>,
) -> Result<Json<Value>, ApiError> {
	match state.engine.submit_order(ChainId(chain_id), &order).await {
		Ok(uid) => Ok(Json(json!({ "uid": uid }))),
		Err(e) => {
			warn!("Order submission failed: {}", e);
			Err(bad_request(e.into()))
		}
	}
}

async fn cancel_order(
	State(state): State<AppState>,
	Path((chain_id, uid)): Path<(u64, String)>,
) -> Result<Json<Value>, ApiError> {
	match state
		.engine
		.request_cancellation(ChainId(chain_id), &uid)
		.await
	{
		Ok(()) => Ok(Json(json!({ "uid": uid, "cancellationRequested": true }))),
		Err(e) => {
			warn!("Cancellation of order {} failed: {}", uid, e);
			Err(bad_request(e.into()))
		}
	}
}

/// Triggers one refresh for the pair and starts watching it.
async fn request_quote(
	State(state): State<AppState>,
	Json(pair): Json<FeeQuoteParams>,
) -> Result<Json<Value>, ApiError> {
	match state.engine.refresh_now(pair).await {
		Ok(outcome) => Ok(Json(json!({ "quote": outcome.quote }))),
		Err(e) => Err(bad_request(e.into())),
	}
}

async fn get_quotes(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
) -> Json<HashMap<Address, QuoteEntry>> {
	Json(state.engine.context().quotes.entries(ChainId(chain_id)))
}

async fn get_unsupported(
	State(state): State<AppState>,
	Path(chain_id): Path<u64>,
) -> Json<Vec<UnsupportedTokenEntry>> {
	Json(
		state
			.engine
			.context()
			.unsupported
			.entries(ChainId(chain_id)),
	)
}
