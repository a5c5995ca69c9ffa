//! Background updaters driven by interval timers and the block stream.
//!
//! Each updater is one task in the engine's `JoinSet` and exits on the
//! lifecycle shutdown signal. Backend failures are logged and retried on
//! the next natural trigger only.

use crate::engine::EngineContext;
use crate::event_bus::EventBus;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracker_api::{block_stream, BlockSource};
use tracker_orders::{classify, is_order_unfillable, to_local_status};
use tracker_quotes::{
	parse_unsupported_address, QuoteRefreshError, RefreshOutcome, RefreshQuoteParams,
};
use tracker_types::{
	now_seconds, ApiErrorCode, BlockNumber, ChainId, FeeQuoteParams, OrderStatus, TrackerEvent,
	U256,
};

/// Periodically fetches the owner's orders on every configured chain and
/// reconciles them into the store.
pub(crate) async fn run_order_sync(ctx: Arc<EngineContext>) {
	let mut interval =
		tokio::time::interval(Duration::from_secs(ctx.config.sync.order_sync_secs));
	let mut shutdown_rx = ctx.lifecycle.subscribe_shutdown();

	loop {
		tokio::select! {
			_ = interval.tick() => {
				let chains: Vec<ChainId> = ctx.config.chains.keys().copied().collect();
				for chain_id in chains {
					sync_chain(&ctx, chain_id).await;
				}
			}
			_ = shutdown_rx.recv() => {
				info!("Order sync received shutdown signal");
				break;
			}
		}
	}
}

async fn sync_chain(ctx: &EngineContext, chain_id: ChainId) {
	let fetched = match ctx
		.order_api
		.get_orders(chain_id, ctx.owner, ctx.config.sync.order_limit)
		.await
	{
		Ok(fetched) => fetched,
		Err(e) => {
			warn!("Order sync failed for chain {}: {}", chain_id, e);
			return;
		}
	};

	let now = now_seconds();
	let stats = ctx.orders.reconcile(chain_id, &fetched, &ctx.registry, now).await;
	debug!(
		"Synced chain {}: {} added, {} updated, {} skipped",
		chain_id, stats.added, stats.updated, stats.skipped
	);
	ctx.events.publish(TrackerEvent::OrdersReconciled {
		chain_id,
		added: stats.added,
		updated: stats.updated,
		skipped: stats.skipped,
	});

	// Keep poll bookkeeping aligned with the reconciled collection; poll
	// state exists only while the order is pending
	for order in ctx.orders.orders(chain_id).await {
		if order.status == OrderStatus::Pending {
			ctx.poll_registry.track(chain_id, &order.uid, now);
		} else {
			ctx.poll_registry.discard(chain_id, &order.uid);
		}
	}
}

/// Consumes the chain's block stream and re-checks pending orders whose
/// poll schedule is due.
pub(crate) async fn run_status_poller(ctx: Arc<EngineContext>, source: Arc<dyn BlockSource>) {
	let chain_id = source.chain_id();
	let stream = block_stream(
		source,
		Duration::from_secs(ctx.config.sync.block_poll_secs),
	);
	tokio::pin!(stream);
	let mut shutdown_rx = ctx.lifecycle.subscribe_shutdown();

	loop {
		tokio::select! {
			block = stream.next() => match block {
				Some(block) => check_pending_orders(&ctx, chain_id, block).await,
				None => break,
			},
			_ = shutdown_rx.recv() => {
				info!("Status poller for chain {} received shutdown signal", chain_id);
				break;
			}
		}
	}
}

async fn check_pending_orders(ctx: &EngineContext, chain_id: ChainId, block: BlockNumber) {
	let now = now_seconds();

	for order in ctx.orders.pending(chain_id).await {
		// Orders observed before the first sync pass still get tracked
		ctx.poll_registry.track(chain_id, &order.uid, now);
		if !ctx.poll_registry.should_check(chain_id, &order.uid, block, now) {
			continue;
		}

		let meta = match ctx.order_api.get_order(chain_id, &order.uid).await {
			Ok(meta) => meta,
			Err(e) => {
				// no record_check: retried on the next block
				warn!("Status check of order {} failed: {}", order.uid, e);
				continue;
			}
		};
		ctx.poll_registry.record_check(chain_id, &order.uid, block);

		let status = match to_local_status(classify(&meta, now)) {
			Some(status) => status,
			None => {
				warn!("Order {} reported an unclassifiable state, skipping", order.uid);
				continue;
			}
		};

		if status != order.status {
			info!("Order {} moved to {:?}", order.uid, status);
			ctx.orders.set_status(chain_id, &order.uid, status).await;
			ctx.events.publish(TrackerEvent::OrderStatusChanged {
				chain_id,
				uid: order.uid.clone(),
				status,
			});
		}
		if status != OrderStatus::Pending {
			ctx.poll_registry.discard(chain_id, &order.uid);
		}
	}
}

/// Periodically re-runs the quote orchestration for every watched pair,
/// reusing each pair's previous fee while it is still valid.
pub(crate) async fn run_quote_refresh(ctx: Arc<EngineContext>) {
	let mut interval =
		tokio::time::interval(Duration::from_secs(ctx.config.sync.quote_refresh_secs));
	let mut shutdown_rx = ctx.lifecycle.subscribe_shutdown();

	loop {
		tokio::select! {
			_ = interval.tick() => refresh_watched_pairs(&ctx).await,
			_ = shutdown_rx.recv() => {
				info!("Quote refresh received shutdown signal");
				break;
			}
		}
	}
}

async fn refresh_watched_pairs(ctx: &EngineContext) {
	let watched = ctx.watched.read().await.clone();
	if watched.is_empty() {
		return;
	}

	ctx.loading.loading_started().await;
	for pair in watched {
		let previous_fee = ctx
			.quotes
			.get(pair.chain_id, pair.sell_token)
			.and_then(|entry| entry.quote)
			.map(|quote| quote.fee);
		let params = RefreshQuoteParams {
			quote_params: pair.clone(),
			fetch_fee: false,
			previous_fee,
		};
		let result = ctx.refresher.refresh_quote(&params).await;
		if let Ok(outcome) = &result {
			apply_unfillable(ctx, &pair, outcome).await;
		}
		publish_refresh_events(&ctx.events, &pair, &result);
	}
	ctx.loading.loading_finished().await;
}

/// Re-derives the unfillable flag for pending orders trading the refreshed
/// pair. Best-effort rate comparison over the quoted amounts; fees stay out
/// of it.
pub(crate) async fn apply_unfillable(
	ctx: &EngineContext,
	pair: &FeeQuoteParams,
	outcome: &RefreshOutcome,
) {
	let price_amount = match outcome
		.quote
		.price
		.amount
		.as_deref()
		.and_then(|amount| amount.parse::<U256>().ok())
	{
		Some(amount) => amount,
		None => return,
	};

	for order in ctx.orders.pending(pair.chain_id).await {
		if order.input_token.address != pair.sell_token
			|| order.output_token.address != pair.buy_token
			|| order.kind != pair.kind
		{
			continue;
		}
		let unfillable = is_order_unfillable(&order, pair.amount, price_amount);
		if unfillable != order.is_unfillable {
			debug!("Order {} unfillable flag set to {}", order.uid, unfillable);
			ctx.orders
				.set_unfillable(pair.chain_id, &order.uid, unfillable)
				.await;
		}
	}
}

/// Translates a refresh result into bus events.
pub(crate) fn publish_refresh_events(
	events: &EventBus,
	pair: &FeeQuoteParams,
	result: &Result<RefreshOutcome, QuoteRefreshError>,
) {
	match result {
		Ok(outcome) => {
			for &address in &outcome.resupported {
				events.publish(TrackerEvent::TokenSupportedAgain {
					chain_id: pair.chain_id,
					address,
				});
			}
			events.publish(TrackerEvent::QuoteUpdated {
				chain_id: pair.chain_id,
				sell_token: pair.sell_token,
			});
		}
		Err(e) => {
			if let QuoteRefreshError::Api(api) = e {
				if let Some(body) = api.api_error() {
					if body.error_type == ApiErrorCode::UnsupportedToken {
						if let Some(address) = parse_unsupported_address(&body.description) {
							events.publish(TrackerEvent::TokenUnsupported {
								chain_id: pair.chain_id,
								address,
							});
						}
					}
				}
			}
			events.publish(TrackerEvent::QuoteFailed {
				chain_id: pair.chain_id,
				sell_token: pair.sell_token,
			});
		}
	}
}
