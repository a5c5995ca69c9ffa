//! Single-writer order store.
//!
//! All bulk mutation goes through [`OrderStore::reconcile`]; the only other
//! writers are the targeted status updates used by the status poller and the
//! cancellation workflow. Readers get cloned snapshots.

use crate::reconciler::reconcile_orders;
use crate::registry::TokenRegistry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracker_types::{ChainId, Order, OrderMetaData, OrderStatus, Timestamp};

/// Counters from one reconcile pass, for events and logs.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileStats {
	pub added: usize,
	pub updated: usize,
	pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct OrderStore {
	inner: RwLock<HashMap<ChainId, HashMap<String, Order>>>,
}

impl OrderStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Merges a fetched batch into the chain's collection.
	pub async fn reconcile(
		&self,
		chain_id: ChainId,
		fetched: &[OrderMetaData],
		registry: &TokenRegistry,
		now: Timestamp,
	) -> ReconcileStats {
		let mut inner = self.inner.write().await;
		let existing = inner.entry(chain_id).or_default();
		let outcome = reconcile_orders(existing, fetched, chain_id, registry, now);
		let stats = ReconcileStats {
			added: outcome.added,
			updated: outcome.updated,
			skipped: outcome.skipped,
		};
		*existing = outcome.orders;
		stats
	}

	/// Inserts or replaces a single order, used when a locally submitted
	/// order is first observed.
	pub async fn upsert(&self, chain_id: ChainId, order: Order) {
		let mut inner = self.inner.write().await;
		inner.entry(chain_id).or_default().insert(order.uid.clone(), order);
	}

	pub async fn get(&self, chain_id: ChainId, uid: &str) -> Option<Order> {
		self.inner.read().await.get(&chain_id)?.get(uid).cloned()
	}

	/// Snapshot of all orders on a chain.
	pub async fn orders(&self, chain_id: ChainId) -> Vec<Order> {
		self.inner
			.read()
			.await
			.get(&chain_id)
			.map(|orders| orders.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Snapshot of the chain's pending set.
	pub async fn pending(&self, chain_id: ChainId) -> Vec<Order> {
		self.inner
			.read()
			.await
			.get(&chain_id)
			.map(|orders| {
				orders
					.values()
					.filter(|o| o.status == OrderStatus::Pending)
					.cloned()
					.collect()
			})
			.unwrap_or_default()
	}

	/// Sets a single order's status, returning the previous one. Used by
	/// the status poller and the cancellation workflow's optimistic set.
	pub async fn set_status(
		&self,
		chain_id: ChainId,
		uid: &str,
		status: OrderStatus,
	) -> Option<OrderStatus> {
		let mut inner = self.inner.write().await;
		let order = inner.get_mut(&chain_id)?.get_mut(uid)?;
		let previous = order.status;
		order.status = status;
		Some(previous)
	}

	/// Flips the locally derived unfillable flag. Written by the quote
	/// refresh path whenever a fresh price disagrees with the stored flag.
	pub async fn set_unfillable(&self, chain_id: ChainId, uid: &str, unfillable: bool) {
		let mut inner = self.inner.write().await;
		if let Some(order) = inner.get_mut(&chain_id).and_then(|m| m.get_mut(uid)) {
			order.is_unfillable = unfillable;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use tracker_types::{address, Address, OrderKind, Token, U256};

	const NOW: Timestamp = 1_700_000_000;

	fn registry() -> TokenRegistry {
		let mut registry = TokenRegistry::new();
		registry.register(
			ChainId::MAINNET,
			Token::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), "WETH", 18),
		);
		registry.register(
			ChainId::MAINNET,
			Token::new(address!("6B175474E89094C44Da98b954EedeAC495271d0F"), "DAI", 18),
		);
		registry
	}

	fn meta(uid: &str) -> OrderMetaData {
		OrderMetaData {
			uid: uid.to_string(),
			owner: Address::ZERO,
			sell_token: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			buy_token: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
			sell_amount: U256::from(1000),
			buy_amount: U256::from(2000),
			fee_amount: U256::from(10),
			executed_sell_amount: U256::ZERO,
			executed_buy_amount: U256::ZERO,
			executed_fee_amount: U256::ZERO,
			valid_to: NOW + 600,
			kind: OrderKind::Sell,
			invalidated: false,
			creation_date: Utc::now(),
			receiver: None,
			partially_fillable: false,
			signature: None,
		}
	}

	#[tokio::test]
	async fn test_reconcile_and_snapshots() {
		let store = OrderStore::new();
		let registry = registry();

		let stats = store
			.reconcile(ChainId::MAINNET, &[meta("0x01"), meta("0x02")], &registry, NOW)
			.await;
		assert_eq!(stats.added, 2);

		assert_eq!(store.orders(ChainId::MAINNET).await.len(), 2);
		assert_eq!(store.pending(ChainId::MAINNET).await.len(), 2);
		// other chains are untouched
		assert!(store.orders(ChainId::XDAI).await.is_empty());
	}

	#[tokio::test]
	async fn test_set_status_returns_previous() {
		let store = OrderStore::new();
		let registry = registry();
		store
			.reconcile(ChainId::MAINNET, &[meta("0x01")], &registry, NOW)
			.await;

		let previous = store
			.set_status(ChainId::MAINNET, "0x01", OrderStatus::Cancelled)
			.await;
		assert_eq!(previous, Some(OrderStatus::Pending));
		assert_eq!(
			store.get(ChainId::MAINNET, "0x01").await.unwrap().status,
			OrderStatus::Cancelled
		);
		assert!(store.pending(ChainId::MAINNET).await.is_empty());
	}

	#[tokio::test]
	async fn test_unfillable_flag_survives_reconcile() {
		let store = OrderStore::new();
		let registry = registry();
		store
			.reconcile(ChainId::MAINNET, &[meta("0x01")], &registry, NOW)
			.await;

		store.set_unfillable(ChainId::MAINNET, "0x01", true).await;
		assert!(store.get(ChainId::MAINNET, "0x01").await.unwrap().is_unfillable);

		// the next sync keeps the locally owned flag
		store
			.reconcile(ChainId::MAINNET, &[meta("0x01")], &registry, NOW)
			.await;
		assert!(store.get(ChainId::MAINNET, "0x01").await.unwrap().is_unfillable);
	}

	#[tokio::test]
	async fn test_set_status_on_unknown_order() {
		let store = OrderStore::new();
		let previous = store
			.set_status(ChainId::MAINNET, "0x404", OrderStatus::Cancelled)
			.await;
		assert_eq!(previous, None);
	}
}
