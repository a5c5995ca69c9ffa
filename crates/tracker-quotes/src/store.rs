//! Quote store keyed `chain → sell token`.
//!
//! Written only by the refresh orchestrator; overlapping refreshes for
//! different pairs may complete out of order and simply apply
//! last-writer-wins per (chain, token). Copy-on-write like the
//! unsupported-token set, so readers take consistent snapshots.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracker_types::{Address, ApiErrorCode, ChainId, QuoteInformation};

/// Last recorded refresh failure for a token, consumed by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteFailure {
	pub message: String,
	pub error_code: Option<ApiErrorCode>,
	/// Unix milliseconds when the failure was recorded.
	pub at: u64,
}

/// Stored state for one (chain, sell token) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuoteEntry {
	pub quote: Option<QuoteInformation>,
	pub last_error: Option<QuoteFailure>,
}

type QuoteMap = HashMap<ChainId, HashMap<Address, QuoteEntry>>;

#[derive(Debug, Default)]
pub struct QuoteStore {
	map: ArcSwap<QuoteMap>,
}

impl QuoteStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Publishes a fresh quote, clearing any previous failure.
	pub fn update(&self, quote: QuoteInformation) {
		let mut next = QuoteMap::clone(&self.map.load_full());
		next.entry(quote.chain_id).or_default().insert(
			quote.sell_token,
			QuoteEntry {
				quote: Some(quote.clone()),
				last_error: None,
			},
		);
		self.map.store(Arc::new(next));
	}

	/// Clears the stored quote for a sell token and records the failure
	/// that caused it.
	pub fn record_failure(&self, chain_id: ChainId, sell_token: Address, failure: QuoteFailure) {
		let mut next = QuoteMap::clone(&self.map.load_full());
		next.entry(chain_id).or_default().insert(
			sell_token,
			QuoteEntry {
				quote: None,
				last_error: Some(failure),
			},
		);
		self.map.store(Arc::new(next));
	}

	/// Drops the entry entirely.
	pub fn clear(&self, chain_id: ChainId, sell_token: Address) {
		let mut next = QuoteMap::clone(&self.map.load_full());
		if let Some(chain) = next.get_mut(&chain_id) {
			chain.remove(&sell_token);
		}
		self.map.store(Arc::new(next));
	}

	pub fn get(&self, chain_id: ChainId, sell_token: Address) -> Option<QuoteEntry> {
		self.map.load().get(&chain_id)?.get(&sell_token).cloned()
	}

	/// Snapshot of one chain's entries, keyed by sell token.
	pub fn entries(&self, chain_id: ChainId) -> HashMap<Address, QuoteEntry> {
		self.map
			.load()
			.get(&chain_id)
			.cloned()
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use tracker_types::{address, FeeInformation, OrderKind, PriceInformation, U256};

	fn quote(sell_token: Address) -> QuoteInformation {
		QuoteInformation {
			chain_id: ChainId::MAINNET,
			sell_token,
			buy_token: Address::ZERO,
			amount: U256::from(1000),
			kind: OrderKind::Sell,
			price: PriceInformation {
				token: Address::ZERO,
				amount: Some("950".to_string()),
			},
			fee: FeeInformation {
				amount: U256::from(50),
				expiration_date: Utc::now(),
			},
			last_check: 1,
		}
	}

	#[test]
	fn test_update_clears_previous_failure() {
		let store = QuoteStore::new();
		let token = address!("0000000000000000000000000000000000000abc");

		store.record_failure(
			ChainId::MAINNET,
			token,
			QuoteFailure {
				message: "boom".to_string(),
				error_code: None,
				at: 1,
			},
		);
		assert!(store.get(ChainId::MAINNET, token).unwrap().last_error.is_some());

		store.update(quote(token));
		let entry = store.get(ChainId::MAINNET, token).unwrap();
		assert!(entry.quote.is_some());
		assert!(entry.last_error.is_none());
	}

	#[test]
	fn test_failure_clears_previous_quote() {
		let store = QuoteStore::new();
		let token = address!("0000000000000000000000000000000000000abc");

		store.update(quote(token));
		store.record_failure(
			ChainId::MAINNET,
			token,
			QuoteFailure {
				message: "boom".to_string(),
				error_code: None,
				at: 2,
			},
		);

		let entry = store.get(ChainId::MAINNET, token).unwrap();
		assert!(entry.quote.is_none());
		assert_eq!(entry.last_error.as_ref().map(|e| e.at), Some(2));
	}

	#[test]
	fn test_last_writer_wins_per_token() {
		let store = QuoteStore::new();
		let token = address!("0000000000000000000000000000000000000abc");

		let mut first = quote(token);
		first.last_check = 1;
		let mut second = quote(token);
		second.last_check = 2;

		// completions may arrive out of order; the later write sticks
		store.update(first);
		store.update(second);
		assert_eq!(
			store
				.get(ChainId::MAINNET, token)
				.unwrap()
				.quote
				.unwrap()
				.last_check,
			2
		);
	}
}
