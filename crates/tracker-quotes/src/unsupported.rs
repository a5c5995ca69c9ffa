//! Process-wide set of tokens the backend has rejected.
//!
//! Presence is the only semantics. Mutation is always a full map-level
//! replace (copy-on-write through `arc-swap`), so readers never observe a
//! partial update and no lock is needed.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracker_types::{Address, ChainId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedTokenEntry {
	pub address: Address,
	/// Unix milliseconds when the backend rejected the token.
	pub date_added: u64,
}

type UnsupportedMap = HashMap<ChainId, HashMap<Address, UnsupportedTokenEntry>>;

#[derive(Debug, Default)]
pub struct UnsupportedTokenList {
	map: ArcSwap<UnsupportedMap>,
}

impl UnsupportedTokenList {
	pub fn new() -> Self {
		Self::default()
	}

	/// Membership check. Addresses are binary, so comparison is inherently
	/// case-insensitive.
	pub fn is_unsupported(&self, chain_id: ChainId, address: Address) -> Option<UnsupportedTokenEntry> {
		self.map.load().get(&chain_id)?.get(&address).cloned()
	}

	/// Marks a token unsupported; last write wins.
	pub fn add(&self, chain_id: ChainId, address: Address, date_added: u64) {
		let mut next = UnsupportedMap::clone(&self.map.load_full());
		next.entry(chain_id)
			.or_default()
			.insert(address, UnsupportedTokenEntry { address, date_added });
		self.map.store(Arc::new(next));
	}

	pub fn remove(&self, chain_id: ChainId, address: Address) {
		let mut next = UnsupportedMap::clone(&self.map.load_full());
		if let Some(chain) = next.get_mut(&chain_id) {
			chain.remove(&address);
		}
		self.map.store(Arc::new(next));
	}

	/// Snapshot of one chain's entries.
	pub fn entries(&self, chain_id: ChainId) -> Vec<UnsupportedTokenEntry> {
		self.map
			.load()
			.get(&chain_id)
			.map(|chain| chain.values().cloned().collect())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_types::address;

	#[test]
	fn test_add_and_remove() {
		let list = UnsupportedTokenList::new();
		let token = address!("0000000000000000000000000000000000000abc");

		assert!(list.is_unsupported(ChainId::MAINNET, token).is_none());

		list.add(ChainId::MAINNET, token, 1000);
		let entry = list.is_unsupported(ChainId::MAINNET, token).unwrap();
		assert_eq!(entry.date_added, 1000);
		// scoped to the chain it was added on
		assert!(list.is_unsupported(ChainId::XDAI, token).is_none());

		list.remove(ChainId::MAINNET, token);
		assert!(list.is_unsupported(ChainId::MAINNET, token).is_none());
	}

	#[test]
	fn test_case_insensitive_membership() {
		let list = UnsupportedTokenList::new();
		// mixed-case source collapses to the same binary address
		let checksummed = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
			.parse::<Address>()
			.unwrap();
		let lowercase = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
			.parse::<Address>()
			.unwrap();

		list.add(ChainId::MAINNET, checksummed, 1);
		assert!(list.is_unsupported(ChainId::MAINNET, lowercase).is_some());
	}

	#[test]
	fn test_last_write_wins() {
		let list = UnsupportedTokenList::new();
		let token = address!("0000000000000000000000000000000000000abc");

		list.add(ChainId::MAINNET, token, 1);
		list.add(ChainId::MAINNET, token, 2);
		assert_eq!(
			list.is_unsupported(ChainId::MAINNET, token).unwrap().date_added,
			2
		);
		assert_eq!(list.entries(ChainId::MAINNET).len(), 1);
	}
}
