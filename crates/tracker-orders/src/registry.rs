//! Token registry used when resolving backend order records.

use std::collections::HashMap;
use tracker_types::{Address, ChainId, Token, NATIVE_CURRENCY_ADDRESS};

/// Known token descriptors, chain-scoped, plus the native-currency token
/// each chain resolves the pseudo-address to.
///
/// Built once at engine startup; readers hold it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TokenRegistry {
	tokens: HashMap<ChainId, HashMap<Address, Token>>,
	native: HashMap<ChainId, Token>,
}

impl TokenRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, chain_id: ChainId, token: Token) {
		self.tokens
			.entry(chain_id)
			.or_default()
			.insert(token.address, token);
	}

	pub fn register_native(&mut self, chain_id: ChainId, token: Token) {
		self.native.insert(chain_id, token);
	}

	/// Resolves an address to a known descriptor. The native-currency
	/// pseudo-address resolves to the chain's native token, not to a
	/// contract lookup.
	pub fn resolve(&self, chain_id: ChainId, address: Address) -> Option<Token> {
		if address == NATIVE_CURRENCY_ADDRESS {
			return self.native.get(&chain_id).cloned();
		}
		self.tokens.get(&chain_id)?.get(&address).cloned()
	}
}
