//! Token descriptors.

use crate::common::Address;
use serde::{Deserialize, Serialize};

/// Minimal descriptor of a tradeable token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	pub address: Address,
	pub symbol: String,
	pub decimals: u8,
}

impl Token {
	pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
		Self {
			address,
			symbol: symbol.into(),
			decimals,
		}
	}
}
