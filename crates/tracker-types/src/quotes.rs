//! Quote types: fee and price estimates for a prospective trade.

use crate::common::{Address, ChainId, U256};
use crate::orders::OrderKind;
use crate::serde_helpers::u256_decimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fee estimate returned by `GET /fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeInformation {
	#[serde(with = "u256_decimal")]
	pub amount: U256,
	/// The fee is only good for signing until this instant.
	pub expiration_date: DateTime<Utc>,
}

impl FeeInformation {
	/// Whether the fee can still back a signed order at `now`.
	pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
		self.expiration_date > now
	}
}

/// Price estimate returned by `GET /markets/{base}-{quote}/{kind}/{amount}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInformation {
	pub token: Address,
	/// Absent when the backend could not estimate a price.
	#[serde(default)]
	pub amount: Option<String>,
}

/// Parameters identifying one fee/price lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuoteParams {
	pub chain_id: ChainId,
	pub sell_token: Address,
	pub buy_token: Address,
	pub amount: U256,
	pub kind: OrderKind,
}

/// The most recent combined cost/rate estimate for a (chain, sell token)
/// pair, stamped with the time it was last checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteInformation {
	pub chain_id: ChainId,
	pub sell_token: Address,
	pub buy_token: Address,
	pub amount: U256,
	pub kind: OrderKind,
	pub price: PriceInformation,
	pub fee: FeeInformation,
	/// Unix milliseconds of the last successful refresh.
	pub last_check: u64,
}
