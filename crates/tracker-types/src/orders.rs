//! Order types: the backend wire shape, the locally tracked order, and the
//! status enums the classifier produces.

use crate::common::{Address, B256, Timestamp, U256};
use crate::serde_helpers::u256_decimal;
use crate::tokens::Token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction of an order.
///
/// The backend is the source of truth for this field; anything it sends that
/// we do not recognize maps to `Unknown` so one odd record cannot fail a
/// whole batch deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
	Sell,
	Buy,
	#[serde(other)]
	Unknown,
}

impl fmt::Display for OrderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sell => write!(f, "sell"),
			Self::Buy => write!(f, "buy"),
			Self::Unknown => write!(f, "unknown"),
		}
	}
}

/// Discrete local status of a tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	Pending,
	Fulfilled,
	Expired,
	Cancelled,
}

/// Status derived from a raw backend record, including the explicit
/// `Unknown` signal for records the classifier cannot map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOrderStatus {
	Pending,
	Fulfilled,
	Expired,
	Cancelled,
	Unknown,
}

impl fmt::Display for ApiOrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pending => write!(f, "pending"),
			Self::Fulfilled => write!(f, "fulfilled"),
			Self::Expired => write!(f, "expired"),
			Self::Cancelled => write!(f, "cancelled"),
			Self::Unknown => write!(f, "unknown"),
		}
	}
}

/// Raw order record as returned by the orderbook backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetaData {
	pub uid: String,
	pub owner: Address,
	pub sell_token: Address,
	pub buy_token: Address,
	#[serde(with = "u256_decimal")]
	pub sell_amount: U256,
	#[serde(with = "u256_decimal")]
	pub buy_amount: U256,
	#[serde(with = "u256_decimal")]
	pub fee_amount: U256,
	#[serde(with = "u256_decimal", default)]
	pub executed_sell_amount: U256,
	#[serde(with = "u256_decimal", default)]
	pub executed_buy_amount: U256,
	#[serde(with = "u256_decimal", default)]
	pub executed_fee_amount: U256,
	pub valid_to: Timestamp,
	pub kind: OrderKind,
	#[serde(default)]
	pub invalidated: bool,
	pub creation_date: DateTime<Utc>,
	#[serde(default)]
	pub receiver: Option<Address>,
	#[serde(default)]
	pub partially_fillable: bool,
	#[serde(default)]
	pub signature: Option<String>,
}

/// One off-chain-signed, on-chain-settled swap intent as tracked locally.
///
/// Backend-sourced fields are overwritten wholesale on every reconcile;
/// `summary` and `is_unfillable` are locally owned and survive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	pub uid: String,
	pub owner: Address,
	pub input_token: Token,
	pub output_token: Token,
	pub sell_amount: U256,
	pub buy_amount: U256,
	pub fee_amount: U256,
	pub kind: OrderKind,
	pub valid_to: Timestamp,
	pub status: OrderStatus,
	pub creation_time: DateTime<Utc>,
	pub summary: String,
	pub receiver: Option<Address>,
	pub is_unfillable: bool,
	/// Raw backend payload, retained for debugging and display.
	pub api_additional_info: OrderMetaData,
}

/// Signing scheme used when the order was signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
	Eip712,
	EthSign,
}

/// Body of `POST /orders`: a signed order ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreation {
	pub sell_token: Address,
	pub buy_token: Address,
	#[serde(with = "u256_decimal")]
	pub sell_amount: U256,
	#[serde(with = "u256_decimal")]
	pub buy_amount: U256,
	pub valid_to: Timestamp,
	pub app_data: B256,
	#[serde(with = "u256_decimal")]
	pub fee_amount: U256,
	pub kind: OrderKind,
	pub partially_fillable: bool,
	#[serde(default)]
	pub receiver: Option<Address>,
	pub signature: String,
	pub signing_scheme: SigningScheme,
}
