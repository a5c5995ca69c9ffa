//! The one authoritative order classification function.
//!
//! Status is derived from backend-reported fields and the current time,
//! never cached independently and never set directly by API consumers.

use tracker_types::{ApiOrderStatus, Order, OrderKind, OrderMetaData, OrderStatus, Timestamp, U256};

fn is_filled(order: &OrderMetaData) -> bool {
	match order.kind {
		OrderKind::Sell => {
			!order.sell_amount.is_zero() && order.executed_sell_amount >= order.sell_amount
		}
		OrderKind::Buy => {
			!order.buy_amount.is_zero() && order.executed_buy_amount >= order.buy_amount
		}
		OrderKind::Unknown => false,
	}
}

/// Derives the API-level status of a raw backend record at `now`.
///
/// First match wins: fulfilled, cancelled, expired, pending. A record whose
/// `kind` could not be parsed classifies as `Unknown` so callers can drop it
/// explicitly instead of coercing it to a default.
pub fn classify(order: &OrderMetaData, now: Timestamp) -> ApiOrderStatus {
	if order.kind == OrderKind::Unknown {
		return ApiOrderStatus::Unknown;
	}

	if is_filled(order) {
		ApiOrderStatus::Fulfilled
	} else if order.invalidated {
		ApiOrderStatus::Cancelled
	} else if order.valid_to < now {
		ApiOrderStatus::Expired
	} else {
		ApiOrderStatus::Pending
	}
}

/// Whether the current market rate can no longer satisfy the order's limit
/// price. `quote_amount` and `price_amount` come from a fresh price quote
/// for the order's own pair and kind; fees are not part of the comparison.
/// Rates are cross-multiplied, so no precision is lost to division.
pub fn is_order_unfillable(order: &Order, quote_amount: U256, price_amount: U256) -> bool {
	match order.kind {
		// market yields price_amount buy tokens per quote_amount sold;
		// the order demands buy_amount per sell_amount
		OrderKind::Sell => match (
			price_amount.checked_mul(order.sell_amount),
			order.buy_amount.checked_mul(quote_amount),
		) {
			(Some(market), Some(limit)) => market < limit,
			_ => false,
		},
		// market needs price_amount sell tokens per quote_amount bought;
		// the order offers sell_amount per buy_amount
		OrderKind::Buy => match (
			order.sell_amount.checked_mul(quote_amount),
			price_amount.checked_mul(order.buy_amount),
		) {
			(Some(offered), Some(needed)) => offered < needed,
			_ => false,
		},
		OrderKind::Unknown => false,
	}
}

/// Maps an API-level status to the local one; `Unknown` has no local
/// counterpart and yields `None`.
pub fn to_local_status(status: ApiOrderStatus) -> Option<OrderStatus> {
	match status {
		ApiOrderStatus::Pending => Some(OrderStatus::Pending),
		ApiOrderStatus::Fulfilled => Some(OrderStatus::Fulfilled),
		ApiOrderStatus::Expired => Some(OrderStatus::Expired),
		ApiOrderStatus::Cancelled => Some(OrderStatus::Cancelled),
		ApiOrderStatus::Unknown => None,
	}
}
