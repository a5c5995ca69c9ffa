//! Best-effort human summary built from structured order fields.
//!
//! Purely presentational; the structured fields stay the source of truth.

use tracker_types::{OrderKind, Token, U256};

/// Renders an amount in token units, trimming trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
	let divisor = U256::from(10).pow(U256::from(decimals));
	let integer = amount / divisor;
	let fraction = amount % divisor;

	if fraction.is_zero() {
		return integer.to_string();
	}

	let digits = fraction.to_string();
	let padded = "0".repeat(decimals as usize - digits.len()) + &digits;
	format!("{}.{}", integer, padded.trim_end_matches('0'))
}

/// Placeholder summary for an order first discovered via a backend sync.
pub fn format_summary(
	kind: OrderKind,
	input_token: &Token,
	output_token: &Token,
	sell_amount: U256,
	buy_amount: U256,
) -> String {
	let sell = format!(
		"{} {}",
		format_units(sell_amount, input_token.decimals),
		input_token.symbol
	);
	let buy = format!(
		"{} {}",
		format_units(buy_amount, output_token.decimals),
		output_token.symbol
	);

	match kind {
		OrderKind::Buy => format!("Swap at most {} for {}", sell, buy),
		_ => format!("Swap {} for at least {}", sell, buy),
	}
}
