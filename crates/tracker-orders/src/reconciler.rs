//! Merges freshly fetched backend order records into the local collection.

use crate::classification::{classify, to_local_status};
use crate::registry::TokenRegistry;
use crate::summary::format_summary;
use std::collections::HashMap;
use tracing::warn;
use tracker_types::{ChainId, Order, OrderMetaData, Timestamp};

/// Result of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileOutcome {
	/// The new collection, keyed by order uid.
	pub orders: HashMap<String, Order>,
	pub added: usize,
	pub updated: usize,
	/// Records dropped because a token could not be resolved or the status
	/// could not be classified. They are re-attempted naturally on the next
	/// full sync, since fetches are not incremental.
	pub skipped: usize,
}

/// Pure reconciliation: merges `fetched` into `existing` and returns the new
/// collection. Backend-sourced fields are replaced wholesale; locally owned
/// fields (`summary`, `is_unfillable`) are preserved for known uids.
///
/// One bad record never blocks the batch: unresolvable or unclassifiable
/// records are skipped with a diagnostic. Reconciling the same batch twice
/// yields an identical collection.
pub fn reconcile_orders(
	existing: &HashMap<String, Order>,
	fetched: &[OrderMetaData],
	chain_id: ChainId,
	registry: &TokenRegistry,
	now: Timestamp,
) -> ReconcileOutcome {
	let mut orders = existing.clone();
	let mut added = 0;
	let mut updated = 0;
	let mut skipped = 0;

	for meta in fetched {
		let input_token = registry.resolve(chain_id, meta.sell_token);
		let output_token = registry.resolve(chain_id, meta.buy_token);

		let (input_token, output_token) = match (input_token, output_token) {
			(Some(input), Some(output)) => (input, output),
			(input, output) => {
				warn!(
					"Tokens not found for order {}: sellToken {} - buyToken {}",
					meta.uid,
					if input.is_none() {
						meta.sell_token.to_string()
					} else {
						"found".to_string()
					},
					if output.is_none() {
						meta.buy_token.to_string()
					} else {
						"found".to_string()
					},
				);
				skipped += 1;
				continue;
			}
		};

		let api_status = classify(meta, now);
		let status = match to_local_status(api_status) {
			Some(status) => status,
			None => {
				warn!("Order {} in unknown internal state: {}", meta.uid, api_status);
				skipped += 1;
				continue;
			}
		};

		let previous = orders.get(&meta.uid);
		let summary = previous.map(|o| o.summary.clone()).unwrap_or_else(|| {
			format_summary(
				meta.kind,
				&input_token,
				&output_token,
				meta.sell_amount,
				meta.buy_amount,
			)
		});
		let is_unfillable = previous.map(|o| o.is_unfillable).unwrap_or(false);

		if previous.is_some() {
			updated += 1;
		} else {
			added += 1;
		}

		orders.insert(
			meta.uid.clone(),
			Order {
				uid: meta.uid.clone(),
				owner: meta.owner,
				input_token,
				output_token,
				sell_amount: meta.sell_amount,
				buy_amount: meta.buy_amount,
				fee_amount: meta.fee_amount,
				kind: meta.kind,
				valid_to: meta.valid_to,
				status,
				creation_time: meta.creation_date,
				summary,
				receiver: meta.receiver,
				is_unfillable,
				api_additional_info: meta.clone(),
			},
		);
	}

	ReconcileOutcome {
		orders,
		added,
		updated,
		skipped,
	}
}
