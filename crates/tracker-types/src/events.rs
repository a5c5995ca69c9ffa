//! Events published on the engine's broadcast bus.

use crate::common::{Address, ChainId};
use crate::orders::OrderStatus;
use serde::{Deserialize, Serialize};

/// Notification emitted by the engine for consumers (service API, logs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackerEvent {
	/// A backend sync was merged into the order store.
	OrdersReconciled {
		chain_id: ChainId,
		added: usize,
		updated: usize,
		skipped: usize,
	},
	/// A tracked order moved to a new status.
	OrderStatusChanged {
		chain_id: ChainId,
		uid: String,
		status: OrderStatus,
	},
	/// A locally signed order was accepted by the backend.
	OrderSubmitted { chain_id: ChainId, uid: String },
	/// A soft cancellation was delivered for this order.
	CancellationRequested { chain_id: ChainId, uid: String },
	/// A fresh quote was stored for this sell token.
	QuoteUpdated { chain_id: ChainId, sell_token: Address },
	/// A quote refresh failed and the stored quote was cleared.
	QuoteFailed { chain_id: ChainId, sell_token: Address },
	/// The backend rejected this token as unsupported.
	TokenUnsupported { chain_id: ChainId, address: Address },
	/// A previously unsupported token produced a successful quote again.
	TokenSupportedAgain { chain_id: ChainId, address: Address },
}
