//! Soft-cancellation workflow.
//!
//! Cancelling is a two-step interaction: sign a digest over the order uid,
//! then deliver the signed cancellation to the orderbook. While the
//! signature is pending the order is optimistically marked Cancelled; a
//! failure reverts it and retains the error message for display until
//! dismissed or the next attempt. Soft cancellations are requests, not
//! guarantees, so the next sync remains authoritative either way.

use crate::error::CoreError;
use crate::event_bus::EventBus;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracker_account::{cancellation_digest, SignerInterface};
use tracker_api::OrderApi;
use tracker_orders::OrderStore;
use tracker_types::{ChainId, OrderStatus, TrackerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationState {
	Idle,
	AwaitingSignature { uid: String },
}

struct Inner {
	state: CancellationState,
	error: Option<String>,
}

pub struct CancellationWorkflow {
	orders: Arc<OrderStore>,
	api: Arc<dyn OrderApi>,
	signer: Arc<dyn SignerInterface>,
	events: EventBus,
	inner: Mutex<Inner>,
}

impl CancellationWorkflow {
	pub fn new(
		orders: Arc<OrderStore>,
		api: Arc<dyn OrderApi>,
		signer: Arc<dyn SignerInterface>,
		events: EventBus,
	) -> Self {
		Self {
			orders,
			api,
			signer,
			events,
			inner: Mutex::new(Inner {
				state: CancellationState::Idle,
				error: None,
			}),
		}
	}

	pub async fn state(&self) -> CancellationState {
		self.inner.lock().await.state.clone()
	}

	pub async fn error(&self) -> Option<String> {
		self.inner.lock().await.error.clone()
	}

	pub async fn dismiss_error(&self) {
		self.inner.lock().await.error = None;
	}

	/// Points the workflow at a (possibly) different order. If a signature
	/// round for another uid is still in flight, the workflow resets so the
	/// stale result is never attributed to the new order.
	pub async fn set_target(&self, uid: &str) {
		let mut inner = self.inner.lock().await;
		if let CancellationState::AwaitingSignature { uid: current } = &inner.state {
			if current != uid {
				inner.state = CancellationState::Idle;
				inner.error = None;
			}
		}
	}

	/// Runs one cancellation round for a tracked order.
	pub async fn request_cancellation(
		&self,
		chain_id: ChainId,
		uid: &str,
	) -> Result<(), CoreError> {
		self.orders
			.get(chain_id, uid)
			.await
			.ok_or_else(|| CoreError::UnknownOrder(uid.to_string()))?;

		{
			let mut inner = self.inner.lock().await;
			inner.state = CancellationState::AwaitingSignature {
				uid: uid.to_string(),
			};
			// A new attempt supersedes whatever went wrong before
			inner.error = None;
		}

		// Optimistic: show the order as cancelled while the round is in
		// flight; reverted below on failure.
		let previous = self
			.orders
			.set_status(chain_id, uid, OrderStatus::Cancelled)
			.await;

		let result = self.sign_and_deliver(chain_id, uid).await;

		let mut inner = self.inner.lock().await;
		let identity_intact = matches!(
			&inner.state,
			CancellationState::AwaitingSignature { uid: current } if current == uid
		);
		if !identity_intact {
			// Target changed mid-flight. Undo the optimistic set on failure
			// and drop the result either way.
			if result.is_err() {
				self.revert_status(chain_id, uid, previous).await;
			}
			return Ok(());
		}

		inner.state = CancellationState::Idle;
		match result {
			Ok(()) => {
				info!("Cancellation requested for order {}", uid);
				self.events.publish(TrackerEvent::CancellationRequested {
					chain_id,
					uid: uid.to_string(),
				});
				Ok(())
			}
			Err(e) => {
				warn!("Cancellation of order {} failed: {}", uid, e);
				self.revert_status(chain_id, uid, previous).await;
				inner.error = Some(e.to_string());
				Err(e)
			}
		}
	}

	async fn sign_and_deliver(&self, chain_id: ChainId, uid: &str) -> Result<(), CoreError> {
		let digest = cancellation_digest(uid);
		let signature = self.signer.sign_message(digest.as_slice()).await?;
		self.api.delete_order(chain_id, uid, &signature).await?;
		Ok(())
	}

	async fn revert_status(&self, chain_id: ChainId, uid: &str, previous: Option<OrderStatus>) {
		if let Some(previous) = previous {
			self.orders.set_status(chain_id, uid, previous).await;
		}
	}
}
