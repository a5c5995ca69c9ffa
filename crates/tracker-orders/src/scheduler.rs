//! Block-driven poll scheduling with an age-based backoff.
//!
//! The thresholds (60 min / 10 blocks, 5 min / 3 blocks) are behavioral
//! contracts of the protocol front-end, not tuning knobs.

use dashmap::DashMap;
use tracker_types::{BlockNumber, ChainId, Timestamp};

/// Poll bookkeeping for one pending order. Discarded once the order leaves
/// the pending state, so orders with a terminal status are never re-checked.
#[derive(Debug, Clone)]
pub struct PollState {
	/// When the order entered the pending set (Unix seconds).
	pub added_time: Timestamp,
	pub last_checked_block: Option<BlockNumber>,
}

impl PollState {
	pub fn new(added_time: Timestamp) -> Self {
		Self {
			added_time,
			last_checked_block: None,
		}
	}
}

/// Decides whether a status check is due at `current_block`.
pub fn should_check(current_block: BlockNumber, now: Timestamp, state: &PollState) -> bool {
	let last_checked = match state.last_checked_block {
		None => return true,
		Some(block) => block,
	};

	let blocks_since_check = current_block.saturating_sub(last_checked);
	if blocks_since_check < 1 {
		return false;
	}

	let minutes_pending = now.saturating_sub(state.added_time) / 60;
	if minutes_pending > 60 {
		// every 10 blocks if pending for longer than an hour
		blocks_since_check > 9
	} else if minutes_pending > 5 {
		// every 3 blocks if pending more than 5 minutes
		blocks_since_check > 2
	} else {
		// otherwise every block
		true
	}
}

/// Poll states for all currently pending orders, keyed by chain and uid.
#[derive(Debug, Default)]
pub struct PollRegistry {
	states: DashMap<(ChainId, String), PollState>,
}

impl PollRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts tracking an order if it is not tracked yet.
	pub fn track(&self, chain_id: ChainId, uid: &str, now: Timestamp) {
		self.states
			.entry((chain_id, uid.to_string()))
			.or_insert_with(|| PollState::new(now));
	}

	/// Whether a check is due; untracked orders are never due (call
	/// [`track`](Self::track) when the order enters the pending set).
	pub fn should_check(
		&self,
		chain_id: ChainId,
		uid: &str,
		current_block: BlockNumber,
		now: Timestamp,
	) -> bool {
		self.states
			.get(&(chain_id, uid.to_string()))
			.map(|state| should_check(current_block, now, &state))
			.unwrap_or(false)
	}

	pub fn record_check(&self, chain_id: ChainId, uid: &str, block: BlockNumber) {
		if let Some(mut state) = self.states.get_mut(&(chain_id, uid.to_string())) {
			state.last_checked_block = Some(block);
		}
	}

	/// Drops the state entirely once the order leaves the pending window;
	/// a discarded order is never due again unless re-tracked.
	pub fn discard(&self, chain_id: ChainId, uid: &str) {
		self.states.remove(&(chain_id, uid.to_string()));
	}

	pub fn state(&self, chain_id: ChainId, uid: &str) -> Option<PollState> {
		self.states
			.get(&(chain_id, uid.to_string()))
			.map(|s| s.clone())
	}
}
