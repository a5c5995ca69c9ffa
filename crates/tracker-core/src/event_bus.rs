//! Broadcast bus for engine events.
//!
//! Background updaters publish; the service API and logs subscribe. Losing
//! an event to a lagging subscriber is acceptable, every consumer can
//! re-read the stores.

use tokio::sync::broadcast;
use tracker_types::TrackerEvent;

pub struct EventBus {
	sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
		self.sender.subscribe()
	}

	/// Publishes to all current subscribers. A bus without subscribers
	/// swallows the event, which is fine.
	pub fn publish(&self, event: TrackerEvent) {
		let _ = self.sender.send(event);
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
