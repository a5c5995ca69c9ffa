//! Debounced loading signal for quote refreshes.
//!
//! Refresh cycles are frequent and usually fast; flashing a spinner for a
//! sub-second fetch is worse than showing nothing. The indicator therefore
//! raises immediately but only lowers after a grace period, and a new raise
//! cancels a pending lower.

use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

pub struct LoadingIndicator {
	tx: watch::Sender<bool>,
	grace: Duration,
	disarm: Mutex<Option<JoinHandle<()>>>,
}

impl LoadingIndicator {
	pub fn new(grace: Duration) -> Self {
		let (tx, _) = watch::channel(false);
		Self {
			tx,
			grace,
			disarm: Mutex::new(None),
		}
	}

	/// Raises the signal and cancels any pending lower.
	pub async fn loading_started(&self) {
		let mut disarm = self.disarm.lock().await;
		if let Some(handle) = disarm.take() {
			handle.abort();
		}
		let _ = self.tx.send(true);
	}

	/// Schedules the signal to lower after the grace period.
	pub async fn loading_finished(&self) {
		let mut disarm = self.disarm.lock().await;
		if let Some(handle) = disarm.take() {
			handle.abort();
		}
		let tx = self.tx.clone();
		let grace = self.grace;
		*disarm = Some(tokio::spawn(async move {
			tokio::time::sleep(grace).await;
			let _ = tx.send(false);
		}));
	}

	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.tx.subscribe()
	}

	pub fn is_loading(&self) -> bool {
		*self.tx.borrow()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn test_raises_immediately_and_lowers_after_grace() {
		let indicator = LoadingIndicator::new(Duration::from_millis(500));
		assert!(!indicator.is_loading());

		indicator.loading_started().await;
		assert!(indicator.is_loading());

		indicator.loading_finished().await;
		// still up inside the grace period
		tokio::time::sleep(Duration::from_millis(400)).await;
		assert!(indicator.is_loading());

		tokio::time::sleep(Duration::from_millis(200)).await;
		assert!(!indicator.is_loading());
	}

	#[tokio::test(start_paused = true)]
	async fn test_new_cycle_cancels_pending_lower() {
		let indicator = LoadingIndicator::new(Duration::from_millis(500));

		indicator.loading_started().await;
		indicator.loading_finished().await;
		tokio::time::sleep(Duration::from_millis(400)).await;

		// back-to-back refresh arrives before the grace elapses
		indicator.loading_started().await;
		tokio::time::sleep(Duration::from_millis(600)).await;
		assert!(indicator.is_loading());

		indicator.loading_finished().await;
		tokio::time::sleep(Duration::from_millis(600)).await;
		assert!(!indicator.is_loading());
	}

	#[tokio::test(start_paused = true)]
	async fn test_watchers_observe_transitions() {
		let indicator = LoadingIndicator::new(Duration::from_millis(100));
		let mut rx = indicator.subscribe();

		indicator.loading_started().await;
		rx.changed().await.unwrap();
		assert!(*rx.borrow());

		indicator.loading_finished().await;
		rx.changed().await.unwrap();
		assert!(!*rx.borrow());
	}
}
