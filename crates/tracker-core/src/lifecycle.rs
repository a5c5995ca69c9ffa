//! Engine lifecycle state machine and shutdown signalling.

use crate::error::CoreError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	Uninitialized,
	Initializing,
	Running,
	Stopping,
	Stopped,
	Failed,
}

impl fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Uninitialized => "Uninitialized",
			Self::Initializing => "Initializing",
			Self::Running => "Running",
			Self::Stopping => "Stopping",
			Self::Stopped => "Stopped",
			Self::Failed => "Failed",
		};
		write!(f, "{}", name)
	}
}

fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
	use LifecycleState::*;

	match (from, to) {
		(Uninitialized, Initializing) => true,
		(Initializing, Running) => true,
		(Running, Stopping) => true,
		(Stopping, Stopped) => true,
		// Can fail from any state
		(_, Failed) => true,
		_ => false,
	}
}

pub struct LifecycleManager {
	state: Arc<RwLock<LifecycleState>>,
	shutdown_tx: broadcast::Sender<()>,
}

impl LifecycleManager {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(16);

		Self {
			state: Arc::new(RwLock::new(LifecycleState::Uninitialized)),
			shutdown_tx,
		}
	}

	pub async fn get_state(&self) -> LifecycleState {
		*self.state.read().await
	}

	pub async fn set_state(&self, new_state: LifecycleState) -> Result<(), CoreError> {
		let mut state = self.state.write().await;
		let old_state = *state;

		if !is_valid_transition(old_state, new_state) {
			return Err(CoreError::Lifecycle(format!(
				"Invalid state transition from {} to {}",
				old_state, new_state
			)));
		}

		*state = new_state;
		info!("Lifecycle state changed: {} -> {}", old_state, new_state);

		Ok(())
	}

	pub async fn initialize(&self) -> Result<(), CoreError> {
		self.set_state(LifecycleState::Initializing).await
	}

	pub async fn start(&self) -> Result<(), CoreError> {
		self.set_state(LifecycleState::Running).await
	}

	/// Signals shutdown to every subscribed background task.
	pub async fn shutdown(&self) -> Result<(), CoreError> {
		self.set_state(LifecycleState::Stopping).await?;
		let _ = self.shutdown_tx.send(());
		self.set_state(LifecycleState::Stopped).await
	}

	pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
		self.shutdown_tx.subscribe()
	}

	pub async fn is_running(&self) -> bool {
		*self.state.read().await == LifecycleState::Running
	}
}

impl Default for LifecycleManager {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_full_lifecycle() {
		let lifecycle = LifecycleManager::new();
		assert_eq!(lifecycle.get_state().await, LifecycleState::Uninitialized);

		lifecycle.initialize().await.unwrap();
		lifecycle.start().await.unwrap();
		assert!(lifecycle.is_running().await);

		let mut shutdown_rx = lifecycle.subscribe_shutdown();
		lifecycle.shutdown().await.unwrap();
		assert_eq!(lifecycle.get_state().await, LifecycleState::Stopped);
		shutdown_rx.recv().await.unwrap();
	}

	#[tokio::test]
	async fn test_invalid_transition_is_rejected() {
		let lifecycle = LifecycleManager::new();
		let err = lifecycle.start().await.unwrap_err();
		assert!(matches!(err, CoreError::Lifecycle(_)));
	}

	#[tokio::test]
	async fn test_failure_is_reachable_from_any_state() {
		let lifecycle = LifecycleManager::new();
		lifecycle.initialize().await.unwrap();
		lifecycle.set_state(LifecycleState::Failed).await.unwrap();
		assert_eq!(lifecycle.get_state().await, LifecycleState::Failed);
	}
}
