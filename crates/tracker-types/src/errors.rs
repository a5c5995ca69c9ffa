//! The top-level error rendered at the service edge.
//!
//! Per-crate errors convert into [`TrackerError`] before a message leaves
//! the process, so every response carries a uniform category prefix.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
	#[error("Order error: {0}")]
	Order(String),

	#[error("Quote error: {0}")]
	Quote(String),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Network error: {0}")]
	Network(String),

	#[error("Account error: {0}")]
	Account(String),

	#[error("Lifecycle error: {0}")]
	Lifecycle(String),

	#[error("Unsupported network {0}")]
	UnsupportedNetwork(crate::common::ChainId),
}
