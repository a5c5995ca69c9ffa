//! Block-number observation.
//!
//! The status poller is driven by new blocks, not wall time. A `BlockSource`
//! answers "what is the current block", and `block_stream` turns that into a
//! stream of strictly increasing block numbers polled on an interval.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use tracker_types::{BlockNumber, ChainId};

#[derive(Debug, Error)]
pub enum BlockSourceError {
	#[error("Network error: {0}")]
	Network(String),

	#[error("RPC error: {0}")]
	Rpc(String),

	#[error("Invalid response: {0}")]
	Decode(String),
}

/// Supplies the current block number for one chain.
#[async_trait]
pub trait BlockSource: Send + Sync {
	fn chain_id(&self) -> ChainId;

	async fn block_number(&self) -> Result<BlockNumber, BlockSourceError>;
}

/// JSON-RPC `eth_blockNumber` implementation.
///
/// Transient transport failures are retried with exponential backoff; this
/// is chain plumbing, not the order/quote fetch path, so the usual
/// no-internal-retry rule does not apply here.
pub struct RpcBlockSource {
	http: reqwest::Client,
	url: String,
	chain_id: ChainId,
	max_elapsed: Duration,
}

impl RpcBlockSource {
	pub fn new(url: impl Into<String>, chain_id: ChainId) -> Self {
		Self {
			http: reqwest::Client::new(),
			url: url.into(),
			chain_id,
			max_elapsed: Duration::from_secs(10),
		}
	}

	async fn fetch_block_number(&self) -> Result<BlockNumber, BlockSourceError> {
		let body = serde_json::json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": "eth_blockNumber",
			"params": [],
		});

		let response = self
			.http
			.post(&self.url)
			.json(&body)
			.send()
			.await
			.map_err(|e| BlockSourceError::Network(e.to_string()))?;

		let payload: serde_json::Value = response
			.json()
			.await
			.map_err(|e| BlockSourceError::Decode(e.to_string()))?;

		if let Some(error) = payload.get("error") {
			return Err(BlockSourceError::Rpc(error.to_string()));
		}

		let hex = payload
			.get("result")
			.and_then(|r| r.as_str())
			.ok_or_else(|| BlockSourceError::Decode("missing result field".to_string()))?;

		BlockNumber::from_str_radix(hex.trim_start_matches("0x"), 16)
			.map_err(|e| BlockSourceError::Decode(format!("bad block number {:?}: {}", hex, e)))
	}
}

#[async_trait]
impl BlockSource for RpcBlockSource {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn block_number(&self) -> Result<BlockNumber, BlockSourceError> {
		let backoff = ExponentialBackoff {
			max_elapsed_time: Some(self.max_elapsed),
			..Default::default()
		};

		backoff::future::retry(backoff, || async {
			self.fetch_block_number()
				.await
				.map_err(backoff::Error::transient)
		})
		.await
	}
}

/// Polls the source on `poll_interval` and yields each newly observed block
/// number, strictly increasing. Fetch failures are logged and skipped.
pub fn block_stream(
	source: Arc<dyn BlockSource>,
	poll_interval: Duration,
) -> impl Stream<Item = BlockNumber> {
	async_stream::stream! {
		let chain_id = source.chain_id();
		let mut interval = tokio::time::interval(poll_interval);
		let mut last: Option<BlockNumber> = None;

		loop {
			interval.tick().await;

			match source.block_number().await {
				Ok(number) => {
					if last.map_or(true, |l| number > l) {
						debug!("New block {} on chain {}", number, chain_id);
						last = Some(number);
						yield number;
					}
				}
				Err(e) => {
					warn!("Failed to fetch block number for chain {}: {}", chain_id, e);
				}
			}
		}
	}
}
