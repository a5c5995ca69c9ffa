//! Client for the orderbook and quote backend.
//!
//! One client serves every configured chain; each chain has its own base URL
//! and wrapped-native address. The quote endpoints never see the
//! native-currency pseudo-address, it is swapped for the chain's wrapped
//! token before URLs are built.

use crate::error::{submission_error_message, ApiClientError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, info};
use tracker_types::{
	Address, ApiError, ChainId, FeeInformation, OrderCreation, OrderKind, OrderMetaData,
	PriceInformation, Signature, NATIVE_CURRENCY_ADDRESS, U256,
};

/// Order-side backend surface, behind a trait so workflows can be tested
/// against a mock.
#[async_trait]
pub trait OrderApi: Send + Sync {
	async fn get_order(&self, chain_id: ChainId, uid: &str)
		-> Result<OrderMetaData, ApiClientError>;

	async fn get_orders(
		&self,
		chain_id: ChainId,
		owner: Address,
		limit: u32,
	) -> Result<Vec<OrderMetaData>, ApiClientError>;

	async fn post_order(
		&self,
		chain_id: ChainId,
		order: &OrderCreation,
	) -> Result<String, ApiClientError>;

	async fn delete_order(
		&self,
		chain_id: ChainId,
		uid: &str,
		signature: &Signature,
	) -> Result<(), ApiClientError>;
}

/// Quote-side backend surface.
#[async_trait]
pub trait QuoteApi: Send + Sync {
	async fn get_fee_quote(
		&self,
		chain_id: ChainId,
		sell_token: Address,
		buy_token: Address,
		amount: U256,
		kind: OrderKind,
	) -> Result<FeeInformation, ApiClientError>;

	async fn get_price_quote(
		&self,
		chain_id: ChainId,
		base_token: Address,
		quote_token: Address,
		amount: U256,
		kind: OrderKind,
	) -> Result<PriceInformation, ApiClientError>;
}

/// Per-chain backend endpoints.
#[derive(Debug, Clone)]
pub struct ChainEndpoints {
	/// Base URL without the `/v1` suffix.
	pub base_url: String,
	pub wrapped_native: Address,
}

/// `reqwest`-based client for the orderbook backend.
pub struct OrderbookClient {
	http: reqwest::Client,
	chains: HashMap<ChainId, ChainEndpoints>,
}

impl OrderbookClient {
	pub fn new(chains: HashMap<ChainId, ChainEndpoints>) -> Self {
		Self {
			http: reqwest::Client::new(),
			chains,
		}
	}

	fn endpoints(&self, chain_id: ChainId) -> Result<&ChainEndpoints, ApiClientError> {
		self.chains
			.get(&chain_id)
			.ok_or(ApiClientError::UnsupportedNetwork(chain_id))
	}

	fn api_url(&self, chain_id: ChainId, path: &str) -> Result<String, ApiClientError> {
		let endpoints = self.endpoints(chain_id)?;
		Ok(format!("{}/v1{}", endpoints.base_url, path))
	}

	/// The quote API has no notion of the native pseudo-address; it prices
	/// against the wrapped token instead.
	fn to_api_address(&self, chain_id: ChainId, address: Address) -> Result<Address, ApiClientError> {
		if address == NATIVE_CURRENCY_ADDRESS {
			Ok(self.endpoints(chain_id)?.wrapped_native)
		} else {
			Ok(address)
		}
	}

	async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiClientError> {
		debug!("GET {}", url);
		let response = self.http.get(&url).send().await?;
		let status = response.status();

		if status.is_success() {
			response
				.json::<T>()
				.await
				.map_err(|e| ApiClientError::Decode(e.to_string()))
		} else {
			// Prefer the structured body when the backend sent one
			match response.json::<ApiError>().await {
				Ok(api_error) => Err(ApiClientError::Api(api_error)),
				Err(_) => Err(ApiClientError::Status(status.as_u16())),
			}
		}
	}
}

#[async_trait]
impl OrderApi for OrderbookClient {
	async fn get_order(
		&self,
		chain_id: ChainId,
		uid: &str,
	) -> Result<OrderMetaData, ApiClientError> {
		let url = self.api_url(chain_id, &format!("/orders/{}", uid))?;
		self.get_json(url).await
	}

	async fn get_orders(
		&self,
		chain_id: ChainId,
		owner: Address,
		limit: u32,
	) -> Result<Vec<OrderMetaData>, ApiClientError> {
		let url = self.api_url(chain_id, &format!("/orders?owner={}&limit={}", owner, limit))?;
		self.get_json(url).await
	}

	async fn post_order(
		&self,
		chain_id: ChainId,
		order: &OrderCreation,
	) -> Result<String, ApiClientError> {
		let url = self.api_url(chain_id, "/orders")?;
		info!("Posting signed order for network {}", chain_id);

		let response = self.http.post(&url).json(order).send().await?;
		let status = response.status();

		if status.is_success() {
			let uid = response
				.json::<String>()
				.await
				.map_err(|e| ApiClientError::Decode(e.to_string()))?;
			info!("Order accepted by the backend: {}", uid);
			return Ok(uid);
		}

		let body = response.json::<ApiError>().await.ok();
		let message = submission_error_message(status.as_u16(), body.as_ref());
		Err(ApiClientError::Rejected {
			message,
			code: body.map(|b| b.error_type),
		})
	}

	async fn delete_order(
		&self,
		chain_id: ChainId,
		uid: &str,
		signature: &Signature,
	) -> Result<(), ApiClientError> {
		let url = self.api_url(chain_id, &format!("/orders/{}", uid))?;
		info!("Requesting soft cancellation of order {}", uid);

		let body = serde_json::json!({
			"signature": signature.to_string(),
			"signingScheme": "ethsign",
		});
		let response = self.http.delete(&url).json(&body).send().await?;
		let status = response.status();

		if status.is_success() {
			Ok(())
		} else {
			match response.json::<ApiError>().await {
				Ok(api_error) => Err(ApiClientError::Api(api_error)),
				Err(_) => Err(ApiClientError::Status(status.as_u16())),
			}
		}
	}
}

#[async_trait]
impl QuoteApi for OrderbookClient {
	async fn get_fee_quote(
		&self,
		chain_id: ChainId,
		sell_token: Address,
		buy_token: Address,
		amount: U256,
		kind: OrderKind,
	) -> Result<FeeInformation, ApiClientError> {
		let sell = self.to_api_address(chain_id, sell_token)?;
		let buy = self.to_api_address(chain_id, buy_token)?;
		let url = self.api_url(
			chain_id,
			&format!(
				"/fee?sellToken={}&buyToken={}&amount={}&kind={}",
				sell, buy, amount, kind
			),
		)?;
		self.get_json(url).await
	}

	async fn get_price_quote(
		&self,
		chain_id: ChainId,
		base_token: Address,
		quote_token: Address,
		amount: U256,
		kind: OrderKind,
	) -> Result<PriceInformation, ApiClientError> {
		let base = self.to_api_address(chain_id, base_token)?;
		let quote = self.to_api_address(chain_id, quote_token)?;
		let url = self.api_url(
			chain_id,
			&format!("/markets/{}-{}/{}/{}", base, quote, kind, amount),
		)?;
		self.get_json(url).await
	}
}
