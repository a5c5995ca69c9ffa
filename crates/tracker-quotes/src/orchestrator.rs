//! Quote refresh orchestration.
//!
//! A refresh combines a fee lookup and a price lookup into one
//! [`QuoteInformation`] and publishes the result to the [`QuoteStore`].
//! Sell orders are sequential by necessity: the fee must be known before the
//! priced amount (`amount - fee`) can be queried. Buy orders query both
//! concurrently with the amount unchanged.

use crate::store::{QuoteFailure, QuoteStore};
use crate::unsupported::UnsupportedTokenList;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracker_api::{ApiClientError, QuoteApi};
use tracker_types::{
	now_millis, Address, ApiErrorCode, FeeInformation, FeeQuoteParams, OrderKind,
	QuoteInformation, TrackerError, U256,
};

#[derive(Debug, Error)]
pub enum QuoteRefreshError {
	#[error(transparent)]
	Api(#[from] ApiClientError),

	/// The fee leaves nothing to trade.
	#[error("Fee ({fee}) exceeds the sell amount ({amount})")]
	FeeExceedsAmount { amount: U256, fee: U256 },
}

impl From<QuoteRefreshError> for TrackerError {
	fn from(e: QuoteRefreshError) -> Self {
		match e {
			QuoteRefreshError::Api(ApiClientError::UnsupportedNetwork(chain)) => {
				TrackerError::UnsupportedNetwork(chain)
			}
			other => TrackerError::Quote(other.to_string()),
		}
	}
}

/// The base/quote orientation the price endpoint expects. Sell orders price
/// the token being sold; buy orders price the token being bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalMarket {
	pub base_token: Address,
	pub quote_token: Address,
}

pub fn canonical_market(sell_token: Address, buy_token: Address, kind: OrderKind) -> CanonicalMarket {
	match kind {
		OrderKind::Buy => CanonicalMarket {
			base_token: buy_token,
			quote_token: sell_token,
		},
		_ => CanonicalMarket {
			base_token: sell_token,
			quote_token: buy_token,
		},
	}
}

/// Extracts the offending token address from an unsupported-token error
/// description. The backend phrases these as
/// `"Token address 0x... is not supported"`, with the address third.
pub fn parse_unsupported_address(description: &str) -> Option<Address> {
	description.split_whitespace().nth(2)?.parse().ok()
}

/// One refresh request.
#[derive(Debug, Clone)]
pub struct RefreshQuoteParams {
	pub quote_params: FeeQuoteParams,
	/// Force a fee fetch even when `previous_fee` is still valid.
	pub fetch_fee: bool,
	pub previous_fee: Option<FeeInformation>,
}

/// What a successful refresh produced.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
	pub quote: QuoteInformation,
	/// Tokens that were on the unsupported list and are now accepted again.
	pub resupported: Vec<Address>,
}

pub struct QuoteRefresher {
	api: Arc<dyn QuoteApi>,
	quotes: Arc<QuoteStore>,
	unsupported: Arc<UnsupportedTokenList>,
}

impl QuoteRefresher {
	pub fn new(
		api: Arc<dyn QuoteApi>,
		quotes: Arc<QuoteStore>,
		unsupported: Arc<UnsupportedTokenList>,
	) -> Self {
		Self {
			api,
			quotes,
			unsupported,
		}
	}

	/// Runs one refresh and publishes the result (success or failure) to the
	/// quote store before returning it.
	pub async fn refresh_quote(
		&self,
		params: &RefreshQuoteParams,
	) -> Result<RefreshOutcome, QuoteRefreshError> {
		match self.fetch(params).await {
			Ok(quote) => {
				let resupported = self.mark_supported(&params.quote_params);
				self.quotes.update(quote.clone());
				Ok(RefreshOutcome { quote, resupported })
			}
			Err(e) => {
				self.handle_failure(&params.quote_params, &e);
				Err(e)
			}
		}
	}

	async fn fetch(
		&self,
		params: &RefreshQuoteParams,
	) -> Result<QuoteInformation, QuoteRefreshError> {
		let p = &params.quote_params;
		let market = canonical_market(p.sell_token, p.buy_token, p.kind);

		let (fee, price) = match p.kind {
			OrderKind::Sell => {
				let fee = self.resolve_fee(params).await?;
				if fee.amount >= p.amount {
					return Err(QuoteRefreshError::FeeExceedsAmount {
						amount: p.amount,
						fee: fee.amount,
					});
				}
				// Price what is actually exchanged after the fee
				let exchange_amount = p.amount - fee.amount;
				let price = self
					.api
					.get_price_quote(
						p.chain_id,
						market.base_token,
						market.quote_token,
						exchange_amount,
						p.kind,
					)
					.await?;
				(fee, price)
			}
			_ => {
				futures::try_join!(
					self.resolve_fee(params),
					async {
						self.api
							.get_price_quote(
								p.chain_id,
								market.base_token,
								market.quote_token,
								p.amount,
								p.kind,
							)
							.await
							.map_err(QuoteRefreshError::from)
					}
				)?
			}
		};

		debug!(
			"Quote refreshed for {}: fee {}, price {:?}",
			p.sell_token, fee.amount, price.amount
		);
		Ok(QuoteInformation {
			chain_id: p.chain_id,
			sell_token: p.sell_token,
			buy_token: p.buy_token,
			amount: p.amount,
			kind: p.kind,
			price,
			fee,
			last_check: now_millis(),
		})
	}

	/// Reuses the previous fee while it is still valid, unless the caller
	/// forces a fetch.
	async fn resolve_fee(
		&self,
		params: &RefreshQuoteParams,
	) -> Result<FeeInformation, QuoteRefreshError> {
		if !params.fetch_fee {
			if let Some(previous) = &params.previous_fee {
				if previous.is_valid(Utc::now()) {
					return Ok(previous.clone());
				}
			}
		}
		let p = &params.quote_params;
		let fee = self
			.api
			.get_fee_quote(p.chain_id, p.sell_token, p.buy_token, p.amount, p.kind)
			.await?;
		Ok(fee)
	}

	/// A successful quote proves both traded tokens are accepted again.
	fn mark_supported(&self, p: &FeeQuoteParams) -> Vec<Address> {
		let mut resupported = Vec::new();
		let mut tokens = vec![p.sell_token];
		if p.buy_token != p.sell_token {
			tokens.push(p.buy_token);
		}
		for token in tokens {
			if self.unsupported.is_unsupported(p.chain_id, token).is_some() {
				info!("Token {} is supported again on {}", token, p.chain_id);
				self.unsupported.remove(p.chain_id, token);
				resupported.push(token);
			}
		}
		resupported
	}

	fn handle_failure(&self, p: &FeeQuoteParams, error: &QuoteRefreshError) {
		let code = match error {
			QuoteRefreshError::Api(e) => e.api_error().map(|a| a.error_type),
			QuoteRefreshError::FeeExceedsAmount { .. } => None,
		};

		if code == Some(ApiErrorCode::UnsupportedToken) {
			if let QuoteRefreshError::Api(e) = error {
				if let Some(description) = e.api_error().map(|a| a.description.as_str()) {
					match parse_unsupported_address(description) {
						Some(address) => {
							warn!("Token {} reported unsupported on {}", address, p.chain_id);
							self.unsupported.add(p.chain_id, address, now_millis());
						}
						None => warn!(
							"Unsupported-token error without a parseable address: {}",
							description
						),
					}
				}
			}
		}

		warn!("Quote refresh failed for {}: {}", p.sell_token, error);
		self.quotes.record_failure(
			p.chain_id,
			p.sell_token,
			QuoteFailure {
				message: error.to_string(),
				error_code: code,
				at: now_millis(),
			},
		);
	}
}
