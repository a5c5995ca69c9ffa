//! The engine: owns the stores, the clients and the background updaters.

use crate::cancellation::CancellationWorkflow;
use crate::error::CoreError;
use crate::event_bus::EventBus;
use crate::lifecycle::{LifecycleManager, LifecycleState};
use crate::updaters;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::info;
use tracker_account::{LocalWallet, SignerInterface};
use tracker_api::{
	BlockSource, ChainEndpoints, OrderApi, OrderbookClient, QuoteApi, RpcBlockSource,
};
use tracker_config::TrackerConfig;
use tracker_orders::{OrderStore, PollRegistry, TokenRegistry};
use tracker_quotes::{
	LoadingIndicator, QuoteRefreshError, QuoteRefresher, QuoteStore, RefreshOutcome,
	RefreshQuoteParams, UnsupportedTokenList,
};
use tracker_types::{
	appdata::{generate_app_data_doc, hash_app_data, MetadataDoc},
	now_seconds, Address, B256, ChainId, FeeQuoteParams, OrderCreation, Token, TrackerEvent,
	NATIVE_CURRENCY_ADDRESS,
};

/// Shared state every updater and API handler operates on.
pub struct EngineContext {
	pub config: TrackerConfig,
	/// Address whose orders are tracked, derived from the signer.
	pub owner: Address,
	pub orders: Arc<OrderStore>,
	pub quotes: Arc<QuoteStore>,
	pub unsupported: Arc<UnsupportedTokenList>,
	pub registry: Arc<TokenRegistry>,
	pub poll_registry: Arc<PollRegistry>,
	pub order_api: Arc<dyn OrderApi>,
	pub refresher: Arc<QuoteRefresher>,
	pub cancellation: Arc<CancellationWorkflow>,
	pub events: EventBus,
	pub lifecycle: Arc<LifecycleManager>,
	pub loading: Arc<LoadingIndicator>,
	pub block_sources: Vec<Arc<dyn BlockSource>>,
	/// Pairs the refresh updater keeps quoting.
	pub watched: RwLock<Vec<FeeQuoteParams>>,
}

pub struct Engine {
	context: Arc<EngineContext>,
	tasks: Mutex<JoinSet<()>>,
}

impl std::fmt::Debug for Engine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Engine").finish_non_exhaustive()
	}
}

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	pub fn context(&self) -> Arc<EngineContext> {
		self.context.clone()
	}

	/// Spawns the background updaters and moves the lifecycle to Running.
	pub async fn start(&self) -> Result<(), CoreError> {
		info!("Starting engine for owner {}", self.context.owner);
		self.context.lifecycle.initialize().await?;

		let mut tasks = self.tasks.lock().await;
		tasks.spawn(updaters::run_order_sync(self.context.clone()));
		tasks.spawn(updaters::run_quote_refresh(self.context.clone()));
		for source in &self.context.block_sources {
			tasks.spawn(updaters::run_status_poller(
				self.context.clone(),
				source.clone(),
			));
		}

		self.context.lifecycle.start().await?;
		info!("Engine started");
		Ok(())
	}

	pub async fn shutdown(&self) -> Result<(), CoreError> {
		info!("Shutting down engine");
		self.context.lifecycle.shutdown().await?;
		self.tasks.lock().await.shutdown().await;
		info!("Engine shutdown complete");
		Ok(())
	}

	pub async fn state(&self) -> LifecycleState {
		self.context.lifecycle.get_state().await
	}

	pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
		self.context.events.subscribe()
	}

	/// Submits a signed order and starts polling its status. The order body
	/// itself appears in the store on the next sync pass. A zero `appData`
	/// hash is replaced by the hash of this application's metadata document.
	pub async fn submit_order(
		&self,
		chain_id: ChainId,
		order: &OrderCreation,
	) -> Result<String, CoreError> {
		let mut order = order.clone();
		if order.app_data == B256::ZERO {
			order.app_data = hash_app_data(&generate_app_data_doc(MetadataDoc::default()));
		}
		let uid = self.context.order_api.post_order(chain_id, &order).await?;
		self.context
			.poll_registry
			.track(chain_id, &uid, now_seconds());
		self.context.events.publish(TrackerEvent::OrderSubmitted {
			chain_id,
			uid: uid.clone(),
		});
		Ok(uid)
	}

	pub async fn request_cancellation(
		&self,
		chain_id: ChainId,
		uid: &str,
	) -> Result<(), CoreError> {
		self.context
			.cancellation
			.request_cancellation(chain_id, uid)
			.await
	}

	/// Adds the pair to the watched set; subsequent refresh cycles keep its
	/// quote current.
	pub async fn watch_pair(&self, pair: FeeQuoteParams) {
		let mut watched = self.context.watched.write().await;
		match watched.iter_mut().find(|p| {
			p.chain_id == pair.chain_id
				&& p.sell_token == pair.sell_token
				&& p.buy_token == pair.buy_token
				&& p.kind == pair.kind
		}) {
			Some(existing) => existing.amount = pair.amount,
			None => watched.push(pair),
		}
	}

	/// Watches the pair and runs one refresh immediately, with a forced fee
	/// fetch.
	pub async fn refresh_now(
		&self,
		pair: FeeQuoteParams,
	) -> Result<RefreshOutcome, QuoteRefreshError> {
		self.watch_pair(pair.clone()).await;

		self.context.loading.loading_started().await;
		let params = RefreshQuoteParams {
			quote_params: pair.clone(),
			fetch_fee: true,
			previous_fee: None,
		};
		let result = self.context.refresher.refresh_quote(&params).await;
		self.context.loading.loading_finished().await;

		if let Ok(outcome) = &result {
			updaters::apply_unfillable(&self.context, &pair, outcome).await;
		}
		updaters::publish_refresh_events(&self.context.events, &pair, &result);
		result
	}
}

/// Builds an [`Engine`] from configuration, with injectable collaborators
/// for testing.
pub struct EngineBuilder {
	config: Option<TrackerConfig>,
	order_api: Option<Arc<dyn OrderApi>>,
	quote_api: Option<Arc<dyn QuoteApi>>,
	signer: Option<Arc<dyn SignerInterface>>,
	block_sources: Option<Vec<Arc<dyn BlockSource>>>,
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			config: None,
			order_api: None,
			quote_api: None,
			signer: None,
			block_sources: None,
		}
	}

	pub fn with_config(mut self, config: TrackerConfig) -> Self {
		self.config = Some(config);
		self
	}

	pub fn with_order_api(mut self, api: Arc<dyn OrderApi>) -> Self {
		self.order_api = Some(api);
		self
	}

	pub fn with_quote_api(mut self, api: Arc<dyn QuoteApi>) -> Self {
		self.quote_api = Some(api);
		self
	}

	pub fn with_signer(mut self, signer: Arc<dyn SignerInterface>) -> Self {
		self.signer = Some(signer);
		self
	}

	pub fn with_block_sources(mut self, sources: Vec<Arc<dyn BlockSource>>) -> Self {
		self.block_sources = Some(sources);
		self
	}

	pub fn build(self) -> Result<Engine, CoreError> {
		let config = self
			.config
			.ok_or_else(|| CoreError::Configuration("No configuration provided".to_string()))?;

		let signer: Arc<dyn SignerInterface> = match self.signer {
			Some(signer) => signer,
			None => Arc::new(LocalWallet::from_private_key(&config.tracker.private_key)?),
		};
		let owner = signer.address();

		let (order_api, quote_api): (Arc<dyn OrderApi>, Arc<dyn QuoteApi>) =
			match (self.order_api, self.quote_api) {
				(Some(order), Some(quote)) => (order, quote),
				(order, quote) => {
					let endpoints: HashMap<ChainId, ChainEndpoints> = config
						.chains
						.iter()
						.map(|(&chain_id, chain)| {
							(
								chain_id,
								ChainEndpoints {
									base_url: chain.orderbook_url.clone(),
									wrapped_native: chain.wrapped_native,
								},
							)
						})
						.collect();
					let client = Arc::new(OrderbookClient::new(endpoints));
					(
						order.unwrap_or_else(|| client.clone() as Arc<dyn OrderApi>),
						quote.unwrap_or(client as Arc<dyn QuoteApi>),
					)
				}
			};

		let block_sources: Vec<Arc<dyn BlockSource>> = match self.block_sources {
			Some(sources) => sources,
			None => config
				.chains
				.iter()
				.map(|(&chain_id, chain)| {
					Arc::new(RpcBlockSource::new(chain.rpc_url.clone(), chain_id))
						as Arc<dyn BlockSource>
				})
				.collect(),
		};

		let mut registry = TokenRegistry::new();
		for (&chain_id, chain) in &config.chains {
			registry.register_native(
				chain_id,
				Token::new(
					NATIVE_CURRENCY_ADDRESS,
					chain.native_symbol.clone(),
					chain.native_decimals,
				),
			);
			registry.register(
				chain_id,
				Token::new(
					chain.wrapped_native,
					format!("W{}", chain.native_symbol),
					chain.native_decimals,
				),
			);
			for token in &chain.tokens {
				registry.register(
					chain_id,
					Token::new(token.address, token.symbol.clone(), token.decimals),
				);
			}
		}

		let orders = Arc::new(OrderStore::new());
		let quotes = Arc::new(QuoteStore::new());
		let unsupported = Arc::new(UnsupportedTokenList::new());
		let events = EventBus::new(64);
		let refresher = Arc::new(QuoteRefresher::new(
			quote_api,
			quotes.clone(),
			unsupported.clone(),
		));
		let cancellation = Arc::new(CancellationWorkflow::new(
			orders.clone(),
			order_api.clone(),
			signer,
			events.clone(),
		));
		let loading = Arc::new(LoadingIndicator::new(Duration::from_millis(
			config.sync.loading_grace_ms,
		)));

		let context = Arc::new(EngineContext {
			config,
			owner,
			orders,
			quotes,
			unsupported,
			registry: Arc::new(registry),
			poll_registry: Arc::new(PollRegistry::new()),
			order_api,
			refresher,
			cancellation,
			events,
			lifecycle: Arc::new(LifecycleManager::new()),
			loading,
			block_sources,
			watched: RwLock::new(Vec::new()),
		});

		Ok(Engine {
			context,
			tasks: Mutex::new(JoinSet::new()),
		})
	}
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use chrono::Utc;
	use tracker_account::AccountError;
	use tracker_api::ApiClientError;
	use tracker_config::{ChainConfig, TokenConfig};
	use tracker_types::{
		address, FeeInformation, OrderKind, OrderMetaData, OrderStatus, PriceInformation,
		Signature, U256,
	};

	struct StubSigner;

	#[async_trait]
	impl SignerInterface for StubSigner {
		fn address(&self) -> Address {
			address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
		}

		async fn sign_message(&self, _message: &[u8]) -> Result<Signature, AccountError> {
			Ok(Signature(vec![0u8; 65]))
		}
	}

	struct StubApi;

	#[async_trait]
	impl OrderApi for StubApi {
		async fn get_order(
			&self,
			_chain_id: ChainId,
			_uid: &str,
		) -> Result<OrderMetaData, ApiClientError> {
			Err(ApiClientError::Status(404))
		}

		async fn get_orders(
			&self,
			_chain_id: ChainId,
			_owner: Address,
			_limit: u32,
		) -> Result<Vec<OrderMetaData>, ApiClientError> {
			Ok(vec![])
		}

		async fn post_order(
			&self,
			_chain_id: ChainId,
			_order: &OrderCreation,
		) -> Result<String, ApiClientError> {
			Ok("0xabcd".to_string())
		}

		async fn delete_order(
			&self,
			_chain_id: ChainId,
			_uid: &str,
			_signature: &Signature,
		) -> Result<(), ApiClientError> {
			Ok(())
		}
	}

	#[async_trait]
	impl QuoteApi for StubApi {
		async fn get_fee_quote(
			&self,
			_chain_id: ChainId,
			_sell_token: Address,
			_buy_token: Address,
			_amount: U256,
			_kind: OrderKind,
		) -> Result<FeeInformation, ApiClientError> {
			Ok(FeeInformation {
				amount: U256::from(50),
				expiration_date: Utc::now() + chrono::Duration::minutes(5),
			})
		}

		async fn get_price_quote(
			&self,
			_chain_id: ChainId,
			base_token: Address,
			_quote_token: Address,
			_amount: U256,
			_kind: OrderKind,
		) -> Result<PriceInformation, ApiClientError> {
			Ok(PriceInformation {
				token: base_token,
				amount: Some("999".to_string()),
			})
		}
	}

	fn pending_meta(uid: &str, buy_amount: u64) -> OrderMetaData {
		OrderMetaData {
			uid: uid.to_string(),
			owner: Address::ZERO,
			sell_token: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			buy_token: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
			sell_amount: U256::from(1000),
			buy_amount: U256::from(buy_amount),
			fee_amount: U256::from(10),
			executed_sell_amount: U256::ZERO,
			executed_buy_amount: U256::ZERO,
			executed_fee_amount: U256::ZERO,
			valid_to: now_seconds() + 600,
			kind: OrderKind::Sell,
			invalidated: false,
			creation_date: Utc::now(),
			receiver: None,
			partially_fillable: false,
			signature: None,
		}
	}

	/// Order API whose sync always reports one fully settled order.
	struct SettledApi;

	#[async_trait]
	impl OrderApi for SettledApi {
		async fn get_order(
			&self,
			_chain_id: ChainId,
			_uid: &str,
		) -> Result<OrderMetaData, ApiClientError> {
			Err(ApiClientError::Status(404))
		}

		async fn get_orders(
			&self,
			_chain_id: ChainId,
			_owner: Address,
			_limit: u32,
		) -> Result<Vec<OrderMetaData>, ApiClientError> {
			let mut meta = pending_meta("0x01", 2000);
			meta.executed_sell_amount = meta.sell_amount;
			Ok(vec![meta])
		}

		async fn post_order(
			&self,
			_chain_id: ChainId,
			_order: &OrderCreation,
		) -> Result<String, ApiClientError> {
			Ok("0xabcd".to_string())
		}

		async fn delete_order(
			&self,
			_chain_id: ChainId,
			_uid: &str,
			_signature: &Signature,
		) -> Result<(), ApiClientError> {
			Ok(())
		}
	}

	fn config() -> TrackerConfig {
		let mut config = TrackerConfig::default();
		config.tracker.private_key = "0x01".to_string();
		config.chains.insert(
			ChainId::MAINNET,
			ChainConfig {
				name: "Ethereum".to_string(),
				rpc_url: "https://eth.example.com".to_string(),
				orderbook_url: "https://protocol-mainnet.example.com/api".to_string(),
				wrapped_native: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
				native_symbol: "ETH".to_string(),
				native_decimals: 18,
				tokens: vec![TokenConfig {
					address: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
					symbol: "DAI".to_string(),
					decimals: 18,
				}],
			},
		);
		config
	}

	fn engine() -> Engine {
		let api = Arc::new(StubApi);
		Engine::builder()
			.with_config(config())
			.with_order_api(api.clone())
			.with_quote_api(api)
			.with_signer(Arc::new(StubSigner))
			.with_block_sources(vec![])
			.build()
			.unwrap()
	}

	#[test]
	fn test_builder_requires_config() {
		let err = EngineBuilder::new().build().unwrap_err();
		assert!(matches!(err, CoreError::Configuration(_)));
	}

	#[test]
	fn test_registry_resolves_native_and_listed_tokens() {
		let engine = engine();
		let registry = &engine.context().registry;

		let native = registry
			.resolve(ChainId::MAINNET, NATIVE_CURRENCY_ADDRESS)
			.unwrap();
		assert_eq!(native.symbol, "ETH");
		assert!(registry
			.resolve(
				ChainId::MAINNET,
				address!("6B175474E89094C44Da98b954EedeAC495271d0F")
			)
			.is_some());
	}

	#[tokio::test]
	async fn test_start_and_shutdown() {
		let engine = engine();
		assert_eq!(engine.state().await, LifecycleState::Uninitialized);

		engine.start().await.unwrap();
		assert_eq!(engine.state().await, LifecycleState::Running);

		engine.shutdown().await.unwrap();
		assert_eq!(engine.state().await, LifecycleState::Stopped);
	}

	#[tokio::test]
	async fn test_submit_order_tracks_and_publishes() {
		let engine = engine();
		let mut rx = engine.subscribe_events();

		let creation = OrderCreation {
			sell_token: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			buy_token: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
			sell_amount: U256::from(1000),
			buy_amount: U256::from(2000),
			valid_to: 0,
			app_data: Default::default(),
			fee_amount: U256::from(10),
			kind: OrderKind::Sell,
			partially_fillable: false,
			receiver: None,
			signature: Signature(vec![0u8; 65]).to_string(),
			signing_scheme: tracker_types::SigningScheme::EthSign,
		};
		let uid = engine
			.submit_order(ChainId::MAINNET, &creation)
			.await
			.unwrap();
		assert_eq!(uid, "0xabcd");

		assert!(engine
			.context()
			.poll_registry
			.state(ChainId::MAINNET, &uid)
			.is_some());
		assert!(matches!(
			rx.recv().await.unwrap(),
			TrackerEvent::OrderSubmitted { .. }
		));
	}

	#[tokio::test(start_paused = true)]
	async fn test_sync_discards_poll_state_of_settled_orders() {
		let engine = Engine::builder()
			.with_config(config())
			.with_order_api(Arc::new(SettledApi))
			.with_quote_api(Arc::new(StubApi))
			.with_signer(Arc::new(StubSigner))
			.with_block_sources(vec![])
			.build()
			.unwrap();
		let context = engine.context();

		// tracked while it was still pending
		context
			.poll_registry
			.track(ChainId::MAINNET, "0x01", now_seconds());

		engine.start().await.unwrap();
		// lets the first sync tick complete
		tokio::time::sleep(Duration::from_millis(10)).await;

		assert_eq!(
			context.orders.get(ChainId::MAINNET, "0x01").await.unwrap().status,
			OrderStatus::Fulfilled
		);
		assert!(context.poll_registry.state(ChainId::MAINNET, "0x01").is_none());

		engine.shutdown().await.unwrap();
	}

	#[tokio::test]
	async fn test_refresh_flags_orders_beyond_market_price() {
		let engine = engine();
		let context = engine.context();
		context
			.orders
			.reconcile(
				ChainId::MAINNET,
				&[pending_meta("0x01", 2000), pending_meta("0x02", 500)],
				&context.registry,
				now_seconds(),
			)
			.await;

		// the stub prices every request at 999
		let pair = FeeQuoteParams {
			chain_id: ChainId::MAINNET,
			sell_token: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			buy_token: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
			amount: U256::from(1000),
			kind: OrderKind::Sell,
		};
		engine.refresh_now(pair).await.unwrap();

		// demands 2000 per 1000 sold: beyond the market rate
		assert!(context.orders.get(ChainId::MAINNET, "0x01").await.unwrap().is_unfillable);
		// 500 per 1000 is comfortably within it
		assert!(!context.orders.get(ChainId::MAINNET, "0x02").await.unwrap().is_unfillable);
	}

	#[tokio::test]
	async fn test_refresh_now_stores_quote_and_watches_pair() {
		let engine = engine();
		let pair = FeeQuoteParams {
			chain_id: ChainId::MAINNET,
			sell_token: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
			buy_token: address!("6B175474E89094C44Da98b954EedeAC495271d0F"),
			amount: U256::from(1000),
			kind: OrderKind::Sell,
		};

		let outcome = engine.refresh_now(pair.clone()).await.unwrap();
		assert_eq!(outcome.quote.fee.amount, U256::from(50));

		let context = engine.context();
		assert!(context
			.quotes
			.get(ChainId::MAINNET, pair.sell_token)
			.is_some());
		assert_eq!(context.watched.read().await.len(), 1);

		// watching the same pair again only updates the amount
		let mut larger = pair.clone();
		larger.amount = U256::from(5000);
		engine.watch_pair(larger).await;
		let watched = context.watched.read().await;
		assert_eq!(watched.len(), 1);
		assert_eq!(watched[0].amount, U256::from(5000));
	}
}
