//! Quote subsystem: the per-chain quote store, the refresh orchestrator,
//! the unsupported-token tracker and the loading-indicator debounce.

pub mod loading;
pub mod orchestrator;
pub mod store;
pub mod unsupported;

pub use loading::LoadingIndicator;
pub use orchestrator::{
	canonical_market, parse_unsupported_address, CanonicalMarket, QuoteRefreshError,
	QuoteRefresher, RefreshOutcome, RefreshQuoteParams,
};
pub use store::{QuoteEntry, QuoteFailure, QuoteStore};
pub use unsupported::{UnsupportedTokenEntry, UnsupportedTokenList};
