use thiserror::Error;
use tracker_account::AccountError;
use tracker_api::ApiClientError;
use tracker_quotes::QuoteRefreshError;
use tracker_types::TrackerError;

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Lifecycle error: {0}")]
	Lifecycle(String),

	#[error("Backend error: {0}")]
	Api(#[from] ApiClientError),

	#[error("Account error: {0}")]
	Account(#[from] AccountError),

	#[error("Quote error: {0}")]
	Quote(#[from] QuoteRefreshError),

	#[error("Order {0} is not tracked")]
	UnknownOrder(String),
}

/// Folds engine errors into the category the service edge presents.
impl From<CoreError> for TrackerError {
	fn from(e: CoreError) -> Self {
		match e {
			CoreError::Configuration(message) => TrackerError::Config(message),
			CoreError::Lifecycle(message) => TrackerError::Lifecycle(message),
			CoreError::Api(api) => api.into(),
			CoreError::Account(account) => account.into(),
			CoreError::Quote(quote) => quote.into(),
			CoreError::UnknownOrder(uid) => {
				TrackerError::Order(format!("Order {} is not tracked", uid))
			}
		}
	}
}
