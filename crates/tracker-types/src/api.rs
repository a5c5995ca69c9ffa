//! Structured error shape the orderbook backend returns on failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known backend error codes, per the orderbook OpenAPI contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
	DuplicateOrder,
	InvalidSignature,
	MissingOrderData,
	InsufficientValidTo,
	InsufficientFunds,
	InsufficientFee,
	UnsupportedToken,
	WrongOwner,
	#[serde(other)]
	Unknown,
}

impl fmt::Display for ApiErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Structured error body: `{errorType, description}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
	pub error_type: ApiErrorCode,
	pub description: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_known_error_code_deserializes() {
		let json = r#"{"errorType":"UnsupportedToken","description":"Token address 0x01 not supported"}"#;
		let err: ApiError = serde_json::from_str(json).unwrap();
		assert_eq!(err.error_type, ApiErrorCode::UnsupportedToken);
	}

	#[test]
	fn test_unknown_error_code_is_tolerated() {
		let json = r#"{"errorType":"SomethingNew","description":"?"}"#;
		let err: ApiError = serde_json::from_str(json).unwrap();
		assert_eq!(err.error_type, ApiErrorCode::Unknown);
	}
}
