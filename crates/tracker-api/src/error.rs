//! Client-side error taxonomy for backend calls.

use thiserror::Error;
use tracker_types::{ApiError, ApiErrorCode, ChainId, TrackerError};

#[derive(Debug, Error)]
pub enum ApiClientError {
	/// Transport failure or non-2xx without a parseable body. Retried only
	/// via the next natural poll/refresh trigger, never internally.
	#[error("Network error: {0}")]
	Network(String),

	/// Structured `{errorType, description}` body from the backend.
	#[error("{}", .0.description)]
	Api(ApiError),

	/// Non-2xx response without a structured body.
	#[error("Unexpected status {0}")]
	Status(u16),

	/// Order submission rejected; `message` is user-presentable.
	#[error("{message}")]
	Rejected {
		message: String,
		code: Option<ApiErrorCode>,
	},

	#[error("The operator API is not deployed on network {0}")]
	UnsupportedNetwork(ChainId),

	#[error("Invalid response: {0}")]
	Decode(String),
}

impl From<reqwest::Error> for ApiClientError {
	fn from(e: reqwest::Error) -> Self {
		Self::Network(e.to_string())
	}
}

impl ApiClientError {
	/// The structured error body, when the backend sent one.
	pub fn api_error(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}
}

impl From<ApiClientError> for TrackerError {
	fn from(e: ApiClientError) -> Self {
		match e {
			ApiClientError::UnsupportedNetwork(chain) => TrackerError::UnsupportedNetwork(chain),
			ApiClientError::Rejected { message, .. } => TrackerError::Order(message),
			other => TrackerError::Network(other.to_string()),
		}
	}
}

/// Maps an unsuccessful `POST /orders` response to a user-presentable
/// message, following the backend's error catalog.
pub fn submission_error_message(status: u16, body: Option<&ApiError>) -> String {
	match status {
		400 => match body {
			Some(api_error) => match api_error.error_type {
				ApiErrorCode::DuplicateOrder => {
					"There was another identical order already submitted".to_string()
				}
				ApiErrorCode::InsufficientFunds => {
					"The account doesn't have enough funds".to_string()
				}
				ApiErrorCode::InvalidSignature => "The order signature is invalid".to_string(),
				ApiErrorCode::MissingOrderData => "The order has missing information".to_string(),
				ApiErrorCode::InsufficientValidTo => {
					"The order validity period is too short".to_string()
				}
				ApiErrorCode::InsufficientFee => {
					"The signed fee is not enough to cover the costs".to_string()
				}
				ApiErrorCode::UnsupportedToken => {
					"One of the traded tokens is not supported".to_string()
				}
				ApiErrorCode::WrongOwner => {
					"The signature does not match the order owner".to_string()
				}
				ApiErrorCode::Unknown => api_error.description.clone(),
			},
			None => "The order was not accepted by the network".to_string(),
		},
		403 => "The order cannot be accepted. Your account is deny-listed.".to_string(),
		429 => {
			"The order cannot be accepted. Too many order placements. Please, retry in a minute"
				.to_string()
		}
		_ => "Error adding an order".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn api_error(code: ApiErrorCode) -> ApiError {
		ApiError {
			error_type: code,
			description: "backend description".to_string(),
		}
	}

	#[test]
	fn test_known_codes_map_to_catalog_messages() {
		let cases = [
			(
				ApiErrorCode::DuplicateOrder,
				"There was another identical order already submitted",
			),
			(
				ApiErrorCode::InsufficientFunds,
				"The account doesn't have enough funds",
			),
			(
				ApiErrorCode::InvalidSignature,
				"The order signature is invalid",
			),
			(
				ApiErrorCode::MissingOrderData,
				"The order has missing information",
			),
			(
				ApiErrorCode::UnsupportedToken,
				"One of the traded tokens is not supported",
			),
		];
		for (code, expected) in cases {
			assert_eq!(submission_error_message(400, Some(&api_error(code))), expected);
		}
	}

	#[test]
	fn test_unknown_code_falls_back_to_description() {
		let msg = submission_error_message(400, Some(&api_error(ApiErrorCode::Unknown)));
		assert_eq!(msg, "backend description");
	}

	#[test]
	fn test_http_status_messages() {
		assert_eq!(
			submission_error_message(403, None),
			"The order cannot be accepted. Your account is deny-listed."
		);
		assert!(submission_error_message(429, None).contains("Too many order placements"));
		assert_eq!(submission_error_message(500, None), "Error adding an order");
		assert_eq!(
			submission_error_message(400, None),
			"The order was not accepted by the network"
		);
	}
}
