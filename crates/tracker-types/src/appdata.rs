//! App-data metadata documents.
//!
//! Orders carry a 32-byte `appData` hash identifying the front-end (and an
//! optional referrer) that produced them. The document itself is a small JSON
//! blob; only its keccak-256 hash goes on the wire.

use crate::common::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_CODE: &str = "SwapTracker";
pub const APP_DATA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralMetadata {
	pub referrer: Address,
	pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDoc {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub referrer: Option<ReferralMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataDoc {
	pub version: String,
	pub app_code: String,
	pub metadata: MetadataDoc,
}

/// Builds the default document for this application.
pub fn generate_app_data_doc(metadata: MetadataDoc) -> AppDataDoc {
	AppDataDoc {
		version: APP_DATA_VERSION.to_string(),
		app_code: DEFAULT_APP_CODE.to_string(),
		metadata,
	}
}

/// Builds a document carrying a referral entry.
pub fn generate_referral_metadata_doc(referrer: Address) -> AppDataDoc {
	generate_app_data_doc(MetadataDoc {
		referrer: Some(ReferralMetadata {
			referrer,
			version: APP_DATA_VERSION.to_string(),
		}),
	})
}

/// Keccak-256 hash of the serialized document, as placed in `appData`.
pub fn hash_app_data(doc: &AppDataDoc) -> B256 {
	// serde_json keeps struct field order, so the encoding is stable
	let encoded = serde_json::to_vec(doc).expect("app data doc serialization cannot fail");
	keccak256(&encoded)
}
