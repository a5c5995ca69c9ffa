//! Account management: the signing seam and its local-key implementation.
//!
//! Workflows that need a signature depend on [`SignerInterface`] only, so
//! tests can swap in a deterministic or failing signer.

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use thiserror::Error;
use tracker_types::{keccak256, Address, Signature, TrackerError, B256};

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Invalid private key: {0}")]
	InvalidKey(String),

	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

impl From<AccountError> for TrackerError {
	fn from(e: AccountError) -> Self {
		TrackerError::Account(e.to_string())
	}
}

/// Signing surface the workflows depend on.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	fn address(&self) -> Address;

	/// EIP-191 personal-message signature over `message`.
	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError>;
}

/// In-process wallet around a raw private key.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	pub fn from_private_key(key: &str) -> Result<Self, AccountError> {
		let signer = key
			.trim_start_matches("0x")
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;
		Ok(Self { signer })
	}
}

#[async_trait]
impl SignerInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, AccountError> {
		let signature = self
			.signer
			.sign_message(message)
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		Ok(Signature(signature.as_bytes().to_vec()))
	}
}

/// The digest an owner signs to soft-cancel an order.
pub fn cancellation_digest(uid: &str) -> B256 {
	keccak256(uid.as_bytes())
}
