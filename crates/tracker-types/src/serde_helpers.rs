//! Custom serde modules for wire formats the backend uses.

/// Amounts travel as decimal strings to avoid floating-point loss.
pub mod u256_decimal {
	use alloy_primitives::U256;
	use serde::{de, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10)
			.map_err(|e| de::Error::custom(format!("invalid decimal amount {:?}: {}", s, e)))
	}
}
