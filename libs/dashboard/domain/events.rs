//! Inbound frame shapes pushed by the backend

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const NEW_DEPOSIT_REQUEST: &str = "new_deposit_request";
pub const WALLET_UPDATE: &str = "wallet_update";
pub const DEPOSIT_VERIFIED: &str = "deposit_verified";

/// `new_deposit_request` frame
#[derive(Debug, Clone, Deserialize)]
pub struct NewDepositRequest {
    /// Usually `"deposit_created"`
    #[serde(default)]
    pub event: Option<String>,
    pub transaction: DepositTransaction,
    #[serde(default)]
    pub user: DepositUser,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositTransaction {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub transfer_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepositUser {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `wallet_update` frame
#[derive(Debug, Clone, Deserialize)]
pub struct WalletUpdate {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl WalletUpdate {
    pub fn is_deposit_verified(&self) -> bool {
        self.event.as_deref() == Some(DEPOSIT_VERIFIED)
    }
}

/// `type` field of a frame, if any
pub fn frame_type(frame: &Value) -> Option<&str> {
    frame.get("type").and_then(Value::as_str)
}

// Ids arrive as strings or numbers depending on the backend table
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(id)),
        Value::Number(id) => Ok(Some(id.to_string())),
        other => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(amount) => amount
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount out of range")),
        Value::String(amount) => amount
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid amount: {:?}", amount))),
        other => Err(D::Error::custom(format!("invalid amount: {}", other))),
    }
}
