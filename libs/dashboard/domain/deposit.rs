//! Deposit records shown in the admin deposit list

use crate::domain::events::NewDepositRequest;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DepositStatus {
    Pending,
    Success,
    Failed,
}

impl DepositStatus {
    /// Map the backend's status strings onto the three dashboard states
    ///
    /// Unknown or missing statuses count as pending.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Pending;
        };

        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" | "SUCCEEDED" | "COMPLETED" | "APPROVED" | "VERIFIED" | "PAID" => {
                Self::Success
            }
            "FAILED" | "FAILURE" | "REJECTED" | "CANCELLED" | "CANCELED" | "EXPIRED" | "ERROR" => {
                Self::Failed
            }
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deposit request as stored in dashboard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub amount: f64,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub transfer_code: Option<String>,
    pub status: DepositStatus,
    /// Backend timestamp, passed through verbatim
    pub created_at: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl DepositRecord {
    pub fn from_request(request: &NewDepositRequest, received_at: DateTime<Utc>) -> Self {
        let transaction = &request.transaction;
        let user = &request.user;

        Self {
            id: transaction.id.clone(),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            amount: transaction.amount,
            bank_name: transaction.bank_name.clone(),
            bank_account: transaction.bank_account.clone(),
            transfer_code: transaction.transfer_code.clone(),
            status: DepositStatus::normalize(transaction.status.as_deref()),
            created_at: transaction.created_at.clone().or_else(|| request.timestamp.clone()),
            received_at,
        }
    }

    /// Normalize a raw `new_deposit_request` frame
    pub fn from_frame(frame: &Value) -> Result<Self> {
        let request = NewDepositRequest::deserialize(frame)
            .context("Malformed new_deposit_request frame")?;
        Ok(Self::from_request(&request, Utc::now()))
    }

    /// Who asked for the deposit, for alerts
    pub fn requester(&self) -> &str {
        self.user_name
            .as_deref()
            .or(self.user_email.as_deref())
            .or(self.user_id.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Format an amount with thousands separators, dropping a zero fraction
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let rounded = (amount.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative && (whole > 0 || cents > 0) { "-" } else { "" };
    if cents == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_normalization() {
        assert_eq!(DepositStatus::normalize(Some("PENDING")), DepositStatus::Pending);
        assert_eq!(DepositStatus::normalize(Some("pending")), DepositStatus::Pending);
        assert_eq!(DepositStatus::normalize(Some(" success ")), DepositStatus::Success);
        assert_eq!(DepositStatus::normalize(Some("completed")), DepositStatus::Success);
        assert_eq!(DepositStatus::normalize(Some("Rejected")), DepositStatus::Failed);
        assert_eq!(DepositStatus::normalize(Some("failed")), DepositStatus::Failed);
        assert_eq!(DepositStatus::normalize(Some("weird")), DepositStatus::Pending);
        assert_eq!(DepositStatus::normalize(None), DepositStatus::Pending);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_value(DepositStatus::Success).unwrap(), json!("SUCCESS"));
        assert_eq!(DepositStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_record_from_frame() {
        let frame = json!({
            "type": "new_deposit_request",
            "event": "deposit_created",
            "transaction": {
                "id": "t1",
                "status": "PENDING",
                "amount": 500000,
                "bank_name": "VCB",
                "bank_account": "0123",
                "transfer_code": "NAP123",
                "created_at": "2024-05-01T10:00:00Z"
            },
            "user": {"id": "u1", "email": "a@b.com"},
            "message": "New deposit",
            "timestamp": "2024-05-01T10:00:01Z"
        });

        let record = DepositRecord::from_frame(&frame).unwrap();
        assert_eq!(record.id, "t1");
        assert_eq!(record.status, DepositStatus::Pending);
        assert_eq!(record.amount, 500000.0);
        assert_eq!(record.transfer_code.as_deref(), Some("NAP123"));
        assert_eq!(record.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(record.requester(), "a@b.com");
    }

    #[test]
    fn test_created_at_falls_back_to_timestamp() {
        let frame = json!({
            "transaction": {"id": "t2", "amount": 1},
            "timestamp": "2024-05-01T10:00:01Z"
        });
        let record = DepositRecord::from_frame(&frame).unwrap();
        assert_eq!(record.created_at.as_deref(), Some("2024-05-01T10:00:01Z"));
        assert_eq!(record.requester(), "unknown user");
    }

    #[test]
    fn test_from_frame_rejects_missing_transaction() {
        assert!(DepositRecord::from_frame(&json!({"type": "new_deposit_request"})).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(500000.0), "500,000");
        assert_eq!(format_amount(1234567.5), "1,234,567.50");
        assert_eq!(format_amount(-2000.0), "-2,000");
    }
}
