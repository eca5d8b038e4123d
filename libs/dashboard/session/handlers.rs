//! Reactions to domain events pushed over the sockets

use crate::domain::{format_amount, frame_type, DepositRecord, WalletUpdate, WALLET_UPDATE};
use crate::state::{AlertKind, DashboardSink, DepositStore, RefreshTarget};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// What a notifications-channel frame turned out to be
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationOutcome {
    DepositVerified { amount: f64 },
    Other,
}

/// Handle a `new_deposit_request` frame
///
/// Returns the inserted record, `None` for malformed frames and for ids
/// already in the store.
pub fn on_new_deposit_request(
    deposits: &DepositStore,
    sink: &DashboardSink,
    frame: &Value,
) -> Option<DepositRecord> {
    let record = match DepositRecord::from_frame(frame) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Ignoring deposit request");
            return None;
        }
    };

    if !deposits.insert(record.clone()) {
        debug!(id = %record.id, "Deposit already listed, ignoring redelivery");
        return None;
    }

    info!(
        id = %record.id,
        amount = record.amount,
        status = %record.status,
        "New deposit request"
    );

    sink.refresh(RefreshTarget::Notifications);
    sink.refresh(RefreshTarget::DepositOverview);
    sink.alert(
        AlertKind::NewDeposit,
        format!(
            "New deposit request from {}: {}",
            record.requester(),
            format_amount(record.amount)
        ),
    );

    Some(record)
}

/// Handle any frame received on the notifications endpoint
pub fn on_notifications_message(sink: &DashboardSink, frame: &Value) -> NotificationOutcome {
    let verified = (frame_type(frame) == Some(WALLET_UPDATE))
        .then(|| WalletUpdate::deserialize(frame).ok())
        .flatten()
        .filter(WalletUpdate::is_deposit_verified);

    match verified {
        Some(update) => {
            info!(amount = update.amount, "Deposit verified");
            sink.refresh(RefreshTarget::Deposits);
            sink.refresh(RefreshTarget::DepositOverview);
            sink.refresh(RefreshTarget::Notifications);
            sink.alert(
                AlertKind::DepositVerified,
                format!("Deposit verified: {}", format_amount(update.amount)),
            );
            NotificationOutcome::DepositVerified {
                amount: update.amount,
            }
        }
        None => {
            sink.refresh(RefreshTarget::Notifications);
            NotificationOutcome::Other
        }
    }
}
