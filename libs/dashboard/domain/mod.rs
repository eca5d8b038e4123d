//! Domain Layer
//!
//! Inbound frame shapes and the deposit records built from them.

pub mod deposit;
pub mod events;

pub use deposit::{format_amount, DepositRecord, DepositStatus};
pub use events::{
    frame_type, DepositTransaction, DepositUser, NewDepositRequest, WalletUpdate,
    DEPOSIT_VERIFIED, NEW_DEPOSIT_REQUEST, WALLET_UPDATE,
};
