//! Skipper Runtime - a ledger that hosts the governance actors.
//!
//! This crate provides:
//! - Accounts with native balances and a settable clock
//! - FIFO message delivery to quiescence, deploy-by-init and bounces
//! - A per-send transaction trace with filters for assertions
//! - A token master and wallet for deposits and withdrawals
//! - JSON snapshots of the whole ledger

pub mod actor;
pub mod deployment;
pub mod error;
pub mod ledger;
pub mod token;
pub mod trace;

pub use actor::Actor;
pub use deployment::{action_value, Deployment};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, DEFAULT_MESSAGE_LIMIT, GENESIS_TIME};
pub use token::{token_master_address, token_wallet_address, TokenMaster, TokenWallet};
pub use trace::{Outcome, TxFilter, TxRecord};
