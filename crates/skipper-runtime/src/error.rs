use skipper_contracts::ActorKind;
use skipper_types::{Address, Coins};
use thiserror::Error;

/// Errors raised by the ledger itself, as opposed to an actor rejecting a
/// message (those are recorded in the transaction trace).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Message limit reached: more than {limit} transactions in one send")]
    MessageLimit { limit: usize },

    #[error("Insufficient balance on {account}: required {required}, have {have}")]
    InsufficientBalance {
        account: Address,
        required: Coins,
        have: Coins,
    },

    #[error("Message to {to} rejected with exit code {exit_code}")]
    Rejected { to: Address, exit_code: i32 },

    #[error("No actor deployed at {0}")]
    NotDeployed(Address),

    #[error("Actor at {address} is not a {expected:?}")]
    WrongKind { address: Address, expected: ActorKind },

    #[error("Invalid protocol parameters: {0}")]
    Params(#[from] skipper_contracts::params::ParamsError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
