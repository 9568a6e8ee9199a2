use thiserror::Error;

use crate::messages::CodecError;

/// Reasons an actor rejects the message it is processing.
///
/// Every variant carries a stable numeric exit code that is surfaced to the
/// originator of the transaction. Nothing is recovered locally: a rejected
/// message leaves the actor's state untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    #[error("Sender is not the expected caller")]
    InvalidOwner,

    #[error("Attached value is below the minimum fee")]
    NeedFee,

    #[error("Unlock date has not arrived")]
    UnlockDateNotArrived,

    #[error("Not enough yes votes")]
    NotEnoughVotes,

    #[error("Too many no votes")]
    TooManyNoVotes,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Proposal expired")]
    ProposalExpired,

    #[error("Proposal already executed")]
    AlreadyExecuted,

    #[error("Unknown proxy operation")]
    ProxyOpCodeNotFound,

    #[error("Voter unlock date does not cover the proposal lifetime")]
    UnlockDateInsufficient,

    #[error("Invalid lock period")]
    InvalidLockPeriod,

    #[error("Lock period too short")]
    LockPeriodTooShort,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Attached value cannot cover storage")]
    InsufficientStorageFees,

    #[error("Message body could not be decoded")]
    MalformedBody,

    #[error("Outgoing value exceeds account balance")]
    NotEnoughBalance,

    #[error("Destination has no deployed actor")]
    AccountNotDeployed,

    #[error("Message not handled by this actor")]
    InvalidMessage,
}

impl ExitCode {
    /// Numeric code reported in transaction outcomes.
    pub fn code(&self) -> i32 {
        match self {
            ExitCode::InvalidOwner => 132,
            ExitCode::NeedFee => 6901,
            ExitCode::UnlockDateNotArrived => 6902,
            ExitCode::NotEnoughVotes => 6903,
            ExitCode::TooManyNoVotes => 6904,
            ExitCode::NotInitialized => 6905,
            ExitCode::AlreadyInitialized => 6906,
            ExitCode::ProposalExpired => 6907,
            ExitCode::AlreadyExecuted => 6908,
            ExitCode::ProxyOpCodeNotFound => 6909,
            ExitCode::UnlockDateInsufficient => 6910,
            ExitCode::InvalidLockPeriod => 6911,
            ExitCode::LockPeriodTooShort => 6912,
            ExitCode::InvalidAmount => 6913,
            ExitCode::InsufficientStorageFees => 6914,
            ExitCode::MalformedBody => 9,
            ExitCode::NotEnoughBalance => 37,
            ExitCode::AccountNotDeployed => -1,
            ExitCode::InvalidMessage => 130,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        ALL_EXIT_CODES.iter().copied().find(|e| e.code() == code)
    }
}

const ALL_EXIT_CODES: [ExitCode; 19] = [
    ExitCode::InvalidOwner,
    ExitCode::NeedFee,
    ExitCode::UnlockDateNotArrived,
    ExitCode::NotEnoughVotes,
    ExitCode::TooManyNoVotes,
    ExitCode::NotInitialized,
    ExitCode::AlreadyInitialized,
    ExitCode::ProposalExpired,
    ExitCode::AlreadyExecuted,
    ExitCode::ProxyOpCodeNotFound,
    ExitCode::UnlockDateInsufficient,
    ExitCode::InvalidLockPeriod,
    ExitCode::LockPeriodTooShort,
    ExitCode::InvalidAmount,
    ExitCode::InsufficientStorageFees,
    ExitCode::MalformedBody,
    ExitCode::NotEnoughBalance,
    ExitCode::AccountNotDeployed,
    ExitCode::InvalidMessage,
];

impl From<CodecError> for ExitCode {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownOpcode(_) => ExitCode::ProxyOpCodeNotFound,
            CodecError::Truncated(_) | CodecError::Body { .. } => ExitCode::MalformedBody,
        }
    }
}
