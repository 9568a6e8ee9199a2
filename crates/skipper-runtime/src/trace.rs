//! Transaction trace of one top-level send.

use serde::{Deserialize, Serialize};
use skipper_contracts::ExitCode;
use skipper_types::{Address, Coins, Hash};

/// One processed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    pub hash: Hash,
    pub from: Address,
    pub to: Address,
    pub opcode: u32,
    pub op: String,
    pub value: Coins,
    pub success: bool,
    /// Numeric exit code when the handler rejected the message
    pub exit_code: Option<i32>,
    /// The destination was deployed by this message
    pub deployed: bool,
    /// A failed bounceable message whose value went back to the sender
    pub aborted: bool,
}

impl TxRecord {
    pub fn exit(&self) -> Option<ExitCode> {
        self.exit_code.and_then(ExitCode::from_code)
    }
}

/// Matches transactions by any subset of their fields.
#[derive(Debug, Clone, Default)]
pub struct TxFilter {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub opcode: Option<u32>,
    pub success: Option<bool>,
    pub exit_code: Option<i32>,
    pub deployed: Option<bool>,
}

impl TxFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn opcode(mut self, opcode: u32) -> Self {
        self.opcode = Some(opcode);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Matches a failed transaction with this exit code.
    pub fn exit(mut self, code: ExitCode) -> Self {
        self.success = Some(false);
        self.exit_code = Some(code.code());
        self
    }

    pub fn deployed(mut self, deployed: bool) -> Self {
        self.deployed = Some(deployed);
        self
    }

    pub fn matches(&self, tx: &TxRecord) -> bool {
        self.from.map_or(true, |v| v == tx.from)
            && self.to.map_or(true, |v| v == tx.to)
            && self.opcode.map_or(true, |v| v == tx.opcode)
            && self.success.map_or(true, |v| v == tx.success)
            && self.exit_code.map_or(true, |v| Some(v) == tx.exit_code)
            && self.deployed.map_or(true, |v| v == tx.deployed)
    }
}

/// Every transaction processed while draining one top-level send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub transactions: Vec<TxRecord>,
}

impl Outcome {
    pub fn has_transaction(&self, filter: &TxFilter) -> bool {
        self.transactions.iter().any(|tx| filter.matches(tx))
    }

    pub fn find(&self, filter: &TxFilter) -> Option<&TxRecord> {
        self.transactions.iter().find(|tx| filter.matches(tx))
    }

    /// First rejected transaction, if any.
    pub fn first_failure(&self) -> Option<&TxRecord> {
        self.transactions.iter().find(|tx| !tx.success)
    }

    pub fn is_success(&self) -> bool {
        self.first_failure().is_none()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
