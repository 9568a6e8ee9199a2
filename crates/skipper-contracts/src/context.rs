//! What an actor sees while handling one message, and what it may emit.

use skipper_types::{Address, Coins, Timestamp};

use crate::derive::ActorInit;
use crate::error::ExitCode;
use crate::messages::{DeployOk, Excesses, Op};
use crate::params::ProtocolParams;

/// Execution context for a single inbound message.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    /// Address of the actor handling the message
    pub myself: Address,
    /// Address the message came from
    pub sender: Address,
    /// Value attached to the message
    pub value: Coins,
    /// Account balance before the attached value was credited
    pub balance_before: Coins,
    /// Ledger time of this transaction
    pub now: Timestamp,
    pub params: &'a ProtocolParams,
}

impl<'a> Context<'a> {
    /// Fail with `err` unless the message came from `expected`.
    pub fn require_sender(&self, expected: Address, err: ExitCode) -> Result<(), ExitCode> {
        if self.sender == expected {
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Part of the inbound value left after topping the account up to
    /// `reserve`.
    pub fn value_above_reserve(&self, reserve: &Coins) -> Coins {
        let missing = reserve.saturating_sub(&self.balance_before);
        self.value.saturating_sub(&missing)
    }

    /// Acknowledge a `Deploy`, returning whatever the inbound value leaves
    /// above the storage reserve.
    pub fn deploy_ok(&self, query_id: u64) -> HandlerResult {
        let value = self.value_above_reserve(&self.params.min_storage_fee);
        Ok(vec![OutMessage::new(self.sender, value, DeployOk { query_id }).non_bounceable()])
    }
}

/// Change returned to `to`.
pub fn excesses(to: Address, value: Coins, query_id: u64) -> OutMessage {
    OutMessage::new(to, value, Excesses { query_id }).non_bounceable()
}

/// A message emitted by an actor, delivered after the current one commits.
#[derive(Debug, Clone, PartialEq)]
pub struct OutMessage {
    pub to: Address,
    pub value: Coins,
    pub bounce: bool,
    /// Deploys the destination on first delivery
    pub init: Option<ActorInit>,
    pub op: Op,
}

impl OutMessage {
    pub fn new(to: Address, value: Coins, op: impl Into<Op>) -> Self {
        Self {
            to,
            value,
            bounce: true,
            init: None,
            op: op.into(),
        }
    }

    pub fn with_init(mut self, init: ActorInit) -> Self {
        self.init = Some(init);
        self
    }

    pub fn non_bounceable(mut self) -> Self {
        self.bounce = false;
        self
    }
}

pub type HandlerResult = Result<Vec<OutMessage>, ExitCode>;

/// Message handler implemented by every actor.
///
/// Handlers must leave `self` untouched when they return an error; the
/// runtime additionally runs them against a scratch copy and only commits
/// on success.
pub trait Contract {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult;
}
