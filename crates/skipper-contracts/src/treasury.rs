//! Receiver of executed proposal payloads.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::{Address, Coins};
use tracing::debug;

use crate::context::{Context, Contract, HandlerResult};
use crate::derive::{ActorInit, TreasuryInit};
use crate::messages::Op;

/// Accepts any payload and keeps a record of what governance sent it.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Treasury {
    admin: Address,
    received: Vec<Vec<u8>>,
    total_value: Coins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryData {
    pub admin: Address,
    /// Payload bodies in arrival order
    pub received: Vec<Vec<u8>>,
    pub total_value: Coins,
}

impl Treasury {
    pub fn new(init: TreasuryInit) -> Self {
        Self {
            admin: init.admin,
            received: Vec::new(),
            total_value: Coins::zero(),
        }
    }

    pub fn address(&self) -> Address {
        ActorInit::Treasury(TreasuryInit { admin: self.admin }).address()
    }

    pub fn received(&self) -> &[Vec<u8>] {
        &self.received
    }

    pub fn data(&self) -> TreasuryData {
        TreasuryData {
            admin: self.admin,
            received: self.received.clone(),
            total_value: self.total_value.clone(),
        }
    }
}

impl Contract for Treasury {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        self.total_value += &ctx.value;
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::Raw(body) if body.is_empty() => Ok(vec![]),
            other => {
                debug!(treasury = %ctx.myself, from = %ctx.sender, op = other.name(), "Payload received");
                self.received.push(other.encode());
                Ok(vec![])
            }
        }
    }
}
