//! Stateless router between vaults and per-proposal actors.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::Address;
use tracing::{debug, warn};

use crate::context::{excesses, Context, Contract, HandlerResult, OutMessage};
use crate::derive::{
    ballot_address, ballot_init, proposal_address, proposal_init, registry_address, vault_address,
    RegistryInit,
};
use crate::error::ExitCode;
use crate::messages::{
    Bounced, InitProposal, Op, ProposalPayload, ProxyMessage, RegistryRequest, UpdateVoterBalance,
};

/// Dispatches relayed governance requests to derived proposal and ballot
/// addresses. Holds nothing but the token it governs.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Registry {
    token_kind: Address,
}

impl Registry {
    pub fn new(init: RegistryInit) -> Self {
        Self {
            token_kind: init.token_kind,
        }
    }

    pub fn token_kind(&self) -> Address {
        self.token_kind
    }

    pub fn address(&self) -> Address {
        registry_address(self.token_kind)
    }

    fn on_proxy(&self, ctx: &Context<'_>, msg: ProxyMessage) -> HandlerResult {
        ctx.require_sender(vault_address(msg.owner, self.token_kind), ExitCode::InvalidOwner)?;

        match RegistryRequest::decode(&msg.payload)? {
            RegistryRequest::RequestNewProposal(req) => {
                let proposal = proposal_address(ctx.myself, req.proposal_id);
                debug!(
                    registry = %ctx.myself,
                    %proposal,
                    id = req.proposal_id,
                    initiator = %msg.owner,
                    "Routing new proposal"
                );
                let init = InitProposal {
                    initiator: msg.owner,
                    amount: msg.amount,
                    lock_period: ctx.params.effective_lock_period(msg.lock_period),
                    payload: ProposalPayload {
                        receiver: req.receiver,
                        body: req.body,
                    },
                };
                Ok(vec![OutMessage::new(proposal, ctx.value.clone(), init)
                    .with_init(proposal_init(ctx.myself, req.proposal_id))])
            }
            RegistryRequest::VoteForProposal(req) => {
                let proposal = proposal_address(ctx.myself, req.proposal_id);
                let ballot = ballot_address(ctx.myself, proposal, msg.owner);
                debug!(
                    registry = %ctx.myself,
                    %ballot,
                    id = req.proposal_id,
                    voter = %msg.owner,
                    vote = ?req.vote,
                    "Routing vote"
                );
                let update = UpdateVoterBalance {
                    owner: msg.owner,
                    amount: msg.amount,
                    vote: req.vote,
                    voter_unlock_date: msg.voter_unlock_date,
                };
                Ok(vec![OutMessage::new(ballot, ctx.value.clone(), update)
                    .with_init(ballot_init(ctx.myself, proposal, msg.owner))])
            }
        }
    }

    /// Hand the value of a rejected route back to the holder it was sent
    /// for. Only the inbound value moves, so a forged notice refunds nothing
    /// but the forger's own coins.
    fn on_bounced(&self, ctx: &Context<'_>, msg: Bounced) -> HandlerResult {
        let holder = match msg.original() {
            Ok(Op::InitProposal(m)) => m.initiator,
            Ok(Op::UpdateVoterBalance(m)) => m.owner,
            _ => return Ok(vec![]),
        };
        if ctx.value.is_zero() {
            return Ok(vec![]);
        }
        debug!(
            registry = %ctx.myself,
            from = %ctx.sender,
            %holder,
            value = %ctx.value,
            "Refunding rejected route"
        );
        Ok(vec![excesses(holder, ctx.value.clone(), 0)])
    }
}

impl Contract for Registry {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::ProxyMessage(m) => self.on_proxy(ctx, m),
            Op::Bounced(m) => self.on_bounced(ctx, m),
            Op::Excesses(_) => Ok(vec![]),
            other => {
                warn!(registry = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}
