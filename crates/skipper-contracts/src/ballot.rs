//! One voter's weight and direction on one proposal.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::{Address, Coins, Timestamp};
use tracing::{debug, warn};

use crate::context::{excesses, Context, Contract, HandlerResult, OutMessage};
use crate::derive::{ballot_address, BallotInit};
use crate::error::ExitCode;
use crate::messages::{opcodes, Bounced, InitVoter, Op, UpdateVoterBalance, UpdateVotes, Vote, VoteRecord};

/// Ballot fields that a rejected tally update rolls back.
#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
struct Snapshot {
    is_initialized: bool,
    amount: Coins,
    vote: Vote,
    voter_unlock_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Ballot {
    registry: Address,
    proposal: Address,
    owner: Address,
    is_initialized: bool,
    amount: Coins,
    vote: Vote,
    voter_unlock_date: Timestamp,
    /// Proposal deadline, known once the proposal seeded this ballot
    known_expiry: Option<Timestamp>,
    /// State before the last `UpdateVotes` went out
    pending: Option<Snapshot>,
}

/// Read-only view returned by ledger queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotData {
    pub registry: Address,
    pub proposal: Address,
    pub owner: Address,
    pub is_initialized: bool,
    pub amount: Coins,
    pub vote: Vote,
    pub voter_unlock_date: Timestamp,
}

impl Ballot {
    pub fn new(init: BallotInit) -> Self {
        Self {
            registry: init.registry,
            proposal: init.proposal,
            owner: init.owner,
            is_initialized: false,
            amount: Coins::zero(),
            vote: Vote::Yes,
            voter_unlock_date: 0,
            known_expiry: None,
            pending: None,
        }
    }

    pub fn address(&self) -> Address {
        ballot_address(self.registry, self.proposal, self.owner)
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn amount(&self) -> &Coins {
        &self.amount
    }

    pub fn vote(&self) -> Vote {
        self.vote
    }

    pub fn voter_unlock_date(&self) -> Timestamp {
        self.voter_unlock_date
    }

    pub fn data(&self) -> BallotData {
        BallotData {
            registry: self.registry,
            proposal: self.proposal,
            owner: self.owner,
            is_initialized: self.is_initialized,
            amount: self.amount.clone(),
            vote: self.vote,
            voter_unlock_date: self.voter_unlock_date,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_initialized: self.is_initialized,
            amount: self.amount.clone(),
            vote: self.vote,
            voter_unlock_date: self.voter_unlock_date,
        }
    }

    fn on_init_voter(&mut self, ctx: &Context<'_>, msg: InitVoter) -> HandlerResult {
        ctx.require_sender(self.proposal, ExitCode::InvalidOwner)?;
        if self.is_initialized {
            return Err(ExitCode::AlreadyInitialized);
        }
        self.amount = msg.amount;
        self.vote = Vote::Yes;
        self.voter_unlock_date = msg.expires_at;
        self.known_expiry = Some(msg.expires_at);
        self.is_initialized = true;

        debug!(ballot = %ctx.myself, owner = %self.owner, amount = %self.amount, "Initiator ballot recorded");
        let change = ctx.value_above_reserve(&ctx.params.min_storage_fee);
        Ok(vec![excesses(self.owner, change, 0)])
    }

    fn on_update_balance(&mut self, ctx: &Context<'_>, msg: UpdateVoterBalance) -> HandlerResult {
        ctx.require_sender(self.registry, ExitCode::InvalidOwner)?;
        if msg.amount.is_zero() {
            return Err(ExitCode::InvalidAmount);
        }
        if let Some(expiry) = self.known_expiry {
            if msg.voter_unlock_date < expiry {
                return Err(ExitCode::UnlockDateInsufficient);
            }
        }
        let reserve = &ctx.params.min_storage_fee;
        if &ctx.value + &ctx.balance_before < *reserve {
            return Err(ExitCode::InsufficientStorageFees);
        }

        let previous = self.is_initialized.then(|| VoteRecord {
            amount: self.amount.clone(),
            vote: self.vote,
        });
        self.pending = Some(self.snapshot());
        self.amount = msg.amount.clone();
        self.vote = msg.vote;
        self.voter_unlock_date = msg.voter_unlock_date;
        self.is_initialized = true;

        debug!(
            ballot = %ctx.myself,
            owner = %self.owner,
            vote = ?msg.vote,
            amount = %msg.amount,
            "Forwarding vote to proposal"
        );
        let update = UpdateVotes {
            owner: self.owner,
            amount: msg.amount,
            vote: msg.vote,
            voter_unlock_date: msg.voter_unlock_date,
            previous,
        };
        Ok(vec![OutMessage::new(self.proposal, ctx.value_above_reserve(reserve), update)])
    }

    fn on_bounced(&mut self, ctx: &Context<'_>, msg: Bounced) -> HandlerResult {
        if ctx.sender != self.proposal || msg.opcode != opcodes::UPDATE_VOTES {
            return Ok(vec![]);
        }
        if let Some(snapshot) = self.pending.take() {
            warn!(ballot = %ctx.myself, owner = %self.owner, "Vote rejected by proposal, restoring ballot");
            self.is_initialized = snapshot.is_initialized;
            self.amount = snapshot.amount;
            self.vote = snapshot.vote;
            self.voter_unlock_date = snapshot.voter_unlock_date;
        }
        let change = ctx.value_above_reserve(&ctx.params.min_storage_fee);
        Ok(vec![excesses(self.owner, change, 0)])
    }
}

impl Contract for Ballot {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::InitVoter(m) => self.on_init_voter(ctx, m),
            Op::UpdateVoterBalance(m) => self.on_update_balance(ctx, m),
            Op::Bounced(m) => self.on_bounced(ctx, m),
            Op::Excesses(_) => Ok(vec![]),
            other => {
                warn!(ballot = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}
