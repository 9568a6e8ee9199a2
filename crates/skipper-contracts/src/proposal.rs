//! One governance item: payload, tallies, expiry and execution flag.
//!
//! State machine: `Uninitialized -> Open -> Expired | Executed`. Votes are
//! only accepted while open; execution happens at most once.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::{Address, Coins, Timestamp};
use tracing::{debug, info, warn};

use crate::context::{excesses, Context, Contract, HandlerResult, OutMessage};
use crate::derive::{ballot_address, ballot_init, proposal_address, ProposalInit};
use crate::error::ExitCode;
use crate::messages::{
    ExecuteProposal, InitProposal, InitVoter, Op, ProposalPayload, UpdateVotes, Vote, VoteRecord,
};

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Proposal {
    id: u64,
    registry: Address,
    is_initialized: bool,
    is_executed: bool,
    initiator: Option<Address>,
    payload: Option<ProposalPayload>,
    votes_yes: Coins,
    votes_no: Coins,
    expires_at: Timestamp,
}

/// Read-only view returned by ledger queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalData {
    pub id: u64,
    pub registry: Address,
    pub is_initialized: bool,
    pub is_executed: bool,
    pub initiator: Option<Address>,
    pub payload: Option<ProposalPayload>,
    pub votes_yes: Coins,
    pub votes_no: Coins,
    pub expires_at: Timestamp,
}

impl Proposal {
    pub fn new(init: ProposalInit) -> Self {
        Self {
            id: init.id,
            registry: init.registry,
            is_initialized: false,
            is_executed: false,
            initiator: None,
            payload: None,
            votes_yes: Coins::zero(),
            votes_no: Coins::zero(),
            expires_at: 0,
        }
    }

    pub fn address(&self) -> Address {
        proposal_address(self.registry, self.id)
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn is_executed(&self) -> bool {
        self.is_executed
    }

    pub fn votes_yes(&self) -> &Coins {
        &self.votes_yes
    }

    pub fn votes_no(&self) -> &Coins {
        &self.votes_no
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn data(&self) -> ProposalData {
        ProposalData {
            id: self.id,
            registry: self.registry,
            is_initialized: self.is_initialized,
            is_executed: self.is_executed,
            initiator: self.initiator,
            payload: self.payload.clone(),
            votes_yes: self.votes_yes.clone(),
            votes_no: self.votes_no.clone(),
            expires_at: self.expires_at,
        }
    }

    fn tally_mut(&mut self, vote: Vote) -> &mut Coins {
        match vote {
            Vote::Yes => &mut self.votes_yes,
            Vote::No => &mut self.votes_no,
        }
    }

    fn on_init(&mut self, ctx: &Context<'_>, msg: InitProposal) -> HandlerResult {
        ctx.require_sender(self.registry, ExitCode::InvalidOwner)?;
        if self.is_initialized {
            return Err(ExitCode::AlreadyInitialized);
        }
        let reserve = &ctx.params.min_storage_fee;
        if &ctx.value + &ctx.balance_before < *reserve {
            return Err(ExitCode::InsufficientStorageFees);
        }

        let lock_period = ctx.params.effective_lock_period(Some(msg.lock_period));
        self.expires_at = ctx.now.saturating_add(lock_period);
        self.initiator = Some(msg.initiator);
        self.payload = Some(msg.payload);
        self.votes_yes = msg.amount.clone();
        self.votes_no = Coins::zero();
        self.is_initialized = true;

        info!(
            proposal = %ctx.myself,
            id = self.id,
            initiator = %msg.initiator,
            expires_at = self.expires_at,
            "Proposal opened"
        );

        // The initiator's weight is already counted above; their ballot
        // records it so a later vote change retracts the right amount.
        let ballot = ballot_address(self.registry, ctx.myself, msg.initiator);
        let voter = InitVoter {
            amount: msg.amount,
            expires_at: self.expires_at,
        };
        Ok(vec![OutMessage::new(ballot, ctx.value_above_reserve(reserve), voter)
            .with_init(ballot_init(self.registry, ctx.myself, msg.initiator))])
    }

    fn on_update_votes(&mut self, ctx: &Context<'_>, msg: UpdateVotes) -> HandlerResult {
        let ballot = ballot_address(self.registry, ctx.myself, msg.owner);
        ctx.require_sender(ballot, ExitCode::InvalidOwner)?;
        if !self.is_initialized {
            return Err(ExitCode::NotInitialized);
        }
        if ctx.now >= self.expires_at {
            return Err(ExitCode::ProposalExpired);
        }
        if self.is_executed {
            return Err(ExitCode::AlreadyExecuted);
        }
        if msg.voter_unlock_date < self.expires_at {
            return Err(ExitCode::UnlockDateInsufficient);
        }

        if let Some(VoteRecord { amount, vote }) = &msg.previous {
            let tally = self.tally_mut(*vote);
            *tally = tally.saturating_sub(amount);
        }
        *self.tally_mut(msg.vote) += &msg.amount;

        debug!(
            proposal = %ctx.myself,
            voter = %msg.owner,
            vote = ?msg.vote,
            amount = %msg.amount,
            yes = %self.votes_yes,
            no = %self.votes_no,
            "Votes updated"
        );
        let change = ctx.value_above_reserve(&ctx.params.min_storage_fee);
        Ok(vec![excesses(msg.owner, change, 0)])
    }

    fn on_execute(&mut self, ctx: &Context<'_>, msg: ExecuteProposal) -> HandlerResult {
        if !self.is_initialized {
            return Err(ExitCode::NotInitialized);
        }
        if self.is_executed {
            return Err(ExitCode::AlreadyExecuted);
        }
        if self.votes_yes < ctx.params.min_yes_votes {
            return Err(ExitCode::NotEnoughVotes);
        }
        if self.votes_no.mul_u32(10_000) > self.votes_yes.mul_u32(ctx.params.veto_threshold_bps) {
            return Err(ExitCode::TooManyNoVotes);
        }
        let payload = self.payload.clone().ok_or(ExitCode::NotInitialized)?;
        self.is_executed = true;

        info!(
            proposal = %ctx.myself,
            id = self.id,
            receiver = %payload.receiver,
            executor = %ctx.sender,
            "Proposal executed"
        );
        Ok(vec![
            OutMessage::new(payload.receiver, Coins::zero(), Op::Raw(payload.body)).non_bounceable(),
            excesses(ctx.sender, ctx.value.clone(), msg.query_id),
        ])
    }
}

impl Contract for Proposal {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::InitProposal(m) => self.on_init(ctx, m),
            Op::UpdateVotes(m) => self.on_update_votes(ctx, m),
            Op::ExecuteProposal(m) => self.on_execute(ctx, m),
            Op::Excesses(_) | Op::Bounced(_) => Ok(vec![]),
            other => {
                warn!(proposal = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ProtocolParams, LOCK_INTERVAL};
    use crate::test_utils::{addr, ctx};

    const NOW: Timestamp = 1_700_000_000;

    fn params() -> ProtocolParams {
        ProtocolParams {
            min_yes_votes: Coins::from(1_000u64),
            ..ProtocolParams::default()
        }
    }

    fn value() -> Coins {
        Coins::from(100_000_000u64)
    }

    fn fresh() -> (Proposal, Address) {
        let p = Proposal::new(ProposalInit {
            registry: addr("registry"),
            id: 1,
        });
        let at = p.address();
        (p, at)
    }

    fn init_msg(amount: u64) -> Op {
        Op::from(InitProposal {
            initiator: addr("alice"),
            amount: Coins::from(amount),
            lock_period: LOCK_INTERVAL,
            payload: ProposalPayload {
                receiver: addr("treasury"),
                body: vec![0xca, 0xfe],
            },
        })
    }

    fn opened(params: &ProtocolParams, amount: u64) -> (Proposal, Address) {
        let (mut p, at) = fresh();
        p.receive(&ctx(params, at, addr("registry"), value(), NOW), init_msg(amount))
            .unwrap();
        (p, at)
    }

    fn vote(owner: &str, amount: u64, vote: Vote, unlock: Timestamp, previous: Option<VoteRecord>) -> Op {
        Op::from(UpdateVotes {
            owner: addr(owner),
            amount: Coins::from(amount),
            vote,
            voter_unlock_date: unlock,
            previous,
        })
    }

    fn ballot_of(at: Address, owner: &str) -> Address {
        ballot_address(addr("registry"), at, addr(owner))
    }

    #[test]
    fn test_init_counts_initiator_and_seeds_ballot() {
        let params = params();
        let (mut p, at) = fresh();
        let out = p
            .receive(&ctx(&params, at, addr("registry"), value(), NOW), init_msg(100_500))
            .unwrap();

        assert!(p.is_initialized());
        assert!(!p.is_executed());
        assert_eq!(p.votes_yes(), &Coins::from(100_500u64));
        assert!(p.votes_no().is_zero());
        assert_eq!(p.expires_at(), NOW + LOCK_INTERVAL);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, ballot_of(at, "alice"));
        assert_eq!(out[0].value, Coins::from(90_000_000u64));
        assert_eq!(
            out[0].op,
            Op::InitVoter(InitVoter {
                amount: Coins::from(100_500u64),
                expires_at: NOW + LOCK_INTERVAL,
            })
        );
    }

    #[test]
    fn test_init_guards() {
        let params = params();
        let (mut p, at) = fresh();
        assert_eq!(
            p.receive(&ctx(&params, at, addr("mallory"), value(), NOW), init_msg(1)),
            Err(ExitCode::InvalidOwner)
        );
        assert_eq!(
            p.receive(&ctx(&params, at, addr("registry"), Coins::from(1u64), NOW), init_msg(1)),
            Err(ExitCode::InsufficientStorageFees)
        );

        let (mut p, at) = opened(&params, 5);
        let before = p.clone();
        assert_eq!(
            p.receive(&ctx(&params, at, addr("registry"), value(), NOW), init_msg(9)),
            Err(ExitCode::AlreadyInitialized)
        );
        assert_eq!(p, before);
    }

    #[test]
    fn test_update_votes_guards() {
        let params = params();
        let expiry = NOW + LOCK_INTERVAL;

        let (mut p, at) = fresh();
        assert_eq!(
            p.receive(
                &ctx(&params, at, ballot_of(at, "bob"), value(), NOW),
                vote("bob", 1, Vote::Yes, expiry, None)
            ),
            Err(ExitCode::NotInitialized)
        );

        let (mut p, at) = opened(&params, 5);
        assert_eq!(
            p.receive(
                &ctx(&params, at, addr("bob"), value(), NOW),
                vote("bob", 1, Vote::Yes, expiry, None)
            ),
            Err(ExitCode::InvalidOwner)
        );
        assert_eq!(
            p.receive(
                &ctx(&params, at, ballot_of(at, "bob"), value(), NOW),
                vote("bob", 1, Vote::Yes, expiry - 1, None)
            ),
            Err(ExitCode::UnlockDateInsufficient)
        );
        assert_eq!(
            p.receive(
                &ctx(&params, at, ballot_of(at, "bob"), value(), expiry),
                vote("bob", 1, Vote::Yes, expiry + 10, None)
            ),
            Err(ExitCode::ProposalExpired)
        );
        assert_eq!(p.votes_yes(), &Coins::from(5u64));
    }

    #[test]
    fn test_vote_change_replaces_contribution() {
        let params = params();
        let expiry = NOW + LOCK_INTERVAL;
        let (mut p, at) = opened(&params, 5);
        let from_bob = ctx(&params, at, ballot_of(at, "bob"), value(), NOW);

        let out = p.receive(&from_bob, vote("bob", 40, Vote::Yes, expiry, None)).unwrap();
        assert_eq!(p.votes_yes(), &Coins::from(45u64));
        assert_eq!(out[0].to, addr("bob"));

        let previous = Some(VoteRecord {
            amount: Coins::from(40u64),
            vote: Vote::Yes,
        });
        p.receive(&from_bob, vote("bob", 60, Vote::No, expiry, previous)).unwrap();
        assert_eq!(p.votes_yes(), &Coins::from(5u64));
        assert_eq!(p.votes_no(), &Coins::from(60u64));
    }

    #[test]
    fn test_execute_thresholds() {
        let params = params();
        let expiry = NOW + LOCK_INTERVAL;
        let executor = addr("anyone");

        let (mut p, at) = fresh();
        assert_eq!(
            p.receive(&ctx(&params, at, executor, value(), NOW), Op::from(ExecuteProposal { query_id: 0 })),
            Err(ExitCode::NotInitialized)
        );

        let (mut p, at) = opened(&params, 999);
        let execute = || Op::from(ExecuteProposal { query_id: 4 });
        assert_eq!(
            p.receive(&ctx(&params, at, executor, value(), NOW), execute()),
            Err(ExitCode::NotEnoughVotes)
        );

        p.receive(
            &ctx(&params, at, ballot_of(at, "bob"), value(), NOW),
            vote("bob", 2_000, Vote::No, expiry, None),
        )
        .unwrap();
        p.receive(
            &ctx(&params, at, ballot_of(at, "carol"), value(), NOW),
            vote("carol", 1, Vote::Yes, expiry, None),
        )
        .unwrap();
        assert_eq!(
            p.receive(&ctx(&params, at, executor, value(), NOW), execute()),
            Err(ExitCode::TooManyNoVotes)
        );

        p.receive(
            &ctx(&params, at, ballot_of(at, "dave"), value(), NOW),
            vote("dave", 1_000, Vote::Yes, expiry, None),
        )
        .unwrap();
        let out = p.receive(&ctx(&params, at, executor, value(), NOW), execute()).unwrap();
        assert!(p.is_executed());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, addr("treasury"));
        assert!(!out[0].bounce);
        assert!(out[0].value.is_zero());
        assert_eq!(out[0].op, Op::Raw(vec![0xca, 0xfe]));
        assert_eq!(out[1].to, executor);
        assert_eq!(out[1].value, value());

        assert_eq!(
            p.receive(&ctx(&params, at, executor, value(), NOW), execute()),
            Err(ExitCode::AlreadyExecuted)
        );
        assert_eq!(
            p.receive(
                &ctx(&params, at, ballot_of(at, "erin"), value(), NOW),
                vote("erin", 1, Vote::Yes, expiry, None)
            ),
            Err(ExitCode::AlreadyExecuted)
        );
    }

    #[test]
    fn test_veto_threshold_is_configurable() {
        let params = ProtocolParams {
            veto_threshold_bps: 5_000,
            ..params()
        };
        let expiry = NOW + LOCK_INTERVAL;
        let (mut p, at) = opened(&params, 2_000);
        // 1_001 no against 2_000 yes exceeds half
        p.receive(
            &ctx(&params, at, ballot_of(at, "bob"), value(), NOW),
            vote("bob", 1_001, Vote::No, expiry, None),
        )
        .unwrap();
        assert_eq!(
            p.receive(&ctx(&params, at, addr("x"), value(), NOW), Op::from(ExecuteProposal { query_id: 0 })),
            Err(ExitCode::TooManyNoVotes)
        );
    }
}
