use proptest::prelude::*;
use skipper_contracts::messages::{Op, UpdateVotes, Vote};
use skipper_contracts::params::ProtocolParams;
use skipper_contracts::{ballot_address, proposal_address, registry_address, Context, Contract, ExitCode};
use skipper_contracts::{derive::ProposalInit, Proposal};
use skipper_types::{Address, Coins};

fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

proptest! {
    #[test]
    fn prop_ballot_address_is_pure(registry in address(), id in any::<u64>(), owner in address()) {
        let proposal = proposal_address(registry, id);
        prop_assert_eq!(
            ballot_address(registry, proposal, owner),
            ballot_address(registry, proposal, owner)
        );
    }

    #[test]
    fn prop_update_votes_only_from_derived_ballot(owner in address(), sender in address()) {
        let registry = registry_address(Address::from_seed("master"));
        let mut proposal = Proposal::new(ProposalInit { registry, id: 0 });
        let myself = proposal.address();
        prop_assume!(sender != ballot_address(registry, myself, owner));

        let params = ProtocolParams::default();
        let ctx = Context {
            myself,
            sender,
            value: Coins::from(1u64),
            balance_before: Coins::zero(),
            now: 0,
            params: &params,
        };
        let before = proposal.clone();
        let op = Op::from(UpdateVotes {
            owner,
            amount: Coins::from(1u64),
            vote: Vote::Yes,
            voter_unlock_date: u64::MAX,
            previous: None,
        });
        prop_assert_eq!(proposal.receive(&ctx, op), Err(ExitCode::InvalidOwner));
        prop_assert_eq!(proposal, before);
    }

    #[test]
    fn prop_effective_lock_period_bounds(requested in proptest::option::of(any::<u64>())) {
        let params = ProtocolParams::default();
        let period = params.effective_lock_period(requested);
        prop_assert!(period >= params.lock_min_interval);
        match requested {
            Some(p) if p >= params.lock_min_interval => prop_assert_eq!(period, p),
            Some(0) | None => prop_assert_eq!(period, params.lock_interval),
            Some(_) => prop_assert_eq!(period, params.lock_min_interval),
        }
    }
}
