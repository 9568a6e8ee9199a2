//! Property tests over whole ledger runs.

use proptest::prelude::*;
use skipper_contracts::messages::UnlockJettons;
use skipper_contracts::params::LOCK_MIN_INTERVAL;
use skipper_contracts::{ExitCode, OutMessage, ProtocolParams};
use skipper_runtime::{Deployment, Ledger, TxFilter};
use skipper_types::Coins;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_locked_amount_is_sum_of_deposits(amounts in prop::collection::vec(1u64..1_000_000, 1..6)) {
        let mut ledger = Ledger::new(ProtocolParams::default()).unwrap();
        let deployer = ledger.user("deployer");
        let gov = Deployment::deploy(&mut ledger, deployer, 0).unwrap();
        let alice = ledger.user("alice");
        gov.deploy_vault(&mut ledger, alice).unwrap();

        let total: u64 = amounts.iter().sum();
        gov.mint(&mut ledger, alice, Coins::from(total)).unwrap();
        for amount in &amounts {
            let outcome = gov.deposit(&mut ledger, alice, Coins::from(*amount)).unwrap();
            prop_assert!(outcome.is_success());
        }

        let vault = gov.vault_of(alice);
        prop_assert_eq!(ledger.vault_data(vault).unwrap().amount, Coins::from(total));
        prop_assert!(ledger.token_balance(gov.master, alice).is_zero());
    }

    #[test]
    fn prop_early_unlock_never_releases(
        lock in LOCK_MIN_INTERVAL..10 * LOCK_MIN_INTERVAL,
        wait in 0u64..LOCK_MIN_INTERVAL,
        underpaid in any::<bool>(),
    ) {
        let mut ledger = Ledger::new(ProtocolParams::default()).unwrap();
        let deployer = ledger.user("deployer");
        let gov = Deployment::deploy(&mut ledger, deployer, 0).unwrap();
        let alice = ledger.user("alice");
        gov.deploy_vault(&mut ledger, alice).unwrap();
        gov.mint(&mut ledger, alice, Coins::from(77u64)).unwrap();
        gov.deposit(&mut ledger, alice, Coins::from(77u64)).unwrap();

        gov.lock(&mut ledger, alice, lock).unwrap();
        ledger.advance(wait.min(lock - 1));
        let outcome = if underpaid {
            let unlock = UnlockJettons { query_id: 0 };
            ledger.send(alice, OutMessage::new(gov.vault_of(alice), Coins::from(1u64), unlock)).unwrap()
        } else {
            gov.unlock(&mut ledger, alice).unwrap()
        };

        prop_assert!(outcome.has_transaction(&TxFilter::new().exit(ExitCode::UnlockDateNotArrived)));
        prop_assert_eq!(ledger.vault_data(gov.vault_of(alice)).unwrap().amount, Coins::from(77u64));
    }

    #[test]
    fn prop_ballot_address_only_from_canonical_owner(id in 0u64..1_000, name in "[a-z]{1,12}") {
        let mut ledger = Ledger::new(ProtocolParams::default()).unwrap();
        let deployer = ledger.user("deployer");
        let gov = Deployment::deploy(&mut ledger, deployer, 0).unwrap();
        let owner = ledger.user(&name);

        let ballot = gov.ballot(id, owner);
        prop_assert_eq!(ballot, gov.ballot(id, owner));
        prop_assert_ne!(ballot, gov.ballot(id + 1, owner));
        prop_assert_ne!(ballot, owner);
    }
}
