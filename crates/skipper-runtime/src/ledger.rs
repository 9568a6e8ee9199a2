//! Account-based ledger that delivers actor messages to quiescence.
//!
//! A top-level [`Ledger::send`] enqueues one message; every message an actor
//! emits while handling it is appended to the same FIFO queue, and the call
//! returns once the queue is empty. Handlers run against a copy of the actor
//! and are committed only on success.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use skipper_contracts::messages::{Bounced, Deploy};
use skipper_contracts::{
    ActorInit, ActorKind, BallotData, Context, Contract, ExitCode, Op, OutMessage, ProposalData,
    ProtocolParams, TreasuryData, VaultData,
};
use skipper_types::{Address, Coins, Hash, Timestamp};
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::error::{LedgerError, Result};
use crate::token::token_wallet_address;
use crate::trace::{Outcome, TxRecord};

/// Ledger time at creation.
pub const GENESIS_TIME: Timestamp = 1_700_000_000;
/// Transactions processed per top-level send before it is aborted.
pub const DEFAULT_MESSAGE_LIMIT: usize = 256;

/// Native value given to every new user account: one million units.
pub fn user_funds() -> Coins {
    Coins::whole(1_000_000)
}

#[derive(Debug)]
struct Envelope {
    from: Address,
    msg: OutMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    params: ProtocolParams,
    now: Timestamp,
    message_limit: usize,
    /// Externally owned accounts; they accept any message
    users: BTreeSet<Address>,
    /// Human-readable names for addresses
    names: BTreeMap<String, Address>,
    balances: BTreeMap<Address, Coins>,
    actors: BTreeMap<Address, Actor>,
    tx_count: u64,
}

impl Ledger {
    pub fn new(params: ProtocolParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            now: GENESIS_TIME,
            message_limit: DEFAULT_MESSAGE_LIMIT,
            users: BTreeSet::new(),
            names: BTreeMap::new(),
            balances: BTreeMap::new(),
            actors: BTreeMap::new(),
            tx_count: 0,
        })
    }

    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = limit;
        self
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn set_now(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: u64) -> Timestamp {
        self.now = self.now.saturating_add(seconds);
        self.now
    }

    /// Address of the user account called `name`, created and funded on
    /// first use.
    pub fn user(&mut self, name: &str) -> Address {
        let address = Address::from_seed(name);
        if self.users.insert(address) {
            *self.balances.entry(address).or_default() += user_funds();
            self.names.entry(name.to_string()).or_insert(address);
            debug!(%address, name, "User account created");
        }
        address
    }

    pub fn is_user(&self, address: Address) -> bool {
        self.users.contains(&address)
    }

    pub fn set_name(&mut self, name: &str, address: Address) {
        self.names.insert(name.to_string(), address);
    }

    pub fn named(&self, name: &str) -> Option<Address> {
        self.names.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, Address)> {
        self.names.iter().map(|(name, address)| (name.as_str(), *address))
    }

    pub fn balance(&self, address: Address) -> Coins {
        self.balances.get(&address).cloned().unwrap_or_default()
    }

    pub fn actor(&self, address: Address) -> Option<&Actor> {
        self.actors.get(&address)
    }

    pub fn is_deployed(&self, address: Address) -> bool {
        self.actors.contains_key(&address)
    }

    /// Encoded size of the actor's persistent state.
    pub fn state_size(&self, address: Address) -> Result<usize> {
        Ok(self.lookup(address)?.state_size())
    }

    /// Deploy an actor by sending it `Deploy` with its construction
    /// parameters attached.
    pub fn deploy(&mut self, from: Address, init: ActorInit, value: Coins) -> Result<Outcome> {
        let to = init.address();
        self.send(from, OutMessage::new(to, value, Deploy { query_id: 0 }).with_init(init))
    }

    /// Deliver `msg` from `from` and everything it causes.
    ///
    /// Actor rejections are recorded in the returned trace, not raised. On
    /// [`LedgerError::MessageLimit`] nothing from this send is kept.
    pub fn send(&mut self, from: Address, msg: OutMessage) -> Result<Outcome> {
        let have = self.balance(from);
        if have < msg.value {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                required: msg.value,
                have,
            });
        }
        let checkpoint = (self.balances.clone(), self.actors.clone(), self.tx_count);
        self.debit(from, &msg.value);

        let mut queue = VecDeque::from([Envelope { from, msg }]);
        let mut outcome = Outcome::default();
        while let Some(envelope) = queue.pop_front() {
            if outcome.len() >= self.message_limit {
                warn!(limit = self.message_limit, "Message limit reached, rolling back");
                (self.balances, self.actors, self.tx_count) = checkpoint;
                return Err(LedgerError::MessageLimit {
                    limit: self.message_limit,
                });
            }
            let record = self.process(envelope, &mut queue);
            outcome.transactions.push(record);
        }
        Ok(outcome)
    }

    fn process(&mut self, envelope: Envelope, queue: &mut VecDeque<Envelope>) -> TxRecord {
        let Envelope { from, msg } = envelope;
        let OutMessage {
            to,
            value,
            bounce,
            init,
            op,
        } = msg;

        self.tx_count += 1;
        let hash = Hash::compute_multi(&[
            &from.as_bytes()[..],
            &to.as_bytes()[..],
            &op.encode()[..],
            &self.tx_count.to_be_bytes()[..],
        ]);
        let mut record = TxRecord {
            hash,
            from,
            to,
            opcode: op.opcode(),
            op: op.name().to_string(),
            value: value.clone(),
            success: true,
            exit_code: None,
            deployed: false,
            aborted: false,
        };

        let bounced = bounce.then(|| Bounced::of(&op));
        match self.execute(from, to, &value, bounce, init, op) {
            Ok((out, deployed)) => {
                record.deployed = deployed;
                queue.extend(out.into_iter().map(|msg| Envelope { from: to, msg }));
            }
            Err(code) => {
                warn!(%from, %to, op = %record.op, code = code.code(), "Transaction failed: {}", code);
                record.success = false;
                record.exit_code = Some(code.code());
                if let Some(bounced) = bounced {
                    record.aborted = true;
                    let returned = OutMessage::new(from, value, bounced);
                    queue.push_back(Envelope {
                        from: to,
                        msg: returned.non_bounceable(),
                    });
                } else {
                    self.credit(to, &value);
                }
            }
        }
        record
    }

    /// Run one message. Returns the emitted messages and whether the
    /// destination was deployed by it.
    fn execute(
        &mut self,
        from: Address,
        to: Address,
        value: &Coins,
        bounce: bool,
        init: Option<ActorInit>,
        op: Op,
    ) -> std::result::Result<(Vec<OutMessage>, bool), ExitCode> {
        let (mut actor, deployed) = match self.actors.get(&to) {
            Some(actor) => (actor.clone(), false),
            None => match init {
                Some(init) if init.address() == to => (Actor::from_init(init), true),
                Some(_) => return Err(ExitCode::InvalidOwner),
                None if bounce && !self.is_user(to) => return Err(ExitCode::AccountNotDeployed),
                None => {
                    self.credit(to, value);
                    return Ok((Vec::new(), false));
                }
            },
        };

        let balance_before = self.balance(to);
        let ctx = Context {
            myself: to,
            sender: from,
            value: value.clone(),
            balance_before: balance_before.clone(),
            now: self.now,
            params: &self.params,
        };
        let out = actor.receive(&ctx, op)?;

        let available = &balance_before + value;
        let spent: Coins = out.iter().map(|m| m.value.clone()).sum();
        let remaining = available
            .checked_sub(&spent)
            .map_err(|_| ExitCode::NotEnoughBalance)?;

        if deployed {
            info!(address = %to, kind = ?actor.kind(), "Actor deployed");
        }
        debug!(%to, emitted = out.len(), balance = %remaining, "Transaction committed");
        self.balances.insert(to, remaining);
        self.actors.insert(to, actor);
        Ok((out, deployed))
    }

    fn credit(&mut self, address: Address, value: &Coins) {
        *self.balances.entry(address).or_default() += value;
    }

    fn debit(&mut self, address: Address, value: &Coins) {
        let balance = self.balances.entry(address).or_default();
        *balance = balance.saturating_sub(value);
    }

    fn lookup(&self, address: Address) -> Result<&Actor> {
        self.actors.get(&address).ok_or(LedgerError::NotDeployed(address))
    }

    pub fn vault_data(&self, address: Address) -> Result<VaultData> {
        match self.lookup(address)? {
            Actor::Vault(v) => Ok(v.data()),
            _ => Err(LedgerError::WrongKind {
                address,
                expected: ActorKind::Vault,
            }),
        }
    }

    pub fn proposal_data(&self, address: Address) -> Result<ProposalData> {
        match self.lookup(address)? {
            Actor::Proposal(p) => Ok(p.data()),
            _ => Err(LedgerError::WrongKind {
                address,
                expected: ActorKind::Proposal,
            }),
        }
    }

    pub fn ballot_data(&self, address: Address) -> Result<BallotData> {
        match self.lookup(address)? {
            Actor::Ballot(b) => Ok(b.data()),
            _ => Err(LedgerError::WrongKind {
                address,
                expected: ActorKind::Ballot,
            }),
        }
    }

    pub fn treasury_data(&self, address: Address) -> Result<TreasuryData> {
        match self.lookup(address)? {
            Actor::Treasury(t) => Ok(t.data()),
            _ => Err(LedgerError::WrongKind {
                address,
                expected: ActorKind::Treasury,
            }),
        }
    }

    /// Token balance of `owner` under `master`; zero if it has no wallet.
    pub fn token_balance(&self, master: Address, owner: Address) -> Coins {
        match self.actors.get(&token_wallet_address(master, owner)) {
            Some(Actor::TokenWallet(w)) => w.balance().clone(),
            _ => Coins::zero(),
        }
    }

    /// Write the whole ledger as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), actors = self.actors.len(), "Ledger saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let ledger: Ledger = serde_json::from_str(&json)?;
        ledger.params.validate()?;
        info!(
            path = %path.as_ref().display(),
            actors = ledger.actors.len(),
            now = ledger.now,
            "Ledger loaded"
        );
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TxFilter;
    use skipper_contracts::derive::{registry_init, TreasuryInit};
    use skipper_contracts::messages::opcodes;

    fn ledger() -> Ledger {
        Ledger::new(ProtocolParams::default()).unwrap()
    }

    fn half() -> Coins {
        Coins::from(500_000_000u64)
    }

    #[test]
    fn test_user_accounts_are_funded_once() {
        let mut l = ledger();
        let alice = l.user("alice");
        assert_eq!(l.user("alice"), alice);
        assert_eq!(l.balance(alice), user_funds());
        assert_eq!(l.named("alice"), Some(alice));
    }

    #[test]
    fn test_clock() {
        let mut l = ledger();
        assert_eq!(l.now(), GENESIS_TIME);
        assert_eq!(l.advance(10), GENESIS_TIME + 10);
        l.set_now(5);
        assert_eq!(l.now(), 5);
    }

    #[test]
    fn test_deploy_by_init() {
        let mut l = ledger();
        let admin = l.user("admin");
        let init = registry_init(Address::from_seed("master"));
        let at = init.address();

        let outcome = l.deploy(admin, init, half()).unwrap();
        assert!(outcome.is_success());
        assert!(outcome.has_transaction(&TxFilter::new().from(admin).to(at).deployed(true)));
        assert!(outcome.has_transaction(&TxFilter::new().from(at).to(admin).opcode(opcodes::DEPLOY_OK)));
        assert!(l.is_deployed(at));
        // Reserve stays with the actor
        assert_eq!(l.balance(at), l.params().min_storage_fee);
    }

    #[test]
    fn test_init_must_match_address() {
        let mut l = ledger();
        let admin = l.user("admin");
        let wrong = Address::from_seed("not the registry");
        let msg = OutMessage::new(wrong, half(), Deploy { query_id: 0 })
            .with_init(registry_init(Address::from_seed("master")));

        let outcome = l.send(admin, msg).unwrap();
        assert!(outcome.has_transaction(&TxFilter::new().to(wrong).exit(ExitCode::InvalidOwner)));
        assert!(!l.is_deployed(wrong));
        // Value bounced back
        assert_eq!(l.balance(admin), user_funds());
    }

    #[test]
    fn test_bounceable_to_nowhere() {
        let mut l = ledger();
        let admin = l.user("admin");
        let nowhere = Address::from_seed("nowhere");

        let outcome = l.send(admin, OutMessage::new(nowhere, half(), Deploy { query_id: 0 })).unwrap();
        let failed = outcome.first_failure().unwrap();
        assert_eq!(failed.exit(), Some(ExitCode::AccountNotDeployed));
        assert!(failed.aborted);
        assert!(outcome.has_transaction(&TxFilter::new().from(nowhere).to(admin).opcode(opcodes::BOUNCED)));
        assert_eq!(l.balance(admin), user_funds());

        // Non-bounceable value just lands on the address
        l.send(admin, OutMessage::new(nowhere, half(), Op::Raw(vec![])).non_bounceable())
            .unwrap();
        assert_eq!(l.balance(nowhere), half());
    }

    #[test]
    fn test_insufficient_sender_balance() {
        let mut l = ledger();
        let poor = Address::from_seed("poor");
        let err = l
            .send(poor, OutMessage::new(Address::from_seed("x"), half(), Op::Raw(vec![])))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_message_limit_rolls_back() {
        let mut l = ledger().with_message_limit(1);
        let admin = l.user("admin");
        let init = registry_init(Address::from_seed("master"));
        let at = init.address();

        let err = l.deploy(admin, init, half()).unwrap_err();
        assert!(matches!(err, LedgerError::MessageLimit { limit: 1 }));
        assert!(!l.is_deployed(at));
        assert_eq!(l.balance(admin), user_funds());
    }

    #[test]
    fn test_queries_check_kind() {
        let mut l = ledger();
        let admin = l.user("admin");
        let init = ActorInit::Treasury(TreasuryInit { admin });
        let at = init.address();
        l.deploy(admin, init, half()).unwrap();

        assert!(l.treasury_data(at).is_ok());
        assert!(matches!(l.vault_data(at), Err(LedgerError::WrongKind { .. })));
        assert!(matches!(
            l.proposal_data(Address::from_seed("x")),
            Err(LedgerError::NotDeployed(_))
        ));
        assert!(l.state_size(at).unwrap() > 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut l = ledger();
        let admin = l.user("admin");
        let init = ActorInit::Treasury(TreasuryInit { admin });
        let at = init.address();
        l.deploy(admin, init, half()).unwrap();
        l.advance(42);
        l.save(&path).unwrap();

        let loaded = Ledger::load(&path).unwrap();
        assert_eq!(loaded.now(), l.now());
        assert_eq!(loaded.balance(admin), l.balance(admin));
        assert_eq!(loaded.actor(at), l.actor(at));
        assert!(loaded.is_user(admin));
    }
}
