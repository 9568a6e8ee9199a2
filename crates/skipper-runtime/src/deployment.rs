//! One governance instance on a ledger and the user actions against it.
//!
//! Each action is a single top-level send from a user account, the same
//! message a wallet would sign.

use serde::{Deserialize, Serialize};
use skipper_contracts::derive::{registry_init, vault_init, TreasuryInit};
use skipper_contracts::messages::{
    ExecuteProposal, LockJettons, Mint, SendProxyMessage, Transfer, UnlockJettons,
};
use skipper_contracts::{
    ballot_address, proposal_address, ActorInit, ExitCode, Op, OutMessage, RegistryRequest, Vote,
};
use skipper_types::{Address, Coins};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::token::{token_master_init, token_wallet_address};
use crate::trace::Outcome;

/// Value attached to every user action: 0.5 units.
pub fn action_value() -> Coins {
    Coins::from(500_000_000u64)
}

/// Value forwarded with a deposit notification: 0.05 units.
pub fn forward_value() -> Coins {
    Coins::from(50_000_000u64)
}

const MASTER: &str = "token_master";
const REGISTRY: &str = "registry";
const TREASURY: &str = "treasury";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub admin: Address,
    pub master: Address,
    pub registry: Address,
    pub treasury: Address,
}

impl Deployment {
    /// Deploy a token master, a registry governing it and a treasury, all
    /// administered by `admin`.
    pub fn deploy(ledger: &mut Ledger, admin: Address, content_id: u64) -> Result<Self> {
        let master_init = token_master_init(admin, content_id);
        let master = master_init.address();
        let registry_init = registry_init(master);
        let registry = registry_init.address();
        let treasury_init = ActorInit::Treasury(TreasuryInit { admin });
        let treasury = treasury_init.address();

        for init in [master_init, registry_init, treasury_init] {
            let to = init.address();
            expect_success(to, ledger.deploy(admin, init, action_value())?)?;
        }
        ledger.set_name(MASTER, master);
        ledger.set_name(REGISTRY, registry);
        ledger.set_name(TREASURY, treasury);

        info!(%master, %registry, %treasury, "Governance deployed");
        Ok(Self {
            admin,
            master,
            registry,
            treasury,
        })
    }

    /// Recover a deployment recorded in a loaded ledger.
    pub fn from_ledger(ledger: &Ledger, admin: Address) -> Option<Self> {
        Some(Self {
            admin,
            master: ledger.named(MASTER)?,
            registry: ledger.named(REGISTRY)?,
            treasury: ledger.named(TREASURY)?,
        })
    }

    pub fn vault_of(&self, owner: Address) -> Address {
        vault_init(owner, self.master).address()
    }

    pub fn wallet_of(&self, owner: Address) -> Address {
        token_wallet_address(self.master, owner)
    }

    pub fn proposal(&self, id: u64) -> Address {
        proposal_address(self.registry, id)
    }

    pub fn ballot(&self, id: u64, owner: Address) -> Address {
        ballot_address(self.registry, self.proposal(id), owner)
    }

    pub fn deploy_vault(&self, ledger: &mut Ledger, owner: Address) -> Result<Outcome> {
        ledger.deploy(owner, vault_init(owner, self.master), action_value())
    }

    pub fn mint(&self, ledger: &mut Ledger, to: Address, amount: Coins) -> Result<Outcome> {
        let mint = Mint {
            query_id: 0,
            amount,
            destination: to,
        };
        ledger.send(self.admin, OutMessage::new(self.master, action_value(), mint))
    }

    /// Move `amount` tokens from the owner's wallet into their vault.
    pub fn deposit(&self, ledger: &mut Ledger, owner: Address, amount: Coins) -> Result<Outcome> {
        let transfer = Transfer {
            query_id: 0,
            amount,
            destination: self.vault_of(owner),
            response_destination: owner,
            forward_value: forward_value(),
            forward_payload: Vec::new(),
        };
        ledger.send(owner, OutMessage::new(self.wallet_of(owner), action_value(), transfer))
    }

    pub fn lock(&self, ledger: &mut Ledger, owner: Address, lock_period: u64) -> Result<Outcome> {
        let lock = LockJettons { lock_period };
        ledger.send(owner, OutMessage::new(self.vault_of(owner), action_value(), lock))
    }

    pub fn unlock(&self, ledger: &mut Ledger, owner: Address) -> Result<Outcome> {
        let unlock = UnlockJettons { query_id: 0 };
        ledger.send(owner, OutMessage::new(self.vault_of(owner), action_value(), unlock))
    }

    /// Relay a registry request through the owner's vault.
    pub fn relay(
        &self,
        ledger: &mut Ledger,
        owner: Address,
        request: RegistryRequest,
        lock_period: Option<u64>,
        value: Coins,
    ) -> Result<Outcome> {
        let proxy = SendProxyMessage {
            to: self.registry,
            lock_period,
            payload: request.encode(),
        };
        ledger.send(owner, OutMessage::new(self.vault_of(owner), value, proxy))
    }

    pub fn propose(
        &self,
        ledger: &mut Ledger,
        owner: Address,
        id: u64,
        receiver: Address,
        body: Vec<u8>,
        lock_period: Option<u64>,
    ) -> Result<Outcome> {
        let request = RegistryRequest::new_proposal(id, receiver, body);
        self.relay(ledger, owner, request, lock_period, action_value())
    }

    pub fn vote(
        &self,
        ledger: &mut Ledger,
        owner: Address,
        id: u64,
        vote: Vote,
        lock_period: Option<u64>,
    ) -> Result<Outcome> {
        self.relay(ledger, owner, RegistryRequest::vote(id, vote), lock_period, action_value())
    }

    pub fn execute(&self, ledger: &mut Ledger, executor: Address, id: u64) -> Result<Outcome> {
        let execute = Op::from(ExecuteProposal { query_id: 0 });
        ledger.send(executor, OutMessage::new(self.proposal(id), action_value(), execute))
    }
}

fn expect_success(to: Address, outcome: Outcome) -> Result<Outcome> {
    match outcome.first_failure() {
        Some(tx) => Err(LedgerError::Rejected {
            to,
            exit_code: tx.exit_code.unwrap_or(ExitCode::InvalidMessage.code()),
        }),
        None => Ok(outcome),
    }
}
