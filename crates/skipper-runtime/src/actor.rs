//! Every kind of actor the ledger can host.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_contracts::{
    ActorInit, ActorKind, Ballot, Context, Contract, HandlerResult, Op, Proposal, Registry, Treasury,
    Vault,
};

use crate::token::{TokenMaster, TokenWallet};

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state")]
pub enum Actor {
    Vault(Vault),
    Registry(Registry),
    Proposal(Proposal),
    Ballot(Ballot),
    Treasury(Treasury),
    TokenMaster(TokenMaster),
    TokenWallet(TokenWallet),
}

impl Actor {
    /// Fresh actor for the given construction parameters.
    pub fn from_init(init: ActorInit) -> Self {
        match init {
            ActorInit::Vault(p) => Actor::Vault(Vault::new(p)),
            ActorInit::Registry(p) => Actor::Registry(Registry::new(p)),
            ActorInit::Proposal(p) => Actor::Proposal(Proposal::new(p)),
            ActorInit::Ballot(p) => Actor::Ballot(Ballot::new(p)),
            ActorInit::Treasury(p) => Actor::Treasury(Treasury::new(p)),
            ActorInit::TokenMaster(p) => Actor::TokenMaster(TokenMaster::new(p)),
            ActorInit::TokenWallet(p) => Actor::TokenWallet(TokenWallet::new(p)),
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Vault(_) => ActorKind::Vault,
            Actor::Registry(_) => ActorKind::Registry,
            Actor::Proposal(_) => ActorKind::Proposal,
            Actor::Ballot(_) => ActorKind::Ballot,
            Actor::Treasury(_) => ActorKind::Treasury,
            Actor::TokenMaster(_) => ActorKind::TokenMaster,
            Actor::TokenWallet(_) => ActorKind::TokenWallet,
        }
    }

    /// Size of the persistent state in bytes.
    pub fn state_size(&self) -> usize {
        let encoded = match self {
            Actor::Vault(a) => borsh::to_vec(a),
            Actor::Registry(a) => borsh::to_vec(a),
            Actor::Proposal(a) => borsh::to_vec(a),
            Actor::Ballot(a) => borsh::to_vec(a),
            Actor::Treasury(a) => borsh::to_vec(a),
            Actor::TokenMaster(a) => borsh::to_vec(a),
            Actor::TokenWallet(a) => borsh::to_vec(a),
        };
        encoded.map(|bytes| bytes.len()).unwrap_or(0)
    }
}

impl Contract for Actor {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match self {
            Actor::Vault(a) => a.receive(ctx, op),
            Actor::Registry(a) => a.receive(ctx, op),
            Actor::Proposal(a) => a.receive(ctx, op),
            Actor::Ballot(a) => a.receive(ctx, op),
            Actor::Treasury(a) => a.receive(ctx, op),
            Actor::TokenMaster(a) => a.receive(ctx, op),
            Actor::TokenWallet(a) => a.receive(ctx, op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skipper_contracts::derive::{registry_init, vault_init};
    use skipper_types::Address;

    #[test]
    fn test_from_init_kind() {
        let owner = Address::from_seed("owner");
        let master = Address::from_seed("master");
        assert_eq!(Actor::from_init(vault_init(owner, master)).kind(), ActorKind::Vault);
        assert_eq!(Actor::from_init(registry_init(master)).kind(), ActorKind::Registry);
    }

    #[test]
    fn test_state_size() {
        let registry = Actor::from_init(registry_init(Address::from_seed("master")));
        assert_eq!(registry.state_size(), Address::LEN);

        let vault = Actor::from_init(vault_init(Address::from_seed("a"), Address::from_seed("b")));
        // owner + token + zero amount (length prefix and one byte) + unlock_at + None tag
        assert_eq!(vault.state_size(), 20 + 20 + 5 + 8 + 1);
    }

    #[test]
    fn test_snapshot_format() {
        let registry = Actor::from_init(registry_init(Address::from_seed("master")));
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["kind"], "Registry");
        let back: Actor = serde_json::from_value(json).unwrap();
        assert_eq!(back, registry);
    }
}
