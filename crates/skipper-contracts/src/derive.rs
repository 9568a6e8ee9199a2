//! Deterministic actor addresses.
//!
//! An actor's address is a pure function of its kind and its immutable
//! construction parameters:
//!
//! `address = blake3_derive_key(CONTEXT, kind_tag || borsh(init))[0..20]`
//!
//! The same function is used to decide where to send a message and to check
//! who is allowed to send one. There is no table of proposals or ballots
//! anywhere; anyone can recompute them from public inputs.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::Address;

const DERIVATION_CONTEXT: &str = "skipper actor address v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Vault,
    Registry,
    Proposal,
    Ballot,
    Treasury,
    TokenMaster,
    TokenWallet,
}

impl ActorKind {
    pub fn tag(&self) -> u8 {
        match self {
            ActorKind::Vault => 1,
            ActorKind::Registry => 2,
            ActorKind::Proposal => 3,
            ActorKind::Ballot => 4,
            ActorKind::Treasury => 5,
            ActorKind::TokenMaster => 6,
            ActorKind::TokenWallet => 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VaultInit {
    pub owner: Address,
    pub token_kind: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RegistryInit {
    pub token_kind: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ProposalInit {
    pub registry: Address,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BallotInit {
    pub registry: Address,
    pub proposal: Address,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TreasuryInit {
    pub admin: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenMasterInit {
    pub admin: Address,
    pub content_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenWalletInit {
    pub master: Address,
    pub owner: Address,
}

/// Construction parameters attached to a message so the destination can be
/// deployed on first delivery.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum ActorInit {
    Vault(VaultInit),
    Registry(RegistryInit),
    Proposal(ProposalInit),
    Ballot(BallotInit),
    Treasury(TreasuryInit),
    TokenMaster(TokenMasterInit),
    TokenWallet(TokenWalletInit),
}

impl ActorInit {
    pub fn kind(&self) -> ActorKind {
        match self {
            ActorInit::Vault(_) => ActorKind::Vault,
            ActorInit::Registry(_) => ActorKind::Registry,
            ActorInit::Proposal(_) => ActorKind::Proposal,
            ActorInit::Ballot(_) => ActorKind::Ballot,
            ActorInit::Treasury(_) => ActorKind::Treasury,
            ActorInit::TokenMaster(_) => ActorKind::TokenMaster,
            ActorInit::TokenWallet(_) => ActorKind::TokenWallet,
        }
    }

    /// The address this actor lives at.
    pub fn address(&self) -> Address {
        let params = match self {
            ActorInit::Vault(p) => borsh::to_vec(p),
            ActorInit::Registry(p) => borsh::to_vec(p),
            ActorInit::Proposal(p) => borsh::to_vec(p),
            ActorInit::Ballot(p) => borsh::to_vec(p),
            ActorInit::Treasury(p) => borsh::to_vec(p),
            ActorInit::TokenMaster(p) => borsh::to_vec(p),
            ActorInit::TokenWallet(p) => borsh::to_vec(p),
        };
        // Writing fixed-size fields into a Vec cannot fail
        derive_address(self.kind(), &params.unwrap_or_default())
    }
}

/// Hash a kind tag and encoded parameters into an address.
pub fn derive_address(kind: ActorKind, params: &[u8]) -> Address {
    let mut hasher = blake3::Hasher::new_derive_key(DERIVATION_CONTEXT);
    hasher.update(&[kind.tag()]);
    hasher.update(params);
    Address::from_digest(hasher.finalize().as_bytes())
}

pub fn vault_init(owner: Address, token_kind: Address) -> ActorInit {
    ActorInit::Vault(VaultInit { owner, token_kind })
}

pub fn registry_init(token_kind: Address) -> ActorInit {
    ActorInit::Registry(RegistryInit { token_kind })
}

pub fn proposal_init(registry: Address, id: u64) -> ActorInit {
    ActorInit::Proposal(ProposalInit { registry, id })
}

pub fn ballot_init(registry: Address, proposal: Address, owner: Address) -> ActorInit {
    ActorInit::Ballot(BallotInit { registry, proposal, owner })
}

pub fn vault_address(owner: Address, token_kind: Address) -> Address {
    vault_init(owner, token_kind).address()
}

pub fn registry_address(token_kind: Address) -> Address {
    registry_init(token_kind).address()
}

pub fn proposal_address(registry: Address, id: u64) -> Address {
    proposal_init(registry, id).address()
}

pub fn ballot_address(registry: Address, proposal: Address, owner: Address) -> Address {
    ballot_init(registry, proposal, owner).address()
}
