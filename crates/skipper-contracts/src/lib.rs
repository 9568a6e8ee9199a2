//! Skipper Contracts - the governance actors and their protocol.
//!
//! This crate provides:
//! - Vault: per-holder custody, time-lock and owner relay
//! - Registry: stateless router to derived proposal and ballot addresses
//! - Proposal and Ballot: tallies, expiry and one-shot execution
//! - Treasury: a payload receiver for executed proposals
//! - The message set, its wire codec and address derivation
//!
//! Actors never call each other. A handler consumes one [`Op`] and returns
//! the messages it wants delivered; the runtime does the delivery.

pub mod ballot;
pub mod context;
pub mod derive;
pub mod error;
pub mod messages;
pub mod params;
pub mod proposal;
pub mod registry;
pub mod treasury;
pub mod vault;

#[cfg(test)]
mod test_utils;

pub use ballot::{Ballot, BallotData};
pub use context::{Context, Contract, HandlerResult, OutMessage};
pub use derive::{
    ballot_address, proposal_address, registry_address, vault_address, ActorInit, ActorKind,
};
pub use error::ExitCode;
pub use messages::{CodecError, Op, RegistryRequest, Vote};
pub use params::ProtocolParams;
pub use proposal::{Proposal, ProposalData};
pub use registry::Registry;
pub use treasury::{Treasury, TreasuryData};
pub use vault::{Vault, VaultData};
