//! Protocol messages and their wire codec.
//!
//! Wire form: a 4-byte big-endian opcode followed by the borsh encoding of
//! the message fields. Bytes whose opcode is not recognised decode to
//! [`Op::Raw`], which is how executed proposal bodies travel.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::{Address, Coins, Timestamp};
use thiserror::Error;

pub mod opcodes {
    // Token standard
    pub const TRANSFER: u32 = 0x0f8a_7ea5;
    pub const INTERNAL_TRANSFER: u32 = 0x178d_4519;
    pub const TRANSFER_NOTIFICATION: u32 = 0x7362_d09c;
    pub const EXCESSES: u32 = 0xd532_76db;
    pub const PROVIDE_WALLET_ADDRESS: u32 = 0x2c76_b973;
    pub const TAKE_WALLET_ADDRESS: u32 = 0xd173_5400;
    pub const MINT: u32 = 0x642b_7d07;
    // Lifecycle
    pub const DEPLOY: u32 = 0x946a_98b6;
    pub const DEPLOY_OK: u32 = 0xaff9_0f57;
    // 01 - Vault
    pub const SEND_PROXY_MESSAGE: u32 = 0x0069_0101;
    pub const PROXY_MESSAGE: u32 = 0x0069_0102;
    pub const UNLOCK_JETTONS: u32 = 0x0069_0103;
    pub const LOCK_JETTONS: u32 = 0x0069_0104;
    // 02 - Proposal
    pub const INIT_PROPOSAL: u32 = 0x0069_0201;
    pub const UPDATE_VOTES: u32 = 0x0069_0202;
    pub const EXECUTE_PROPOSAL: u32 = 0x0069_0203;
    // 03 - Ballot
    pub const INIT_VOTER: u32 = 0x0069_0301;
    pub const UPDATE_VOTER_BALANCE: u32 = 0x0069_0302;
    // 04 - Registry requests (inside a proxy payload)
    pub const REQUEST_NEW_PROPOSAL: u32 = 0x0069_0401;
    pub const VOTE_FOR_PROPOSAL: u32 = 0x0069_0402;
    // Returned to the sender of a failed bounceable message
    pub const BOUNCED: u32 = 0xffff_ffff;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Message shorter than an opcode ({0} bytes)")]
    Truncated(usize),

    #[error("Unknown opcode 0x{0:08x}")]
    UnknownOpcode(u32),

    #[error("Invalid body for opcode 0x{opcode:08x}: {reason}")]
    Body { opcode: u32, reason: String },
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum Vote {
    No,
    Yes,
}

/// What a proposal delivers when executed.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ProposalPayload {
    pub receiver: Address,
    pub body: Vec<u8>,
}

/// A ballot's contribution to a proposal tally.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct VoteRecord {
    pub amount: Coins,
    pub vote: Vote,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Deploy {
    pub query_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DeployOk {
    pub query_id: u64,
}

/// Owner instruction to a token wallet.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Transfer {
    pub query_id: u64,
    pub amount: Coins,
    pub destination: Address,
    pub response_destination: Address,
    pub forward_value: Coins,
    pub forward_payload: Vec<u8>,
}

/// Wallet-to-wallet leg of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct InternalTransfer {
    pub query_id: u64,
    pub amount: Coins,
    pub from: Address,
    pub response_destination: Address,
    pub forward_value: Coins,
    pub forward_payload: Vec<u8>,
}

/// Deposit notification delivered to a wallet's owner.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TransferNotification {
    pub query_id: u64,
    pub amount: Coins,
    pub sender: Address,
    pub forward_payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Excesses {
    pub query_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProvideWalletAddress {
    pub query_id: u64,
    pub owner_address: Address,
    pub include_address: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TakeWalletAddress {
    pub query_id: u64,
    pub wallet_address: Address,
    pub owner_address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Mint {
    pub query_id: u64,
    pub amount: Coins,
    pub destination: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct LockJettons {
    pub lock_period: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UnlockJettons {
    pub query_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SendProxyMessage {
    pub to: Address,
    pub lock_period: Option<u64>,
    pub payload: Vec<u8>,
}

/// Owner-authorized relay from a vault, stamped with the holder's identity
/// and balance.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProxyMessage {
    pub owner: Address,
    pub lock_period: Option<u64>,
    pub voter_unlock_date: Timestamp,
    pub amount: Coins,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct InitProposal {
    pub initiator: Address,
    pub amount: Coins,
    pub lock_period: u64,
    pub payload: ProposalPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UpdateVotes {
    pub owner: Address,
    pub amount: Coins,
    pub vote: Vote,
    pub voter_unlock_date: Timestamp,
    /// Contribution being replaced, if the ballot had counted before
    pub previous: Option<VoteRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ExecuteProposal {
    pub query_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct InitVoter {
    pub amount: Coins,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UpdateVoterBalance {
    /// Holder the vote is cast for; refunded if the ballot rejects it
    pub owner: Address,
    pub amount: Coins,
    pub vote: Vote,
    pub voter_unlock_date: Timestamp,
}

/// Returned to the sender when a bounceable message fails.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Bounced {
    pub opcode: u32,
    /// Body of the rejected message, without its opcode
    pub body: Vec<u8>,
}

impl Bounced {
    /// Bounce notice for a rejected message.
    pub fn of(op: &Op) -> Self {
        let encoded = op.encode();
        Self {
            opcode: op.opcode(),
            body: encoded.get(4..).unwrap_or_default().to_vec(),
        }
    }

    /// The rejected message, decoded again.
    pub fn original(&self) -> Result<Op, CodecError> {
        let mut bytes = self.opcode.to_be_bytes().to_vec();
        bytes.extend_from_slice(&self.body);
        Op::decode(&bytes)
    }
}

fn split_opcode(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some((u32::from_be_bytes(head), &bytes[4..]))
}

fn decode_body<T: BorshDeserialize>(opcode: u32, body: &[u8]) -> Result<T, CodecError> {
    borsh::from_slice(body).map_err(|e| CodecError::Body {
        opcode,
        reason: e.to_string(),
    })
}

fn with_opcode(opcode: u32, body: std::io::Result<Vec<u8>>) -> Vec<u8> {
    let mut out = opcode.to_be_bytes().to_vec();
    // Encoding into a Vec only fails on writer errors, which Vec never raises
    out.extend(body.unwrap_or_default());
    out
}

macro_rules! protocol_ops {
    ($($variant:ident => $opcode:expr),* $(,)?) => {
        /// Every message an actor can receive.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Op {
            $($variant($variant),)*
            /// Bytes without a recognised opcode
            Raw(Vec<u8>),
        }

        impl Op {
            pub fn opcode(&self) -> u32 {
                match self {
                    $(Op::$variant(_) => $opcode,)*
                    Op::Raw(bytes) => split_opcode(bytes).map(|(op, _)| op).unwrap_or(0),
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Op::$variant(_) => stringify!($variant),)*
                    Op::Raw(_) => "Raw",
                }
            }

            pub fn encode(&self) -> Vec<u8> {
                match self {
                    $(Op::$variant(m) => with_opcode($opcode, borsh::to_vec(m)),)*
                    Op::Raw(bytes) => bytes.clone(),
                }
            }

            pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                let Some((opcode, body)) = split_opcode(bytes) else {
                    return Ok(Op::Raw(bytes.to_vec()));
                };
                $(
                    if opcode == $opcode {
                        return Ok(Op::$variant(decode_body(opcode, body)?));
                    }
                )*
                Ok(Op::Raw(bytes.to_vec()))
            }
        }

        $(
            impl From<$variant> for Op {
                fn from(m: $variant) -> Self {
                    Op::$variant(m)
                }
            }
        )*
    };
}

protocol_ops! {
    Deploy => opcodes::DEPLOY,
    DeployOk => opcodes::DEPLOY_OK,
    Transfer => opcodes::TRANSFER,
    InternalTransfer => opcodes::INTERNAL_TRANSFER,
    TransferNotification => opcodes::TRANSFER_NOTIFICATION,
    Excesses => opcodes::EXCESSES,
    ProvideWalletAddress => opcodes::PROVIDE_WALLET_ADDRESS,
    TakeWalletAddress => opcodes::TAKE_WALLET_ADDRESS,
    Mint => opcodes::MINT,
    LockJettons => opcodes::LOCK_JETTONS,
    UnlockJettons => opcodes::UNLOCK_JETTONS,
    SendProxyMessage => opcodes::SEND_PROXY_MESSAGE,
    ProxyMessage => opcodes::PROXY_MESSAGE,
    InitProposal => opcodes::INIT_PROPOSAL,
    UpdateVotes => opcodes::UPDATE_VOTES,
    ExecuteProposal => opcodes::EXECUTE_PROPOSAL,
    InitVoter => opcodes::INIT_VOTER,
    UpdateVoterBalance => opcodes::UPDATE_VOTER_BALANCE,
    Bounced => opcodes::BOUNCED,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct RequestNewProposal {
    pub proposal_id: u64,
    pub receiver: Address,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct VoteForProposal {
    pub proposal_id: u64,
    pub vote: Vote,
}

/// Governance action carried in a proxy payload and dispatched by the
/// registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryRequest {
    RequestNewProposal(RequestNewProposal),
    VoteForProposal(VoteForProposal),
}

impl RegistryRequest {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RegistryRequest::RequestNewProposal(r) => {
                with_opcode(opcodes::REQUEST_NEW_PROPOSAL, borsh::to_vec(r))
            }
            RegistryRequest::VoteForProposal(r) => {
                with_opcode(opcodes::VOTE_FOR_PROPOSAL, borsh::to_vec(r))
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let (opcode, body) = split_opcode(bytes).ok_or(CodecError::Truncated(bytes.len()))?;
        match opcode {
            opcodes::REQUEST_NEW_PROPOSAL => {
                Ok(RegistryRequest::RequestNewProposal(decode_body(opcode, body)?))
            }
            opcodes::VOTE_FOR_PROPOSAL => {
                Ok(RegistryRequest::VoteForProposal(decode_body(opcode, body)?))
            }
            other => Err(CodecError::UnknownOpcode(other)),
        }
    }

    pub fn new_proposal(proposal_id: u64, receiver: Address, body: Vec<u8>) -> Self {
        RegistryRequest::RequestNewProposal(RequestNewProposal { proposal_id, receiver, body })
    }

    pub fn vote(proposal_id: u64, vote: Vote) -> Self {
        RegistryRequest::VoteForProposal(VoteForProposal { proposal_id, vote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_prefix() {
        let op = Op::from(LockJettons { lock_period: 86_400 });
        let bytes = op.encode();
        assert_eq!(&bytes[..4], &[0x00, 0x69, 0x01, 0x04]);
        assert_eq!(op.opcode(), opcodes::LOCK_JETTONS);
        assert_eq!(Op::decode(&bytes).unwrap(), op);
    }

    #[test]
    fn test_unknown_opcode_is_raw() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef, 1, 2, 3];
        let op = Op::decode(&bytes).unwrap();
        assert_eq!(op, Op::Raw(bytes.clone()));
        assert_eq!(op.opcode(), 0xdead_beef);
        assert_eq!(op.encode(), bytes);
        assert_eq!(Op::Raw(vec![1]).opcode(), 0);
    }

    #[test]
    fn test_known_opcode_with_bad_body() {
        let mut bytes = opcodes::UPDATE_VOTES.to_be_bytes().to_vec();
        bytes.push(7);
        assert!(matches!(Op::decode(&bytes), Err(CodecError::Body { .. })));
    }

    #[test]
    fn test_vote_encoding_matches_bit() {
        assert_eq!(borsh::to_vec(&Vote::No).unwrap(), vec![0]);
        assert_eq!(borsh::to_vec(&Vote::Yes).unwrap(), vec![1]);
    }

    #[test]
    fn test_registry_request_codec() {
        let req = RegistryRequest::vote(1, Vote::Yes);
        let bytes = req.encode();
        assert_eq!(&bytes[..4], &opcodes::VOTE_FOR_PROPOSAL.to_be_bytes());
        assert_eq!(RegistryRequest::decode(&bytes).unwrap(), req);

        assert_eq!(
            RegistryRequest::decode(&[0, 0, 0, 1]),
            Err(CodecError::UnknownOpcode(1))
        );
        assert_eq!(RegistryRequest::decode(&[0, 0]), Err(CodecError::Truncated(2)));
    }

    #[test]
    fn test_bounced_carries_rejected_body() {
        let op = Op::from(UpdateVoterBalance {
            owner: Address::from_seed("bob"),
            amount: Coins::from(5u64),
            vote: Vote::No,
            voter_unlock_date: 42,
        });
        let bounced = Bounced::of(&op);
        assert_eq!(bounced.opcode, opcodes::UPDATE_VOTER_BALANCE);
        assert_eq!(bounced.original().unwrap(), op);

        let short = Bounced::of(&Op::Raw(vec![1, 2]));
        assert_eq!(short.opcode, 0);
        assert!(short.body.is_empty());
    }

    #[test]
    fn test_names() {
        assert_eq!(Op::from(Deploy { query_id: 0 }).name(), "Deploy");
        assert_eq!(Op::Raw(vec![]).name(), "Raw");
    }
}
