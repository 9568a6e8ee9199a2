//! Skipper Types - Core type definitions for the Skipper governance protocol.
//!
//! This crate provides the fundamental values exchanged between actors:
//! - Addresses (20-byte, Bech32m encoded)
//! - Hashes (32-byte, blake3 digests)
//! - Coins (arbitrary-precision unsigned amounts)
//! - Timestamps (Unix seconds)

pub mod address;
pub mod hash;
pub mod coins;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use hash::Hash;
pub use coins::Coins;
pub use error::TypesError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, Coins, Hash, Timestamp, TypesError};
}
