//! Serialization implementations for skipper-types
//!
//! serde renders every value as a string (snapshots, config, CLI output);
//! borsh uses the compact binary form carried inside protocol messages.

use crate::*;

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    // Coins
    impl Serialize for Coins {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Coins {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Coins::from_str(&s).map_err(serde::de::Error::custom)
        }
    }

    // Hash
    impl Serialize for Hash {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Hash {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Hash::from_str(&s).map_err(serde::de::Error::custom)
        }
    }

    // Address
    impl Serialize for Address {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_string().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(feature = "borsh")]
mod borsh_impls {
    use super::*;
    use borsh::{BorshDeserialize, BorshSerialize};
    use std::io::{Read, Result, Write};

    impl BorshSerialize for Address {
        fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
            writer.write_all(self.as_bytes())
        }
    }

    impl BorshDeserialize for Address {
        fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
            let bytes = <[u8; 20]>::deserialize_reader(reader)?;
            Ok(Address::from_bytes(bytes))
        }
    }

    impl BorshSerialize for Hash {
        fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
            writer.write_all(self.as_bytes())
        }
    }

    impl BorshDeserialize for Hash {
        fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
            let bytes = <[u8; 32]>::deserialize_reader(reader)?;
            Ok(Hash::from_bytes(bytes))
        }
    }

    // Length-prefixed little-endian magnitude
    impl BorshSerialize for Coins {
        fn serialize<W: Write>(&self, writer: &mut W) -> Result<()> {
            self.to_bytes_le().serialize(writer)
        }
    }

    impl BorshDeserialize for Coins {
        fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self> {
            let bytes = Vec::<u8>::deserialize_reader(reader)?;
            Ok(Coins::from_bytes_le(&bytes))
        }
    }
}
