//! Context builders shared by the actor unit tests.

use skipper_types::{Address, Coins, Timestamp};

use crate::context::Context;
use crate::params::ProtocolParams;

pub fn addr(seed: &str) -> Address {
    Address::from_seed(seed)
}

pub fn ctx<'a>(
    params: &'a ProtocolParams,
    myself: Address,
    sender: Address,
    value: Coins,
    now: Timestamp,
) -> Context<'a> {
    Context {
        myself,
        sender,
        value,
        balance_before: Coins::zero(),
        now,
        params,
    }
}
