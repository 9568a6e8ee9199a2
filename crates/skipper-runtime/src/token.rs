//! Minimal fungible-token master and wallet.
//!
//! Just enough of the token standard to drive vault deposits, withdrawals
//! and wallet discovery end to end. Wallet addresses are derived from
//! `(master, owner)` the same way governance actors are.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_contracts::context::excesses;
use skipper_contracts::derive::{TokenMasterInit, TokenWalletInit};
use skipper_contracts::messages::{
    InternalTransfer, Mint, ProvideWalletAddress, TakeWalletAddress, Transfer, TransferNotification,
};
use skipper_contracts::{ActorInit, Context, Contract, ExitCode, HandlerResult, Op, OutMessage};
use skipper_types::{Address, Coins};
use tracing::{debug, warn};

pub fn token_master_init(admin: Address, content_id: u64) -> ActorInit {
    ActorInit::TokenMaster(TokenMasterInit { admin, content_id })
}

pub fn token_wallet_init(master: Address, owner: Address) -> ActorInit {
    ActorInit::TokenWallet(TokenWalletInit { master, owner })
}

pub fn token_master_address(admin: Address, content_id: u64) -> Address {
    token_master_init(admin, content_id).address()
}

pub fn token_wallet_address(master: Address, owner: Address) -> Address {
    token_wallet_init(master, owner).address()
}

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenMaster {
    admin: Address,
    content_id: u64,
    total_supply: Coins,
}

impl TokenMaster {
    pub fn new(init: TokenMasterInit) -> Self {
        Self {
            admin: init.admin,
            content_id: init.content_id,
            total_supply: Coins::zero(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn total_supply(&self) -> &Coins {
        &self.total_supply
    }

    fn on_mint(&mut self, ctx: &Context<'_>, msg: Mint) -> HandlerResult {
        ctx.require_sender(self.admin, ExitCode::InvalidOwner)?;
        if msg.amount.is_zero() {
            return Err(ExitCode::InvalidAmount);
        }
        self.total_supply += &msg.amount;
        debug!(master = %ctx.myself, to = %msg.destination, amount = %msg.amount, "Minted");

        let transfer = InternalTransfer {
            query_id: msg.query_id,
            amount: msg.amount,
            from: ctx.myself,
            response_destination: msg.destination,
            forward_value: Coins::zero(),
            forward_payload: Vec::new(),
        };
        let wallet = token_wallet_address(ctx.myself, msg.destination);
        Ok(vec![OutMessage::new(wallet, ctx.value.clone(), transfer)
            .with_init(token_wallet_init(ctx.myself, msg.destination))])
    }

    fn on_provide_wallet_address(&self, ctx: &Context<'_>, msg: ProvideWalletAddress) -> HandlerResult {
        let reply = TakeWalletAddress {
            query_id: msg.query_id,
            wallet_address: token_wallet_address(ctx.myself, msg.owner_address),
            owner_address: msg.include_address.then_some(msg.owner_address),
        };
        Ok(vec![OutMessage::new(ctx.sender, ctx.value.clone(), reply)])
    }
}

impl Contract for TokenMaster {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::Mint(m) => self.on_mint(ctx, m),
            Op::ProvideWalletAddress(m) => self.on_provide_wallet_address(ctx, m),
            Op::Excesses(_) | Op::Bounced(_) => Ok(vec![]),
            other => {
                warn!(master = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenWallet {
    master: Address,
    owner: Address,
    balance: Coins,
}

impl TokenWallet {
    pub fn new(init: TokenWalletInit) -> Self {
        Self {
            master: init.master,
            owner: init.owner,
            balance: Coins::zero(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn balance(&self) -> &Coins {
        &self.balance
    }

    fn on_transfer(&mut self, ctx: &Context<'_>, msg: Transfer) -> HandlerResult {
        ctx.require_sender(self.owner, ExitCode::InvalidOwner)?;
        self.balance = self
            .balance
            .checked_sub(&msg.amount)
            .map_err(|_| ExitCode::InvalidAmount)?;

        debug!(wallet = %ctx.myself, to = %msg.destination, amount = %msg.amount, "Transfer out");
        let destination = token_wallet_address(self.master, msg.destination);
        let internal = InternalTransfer {
            query_id: msg.query_id,
            amount: msg.amount,
            from: self.owner,
            response_destination: msg.response_destination,
            forward_value: msg.forward_value,
            forward_payload: msg.forward_payload,
        };
        Ok(vec![OutMessage::new(destination, ctx.value.clone(), internal)
            .with_init(token_wallet_init(self.master, msg.destination))])
    }

    fn on_internal_transfer(&mut self, ctx: &Context<'_>, msg: InternalTransfer) -> HandlerResult {
        if ctx.sender != self.master && ctx.sender != token_wallet_address(self.master, msg.from) {
            return Err(ExitCode::InvalidOwner);
        }
        self.balance += &msg.amount;
        debug!(wallet = %ctx.myself, from = %msg.from, amount = %msg.amount, "Transfer in");

        let mut out = Vec::new();
        let available = ctx.value_above_reserve(&ctx.params.min_storage_fee);
        let forward_value = msg.forward_value.clone().min(available.clone());
        if !forward_value.is_zero() {
            let notification = TransferNotification {
                query_id: msg.query_id,
                amount: msg.amount,
                sender: msg.from,
                forward_payload: msg.forward_payload,
            };
            out.push(OutMessage::new(self.owner, forward_value.clone(), notification).non_bounceable());
        }
        let change = available.saturating_sub(&forward_value);
        if !change.is_zero() && !msg.response_destination.is_zero() {
            out.push(excesses(msg.response_destination, change, msg.query_id));
        }
        Ok(out)
    }
}

impl Contract for TokenWallet {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::Transfer(m) => self.on_transfer(ctx, m),
            Op::InternalTransfer(m) => self.on_internal_transfer(ctx, m),
            Op::Excesses(_) | Op::Bounced(_) => Ok(vec![]),
            other => {
                warn!(wallet = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}
