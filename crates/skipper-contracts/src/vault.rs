//! Per-holder custody of locked governance tokens.
//!
//! A vault credits deposits reported by its token wallet, enforces the
//! time-lock on withdrawal, and relays owner-authorized payloads to the
//! registry stamped with the holder's identity, balance and lock horizon.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use skipper_types::{Address, Coins, Timestamp};
use tracing::{debug, warn};

use crate::context::{Context, Contract, HandlerResult, OutMessage};
use crate::derive::{vault_address, VaultInit};
use crate::error::ExitCode;
use crate::messages::{
    LockJettons, Op, ProvideWalletAddress, ProxyMessage, SendProxyMessage, TakeWalletAddress,
    Transfer, TransferNotification, UnlockJettons,
};

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Vault {
    owner: Address,
    token_kind: Address,
    locked_amount: Coins,
    unlock_at: Timestamp,
    /// Token wallet allowed to credit this vault, learned from the master
    verified_deposit_source: Option<Address>,
}

/// Read-only view returned by ledger queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultData {
    pub owner: Address,
    pub token_kind: Address,
    pub amount: Coins,
    pub unlock_date: Timestamp,
    pub deposit_source: Option<Address>,
}

impl Vault {
    pub fn new(init: VaultInit) -> Self {
        Self {
            owner: init.owner,
            token_kind: init.token_kind,
            locked_amount: Coins::zero(),
            unlock_at: 0,
            verified_deposit_source: None,
        }
    }

    pub fn address(&self) -> Address {
        vault_address(self.owner, self.token_kind)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn locked_amount(&self) -> &Coins {
        &self.locked_amount
    }

    pub fn unlock_at(&self) -> Timestamp {
        self.unlock_at
    }

    pub fn deposit_source(&self) -> Option<Address> {
        self.verified_deposit_source
    }

    pub fn data(&self) -> VaultData {
        VaultData {
            owner: self.owner,
            token_kind: self.token_kind,
            amount: self.locked_amount.clone(),
            unlock_date: self.unlock_at,
            deposit_source: self.verified_deposit_source,
        }
    }

    fn on_deposit(&mut self, ctx: &Context<'_>, msg: TransferNotification) -> HandlerResult {
        match self.verified_deposit_source {
            Some(source) => {
                ctx.require_sender(source, ExitCode::InvalidOwner)?;
                self.locked_amount += &msg.amount;
                debug!(vault = %ctx.myself, amount = %msg.amount, total = %self.locked_amount, "Deposit credited");
                Ok(vec![])
            }
            None => {
                // Bootstrap: the first credit is trusted before the master
                // has confirmed which wallet belongs to this vault.
                self.locked_amount += &msg.amount;
                debug!(
                    vault = %ctx.myself,
                    wallet = %ctx.sender,
                    amount = %msg.amount,
                    "Unverified deposit credited, requesting wallet address"
                );
                let discovery = ProvideWalletAddress {
                    query_id: msg.query_id,
                    owner_address: ctx.myself,
                    include_address: true,
                };
                Ok(vec![OutMessage::new(self.token_kind, ctx.value.clone(), discovery)])
            }
        }
    }

    fn on_take_wallet_address(&mut self, ctx: &Context<'_>, msg: TakeWalletAddress) -> HandlerResult {
        ctx.require_sender(self.token_kind, ExitCode::InvalidOwner)?;
        if self.verified_deposit_source.is_none() {
            debug!(vault = %ctx.myself, wallet = %msg.wallet_address, "Deposit source verified");
            self.verified_deposit_source = Some(msg.wallet_address);
        }
        Ok(vec![])
    }

    fn on_lock(&mut self, ctx: &Context<'_>, msg: LockJettons) -> HandlerResult {
        ctx.require_sender(self.owner, ExitCode::InvalidOwner)?;
        if msg.lock_period == 0 {
            return Err(ExitCode::InvalidLockPeriod);
        }
        if msg.lock_period < ctx.params.lock_min_interval {
            return Err(ExitCode::LockPeriodTooShort);
        }
        self.raise_unlock(ctx.now.saturating_add(msg.lock_period));
        debug!(vault = %ctx.myself, unlock_at = self.unlock_at, "Lock extended");
        Ok(vec![])
    }

    fn on_unlock(&mut self, ctx: &Context<'_>, msg: UnlockJettons) -> HandlerResult {
        ctx.require_sender(self.owner, ExitCode::InvalidOwner)?;
        if ctx.now < self.unlock_at {
            return Err(ExitCode::UnlockDateNotArrived);
        }
        if ctx.value < ctx.params.min_fee {
            return Err(ExitCode::NeedFee);
        }
        let wallet = self.verified_deposit_source.ok_or(ExitCode::NotInitialized)?;
        if self.locked_amount.is_zero() {
            return Err(ExitCode::InvalidAmount);
        }

        let amount = std::mem::take(&mut self.locked_amount);
        debug!(vault = %ctx.myself, %amount, "Tokens released to owner");
        let transfer = Transfer {
            query_id: msg.query_id,
            amount,
            destination: self.owner,
            response_destination: self.owner,
            forward_value: Coins::zero(),
            forward_payload: Vec::new(),
        };
        Ok(vec![OutMessage::new(wallet, ctx.value.clone(), transfer)])
    }

    fn on_send_proxy(&mut self, ctx: &Context<'_>, msg: SendProxyMessage) -> HandlerResult {
        ctx.require_sender(self.owner, ExitCode::InvalidOwner)?;
        if ctx.value < ctx.params.min_fee {
            return Err(ExitCode::NeedFee);
        }

        let lock_period = ctx.params.effective_lock_period(msg.lock_period);
        let voter_unlock_date = ctx.now.saturating_add(lock_period);
        self.raise_unlock(voter_unlock_date);

        debug!(
            vault = %ctx.myself,
            to = %msg.to,
            amount = %self.locked_amount,
            voter_unlock_date,
            "Relaying proxy message"
        );
        let proxy = ProxyMessage {
            owner: self.owner,
            lock_period: Some(lock_period),
            voter_unlock_date,
            amount: self.locked_amount.clone(),
            payload: msg.payload,
        };
        Ok(vec![OutMessage::new(msg.to, ctx.value.clone(), proxy)])
    }

    fn raise_unlock(&mut self, horizon: Timestamp) {
        self.unlock_at = self.unlock_at.max(horizon);
    }
}

impl Contract for Vault {
    fn receive(&mut self, ctx: &Context<'_>, op: Op) -> HandlerResult {
        match op {
            Op::Deploy(m) => ctx.deploy_ok(m.query_id),
            Op::TransferNotification(m) => self.on_deposit(ctx, m),
            Op::TakeWalletAddress(m) => self.on_take_wallet_address(ctx, m),
            Op::LockJettons(m) => self.on_lock(ctx, m),
            Op::UnlockJettons(m) => self.on_unlock(ctx, m),
            Op::SendProxyMessage(m) => self.on_send_proxy(ctx, m),
            // Change from the token wallet or a failed relay
            Op::Excesses(_) | Op::Bounced(_) => Ok(vec![]),
            Op::Raw(body) if body.is_empty() => Ok(vec![]),
            other => {
                warn!(vault = %ctx.myself, op = other.name(), "Unhandled message");
                Err(ExitCode::InvalidMessage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ProtocolParams, LOCK_INTERVAL, LOCK_MIN_INTERVAL};
    use crate::test_utils::{addr, ctx};

    const NOW: Timestamp = 1_700_000_000;

    fn fee() -> Coins {
        Coins::from(50_000_000u64)
    }

    fn new_vault() -> (Vault, Address) {
        let vault = Vault::new(VaultInit {
            owner: addr("deployer"),
            token_kind: addr("master"),
        });
        let at = vault.address();
        (vault, at)
    }

    fn notification(amount: u64) -> Op {
        Op::from(TransferNotification {
            query_id: 0,
            amount: Coins::from(amount),
            sender: addr("depositor"),
            forward_payload: vec![],
        })
    }

    fn verified_vault(params: &ProtocolParams, amount: u64) -> (Vault, Address) {
        let (mut vault, at) = new_vault();
        let wallet = addr("vault wallet");
        vault
            .receive(&ctx(params, at, wallet, fee(), NOW), notification(amount))
            .unwrap();
        let reply = Op::from(TakeWalletAddress {
            query_id: 0,
            wallet_address: wallet,
            owner_address: None,
        });
        vault.receive(&ctx(params, at, addr("master"), Coins::zero(), NOW), reply).unwrap();
        (vault, at)
    }

    #[test]
    fn test_first_deposit_requests_discovery() {
        let params = ProtocolParams::default();
        let (mut vault, at) = new_vault();

        let out = vault
            .receive(&ctx(&params, at, addr("any wallet"), fee(), NOW), notification(100_500))
            .unwrap();

        assert_eq!(vault.locked_amount(), &Coins::from(100_500u64));
        assert_eq!(vault.deposit_source(), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, addr("master"));
        assert_eq!(
            out[0].op,
            Op::ProvideWalletAddress(ProvideWalletAddress {
                query_id: 0,
                owner_address: at,
                include_address: true,
            })
        );
    }

    #[test]
    fn test_verified_source_gates_deposits() {
        let params = ProtocolParams::default();
        let (mut vault, at) = verified_vault(&params, 10);
        assert_eq!(vault.deposit_source(), Some(addr("vault wallet")));

        let err = vault
            .receive(&ctx(&params, at, addr("impostor"), fee(), NOW), notification(99))
            .unwrap_err();
        assert_eq!(err, ExitCode::InvalidOwner);
        assert_eq!(vault.locked_amount(), &Coins::from(10u64));

        let out = vault
            .receive(&ctx(&params, at, addr("vault wallet"), fee(), NOW), notification(5))
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(vault.locked_amount(), &Coins::from(15u64));
    }

    #[test]
    fn test_wallet_reply_only_from_master() {
        let params = ProtocolParams::default();
        let (mut vault, at) = new_vault();
        let reply = Op::from(TakeWalletAddress {
            query_id: 0,
            wallet_address: addr("fake"),
            owner_address: None,
        });
        let err = vault
            .receive(&ctx(&params, at, addr("fake master"), Coins::zero(), NOW), reply)
            .unwrap_err();
        assert_eq!(err, ExitCode::InvalidOwner);
        assert_eq!(vault.deposit_source(), None);
    }

    #[test]
    fn test_cached_source_is_not_replaced() {
        let params = ProtocolParams::default();
        let (mut vault, at) = verified_vault(&params, 1);
        let reply = Op::from(TakeWalletAddress {
            query_id: 1,
            wallet_address: addr("other"),
            owner_address: None,
        });
        vault.receive(&ctx(&params, at, addr("master"), Coins::zero(), NOW), reply).unwrap();
        assert_eq!(vault.deposit_source(), Some(addr("vault wallet")));
    }

    #[test]
    fn test_lock_rules() {
        let params = ProtocolParams::default();
        let (mut vault, at) = new_vault();
        let owner = addr("deployer");

        let lock = |p| Op::from(LockJettons { lock_period: p });
        assert_eq!(
            vault.receive(&ctx(&params, at, addr("stranger"), fee(), NOW), lock(LOCK_INTERVAL)),
            Err(ExitCode::InvalidOwner)
        );
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, fee(), NOW), lock(0)),
            Err(ExitCode::InvalidLockPeriod)
        );
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, fee(), NOW), lock(LOCK_MIN_INTERVAL - 1)),
            Err(ExitCode::LockPeriodTooShort)
        );

        vault.receive(&ctx(&params, at, owner, fee(), NOW), lock(LOCK_INTERVAL)).unwrap();
        assert_eq!(vault.unlock_at(), NOW + LOCK_INTERVAL);

        // A shorter lock never moves the date backwards
        vault.receive(&ctx(&params, at, owner, fee(), NOW), lock(LOCK_MIN_INTERVAL)).unwrap();
        assert_eq!(vault.unlock_at(), NOW + LOCK_INTERVAL);
    }

    #[test]
    fn test_unlock_flow() {
        let params = ProtocolParams::default();
        let (mut vault, at) = verified_vault(&params, 100_500);
        let owner = addr("deployer");
        let unlock = || Op::from(UnlockJettons { query_id: 3 });

        vault
            .receive(&ctx(&params, at, owner, fee(), NOW), Op::from(LockJettons { lock_period: LOCK_INTERVAL }))
            .unwrap();

        // An early withdrawal is refused for its date even when underpaid
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, Coins::from(1u64), NOW), unlock()),
            Err(ExitCode::UnlockDateNotArrived)
        );
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, fee(), NOW + 10), unlock()),
            Err(ExitCode::UnlockDateNotArrived)
        );
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, Coins::from(1u64), NOW + LOCK_INTERVAL), unlock()),
            Err(ExitCode::NeedFee)
        );
        assert_eq!(vault.locked_amount(), &Coins::from(100_500u64));

        let out = vault
            .receive(&ctx(&params, at, owner, fee(), NOW + LOCK_INTERVAL), unlock())
            .unwrap();
        assert!(vault.locked_amount().is_zero());
        assert_eq!(out[0].to, addr("vault wallet"));
        assert_eq!(out[0].value, fee());
        match &out[0].op {
            Op::Transfer(t) => {
                assert_eq!(t.amount, Coins::from(100_500u64));
                assert_eq!(t.destination, owner);
                assert_eq!(t.response_destination, owner);
            }
            other => panic!("unexpected {other:?}"),
        }

        // Nothing left to release
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, fee(), NOW + LOCK_INTERVAL), unlock()),
            Err(ExitCode::InvalidAmount)
        );
    }

    #[test]
    fn test_unlock_without_wallet() {
        let params = ProtocolParams::default();
        let (mut vault, at) = new_vault();
        assert_eq!(
            vault.receive(
                &ctx(&params, at, addr("deployer"), fee(), NOW),
                Op::from(UnlockJettons { query_id: 0 })
            ),
            Err(ExitCode::NotInitialized)
        );
    }

    #[test]
    fn test_proxy_clamps_lock_period() {
        let params = ProtocolParams::default();
        let (mut vault, at) = verified_vault(&params, 42);
        let owner = addr("deployer");
        let proxy = |lock_period| {
            Op::from(SendProxyMessage {
                to: addr("registry"),
                lock_period,
                payload: vec![1, 2, 3],
            })
        };

        assert_eq!(
            vault.receive(&ctx(&params, at, addr("stranger"), fee(), NOW), proxy(None)),
            Err(ExitCode::InvalidOwner)
        );
        assert_eq!(
            vault.receive(&ctx(&params, at, owner, Coins::from(1u64), NOW), proxy(None)),
            Err(ExitCode::NeedFee)
        );

        let out = vault.receive(&ctx(&params, at, owner, fee(), NOW), proxy(Some(5))).unwrap();
        assert_eq!(out[0].to, addr("registry"));
        assert_eq!(out[0].value, fee());
        assert_eq!(
            out[0].op,
            Op::ProxyMessage(ProxyMessage {
                owner,
                lock_period: Some(LOCK_MIN_INTERVAL),
                voter_unlock_date: NOW + LOCK_MIN_INTERVAL,
                amount: Coins::from(42u64),
                payload: vec![1, 2, 3],
            })
        );
        assert_eq!(vault.unlock_at(), NOW + LOCK_MIN_INTERVAL);

        vault.receive(&ctx(&params, at, owner, fee(), NOW), proxy(None)).unwrap();
        assert_eq!(vault.unlock_at(), NOW + LOCK_INTERVAL);
    }

    #[test]
    fn test_unknown_message_rejected() {
        let params = ProtocolParams::default();
        let (mut vault, at) = new_vault();
        let before = vault.clone();
        assert_eq!(
            vault.receive(&ctx(&params, at, addr("x"), fee(), NOW), Op::Raw(vec![9, 9, 9, 9])),
            Err(ExitCode::InvalidMessage)
        );
        assert_eq!(vault, before);
    }
}
