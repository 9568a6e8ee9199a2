//! Deployment-wide protocol parameters.
//!
//! Every actor of one deployment sees the same parameters; they are not part
//! of any actor's address.

use serde::{Deserialize, Serialize};
use skipper_types::{Coins, Timestamp};
use thiserror::Error;

/// Default lock horizon: 14 days.
pub const LOCK_INTERVAL: u64 = 1_209_600;
/// Shortest lock accepted: 1 day.
pub const LOCK_MIN_INTERVAL: u64 = 86_400;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    #[error("lock_min_interval must be positive")]
    ZeroMinInterval,

    #[error("lock_min_interval ({min}) exceeds lock_interval ({max})")]
    IntervalOrder { min: u64, max: u64 },

    #[error("veto_threshold_bps must be positive")]
    ZeroVetoThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Lock period applied when a relay omits one (seconds)
    pub lock_interval: u64,
    /// Floor for any requested lock period (seconds)
    pub lock_min_interval: u64,
    /// Minimum value attached to owner commands on a vault
    pub min_fee: Coins,
    /// Reserve kept by proposals and ballots to pay for their storage
    pub min_storage_fee: Coins,
    /// Yes votes required before a proposal can execute
    pub min_yes_votes: Coins,
    /// Execution fails when `no * 10_000 > yes * veto_threshold_bps`
    pub veto_threshold_bps: u32,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            lock_interval: LOCK_INTERVAL,
            lock_min_interval: LOCK_MIN_INTERVAL,
            min_fee: Coins::from(20_000_000u64),         // 0.02
            min_storage_fee: Coins::from(10_000_000u64), // 0.01
            min_yes_votes: Coins::whole(1_000_000),
            veto_threshold_bps: 10_000,
        }
    }
}

impl ProtocolParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.lock_min_interval == 0 {
            return Err(ParamsError::ZeroMinInterval);
        }
        if self.lock_min_interval > self.lock_interval {
            return Err(ParamsError::IntervalOrder {
                min: self.lock_min_interval,
                max: self.lock_interval,
            });
        }
        if self.veto_threshold_bps == 0 {
            return Err(ParamsError::ZeroVetoThreshold);
        }
        Ok(())
    }

    /// Normalize a requested lock period.
    ///
    /// Absent or zero selects `lock_interval`; anything shorter than
    /// `lock_min_interval` is raised to it; longer periods pass through.
    pub fn effective_lock_period(&self, requested: Option<u64>) -> u64 {
        match requested {
            None | Some(0) => self.lock_interval,
            Some(p) => p.max(self.lock_min_interval),
        }
    }

    /// `now + effective_lock_period(requested)`, saturating.
    pub fn unlock_horizon(&self, now: Timestamp, requested: Option<u64>) -> Timestamp {
        now.saturating_add(self.effective_lock_period(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_lock_period() {
        let params = ProtocolParams::default();
        assert_eq!(params.effective_lock_period(None), LOCK_INTERVAL);
        assert_eq!(params.effective_lock_period(Some(0)), LOCK_INTERVAL);
        assert_eq!(params.effective_lock_period(Some(5)), LOCK_MIN_INTERVAL);
        assert_eq!(params.effective_lock_period(Some(LOCK_MIN_INTERVAL + 5)), LOCK_MIN_INTERVAL + 5);
        assert_eq!(params.effective_lock_period(Some(LOCK_INTERVAL + 5)), LOCK_INTERVAL + 5);
    }

    #[test]
    fn test_unlock_horizon_saturates() {
        let params = ProtocolParams::default();
        assert_eq!(params.unlock_horizon(u64::MAX - 1, None), u64::MAX);
    }

    #[test]
    fn test_validate() {
        assert!(ProtocolParams::default().validate().is_ok());

        let mut params = ProtocolParams::default();
        params.lock_min_interval = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroMinInterval));

        let mut params = ProtocolParams::default();
        params.lock_min_interval = params.lock_interval + 1;
        assert!(matches!(params.validate(), Err(ParamsError::IntervalOrder { .. })));

        let mut params = ProtocolParams::default();
        params.veto_threshold_bps = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroVetoThreshold));
    }

    #[test]
    fn test_partial_toml() {
        let params: ProtocolParams = toml::from_str("min_yes_votes = \"42\"").unwrap();
        assert_eq!(params.min_yes_votes, Coins::from(42u64));
        assert_eq!(params.lock_interval, LOCK_INTERVAL);
    }
}
