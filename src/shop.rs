//! Upgrade shop
//!
//! Coins earned in runs buy shield and booster levels, which lengthen the
//! matching power-ups.

use crate::persistence::{MAX_UPGRADE_LEVEL, PlayerProgress};

/// Purchasable upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Shield,
    Booster,
}

impl Upgrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upgrade::Shield => "Shield",
            Upgrade::Booster => "Booster",
        }
    }

    pub fn level(&self, progress: &PlayerProgress) -> u8 {
        match self {
            Upgrade::Shield => progress.shield_level,
            Upgrade::Booster => progress.booster_level,
        }
    }

    fn level_mut<'a>(&self, progress: &'a mut PlayerProgress) -> &'a mut u8 {
        match self {
            Upgrade::Shield => &mut progress.shield_level,
            Upgrade::Booster => &mut progress.booster_level,
        }
    }
}

/// Why a purchase was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("already at the maximum level")]
    MaxLevel,
    #[error("needs {cost} coins, have {have}")]
    NotEnoughCoins { cost: u64, have: u64 },
}

/// Base cost of the first level
pub const BASE_UPGRADE_COST: u64 = 100;

/// Cost of the next level, doubling per level (None at max)
pub fn upgrade_cost(current_level: u8) -> Option<u64> {
    if current_level >= MAX_UPGRADE_LEVEL {
        None
    } else {
        Some(BASE_UPGRADE_COST << current_level)
    }
}

/// Buy one level; coins are deducted only on success. Returns the new level.
pub fn purchase(progress: &mut PlayerProgress, upgrade: Upgrade) -> Result<u8, PurchaseError> {
    let level = upgrade.level(progress);
    let cost = upgrade_cost(level).ok_or(PurchaseError::MaxLevel)?;
    if progress.coins < cost {
        return Err(PurchaseError::NotEnoughCoins {
            cost,
            have: progress.coins,
        });
    }

    progress.coins -= cost;
    let slot = upgrade.level_mut(progress);
    *slot += 1;
    let new_level = *slot;
    log::info!(
        "{} upgraded to level {} for {} coins",
        upgrade.as_str(),
        new_level,
        cost
    );
    Ok(new_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_curve() {
        assert_eq!(upgrade_cost(0), Some(100));
        assert_eq!(upgrade_cost(1), Some(200));
        assert_eq!(upgrade_cost(4), Some(1600));
        assert_eq!(upgrade_cost(MAX_UPGRADE_LEVEL), None);
    }

    #[test]
    fn test_purchase_deducts_coins() {
        let mut progress = PlayerProgress {
            coins: 350,
            ..Default::default()
        };
        assert_eq!(purchase(&mut progress, Upgrade::Shield), Ok(1));
        assert_eq!(progress.coins, 250);
        assert_eq!(purchase(&mut progress, Upgrade::Shield), Ok(2));
        assert_eq!(progress.coins, 50);
        assert_eq!(progress.booster_level, 0);
    }

    #[test]
    fn test_refuses_without_coins() {
        let mut progress = PlayerProgress {
            coins: 99,
            ..Default::default()
        };
        assert_eq!(
            purchase(&mut progress, Upgrade::Booster),
            Err(PurchaseError::NotEnoughCoins { cost: 100, have: 99 })
        );
        assert_eq!(progress.coins, 99);
        assert_eq!(progress.booster_level, 0);
    }

    #[test]
    fn test_refuses_at_max_level() {
        let mut progress = PlayerProgress {
            coins: 1_000_000,
            booster_level: MAX_UPGRADE_LEVEL,
            ..Default::default()
        };
        assert_eq!(
            purchase(&mut progress, Upgrade::Booster),
            Err(PurchaseError::MaxLevel)
        );
    }
}
