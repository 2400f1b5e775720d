#![deny(warnings)]

//! Economic rules: clicks, upgrade purchases and upgrade pricing.
//!
//! Everything here is pure and deterministic:
//! - [`click`] grants income and bumps the statistics counters
//! - [`purchase_upgrade`] trades coins for income when affordable
//! - [`compute_pricing`] derives the three upgrade offers from current income
//!
//! Counter arithmetic saturates at `u64::MAX` instead of wrapping.

use game_core::{GameEvent, GameState, UpgradeTier};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Result of an applied transition: the new state and the event to surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: GameState,
    pub event: GameEvent,
}

/// Declined purchase. An expected outcome, not a failure of the engine.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("cannot afford upgrade: costs {cost}, have {coins}")]
pub struct InsufficientFunds {
    pub cost: u64,
    pub coins: u64,
}

/// Apply one click.
///
/// Example:
/// let next = click(&GameState::default());
/// assert_eq!(next.state.coins, 1);
pub fn click(state: &GameState) -> Transition {
    let income = state.coins_per_click;
    let next = GameState {
        coins: state.coins.saturating_add(income),
        total_clicks: state.total_clicks.saturating_add(1),
        total_earned: state.total_earned.saturating_add(income),
        ..state.clone()
    };
    debug!(coins = next.coins, income, "click");
    Transition {
        state: next,
        event: GameEvent::CoinEarned,
    }
}

/// Buy an income upgrade for `cost`, adding `bonus` to coins per click.
///
/// The pair is not re-priced here; only affordability is checked.
pub fn purchase_upgrade(
    state: &GameState,
    cost: u64,
    bonus: u64,
) -> Result<Transition, InsufficientFunds> {
    if state.coins < cost {
        debug!(cost, coins = state.coins, "upgrade declined");
        return Err(InsufficientFunds {
            cost,
            coins: state.coins,
        });
    }
    let next = GameState {
        coins: state.coins - cost,
        coins_per_click: state.coins_per_click.saturating_add(bonus),
        ..state.clone()
    };
    debug!(cost, bonus, coins_per_click = next.coins_per_click, "upgrade purchased");
    Ok(Transition {
        state: next,
        event: GameEvent::UpgradePurchased,
    })
}

/// Price `tier` from the current income and buy it.
///
/// Uses the same [`compute_pricing`] as the listing, so the price shown is
/// the price charged.
pub fn purchase_tier(
    state: &GameState,
    tier: UpgradeTier,
) -> Result<Transition, InsufficientFunds> {
    let offer = compute_pricing(state.coins_per_click).offer(tier);
    purchase_upgrade(state, offer.cost, offer.bonus)
}

/// Scaling constants for one tier.
#[derive(Clone, Copy, Debug)]
struct TierScale {
    min_cost: u64,
    cost_per_income: u64,
    min_bonus: u64,
    /// Bonus factor in tenths of the current income.
    bonus_tenths: u64,
}

const fn scale(tier: UpgradeTier) -> TierScale {
    match tier {
        UpgradeTier::Small => TierScale {
            min_cost: 10,
            cost_per_income: 5,
            min_bonus: 1,
            bonus_tenths: 5,
        },
        UpgradeTier::Medium => TierScale {
            min_cost: 50,
            cost_per_income: 10,
            min_bonus: 2,
            bonus_tenths: 8,
        },
        UpgradeTier::Large => TierScale {
            min_cost: 150,
            cost_per_income: 15,
            min_bonus: 3,
            bonus_tenths: 12,
        },
    }
}

/// `round(value * tenths / 10)` with halves rounded up, in exact integer math.
///
/// For non-negative inputs this equals round-half-away-from-zero.
pub fn round_tenths(value: u64, tenths: u64) -> u64 {
    let scaled = (value as u128) * (tenths as u128) + 5;
    u64::try_from(scaled / 10).unwrap_or(u64::MAX)
}

/// One purchasable income boost, recomputed from state on every render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UpgradeOffer {
    pub tier: UpgradeTier,
    pub cost: u64,
    pub bonus: u64,
}

impl UpgradeOffer {
    /// Whether `coins` covers the cost; same comparison as [`purchase_upgrade`].
    pub fn is_affordable(&self, coins: u64) -> bool {
        coins >= self.cost
    }
}

/// The three offers for a given income.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub small: UpgradeOffer,
    pub medium: UpgradeOffer,
    pub large: UpgradeOffer,
}

impl Pricing {
    /// Offer for a specific tier.
    pub fn offer(&self, tier: UpgradeTier) -> UpgradeOffer {
        match tier {
            UpgradeTier::Small => self.small,
            UpgradeTier::Medium => self.medium,
            UpgradeTier::Large => self.large,
        }
    }

    /// Offers in display order.
    pub fn offers(&self) -> [UpgradeOffer; 3] {
        [self.small, self.medium, self.large]
    }
}

fn price_tier(tier: UpgradeTier, coins_per_click: u64) -> UpgradeOffer {
    let s = scale(tier);
    UpgradeOffer {
        tier,
        cost: s.min_cost.max(coins_per_click.saturating_mul(s.cost_per_income)),
        bonus: s.min_bonus.max(round_tenths(coins_per_click, s.bonus_tenths)),
    }
}

/// Upgrade offers scaled to the player's current income.
///
/// - small: cost `max(10, cpc*5)`, bonus `max(1, round(cpc*0.5))`
/// - medium: cost `max(50, cpc*10)`, bonus `max(2, round(cpc*0.8))`
/// - large: cost `max(150, cpc*15)`, bonus `max(3, round(cpc*1.2))`
///
/// Example:
/// let p = compute_pricing(2);
/// assert_eq!((p.medium.cost, p.medium.bonus), (50, 2));
pub fn compute_pricing(coins_per_click: u64) -> Pricing {
    Pricing {
        small: price_tier(UpgradeTier::Small, coins_per_click),
        medium: price_tier(UpgradeTier::Medium, coins_per_click),
        large: price_tier(UpgradeTier::Large, coins_per_click),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(coins: u64, coins_per_click: u64) -> GameState {
        GameState::with_balance(coins, coins_per_click)
    }

    #[test]
    fn five_clicks_from_fresh() {
        let mut s = state(0, 1);
        for _ in 0..5 {
            let t = click(&s);
            assert_eq!(t.event, GameEvent::CoinEarned);
            s = t.state;
        }
        assert_eq!(s.coins, 5);
        assert_eq!(s.coins_per_click, 1);
        assert_eq!(s.total_clicks, 5);
        assert_eq!(s.total_earned, 5);
    }

    #[test]
    fn small_upgrade_declined_when_short() {
        let s = state(5, 1);
        let offer = compute_pricing(s.coins_per_click).small;
        assert_eq!((offer.cost, offer.bonus), (10, 1));
        let declined = purchase_upgrade(&s, offer.cost, offer.bonus).unwrap_err();
        assert_eq!(declined, InsufficientFunds { cost: 10, coins: 5 });
        assert!(!offer.is_affordable(s.coins));
    }

    #[test]
    fn medium_upgrade_succeeds() {
        let s = state(60, 2);
        let offer = compute_pricing(s.coins_per_click).medium;
        assert_eq!((offer.cost, offer.bonus), (50, 2));
        let t = purchase_upgrade(&s, offer.cost, offer.bonus).unwrap();
        assert_eq!(t.event, GameEvent::UpgradePurchased);
        assert_eq!(t.state.coins, 10);
        assert_eq!(t.state.coins_per_click, 4);
    }

    #[test]
    fn exact_balance_is_enough() {
        let s = state(10, 1);
        let t = purchase_upgrade(&s, 10, 1).unwrap();
        assert_eq!(t.state.coins, 0);
        assert_eq!(t.state.coins_per_click, 2);
    }

    #[test]
    fn purchase_keeps_statistics_and_avatar() {
        let mut s = state(100, 3);
        s.total_clicks = 40;
        s.total_earned = 90;
        s.avatar_reference = Some("file:///a.png".into());
        let t = purchase_upgrade(&s, 15, 2).unwrap();
        assert_eq!(t.state.total_clicks, 40);
        assert_eq!(t.state.total_earned, 90);
        assert_eq!(t.state.avatar_reference.as_deref(), Some("file:///a.png"));
    }

    #[test]
    fn purchase_tier_charges_listed_price() {
        let s = state(1_000, 10);
        let listed = compute_pricing(10).large;
        assert_eq!((listed.cost, listed.bonus), (150, 12));
        let t = purchase_tier(&s, UpgradeTier::Large).unwrap();
        assert_eq!(t.state.coins, 850);
        assert_eq!(t.state.coins_per_click, 22);
    }

    #[test]
    fn pricing_at_fresh_income() {
        let p = compute_pricing(1);
        assert_eq!((p.small.cost, p.small.bonus), (10, 1));
        assert_eq!((p.medium.cost, p.medium.bonus), (50, 2));
        assert_eq!((p.large.cost, p.large.bonus), (150, 3));
    }

    #[test]
    fn halves_round_up() {
        // 3 * 0.5 = 1.5 -> 2, 5 * 0.5 = 2.5 -> 3
        assert_eq!(round_tenths(3, 5), 2);
        assert_eq!(round_tenths(5, 5), 3);
        // 4 * 0.8 = 3.2 -> 3, 7 * 1.2 = 8.4 -> 8
        assert_eq!(round_tenths(4, 8), 3);
        assert_eq!(round_tenths(7, 12), 8);
        assert_eq!(round_tenths(u64::MAX, 12), u64::MAX);
    }

    #[test]
    fn pricing_scales_with_income() {
        let p = compute_pricing(40);
        assert_eq!((p.small.cost, p.small.bonus), (200, 20));
        assert_eq!((p.medium.cost, p.medium.bonus), (400, 32));
        assert_eq!((p.large.cost, p.large.bonus), (600, 48));
        assert_eq!(p.offers().map(|o| o.tier), UpgradeTier::ALL);
    }

    #[test]
    fn click_saturates() {
        let s = state(u64::MAX - 1, 5);
        let t = click(&s);
        assert_eq!(t.state.coins, u64::MAX);
    }

    proptest! {
        #[test]
        fn click_grants_income(coins in 0u64..1_000_000_000, cpc in 1u64..1_000_000, clicks in 0u64..1_000_000, earned in 0u64..1_000_000_000) {
            let s = GameState { coins, coins_per_click: cpc, total_clicks: clicks, total_earned: earned, avatar_reference: None };
            let n = click(&s).state;
            prop_assert!(n.coins > s.coins);
            prop_assert_eq!(n.coins, coins + cpc);
            prop_assert_eq!(n.total_clicks, clicks + 1);
            prop_assert_eq!(n.total_earned, earned + cpc);
            prop_assert_eq!(n.coins_per_click, cpc);
        }

        #[test]
        fn purchase_is_noop_or_exact(coins in 0u64..10_000, cpc in 1u64..1_000, cost in 0u64..10_000, bonus in 0u64..1_000) {
            let s = state(coins, cpc);
            match purchase_upgrade(&s, cost, bonus) {
                Ok(t) => {
                    prop_assert!(coins >= cost);
                    prop_assert_eq!(t.state.coins, coins - cost);
                    prop_assert_eq!(t.state.coins_per_click, cpc + bonus);
                }
                Err(declined) => {
                    prop_assert!(coins < cost);
                    prop_assert_eq!(declined, InsufficientFunds { cost, coins });
                }
            }
        }

        #[test]
        fn pricing_is_pure_and_monotonic(cpc in 1u64..1_000_000_000) {
            let a = compute_pricing(cpc);
            prop_assert_eq!(a, compute_pricing(cpc));
            let b = compute_pricing(cpc + 1);
            for (lo, hi) in a.offers().iter().zip(b.offers().iter()) {
                prop_assert!(hi.cost >= lo.cost);
                prop_assert!(hi.bonus >= lo.bonus);
            }
        }

        #[test]
        fn affordability_matches_engine(coins in 0u64..100_000, cpc in 1u64..5_000) {
            let s = state(coins, cpc);
            for tier in UpgradeTier::ALL {
                let offer = compute_pricing(cpc).offer(tier);
                prop_assert_eq!(offer.is_affordable(coins), purchase_tier(&s, tier).is_ok());
            }
        }
    }
}
