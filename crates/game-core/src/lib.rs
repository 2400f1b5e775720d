#![deny(warnings)]

//! Core domain models and invariants for the coin clicker.
//!
//! This crate defines the single persisted aggregate ([`GameState`]), the
//! notification events the economy emits, and the upgrade tiers offered to the
//! player, together with validation helpers that guard the basic invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coins held by a fresh save.
pub const DEFAULT_COINS: u64 = 0;
/// Income per click of a fresh save.
pub const DEFAULT_COINS_PER_CLICK: u64 = 1;

/// The progression counters plus the chosen profile picture.
///
/// Serialized field names match the on-disk snapshot layout
/// (`coins`, `coinsPerClick`, `totalClicks`, `totalEarned`, `avatarUri`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    /// Spendable balance.
    pub coins: u64,
    /// Coins granted per click (>= 1).
    pub coins_per_click: u64,
    /// Number of click actions ever applied.
    pub total_clicks: u64,
    /// Sum of all coins ever granted by clicks.
    pub total_earned: u64,
    /// Opaque locator of the avatar image, as handed over by the media picker.
    #[serde(rename = "avatarUri")]
    pub avatar_reference: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            coins: DEFAULT_COINS,
            coins_per_click: DEFAULT_COINS_PER_CLICK,
            total_clicks: 0,
            total_earned: 0,
            avatar_reference: None,
        }
    }
}

impl GameState {
    /// Convenience constructor for a state with the given balance and income.
    pub fn with_balance(coins: u64, coins_per_click: u64) -> Self {
        Self {
            coins,
            coins_per_click,
            ..Self::default()
        }
    }

    /// Derived view used by the statistics screen.
    pub fn stats(&self) -> StatsSummary {
        StatsSummary {
            coins: self.coins,
            coins_per_click: self.coins_per_click,
            total_clicks: self.total_clicks,
            total_earned: self.total_earned,
            has_avatar: self.avatar_reference.is_some(),
        }
    }
}

/// Read-only statistics snapshot, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub coins: u64,
    pub coins_per_click: u64,
    pub total_clicks: u64,
    pub total_earned: u64,
    pub has_avatar: bool,
}

/// Fire-and-forget notifications for the presentation layer (sound, haptics).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    /// A click granted coins.
    CoinEarned,
    /// An upgrade was bought.
    UpgradePurchased,
}

/// Pricing brackets for income upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeTier {
    /// Cheap, modest bonus.
    Small,
    /// Balanced price and bonus.
    Medium,
    /// Expensive, strong bonus.
    Large,
}

impl UpgradeTier {
    /// All tiers in display order.
    pub const ALL: [UpgradeTier; 3] = [UpgradeTier::Small, UpgradeTier::Medium, UpgradeTier::Large];

    /// Card title.
    pub fn label(self) -> &'static str {
        match self {
            UpgradeTier::Small => "Small upgrade",
            UpgradeTier::Medium => "Medium upgrade",
            UpgradeTier::Large => "Large upgrade",
        }
    }

    /// Card blurb.
    pub fn description(self) -> &'static str {
        match self {
            UpgradeTier::Small => "A modest income boost. Good for getting started.",
            UpgradeTier::Medium => "A good balance between price and payoff.",
            UpgradeTier::Large => "Greatly speeds up income growth, but costs a lot.",
        }
    }
}

impl std::str::FromStr for UpgradeTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" | "s" => Ok(UpgradeTier::Small),
            "medium" | "m" => Ok(UpgradeTier::Medium),
            "large" | "big" | "l" => Ok(UpgradeTier::Large),
            other => Err(ValidationError::UnknownTier(other.to_string())),
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Income per click must be at least one coin.
    #[error("coins per click must be >= 1")]
    NonPositiveIncome,
    /// Tier name not recognised.
    #[error("unknown upgrade tier: {0}")]
    UnknownTier(String),
}

/// Validate a game state.
///
/// Counters are unsigned, so only the income floor needs checking. The avatar
/// reference is opaque and never inspected.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    if state.coins_per_click == 0 {
        return Err(ValidationError::NonPositiveIncome);
    }
    Ok(())
}
