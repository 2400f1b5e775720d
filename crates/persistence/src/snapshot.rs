//! Snapshot codec.
//!
//! Writing is plain `serde_json`. Reading is lenient: the stored object is
//! merged field by field onto [`GameState::default`], so a missing or
//! malformed field costs only that field. Only a payload that is not a JSON
//! object at all is rejected.

use game_core::{validate_state, GameState, ValidationError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot is not a JSON object")]
    NotAnObject,
    #[error("invalid state: {0}")]
    Invalid(#[from] ValidationError),
}

/// Serialize a state into its stored form.
pub fn encode(state: &GameState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

/// Parse a stored snapshot, defaulting any absent or invalid field.
pub fn decode(text: &str) -> Result<GameState, DecodeError> {
    let Value::Object(fields) = serde_json::from_str::<Value>(text)? else {
        return Err(DecodeError::NotAnObject);
    };
    let defaults = GameState::default();
    let state = GameState {
        coins: counter(&fields, "coins").unwrap_or(defaults.coins),
        coins_per_click: counter(&fields, "coinsPerClick")
            .filter(|&v| v > 0)
            .unwrap_or(defaults.coins_per_click),
        total_clicks: counter(&fields, "totalClicks").unwrap_or(defaults.total_clicks),
        total_earned: counter(&fields, "totalEarned").unwrap_or(defaults.total_earned),
        avatar_reference: fields
            .get("avatarUri")
            .and_then(Value::as_str)
            .map(str::to_owned),
    };
    validate_state(&state)?;
    Ok(state)
}

/// Exclusive upper bound of `u64` as a float (2^64).
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Non-negative whole number stored under `name`. Whole floats such as `5.0`
/// count; floats too large for a `u64` do not.
fn counter(fields: &Map<String, Value>, name: &str) -> Option<u64> {
    let value = fields.get(name)?;
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f < U64_LIMIT && f.fract() == 0.0 => Some(f as u64),
        _ => {
            if !value.is_null() {
                debug!(field = name, %value, "ignoring invalid snapshot field");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_snapshot() {
        let s = decode(
            r#"{"coins":60,"coinsPerClick":2,"totalClicks":30,"totalEarned":60,"avatarUri":"file:///x.png"}"#,
        )
        .unwrap();
        assert_eq!(s.coins, 60);
        assert_eq!(s.coins_per_click, 2);
        assert_eq!(s.total_clicks, 30);
        assert_eq!(s.total_earned, 60);
        assert_eq!(s.avatar_reference.as_deref(), Some("file:///x.png"));
    }

    #[test]
    fn empty_object_is_defaults() {
        assert_eq!(decode("{}").unwrap(), GameState::default());
    }

    #[test]
    fn invalid_fields_fall_back_individually() {
        let s = decode(
            r#"{"coins":-4,"coinsPerClick":0,"totalClicks":"many","totalEarned":2.5,"avatarUri":17}"#,
        )
        .unwrap();
        assert_eq!(s, GameState::default());

        let s = decode(r#"{"coins":"lots","coinsPerClick":7}"#).unwrap();
        assert_eq!(s.coins, 0);
        assert_eq!(s.coins_per_click, 7);

        let s = decode(r#"{"coins":1e30,"coinsPerClick":1e25,"totalEarned":18446744073709551616.0}"#)
            .unwrap();
        assert_eq!(s, GameState::default());
    }

    #[test]
    fn largest_counters_survive() {
        let s = decode(r#"{"coins":18446744073709551615,"totalClicks":1e19}"#).unwrap();
        assert_eq!(s.coins, u64::MAX);
        assert_eq!(s.total_clicks, 10_000_000_000_000_000_000);
    }

    #[test]
    fn whole_floats_and_null_avatar() {
        let s = decode(r#"{"coins":5.0,"coinsPerClick":3.0,"avatarUri":null}"#).unwrap();
        assert_eq!(s.coins, 5);
        assert_eq!(s.coins_per_click, 3);
        assert!(s.avatar_reference.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let s = decode(r#"{"coins":9,"theme":"dark"}"#).unwrap();
        assert_eq!(s.coins, 9);
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(decode("[1,2,3]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("null"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode(""), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("{\"coins\":"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn encode_matches_layout() {
        let text = encode(&GameState::with_balance(3, 1)).unwrap();
        assert_eq!(
            text,
            r#"{"coins":3,"coinsPerClick":1,"totalClicks":0,"totalEarned":0,"avatarUri":null}"#
        );
    }
}
