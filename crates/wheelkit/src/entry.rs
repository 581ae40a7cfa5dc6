use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct EntryId(u64);

crate::impl_random_id!(EntryId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct Label(String);

crate::impl_string_newtype!(Label);

#[derive(Debug, Error, PartialEq)]
#[error("weight must be a finite number >= 0, got {0}")]
pub struct InvalidWeight(pub f64);

/// Angular share of an entry. Zero is allowed and yields an empty segment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Display)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    pub fn new(value: f64) -> Result<Self, InvalidWeight> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidWeight(value))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn is_selectable(self) -> bool {
        self.0 > 0.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self(DEFAULT_WEIGHT)
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Weight::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub label: Label,
    pub weight: Weight,
}

impl Entry {
    pub fn new(label: impl Into<String>, weight: Weight) -> Self {
        Self {
            id: EntryId::random(),
            label: Label::new(label),
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_validation() {
        let cases = vec![
            (0.0, true),
            (0.5, true),
            (10.0, true),
            (-1.0, false),
            (f64::NAN, false),
            (f64::INFINITY, false),
        ];

        for (raw, ok) in cases {
            assert_eq!(Weight::new(raw).is_ok(), ok, "weight {raw}");
        }
    }

    #[test]
    fn test_negative_weight_rejected_on_deserialize() {
        assert!(serde_json::from_str::<Weight>("-2.0").is_err());
        assert_eq!(serde_json::from_str::<Weight>("2.5").unwrap().get(), 2.5);
    }
}
