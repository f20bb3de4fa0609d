//! Field-level lenient decoding.
//!
//! Upstream catalogs return placeholder strings on restricted plan tiers
//! (e.g. `"Please upgrade to PRO plan to see this field"` where an integer is
//! expected). [`Lenient<T>`] decodes a field as `T` when the value has the
//! right shape and as absent otherwise, so one bad field never fails the
//! surrounding entry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A field that is `Some(T)` if the upstream value decodes as `T`, `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lenient<T>(pub Option<T>);

impl<T> Lenient<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<'de, T> Deserialize<'de> for Lenient<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self(T::deserialize(value).ok()))
    }
}

/// An identifier that upstream may send either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LooseId {
    Number(u64),
    Text(String),
}

impl LooseId {
    /// Normalized string form; blank strings are treated as absent.
    pub fn into_string(self) -> Option<String> {
        match self {
            LooseId::Number(n) => Some(n.to_string()),
            LooseId::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}
