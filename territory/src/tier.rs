//! Quality tiers.
//!
//! A tier selects the simplification tolerance of the landmass union and the
//! names of every per-tier artifact. Parsing is lenient: anything that is not
//! recognisably `coarse` resolves to [`QualityTier::Fine`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cost/fidelity setting for a derived partition.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Large simplification tolerance, small payload.
    Coarse,
    /// Small simplification tolerance, detailed coastlines.
    #[default]
    Fine,
}

impl QualityTier {
    /// Every known tier, in the order prewarming visits them.
    pub const ALL: [QualityTier; 2] = [QualityTier::Coarse, QualityTier::Fine];

    /// Resolve an optional, untrusted tier value.
    ///
    /// Missing and unrecognised values both resolve to `Fine`.
    pub fn coerce(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "coarse" => QualityTier::Coarse,
            _ => QualityTier::Fine,
        }
    }

    /// Lowercase name used in artifact file names and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Coarse => "coarse",
            QualityTier::Fine => "fine",
        }
    }

    /// Stable slot index for per-tier arrays.
    pub(crate) fn index(&self) -> usize {
        match self {
            QualityTier::Coarse => 0,
            QualityTier::Fine => 1,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::coerce(Some(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_known_values() {
        assert_eq!(QualityTier::coerce(Some("coarse")), QualityTier::Coarse);
        assert_eq!(QualityTier::coerce(Some("fine")), QualityTier::Fine);
        assert_eq!(QualityTier::coerce(Some(" Coarse ")), QualityTier::Coarse);
    }

    #[test]
    fn test_coerce_missing_and_unknown_resolve_to_fine() {
        assert_eq!(QualityTier::coerce(None), QualityTier::Fine);
        assert_eq!(QualityTier::coerce(Some("anything")), QualityTier::Fine);
        assert_eq!(QualityTier::coerce(Some("")), QualityTier::Fine);
        assert_eq!(QualityTier::coerce(None), QualityTier::coerce(Some("bogus")));
    }

    #[test]
    fn test_from_str_never_fails() {
        let tier: QualityTier = "medium".parse().unwrap();
        assert_eq!(tier, QualityTier::Fine);
    }

    #[test]
    fn test_all_order_and_index() {
        assert_eq!(QualityTier::ALL, [QualityTier::Coarse, QualityTier::Fine]);
        assert_eq!(QualityTier::Coarse.index(), 0);
        assert_eq!(QualityTier::Fine.index(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(QualityTier::Coarse.to_string(), "coarse");
        assert_eq!(QualityTier::Fine.to_string(), "fine");
    }
}
