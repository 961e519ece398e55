use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How source attributes are combined onto a target.
///
/// The default is [`Mode::ScaleInvariant`]. Pick deliberately: counts and
/// totals aggregated as means will not be conserved across the partition change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Rates and densities. Weights are normalized per target and the output
    /// is a weighted mean; half of a block keeps the block's density.
    #[default]
    ScaleInvariant,

    /// Counts and totals. Weights are not normalized and the output is the
    /// weighted sum of each source's overlapping share; half of a block gets
    /// half of its population.
    ScaleVariant,
}

impl Mode {
    /// `true` selects [`Mode::ScaleInvariant`], `false` [`Mode::ScaleVariant`].
    pub fn from_scale_invariant(scale_invariant: bool) -> Self {
        if scale_invariant { Self::ScaleInvariant } else { Self::ScaleVariant }
    }

    #[inline] pub fn is_scale_invariant(self) -> bool { self == Self::ScaleInvariant }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScaleInvariant => "scale-invariant",
            Self::ScaleVariant => "scale-variant",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "scale-invariant" | "intensive" | "mean" => Ok(Self::ScaleInvariant),
            "scale-variant" | "extensive" | "sum" => Ok(Self::ScaleVariant),
            other => Err(format!("unknown overlay mode `{other}` (expected scale-invariant or scale-variant)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_scale_invariant() {
        assert_eq!(Mode::default(), Mode::ScaleInvariant);
        assert!(Mode::from_scale_invariant(true).is_scale_invariant());
        assert!(!Mode::from_scale_invariant(false).is_scale_invariant());
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("scale_variant".parse::<Mode>().unwrap(), Mode::ScaleVariant);
        assert_eq!("Extensive".parse::<Mode>().unwrap(), Mode::ScaleVariant);
        assert_eq!("mean".parse::<Mode>().unwrap(), Mode::ScaleInvariant);
        assert!("median".parse::<Mode>().is_err());
    }

    #[test]
    fn serde_is_kebab_case() {
        assert_eq!(serde_json::to_string(&Mode::ScaleVariant).unwrap(), "\"scale-variant\"");
        let mode: Mode = serde_json::from_str("\"scale-invariant\"").unwrap();
        assert_eq!(mode, Mode::ScaleInvariant);
    }
}
