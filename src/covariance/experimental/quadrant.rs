use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Sign combination of a pair of deviations from the target.
///
/// Each quadrant keeps only the part of the deviation vector whose sign
/// matches its two multipliers; everything else is clipped to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, IntoStaticStr)]
pub enum Quadrant {
    /// Both deviations non-negative.
    #[strum(serialize = "cu")]
    ConcordantUpper,
    /// Row deviation non-positive, column deviation non-negative.
    #[strum(serialize = "du")]
    DiscordantUpper,
    /// Row deviation non-negative, column deviation non-positive.
    #[strum(serialize = "dl")]
    DiscordantLower,
    /// Both deviations non-positive.
    #[strum(serialize = "cl")]
    ConcordantLower,
}

impl Quadrant {
    pub const COUNT: usize = 4;

    /// Sign multipliers applied to the row and column deviations.
    #[inline]
    pub fn signs(self) -> (f64, f64) {
        match self {
            Quadrant::ConcordantUpper => (1.0, 1.0),
            Quadrant::DiscordantUpper => (-1.0, 1.0),
            Quadrant::DiscordantLower => (1.0, -1.0),
            Quadrant::ConcordantLower => (-1.0, -1.0),
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// `sign · max(0, sign · d)`: the part of `d` lying on the `sign` side of zero.
#[inline]
pub(crate) fn clip(d: f64, sign: f64) -> f64 {
    sign * (sign * d).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn short_names_round_trip() {
        let names: Vec<&'static str> = Quadrant::iter().map(Into::into).collect();
        assert_eq!(names, vec!["cu", "du", "dl", "cl"]);
        assert_eq!(Quadrant::from_str("dl").unwrap(), Quadrant::DiscordantLower);
    }

    #[test]
    fn indices_are_dense() {
        let idx: Vec<usize> = Quadrant::iter().map(Quadrant::index).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
    }

    #[test]
    fn clipping_splits_a_value() {
        for d in [-2.5, 0.0, 3.0] {
            assert_eq!(clip(d, 1.0) + clip(d, -1.0), d);
        }
        assert_eq!(clip(-2.0, 1.0), 0.0);
        assert_eq!(clip(-2.0, -1.0), -2.0);
    }
}
