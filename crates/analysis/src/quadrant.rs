//! Importance-performance quadrants.

use pulse_core::IpaPoint;

/// Fixed split on both axes of the 1-5 scale.
pub const IPA_MIDPOINT: f64 = 2.5;

/// Importance-performance quadrant. Values on the midpoint count as high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// High importance, high performance
    KeepUp,
    /// High importance, low performance
    ConcentrateHere,
    /// Low importance, low performance
    LowPriority,
    /// Low importance, high performance
    PossibleOverkill,
}

impl Quadrant {
    /// All quadrants, Q1 to Q4.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::KeepUp,
        Quadrant::ConcentrateHere,
        Quadrant::LowPriority,
        Quadrant::PossibleOverkill,
    ];

    /// Quadrant of a point.
    pub fn classify(point: &IpaPoint) -> Self {
        let important = point.importance >= IPA_MIDPOINT;
        let performing = point.performance >= IPA_MIDPOINT;
        match (important, performing) {
            (true, true) => Quadrant::KeepUp,
            (true, false) => Quadrant::ConcentrateHere,
            (false, false) => Quadrant::LowPriority,
            (false, true) => Quadrant::PossibleOverkill,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::KeepUp => "Keep Up",
            Quadrant::ConcentrateHere => "Concentrate Here",
            Quadrant::LowPriority => "Low Priority",
            Quadrant::PossibleOverkill => "Possible Overkill",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Points needing attention first: important but underperforming.
pub fn priority_fixes(points: &[IpaPoint]) -> Vec<&IpaPoint> {
    points
        .iter()
        .filter(|p| Quadrant::classify(p) == Quadrant::ConcentrateHere)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(label: &str, importance: f64, performance: f64) -> IpaPoint {
        IpaPoint { label: label.into(), importance, performance }
    }

    #[test]
    fn test_classification() {
        assert_eq!(Quadrant::classify(&point("a", 4.0, 4.0)), Quadrant::KeepUp);
        assert_eq!(Quadrant::classify(&point("b", 4.0, 1.5)), Quadrant::ConcentrateHere);
        assert_eq!(Quadrant::classify(&point("c", 1.0, 2.0)), Quadrant::LowPriority);
        assert_eq!(Quadrant::classify(&point("d", 2.0, 4.5)), Quadrant::PossibleOverkill);
    }

    #[test]
    fn test_midpoint_counts_as_high() {
        assert_eq!(Quadrant::classify(&point("edge", 2.5, 2.5)), Quadrant::KeepUp);
        assert_eq!(Quadrant::classify(&point("edge", 2.5, 2.49)), Quadrant::ConcentrateHere);
    }

    #[test]
    fn test_priority_fixes() {
        let points = vec![point("Dining", 4.6, 2.1), point("Gym", 3.0, 4.0), point("Parking", 4.0, 1.0)];
        let labels: Vec<_> = priority_fixes(&points).iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Dining", "Parking"]);
    }
}
