use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest difficulty score any routine can earn.
pub const MAX_DIFFICULTY: f64 = 6.0;
pub const MAX_SPECIFIC_REQUIREMENTS: f64 = 1.5;
pub const MAX_EXECUTION: f64 = 2.0;
pub const MAX_CO_CN: f64 = 3.0;
pub const MAX_TOTAL: f64 = 20.0;

/// Points awarded for each spare A element standing in for a missing B element.
pub const PARTIAL_CREDIT_PER_SUBSTITUTION: f64 = 0.25;

/// School-year tier of a class. Serialized with the codes teachers use ("1AC", "2AC", "3AC").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassLevel {
    #[serde(rename = "1AC")]
    Level1,
    #[serde(rename = "2AC")]
    Level2,
    #[serde(rename = "3AC")]
    Level3,
}

impl ClassLevel {
    pub const ALL: [ClassLevel; 3] = [ClassLevel::Level1, ClassLevel::Level2, ClassLevel::Level3];

    /// Parse a level code. Returns None for anything but the three known codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1AC" => Some(ClassLevel::Level1),
            "2AC" => Some(ClassLevel::Level2),
            "3AC" => Some(ClassLevel::Level3),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ClassLevel::Level1 => "1AC",
            ClassLevel::Level2 => "2AC",
            ClassLevel::Level3 => "3AC",
        }
    }

    pub fn requirement(&self) -> &'static RubricRequirement {
        match self {
            ClassLevel::Level1 => &LEVEL1_REQUIREMENT,
            ClassLevel::Level2 => &LEVEL2_REQUIREMENT,
            ClassLevel::Level3 => &LEVEL3_REQUIREMENT,
        }
    }

    pub fn linking_table(&self) -> &'static LinkingQualityTable {
        match self {
            ClassLevel::Level1 => &LEVEL1_LINKING,
            ClassLevel::Level2 => &LEVEL2_LINKING,
            ClassLevel::Level3 => &LEVEL3_LINKING,
        }
    }

    /// Ceiling of the conduct (CO CM) component, which grows with the level.
    pub fn max_co_cm(&self) -> f64 {
        match self {
            ClassLevel::Level1 => 3.0,
            ClassLevel::Level2 => 4.0,
            ClassLevel::Level3 => 5.0,
        }
    }
}

impl Default for ClassLevel {
    fn default() -> Self {
        ClassLevel::Level2
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ClassLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassLevel::from_code(s).ok_or_else(|| format!("unknown class level '{}' (expected 1AC, 2AC or 3AC)", s))
    }
}

/// Count of elements per tier, used both for requirements and performed elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierCounts {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl TierCounts {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPoints {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Required element counts for a level and the value of each satisfied element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubricRequirement {
    pub required: TierCounts,
    pub points: TierPoints,
}

/// Qualitative rating of the transitions between elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkingQuality {
    Excellent,
    Good,
    Average,
    #[serde(alias = "poor")]
    Weak,
}

impl LinkingQuality {
    /// Ordered from best to worst.
    pub const ALL: [LinkingQuality; 4] = [
        LinkingQuality::Excellent,
        LinkingQuality::Good,
        LinkingQuality::Average,
        LinkingQuality::Weak,
    ];

    /// Parse a quality label. "poor" is still found in older records and means weak.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "excellent" => Some(LinkingQuality::Excellent),
            "good" => Some(LinkingQuality::Good),
            "average" => Some(LinkingQuality::Average),
            "weak" | "poor" => Some(LinkingQuality::Weak),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LinkingQuality::Excellent => "excellent",
            LinkingQuality::Good => "good",
            LinkingQuality::Average => "average",
            LinkingQuality::Weak => "weak",
        }
    }
}

impl Default for LinkingQuality {
    fn default() -> Self {
        LinkingQuality::Average
    }
}

impl fmt::Display for LinkingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LinkingQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkingQuality::from_label(s)
            .ok_or_else(|| format!("unknown linking quality '{}' (expected excellent, good, average or weak)", s))
    }
}

/// Points per linking quality label. Monotonically decreasing from excellent to weak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkingQualityTable {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub weak: f64,
}

impl LinkingQualityTable {
    pub fn points(&self, quality: LinkingQuality) -> f64 {
        match quality {
            LinkingQuality::Excellent => self.excellent,
            LinkingQuality::Good => self.good,
            LinkingQuality::Average => self.average,
            LinkingQuality::Weak => self.weak,
        }
    }

    /// Best attainable linking score for the level.
    pub fn max(&self) -> f64 {
        self.excellent
    }
}

static LEVEL1_REQUIREMENT: RubricRequirement = RubricRequirement {
    required: TierCounts::new(3, 2, 0),
    points: TierPoints { a: 1.0, b: 1.5, c: 0.0 },
};

static LEVEL2_REQUIREMENT: RubricRequirement = RubricRequirement {
    required: TierCounts::new(3, 2, 1),
    points: TierPoints { a: 0.75, b: 1.0, c: 1.75 },
};

static LEVEL3_REQUIREMENT: RubricRequirement = RubricRequirement {
    required: TierCounts::new(2, 4, 1),
    points: TierPoints { a: 0.5, b: 0.75, c: 2.0 },
};

static LEVEL1_LINKING: LinkingQualityTable = LinkingQualityTable {
    excellent: 4.5,
    good: 3.5,
    average: 2.5,
    weak: 1.0,
};

static LEVEL2_LINKING: LinkingQualityTable = LinkingQualityTable {
    excellent: 3.5,
    good: 2.5,
    average: 1.5,
    weak: 0.5,
};

static LEVEL3_LINKING: LinkingQualityTable = LinkingQualityTable {
    excellent: 2.5,
    good: 1.75,
    average: 1.0,
    weak: 0.5,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes_roundtrip() {
        for level in ClassLevel::ALL {
            assert_eq!(ClassLevel::from_code(level.code()), Some(level));
        }
        assert_eq!(ClassLevel::from_code("4AC"), None);
        assert_eq!(ClassLevel::from_code(""), None);
    }

    #[test]
    fn test_level_serializes_as_code() {
        let json = serde_json::to_string(&ClassLevel::Level3).unwrap();
        assert_eq!(json, "\"3AC\"");
    }

    #[test]
    fn test_linking_tables_decrease() {
        for level in ClassLevel::ALL {
            let table = level.linking_table();
            let points: Vec<f64> = LinkingQuality::ALL.iter().map(|q| table.points(*q)).collect();
            assert!(points.windows(2).all(|w| w[0] >= w[1]), "{:?}: {:?}", level, points);
            assert_eq!(table.max(), table.excellent);
        }
    }

    #[test]
    fn test_component_maxima_sum_to_twenty() {
        for level in ClassLevel::ALL {
            let sum = MAX_DIFFICULTY
                + MAX_SPECIFIC_REQUIREMENTS
                + level.linking_table().max()
                + MAX_EXECUTION
                + MAX_CO_CN
                + level.max_co_cm();
            assert!((sum - MAX_TOTAL).abs() < 1e-9, "{:?} sums to {}", level, sum);
        }
    }

    #[test]
    fn test_poor_is_weak() {
        assert_eq!(LinkingQuality::from_label("poor"), Some(LinkingQuality::Weak));
        let parsed: LinkingQuality = serde_json::from_str("\"poor\"").unwrap();
        assert_eq!(parsed, LinkingQuality::Weak);
    }
}
