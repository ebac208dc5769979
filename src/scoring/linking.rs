use crate::rubric::{ClassLevel, LinkingQuality};

/// Points for a linking quality rating at the given level.
pub fn linking_quality_score(level: ClassLevel, quality: LinkingQuality) -> f64 {
    level.linking_table().points(quality)
}

/// Table lookup by raw level code and label. Unknown level or label scores 0.
pub fn linking_quality_score_for_code(level_code: &str, label: &str) -> f64 {
    match (ClassLevel::from_code(level_code), LinkingQuality::from_label(label)) {
        (Some(level), Some(quality)) => linking_quality_score(level, quality),
        _ => 0.0,
    }
}

/// Best linking score attainable at the level (the "excellent" entry).
pub fn max_linking_score(level: ClassLevel) -> f64 {
    level.linking_table().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_matches_table() {
        assert_eq!(linking_quality_score(ClassLevel::Level1, LinkingQuality::Excellent), 4.5);
        assert_eq!(linking_quality_score(ClassLevel::Level2, LinkingQuality::Average), 1.5);
        assert_eq!(linking_quality_score(ClassLevel::Level3, LinkingQuality::Good), 1.75);
    }

    #[test]
    fn test_unknown_inputs_score_zero() {
        assert_eq!(linking_quality_score_for_code("9AC", "excellent"), 0.0);
        assert_eq!(linking_quality_score_for_code("2AC", "superb"), 0.0);
        assert_eq!(linking_quality_score_for_code("2AC", "good"), 2.5);
    }

    #[test]
    fn test_ordering_per_level() {
        for level in ClassLevel::ALL {
            let scores: Vec<f64> = LinkingQuality::ALL
                .iter()
                .map(|q| linking_quality_score(level, *q))
                .collect();
            for pair in scores.windows(2) {
                assert!(pair[0] >= pair[1]);
            }
            assert_eq!(max_linking_score(level), scores[0]);
        }
    }
}
