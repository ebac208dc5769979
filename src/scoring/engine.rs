use crate::rubric::{
    ClassLevel, RubricRequirement, TierCounts, MAX_DIFFICULTY, PARTIAL_CREDIT_PER_SUBSTITUTION,
};

/// Line used when no redistribution or bonus rule fired.
pub const GENERIC_EXPLANATION: &str = "• Computed from the provided elements.";

/// Line returned when the level code is not one of the known levels.
pub const INVALID_LEVEL_EXPLANATION: &str = "• Invalid level.";

/// Difficulty score and the ordered trail of rules that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyResult {
    pub score: f64,
    pub explanation: Vec<String>,
}

/// Performed counts after surplus easier elements were recounted upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Redistribution {
    adjusted: TierCounts,
    extra_c: u32,
    extra_b: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PartialCredit {
    replacements: u32,
    bonus: f64,
}

/// Compute the difficulty component (0-6) from the elements performed at each tier.
///
/// Surplus C elements count as B, then surplus B elements count as A. Each tier is
/// scored up to its requirement, and spare A elements may stand in for missing B
/// elements at a reduced rate. The result never exceeds [`MAX_DIFFICULTY`].
pub fn calculate_difficulty(
    level: ClassLevel,
    performed_a: u32,
    performed_b: u32,
    performed_c: u32,
) -> DifficultyResult {
    let rules = level.requirement();
    let performed = TierCounts::new(performed_a, performed_b, performed_c);
    let mut explanation = Vec::new();

    let redistribution = redistribute(rules, performed);
    if redistribution.extra_c > 0 {
        explanation.push(format!(
            "• {} surplus C element(s) counted as B.",
            redistribution.extra_c
        ));
    }
    if redistribution.extra_b > 0 {
        explanation.push(format!(
            "• {} surplus B element(s) counted as A.",
            redistribution.extra_b
        ));
    }

    let scored = scored_counts(rules, redistribution.adjusted);
    let base_score = base_score(rules, scored);
    explanation.push(format!(
        "• Base score: ({}A×{}) + ({}B×{}) + ({}C×{}) = {:.2} pts.",
        scored.a, rules.points.a, scored.b, rules.points.b, scored.c, rules.points.c, base_score
    ));

    let credit = partial_credit(rules, performed, scored);
    if let Some(credit) = credit {
        explanation.push(format!(
            "• Bonus: {} missing B element(s) replaced by A for +{:.2} pts.",
            credit.replacements, credit.bonus
        ));
    }

    // Only the base-score line: nothing noteworthy happened.
    if explanation.len() == 1 && credit.is_none() {
        explanation = vec![GENERIC_EXPLANATION.to_string()];
    }

    let bonus = credit.map(|c| c.bonus).unwrap_or(0.0);
    DifficultyResult {
        score: (base_score + bonus).min(MAX_DIFFICULTY),
        explanation,
    }
}

/// Same as [`calculate_difficulty`] for callers holding an unchecked level code.
///
/// An unknown code degrades to a zero score with a single explanatory line.
pub fn calculate_difficulty_for_code(
    level_code: &str,
    performed_a: u32,
    performed_b: u32,
    performed_c: u32,
) -> DifficultyResult {
    match ClassLevel::from_code(level_code) {
        Some(level) => calculate_difficulty(level, performed_a, performed_b, performed_c),
        None => {
            tracing::warn!("difficulty requested for unknown level '{}'", level_code);
            DifficultyResult {
                score: 0.0,
                explanation: vec![INVALID_LEVEL_EXPLANATION.to_string()],
            }
        }
    }
}

/// Cascade surplus elements upward in tier order C -> B -> A.
/// C itself is never incremented, so its adjusted count equals the input.
fn redistribute(rules: &RubricRequirement, performed: TierCounts) -> Redistribution {
    let extra_c = performed.c.saturating_sub(rules.required.c);
    let b = performed.b.saturating_add(extra_c);
    let extra_b = b.saturating_sub(rules.required.b);
    let a = performed.a.saturating_add(extra_b);

    Redistribution {
        adjusted: TierCounts::new(a, b, performed.c),
        extra_c,
        extra_b,
    }
}

fn scored_counts(rules: &RubricRequirement, adjusted: TierCounts) -> TierCounts {
    TierCounts::new(
        adjusted.a.min(rules.required.a),
        adjusted.b.min(rules.required.b),
        adjusted.c.min(rules.required.c),
    )
}

fn base_score(rules: &RubricRequirement, scored: TierCounts) -> f64 {
    scored.a as f64 * rules.points.a + scored.b as f64 * rules.points.b + scored.c as f64 * rules.points.c
}

/// Spare A elements (counted from the original input) can replace missing B elements.
fn partial_credit(
    rules: &RubricRequirement,
    performed: TierCounts,
    scored: TierCounts,
) -> Option<PartialCredit> {
    let missing_b = rules.required.b.saturating_sub(scored.b);
    let remaining_extra_a = performed.a.saturating_sub(rules.required.a);
    if missing_b == 0 || remaining_extra_a == 0 {
        return None;
    }

    let replacements = missing_b.min(remaining_extra_a);
    Some(PartialCredit {
        replacements,
        bonus: replacements as f64 * PARTIAL_CREDIT_PER_SUBSTITUTION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_surplus_c_cascades_through_b() {
        // 1 surplus C becomes a 3rd B, which is itself 1 over the B requirement.
        let result = calculate_difficulty(ClassLevel::Level2, 3, 2, 2);
        assert!(approx(result.score, 6.0), "score was {}", result.score);
        assert_eq!(result.explanation.len(), 3);
        assert_eq!(result.explanation[0], "• 1 surplus C element(s) counted as B.");
        assert_eq!(result.explanation[1], "• 1 surplus B element(s) counted as A.");
        assert_eq!(
            result.explanation[2],
            "• Base score: (3A×0.75) + (2B×1) + (1C×1.75) = 6.00 pts."
        );
        assert!(!result.explanation.iter().any(|l| l.contains("Bonus")));
    }

    #[test]
    fn test_partial_credit_bonus() {
        let result = calculate_difficulty(ClassLevel::Level1, 5, 0, 0);
        assert!(approx(result.score, 3.5), "score was {}", result.score);
        assert_eq!(
            result.explanation,
            vec![
                "• Base score: (3A×1) + (0B×1.5) + (0C×0) = 3.00 pts.".to_string(),
                "• Bonus: 2 missing B element(s) replaced by A for +0.50 pts.".to_string(),
            ]
        );
    }

    #[test]
    fn test_bonus_limited_by_missing_b() {
        // Level3 needs 4 B; 1 missing, 3 spare A -> only 1 substitution.
        let result = calculate_difficulty(ClassLevel::Level3, 5, 3, 1);
        assert!(approx(result.score, 2.0 * 0.5 + 3.0 * 0.75 + 2.0 + 0.25));
        assert!(result.explanation.last().unwrap().starts_with("• Bonus: 1 missing B"));
    }

    #[test]
    fn test_plain_score_collapses_trail() {
        let result = calculate_difficulty(ClassLevel::Level2, 2, 1, 1);
        assert!(approx(result.score, 2.0 * 0.75 + 1.0 + 1.75));
        assert_eq!(result.explanation, vec![GENERIC_EXPLANATION.to_string()]);
    }

    #[test]
    fn test_zero_input_never_empty_trail() {
        for level in ClassLevel::ALL {
            let result = calculate_difficulty(level, 0, 0, 0);
            assert_eq!(result.score, 0.0);
            assert!(!result.explanation.is_empty());
        }
    }

    #[test]
    fn test_score_capped_at_six() {
        let result = calculate_difficulty(ClassLevel::Level1, 40, 40, 40);
        assert!(approx(result.score, 6.0));
        let result = calculate_difficulty(ClassLevel::Level3, u32::MAX, u32::MAX, u32::MAX);
        assert!(result.score <= MAX_DIFFICULTY);
    }

    #[test]
    fn test_score_within_bounds() {
        for level in ClassLevel::ALL {
            for a in 0..8 {
                for b in 0..8 {
                    for c in 0..8 {
                        let score = calculate_difficulty(level, a, b, c).score;
                        assert!((0.0..=MAX_DIFFICULTY).contains(&score));
                    }
                }
            }
        }
    }

    #[test]
    fn test_more_elements_never_lower_score() {
        for level in ClassLevel::ALL {
            for a in 0..7 {
                for b in 0..7 {
                    for c in 0..7 {
                        let score = calculate_difficulty(level, a, b, c).score;
                        assert!(calculate_difficulty(level, a + 1, b, c).score >= score);
                        assert!(calculate_difficulty(level, a, b + 1, c).score >= score);
                        assert!(calculate_difficulty(level, a, b, c + 1).score >= score);
                    }
                }
            }
        }
    }

    #[test]
    fn test_repeat_calls_identical() {
        let first = calculate_difficulty(ClassLevel::Level3, 4, 2, 3);
        let second = calculate_difficulty(ClassLevel::Level3, 4, 2, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_level_code_degrades() {
        let result = calculate_difficulty_for_code("4AC", 3, 2, 1);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.explanation, vec![INVALID_LEVEL_EXPLANATION.to_string()]);

        let known = calculate_difficulty_for_code("2AC", 3, 2, 1);
        assert_eq!(known, calculate_difficulty(ClassLevel::Level2, 3, 2, 1));
    }
}
