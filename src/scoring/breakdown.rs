use super::engine::calculate_difficulty;
use super::linking::{linking_quality_score, max_linking_score};
use crate::rubric::{
    ClassLevel, LinkingQuality, MAX_CO_CN, MAX_DIFFICULTY, MAX_EXECUTION, MAX_SPECIFIC_REQUIREMENTS,
};

/// Raw rubric inputs for one routine, as entered by the teacher.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutineInputs {
    pub performed_a: u32,
    pub performed_b: u32,
    pub performed_c: u32,
    pub specific_req_score: f64,
    pub linking_quality: LinkingQuality,
    pub execution_score: f64,
    pub co_cn_score: f64,
    pub co_cm_score: f64,
}

/// One of the six graded components.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScore {
    pub label: &'static str,
    pub value: f64,
    pub max: f64,
    /// Extra lines shown under the component (the difficulty trail).
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub level: ClassLevel,
    pub components: Vec<ComponentScore>,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn difficulty_score(&self) -> f64 {
        self.components[0].value
    }

    pub fn linking_score(&self) -> f64 {
        self.components[2].value
    }
}

/// Sum of the six components. Callers clamp each addend beforehand.
pub fn compose_total_score(
    difficulty_score: f64,
    specific_req_score: f64,
    linking_score: f64,
    execution_score: f64,
    co_cn_score: f64,
    co_cm_score: f64,
) -> f64 {
    difficulty_score + specific_req_score + linking_score + execution_score + co_cn_score + co_cm_score
}

/// Clamp to `[0, max]`, treating NaN as 0.
pub(crate) fn clamp_component(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

/// Score a routine: derive difficulty and linking, clamp the hand-entered
/// components to their ranges and compose the 0-20 total.
pub fn score_evaluation(level: ClassLevel, inputs: &RoutineInputs) -> ScoreBreakdown {
    let difficulty = calculate_difficulty(
        level,
        inputs.performed_a,
        inputs.performed_b,
        inputs.performed_c,
    );
    let linking = linking_quality_score(level, inputs.linking_quality);
    let specific = clamp_component(inputs.specific_req_score, MAX_SPECIFIC_REQUIREMENTS);
    let execution = clamp_component(inputs.execution_score, MAX_EXECUTION);
    let co_cn = clamp_component(inputs.co_cn_score, MAX_CO_CN);
    let co_cm = clamp_component(inputs.co_cm_score, level.max_co_cm());

    let total = compose_total_score(difficulty.score, specific, linking, execution, co_cn, co_cm);

    let components = vec![
        ComponentScore {
            label: "1. Difficulty",
            value: difficulty.score,
            max: MAX_DIFFICULTY,
            notes: difficulty.explanation,
        },
        ComponentScore {
            label: "2. Specific requirements",
            value: specific,
            max: MAX_SPECIFIC_REQUIREMENTS,
            notes: Vec::new(),
        },
        ComponentScore {
            label: "3. Linking quality",
            value: linking,
            max: max_linking_score(level),
            notes: Vec::new(),
        },
        ComponentScore {
            label: "4. Execution",
            value: execution,
            max: MAX_EXECUTION,
            notes: Vec::new(),
        },
        ComponentScore {
            label: "5. Knowledge (CO CN)",
            value: co_cn,
            max: MAX_CO_CN,
            notes: Vec::new(),
        },
        ComponentScore {
            label: "6. Conduct (CO CM)",
            value: co_cm,
            max: level.max_co_cm(),
            notes: Vec::new(),
        },
    ];

    ScoreBreakdown {
        level,
        components,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::MAX_TOTAL;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_compose_is_plain_sum() {
        assert!(approx(compose_total_score(6.0, 1.5, 3.5, 2.0, 3.0, 4.0), 20.0));
        // No clamping at this layer.
        assert!(approx(compose_total_score(10.0, 0.0, 0.0, 0.0, 0.0, 0.0), 10.0));
    }

    #[test]
    fn test_perfect_routine_scores_twenty() {
        for level in ClassLevel::ALL {
            let inputs = RoutineInputs {
                performed_a: 6,
                performed_b: 6,
                performed_c: 6,
                specific_req_score: 1.5,
                linking_quality: LinkingQuality::Excellent,
                execution_score: 2.0,
                co_cn_score: 3.0,
                co_cm_score: level.max_co_cm(),
            };
            let breakdown = score_evaluation(level, &inputs);
            assert!(approx(breakdown.total, MAX_TOTAL), "{:?}: {}", level, breakdown.total);
        }
    }

    #[test]
    fn test_out_of_range_inputs_clamped() {
        let inputs = RoutineInputs {
            specific_req_score: 9.0,
            execution_score: -1.0,
            co_cn_score: f64::NAN,
            co_cm_score: 10.0,
            linking_quality: LinkingQuality::Weak,
            ..RoutineInputs::default()
        };
        let breakdown = score_evaluation(ClassLevel::Level1, &inputs);
        let values: Vec<f64> = breakdown.components.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![0.0, 1.5, 1.0, 0.0, 0.0, 3.0]);
        assert!(approx(breakdown.total, 5.5));
    }

    #[test]
    fn test_total_equals_component_sum() {
        let inputs = RoutineInputs {
            performed_a: 3,
            performed_b: 2,
            performed_c: 2,
            specific_req_score: 1.0,
            linking_quality: LinkingQuality::Good,
            execution_score: 1.5,
            co_cn_score: 2.0,
            co_cm_score: 3.0,
        };
        let breakdown = score_evaluation(ClassLevel::Level2, &inputs);
        let sum: f64 = breakdown.components.iter().map(|c| c.value).sum();
        assert!(approx(breakdown.total, sum));
        assert!(approx(breakdown.difficulty_score(), 6.0));
        assert!(approx(breakdown.linking_score(), 2.5));
        assert_eq!(breakdown.components[0].notes.len(), 3);
    }
}
