use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::rubric::{
    ClassLevel, LinkingQuality, MAX_CO_CN, MAX_DIFFICULTY, MAX_EXECUTION, MAX_SPECIFIC_REQUIREMENTS,
};
use crate::scoring::breakdown::clamp_component;
use crate::scoring::{calculate_difficulty, compose_total_score, linking_quality_score, RoutineInputs};
use crate::store::types::Evaluation;

/// Highest element count accepted per tier from untrusted input.
pub const MAX_ELEMENT_COUNT: f64 = 20.0;

/// Evaluation payload from an untrusted source (bulk import, older exports, CLI).
///
/// Every field is optional and tolerant: numbers may arrive as JSON numbers or
/// numeric strings, and anything unreadable is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvaluation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(rename = "pA", default, deserialize_with = "lenient_number")]
    pub p_a: Option<f64>,
    #[serde(rename = "pB", default, deserialize_with = "lenient_number")]
    pub p_b: Option<f64>,
    #[serde(rename = "pC", default, deserialize_with = "lenient_number")]
    pub p_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub specific_req_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linking_quality_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub execution_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub co_cn_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub co_cm_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub difficulty_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub linking_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_score: Option<f64>,
}

impl RawEvaluation {
    /// Payload for a routine graded in-process. Derived scores are left for the validator.
    pub fn from_routine(level: ClassLevel, inputs: &RoutineInputs) -> Self {
        Self {
            date: None,
            year: Some(level.code().to_string()),
            p_a: Some(inputs.performed_a as f64),
            p_b: Some(inputs.performed_b as f64),
            p_c: Some(inputs.performed_c as f64),
            specific_req_score: Some(inputs.specific_req_score),
            linking_quality_value: Some(inputs.linking_quality.label().to_string()),
            execution_score: Some(inputs.execution_score),
            co_cn_score: Some(inputs.co_cn_score),
            co_cm_score: Some(inputs.co_cm_score),
            difficulty_score: None,
            linking_score: None,
            total_score: None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn clamp_count(value: Option<f64>) -> u32 {
    clamp_component(value.unwrap_or(0.0), MAX_ELEMENT_COUNT).floor() as u32
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates taken at midnight UTC.
fn parse_date(value: Option<&str>) -> DateTime<Utc> {
    let Some(s) = value.map(str::trim) else {
        return Utc::now();
    };
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return d.with_timezone(&Utc);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Normalize an untrusted evaluation payload. Never rejects.
///
/// Numeric fields are clamped to their ranges, an unknown level becomes 2AC, an
/// unknown linking label becomes "average" and a missing date becomes now.
/// Difficulty and linking scores are kept (clamped) when supplied and derived
/// from the rubric otherwise; the total is always recomputed from the six
/// clamped components.
pub fn validate_evaluation_input(raw: &RawEvaluation) -> Evaluation {
    let level = raw
        .year
        .as_deref()
        .and_then(ClassLevel::from_code)
        .unwrap_or_default();
    let linking_quality = raw
        .linking_quality_value
        .as_deref()
        .and_then(LinkingQuality::from_label)
        .unwrap_or_default();

    let performed_a = clamp_count(raw.p_a);
    let performed_b = clamp_count(raw.p_b);
    let performed_c = clamp_count(raw.p_c);

    let specific_req_score = clamp_component(raw.specific_req_score.unwrap_or(0.0), MAX_SPECIFIC_REQUIREMENTS);
    let execution_score = clamp_component(raw.execution_score.unwrap_or(0.0), MAX_EXECUTION);
    let co_cn_score = clamp_component(raw.co_cn_score.unwrap_or(0.0), MAX_CO_CN);
    let co_cm_score = clamp_component(raw.co_cm_score.unwrap_or(0.0), level.max_co_cm());

    let difficulty_score = match raw.difficulty_score {
        Some(score) => clamp_component(score, MAX_DIFFICULTY),
        None => calculate_difficulty(level, performed_a, performed_b, performed_c).score,
    };
    let linking_score = match raw.linking_score {
        Some(score) => clamp_component(score, level.linking_table().max()),
        None => linking_quality_score(level, linking_quality),
    };

    let total_score = compose_total_score(
        difficulty_score,
        specific_req_score,
        linking_score,
        execution_score,
        co_cn_score,
        co_cm_score,
    );
    if let Some(claimed) = raw.total_score {
        if (claimed - total_score).abs() > 0.005 {
            tracing::warn!(
                "evaluation total {:.2} does not match its components, stored as {:.2}",
                claimed,
                total_score
            );
        }
    }

    Evaluation {
        date: parse_date(raw.date.as_deref()),
        level,
        performed_a,
        performed_b,
        performed_c,
        specific_req_score,
        linking_quality,
        execution_score,
        co_cn_score,
        co_cm_score,
        difficulty_score,
        linking_score,
        total_score,
    }
}

/// Normalize a JSON evaluation payload. Returns None only when it is not an object.
pub fn validate_evaluation_json(value: &Value) -> Option<Evaluation> {
    if !value.is_object() {
        return None;
    }
    let raw: RawEvaluation = serde_json::from_value(value.clone()).ok()?;
    Some(validate_evaluation_input(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_payload_gets_defaults() {
        let before = Utc::now();
        let eval = validate_evaluation_input(&RawEvaluation::default());
        assert_eq!(eval.level, ClassLevel::Level2);
        assert_eq!(eval.linking_quality, LinkingQuality::Average);
        assert_eq!(eval.performed_a, 0);
        assert!(eval.date >= before);
        // Only the average linking score contributes.
        assert!(approx(eval.linking_score, 1.5));
        assert!(approx(eval.total_score, 1.5));
    }

    #[test]
    fn test_fields_clamped_to_ranges() {
        let raw = RawEvaluation {
            year: Some("1AC".into()),
            p_a: Some(55.0),
            p_b: Some(-3.0),
            p_c: Some(2.7),
            specific_req_score: Some(2.0),
            execution_score: Some(5.0),
            co_cn_score: Some(-1.0),
            co_cm_score: Some(5.0),
            difficulty_score: Some(9.0),
            linking_score: Some(10.0),
            ..RawEvaluation::default()
        };
        let eval = validate_evaluation_input(&raw);
        assert_eq!(eval.performed_a, 20);
        assert_eq!(eval.performed_b, 0);
        assert_eq!(eval.performed_c, 2);
        assert!(approx(eval.specific_req_score, 1.5));
        assert!(approx(eval.execution_score, 2.0));
        assert!(approx(eval.co_cn_score, 0.0));
        assert!(approx(eval.co_cm_score, 3.0));
        assert!(approx(eval.difficulty_score, 6.0));
        assert!(approx(eval.linking_score, 4.5));
        assert!(approx(eval.total_score, 6.0 + 1.5 + 4.5 + 2.0 + 0.0 + 3.0));
    }

    #[test]
    fn test_total_recomputed_from_components() {
        let raw = RawEvaluation {
            year: Some("2AC".into()),
            p_a: Some(3.0),
            p_b: Some(2.0),
            p_c: Some(1.0),
            linking_quality_value: Some("good".into()),
            execution_score: Some(1.0),
            total_score: Some(19.0),
            ..RawEvaluation::default()
        };
        let eval = validate_evaluation_input(&raw);
        assert!(approx(eval.difficulty_score, 6.0));
        assert!(approx(eval.linking_score, 2.5));
        assert!(approx(eval.total_score, 9.5));
    }

    #[test]
    fn test_json_strings_and_garbage() {
        let value = json!({
            "date": "2024-02-10T08:30:00Z",
            "year": "3AC",
            "pA": "2",
            "pB": "four",
            "pC": null,
            "linkingQualityValue": "superb",
            "coCmScore": "4.5"
        });
        let eval = validate_evaluation_json(&value).unwrap();
        assert_eq!(eval.level, ClassLevel::Level3);
        assert_eq!(eval.performed_a, 2);
        assert_eq!(eval.performed_b, 0);
        assert_eq!(eval.performed_c, 0);
        assert_eq!(eval.linking_quality, LinkingQuality::Average);
        assert!(approx(eval.co_cm_score, 4.5));
        assert_eq!(eval.date.to_rfc3339(), "2024-02-10T08:30:00+00:00");
    }

    #[test]
    fn test_bare_date_accepted() {
        let raw = RawEvaluation {
            date: Some("2024-05-20".into()),
            ..RawEvaluation::default()
        };
        let eval = validate_evaluation_input(&raw);
        assert_eq!(eval.date.to_rfc3339(), "2024-05-20T00:00:00+00:00");
    }

    #[test]
    fn test_json_non_object_rejected() {
        assert!(validate_evaluation_json(&json!(42)).is_none());
        assert!(validate_evaluation_json(&json!([1, 2])).is_none());
        assert!(validate_evaluation_json(&Value::Null).is_none());
    }

    #[test]
    fn test_invalid_level_defaults_to_level2() {
        let raw = RawEvaluation {
            year: Some("5AC".into()),
            co_cm_score: Some(5.0),
            ..RawEvaluation::default()
        };
        let eval = validate_evaluation_input(&raw);
        assert_eq!(eval.level, ClassLevel::Level2);
        assert!(approx(eval.co_cm_score, 4.0));
    }

    #[test]
    fn test_from_routine_matches_breakdown() {
        let inputs = RoutineInputs {
            performed_a: 5,
            performed_b: 0,
            performed_c: 0,
            specific_req_score: 1.0,
            linking_quality: LinkingQuality::Excellent,
            execution_score: 1.5,
            co_cn_score: 2.5,
            co_cm_score: 3.0,
        };
        let breakdown = crate::scoring::score_evaluation(ClassLevel::Level1, &inputs);
        let eval = validate_evaluation_input(&RawEvaluation::from_routine(ClassLevel::Level1, &inputs));
        assert!(approx(eval.total_score, breakdown.total));
        assert!(approx(eval.difficulty_score, 3.5));
    }
}
