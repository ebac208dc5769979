pub mod breakdown;
pub mod engine;
pub mod linking;

pub use breakdown::{compose_total_score, score_evaluation, ComponentScore, RoutineInputs, ScoreBreakdown};
pub use engine::{calculate_difficulty, calculate_difficulty_for_code, DifficultyResult};
pub use linking::{linking_quality_score, linking_quality_score_for_code, max_linking_score};
