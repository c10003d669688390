//! Pure scoring rules: answer correctness, streak multipliers, accuracy, and
//! qualitative performance ratings.
//!
//! Everything in this module is deterministic given its inputs so reveal
//! computation and leaderboard validation agree byte-for-byte across replays.

use crate::{error::ServiceError, state::session::Question};

/// Points awarded per remaining second on a correct answer.
pub const POINTS_PER_REMAINING_SECOND: i64 = 10;
/// Flat bonus awarded for any correct answer, however slow.
pub const CORRECT_ANSWER_BONUS: i64 = 100;

/// Result of scoring one player's answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Whether the answer matched the designated correct option.
    pub correct: bool,
    /// Points awarded for this question.
    pub delta: i64,
    /// Multiplier to apply to the next question.
    pub multiplier: u32,
    /// Streak length after this question.
    pub streak: u32,
}

/// Case- and whitespace-normalize an answer for comparison.
pub fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Whether an answer designates the question's correct option, either as the
/// option index or as the option text.
pub fn is_correct(question: &Question, answer: &str) -> bool {
    let normalized = normalize(answer);

    if let Ok(index) = normalized.parse::<usize>() {
        return index == question.correct_index;
    }

    question
        .options
        .get(question.correct_index)
        .is_some_and(|option| normalize(option) == normalized)
}

/// Score one answer given the player's multiplier and streak entering the
/// question.
///
/// A correct answer earns `(remaining seconds * 10 + 100) * multiplier` and
/// grows the multiplier by one up to `cap`. An incorrect or missing answer
/// earns nothing and resets the multiplier to 1 and the streak to 0.
pub fn score_answer(
    correct: bool,
    elapsed_secs: u64,
    time_limit_secs: u64,
    multiplier: u32,
    streak: u32,
    cap: u32,
) -> AnswerOutcome {
    if !correct {
        return AnswerOutcome {
            correct: false,
            delta: 0,
            multiplier: 1,
            streak: 0,
        };
    }

    let remaining = time_limit_secs.saturating_sub(elapsed_secs) as i64;
    let base_points = remaining * POINTS_PER_REMAINING_SECOND + CORRECT_ANSWER_BONUS;

    AnswerOutcome {
        correct: true,
        delta: base_points * i64::from(multiplier),
        multiplier: (multiplier + 1).min(cap),
        streak: streak + 1,
    }
}

/// Session accuracy in percent, rounded to one decimal and clamped to [0, 100].
pub fn accuracy(correct_answers: u32, total_questions: u32) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let raw = f64::from(correct_answers) / f64::from(total_questions) * 100.0;
    round_one_decimal(raw.clamp(0.0, 100.0))
}

/// Completion rate in percent for eligibility checks.
///
/// Rejects impossible inputs instead of clamping: non-positive totals and
/// completed counts exceeding the total are caller bugs.
pub fn completion_rate(total_questions: u32, completed_questions: u32) -> Result<f64, ServiceError> {
    if total_questions == 0 {
        return Err(ServiceError::InvalidInput(
            "total questions must be positive".into(),
        ));
    }
    if completed_questions > total_questions {
        return Err(ServiceError::InvalidInput(
            "completed questions cannot exceed total questions".into(),
        ));
    }

    Ok(round_one_decimal(
        f64::from(completed_questions) / f64::from(total_questions) * 100.0,
    ))
}

/// Qualitative bucket describing a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceRating {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceRating {
    /// Wire name of the rating.
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceRating::Excellent => "Excellent",
            PerformanceRating::Good => "Good",
            PerformanceRating::Average => "Average",
            PerformanceRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Derive a performance rating from fixed thresholds.
///
/// Buckets: Excellent requires at least 90% accuracy and a multiplier run of
/// 3 or better; Good requires 70% accuracy; Average requires 40%; everything
/// below is Needs Improvement. Out-of-range inputs are rejected rather than
/// clamped.
pub fn performance_rating(
    score: i64,
    accuracy: f64,
    max_multiplier: u32,
    cap: u32,
) -> Result<PerformanceRating, ServiceError> {
    if score < 0 {
        return Err(ServiceError::InvalidInput("score must not be negative".into()));
    }
    if !(0.0..=100.0).contains(&accuracy) {
        return Err(ServiceError::InvalidInput(
            "accuracy must be between 0 and 100".into(),
        ));
    }
    if max_multiplier < 1 || max_multiplier > cap {
        return Err(ServiceError::InvalidInput(format!(
            "max multiplier must be between 1 and {cap}"
        )));
    }

    let rating = if accuracy >= 90.0 && max_multiplier >= 3 {
        PerformanceRating::Excellent
    } else if accuracy >= 70.0 {
        PerformanceRating::Good
    } else if accuracy >= 40.0 {
        PerformanceRating::Average
    } else {
        PerformanceRating::NeedsImprovement
    };

    Ok(rating)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const CAP: u32 = 4;

    fn question() -> Question {
        Question {
            id: Uuid::new_v4(),
            question_set_id: Uuid::new_v4(),
            prompt: "Capital of France?".into(),
            options: vec!["Berlin".into(), "Paris".into(), "Madrid".into()],
            correct_index: 1,
        }
    }

    #[test]
    fn answers_match_by_index_or_text() {
        let q = question();
        assert!(is_correct(&q, "1"));
        assert!(is_correct(&q, "Paris"));
        assert!(is_correct(&q, "  paris  "));
        assert!(!is_correct(&q, "0"));
        assert!(!is_correct(&q, "Berlin"));
        assert!(!is_correct(&q, ""));
    }

    #[test]
    fn correct_answer_rewards_remaining_time() {
        let outcome = score_answer(true, 20, 60, 1, 0, CAP);
        assert_eq!(outcome.delta, (40 * POINTS_PER_REMAINING_SECOND + CORRECT_ANSWER_BONUS));
        assert_eq!(outcome.multiplier, 2);
        assert_eq!(outcome.streak, 1);
    }

    #[test]
    fn slow_correct_answer_still_earns_the_floor_bonus() {
        let outcome = score_answer(true, 60, 60, 1, 0, CAP);
        assert_eq!(outcome.delta, CORRECT_ANSWER_BONUS);
        // Elapsed past the limit saturates instead of going negative.
        let outcome = score_answer(true, 90, 60, 1, 0, CAP);
        assert_eq!(outcome.delta, CORRECT_ANSWER_BONUS);
    }

    #[test]
    fn incorrect_answer_scores_zero_and_resets() {
        let outcome = score_answer(false, 5, 60, 3, 2, CAP);
        assert_eq!(outcome.delta, 0);
        assert_eq!(outcome.multiplier, 1);
        assert_eq!(outcome.streak, 0);
    }

    #[test]
    fn multiplier_is_monotonic_on_a_streak_and_capped() {
        let mut multiplier = 1;
        let mut streak = 0;
        let mut seen = Vec::new();
        for _ in 0..6 {
            let outcome = score_answer(true, 10, 60, multiplier, streak, CAP);
            assert!(outcome.multiplier >= multiplier);
            multiplier = outcome.multiplier;
            streak = outcome.streak;
            seen.push(outcome.multiplier);
        }
        assert_eq!(seen, vec![2, 3, 4, 4, 4, 4]);

        // A single miss resets the run.
        let outcome = score_answer(false, 10, 60, multiplier, streak, CAP);
        assert_eq!(outcome.multiplier, 1);
        assert_eq!(outcome.streak, 0);
    }

    #[test]
    fn delta_uses_the_multiplier_entering_the_question() {
        let outcome = score_answer(true, 0, 60, 3, 2, CAP);
        assert_eq!(outcome.delta, (60 * POINTS_PER_REMAINING_SECOND + CORRECT_ANSWER_BONUS) * 3);
    }

    #[test]
    fn accuracy_is_rounded_and_clamped() {
        assert_eq!(accuracy(10, 10), 100.0);
        assert_eq!(accuracy(5, 10), 50.0);
        assert_eq!(accuracy(1, 3), 33.3);
        assert_eq!(accuracy(2, 3), 66.7);
        assert_eq!(accuracy(0, 10), 0.0);
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn completion_rate_handles_whole_and_partial_runs() {
        assert_eq!(completion_rate(10, 10).unwrap(), 100.0);
        assert_eq!(completion_rate(10, 5).unwrap(), 50.0);
        assert!(completion_rate(0, 0).is_err());
        assert!(completion_rate(10, 11).is_err());
    }

    #[test]
    fn rating_buckets() {
        assert_eq!(
            performance_rating(5000, 95.0, 4, CAP).unwrap(),
            PerformanceRating::Excellent
        );
        // High accuracy without a multiplier run is merely good.
        assert_eq!(
            performance_rating(5000, 95.0, 2, CAP).unwrap(),
            PerformanceRating::Good
        );
        assert_eq!(
            performance_rating(1000, 75.0, 1, CAP).unwrap(),
            PerformanceRating::Good
        );
        assert_eq!(
            performance_rating(500, 50.0, 1, CAP).unwrap(),
            PerformanceRating::Average
        );
        assert_eq!(
            performance_rating(0, 10.0, 1, CAP).unwrap(),
            PerformanceRating::NeedsImprovement
        );
    }

    #[test]
    fn rating_rejects_out_of_range_inputs() {
        assert!(performance_rating(-1, 50.0, 1, CAP).is_err());
        assert!(performance_rating(100, 100.1, 1, CAP).is_err());
        assert!(performance_rating(100, -0.1, 1, CAP).is_err());
        assert!(performance_rating(100, 50.0, 0, CAP).is_err());
        assert!(performance_rating(100, 50.0, CAP + 1, CAP).is_err());
    }
}
