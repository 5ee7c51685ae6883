use serde::{Deserialize, Serialize};

const CORRECT_BASE: f64 = 100.0;
const WRONG_BASE: f64 = 50.0;
const STREAK_STEP: f64 = 0.15;

/// Running tally for one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicScore {
    pub correct_count: u64,
    pub total_count: u64,
    pub first_attempt_correct_count: u64,
}

impl TopicScore {
    pub fn accuracy(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_count as f64
        }
    }
}

/// Per-topic scores in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAggregate {
    entries: Vec<(String, TopicScore)>,
}

impl TopicAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, topic: &str) -> Option<&TopicScore> {
        self.entries.iter().find(|(t, _)| t == topic).map(|(_, s)| s)
    }

    fn entry(&mut self, topic: &str) -> &mut TopicScore {
        let idx = match self.entries.iter().position(|(t, _)| t == topic) {
            Some(idx) => idx,
            None => {
                self.entries.push((topic.to_string(), TopicScore::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicScore)> {
        self.entries.iter().map(|(t, s)| (t.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_correct(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s.correct_count).sum()
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|(_, s)| s.total_count).sum()
    }

    /// Correct answers over all attempts, weighted by each topic's volume.
    pub fn weighted_correctness(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            self.total_correct() as f64 / total as f64
        }
    }
}

impl<S: Into<String>> FromIterator<(S, TopicScore)> for TopicAggregate {
    fn from_iter<I: IntoIterator<Item = (S, TopicScore)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(t, s)| (t.into(), s)).collect(),
        }
    }
}

/// Point change produced by one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    /// Actual change applied to the running total.
    pub points_delta: i64,
    /// Text for the floating points indicator; `None` when nothing is shown.
    pub display_text: Option<String>,
}

/// Stateful points/streak calculator for one session.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    total_points: u64,
    current_streak: u32,
    current_lose_streak: u32,
    topics: TopicAggregate,
}

pub fn streak_award(streak: u32) -> u64 {
    (CORRECT_BASE + CORRECT_BASE * streak as f64 * STREAK_STEP).round() as u64
}

pub fn lose_streak_penalty(lose_streak: u32) -> u64 {
    (WRONG_BASE + WRONG_BASE * lose_streak as f64 * STREAK_STEP).round() as u64
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_answer(
        &mut self,
        topic: &str,
        is_correct: bool,
        is_first_attempt: bool,
    ) -> AnswerFeedback {
        let score = self.topics.entry(topic);
        score.total_count += 1;

        if is_correct {
            score.correct_count += 1;

            if !is_first_attempt {
                // A recovered answer breaks both streaks and earns nothing.
                self.current_streak = 0;
                self.current_lose_streak = 0;
                return AnswerFeedback {
                    points_delta: 0,
                    display_text: None,
                };
            }

            score.first_attempt_correct_count += 1;
            self.current_streak += 1;
            self.current_lose_streak = 0;

            let pts = streak_award(self.current_streak);
            self.total_points += pts;
            AnswerFeedback {
                points_delta: pts as i64,
                display_text: Some(format!("+{pts} pts")),
            }
        } else {
            self.current_streak = 0;
            self.current_lose_streak += 1;

            let lost = lose_streak_penalty(self.current_lose_streak);
            let prev = self.total_points;
            self.total_points = prev.saturating_sub(lost);
            let shown = if prev == 0 && self.total_points == 0 {
                0
            } else {
                lost
            };
            AnswerFeedback {
                points_delta: self.total_points as i64 - prev as i64,
                display_text: Some(format!("-{shown} pts")),
            }
        }
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn current_lose_streak(&self) -> u32 {
        self.current_lose_streak
    }

    pub fn topics(&self) -> &TopicAggregate {
        &self.topics
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn first_correct_awards_115() {
        let mut engine = ScoringEngine::new();
        let fb = engine.record_answer("Math", true, true);

        assert_eq!(fb.points_delta, 115);
        assert_eq!(fb.display_text.as_deref(), Some("+115 pts"));
        assert_eq!(engine.total_points(), 115);
        assert_eq!(engine.current_streak(), 1);
        assert_eq!(engine.current_lose_streak(), 0);

        let t = engine.topics().get("Math").unwrap();
        assert_eq!(t.correct_count, 1);
        assert_eq!(t.total_count, 1);
        assert_eq!(t.first_attempt_correct_count, 1);
    }

    #[test]
    fn streak_run_matches_closed_form() {
        for k in 1..=12u32 {
            let mut engine = ScoringEngine::new();
            for _ in 0..k {
                engine.record_answer("T", true, true);
            }
            let expected: u64 = (1..=k)
                .map(|i| (100.0 + 100.0 * i as f64 * 0.15).round() as u64)
                .sum();
            assert_eq!(engine.total_points(), expected, "run of {k}");
        }
    }

    #[test]
    fn correct_then_wrong_leaves_57() {
        let mut engine = ScoringEngine::new();
        engine.record_answer("T", true, true);
        let fb = engine.record_answer("T", false, true);

        assert_eq!(engine.total_points(), 57);
        assert_eq!(fb.points_delta, -58);
        assert_eq!(fb.display_text.as_deref(), Some("-58 pts"));
        assert_eq!(engine.current_streak(), 0);
        assert_eq!(engine.current_lose_streak(), 1);
    }

    #[test]
    fn wrong_at_zero_shows_zero() {
        let mut engine = ScoringEngine::new();
        let fb = engine.record_answer("T", false, true);

        assert_eq!(engine.total_points(), 0);
        assert_eq!(fb.points_delta, 0);
        assert_eq!(fb.display_text.as_deref(), Some("-0 pts"));
    }

    #[test]
    fn wrong_clamps_but_shows_full_loss() {
        let mut engine = ScoringEngine::new();
        engine.record_answer("T", true, true); // 115
        engine.record_answer("T", false, true); // -58 -> 57
        let fb = engine.record_answer("T", false, false); // -65 -> 0

        assert_eq!(engine.total_points(), 0);
        assert_eq!(fb.points_delta, -57);
        assert_eq!(fb.display_text.as_deref(), Some("-65 pts"));
        assert_eq!(engine.current_lose_streak(), 2);
    }

    #[test]
    fn recovered_answer_scores_nothing_and_resets_streaks() {
        let mut engine = ScoringEngine::new();
        engine.record_answer("T", true, true);
        engine.record_answer("T", false, true);
        let before = engine.total_points();

        let fb = engine.record_answer("T", true, false);

        assert_eq!(fb.points_delta, 0);
        assert_eq!(fb.display_text, None);
        assert_eq!(engine.total_points(), before);
        assert_eq!(engine.current_streak(), 0);
        assert_eq!(engine.current_lose_streak(), 0);

        let t = engine.topics().get("T").unwrap();
        assert_eq!(t.correct_count, 2);
        assert_eq!(t.first_attempt_correct_count, 1);
        assert_eq!(t.total_count, 3);
    }

    #[test]
    fn topics_keep_first_encounter_order() {
        let mut engine = ScoringEngine::new();
        engine.record_answer("Zoology", true, true);
        engine.record_answer("Algebra", false, true);
        engine.record_answer("Zoology", true, true);

        let order: Vec<&str> = engine.topics().iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["Zoology", "Algebra"]);
    }

    #[test]
    fn random_sequences_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let topics = ["A", "B", "C"];
        let mut engine = ScoringEngine::new();

        for _ in 0..2000 {
            let topic = topics[rng.gen_range(0..topics.len())];
            engine.record_answer(topic, rng.gen_bool(0.5), rng.gen_bool(0.5));

            assert!(engine.current_streak() == 0 || engine.current_lose_streak() == 0);
            for (_, s) in engine.topics().iter() {
                assert!(s.correct_count <= s.total_count);
                assert!(s.first_attempt_correct_count <= s.correct_count);
            }
        }
    }

    #[test]
    fn weighted_correctness() {
        let agg: TopicAggregate = vec![
            (
                "A",
                TopicScore {
                    correct_count: 9,
                    total_count: 10,
                    first_attempt_correct_count: 8,
                },
            ),
            (
                "B",
                TopicScore {
                    correct_count: 1,
                    total_count: 10,
                    first_attempt_correct_count: 1,
                },
            ),
        ]
        .into_iter()
        .collect();

        assert!((agg.weighted_correctness() - 0.5).abs() < 1e-12);
        assert_eq!(TopicAggregate::new().weighted_correctness(), 0.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut engine = ScoringEngine::new();
        engine.record_answer("T", true, true);
        engine.reset();

        assert_eq!(engine.total_points(), 0);
        assert_eq!(engine.current_streak(), 0);
        assert!(engine.topics().is_empty());
    }
}
