use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One answer attempt as seen by the metrics collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub topic: String,
    pub elapsed_ms: u64,
    pub correct: bool,
    pub first_attempt: bool,
}

/// Timing and attempt tally for one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicTiming {
    pub elapsed_times: Vec<u64>,
    pub attempts: u64,
    pub correct_count: u64,
}

impl TopicTiming {
    /// Mean elapsed time rounded to the nearest millisecond.
    pub fn average_elapsed_ms(&self) -> Option<u64> {
        if self.elapsed_times.is_empty() {
            return None;
        }
        let sum: u128 = self.elapsed_times.iter().map(|&t| t as u128).sum();
        let count = self.elapsed_times.len() as u128;
        Some(((sum + count / 2) / count) as u64)
    }
}

/// Append-only record of every answer attempt in a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub per_question: Vec<QuestionRecord>,
    pub per_topic: BTreeMap<String, TopicTiming>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, topic: &str, elapsed_ms: u64, correct: bool, first_attempt: bool) {
        self.per_question.push(QuestionRecord {
            topic: topic.to_string(),
            elapsed_ms,
            correct,
            first_attempt,
        });

        let timing = self.per_topic.entry(topic.to_string()).or_default();
        timing.elapsed_times.push(elapsed_ms);
        timing.attempts += 1;
        if correct {
            timing.correct_count += 1;
        }
    }

    /// The last `n` per-question records, oldest first.
    pub fn recent(&self, n: usize) -> &[QuestionRecord] {
        let start = self.per_question.len().saturating_sub(n);
        &self.per_question[start..]
    }

    pub fn topic(&self, topic: &str) -> Option<&TopicTiming> {
        self.per_topic.get(topic)
    }

    pub fn is_empty(&self) -> bool {
        self.per_question.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_creates_topic_lazily() {
        let mut m = SessionMetrics::new();
        assert!(m.topic("Math").is_none());

        m.record("Math", 1200, false, true);

        let t = m.topic("Math").unwrap();
        assert_eq!(t.attempts, 1);
        assert_eq!(t.correct_count, 0);
        assert_eq!(t.elapsed_times, vec![1200]);
        assert_eq!(m.per_question.len(), 1);
        assert!(m.per_question[0].first_attempt);
    }

    #[test]
    fn correct_count_only_on_correct() {
        let mut m = SessionMetrics::new();
        m.record("Math", 100, false, true);
        m.record("Math", 200, true, false);
        m.record("Math", 300, true, true);

        let t = m.topic("Math").unwrap();
        assert_eq!(t.attempts, 3);
        assert_eq!(t.correct_count, 2);
        assert_eq!(t.elapsed_times, vec![100, 200, 300]);
    }

    #[test]
    fn zero_and_huge_elapsed() {
        let mut m = SessionMetrics::new();
        m.record("T", 0, true, true);
        m.record("T", u64::MAX, true, true);

        let t = m.topic("T").unwrap();
        assert_eq!(t.elapsed_times, vec![0, u64::MAX]);
        assert_eq!(t.average_elapsed_ms(), Some(u64::MAX / 2 + 1));
    }

    #[test]
    fn average_rounds_to_nearest() {
        let timing = TopicTiming {
            elapsed_times: vec![100, 101],
            attempts: 2,
            correct_count: 2,
        };
        assert_eq!(timing.average_elapsed_ms(), Some(101));
        assert_eq!(TopicTiming::default().average_elapsed_ms(), None);
    }

    #[test]
    fn recent_returns_tail() {
        let mut m = SessionMetrics::new();
        for i in 0..5 {
            m.record("T", i, true, true);
        }

        let tail: Vec<u64> = m.recent(2).iter().map(|r| r.elapsed_ms).collect();
        assert_eq!(tail, vec![3, 4]);
        assert_eq!(m.recent(10).len(), 5);
        assert!(SessionMetrics::new().recent(3).is_empty());
    }
}
