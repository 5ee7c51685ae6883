use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_option: String,
    #[serde(default)]
    pub explanation: String,
    /// Filled from the owning group when a deck is flattened.
    #[serde(default)]
    pub topic: String,
}

impl Question {
    /// Index of the correct option within `options`, if present.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_option)
    }

    fn validate(&self, topic: &str, index: usize) -> Result<(), QuizError> {
        let invalid = |reason: &str| QuizError::InvalidQuestion {
            topic: topic.to_string(),
            index,
            reason: reason.to_string(),
        };

        if self.options.len() < 2 {
            return Err(invalid("needs at least 2 options"));
        }
        if self.correct_index().is_none() {
            return Err(invalid("correct answer is not one of the options"));
        }
        Ok(())
    }
}

/// Questions sharing one topic, as delivered by a deck loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub topic: String,
    pub questions: Vec<Question>,
}

/// A named test made of topic groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(rename = "testName")]
    pub test_name: String,
    pub topics: Vec<QuestionGroup>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeckFile {
    Single(Deck),
    Bundle { tests: Vec<Deck> },
}

impl Deck {
    /// First test of a deck file.
    pub fn from_json(json: &str) -> Result<Self, QuizError> {
        Self::all_from_json(json)?
            .into_iter()
            .next()
            .ok_or(QuizError::EmptyQuestionSet)
    }

    /// Every test in a deck file; a single-test file yields one deck.
    pub fn all_from_json(json: &str) -> Result<Vec<Self>, QuizError> {
        Ok(match serde_json::from_str::<DeckFile>(json)? {
            DeckFile::Single(deck) => vec![deck],
            DeckFile::Bundle { tests } => tests,
        })
    }

    /// Pick a test by name from a deck file, or the first one when `name` is `None`.
    pub fn select_from_json(json: &str, name: Option<&str>) -> Result<Self, QuizError> {
        let Some(name) = name else {
            return Self::from_json(json);
        };
        Self::all_from_json(json)?
            .into_iter()
            .find(|d| d.test_name == name)
            .ok_or_else(|| QuizError::DeckNotFound(name.to_string()))
    }

    pub fn question_count(&self) -> usize {
        self.topics.iter().map(|g| g.questions.len()).sum()
    }
}

/// Flatten topic groups into one sequence, stamping every question with its
/// group's topic. Rejects the whole set if any question is malformed.
pub fn flatten_groups(groups: &[QuestionGroup]) -> Result<Vec<Question>, QuizError> {
    let mut out = Vec::with_capacity(groups.iter().map(|g| g.questions.len()).sum());

    for group in groups {
        for (index, q) in group.questions.iter().enumerate() {
            q.validate(&group.topic, index)?;
            out.push(Question {
                topic: group.topic.clone(),
                ..q.clone()
            });
        }
    }

    if out.is_empty() {
        return Err(QuizError::EmptyQuestionSet);
    }
    Ok(out)
}
