use thiserror::Error;

/// Errors raised while loading decks or driving a quiz session.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("question set is empty")]
    EmptyQuestionSet,

    #[error("topic '{topic}' question {index}: {reason}")]
    InvalidQuestion {
        topic: String,
        index: usize,
        reason: String,
    },

    #[error("option {index} is out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("'{0}' is not an option of the current question")]
    UnknownOption(String),

    #[error("deck '{0}' not found")]
    DeckNotFound(String),

    #[error("failed to parse deck: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by result stores. Kept apart from [`QuizError`] so that a
/// failing store never leaks into scoring code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_question_message_names_topic_and_index() {
        let err = QuizError::InvalidQuestion {
            topic: "Biology".into(),
            index: 3,
            reason: "needs at least 2 options".into(),
        };
        assert_eq!(
            err.to_string(),
            "topic 'Biology' question 3: needs at least 2 options"
        );
    }

    #[test]
    fn out_of_range_message() {
        let err = QuizError::OptionOutOfRange { index: 5, len: 4 };
        assert_eq!(
            err.to_string(),
            "option 5 is out of range (question has 4 options)"
        );
    }
}
