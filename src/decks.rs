use include_dir::{include_dir, Dir};
use std::path::Path;

use crate::error::QuizError;
use crate::question::Deck;

static DECK_DIR: Dir = include_dir!("src/decks");

/// Names of the decks bundled into the binary, sorted.
pub fn bundled_names() -> Vec<String> {
    let mut names: Vec<String> = DECK_DIR
        .files()
        .filter_map(|f| {
            let path = f.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => path.file_stem().and_then(|s| s.to_str()).map(str::to_string),
                _ => None,
            }
        })
        .collect();
    names.sort();
    names
}

/// Load a bundled deck by name (file stem, without `.json`). `test` picks one
/// test out of a multi-test deck.
pub fn load_bundled(name: &str, test: Option<&str>) -> Result<Deck, QuizError> {
    let contents = DECK_DIR
        .get_file(format!("{name}.json"))
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| QuizError::DeckNotFound(name.to_string()))?;

    Deck::select_from_json(contents, test)
}

/// Resolve a deck argument: an existing file path wins, otherwise it names a
/// bundled deck.
pub fn resolve(source: &str, test: Option<&str>) -> Result<Deck, QuizError> {
    let path = Path::new(source);
    if path.is_file() {
        let json = std::fs::read_to_string(path)?;
        return Deck::select_from_json(&json, test);
    }
    load_bundled(source, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::flatten_groups;
    use assert_matches::assert_matches;

    #[test]
    fn lists_bundled_decks() {
        let names = bundled_names();
        assert!(names.contains(&"general".to_string()));
        assert!(names.contains(&"rust".to_string()));
    }

    #[test]
    fn every_bundled_deck_is_valid() {
        for name in bundled_names() {
            let deck = load_bundled(&name, None).unwrap();
            assert!(!deck.test_name.is_empty());
            assert!(flatten_groups(&deck.topics).is_ok(), "deck {name} is malformed");
        }
    }

    #[test]
    fn resolve_prefers_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.json");
        std::fs::write(
            &path,
            r#"{ "tests": [
                { "testName": "One", "topics": [] },
                { "testName": "Two", "topics": [] }
            ] }"#,
        )
        .unwrap();

        let path = path.to_str().unwrap();
        assert_eq!(resolve(path, None).unwrap().test_name, "One");
        assert_eq!(resolve(path, Some("Two")).unwrap().test_name, "Two");
        assert_eq!(
            resolve("general", None).unwrap(),
            load_bundled("general", None).unwrap()
        );
        assert_matches!(resolve("missing-deck", None), Err(QuizError::DeckNotFound(_)));
    }

    #[test]
    fn unknown_deck() {
        assert_matches!(load_bundled("nope", None), Err(QuizError::DeckNotFound(n)) if n == "nope");
        assert_matches!(
            load_bundled("general", Some("no such test")),
            Err(QuizError::DeckNotFound(n)) if n == "no such test"
        );
    }
}
