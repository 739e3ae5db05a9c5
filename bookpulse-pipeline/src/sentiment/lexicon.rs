//! Embedded lexicon scorer
//!
//! Deterministic, offline word-list scoring for English titles. The score is
//! (positive - negative) / matched-token count, so a title that mixes both
//! polarities lands near zero, and a title with no lexicon hits scores 0.0
//! with full signal (the title was scorable, it was just neutral).

use super::{ScoreError, SentimentScorer};
use async_trait::async_trait;
use bookpulse_common::Sentiment;
use std::collections::HashSet;
use std::sync::OnceLock;

const POSITIVE_WORDS: &[&str] = &[
    "love", "loved", "loving", "joy", "joyful", "happy", "happiness", "hope", "hopeful",
    "bright", "light", "beautiful", "beauty", "wonder", "wonderful", "magic", "magical",
    "dream", "dreams", "golden", "sweet", "gentle", "kind", "kindness", "brave", "courage",
    "hero", "heroes", "triumph", "victory", "glory", "glorious", "peace", "peaceful",
    "paradise", "heaven", "blessed", "miracle", "delight", "charm", "charming", "grace",
    "laughter", "smile", "sunshine", "spring", "blossom", "treasure", "friend", "friends",
    "friendship", "home", "warm", "warmth", "free", "freedom", "alive", "rise", "rising",
];

const NEGATIVE_WORDS: &[&str] = &[
    "death", "dead", "dying", "die", "dark", "darkness", "fear", "afraid", "terror",
    "horror", "nightmare", "nightmares", "war", "blood", "bloody", "kill", "killer",
    "killing", "murder", "murderer", "grief", "sorrow", "sad", "sadness", "pain",
    "painful", "lost", "loss", "broken", "ruin", "ruins", "fall", "fallen", "shadow",
    "shadows", "ghost", "ghosts", "grave", "graves", "curse", "cursed", "poison", "cruel",
    "cruelty", "hate", "hatred", "rage", "fury", "despair", "doom", "doomed", "empty",
    "cold", "winter", "storm", "burn", "burning", "ashes", "betrayal", "lonely", "alone",
];

fn positive_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| POSITIVE_WORDS.iter().copied().collect())
}

fn negative_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| NEGATIVE_WORDS.iter().copied().collect())
}

/// Word-list sentiment scorer
#[derive(Debug, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    fn score(&self, title: &str) -> Sentiment {
        let tokens: Vec<String> = title
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return Sentiment::NoSignal;
        }

        let positive = tokens
            .iter()
            .filter(|t| positive_set().contains(t.as_str()))
            .count() as f64;
        let negative = tokens
            .iter()
            .filter(|t| negative_set().contains(t.as_str()))
            .count() as f64;

        let matched = (positive + negative).max(1.0);
        Sentiment::scored((positive - negative) / matched, "lexicon")
    }
}

#[async_trait]
impl SentimentScorer for LexiconScorer {
    fn method(&self) -> &'static str {
        "lexicon"
    }

    async fn score_title(&self, title: &str, _language: &str) -> Result<Sentiment, ScoreError> {
        Ok(self.score(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_polarity() {
        let scorer = LexiconScorer::new();
        let positive = scorer.score_title("A Bright and Beautiful Hope", "en").await.unwrap();
        assert_eq!(positive.score(), Some(1.0));

        let negative = scorer.score_title("Blood and Darkness", "en").await.unwrap();
        assert_eq!(negative.score(), Some(-1.0));

        let mixed = scorer.score_title("Love and War", "en").await.unwrap();
        assert_eq!(mixed.score(), Some(0.0));
    }

    #[tokio::test]
    async fn test_neutral_title_scores_zero_with_signal() {
        let scorer = LexiconScorer::new();
        let neutral = scorer.score_title("The Catalogue of Ships", "en").await.unwrap();
        assert_eq!(neutral.score(), Some(0.0));
        assert!(!neutral.is_no_signal());
    }

    #[tokio::test]
    async fn test_tokenless_title_is_no_signal() {
        let scorer = LexiconScorer::new();
        let empty = scorer.score_title("!!!", "en").await.unwrap();
        assert!(empty.is_no_signal());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let scorer = LexiconScorer::new();
        let a = scorer.score_title("Golden Shadow", "en").await.unwrap();
        let b = scorer.score_title("Golden Shadow", "en").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let scorer = LexiconScorer::new();
        let a = scorer.score_title("LOVE, actually!", "en").await.unwrap();
        let b = scorer.score_title("love actually", "en").await.unwrap();
        assert_eq!(a, b);
    }
}
