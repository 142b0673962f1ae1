//! Cheap keyword heuristic for messages that have nothing to do with cloud cost

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OFF_TOPIC_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("weather", word_regex(&[
            "weather", "forecast", "rain", "raining", "snow", "sunny", "temperature outside",
        ])),
        ("sports", word_regex(&[
            "football", "soccer", "basketball", "baseball", "tennis", "nba", "nfl",
            "world cup", "match score", "who won",
        ])),
        ("politics", word_regex(&[
            "election", "president", "politics", "political", "senate", "congress",
            "democrat", "republican", "vote for",
        ])),
        ("entertainment", word_regex(&[
            "movie", "movies", "netflix", "tv show", "celebrity", "song", "music",
            "recipe", "joke",
        ])),
        ("small_talk", word_regex(&[
            "how are you", "what's up", "whats up", "good morning", "good night",
            "tell me about yourself", "are you human",
        ])),
    ];

    // Any of these keeps a message on topic even when it also matches above
    static ref COST_VOCABULARY: Regex = word_regex(&[
        "cost", "costs", "price", "pricing", "bill", "billing", "invoice", "budget",
        "spend", "savings", "cloud", "aws", "azure", "gcp", "ec2", "s3", "lambda",
        "kubernetes", "instance", "instances", "vm", "storage", "egress", "reserved",
        "spot", "server", "serverless", "database",
    ]);
}

fn word_regex(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .expect("keyword lists are escaped")
}

/// Flags messages about weather, sports, politics, entertainment or small talk
#[derive(Debug, Clone, Copy, Default)]
pub struct OffTopicFilter;

impl OffTopicFilter {
    pub fn new() -> Self {
        Self
    }

    /// Category of the first off-topic pattern the message matches, unless
    /// it also talks about cloud or cost
    pub fn matched_category(&self, message: &str) -> Option<&'static str> {
        if COST_VOCABULARY.is_match(message) {
            return None;
        }

        OFF_TOPIC_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(message))
            .map(|(category, _)| *category)
    }

    pub fn is_off_topic(&self, message: &str) -> bool {
        self.matched_category(message).is_some()
    }
}
