use regex::Regex;
use std::collections::HashSet;

/// Splits text into the set of normalized word tokens used as classifier features.
///
/// Text is lower-cased and split on the single space character only, so tabs,
/// newlines and runs of spaces are not separators. Every character outside
/// `[a-z0-9]` is then removed from each word. Words that strip down to nothing
/// yield the empty-string token, which is kept.
pub struct Tokenizer {
    non_alphanumeric: Regex,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer {
            non_alphanumeric: Regex::new("[^a-z0-9]").expect("static pattern is valid"),
        }
    }
}

impl Tokenizer {
    pub fn encode(&self, text: &str) -> HashSet<String> {
        let text = text.to_lowercase();

        text.split(' ')
            .map(|word| self.non_alphanumeric.replace_all(word, "").into_owned())
            .collect()
    }
}
