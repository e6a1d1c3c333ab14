use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","but","by","for","if","in","into","is","it",
            "no","not","of","on","or","such","that","the","their","then","there","these",
            "they","this","to","was","will","with",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Text normalization shared by indexing and querying.
///
/// Tokens are maximal runs of Unicode letters and digits, lowercased. The
/// same `Analyzer` must be used on both sides so that query terms match
/// index terms by plain string equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    #[serde(default)]
    pub remove_stopwords: bool,
}

impl Analyzer {
    pub fn new() -> Self { Self::default() }

    pub fn with_stopwords(mut self, remove: bool) -> Self {
        self.remove_stopwords = remove;
        self
    }

    /// Lazily yield the index terms of `text`. Calling again restarts from the beginning.
    pub fn analyze<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let remove_stopwords = self.remove_stopwords;
        RE.find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(move |t| !t.is_empty() && !(remove_stopwords && is_stopword(t)))
    }
}

/// Tokenize with the default analyzer.
pub fn tokenize(text: &str) -> Vec<String> {
    Analyzer::default().analyze(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert_eq!(t, vec!["running", "runner", "s", "run"]);
    }

    #[test]
    fn restartable() {
        let a = Analyzer::new();
        let text = "Hello, World";
        let first: Vec<_> = a.analyze(text).collect();
        let second: Vec<_> = a.analyze(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn stopwords_only_when_enabled() {
        let text = "the cat and the hat";
        assert_eq!(Analyzer::new().analyze(text).count(), 5);
        let kept: Vec<_> = Analyzer::new().with_stopwords(true).analyze(text).collect();
        assert_eq!(kept, vec!["cat", "hat"]);
    }
}
