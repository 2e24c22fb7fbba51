use std::collections::BTreeSet;

use regex::Regex;

/// Whole-word, case-insensitive keyword lookup. Keywords are tried in sorted
/// order, so the reported match is deterministic.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let mut patterns = Vec::with_capacity(sorted.len());
        for keyword in sorted {
            let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword)))?;
            patterns.push((keyword, regex));
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First keyword found in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(keyword, _)| keyword.as_str())
    }
}
