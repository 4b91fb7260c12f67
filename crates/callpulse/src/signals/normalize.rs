use std::collections::HashSet;

/// Message text folded into lowercase tokens for keyword and phrase matching.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    tokens: Vec<String>,
    token_set: HashSet<String>,
}

impl NormalizedText {
    pub fn from_text(text: &str) -> Self {
        Self::from_text_with_limit(text, usize::MAX)
    }

    pub fn from_text_with_limit(text: &str, max_length: usize) -> Self {
        let char_count = text.chars().count();

        // Keep head (20%) + tail so both the greeting and the actual ask survive
        let raw = if char_count <= max_length {
            text.to_string()
        } else {
            let head_len = max_length / 5;
            let tail_len = max_length - head_len - 1;

            let head: String = text.chars().take(head_len).collect();
            let tail: String = text.chars().skip(char_count - tail_len).collect();

            format!("{} {}", head, tail)
        };

        let folded = raw
            .replace(['\u{2019}', '\u{2018}'], "'")
            .replace(['\u{201C}', '\u{201D}'], "\"")
            .replace(['\u{2013}', '\u{2014}'], "-")
            .to_lowercase();

        let tokens: Vec<String> = folded
            .split_whitespace()
            .map(|word| {
                word.trim_matches(|c: char| c.is_ascii_punctuation())
                    .to_string()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let token_set = tokens.iter().cloned().collect();

        Self { tokens, token_set }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.token_set.contains(token)
    }

    /// Whole-token match for single words, contiguous token run for phrases.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let phrase_tokens: Vec<&str> = phrase.split_whitespace().collect();
        if phrase_tokens.is_empty() {
            return false;
        }

        if phrase_tokens.len() == 1 {
            return self.contains_token(phrase_tokens[0]);
        }

        self.tokens.windows(phrase_tokens.len()).any(|window| {
            window
                .iter()
                .zip(phrase_tokens.iter())
                .all(|(token, phrase_token)| token == phrase_token)
        })
    }

    /// First phrase from `phrases` present in the text, in list order.
    pub fn first_match<'a>(&self, phrases: &'a [String]) -> Option<&'a str> {
        phrases
            .iter()
            .find(|p| self.contains_phrase(p))
            .map(String::as_str)
    }
}
