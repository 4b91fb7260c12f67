//! Lexicon + rule sentiment scoring.
//!
//! Every known word carries a valence on a -4..+4 scale. Valences are adjusted
//! by the words around them (boosters, dampeners, negators, a contrastive
//! "but"), by ALL-CAPS emphasis, and by trailing `!`/`?` runs, then summed and
//! squashed into a compound score in [-1, 1].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use common::configuration::AnalysisSettings;
use common::consts::{DEFAULT_NEUTRAL_PHRASES, NEGATIVE_THRESHOLD, POSITIVE_THRESHOLD};
use common::labels::SentimentLabel;

use super::normalize::NormalizedText;

/// Squashing constant: compound = sum / sqrt(sum^2 + ALPHA)
const NORMALIZATION_ALPHA: f64 = 15.0;
const BOOSTER_INCREMENT: f64 = 0.293;
const NEGATION_SCALAR: f64 = -0.74;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_AMPLIFIER: f64 = 0.96;
/// How far back a booster or negator can reach.
const LOOKBACK: usize = 3;

static LEXICON: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    [
        // positive
        ("good", 1.9),
        ("great", 3.1),
        ("excellent", 2.7),
        ("outstanding", 2.7),
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("brilliant", 2.8),
        ("superb", 3.1),
        ("fantastic", 2.6),
        ("wonderful", 2.7),
        ("lovely", 2.8),
        ("love", 3.2),
        ("loved", 2.9),
        ("loving", 2.9),
        ("happy", 2.7),
        ("glad", 2.0),
        ("pleased", 1.9),
        ("pleasant", 2.3),
        ("satisfied", 1.8),
        ("delighted", 2.9),
        ("thanks", 1.9),
        ("thank", 1.5),
        ("thankful", 2.7),
        ("grateful", 2.0),
        ("appreciate", 1.7),
        ("appreciated", 2.3),
        ("helpful", 1.8),
        ("perfect", 2.7),
        ("perfectly", 2.7),
        ("better", 1.9),
        ("best", 3.2),
        ("nice", 1.8),
        ("kind", 2.4),
        ("friendly", 2.2),
        ("polite", 1.5),
        ("easy", 1.9),
        ("smooth", 1.4),
        ("quick", 1.0),
        ("cool", 1.3),
        ("yay", 2.4),
        ("works", 1.2),
        ("working", 0.9),
        ("worked", 1.2),
        ("resolved", 1.2),
        ("solved", 1.2),
        ("impressed", 2.1),
        ("recommend", 1.5),
        ("reliable", 1.9),
        ("fair", 1.3),
        ("welcome", 2.0),
        ("success", 2.7),
        ("successful", 2.8),
        ("win", 2.8),
        ("enjoy", 2.2),
        ("enjoyed", 2.3),
        ("relieved", 1.5),
        ("calm", 1.3),
        ("ready", 1.5),
        // negative
        ("bad", -2.5),
        ("terrible", -2.5),
        ("awful", -2.0),
        ("horrible", -2.5),
        ("worst", -3.1),
        ("worse", -2.1),
        ("hate", -2.7),
        ("hated", -3.2),
        ("angry", -2.3),
        ("furious", -2.7),
        ("mad", -2.2),
        ("upset", -1.6),
        ("annoyed", -1.6),
        ("annoying", -1.8),
        ("frustrated", -2.0),
        ("frustrating", -1.9),
        ("frustration", -2.1),
        ("disappointed", -1.9),
        ("disappointing", -2.2),
        ("disappoints", -1.6),
        ("disappointment", -2.3),
        ("unhappy", -1.8),
        ("sad", -2.1),
        ("useless", -1.8),
        ("broken", -1.2),
        ("unacceptable", -2.0),
        ("ridiculous", -1.5),
        ("absurd", -1.3),
        ("poor", -2.1),
        ("problem", -1.7),
        ("problems", -1.7),
        ("wrong", -2.1),
        ("fail", -2.5),
        ("fails", -2.0),
        ("failed", -2.3),
        ("failure", -2.3),
        ("error", -1.7),
        ("errors", -1.4),
        ("crash", -1.7),
        ("crashed", -1.8),
        ("delay", -1.3),
        ("delayed", -1.2),
        ("waste", -1.8),
        ("wasted", -2.2),
        ("scam", -2.4),
        ("rude", -2.0),
        ("incompetent", -2.2),
        ("stupid", -2.4),
        ("damn", -1.7),
        ("sucks", -1.5),
        ("crap", -1.6),
        ("nightmare", -2.3),
        ("mess", -1.5),
        ("pathetic", -2.2),
        ("lost", -1.3),
        ("stuck", -1.0),
        ("confused", -1.3),
        ("confusing", -0.9),
        ("worried", -1.2),
        ("concerned", -0.9),
        ("complaint", -1.5),
        ("complain", -1.5),
        ("hassle", -1.3),
        ("inconvenience", -1.5),
        ("inconvenient", -1.4),
        ("unresolved", -1.1),
        ("sorry", -0.3),
        ("hopeless", -2.0),
        ("outrageous", -2.0),
        ("disgusting", -2.4),
        ("unreliable", -1.7),
        ("misleading", -1.7),
        ("cheated", -2.2),
        ("ignored", -1.6),
        ("painful", -1.8),
        ("slow", -0.8),
    ]
    .into_iter()
    .collect()
});

/// Intensity modifiers: positive values boost, negative values dampen.
static BOOSTERS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    let boosters = [
        "absolutely",
        "completely",
        "deeply",
        "entirely",
        "especially",
        "exceptionally",
        "extremely",
        "greatly",
        "highly",
        "hugely",
        "incredibly",
        "insanely",
        "most",
        "particularly",
        "quite",
        "really",
        "remarkably",
        "so",
        "super",
        "thoroughly",
        "totally",
        "truly",
        "unbelievably",
        "utterly",
        "very",
    ];
    let dampeners = [
        "almost",
        "barely",
        "hardly",
        "kinda",
        "less",
        "marginally",
        "partly",
        "scarcely",
        "slightly",
        "somewhat",
        "sorta",
    ];
    boosters
        .into_iter()
        .map(|w| (w, BOOSTER_INCREMENT))
        .chain(dampeners.into_iter().map(|w| (w, -BOOSTER_INCREMENT)))
        .collect()
});

static NEGATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "not", "no", "never", "none", "nobody", "nothing", "nowhere", "neither", "nor", "cannot",
        "cant", "dont", "doesnt", "didnt", "isnt", "wasnt", "wont", "aint", "without", "rarely",
        "seldom",
    ]
    .into_iter()
    .collect()
});

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(word) || word.ends_with("n't")
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(|c| c.is_alphabetic()) && !word.chars().any(|c| c.is_lowercase())
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub fn label_for(compound: f64) -> SentimentLabel {
    if compound >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Compound polarity of a span of text and its coarse label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub compound: f64,
    pub label: SentimentLabel,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self {
            compound: 0.0,
            label: SentimentLabel::Neutral,
        }
    }

    /// Clamps into [-1, 1] and labels with the per-text thresholds.
    pub fn from_compound(compound: f64) -> Self {
        if !compound.is_finite() {
            return Self::neutral();
        }
        let compound = compound.clamp(-1.0, 1.0);
        Self {
            compound,
            label: label_for(compound),
        }
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Seam for swapping the polarity engine.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentResult;
}

/// A word of the scored text with its case preserved for emphasis checks.
struct Token {
    original: String,
    lower: String,
}

pub struct LexiconScorer {
    overrides: HashMap<String, f64>,
    neutral_phrases: Vec<String>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            neutral_phrases: DEFAULT_NEUTRAL_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            overrides: settings.lexicon_overrides.clone(),
            neutral_phrases: settings.neutral_phrases.clone(),
        }
    }

    fn valence(&self, word: &str) -> Option<f64> {
        self.overrides
            .get(word)
            .or_else(|| LEXICON.get(word))
            .copied()
            .filter(|v| *v != 0.0)
    }

    fn tokenize(text: &str) -> Vec<Token> {
        text.split_whitespace()
            .map(|word| {
                word.trim_matches(|c: char| c.is_ascii_punctuation())
                    .replace('\u{2019}', "'")
            })
            .filter(|w| w.chars().count() > 1)
            .map(|w| Token {
                lower: w.to_lowercase(),
                original: w,
            })
            .collect()
    }

    /// Valence of every token in order, zero for words without sentiment.
    fn token_valences(&self, tokens: &[Token]) -> Vec<f64> {
        let caps_differential = {
            let caps = tokens.iter().filter(|t| is_all_caps(&t.original)).count();
            caps > 0 && caps < tokens.len()
        };

        let mut valences = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if BOOSTERS.contains_key(token.lower.as_str()) || is_negation(&token.lower) {
                valences.push(0.0);
                continue;
            }
            let Some(mut valence) = self.valence(&token.lower) else {
                valences.push(0.0);
                continue;
            };

            let direction = sign(valence);
            if caps_differential && is_all_caps(&token.original) {
                valence += direction * CAPS_INCREMENT;
            }

            let mut negated = false;
            for distance in 1..=LOOKBACK.min(i) {
                let previous = &tokens[i - distance];
                if let Some(increment) = BOOSTERS.get(previous.lower.as_str()) {
                    let mut scalar = increment * direction;
                    if caps_differential && is_all_caps(&previous.original) {
                        scalar += direction * CAPS_INCREMENT;
                    }
                    scalar *= match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    valence += scalar;
                }
                if is_negation(&previous.lower) {
                    negated = true;
                }
            }
            if negated {
                valence *= NEGATION_SCALAR;
            }

            valences.push(valence);
        }

        // Contrastive "but": what follows outweighs what precedes
        if let Some(pivot) = tokens.iter().position(|t| t.lower == "but") {
            for (i, valence) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *valence *= 0.5;
                } else if i > pivot {
                    *valence *= 1.5;
                }
            }
        }

        valences
    }

    fn punctuation_emphasis(text: &str) -> f64 {
        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        let questions = text.matches('?').count();

        let question_amplifier = match questions {
            0 | 1 => 0.0,
            2 | 3 => questions as f64 * QUESTION_INCREMENT,
            _ => MAX_QUESTION_AMPLIFIER,
        };

        exclamations as f64 * EXCLAMATION_INCREMENT + question_amplifier
    }

    fn is_borderline_neutral(&self, text: &str) -> bool {
        if self.neutral_phrases.is_empty() {
            return false;
        }
        NormalizedText::from_text(text)
            .first_match(&self.neutral_phrases)
            .is_some()
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() || self.is_borderline_neutral(text) {
            return SentimentResult::neutral();
        }

        let tokens = Self::tokenize(text);
        let mut sum: f64 = self.token_valences(&tokens).iter().sum();
        if sum == 0.0 {
            return SentimentResult::neutral();
        }

        sum += sign(sum) * Self::punctuation_emphasis(text);

        SentimentResult::from_compound(sum / (sum * sum + NORMALIZATION_ALPHA).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> SentimentResult {
        LexiconScorer::new().score(text)
    }

    #[test]
    fn test_empty_text_is_neutral() {
        assert_eq!(score(""), SentimentResult::neutral());
        assert_eq!(score("   \n\t"), SentimentResult::neutral());
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(label_for(0.05), SentimentLabel::Positive);
        assert_eq!(label_for(0.049), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.049), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.05), SentimentLabel::Negative);
    }

    #[test]
    fn test_positive_message() {
        let result = score("I absolutely love this service!");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.compound > 0.1, "compound: {}", result.compound);
    }

    #[test]
    fn test_negative_message() {
        let result = score("Your service disappoints me. I am very unhappy.");
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!(result.compound < -0.1, "compound: {}", result.compound);
    }

    #[test]
    fn test_escalation_fixture_messages_are_negative() {
        for text in ["This is terrible", "I am furious", "Nothing works"] {
            assert_eq!(score(text).label, SentimentLabel::Negative, "{}", text);
        }
        assert_eq!(score("Actually thanks").label, SentimentLabel::Positive);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let plain = score("The app works");
        let negated = score("The app is not working");
        assert_eq!(plain.label, SentimentLabel::Positive);
        assert_eq!(negated.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_booster_increases_intensity() {
        let plain = score("This is bad");
        let boosted = score("This is really bad");
        assert!(boosted.compound < plain.compound);
    }

    #[test]
    fn test_caps_and_exclamation_emphasis() {
        let plain = score("this is terrible");
        let shouted = score("this is TERRIBLE!!!");
        assert!(shouted.compound < plain.compound);
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let result = score("The agent was nice but the product is terrible");
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_borderline_phrases_are_neutral() {
        assert_eq!(score("It's ok I guess"), SentimentResult::neutral());
        assert_eq!(score("Not bad at all"), SentimentResult::neutral());
    }

    #[test]
    fn test_lexicon_override() {
        let mut settings = AnalysisSettings::default();
        settings.lexicon_overrides.insert("meh".to_string(), -1.5);
        let scorer = LexiconScorer::from_settings(&settings);
        assert_eq!(scorer.score("meh").label, SentimentLabel::Negative);
        assert_eq!(LexiconScorer::new().score("meh").label, SentimentLabel::Neutral);
    }

    /// Every lexicon word in neutral, boosted, negated, shouted and
    /// punctuated contexts, plus stacked extremes.
    fn generated_corpus() -> Vec<String> {
        let mut words: Vec<&str> = LEXICON.keys().copied().collect();
        words.sort_unstable();
        let boosters = ["very", "extremely", "slightly"];
        let suffixes = ["", "!", "!!!!!!", "??", "?????", "?!?!"];

        let mut corpus = Vec::new();
        for word in &words {
            let shouted = word.to_uppercase();
            let bases = [
                word.to_string(),
                format!("this is {}", word),
                format!("this is {} {}", boosters[0], word),
                format!("{} {} {} {}", boosters[1], boosters[0], boosters[2], word),
                format!("not {}", word),
                format!("it wasn't really {}", word),
                format!("this is {} honestly", shouted),
                format!("VERY {} and {}", shouted, word),
                format!("{} but not {}", word, word),
            ];
            for base in bases {
                for suffix in suffixes {
                    corpus.push(format!("{}{}", base, suffix));
                }
            }
        }

        let all = words.join(" ");
        corpus.push(all.clone());
        corpus.push(format!("{}!!!!!!!!", all.to_uppercase()));
        corpus.push(format!("very {} but {}????", all, all));
        corpus.extend(
            ["", "   ", "!!!", "?????", "no", "plain words without polarity"].map(String::from),
        );
        corpus
    }

    #[test]
    fn test_compound_bounded_and_idempotent() {
        let scorer = LexiconScorer::new();
        let corpus = generated_corpus();
        assert!(corpus.len() > LEXICON.len() * 50);

        for text in &corpus {
            let first = scorer.score(text);
            assert!(first.compound.is_finite(), "{}", text);
            assert!((-1.0..=1.0).contains(&first.compound), "{}", text);
            assert_eq!(first.label, label_for(first.compound), "{}", text);
            assert_eq!(first, scorer.score(text), "{}", text);
        }
    }
}
