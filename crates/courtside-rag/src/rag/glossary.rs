//! Glossary & definition detection.
//!
//! Definitions and terminology lookups are reference content, so either
//! signal routes a question to the semantic store regardless of how
//! stat-heavy its wording is.

use crate::error::Result;
use crate::rag::rules::Matcher;

/// Domain reference vocabulary, lower-case.
const GLOSSARY_TERMS: &[&str] = &[
    "triple-double",
    "triple double",
    "double-double",
    "double double",
    "quadruple-double",
    "true shooting percentage",
    "true shooting",
    "effective field goal percentage",
    "player efficiency rating",
    "usage rate",
    "plus-minus",
    "plus/minus",
    "box plus/minus",
    "box plus-minus",
    "value over replacement player",
    "win shares",
    "offensive rating",
    "defensive rating",
    "assist-to-turnover ratio",
    "pick and roll",
    "pick-and-roll",
    "pick and pop",
    "zone defense",
    "man-to-man",
    "full-court press",
    "fast break",
    "and-one",
    "alley-oop",
    "euro step",
    "hack-a-shaq",
    "small ball",
    "stretch four",
    "sixth man",
    "three-and-d",
    "3-and-d",
    "flagrant foul",
    "technical foul",
    "goaltending",
    "shot clock violation",
    "backcourt violation",
    "three-second violation",
    "double dribble",
    "vorp",
    "ts%",
    "efg%",
];

const DEFINITION_PATTERNS: &[(&str, &str)] = &[
    ("define", r"^(?:please |can you |could you )?define\b"),
    ("definition_of", r"\b(?:definition|meaning) of\b"),
    ("what_does_mean", r"\bwhat (?:does|do|did) .+ (?:mean|stand for)\b"),
    (
        "what_is_a",
        r"^(?:so )?what(?:'s| is| are) (?:a|an) [a-z0-9][a-z0-9'/%-]*(?: [a-z0-9'/%-]+){0,3}\s*\??$",
    ),
    ("explain_term", r"^explain (?:the )?(?:term|concept|meaning)\b"),
    ("what_is_meant", r"\bwhat is meant by\b"),
];

/// Boundary-safe substring test: `term` must occur in `haystack` without an
/// alphanumeric character directly on either side. Both inputs are expected
/// in the same case.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glossary {
    terms: Vec<&'static str>,
}

impl Glossary {
    pub fn new() -> Self {
        Self {
            terms: GLOSSARY_TERMS.to_vec(),
        }
    }

    pub fn terms(&self) -> &[&'static str] {
        &self.terms
    }

    /// First glossary term found in `text` (lower-case input).
    pub fn find_term(&self, text: &str) -> Option<&'static str> {
        self.terms
            .iter()
            .copied()
            .find(|term| contains_term(text, term))
    }

    pub fn has_glossary_term(&self, text: &str) -> bool {
        self.find_term(text).is_some()
    }
}

impl Default for Glossary {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognizes explicit "define X" / "what is a X" / "what does X mean"
/// phrasings. Open-ended "what is the ..." questions are left to the rule
/// tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionDetector {
    patterns: Vec<Matcher>,
}

impl DefinitionDetector {
    pub fn new() -> Result<Self> {
        let patterns = DEFINITION_PATTERNS
            .iter()
            .map(|(name, source)| Matcher::compile("definition", name, source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_definitional(&self, text: &str) -> bool {
        self.matched_pattern(text).is_some()
    }

    pub fn matched_pattern(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.is_match(text))
            .map(|p| p.name())
    }
}
