//! Greeting and biographical detectors, plus the lexical signals used to
//! estimate question complexity and category.

use crate::error::Result;
use crate::rag::rules::Matcher;

// ============================================================================
// Greeting Detector
// ============================================================================

const GREETING_PATTERNS: &[(&str, &str)] = &[
    (
        "salutation",
        r"^(?:hi|hello|hey|hiya|howdy|yo|greetings|sup|hola)\b",
    ),
    (
        "gratitude",
        r"^(?:thanks|thank you|thx|ty|cheers|much appreciated|appreciate it)\b",
    ),
    (
        "farewell",
        r"^(?:bye|goodbye|good bye|see you|see ya|later|take care|good ?night)\b",
    ),
    ("time_of_day", r"^good (?:morning|afternoon|evening|day)\b"),
    (
        "small_talk",
        r"^(?:how are (?:you|ya)|how(?:'s| is) it going|hows it going|what'?s up|how are things|how do you do|nice to meet you)\b",
    ),
];

/// Tokens allowed to follow a greeting without turning it into a request.
const GREETING_FILLER: &[&str] = &[
    "hi", "hello", "hey", "hiya", "howdy", "yo", "greetings", "sup", "hola", "thanks", "thank",
    "thx", "ty", "cheers", "bye", "goodbye", "see", "ya", "later", "take", "care", "good",
    "morning", "afternoon", "evening", "day", "night", "goodnight", "how", "are", "is", "it",
    "going", "doing", "what's", "whats", "up", "things", "do", "nice", "meet", "you", "your",
    "there", "again", "so", "much", "very", "a", "lot", "all", "everyone", "everybody", "guys",
    "folks", "friend", "buddy", "man", "mate", "dude", "bot", "assistant", "today", "tonight",
    "for", "the", "help", "and", "to", "too", "great", "awesome", "ok", "okay", "soon",
    "appreciate", "appreciated", "well", "i'm", "im", "fine",
];

/// Longest utterance still considered small talk.
const MAX_GREETING_WORDS: usize = 8;

/// Recognizes pure social utterances. A greeting followed by anything
/// substantive ("hi, who is the top scorer?") is not a greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingDetector {
    patterns: Vec<Matcher>,
}

impl GreetingDetector {
    pub fn new() -> Result<Self> {
        let patterns = GREETING_PATTERNS
            .iter()
            .map(|(name, source)| Matcher::compile("greeting", name, source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// `text` must be lower-cased and trimmed.
    pub fn is_greeting(&self, text: &str) -> bool {
        if text.is_empty() || text.split_whitespace().count() > MAX_GREETING_WORDS {
            return false;
        }
        if !self.patterns.iter().any(|p| p.is_match(text)) {
            return false;
        }
        words(text).all(|w| GREETING_FILLER.contains(&w))
    }
}

// ============================================================================
// Biographical Detector
// ============================================================================

const BIOGRAPHICAL_PATTERNS: &[(&str, &str)] = &[
    (
        "who_is",
        r"^(?:so |and )?who(?:'s| is| was)\s+(?P<entity>.+?)\s*[?.!]*$",
    ),
    (
        "tell_me_about",
        r"^(?:can you |could you |please )?tell me (?:more )?about\s+(?P<entity>.+?)\s*[?.!]*$",
    ),
    (
        "what_do_you_know",
        r"^what do you know about\s+(?P<entity>.+?)\s*[?.!]*$",
    ),
    (
        "profile_of",
        r"^(?:give me |show me )?(?:a |an |the )?(?:bio|biography|profile|background) (?:of|on|for)\s+(?P<entity>.+?)\s*[?.!]*$",
    ),
];

/// Words that mark the "entity" as something generic rather than a name.
const GENERIC_ENTITY_WORDS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "our", "you", "yourself",
    "it", "there", "here", "some", "any", "something", "anything", "everything", "everyone",
    "someone", "basketball", "playing", "going", "winning",
    // pronouns point back into the conversation, not at a named entity
    "he", "she", "they", "him", "her", "his", "hers", "their", "theirs", "them", "its", "we",
    "us", "me", "i",
];

/// Status words and prepositions that open a description rather than a name
/// ("who is injured on the lakers").
const NON_NAME_LEADS: &[&str] = &[
    "injured", "hurt", "out", "playing", "coaching", "starting", "traded", "signed", "drafted",
    "retired", "suspended", "available", "on", "in", "at", "for", "with", "from", "to", "by",
    "of", "about", "against", "behind", "under", "over", "after", "before",
];

const SUPERLATIVE_WORDS: &[&str] = &[
    "most", "best", "top", "highest", "lowest", "leading", "leader", "leaders", "better",
    "worst", "greatest", "fewest", "least", "more", "less", "first", "last",
];

const MAX_ENTITY_WORDS: usize = 4;

/// Recognizes "who is X" / "tell me about X" questions about a specific
/// player, coach or team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiographicalDetector {
    patterns: Vec<Matcher>,
}

impl BiographicalDetector {
    pub fn new() -> Result<Self> {
        let patterns = BIOGRAPHICAL_PATTERNS
            .iter()
            .map(|(name, source)| Matcher::compile("biographical", name, source))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// The entity the question asks about, if it is biographical.
    /// `text` must be lower-cased and trimmed.
    pub fn entity<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns.iter().find_map(|p| {
            let entity = p.regex().captures(text)?.name("entity")?.as_str();
            is_specific_entity(entity).then_some(entity)
        })
    }

    pub fn is_biographical(&self, text: &str) -> bool {
        self.entity(text).is_some()
    }
}

fn is_specific_entity(entity: &str) -> bool {
    let tokens: Vec<&str> = words(entity).collect();
    if tokens.is_empty() || tokens.len() > MAX_ENTITY_WORDS {
        return false;
    }
    let lead = &tokens[0];
    if GENERIC_ENTITY_WORDS.contains(lead)
        || NON_NAME_LEADS.contains(lead)
        || GREETING_FILLER.contains(lead)
    {
        return false;
    }
    !tokens.iter().any(|t| SUPERLATIVE_WORDS.contains(t))
}

// ============================================================================
// Lexical Signals
// ============================================================================

const CONJUNCTION_PATTERN: &str =
    r"\b(?:and|or|but|while|whereas|versus|vs|also|as well as|then|plus|including)\b";

const SLANG_PATTERN: &str = r"\b(?:lol|lmao|rofl|u|ur|r|pls|plz|gonna|wanna|gotta|bruh|bro|dude|tho|idk|imo|tbh|smh|ngl|fr|goat|lowkey|highkey)\b|[!?]{2,}";

const FOLLOW_UP_PATTERN: &str = r"^(?:and|also|so|but)\b|^(?:what|how) about\b|\b(?:he|she|him|his|her|hers|they|them|their|theirs)\b|\bthat (?:guy|team|player)\b|^(?:same|again|more)\b";

/// Informal, follow-up and compounding cues. Compiled alongside the rule
/// tiers so a bad pattern fails at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalSignals {
    conjunctions: Matcher,
    slang: Matcher,
    follow_up: Matcher,
}

impl LexicalSignals {
    pub fn new() -> Result<Self> {
        Ok(Self {
            conjunctions: Matcher::compile("signals", "conjunctions", CONJUNCTION_PATTERN)?,
            slang: Matcher::compile("signals", "slang", SLANG_PATTERN)?,
            follow_up: Matcher::compile("signals", "follow_up", FOLLOW_UP_PATTERN)?,
        })
    }

    /// Conjunctions plus extra clause separators (`;`, second `?`, ...).
    pub fn compound_count(&self, text: &str) -> usize {
        let conjunctions = self.conjunctions.regex().find_iter(text).count();
        let semicolons = text.matches(';').count();
        let extra_questions = text.matches('?').count().saturating_sub(1);
        conjunctions + semicolons + extra_questions
    }

    pub fn is_noisy(&self, text: &str) -> bool {
        self.slang.is_match(text) || has_elongated_word(text)
    }

    pub fn is_follow_up(&self, text: &str) -> bool {
        self.follow_up.is_match(text)
    }
}

/// "sooo", "whyyy": three or more identical letters in a row.
fn has_elongated_word(text: &str) -> bool {
    let mut run = 0;
    let mut prev = None;
    for c in text.chars() {
        if c.is_alphabetic() && Some(c) == prev {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            run = 1;
        }
        prev = Some(c);
    }
    false
}

/// Lower-case words with surrounding punctuation removed.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_greetings() {
        let detector = GreetingDetector::new().unwrap();
        for text in [
            "hi",
            "hello!",
            "hey there",
            "thanks",
            "thank you so much!",
            "good morning",
            "good evening everyone",
            "bye",
            "see you later",
            "how are you?",
            "hi, how are you doing today?",
        ] {
            assert!(detector.is_greeting(text), "'{}' should be a greeting", text);
        }
    }

    #[test]
    fn test_greeting_with_request_is_not_greeting() {
        let detector = GreetingDetector::new().unwrap();
        for text in [
            "hi, who is the top scorer?",
            "hello can you show me lebron's stats",
            "thanks, now compare curry and durant",
            "good morning, how many points did jokic score",
            "hey what is a triple-double",
        ] {
            assert!(!detector.is_greeting(text), "'{}' is not a pure greeting", text);
        }
    }

    #[test]
    fn test_non_greeting_openers() {
        let detector = GreetingDetector::new().unwrap();
        assert!(!detector.is_greeting(""));
        assert!(!detector.is_greeting("who is lebron?"));
        assert!(!detector.is_greeting("highest scoring game ever"));
    }

    #[test]
    fn test_biographical_entities() {
        let detector = BiographicalDetector::new().unwrap();
        assert_eq!(detector.entity("who is lebron?"), Some("lebron"));
        assert_eq!(detector.entity("who's nikola jokic"), Some("nikola jokic"));
        assert_eq!(detector.entity("tell me about kobe bryant."), Some("kobe bryant"));
        assert_eq!(
            detector.entity("give me a profile of giannis"),
            Some("giannis")
        );
        assert!(detector.is_biographical("what do you know about steph curry?"));
    }

    #[test]
    fn test_biographical_excludes_generic_questions() {
        let detector = BiographicalDetector::new().unwrap();
        for text in [
            "who scored the most points?",
            "who is the best shooter in the league?",
            "who is better, curry or lebron?",
            "who's there?",
            "tell me about the history of the three point line in the nba",
            "who is leading the league in assists",
            "tell me about his assists",
            "who is he?",
            "who is injured on the lakers?",
            "tell me about their defense",
            "who is playing tonight",
            "who's coaching the celtics",
            "who was on the 1996 bulls",
        ] {
            assert!(!detector.is_biographical(text), "'{}' is not biographical", text);
        }
    }

    #[test]
    fn test_names_sharing_a_prefix_with_lead_words_still_match() {
        let detector = BiographicalDetector::new().unwrap();
        assert_eq!(detector.entity("who is patrick ewing?"), Some("patrick ewing"));
        assert_eq!(detector.entity("who is herb jones"), Some("herb jones"));
        assert_eq!(detector.entity("tell me about hedo turkoglu"), Some("hedo turkoglu"));
    }

    #[test]
    fn test_compound_count() {
        let signals = LexicalSignals::new().unwrap();
        assert_eq!(signals.compound_count("who is lebron"), 0);
        assert_eq!(signals.compound_count("points and rebounds"), 1);
        assert_eq!(signals.compound_count("who won? and why? and how?"), 4);
    }

    #[test]
    fn test_noisy_and_follow_up_signals() {
        let signals = LexicalSignals::new().unwrap();
        assert!(signals.is_noisy("yo who is the goat lol"));
        assert!(signals.is_noisy("whyyy did they lose"));
        assert!(signals.is_noisy("did he really score 70??"));
        assert!(!signals.is_noisy("who scored the most points"));

        assert!(signals.is_follow_up("what about his assists?"));
        assert!(signals.is_follow_up("and the celtics?"));
        assert!(!signals.is_follow_up("who scored the most points"));
    }
}
