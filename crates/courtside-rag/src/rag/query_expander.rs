//! Query Expansion
//!
//! Splices domain synonyms onto a question before it reaches the semantic
//! store. Four dictionaries are consulted in a fixed order regardless of the
//! question's category. Each hit contributes up to the classifier's expansion
//! budget of variants not already present, so several hits can add more terms
//! than the budget in total.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MAX_EXPANSIONS;
use crate::rag::glossary::contains_term;
use crate::types::QueryCategory;

// ============================================================================
// Dictionary Tables
// ============================================================================

const STAT_ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("ppg", &["points per game", "scoring average", "points"]),
    ("rpg", &["rebounds per game", "rebounding average", "rebounds"]),
    ("apg", &["assists per game", "assists", "playmaking"]),
    ("spg", &["steals per game", "steals"]),
    ("bpg", &["blocks per game", "blocked shots", "blocks"]),
    ("mpg", &["minutes per game", "minutes"]),
    ("fg%", &["field goal percentage", "shooting percentage"]),
    ("3p%", &["three point percentage", "3-point shooting"]),
    ("ft%", &["free throw percentage", "free throws"]),
    ("ts%", &["true shooting percentage", "shooting efficiency"]),
    ("vorp", &["value over replacement player"]),
    ("bpm", &["box plus/minus", "plus-minus"]),
    ("ws", &["win shares"]),
    ("3pt", &["three pointers", "threes", "3-pointers"]),
    ("mvp", &["most valuable player", "mvp award"]),
    ("dpoy", &["defensive player of the year", "defensive award"]),
    ("roy", &["rookie of the year"]),
];

const TEAM_NAMES: &[(&str, &[&str])] = &[
    ("lakers", &["los angeles lakers", "la lakers", "lal"]),
    ("clippers", &["los angeles clippers", "la clippers", "lac"]),
    ("celtics", &["boston celtics", "boston", "bos"]),
    ("warriors", &["golden state warriors", "golden state", "gsw", "dubs"]),
    ("bulls", &["chicago bulls", "chicago", "chi"]),
    ("heat", &["miami heat", "miami", "mia"]),
    ("knicks", &["new york knicks", "new york", "nyk"]),
    ("nets", &["brooklyn nets", "brooklyn", "bkn"]),
    ("spurs", &["san antonio spurs", "san antonio", "sas"]),
    ("mavericks", &["dallas mavericks", "dallas", "mavs"]),
    ("mavs", &["dallas mavericks", "mavericks", "dallas"]),
    ("nuggets", &["denver nuggets", "denver", "den"]),
    ("bucks", &["milwaukee bucks", "milwaukee", "mil"]),
    ("suns", &["phoenix suns", "phoenix", "phx"]),
    ("sixers", &["philadelphia 76ers", "76ers", "philadelphia"]),
    ("76ers", &["philadelphia 76ers", "sixers", "philadelphia"]),
    ("raptors", &["toronto raptors", "toronto", "tor"]),
    ("thunder", &["oklahoma city thunder", "okc"]),
    ("rockets", &["houston rockets", "houston", "hou"]),
    ("timberwolves", &["minnesota timberwolves", "wolves", "minnesota"]),
    ("pistons", &["detroit pistons", "detroit", "det"]),
    ("jazz", &["utah jazz", "utah"]),
    ("grizzlies", &["memphis grizzlies", "memphis", "grizz"]),
    ("cavaliers", &["cleveland cavaliers", "cavs", "cleveland"]),
    ("cavs", &["cleveland cavaliers", "cavaliers", "cleveland"]),
];

const PLAYER_NICKNAMES: &[(&str, &[&str])] = &[
    ("lebron", &["lebron james", "king james", "lbj"]),
    ("king james", &["lebron james", "lebron"]),
    ("steph", &["stephen curry", "steph curry", "curry"]),
    ("curry", &["stephen curry", "steph"]),
    ("kd", &["kevin durant", "durant"]),
    ("durant", &["kevin durant", "kd"]),
    ("giannis", &["giannis antetokounmpo", "greek freak"]),
    ("greek freak", &["giannis antetokounmpo", "giannis"]),
    ("mj", &["michael jordan", "jordan"]),
    ("jordan", &["michael jordan", "mj"]),
    ("kobe", &["kobe bryant", "black mamba"]),
    ("black mamba", &["kobe bryant", "kobe"]),
    ("shaq", &["shaquille o'neal", "shaquille"]),
    ("jokic", &["nikola jokic", "joker"]),
    ("joker", &["nikola jokic", "jokic"]),
    ("luka", &["luka doncic", "doncic"]),
    ("kawhi", &["kawhi leonard", "the klaw"]),
    ("ad", &["anthony davis", "the brow"]),
    ("the brow", &["anthony davis"]),
    ("cp3", &["chris paul"]),
    ("dame", &["damian lillard", "lillard"]),
    ("embiid", &["joel embiid", "the process"]),
    ("magic", &["magic johnson", "earvin johnson"]),
    ("bird", &["larry bird", "larry legend"]),
    ("wemby", &["victor wembanyama", "wembanyama"]),
];

const GENERAL_SYNONYMS: &[(&str, &[&str])] = &[
    ("score", &["points", "scoring"]),
    ("scorer", &["points leader", "scoring leader"]),
    ("scoring", &["points", "offense"]),
    ("rebounding", &["rebounds", "boards"]),
    ("boards", &["rebounds", "rebounding"]),
    ("dimes", &["assists", "passing"]),
    ("passing", &["assists", "playmaking"]),
    ("defense", &["defensive", "steals", "blocks"]),
    ("offense", &["offensive", "scoring"]),
    ("shooter", &["shooting", "three point shooting"]),
    ("playoffs", &["postseason", "playoff"]),
    ("postseason", &["playoffs"]),
    ("finals", &["championship", "nba finals"]),
    ("championship", &["title", "finals", "ring"]),
    ("rookie", &["first-year player", "rookie season"]),
    ("coach", &["head coach", "coaching"]),
    ("goat", &["greatest of all time", "best player ever"]),
    ("clutch", &["late game", "fourth quarter"]),
    ("dunk", &["slam dunk", "dunking"]),
    ("injury", &["injured", "injury report"]),
    ("trade", &["traded", "transaction"]),
];

// ============================================================================
// Synonym Dictionaries
// ============================================================================

/// Canonical term and its ordered variants. Earlier variants win when the
/// budget is tight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub term: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryKind {
    StatAbbreviations,
    TeamNames,
    PlayerNicknames,
    GeneralSynonyms,
}

impl DictionaryKind {
    pub const ALL: [DictionaryKind; 4] = [
        DictionaryKind::StatAbbreviations,
        DictionaryKind::TeamNames,
        DictionaryKind::PlayerNicknames,
        DictionaryKind::GeneralSynonyms,
    ];

    fn table(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            DictionaryKind::StatAbbreviations => STAT_ABBREVIATIONS,
            DictionaryKind::TeamNames => TEAM_NAMES,
            DictionaryKind::PlayerNicknames => PLAYER_NICKNAMES,
            DictionaryKind::GeneralSynonyms => GENERAL_SYNONYMS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymDictionary {
    pub kind: DictionaryKind,
    pub entries: Vec<SynonymEntry>,
}

impl SynonymDictionary {
    pub fn builtin(kind: DictionaryKind) -> Self {
        Self::from_table(kind, kind.table())
    }

    pub fn from_table(kind: DictionaryKind, table: &[(&str, &[&str])]) -> Self {
        let entries = table
            .iter()
            .map(|(term, variants)| SynonymEntry {
                term: term.to_string(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            })
            .collect();
        Self { kind, entries }
    }

    /// Entries whose term occurs in `text`, in table order.
    pub fn hits<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a SynonymEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| contains_term(text, &entry.term))
    }
}

// ============================================================================
// Query Expander
// ============================================================================

#[derive(Debug, Clone)]
pub struct QueryExpander {
    dictionaries: Arc<Vec<SynonymDictionary>>,
}

impl QueryExpander {
    pub fn new() -> Self {
        Self::with_dictionaries(
            DictionaryKind::ALL
                .iter()
                .map(|kind| SynonymDictionary::builtin(*kind))
                .collect(),
        )
    }

    pub fn with_dictionaries(dictionaries: Vec<SynonymDictionary>) -> Self {
        Self {
            dictionaries: Arc::new(dictionaries),
        }
    }

    pub fn dictionaries(&self) -> &[SynonymDictionary] {
        &self.dictionaries
    }

    /// Terms `expand` would append, in first-seen order. Every dictionary hit
    /// contributes at most `max_expansions` (capped at [`MAX_EXPANSIONS`])
    /// variants that are neither in the text nor added by an earlier hit.
    pub fn expansions_for(&self, text: &str, max_expansions: usize) -> Vec<String> {
        let budget = max_expansions.min(MAX_EXPANSIONS);
        let lower = text.to_lowercase();
        let mut added: Vec<String> = Vec::new();

        for dictionary in self.dictionaries.iter() {
            for entry in dictionary.hits(&lower) {
                let fresh = entry
                    .variants
                    .iter()
                    .filter(|v| !contains_term(&lower, v) && !added.contains(*v))
                    .take(budget)
                    .cloned()
                    .collect::<Vec<_>>();
                added.extend(fresh);
            }
        }

        added
    }

    /// Original text followed by the added terms, space-joined. Returns the
    /// text unchanged when nothing applies.
    pub fn expand(&self, text: &str, max_expansions: usize, category: QueryCategory) -> String {
        let added = self.expansions_for(text, max_expansions);
        if added.is_empty() {
            return text.to_string();
        }

        tracing::debug!(
            category = %category,
            budget = max_expansions,
            added = ?added,
            "[QueryExpander] Expanded query"
        );

        format!("{} {}", text.trim_end(), added.join(" "))
    }
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviation_expansion() {
        let expander = QueryExpander::new();
        let expanded = expander.expand("Curry ppg this year", 2, QueryCategory::Simple);
        assert!(expanded.starts_with("Curry ppg this year "));
        assert!(expanded.contains("points per game"));
    }

    #[test]
    fn test_budget_applies_per_dictionary_hit() {
        let expander = QueryExpander::new();
        assert_eq!(
            expander.expansions_for("lebron ppg", 2),
            vec![
                "points per game".to_string(),
                "scoring average".to_string(),
                "lebron james".to_string(),
                "king james".to_string(),
            ]
        );

        let one = expander.expansions_for("lakers vs celtics", 1);
        assert_eq!(
            one,
            vec!["los angeles lakers".to_string(), "boston celtics".to_string()]
        );

        let added = expander.expansions_for("lakers vs celtics rebounding ppg", 3);
        // abbreviations are consulted first
        assert_eq!(added[0], "points per game");
        assert!(added.len() > 3);
        assert!(added.contains(&"boards".to_string()));
    }

    #[test]
    fn test_budget_is_capped_at_maximum() {
        let dictionary = SynonymDictionary::from_table(
            DictionaryKind::PlayerNicknames,
            &[(
                "wilt",
                &[
                    "wilt chamberlain",
                    "the big dipper",
                    "wilt the stilt",
                    "the stilt",
                    "dipper",
                    "big dipper",
                    "goliath",
                ],
            )],
        );
        let expander = QueryExpander::with_dictionaries(vec![dictionary]);
        let added = expander.expansions_for("wilt 100 point game", 50);
        assert_eq!(added.len(), MAX_EXPANSIONS);
        assert_eq!(added[0], "wilt chamberlain");
    }

    #[test]
    fn test_existing_terms_not_repeated() {
        let expander = QueryExpander::new();
        let added = expander.expansions_for("how many points per game does steph curry average", 5);
        assert!(!added.iter().any(|t| t == "steph curry" || t == "curry"));
        assert!(added.contains(&"stephen curry".to_string()));

        let mut deduped = added.clone();
        deduped.dedup();
        assert_eq!(deduped, added);
    }

    #[test]
    fn test_first_seen_order_dedup() {
        // "mavs" and "mavericks" share variants; each is only added once
        let expander = QueryExpander::new();
        let added = expander.expansions_for("mavs mavericks", 5);
        let unique: std::collections::HashSet<&String> = added.iter().collect();
        assert_eq!(unique.len(), added.len());
        assert_eq!(added[0], "dallas mavericks");
    }

    #[test]
    fn test_category_does_not_gate_dictionaries() {
        let expander = QueryExpander::new();
        let text = "best clutch shooter";
        let simple = expander.expand(text, 2, QueryCategory::Simple);
        assert!(simple.contains("late game"));
        for category in QueryCategory::ALL {
            assert_eq!(expander.expand(text, 2, category), simple);
        }
    }

    #[test]
    fn test_no_hits_returns_original() {
        let expander = QueryExpander::new();
        let text = "Tell me something interesting about basketball";
        assert_eq!(expander.expand(text, 5, QueryCategory::Simple), text);
    }

    #[test]
    fn test_terms_respect_word_boundaries() {
        let expander = QueryExpander::new();
        // "ad" inside "made", "heat" inside "wheat"
        let added = expander.expansions_for("shots made near the wheat field", 5);
        assert!(added.is_empty());
    }

    #[test]
    fn test_custom_dictionary() {
        let dictionary = SynonymDictionary::from_table(
            DictionaryKind::TeamNames,
            &[("sonics", &["seattle supersonics", "seattle"])],
        );
        let expander = QueryExpander::with_dictionaries(vec![dictionary]);
        assert_eq!(
            expander.expand("Sonics history", 5, QueryCategory::Simple),
            "Sonics history seattle supersonics seattle"
        );
    }
}
