//! Pattern Rule Sets
//!
//! Three independently compiled tiers of literal patterns (statistical,
//! contextual, hybrid). Each rule is declarative data: a tier tag, a name and
//! a regex source. Tiers are compiled once into a [`RuleBook`] and shared
//! read-only afterwards.
//!
//! All patterns run against lower-cased, trimmed question text.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CourtsideError, Result};
use crate::types::{QueryType, RuleTally};

// ============================================================================
// Rule Tables
// ============================================================================

const STATISTICAL_RULES: &[(&str, &str)] = &[
    (
        "stat_categories",
        r"\b(?:points?|pts|rebounds?|boards|assists?|dimes|steals?|blocks?|turnovers?|fouls?)\b",
    ),
    (
        "per_game_abbreviations",
        r"\b(?:ppg|rpg|apg|spg|bpg|mpg|fga|fgm|3pt|3pm|fta)\b|\bper game\b",
    ),
    (
        "aggregations",
        r"\b(?:average|averages|averaged|avg|mean|median|total|totals|sum|career[- ]high|season[- ]high)\b",
    ),
    ("counting", r"\b(?:how many|how much|number of|count)\b"),
    (
        "rankings",
        r"\b(?:most|least|fewest|highest|lowest|top|leaders?|leading|led|rank(?:ed|ing|ings)?)\b",
    ),
    (
        "rates_and_percentages",
        r"\b(?:percentage|percent|pct|rate|ratio|efficiency|per 36|per 100)\b",
    ),
    (
        "stat_vocabulary",
        r"\b(?:stats?|statistics|stat ?line|numbers|record|standings|box score)\b",
    ),
    (
        "numeric_comparisons",
        r"\b(?:more than|less than|fewer than|greater than|at least|at most|over|under|above|below) \d",
    ),
    (
        "seasons",
        r"\b(?:19|20)\d{2}(?:-\d{2,4})?\b|\b(?:this|last|next) season\b",
    ),
    (
        "game_events",
        r"\b(?:scored|score|scoring|shots?|shooting|made|missed|attempts?|field goals?|three[- ]pointers?|threes|free throws?|minutes|games played|wins|losses)\b",
    ),
    (
        "head_to_head",
        r"\b(?:vs\.?|versus|compared? (?:to|with)|head[- ]to[- ]head)\b",
    ),
];

const CONTEXTUAL_RULES: &[(&str, &str)] = &[
    ("causal", r"\b(?:why|how come|reasons?|because|caused?|led to)\b"),
    (
        "explanatory",
        r"\b(?:explain|explained|describe|elaborate|discuss|walk me through)\b",
    ),
    (
        "strategy",
        r"\b(?:strateg(?:y|ies|ic)|tactics?|tactical|schemes?|game ?plan|philosophy|play ?style|style of play|approach)\b",
    ),
    (
        "history",
        r"\b(?:history|historical|legacy|story|stories|background|origins?|era|dynasty|evolution|evolved)\b",
    ),
    (
        "opinion",
        r"\b(?:opinion|think|thoughts|believe|feel|analysis|analy[sz]e|insights?|perspective|debate|overrated|underrated)\b",
    ),
    (
        "impact",
        r"\b(?:impact|influence|effect|role|importance|significance|contribution|mentality|leadership|chemistry)\b",
    ),
    (
        "curiosity",
        r"\b(?:interesting|fun facts?|trivia|anecdotes?|tell me something|tell me more)\b",
    ),
    (
        "rules_and_concepts",
        r"\b(?:rules?|regulations?|concepts?|meaning)\b|\bhow (?:does|do) .+ work\b",
    ),
    (
        "news_and_events",
        r"\b(?:injur(?:y|ies|ed)|trades?|traded|rumou?rs?|news|coach(?:es|ing)?|contracts?|draft(?:ed)?|retire(?:d|ment)?|rivalr(?:y|ies))\b",
    ),
    (
        "qualitative",
        r"\b(?:what makes|what made|known for)\b|\bso (?:good|great|effective|dominant|special)\b|\bbehind (?:it|the|their|his|her)\b",
    ),
];

const HYBRID_RULES: &[(&str, &str)] = &[
    (
        "ranking_with_explanation",
        r"\b(?:top|best|most|highest|leading|leaders?)\b.*\b(?:and|then|also)\b.*\b(?:explain|why|how (?:come|did|does|do)|describe|analy[sz]e|what makes)\b",
    ),
    (
        "compare_and_analyze",
        r"\b(?:compare|comparison|contrast)\b.*\b(?:and|then)\b.*\b(?:analy[sz]e|explain|discuss|why|describe)\b",
    ),
    (
        "numbers_with_narrative",
        r"\b(?:stats?|statistics|numbers|data)\b.*\b(?:and|with|plus)\b.*\b(?:context|story|narrative|analysis|explanation|why)\b",
    ),
    (
        "count_with_reason",
        r"\b(?:how many|how much)\b.*\band\b.*\b(?:why|how come|what caused)\b",
    ),
    (
        "explanation_backed_by_numbers",
        r"\b(?:explain|why|describe)\b.*\b(?:with|using|backed by|citing|including)\b.*\b(?:stats|statistics|numbers|data|averages)\b",
    ),
    (
        "performance_and_impact",
        r"\b(?:performance|production|output)\b.*\band\b.*\b(?:impact|role|influence|legacy)\b",
    ),
];

// ============================================================================
// Matcher / Rule
// ============================================================================

/// A named, compiled pattern that remembers its source text.
#[derive(Debug, Clone)]
pub struct Matcher {
    name: String,
    source: String,
    regex: Regex,
}

impl Matcher {
    /// Compile `source`; `set` names the owning collection for error reports.
    pub fn compile(set: &str, name: &str, source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|source| CourtsideError::InvalidPattern {
            set: set.to_string(),
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            source: source.to_string(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source
    }
}

impl Eq for Matcher {}

/// Declarative rule description, as found in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub tier: QueryType,
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub tier: QueryType,
    matcher: Matcher,
}

impl Rule {
    pub fn compile(tier: QueryType, name: &str, pattern: &str) -> Result<Self> {
        Ok(Self {
            tier,
            matcher: Matcher::compile(tier.as_str(), name, pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        self.matcher.name()
    }

    pub fn pattern(&self) -> &str {
        self.matcher.source()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    pub fn spec(&self) -> RuleSpec {
        RuleSpec {
            tier: self.tier,
            name: self.name().to_string(),
            pattern: self.pattern().to_string(),
        }
    }
}

// ============================================================================
// Rule Set
// ============================================================================

/// Ordered, append-only list of rules belonging to one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    tier: QueryType,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn compile(tier: QueryType, table: &[(&str, &str)]) -> Result<Self> {
        let rules = table
            .iter()
            .map(|(name, pattern)| Rule::compile(tier, name, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tier, rules })
    }

    pub fn builtin(tier: QueryType) -> Result<Self> {
        let table = match tier {
            QueryType::Statistical => STATISTICAL_RULES,
            QueryType::Contextual => CONTEXTUAL_RULES,
            QueryType::Hybrid => HYBRID_RULES,
        };
        Self::compile(tier, table)
    }

    /// Append a configured rule. Its tier must match this set.
    pub fn push(&mut self, spec: &RuleSpec) -> Result<()> {
        if spec.tier != self.tier {
            return Err(CourtsideError::InvalidConfig(format!(
                "rule '{}' targets {} but was added to the {} set",
                spec.name, spec.tier, self.tier
            )));
        }
        self.rules.push(Rule::compile(spec.tier, &spec.name, &spec.pattern)?);
        Ok(())
    }

    pub fn tier(&self) -> QueryType {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Names of every rule matching `text`, in rule order.
    pub fn matching<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.is_match(text))
            .map(|rule| rule.name())
    }

    /// Every matching rule counts once; a rule never counts twice.
    pub fn count_matches(&self, text: &str) -> usize {
        self.matching(text).count()
    }
}

// ============================================================================
// Rule Book
// ============================================================================

/// The three compiled tiers. Built once at startup, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    statistical: RuleSet,
    contextual: RuleSet,
    hybrid: RuleSet,
}

impl RuleBook {
    pub fn new() -> Result<Self> {
        Self::with_extra_rules(&[])
    }

    /// Builtin tiers plus configured rules appended to the tier each names.
    pub fn with_extra_rules(extra: &[RuleSpec]) -> Result<Self> {
        let mut book = Self {
            statistical: RuleSet::builtin(QueryType::Statistical)?,
            contextual: RuleSet::builtin(QueryType::Contextual)?,
            hybrid: RuleSet::builtin(QueryType::Hybrid)?,
        };

        for spec in extra {
            book.tier_mut(spec.tier).push(spec)?;
        }

        for set in [&book.statistical, &book.contextual, &book.hybrid] {
            if set.is_empty() {
                return Err(CourtsideError::EmptyRuleSet(set.tier().to_string()));
            }
        }

        tracing::debug!(
            statistical = book.statistical.len(),
            contextual = book.contextual.len(),
            hybrid = book.hybrid.len(),
            "[RuleBook] Compiled rule tiers"
        );

        Ok(book)
    }

    pub fn tier(&self, tier: QueryType) -> &RuleSet {
        match tier {
            QueryType::Statistical => &self.statistical,
            QueryType::Contextual => &self.contextual,
            QueryType::Hybrid => &self.hybrid,
        }
    }

    fn tier_mut(&mut self, tier: QueryType) -> &mut RuleSet {
        match tier {
            QueryType::Statistical => &mut self.statistical,
            QueryType::Contextual => &mut self.contextual,
            QueryType::Hybrid => &mut self.hybrid,
        }
    }

    /// Count matches in every tier, hybrid first.
    pub fn tally(&self, text: &str) -> RuleTally {
        let mut tally = RuleTally::default();
        for tier in [QueryType::Hybrid, QueryType::Statistical, QueryType::Contextual] {
            for name in self.tier(tier).matching(text) {
                match tier {
                    QueryType::Statistical => tally.statistical += 1,
                    QueryType::Contextual => tally.contextual += 1,
                    QueryType::Hybrid => tally.hybrid += 1,
                }
                tally.matched.push(name.to_string());
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tiers_compile_and_are_nonempty() {
        let book = RuleBook::new().unwrap();
        for tier in QueryType::ALL {
            assert!(!book.tier(tier).is_empty(), "{} tier is empty", tier);
            assert!(book.tier(tier).iter().all(|r| r.tier == tier));
        }
    }

    #[test]
    fn test_construction_is_idempotent() {
        let a = RuleBook::new().unwrap();
        let b = RuleBook::new().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rule_names_unique_within_tier() {
        let book = RuleBook::new().unwrap();
        for tier in QueryType::ALL {
            let mut names: Vec<&str> = book.tier(tier).iter().map(|r| r.name()).collect();
            let before = names.len();
            names.sort();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate rule name in {}", tier);
        }
    }

    #[test]
    fn test_counts_every_matching_rule() {
        let book = RuleBook::new().unwrap();
        let stats = book.tier(QueryType::Statistical);
        let matched: Vec<&str> = stats.matching("who scored the most points").collect();
        assert_eq!(matched, vec!["stat_categories", "rankings", "game_events"]);
        assert_eq!(stats.count_matches("who scored the most points"), 3);
    }

    #[test]
    fn test_statistical_inventory() {
        let book = RuleBook::new().unwrap();
        let stats = book.tier(QueryType::Statistical);
        let cases = [
            ("how many rebounds", "counting"),
            ("his ppg this year", "per_game_abbreviations"),
            ("career-high in assists", "aggregations"),
            ("three point percentage", "rates_and_percentages"),
            ("the lakers record", "stat_vocabulary"),
            ("games with more than 30 points", "numeric_comparisons"),
            ("during the 2015-16 season", "seasons"),
            ("curry vs thompson", "head_to_head"),
        ];
        for (text, rule) in cases {
            assert!(
                stats.matching(text).any(|name| name == rule),
                "expected '{}' to match {}",
                text,
                rule
            );
        }
    }

    #[test]
    fn test_contextual_inventory() {
        let book = RuleBook::new().unwrap();
        let ctx = book.tier(QueryType::Contextual);
        let cases = [
            ("why did they lose", "causal"),
            ("describe his game", "explanatory"),
            ("the triangle offense philosophy", "strategy"),
            ("the celtics dynasty", "history"),
            ("is he overrated", "opinion"),
            ("his role on the team", "impact"),
            ("tell me something fun", "curiosity"),
            ("how does the shot clock work", "rules_and_concepts"),
            ("any injury news", "news_and_events"),
            ("what makes him special", "qualitative"),
        ];
        for (text, rule) in cases {
            assert!(
                ctx.matching(text).any(|name| name == rule),
                "expected '{}' to match {}",
                text,
                rule
            );
        }
    }

    #[test]
    fn test_hybrid_inventory() {
        let book = RuleBook::new().unwrap();
        let hybrid = book.tier(QueryType::Hybrid);
        assert!(hybrid.count_matches("top 5 scorers and explain why") > 0);
        assert!(hybrid.count_matches("compare jordan and lebron and analyze their legacy") > 0);
        assert!(hybrid.count_matches("explain his defense using stats") > 0);
        assert_eq!(hybrid.count_matches("who scored the most points"), 0);
        assert_eq!(hybrid.count_matches("why is the triangle offense famous"), 0);
        assert!(hybrid.count_matches("top 3 passers and how did they improve") > 0);
        assert_eq!(
            hybrid.count_matches("top 5 scorers and how many games did they play"),
            0
        );
    }

    #[test]
    fn test_extra_rule_appended_to_tier() {
        let extra = vec![RuleSpec {
            tier: QueryType::Statistical,
            name: "plus_minus_query".to_string(),
            pattern: r"\bnet points\b".to_string(),
        }];
        let book = RuleBook::with_extra_rules(&extra).unwrap();
        let stats = book.tier(QueryType::Statistical);
        assert_eq!(stats.len(), STATISTICAL_RULES.len() + 1);
        assert_eq!(stats.iter().last().map(|r| r.spec()), Some(extra[0].clone()));
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let extra = vec![RuleSpec {
            tier: QueryType::Contextual,
            name: "broken".to_string(),
            pattern: r"(unclosed".to_string(),
        }];
        match RuleBook::with_extra_rules(&extra) {
            Err(CourtsideError::InvalidPattern { set, name, .. }) => {
                assert_eq!(set, "CONTEXTUAL");
                assert_eq!(name, "broken");
            }
            other => panic!("expected InvalidPattern, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_tally_orders_hybrid_first() {
        let book = RuleBook::new().unwrap();
        let tally = book.tally("who has the most points and explain why");
        assert!(tally.hybrid >= 1);
        assert_eq!(tally.matched[0], "ranking_with_explanation");
        assert_eq!(
            tally.matched.len(),
            tally.hybrid + tally.statistical + tally.contextual
        );
    }
}
