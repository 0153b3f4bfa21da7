//! Follow-up resolution.
//!
//! Rewrites short conversational follow-ups ("what about his assists?") into
//! self-contained questions using the most recent entity of the
//! conversation, so the semantic store sees who the question is about.

use serde::{Deserialize, Serialize};

/// Openers of elliptical follow-ups ("and the celtics?").
const ELLIPSIS_OPENERS: &[&str] = &["what about ", "how about ", "and ", "also "];
const MAX_ELLIPSIS_WORDS: usize = 6;

const POSSESSIVE_PRONOUNS: &[&str] = &["his", "their", "its"];
const PERSONAL_PRONOUNS: &[&str] = &["he", "she", "they", "him", "them"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Most recent first
    pub entities: Vec<String>,
}

impl ConversationContext {
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.push_entity(entity);
        self
    }

    /// Move `entity` to the front, dropping an earlier mention of it.
    pub fn push_entity(&mut self, entity: impl Into<String>) {
        let entity = entity.into();
        let entity = entity.trim();
        if entity.is_empty() {
            return;
        }
        self.entities.retain(|e| !e.eq_ignore_ascii_case(entity));
        self.entities.insert(0, entity.to_string());
    }

    pub fn primary_entity(&self) -> Option<&str> {
        self.entities
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub text: String,
    pub changed: bool,
    pub note: Option<String>,
}

impl Resolution {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            changed: false,
            note: None,
        }
    }

    fn rewritten(text: String, note: String) -> Self {
        Self {
            text,
            changed: true,
            note: Some(note),
        }
    }
}

/// Replace the first third-person pronoun with the primary entity, or
/// prefix the entity onto an elliptical follow-up. Questions that already
/// name the entity are left alone.
pub fn resolve_follow_up(text: &str, ctx: &ConversationContext) -> Resolution {
    let Some(entity) = ctx.primary_entity() else {
        return Resolution::unchanged(text);
    };
    let lower = text.trim().to_lowercase();
    if lower.is_empty() || lower.contains(&entity.to_lowercase()) {
        return Resolution::unchanged(text);
    }

    let spans = word_spans(text);
    for (i, &(start, end)) in spans.iter().enumerate() {
        let word = text[start..end].to_lowercase();
        // "her" is possessive when another word follows it
        let possessive = POSSESSIVE_PRONOUNS.contains(&word.as_str())
            || (word == "her" && i + 1 < spans.len());
        let replacement = if possessive {
            format!("{}'s", entity)
        } else if PERSONAL_PRONOUNS.contains(&word.as_str()) || word == "her" {
            entity.to_string()
        } else {
            continue;
        };
        let resolved = format!("{}{}{}", &text[..start], replacement, &text[end..]);
        return Resolution::rewritten(
            resolved,
            format!("Resolved pronoun '{}' to '{}'", word, entity),
        );
    }

    let trimmed = text.trim();
    if trimmed.split_whitespace().count() <= MAX_ELLIPSIS_WORDS {
        for opener in ELLIPSIS_OPENERS {
            let opens = trimmed
                .get(..opener.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(opener));
            if opens {
                let rest = trimmed[opener.len()..].trim();
                if rest.is_empty() {
                    break;
                }
                return Resolution::rewritten(
                    format!("{} {}", entity, rest),
                    format!("Resolved ellipsis with '{}'", entity),
                );
            }
        }
    }

    Resolution::unchanged(text)
}

/// Byte ranges of alphabetic words (apostrophes kept inside words).
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        let in_word = c.is_alphabetic() || (c == '\'' && start.is_some());
        match (in_word, start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(entity: &str) -> ConversationContext {
        ConversationContext::default().with_entity(entity)
    }

    #[test]
    fn test_possessive_pronoun() {
        let result = resolve_follow_up("What about his assists?", &ctx("LeBron James"));
        assert!(result.changed);
        assert_eq!(result.text, "What about LeBron James's assists?");
    }

    #[test]
    fn test_personal_pronoun() {
        let result = resolve_follow_up("How many rings does he have?", &ctx("Kobe Bryant"));
        assert_eq!(result.text, "How many rings does Kobe Bryant have?");

        let result = resolve_follow_up("Why did they trade her?", &ctx("Sue Bird"));
        assert_eq!(result.text, "Why did Sue Bird trade her?");
    }

    #[test]
    fn test_her_at_end_is_object() {
        let result = resolve_follow_up("Who drafted her?", &ctx("Caitlin Clark"));
        assert_eq!(result.text, "Who drafted Caitlin Clark?");
    }

    #[test]
    fn test_pronoun_inside_word_untouched() {
        let result = resolve_follow_up(
            "What is the theory behind the offense?",
            &ctx("Phil Jackson"),
        );
        assert!(!result.changed);
    }

    #[test]
    fn test_ellipsis() {
        let result = resolve_follow_up("and the rebounds?", &ctx("Nikola Jokic"));
        assert!(result.changed);
        assert_eq!(result.text, "Nikola Jokic the rebounds?");
        assert!(result.note.unwrap().contains("ellipsis"));

        let result = resolve_follow_up("what about", &ctx("Nikola Jokic"));
        assert!(!result.changed);
    }

    #[test]
    fn test_no_context_or_already_explicit() {
        let empty = ConversationContext::default();
        let result = resolve_follow_up("What about his assists?", &empty);
        assert_eq!(result, Resolution::unchanged("What about his assists?"));

        let result = resolve_follow_up("What are LeBron's assists?", &ctx("LeBron"));
        assert!(!result.changed);
    }

    #[test]
    fn test_entity_recency() {
        let mut context = ConversationContext::default();
        context.push_entity("Magic Johnson");
        context.push_entity("Larry Bird");
        context.push_entity("magic johnson");
        assert_eq!(context.entities, vec!["magic johnson", "Larry Bird"]);
        assert_eq!(context.primary_entity(), Some("magic johnson"));
    }

    #[test]
    fn test_context_from_stored_entities() {
        let context: ConversationContext =
            serde_json::from_str(r#"{"entities": ["Tim Duncan", "Tony Parker"]}"#).unwrap();
        assert_eq!(context.primary_entity(), Some("Tim Duncan"));
        let result = resolve_follow_up("How many rings did he win?", &context);
        assert_eq!(result.text, "How many rings did Tim Duncan win?");
    }
}
