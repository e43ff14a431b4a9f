//! Ready-made characters the model generates when the player skips creation.
//!
//! The prompt embeds the JSON Schema derived from these types, so the
//! instructed format and [`parse_quick_start_batch`] cannot drift apart.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tags::strip_code_fence;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Attributes {
    #[schemars(range(min = 8, max = 18))]
    pub strength: u8,
    #[schemars(range(min = 8, max = 18))]
    pub dexterity: u8,
    #[schemars(range(min = 8, max = 18))]
    pub constitution: u8,
    #[schemars(range(min = 8, max = 18))]
    pub intelligence: u8,
    #[schemars(range(min = 8, max = 18))]
    pub wisdom: u8,
    #[schemars(range(min = 8, max = 18))]
    pub charisma: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Skill {
    pub name: String,
    /// Proficiency bonus added to rolls using this skill.
    #[schemars(range(min = 1, max = 5))]
    pub rank: u8,
}

/// One pre-generated player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuickStartCharacter {
    /// Full name, optionally with an epithet.
    pub name: String,
    /// One-line concept, e.g. "disgraced knight turned smuggler".
    pub concept: String,
    /// Two or three sentences of history.
    pub background: String,
    pub attributes: Attributes,
    pub skills: Vec<Skill>,
    pub equipment: Vec<String>,
    /// One sentence pulling the character into an adventure.
    pub hook: String,
}

/// Pretty-printed JSON Schema of a quick-start batch.
pub fn schema_json() -> String {
    let schema = schemars::schema_for!(Vec<QuickStartCharacter>);
    format!("{:#}", schema.as_value())
}

/// Parses the model's reply to the quick-start instruction. Tolerates a
/// markdown fence or stray prose around the JSON array.
pub fn parse_quick_start_batch(text: &str) -> Result<Vec<QuickStartCharacter>, serde_json::Error> {
    let body = strip_code_fence(text);
    let body = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    };
    serde_json::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"[
        {
            "name": "Mara Vell",
            "concept": "exiled cartographer",
            "background": "Drew the maps that doomed a city. Now she draws only for herself.",
            "attributes": {"strength": 9, "dexterity": 14, "constitution": 11, "intelligence": 16, "wisdom": 13, "charisma": 10},
            "skills": [{"name": "Navigation", "rank": 3}, {"name": "Stealth", "rank": 2}],
            "equipment": ["brass compass", "ink and vellum", "short sword"],
            "hook": "A stranger pays her to map a valley that does not exist."
        }
    ]"#;

    #[test]
    fn schema_describes_every_field() {
        let schema = schema_json();
        for field in [
            "name",
            "concept",
            "background",
            "attributes",
            "skills",
            "equipment",
            "hook",
            "charisma",
            "rank",
        ] {
            assert!(schema.contains(&format!("\"{field}\"")), "{field} missing");
        }
        assert_eq!(schema, schema_json());
    }

    #[test]
    fn parses_a_bare_batch() {
        let batch = parse_quick_start_batch(BATCH).expect("batch");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "Mara Vell");
        assert_eq!(batch[0].attributes.intelligence, 16);
        assert_eq!(batch[0].skills[0].rank, 3);
    }

    #[test]
    fn parses_a_fenced_batch_with_prose() {
        let reply = format!("Here are your heroes:\n```json\n{BATCH}\n```\nEnjoy!");
        let batch = parse_quick_start_batch(&reply).expect("batch");
        assert_eq!(batch[0].hook, "A stranger pays her to map a valley that does not exist.");
    }

    #[test]
    fn missing_fields_are_an_error() {
        assert!(parse_quick_start_batch(r#"[{"name": "Nobody"}]"#).is_err());
        assert!(parse_quick_start_batch("no json at all").is_err());
    }
}
