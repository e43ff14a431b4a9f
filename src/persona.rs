use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::templates::{self, ProtocolVersion};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    Purist,
    Storyteller,
    Cinematic,
}

/// A Game Master style, offered to the player at the start of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub id: PersonaId,
    pub name: &'static str,
    pub description: &'static str,
}

impl Persona {
    /// Full play instruction for this persona, from the active template library.
    pub fn instruction(&self, password: &str, version: ProtocolVersion) -> String {
        templates::play_instruction(self.id, password, version)
    }
}

static PERSONAS: [Persona; 3] = [
    Persona {
        id: PersonaId::Purist,
        name: "The Purist",
        description: "Rules as written, honest dice, real danger. Every resource counts.",
    },
    Persona {
        id: PersonaId::Storyteller,
        name: "The Storyteller",
        description: "Character drama first. Failure twists the plot instead of ending it.",
    },
    Persona {
        id: PersonaId::Cinematic,
        name: "The Director",
        description: "Fast, loud and stylish. Bold moves are rewarded.",
    },
];

/// Personas in display order.
pub fn personas() -> &'static [Persona] {
    &PERSONAS
}

pub fn find(id: PersonaId) -> &'static Persona {
    PERSONAS
        .iter()
        .find(|p| p.id == id)
        .unwrap_or(&PERSONAS[0])
}

pub fn find_by_id(id: &str) -> Option<&'static Persona> {
    id.parse().ok().map(find)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_id_has_exactly_one_persona() {
        for id in PersonaId::iter() {
            assert_eq!(personas().iter().filter(|p| p.id == id).count(), 1);
            assert_eq!(find(id).id, id);
        }
        assert_eq!(personas().len(), PersonaId::iter().count());
    }

    #[test]
    fn ids_parse_from_lowercase_strings() {
        assert_eq!(find_by_id("purist").map(|p| p.id), Some(PersonaId::Purist));
        assert_eq!(find_by_id("Storyteller").map(|p| p.id), Some(PersonaId::Storyteller));
        assert!(find_by_id("bard").is_none());
        assert_eq!(PersonaId::Cinematic.to_string(), "cinematic");
    }

    #[test]
    fn registry_order_is_stable() {
        let ids: Vec<_> = personas().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, ["purist", "storyteller", "cinematic"]);
    }
}
