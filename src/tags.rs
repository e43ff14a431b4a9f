//! Machine-readable tags the Game Master is told to embed in its replies.
//!
//! The instruction templates spell these tokens out verbatim; the helpers here
//! let the surrounding application pull them back out of a reply.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub const COMBAT_STATUS_OPEN: &str = "[COMBAT_STATUS]";
pub const COMBAT_STATUS_CLOSE: &str = "[/COMBAT_STATUS]";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum CombatStatus {
    Healthy,
    Injured,
    Bloodied,
    #[serde(rename = "Near Death")]
    #[strum(serialize = "Near Death")]
    NearDeath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub status: CombatStatus,
}

/// Payload of a `[COMBAT_STATUS]` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    pub combatants: Vec<Combatant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum ControlMarker {
    #[strum(serialize = "[CHARACTER_CREATION_COMPLETE]")]
    CharacterCreationComplete,
    #[strum(serialize = "[WORLD_CREATION_COMPLETE]")]
    WorldCreationComplete,
    /// Followed by the campaign title on the next non-empty line.
    #[strum(serialize = "[SETUP_COMPLETE]")]
    SetupComplete,
    #[strum(serialize = "[GENERATE_QUICK_START]")]
    GenerateQuickStart,
}

impl ControlMarker {
    pub fn token(self) -> &'static str {
        self.into()
    }
}

/// A model reply split into player-facing prose and side-channel data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReply {
    pub narrative: String,
    pub combat: Option<CombatReport>,
    pub markers: Vec<ControlMarker>,
    pub title: Option<String>,
}

impl ParsedReply {
    pub fn has_marker(&self, marker: ControlMarker) -> bool {
        self.markers.contains(&marker)
    }
}

pub fn parse_reply(text: &str) -> ParsedReply {
    let mut narrative = text.to_string();
    let combat = extract_combat(&mut narrative);
    let (markers, title) = extract_markers(&mut narrative);

    ParsedReply {
        narrative: narrative.trim().to_string(),
        combat,
        markers,
        title,
    }
}

// Removes every combat tag and keeps the last well-formed report.
fn extract_combat(narrative: &mut String) -> Option<CombatReport> {
    let mut report = None;
    while let Some(start) = narrative.find(COMBAT_STATUS_OPEN) {
        let body_start = start + COMBAT_STATUS_OPEN.len();
        let (body_end, tag_end) = match narrative[body_start..].find(COMBAT_STATUS_CLOSE) {
            Some(offset) => (
                body_start + offset,
                body_start + offset + COMBAT_STATUS_CLOSE.len(),
            ),
            None => (narrative.len(), narrative.len()),
        };

        let body = narrative[body_start..body_end].trim();
        match serde_json::from_str::<CombatReport>(strip_code_fence(body)) {
            Ok(parsed) => report = Some(parsed),
            Err(e) => log::warn!("Dropping malformed combat status: {e}"),
        }
        narrative.replace_range(start..tag_end, "");
    }
    report
}

fn extract_markers(narrative: &mut String) -> (Vec<ControlMarker>, Option<String>) {
    let mut found: Vec<(usize, ControlMarker)> = ControlMarker::iter()
        .filter_map(|marker| narrative.find(marker.token()).map(|pos| (pos, marker)))
        .collect();
    found.sort_by_key(|(position, _)| *position);

    let mut title = None;
    if let Some(position) = narrative.find(ControlMarker::SetupComplete.token()) {
        let after = position + ControlMarker::SetupComplete.token().len();
        let mut consumed = 0;
        for line in narrative[after..].split_inclusive('\n') {
            consumed += line.len();
            let line = line.trim().trim_matches(|c| c == '#' || c == '*').trim();
            let is_marker = ControlMarker::iter().any(|marker| marker.token() == line);
            if !line.is_empty() && !is_marker {
                title = Some(line.to_string());
                break;
            }
        }
        narrative.replace_range(position..after + consumed, "");
    }

    for (_, marker) in &found {
        *narrative = narrative.replace(marker.token(), "");
    }

    (found.into_iter().map(|(_, marker)| marker).collect(), title)
}

/// Strips a surrounding markdown code fence, if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the language tag on the opening fence line.
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim().contains(['{', '[']) => inner[newline + 1..].trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn combat_status_is_extracted_and_removed() {
        let reply = "The ghoul staggers back.\n[COMBAT_STATUS]{\"combatants\":[{\"name\":\"Ghoul\",\"status\":\"Near Death\"},{\"name\":\"Kestrel\",\"status\":\"Injured\"}]}[/COMBAT_STATUS]\nWhat do you do?";

        let parsed = parse_reply(reply);

        let combat = parsed.combat.expect("combat report");
        assert_eq!(combat.combatants.len(), 2);
        assert_eq!(combat.combatants[0].status, CombatStatus::NearDeath);
        assert_eq!(combat.combatants[1].status, CombatStatus::Injured);
        assert!(!parsed.narrative.contains("COMBAT_STATUS"));
        assert!(parsed.narrative.starts_with("The ghoul staggers back."));
        assert!(parsed.narrative.ends_with("What do you do?"));
    }

    #[test]
    fn malformed_combat_json_is_dropped() {
        let parsed = parse_reply("Steel rings.[COMBAT_STATUS]{oops}[/COMBAT_STATUS]");
        assert_eq!(parsed.combat, None);
        assert_eq!(parsed.narrative, "Steel rings.");
    }

    #[test]
    fn unknown_status_value_is_rejected() {
        let parsed = parse_reply(
            r#"[COMBAT_STATUS]{"combatants":[{"name":"X","status":"Dead"}]}[/COMBAT_STATUS]"#,
        );
        assert_eq!(parsed.combat, None);
    }

    #[test]
    fn setup_complete_carries_the_title() {
        let reply = "Your tale is ready.\n[CHARACTER_CREATION_COMPLETE]\n[SETUP_COMPLETE]\n\n## The Ashen Crown\nThe story begins at dusk.";

        let parsed = parse_reply(reply);

        assert_eq!(
            parsed.markers,
            vec![
                ControlMarker::CharacterCreationComplete,
                ControlMarker::SetupComplete
            ]
        );
        assert_eq!(parsed.title.as_deref(), Some("The Ashen Crown"));
        assert!(!parsed.narrative.contains("Ashen Crown"));
        assert!(parsed.narrative.contains("The story begins at dusk."));
    }

    #[test]
    fn title_skips_markers_after_setup_complete() {
        let parsed = parse_reply("[SETUP_COMPLETE]\n[WORLD_CREATION_COMPLETE]\nThe Ashen Crown");

        assert_eq!(parsed.title.as_deref(), Some("The Ashen Crown"));
        assert_eq!(
            parsed.markers,
            vec![ControlMarker::SetupComplete, ControlMarker::WorldCreationComplete]
        );
        assert_eq!(parsed.narrative, "");
    }

    #[test]
    fn plain_text_passes_through() {
        let parsed = parse_reply("  Nothing special happens.  ");
        assert_eq!(parsed.narrative, "Nothing special happens.");
        assert!(parsed.markers.is_empty());
        assert!(!parsed.has_marker(ControlMarker::GenerateQuickStart));
    }

    #[test]
    fn status_names_round_trip_through_strum() {
        for status in CombatStatus::iter() {
            assert_eq!(CombatStatus::from_str(&status.to_string()).ok(), Some(status));
        }
        assert_eq!(CombatStatus::NearDeath.to_string(), "Near Death");
    }

    #[test]
    fn marker_tokens_are_bracketed() {
        assert_eq!(ControlMarker::SetupComplete.token(), "[SETUP_COMPLETE]");
        for marker in ControlMarker::iter() {
            assert_eq!(marker.to_string(), marker.token());
            assert!(marker.token().starts_with('[') && marker.token().ends_with(']'));
        }
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```[1]```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
