//! Instruction text sent to the model as the system prompt.
//!
//! Template content is data: the built-in texts live under `assets/templates`
//! and any of them can be replaced from a directory at runtime. Composition is
//! plain concatenation, so identical inputs always give identical text.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::error::TemplateError;
use crate::persona::PersonaId;
use crate::quick_start;
use crate::tags::{COMBAT_STATUS_CLOSE, COMBAT_STATUS_OPEN, ControlMarker};

pub const PASSWORD_PLACEHOLDER: &str = "{{PASSWORD}}";
pub const VERSION_PLACEHOLDER: &str = "{{PROTOCOL_VERSION}}";
pub const SCHEMA_PLACEHOLDER: &str = "{{SCHEMA}}";

/// Identifies the silent world-simulation instruction.
pub const SILENT_SIMULATION_MARKER: &str = "[SILENT WORLD SIMULATION]";

const BASE_V2: &str = include_str!("../assets/templates/base_v2.md");
const BASE_V3: &str = include_str!("../assets/templates/base_v3.md");
const SETUP: &str = include_str!("../assets/templates/setup.md");
const WORLD_SIMULATION: &str = include_str!("../assets/templates/world_simulation.md");
const QUICK_START: &str = include_str!("../assets/templates/quick_start.md");
const PERSONA_PURIST: &str = include_str!("../assets/templates/persona_purist.md");
const PERSONA_STORYTELLER: &str = include_str!("../assets/templates/persona_storyteller.md");
const PERSONA_CINEMATIC: &str = include_str!("../assets/templates/persona_cinematic.md");

/// Revision of the out-of-character protocol the base template follows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize,
)]
pub enum ProtocolVersion {
    #[strum(serialize = "2.0")]
    #[serde(rename = "2.0")]
    V2,
    #[default]
    #[strum(serialize = "3.0")]
    #[serde(rename = "3.0")]
    V3,
}

impl ProtocolVersion {
    /// Any tag other than `3.0` selects the 2.0 protocol.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().trim_start_matches(['v', 'V']) {
            "3" | "3.0" => ProtocolVersion::V3,
            _ => ProtocolVersion::V2,
        }
    }

    fn base_file(self) -> &'static str {
        match self {
            ProtocolVersion::V2 => "base_v2.md",
            ProtocolVersion::V3 => "base_v3.md",
        }
    }
}

/// The two pieces a play instruction is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateParts<'a> {
    pub base: &'a str,
    pub addendum: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLibrary {
    bases: HashMap<ProtocolVersion, String>,
    addenda: HashMap<PersonaId, String>,
    setup: String,
    world_simulation: String,
    quick_start: String,
}

impl TemplateLibrary {
    /// The texts compiled into the binary.
    pub fn builtin() -> Self {
        let bases = HashMap::from([
            (ProtocolVersion::V2, BASE_V2.to_string()),
            (ProtocolVersion::V3, BASE_V3.to_string()),
        ]);
        let addenda = PersonaId::iter()
            .map(|id| {
                let text = match id {
                    PersonaId::Purist => PERSONA_PURIST,
                    PersonaId::Storyteller => PERSONA_STORYTELLER,
                    PersonaId::Cinematic => PERSONA_CINEMATIC,
                };
                (id, text.to_string())
            })
            .collect();

        Self {
            bases,
            addenda,
            setup: SETUP.to_string(),
            world_simulation: WORLD_SIMULATION.to_string(),
            quick_start: QUICK_START.to_string(),
        }
    }

    /// Built-in texts, with every file present in `dir` taking precedence.
    /// File names match the ones under `assets/templates`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let mut library = Self::builtin();

        for version in ProtocolVersion::iter() {
            if let Some(text) = read_override(dir, version.base_file())? {
                library.bases.insert(version, text);
            }
        }
        for id in PersonaId::iter() {
            if let Some(text) = read_override(dir, &format!("persona_{id}.md"))? {
                library.addenda.insert(id, text);
            }
        }
        if let Some(text) = read_override(dir, "setup.md")? {
            library.setup = text;
        }
        if let Some(text) = read_override(dir, "world_simulation.md")? {
            library.world_simulation = text;
        }
        if let Some(text) = read_override(dir, "quick_start.md")? {
            library.quick_start = text;
        }

        library.validate()?;
        Ok(library)
    }

    /// Checks the placeholders composition relies on and the tag vocabulary
    /// [`crate::tags::parse_reply`] looks for.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for version in ProtocolVersion::iter() {
            let base = self.base(version);
            expect_once(version.base_file(), base, PASSWORD_PLACEHOLDER)?;
            expect_present(version.base_file(), base, COMBAT_STATUS_OPEN)?;
            expect_present(version.base_file(), base, COMBAT_STATUS_CLOSE)?;
        }
        expect_present("setup.md", &self.setup, VERSION_PLACEHOLDER)?;
        // Setup ends only when the model emits these.
        for marker in ControlMarker::iter() {
            expect_present("setup.md", &self.setup, marker.token())?;
        }
        expect_once("quick_start.md", &self.quick_start, SCHEMA_PLACEHOLDER)?;
        if !self.world_simulation.contains(SILENT_SIMULATION_MARKER) {
            return Err(TemplateError::Placeholder {
                name: "world_simulation.md".to_string(),
                placeholder: SILENT_SIMULATION_MARKER,
                found: 0,
            });
        }
        Ok(())
    }

    fn base(&self, version: ProtocolVersion) -> &str {
        self.bases.get(&version).map(String::as_str).unwrap_or_default()
    }

    pub fn parts(&self, version: ProtocolVersion, persona: PersonaId) -> TemplateParts<'_> {
        TemplateParts {
            base: self.base(version),
            addendum: self
                .addenda
                .get(&persona)
                .map(String::as_str)
                .unwrap_or_default(),
        }
    }

    /// Base template with the password filled in, followed by the persona addendum.
    pub fn play_instruction(
        &self,
        persona: PersonaId,
        password: &str,
        version: ProtocolVersion,
    ) -> String {
        let parts = self.parts(version, persona);
        let mut instruction = parts.base.replacen(PASSWORD_PLACEHOLDER, password, 1);
        instruction.push_str(parts.addendum);
        instruction
    }

    pub fn setup_instruction(&self, version: ProtocolVersion) -> String {
        self.setup.replace(VERSION_PLACEHOLDER, &version.to_string())
    }

    pub fn is_setup_instruction(&self, text: &str) -> bool {
        ProtocolVersion::iter().any(|version| self.setup_instruction(version) == text)
    }

    pub fn world_simulation_instruction(&self) -> &str {
        &self.world_simulation
    }

    pub fn quick_start_instruction(&self) -> String {
        self.quick_start
            .replacen(SCHEMA_PLACEHOLDER, &quick_start::schema_json(), 1)
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>, TemplateError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    log::info!("Using template override {path:?}");
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| TemplateError::Io { path, source })
}

fn expect_once(name: &str, text: &str, placeholder: &'static str) -> Result<(), TemplateError> {
    let found = text.matches(placeholder).count();
    if found == 1 {
        Ok(())
    } else {
        Err(TemplateError::Placeholder {
            name: name.to_string(),
            placeholder,
            found,
        })
    }
}

fn expect_present(name: &str, text: &str, placeholder: &'static str) -> Result<(), TemplateError> {
    if text.contains(placeholder) {
        Ok(())
    } else {
        Err(TemplateError::Placeholder {
            name: name.to_string(),
            placeholder,
            found: 0,
        })
    }
}

static ACTIVE: Lazy<RwLock<Arc<TemplateLibrary>>> =
    Lazy::new(|| RwLock::new(Arc::new(TemplateLibrary::builtin())));

/// The library currently used by the free functions below.
pub fn active() -> Arc<TemplateLibrary> {
    Arc::clone(&ACTIVE.read().unwrap_or_else(PoisonError::into_inner))
}

/// Replaces the library used by the free functions below.
pub fn install(library: TemplateLibrary) {
    *ACTIVE.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(library);
}

pub fn setup_instruction(version: ProtocolVersion) -> String {
    active().setup_instruction(version)
}

pub fn quick_start_instruction() -> String {
    active().quick_start_instruction()
}

pub fn world_simulation_instruction() -> String {
    active().world_simulation_instruction().to_string()
}

pub fn play_instruction(persona: PersonaId, password: &str, version: ProtocolVersion) -> String {
    active().play_instruction(persona, password, version)
}

/// String-keyed entry point: `persona_id` must name a known persona, any
/// `version` tag other than `3.0` selects the 2.0 protocol.
pub fn build_instruction(
    persona_id: &str,
    password: &str,
    version: &str,
) -> Result<String, TemplateError> {
    let persona: PersonaId = persona_id
        .parse()
        .map_err(|_| TemplateError::UnknownPersona(persona_id.to_string()))?;
    Ok(play_instruction(
        persona,
        password,
        ProtocolVersion::from_tag(version),
    ))
}
