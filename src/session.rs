use std::sync::Arc;

use crate::ai;
use crate::gemini::{ChatConfig, ChatSession, Content, GeminiClient, Tool};
use crate::settings::{self, Settings};
use crate::templates::{self, SILENT_SIMULATION_MARKER, TemplateLibrary};

/// Sampling temperature for every chat session.
pub const TEMPERATURE: f32 = 0.9;

/// Search grounding is attached to everything except the setup flow and the
/// silent world simulation.
pub fn wants_search(library: &TemplateLibrary, instruction: &str) -> bool {
    !library.is_setup_instruction(instruction) && !instruction.contains(SILENT_SIMULATION_MARKER)
}

pub fn chat_config(library: &TemplateLibrary, instruction: &str) -> ChatConfig {
    ChatConfig {
        temperature: TEMPERATURE,
        system_instruction: instruction.to_string(),
        tools: wants_search(library, instruction).then(|| vec![Tool::google_search()]),
    }
}

/// Builds a session from explicit collaborators.
pub fn create_session_with(
    client: Arc<GeminiClient>,
    library: &TemplateLibrary,
    settings: &Settings,
    history: Vec<Content>,
    instruction: &str,
    model_override: Option<&str>,
) -> ChatSession {
    let model = model_override.unwrap_or(&settings.model);
    let config = chat_config(library, instruction);
    log::debug!(
        "New chat session: model {model}, {} prior turns, search {}",
        history.len(),
        config.tools.is_some()
    );
    ChatSession::new(client, model, config, history)
}

/// Builds a session with the shared client, active templates and current
/// settings. `model_override` wins over the configured model.
pub fn create_session(
    history: Vec<Content>,
    instruction: &str,
    model_override: Option<&str>,
) -> ChatSession {
    create_session_with(
        ai::get(),
        &templates::active(),
        &settings::current(),
        history,
        instruction,
        model_override,
    )
}
