pub mod ai;
pub mod credentials;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod persona;
pub mod quick_start;
pub mod retry;
pub mod session;
pub mod settings;
pub mod tags;
pub mod templates;
pub mod utils;

// Re-export commonly used items for easier access
pub use embedding::embed;
pub use error::{AIError, TemplateError};
pub use gemini::{ChatSession, Content, GeminiClient, Role};
pub use persona::{Persona, PersonaId, personas};
pub use session::create_session;
pub use settings::Settings;
pub use tags::{CombatStatus, ControlMarker, ParsedReply, parse_reply};
pub use templates::{ProtocolVersion, TemplateLibrary, build_instruction};
