mod chat;
mod client;
mod types;

pub use chat::*;
pub use client::*;
pub use types::*;
