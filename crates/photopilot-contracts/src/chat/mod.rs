mod action_extractor;
mod action_registry;
mod command_registry;
mod display;
mod intent_parser;
mod turns;

pub use action_extractor::{
    extract_action, unescape_embedded, ActionRequest, MAX_BRACE_CANDIDATES, MAX_SCAN_BYTES,
};
pub use action_registry::{normalize_action_name, resolve_action, ActionKind};
pub use command_registry::CHAT_HELP_COMMANDS;
pub use display::{clean_display_text, display_text};
pub use intent_parser::{parse_command, ChatCommand};
pub use turns::{ChatTurn, Conversation, Role};
