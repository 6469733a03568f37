use super::command_registry::{CommandKind, COMMAND_SPECS};

/// One line of terminal input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Noop,
    Send(String),
    Help,
    Undo,
    New,
    Analyze(Option<String>),
    Select(Vec<String>),
    Photos,
    Module(String),
    Key(String),
    Model(String),
    Quit,
    Unknown { command: String, arg: String },
}

fn find_kind(command: &str) -> Option<CommandKind> {
    COMMAND_SPECS
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.kind)
}

fn parse_id_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

pub fn parse_command(text: &str) -> ChatCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return ChatCommand::Send(raw_trimmed.to_string());
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return ChatCommand::Send(raw_trimmed.to_string());
    }

    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim().to_string();

    match find_kind(&command) {
        Some(CommandKind::Help) => ChatCommand::Help,
        Some(CommandKind::Undo) => ChatCommand::Undo,
        Some(CommandKind::New) => ChatCommand::New,
        Some(CommandKind::Analyze) => {
            ChatCommand::Analyze(if arg.is_empty() { None } else { Some(arg) })
        }
        Some(CommandKind::Select) => ChatCommand::Select(parse_id_args(&arg)),
        Some(CommandKind::Photos) => ChatCommand::Photos,
        Some(CommandKind::Module) => ChatCommand::Module(arg),
        Some(CommandKind::Key) => ChatCommand::Key(arg),
        Some(CommandKind::Model) => ChatCommand::Model(arg),
        Some(CommandKind::Quit) => ChatCommand::Quit,
        None => ChatCommand::Unknown { command, arg },
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, ChatCommand};

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(
            parse_command("  make it pop  "),
            ChatCommand::Send("make it pop".to_string())
        );
        assert_eq!(parse_command("   "), ChatCommand::Noop);
    }

    #[test]
    fn slash_commands_without_args() {
        assert_eq!(parse_command("/undo"), ChatCommand::Undo);
        assert_eq!(parse_command("/NEW"), ChatCommand::New);
        assert_eq!(parse_command("/exit"), ChatCommand::Quit);
        assert_eq!(parse_command("/help"), ChatCommand::Help);
    }

    #[test]
    fn analyze_prompt_is_optional() {
        assert_eq!(parse_command("/analyze"), ChatCommand::Analyze(None));
        assert_eq!(
            parse_command("/analyze   is the horizon straight?"),
            ChatCommand::Analyze(Some("is the horizon straight?".to_string()))
        );
    }

    #[test]
    fn select_accepts_quoted_ids() {
        assert_eq!(
            parse_command("/select \"beach day.jpg\" IMG_0001.dng"),
            ChatCommand::Select(vec![
                "beach day.jpg".to_string(),
                "IMG_0001.dng".to_string()
            ])
        );
    }

    #[test]
    fn raw_arg_commands() {
        assert_eq!(
            parse_command("/model gemini-2.5-pro"),
            ChatCommand::Model("gemini-2.5-pro".to_string())
        );
        assert_eq!(
            parse_command("/module Library"),
            ChatCommand::Module("Library".to_string())
        );
    }

    #[test]
    fn unknown_command_keeps_arg() {
        assert_eq!(
            parse_command("/magic foo bar"),
            ChatCommand::Unknown {
                command: "magic".to_string(),
                arg: "foo bar".to_string()
            }
        );
    }

    #[test]
    fn lone_slash_is_sent_as_text() {
        assert_eq!(
            parse_command("/ hmm"),
            ChatCommand::Send("/ hmm".to_string())
        );
    }
}
