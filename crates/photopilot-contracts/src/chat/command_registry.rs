#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandKind {
    Help,
    Undo,
    New,
    Analyze,
    Select,
    Photos,
    Module,
    Key,
    Model,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub kind: CommandKind,
}

pub(crate) const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        kind: CommandKind::Help,
    },
    CommandSpec {
        command: "undo",
        kind: CommandKind::Undo,
    },
    CommandSpec {
        command: "new",
        kind: CommandKind::New,
    },
    CommandSpec {
        command: "analyze",
        kind: CommandKind::Analyze,
    },
    CommandSpec {
        command: "select",
        kind: CommandKind::Select,
    },
    CommandSpec {
        command: "photos",
        kind: CommandKind::Photos,
    },
    CommandSpec {
        command: "module",
        kind: CommandKind::Module,
    },
    CommandSpec {
        command: "key",
        kind: CommandKind::Key,
    },
    CommandSpec {
        command: "model",
        kind: CommandKind::Model,
    },
    CommandSpec {
        command: "quit",
        kind: CommandKind::Quit,
    },
    CommandSpec {
        command: "exit",
        kind: CommandKind::Quit,
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/help",
    "/undo",
    "/new",
    "/analyze [prompt]",
    "/select <photo ids...>",
    "/photos",
    "/module <name>",
    "/key <api key>",
    "/model <name>",
    "/quit",
];
