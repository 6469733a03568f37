#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    ApplyDevelopSettings,
    Unrecognized(String),
}

impl ActionKind {
    pub fn label(&self) -> &str {
        match self {
            ActionKind::ApplyDevelopSettings => "apply_develop_settings",
            ActionKind::Unrecognized(name) => name.as_str(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KnownAction {
    ApplyDevelopSettings,
}

impl From<KnownAction> for ActionKind {
    fn from(action: KnownAction) -> Self {
        match action {
            KnownAction::ApplyDevelopSettings => ActionKind::ApplyDevelopSettings,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ActionSpec {
    pub alias: &'static str,
    pub action: KnownAction,
}

/// Aliases are stored already normalized.
pub(crate) const ACTION_SPECS: &[ActionSpec] = &[
    ActionSpec {
        alias: "applydevelopsettings",
        action: KnownAction::ApplyDevelopSettings,
    },
    ActionSpec {
        alias: "applysettings",
        action: KnownAction::ApplyDevelopSettings,
    },
    ActionSpec {
        alias: "setdevelopsettings",
        action: KnownAction::ApplyDevelopSettings,
    },
    ActionSpec {
        alias: "adjustdevelopsettings",
        action: KnownAction::ApplyDevelopSettings,
    },
];

/// Lower-cases and drops separators so `Apply_Develop-Settings` and
/// `applydevelopsettings` compare equal.
pub fn normalize_action_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn resolve_action(raw: &str) -> ActionKind {
    let normalized = normalize_action_name(raw);
    ACTION_SPECS
        .iter()
        .find(|spec| spec.alias == normalized)
        .map(|spec| ActionKind::from(spec.action))
        .unwrap_or(ActionKind::Unrecognized(normalized))
}
