use crate::placement::Position;

/// Percentage points moved by a plain nudge.
pub const NUDGE_STEP: f64 = 1.0;
/// Percentage points moved by a shifted nudge.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Move the signature center by page percentages; positive `dy` is down.
    Nudge {
        dx: f64,
        dy: f64,
    },
    Center,
    PlaceAt {
        position: Position,
    },
    Grow,
    Shrink,
    NextPage,
    PrevPage,
    Export,
    OpenSavePrompt,
    SaveSignature {
        name: String,
    },
    Cancel,
    Quit,
}

impl Command {
    pub fn id(&self) -> ActionId {
        match self {
            Self::Nudge { .. } => ActionId::Nudge,
            Self::Center => ActionId::Center,
            Self::PlaceAt { .. } => ActionId::PlaceAt,
            Self::Grow => ActionId::Grow,
            Self::Shrink => ActionId::Shrink,
            Self::NextPage => ActionId::NextPage,
            Self::PrevPage => ActionId::PrevPage,
            Self::Export => ActionId::Export,
            Self::OpenSavePrompt => ActionId::OpenSavePrompt,
            Self::SaveSignature { .. } => ActionId::SaveSignature,
            Self::Cancel => ActionId::Cancel,
            Self::Quit => ActionId::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    Nudge,
    Center,
    PlaceAt,
    Grow,
    Shrink,
    NextPage,
    PrevPage,
    Export,
    OpenSavePrompt,
    SaveSignature,
    Cancel,
    Quit,
    Input,
    RenderPreview,
}

impl ActionId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nudge => "nudge",
            Self::Center => "center",
            Self::PlaceAt => "place-at",
            Self::Grow => "grow",
            Self::Shrink => "shrink",
            Self::NextPage => "next-page",
            Self::PrevPage => "prev-page",
            Self::Export => "export",
            Self::OpenSavePrompt => "open-save-prompt",
            Self::SaveSignature => "save-signature",
            Self::Cancel => "cancel",
            Self::Quit => "quit",
            Self::Input => "input",
            Self::RenderPreview => "render-preview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Noop,
    QuitRequested,
}
