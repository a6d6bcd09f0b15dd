use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Mode;
use crate::command::{Command, NUDGE_STEP, NUDGE_STEP_LARGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapPreset {
    Default,
    Emacs,
}

impl KeymapPreset {
    pub fn parse(value: &str) -> Self {
        match value {
            "default" => Self::Default,
            "emacs" => Self::Emacs,
            _ => Self::Default,
        }
    }
}

pub fn map_key_to_command(key: KeyEvent, mode: Mode) -> Option<Command> {
    map_key_to_command_with_preset(key, mode, KeymapPreset::Default)
}

/// Prompt mode keys belong to the text input and never map to commands.
pub fn map_key_to_command_with_preset(
    key: KeyEvent,
    mode: Mode,
    preset: KeymapPreset,
) -> Option<Command> {
    match mode {
        Mode::Normal => match preset {
            KeymapPreset::Default => map_normal_mode_key_default(key),
            KeymapPreset::Emacs => map_normal_mode_key_emacs(key),
        },
        Mode::Prompt => None,
    }
}

fn nudge(dx: f64, dy: f64, large: bool) -> Command {
    let step = if large { NUDGE_STEP_LARGE } else { NUDGE_STEP };
    Command::Nudge {
        dx: dx * step,
        dy: dy * step,
    }
}

fn map_normal_mode_key_default(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }

    let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Left => Some(nudge(-1.0, 0.0, shifted)),
        KeyCode::Right => Some(nudge(1.0, 0.0, shifted)),
        KeyCode::Up => Some(nudge(0.0, -1.0, shifted)),
        KeyCode::Down => Some(nudge(0.0, 1.0, shifted)),
        KeyCode::Char('h') => Some(nudge(-1.0, 0.0, false)),
        KeyCode::Char('l') => Some(nudge(1.0, 0.0, false)),
        KeyCode::Char('k') => Some(nudge(0.0, -1.0, false)),
        KeyCode::Char('j') => Some(nudge(0.0, 1.0, false)),
        KeyCode::Char('H') => Some(nudge(-1.0, 0.0, true)),
        KeyCode::Char('L') => Some(nudge(1.0, 0.0, true)),
        KeyCode::Char('K') => Some(nudge(0.0, -1.0, true)),
        KeyCode::Char('J') => Some(nudge(0.0, 1.0, true)),
        KeyCode::Char('c') => Some(Command::Center),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::Grow),
        KeyCode::Char('-') => Some(Command::Shrink),
        KeyCode::PageDown | KeyCode::Char('n') => Some(Command::NextPage),
        KeyCode::PageUp | KeyCode::Char('p') => Some(Command::PrevPage),
        KeyCode::Enter => Some(Command::Export),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::OpenSavePrompt),
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Esc => Some(Command::Cancel),
        _ => None,
    }
}

fn map_normal_mode_key_emacs(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::ALT) {
        return match key.code {
            KeyCode::Char('f') => Some(nudge(1.0, 0.0, true)),
            KeyCode::Char('b') => Some(nudge(-1.0, 0.0, true)),
            KeyCode::Char('n') => Some(nudge(0.0, 1.0, true)),
            KeyCode::Char('p') => Some(nudge(0.0, -1.0, true)),
            KeyCode::Char('v') => Some(Command::PrevPage),
            _ => None,
        };
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('f') => Some(nudge(1.0, 0.0, false)),
            KeyCode::Char('b') => Some(nudge(-1.0, 0.0, false)),
            KeyCode::Char('n') => Some(nudge(0.0, 1.0, false)),
            KeyCode::Char('p') => Some(nudge(0.0, -1.0, false)),
            KeyCode::Char('v') => Some(Command::NextPage),
            KeyCode::Char('l') => Some(Command::Center),
            KeyCode::Char('s') => Some(Command::OpenSavePrompt),
            KeyCode::Char('g') => Some(Command::Cancel),
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        };
    }

    map_normal_mode_key_default(key)
}
