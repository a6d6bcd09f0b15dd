use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use tui_input::backend::crossterm::EventHandler;

use crate::app::terminal_session::TerminalSurface;
use crate::app::{App, Mode};
use crate::command::Command;
use crate::error::AppResult;

use super::keymap::{KeymapPreset, map_key_to_command_with_preset};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct InputEventOutcome {
    pub(crate) redraw: bool,
    pub(crate) command: Option<Command>,
}

impl App {
    pub(crate) fn handle_input_event(
        &mut self,
        event: Event,
        session: &mut impl TerminalSurface,
    ) -> AppResult<InputEventOutcome> {
        match event {
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
                Ok(self.handle_key_event(key))
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                if self.state.mode != Mode::Normal {
                    return Ok(InputEventOutcome::default());
                }
                let command = self
                    .position_at_cell(mouse.column, mouse.row)
                    .map(|position| Command::PlaceAt { position });
                Ok(InputEventOutcome {
                    redraw: false,
                    command,
                })
            }
            Event::Resize(_, _) => {
                session.clear()?;
                Ok(InputEventOutcome {
                    redraw: true,
                    command: None,
                })
            }
            _ => Ok(InputEventOutcome::default()),
        }
    }

    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) -> InputEventOutcome {
        if self.state.mode == Mode::Prompt {
            return self.handle_prompt_key(key);
        }
        let preset = KeymapPreset::parse(&self.config.keymap.preset);
        InputEventOutcome {
            redraw: false,
            command: map_key_to_command_with_preset(key, self.state.mode, preset),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> InputEventOutcome {
        match key.code {
            KeyCode::Esc => InputEventOutcome {
                redraw: true,
                command: Some(Command::Cancel),
            },
            KeyCode::Enter => InputEventOutcome {
                redraw: true,
                command: Some(Command::SaveSignature {
                    name: self.state.prompt.value().trim().to_string(),
                }),
            },
            _ => {
                self.state.prompt.handle_event(&Event::Key(key));
                InputEventOutcome {
                    redraw: true,
                    command: None,
                }
            }
        }
    }
}
