use std::fs;

use tui_input::Input;

use crate::command::{Command, CommandOutcome};
use crate::error::{AppError, AppResult};
use crate::placement::Position;
use crate::session::ExportOutcome;

use super::core::App;
use super::state::Mode;

impl App {
    /// Applies one command; failures end up in the status bar, never in the loop.
    pub(crate) fn apply_command(&mut self, command: Command) -> CommandOutcome {
        let id = command.id();
        self.state.status.clear();
        self.state.status.last_action_id = Some(id);
        match self.dispatch_command(command) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(action = id.as_str(), error = %err, "command failed");
                self.state.status.error(err.to_string());
                CommandOutcome::Noop
            }
        }
    }

    fn dispatch_command(&mut self, command: Command) -> AppResult<CommandOutcome> {
        match command {
            Command::Nudge { dx, dy } => {
                let position = match self.session.position() {
                    Some(current) => current.nudged(dx, dy),
                    None => Position::CENTER,
                };
                self.place(position)
            }
            Command::Center => self.place(Position::CENTER),
            Command::PlaceAt { position } => self.place(position),
            Command::Grow => Ok(self.step_width(1)),
            Command::Shrink => Ok(self.step_width(-1)),
            Command::NextPage => self.turn_page(1),
            Command::PrevPage => self.turn_page(-1),
            Command::Export => self.export(),
            Command::OpenSavePrompt => {
                if self.session.signature().is_none() {
                    self.state.status.warn("no signature to save");
                    return Ok(CommandOutcome::Noop);
                }
                self.state.prompt = Input::default();
                self.state.mode = Mode::Prompt;
                Ok(CommandOutcome::Applied)
            }
            Command::SaveSignature { name } => {
                self.state.mode = Mode::Normal;
                self.state.prompt = Input::default();
                let signature = self
                    .session
                    .signature()
                    .cloned()
                    .ok_or_else(|| AppError::invalid_argument("no signature to save"))?;
                let saved = self.store()?.save(&name, &signature)?;
                self.state
                    .status
                    .info(format!("saved signature as {}", saved.stem));
                Ok(CommandOutcome::Applied)
            }
            Command::Cancel => {
                if self.state.mode == Mode::Prompt {
                    self.state.mode = Mode::Normal;
                    self.state.prompt = Input::default();
                    return Ok(CommandOutcome::Applied);
                }
                Ok(CommandOutcome::Noop)
            }
            Command::Quit => Ok(CommandOutcome::QuitRequested),
        }
    }

    fn place(&mut self, position: Position) -> AppResult<CommandOutcome> {
        self.session.set_position(position)?;
        self.refresh_preview();
        Ok(CommandOutcome::Applied)
    }

    fn step_width(&mut self, steps: i32) -> CommandOutcome {
        let before = self.session.width();
        let after = self.session.step_width(steps);
        if before == after {
            self.state.status.info(format!("width stays at {after}pt"));
            return CommandOutcome::Noop;
        }
        self.refresh_preview();
        CommandOutcome::Applied
    }

    fn turn_page(&mut self, delta: isize) -> AppResult<CommandOutcome> {
        let current = self.session.page();
        let Some(target) = current
            .checked_add_signed(delta)
            .filter(|&page| page < self.session.page_count())
        else {
            self.state.status.info("no more pages in that direction");
            return Ok(CommandOutcome::Noop);
        };

        let had_position = self.session.position().is_some();
        self.session.set_page(target)?;
        if had_position {
            self.state
                .status
                .info(format!("page {}: place the signature again", target + 1));
        }
        self.refresh_preview();
        Ok(CommandOutcome::Applied)
    }

    fn export(&mut self) -> AppResult<CommandOutcome> {
        match self.session.export()? {
            ExportOutcome::Exported(signed) => {
                let path = self.state.output_path.clone();
                fs::write(&path, &signed.bytes).map_err(|source| {
                    AppError::io_with_context(
                        source,
                        format!("failed to write signed pdf: {}", path.display()),
                    )
                })?;
                tracing::info!(path = %path.display(), "wrote signed pdf");
                self.state
                    .status
                    .info(format!("exported {}", path.display()));
                Ok(CommandOutcome::Applied)
            }
            ExportOutcome::Blocked(blocker) => {
                self.state.status.warn(blocker.message());
                Ok(CommandOutcome::Noop)
            }
        }
    }
}
