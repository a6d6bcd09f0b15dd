use crate::command::{ActionId, CommandOutcome};
use crate::error::{AppError, AppResult};
use crate::event::DomainEvent;

use super::core::App;
use super::event_bus::EventBusRuntime;
use super::terminal_session::{TerminalSession, TerminalSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue { redraw: bool },
    Break,
}

impl App {
    pub async fn run(&mut self) -> AppResult<()> {
        if self.session.page_count() == 0 {
            return Err(AppError::invalid_argument("pdf has no pages"));
        }

        let mut terminal = TerminalSession::enter()?;
        self.presenter.initialize_terminal()?;
        let (mut events, mut event_bus) = EventBusRuntime::spawn();

        self.refresh_preview();
        if self.session.position().is_none() && self.state.status.message.is_empty() {
            self.state
                .status
                .info("move with the arrow keys or click the page to place the signature");
        }

        let mut redraw = true;
        loop {
            if redraw {
                self.draw(&mut terminal)?;
            }
            let Some(event) = events.recv().await else {
                break;
            };
            match self.handle_domain_event(event, &mut terminal)? {
                LoopControl::Continue { redraw: next } => redraw = next,
                LoopControl::Break => break,
            }
        }

        event_bus.shutdown();
        terminal.restore()?;
        Ok(())
    }

    pub(crate) fn handle_domain_event(
        &mut self,
        event: DomainEvent,
        surface: &mut impl TerminalSurface,
    ) -> AppResult<LoopControl> {
        match event {
            DomainEvent::Input(event) => {
                let outcome = self.handle_input_event(event, surface)?;
                let Some(command) = outcome.command else {
                    return Ok(LoopControl::Continue {
                        redraw: outcome.redraw,
                    });
                };
                if self.apply_command(command) == CommandOutcome::QuitRequested {
                    return Ok(LoopControl::Break);
                }
                Ok(LoopControl::Continue { redraw: true })
            }
            DomainEvent::InputError(message) => {
                self.state.status.last_action_id = Some(ActionId::Input);
                self.state.status.error(format!("input error: {message}"));
                Ok(LoopControl::Continue { redraw: true })
            }
        }
    }
}
