mod types;

pub use types::{ActionId, Command, CommandOutcome, NUDGE_STEP, NUDGE_STEP_LARGE};
