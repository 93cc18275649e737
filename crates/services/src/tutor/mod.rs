//! The tutoring session: mode machine, turn handling and answer submission.

mod debounce;
mod display;
mod session;

pub use debounce::{AnswerSubmitter, DEFAULT_DEBOUNCE_WINDOW, Debouncer};
pub use display::DisplayTurn;
pub use session::{Rejection, TurnOutcome, TurnReply, TutorSession};
