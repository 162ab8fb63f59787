pub mod admission;
pub mod answer_store;
pub mod countdown;
pub mod status_poller;
pub mod submission_writer;
pub mod warning_evaluator;

pub use admission::{confirm_instructions, validate_login};
pub use answer_store::{AnswerRecord, AnswerStore, ScoreReport};
pub use countdown::{spawn_clock, Countdown, CountdownState, TickOutcome};
pub use status_poller::{PollTarget, StatusPoller, StatusUpdate};
pub use submission_writer::SubmissionWriter;
pub use warning_evaluator::{evaluate, Warning};
