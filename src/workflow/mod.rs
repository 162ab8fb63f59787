pub mod exam_session;
pub mod session_view;

pub use exam_session::{CommandOutcome, ExamSession, SessionCommand, RECENT_EVENTS_LIMIT};
pub use session_view::{CompletionSummary, Controls, Lifecycle, SessionView, Toast};
