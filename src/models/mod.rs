pub mod loaders;
pub mod question;
pub mod status;
pub mod student;

pub use loaders::{load_configured_bank, load_question_bank};
pub use question::{Question, QuestionBank, QuestionKind};
pub use status::{
    Ack, CameraEvent, CameraStatus, ExamStatus, PauseState, Polled, ProctoringSnapshot,
    SuspiciousActivity,
};
pub use student::{Credentials, Student};
