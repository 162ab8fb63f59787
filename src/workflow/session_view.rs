//! 会话只读视图
//!
//! 编排层每处理完一个事件就发布一份新的视图，界面只读不写

use crate::infrastructure::CameraState;
use crate::models::question::Question;
use crate::models::status::{CameraEvent, PauseState, ProctoringSnapshot};
use crate::models::student::Student;
use crate::services::answer_store::{AnswerRecord, ScoreReport};
use crate::services::warning_evaluator::Warning;
use crate::utils::logging::format_clock;
use serde::Serialize;

/// 会话生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Lifecycle {
    #[default]
    Active,
    /// 服务端暂停，只能由服务端恢复
    Paused,
    /// 终态
    Submitted,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Lifecycle::Active => "Active",
            Lifecycle::Paused => "Paused",
            Lifecycle::Submitted => "Submitted",
        };
        f.write_str(s)
    }
}

/// 当前可用的控件，界面据此禁用按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub can_previous: bool,
    pub can_next: bool,
    pub can_answer: bool,
    pub can_submit: bool,
    pub can_final_submit: bool,
}

/// 短暂提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: false,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            destructive: true,
        }
    }
}

/// 交卷后的完成摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub answered: usize,
    pub total: usize,
}

impl CompletionSummary {
    /// 完成百分比，四舍五入到整数
    pub fn percent_completed(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.answered as f64 / self.total as f64 * 100.0).round() as u32
    }
}

impl std::fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You answered {} out of {} questions. ({}%)",
            self.answered,
            self.total,
            self.percent_completed()
        )
    }
}

/// 某一时刻的会话快照
#[derive(Debug, Clone)]
pub struct SessionView {
    pub student: Student,
    pub lifecycle: Lifecycle,
    pub current_index: usize,
    pub question_count: usize,
    pub question: Option<Question>,
    pub answer: Option<AnswerRecord>,
    pub answered: Vec<bool>,
    pub remaining_secs: u32,
    pub snapshot: ProctoringSnapshot,
    pub warning: Warning,
    pub pause: PauseState,
    pub recent_events: Vec<CameraEvent>,
    pub camera: CameraState,
    pub camera_notice: Option<String>,
    pub toast: Option<Toast>,
    /// 每产生一条新提示加一，界面据此判断是否需要展示
    pub toast_seq: u64,
    pub controls: Controls,
    pub score: Option<ScoreReport>,
    pub summary: Option<CompletionSummary>,
    pub final_submitted: bool,
    pub torn_down: bool,
}

impl SessionView {
    pub fn answered_count(&self) -> usize {
        self.answered.iter().filter(|a| **a).count()
    }

    /// 倒计时 mm:ss
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    /// 进度条百分比：(当前题号 + 1) / 总题数
    pub fn progress_percent(&self) -> u32 {
        if self.question_count == 0 {
            return 0;
        }
        ((self.current_index + 1) as f64 / self.question_count as f64 * 100.0).round() as u32
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.question_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percent_rounds() {
        let summary = CompletionSummary {
            answered: 4,
            total: 6,
        };
        assert_eq!(summary.percent_completed(), 67);
        assert_eq!(
            summary.to_string(),
            "You answered 4 out of 6 questions. (67%)"
        );
        assert_eq!(
            CompletionSummary {
                answered: 0,
                total: 0
            }
            .percent_completed(),
            0
        );
    }
}
