//! 考试会话状态机 - 流程层
//!
//! ## 职责
//!
//! 定义"一场考试"从开始到交卷的完整状态流转：
//! - 生命周期：Active → Paused → Active … → Submitted（终态）
//! - 题目导航：索引始终在 [0, 题数-1]，不回绕
//! - 作答：委托给 AnswerStore，暂停或交卷后一律拒绝
//! - 倒计时：每秒 tick 一次，归零时自动交卷且只交一次
//! - 状态镜像：暂停状态、检测快照、近期事件都以"最后完成者为准"整体替换
//!
//! ## 设计特点
//!
//! - **纯同步**：不持有任何任务、定时器或网络句柄，全部由编排层喂入事件
//! - **不抛错**：非法操作返回 `CommandOutcome::Rejected`，状态保持不变
//! - **可卸载**：`teardown` 之后所有迟到的事件和命令都不再改变状态

use crate::error::{AppError, LifecycleError};
use crate::infrastructure::{camera_notice, CameraState};
use crate::models::question::QuestionBank;
use crate::models::status::{
    CameraEvent, CameraStatus, ExamStatus, PauseState, Polled, ProctoringSnapshot,
};
use crate::models::student::Student;
use crate::services::answer_store::{AnswerStore, ScoreReport};
use crate::services::countdown::{Countdown, TickOutcome};
use crate::services::status_poller::StatusUpdate;
use crate::services::warning_evaluator::evaluate;
use crate::workflow::session_view::{CompletionSummary, Controls, Lifecycle, SessionView, Toast};
use tracing::{debug, info, warn};

/// 界面只保留最近的几条摄像头事件
pub const RECENT_EVENTS_LIMIT: usize = 5;

/// 界面发出的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Next,
    Previous,
    SelectOption { question: usize, option: usize },
    SetText { question: usize, text: String },
    Submit,
    FinalSubmit,
}

/// 命令执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 状态已改变
    Applied,
    /// 合法但无事可做（边界处导航、重复交卷等）
    Unchanged,
    /// 当前状态不允许，状态未改变
    Rejected(LifecycleError),
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        self == CommandOutcome::Applied
    }
}

/// 考试会话
pub struct ExamSession {
    bank: QuestionBank,
    student: Student,
    answers: AnswerStore,
    countdown: Countdown,
    lifecycle: Lifecycle,
    current: usize,
    snapshot: ProctoringSnapshot,
    pause: PauseState,
    recent_events: Vec<CameraEvent>,
    camera: CameraState,
    camera_notice: Option<String>,
    toast: Option<Toast>,
    toast_seq: u64,
    score: Option<ScoreReport>,
    score_computations: u32,
    final_submitted: bool,
    torn_down: bool,
    freeze_clock_while_paused: bool,
    /// 暂停期间时间耗尽，等恢复后再自动交卷
    pending_expiry: bool,
}

impl ExamSession {
    pub fn new(
        bank: QuestionBank,
        student: Student,
        duration_secs: u32,
        freeze_clock_while_paused: bool,
    ) -> Self {
        let answers = AnswerStore::new(bank.clone());
        Self {
            bank,
            student,
            answers,
            countdown: Countdown::new(duration_secs),
            lifecycle: Lifecycle::Active,
            current: 0,
            snapshot: ProctoringSnapshot::default(),
            pause: PauseState::default(),
            recent_events: Vec::new(),
            camera: CameraState::default(),
            camera_notice: None,
            toast: None,
            toast_seq: 0,
            score: None,
            score_computations: 0,
            final_submitted: false,
            torn_down: false,
            freeze_clock_while_paused,
            pending_expiry: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn snapshot(&self) -> &ProctoringSnapshot {
        &self.snapshot
    }

    pub fn pause(&self) -> &PauseState {
        &self.pause
    }

    pub fn score(&self) -> Option<ScoreReport> {
        self.score
    }

    /// 自动评分被计算的次数
    pub fn score_computations(&self) -> u32 {
        self.score_computations
    }

    pub fn is_final_submitted(&self) -> bool {
        self.final_submitted
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn summary(&self) -> CompletionSummary {
        CompletionSummary {
            answered: self.answers.answered_count(),
            total: self.bank.len(),
        }
    }

    /// 执行一条界面命令
    pub fn apply_command(&mut self, command: SessionCommand) -> CommandOutcome {
        if self.torn_down {
            return CommandOutcome::Rejected(LifecycleError::TornDown);
        }
        match command {
            SessionCommand::Next => self.next(),
            SessionCommand::Previous => self.previous(),
            SessionCommand::SelectOption { question, option } => {
                self.mutate(|answers| answers.select_option(question, option))
            }
            SessionCommand::SetText { question, text } => {
                self.mutate(|answers| answers.set_text(question, text))
            }
            SessionCommand::Submit => self.submit(),
            SessionCommand::FinalSubmit => self.final_submit(),
        }
    }

    pub fn next(&mut self) -> CommandOutcome {
        if let Err(e) = self.ensure_active() {
            return CommandOutcome::Rejected(e);
        }
        if self.current + 1 >= self.bank.len() {
            return CommandOutcome::Unchanged;
        }
        self.current += 1;
        CommandOutcome::Applied
    }

    pub fn previous(&mut self) -> CommandOutcome {
        if let Err(e) = self.ensure_active() {
            return CommandOutcome::Rejected(e);
        }
        if self.current == 0 {
            return CommandOutcome::Unchanged;
        }
        self.current -= 1;
        CommandOutcome::Applied
    }

    /// 交卷
    ///
    /// 只能从 Active 发起；已交卷时再次调用无副作用
    pub fn submit(&mut self) -> CommandOutcome {
        match self.lifecycle {
            Lifecycle::Submitted => {
                debug!("重复交卷，忽略");
                CommandOutcome::Unchanged
            }
            Lifecycle::Paused => CommandOutcome::Rejected(LifecycleError::Paused),
            Lifecycle::Active => {
                self.do_submit();
                CommandOutcome::Applied
            }
        }
    }

    /// 最终提交
    ///
    /// 交卷后第一次调用生效；写入失败时由编排层调用 `mark_final_submit_failed` 回滚
    pub fn final_submit(&mut self) -> CommandOutcome {
        if self.lifecycle != Lifecycle::Submitted {
            return CommandOutcome::Rejected(LifecycleError::NotSubmitted);
        }
        if self.final_submitted {
            return CommandOutcome::Unchanged;
        }
        self.final_submitted = true;
        info!("📨 {} 确认最终提交", self.student);
        CommandOutcome::Applied
    }

    pub fn mark_final_submit_failed(&mut self, error: &AppError) {
        self.final_submitted = false;
        self.push_toast(Toast::error("Submission Failed", error.to_string()));
    }

    pub fn mark_final_submit_done(&mut self) {
        self.push_toast(Toast::info(
            "Exam Completed",
            "Your answers have been recorded. You may now close this window.",
        ));
    }

    /// 处理一次完成的轮询结果，返回状态是否可能改变
    pub fn apply_polled(&mut self, polled: Polled<StatusUpdate>) -> bool {
        if self.torn_down {
            debug!("会话已卸载，丢弃第 {} 次轮询结果", polled.seq);
            return false;
        }
        let Polled {
            seq,
            fetched_at,
            value,
        } = polled;
        match value {
            StatusUpdate::Exam(status) => self.apply_exam_status(Polled {
                seq,
                fetched_at,
                value: status,
            }),
            StatusUpdate::Camera(status) => self.apply_camera_status(Polled {
                seq,
                fetched_at,
                value: status,
            }),
            StatusUpdate::Events(events) => self.apply_camera_events(events),
        }
    }

    /// 镜像服务端暂停状态，并据此切换生命周期
    pub fn apply_exam_status(&mut self, polled: Polled<ExamStatus>) -> bool {
        if self.torn_down {
            return false;
        }
        let pause = PauseState::from(polled.value);
        match (self.lifecycle, pause.is_paused) {
            (Lifecycle::Active, true) => {
                warn!("⏸ 考试被服务端暂停: {}", pause.reasons.join("; "));
                self.lifecycle = Lifecycle::Paused;
            }
            (Lifecycle::Paused, false) => {
                info!("▶ 服务端已恢复考试");
                self.lifecycle = Lifecycle::Active;
                if self.pending_expiry {
                    info!("⏰ 暂停期间时间已耗尽，恢复后自动交卷");
                    self.pending_expiry = false;
                    self.do_submit();
                }
            }
            _ => {}
        }
        self.pause = pause;
        true
    }

    /// 整体替换检测快照
    pub fn apply_camera_status(&mut self, polled: Polled<CameraStatus>) -> bool {
        if self.torn_down {
            return false;
        }
        self.snapshot = ProctoringSnapshot::from_status(polled.value, polled.fetched_at);
        true
    }

    /// 只保留最近几条事件
    pub fn apply_camera_events(&mut self, events: Vec<CameraEvent>) -> bool {
        if self.torn_down {
            return false;
        }
        let skip = events.len().saturating_sub(RECENT_EVENTS_LIMIT);
        self.recent_events = events.into_iter().skip(skip).collect();
        true
    }

    /// 时钟前进一秒
    pub fn tick(&mut self) -> TickOutcome {
        if self.torn_down || self.lifecycle == Lifecycle::Submitted {
            return TickOutcome::Idle;
        }
        let frozen = self.lifecycle == Lifecycle::Paused && self.freeze_clock_while_paused;
        let outcome = self.countdown.tick(frozen);
        if outcome == TickOutcome::Expired {
            match self.lifecycle {
                Lifecycle::Active => {
                    info!("⏰ 时间到，自动交卷");
                    self.do_submit();
                }
                _ => {
                    warn!("⏰ 时间在暂停期间耗尽，等待恢复后交卷");
                    self.pending_expiry = true;
                }
            }
        }
        outcome
    }

    pub fn set_camera_state(&mut self, state: CameraState) {
        if !self.torn_down {
            self.camera = state;
        }
    }

    /// 摄像头申请失败：持久提示 + 一次性提示，会话继续
    pub fn set_camera_error(&mut self, error: &AppError) {
        if self.torn_down {
            return;
        }
        if let Some(notice) = camera_notice(error) {
            self.camera_notice = Some(notice.to_string());
        }
        self.push_toast(Toast::error(
            "Camera Error",
            "Unable to access your camera. Please check permissions.",
        ));
    }

    /// 卸载会话，之后任何事件都不再改变状态
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.countdown.stop();
        info!("🧹 会话已卸载 (剩余 {}s)", self.countdown.remaining());
    }

    pub fn controls(&self) -> Controls {
        let active = !self.torn_down && self.lifecycle == Lifecycle::Active;
        let count = self.bank.len();
        Controls {
            can_previous: active && self.current > 0,
            can_next: active && self.current + 1 < count,
            can_answer: active,
            can_submit: active,
            can_final_submit: !self.torn_down
                && self.lifecycle == Lifecycle::Submitted
                && !self.final_submitted,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            student: self.student.clone(),
            lifecycle: self.lifecycle,
            current_index: self.current,
            question_count: self.bank.len(),
            question: self.bank.get(self.current).cloned(),
            answer: self.answers.record(self.current).cloned(),
            answered: (0..self.bank.len())
                .map(|i| self.answers.is_answered(i))
                .collect(),
            remaining_secs: self.countdown.remaining(),
            snapshot: self.snapshot.clone(),
            warning: evaluate(&self.snapshot),
            pause: self.pause.clone(),
            recent_events: self.recent_events.clone(),
            camera: self.camera,
            camera_notice: self.camera_notice.clone(),
            toast: self.toast.clone(),
            toast_seq: self.toast_seq,
            controls: self.controls(),
            score: self.score,
            summary: (self.lifecycle == Lifecycle::Submitted).then(|| self.summary()),
            final_submitted: self.final_submitted,
            torn_down: self.torn_down,
        }
    }

    fn ensure_active(&self) -> Result<(), LifecycleError> {
        match self.lifecycle {
            Lifecycle::Active => Ok(()),
            Lifecycle::Paused => Err(LifecycleError::Paused),
            Lifecycle::Submitted => Err(LifecycleError::AlreadySubmitted),
        }
    }

    fn mutate<F>(&mut self, f: F) -> CommandOutcome
    where
        F: FnOnce(&mut AnswerStore) -> Result<(), LifecycleError>,
    {
        if let Err(e) = self.ensure_active() {
            return CommandOutcome::Rejected(e);
        }
        match f(&mut self.answers) {
            Ok(()) => CommandOutcome::Applied,
            Err(e) => CommandOutcome::Rejected(e),
        }
    }

    fn do_submit(&mut self) {
        let score = self.answers.score();
        self.score_computations += 1;
        self.score = Some(score);
        self.lifecycle = Lifecycle::Submitted;
        self.countdown.stop();
        info!("✅ {} 已交卷: {}", self.student, score);
        self.push_toast(Toast::info("Exam Submitted", score.to_string()));
    }

    fn push_toast(&mut self, toast: Toast) {
        self.toast = Some(toast);
        self.toast_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::infrastructure::Permission;
    use chrono::Local;

    fn session() -> ExamSession {
        session_with(1800, true)
    }

    fn session_with(duration: u32, freeze: bool) -> ExamSession {
        let student = Student {
            name: "Asha Verma".to_string(),
            id: "RA2211003011638".to_string(),
        };
        ExamSession::new(QuestionBank::builtin(), student, duration, freeze)
    }

    fn exam_status(is_paused: bool) -> Polled<ExamStatus> {
        Polled {
            seq: 1,
            fetched_at: Local::now(),
            value: ExamStatus {
                is_paused,
                pause_reason: if is_paused {
                    vec!["Phone detected".to_string()]
                } else {
                    Vec::new()
                },
            },
        }
    }

    #[test]
    fn test_navigation_clamps_without_wraparound() {
        let mut s = session();
        assert_eq!(s.previous(), CommandOutcome::Unchanged);
        for _ in 0..5 {
            assert_eq!(s.next(), CommandOutcome::Applied);
        }
        assert_eq!(s.current_index(), 5);
        assert_eq!(s.next(), CommandOutcome::Unchanged);
        assert_eq!(s.current_index(), 5);
        assert!(s.view().is_last_question());
        assert!(!s.controls().can_next);
        assert!(s.controls().can_previous);
    }

    #[test]
    fn test_pause_rejects_mutations_until_resume() {
        let mut s = session();
        s.apply_command(SessionCommand::SelectOption {
            question: 0,
            option: 1,
        });
        assert!(s.apply_exam_status(exam_status(true)));
        assert_eq!(s.lifecycle(), Lifecycle::Paused);
        assert_eq!(s.pause().reasons, vec!["Phone detected"]);

        assert_eq!(s.next(), CommandOutcome::Rejected(LifecycleError::Paused));
        assert_eq!(s.submit(), CommandOutcome::Rejected(LifecycleError::Paused));
        assert_eq!(
            s.apply_command(SessionCommand::SelectOption {
                question: 0,
                option: 2
            }),
            CommandOutcome::Rejected(LifecycleError::Paused)
        );
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answers().record(0).unwrap().selected, 1);
        assert_eq!(s.controls(), Controls::default());

        s.apply_exam_status(exam_status(false));
        assert_eq!(s.lifecycle(), Lifecycle::Active);
        assert_eq!(s.next(), CommandOutcome::Applied);
    }

    #[test]
    fn test_submit_twice_scores_once() {
        let mut s = session();
        s.apply_command(SessionCommand::SelectOption {
            question: 0,
            option: 1,
        });
        assert_eq!(s.submit(), CommandOutcome::Applied);
        assert_eq!(s.submit(), CommandOutcome::Unchanged);
        assert_eq!(s.lifecycle(), Lifecycle::Submitted);
        assert_eq!(s.score_computations(), 1);
        assert_eq!(s.score().unwrap().correct, 1);

        let view = s.view();
        assert_eq!(view.toast.unwrap().title, "Exam Submitted");
        assert_eq!(view.summary.unwrap().answered, 1);
        assert!(view.controls.can_final_submit);
    }

    #[test]
    fn test_final_submit_only_after_submit_and_once() {
        let mut s = session();
        assert_eq!(
            s.final_submit(),
            CommandOutcome::Rejected(LifecycleError::NotSubmitted)
        );
        s.submit();
        assert_eq!(s.final_submit(), CommandOutcome::Applied);
        assert_eq!(s.final_submit(), CommandOutcome::Unchanged);
        assert!(!s.controls().can_final_submit);
    }

    #[test]
    fn test_failed_final_submit_can_be_retried() {
        let mut s = session();
        s.submit();
        s.final_submit();
        let err = AppError::file_write_failed(
            "submissions.txt",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        s.mark_final_submit_failed(&err);
        assert!(!s.is_final_submitted());
        assert_eq!(s.final_submit(), CommandOutcome::Applied);
    }

    #[test]
    fn test_clock_expiry_submits_exactly_once() {
        let mut s = session();
        let expired = (0..1800)
            .filter(|_| s.tick() == TickOutcome::Expired)
            .count();
        assert_eq!(expired, 1);
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.lifecycle(), Lifecycle::Submitted);
        assert_eq!(s.score_computations(), 1);
        assert_eq!(s.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_clock_frozen_while_paused() {
        let mut s = session_with(10, true);
        s.apply_exam_status(exam_status(true));
        for _ in 0..5 {
            assert_eq!(s.tick(), TickOutcome::Idle);
        }
        assert_eq!(s.remaining_secs(), 10);
    }

    #[test]
    fn test_expiry_during_pause_is_deferred_until_resume() {
        let mut s = session_with(3, false);
        s.apply_exam_status(exam_status(true));
        for _ in 0..3 {
            s.tick();
        }
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.lifecycle(), Lifecycle::Paused);
        assert_eq!(s.score_computations(), 0);

        s.apply_exam_status(exam_status(false));
        assert_eq!(s.lifecycle(), Lifecycle::Submitted);
        assert_eq!(s.score_computations(), 1);
    }

    #[test]
    fn test_submitted_ignores_pause_signal() {
        let mut s = session();
        s.submit();
        s.apply_exam_status(exam_status(true));
        assert_eq!(s.lifecycle(), Lifecycle::Submitted);
    }

    #[test]
    fn test_late_events_after_teardown_change_nothing() {
        let mut s = session();
        s.teardown();
        let before = s.view();

        assert!(!s.apply_exam_status(exam_status(true)));
        assert!(!s.apply_polled(Polled {
            seq: 9,
            fetched_at: Local::now(),
            value: StatusUpdate::Camera(CameraStatus {
                phone_detected: Some(true),
                ..Default::default()
            }),
        }));
        assert_eq!(s.tick(), TickOutcome::Idle);
        assert_eq!(
            s.apply_command(SessionCommand::Next),
            CommandOutcome::Rejected(LifecycleError::TornDown)
        );

        let after = s.view();
        assert_eq!(after.lifecycle, before.lifecycle);
        assert_eq!(after.remaining_secs, before.remaining_secs);
        assert_eq!(after.snapshot, before.snapshot);
        assert_eq!(after.current_index, before.current_index);
        assert!(after.torn_down);
    }

    #[test]
    fn test_events_keep_last_five() {
        let mut s = session();
        let events = (0..8)
            .map(|i| CameraEvent {
                event_type: format!("event-{}", i),
                timestamp: format!("10:00:0{}", i),
            })
            .collect();
        s.apply_camera_events(events);
        let view = s.view();
        assert_eq!(view.recent_events.len(), 5);
        assert_eq!(view.recent_events[0].event_type, "event-3");
    }

    #[test]
    fn test_camera_error_sets_notice_and_toast() {
        let mut s = session();
        let err = AppError::from(DeviceError::PermissionDenied {
            device: "/dev/video0".to_string(),
        });
        s.set_camera_state(CameraState {
            permission: Permission::Denied,
            active: false,
        });
        s.set_camera_error(&err);
        let view = s.view();
        assert_eq!(
            view.camera_notice.as_deref(),
            Some("Camera access denied. Please allow camera permissions.")
        );
        assert_eq!(view.toast.unwrap().title, "Camera Error");
        assert_eq!(view.toast_seq, 1);
        assert_eq!(view.lifecycle, Lifecycle::Active);
    }

    #[test]
    fn test_view_derives_warning_from_snapshot() {
        let mut s = session();
        s.apply_camera_status(Polled {
            seq: 1,
            fetched_at: Local::now(),
            value: CameraStatus {
                phone_detected: Some(true),
                ..Default::default()
            },
        });
        let view = s.view();
        assert!(view.warning.should_warn);
        assert!(view.snapshot.fetched_at.is_some());
    }
}
