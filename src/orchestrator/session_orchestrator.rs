//! 考试会话编排器 - 编排层
//!
//! ## 职责
//!
//! 把摄像头、三个轮询器、倒计时时钟和界面命令合并成一条事件流，
//! 由单个任务按到达顺序逐条处理。
//!
//! ## 核心功能
//!
//! 1. **挂载**：后台打开摄像头、通知检测服务开始监控、启动轮询器与时钟，不等待其中任何一项
//! 2. **事件循环**：唯一持有 `ExamSession`，处理命令 / 轮询结果 / tick
//! 3. **发布视图**：每处理完一个事件就通过 watch 通道发布 `SessionView`
//! 4. **卸载**：取消所有后台任务并等待其结束，释放摄像头，通知检测服务停止监控（有超时）
//!
//! ## 设计特点
//!
//! - **单写多读**：只有本任务修改会话状态，界面只读视图
//! - **资源所有者**：唯一持有 CameraManager 与所有 JoinHandle
//! - **必定清理**：正常结束走 `teardown`，future 被提前丢弃时由 Drop 兜底

use crate::clients::DetectionApi;
use crate::config::Config;
use crate::error::{AppError, AppResult, LifecycleError};
use crate::infrastructure::{CameraDevice, CameraManager, CaptureConstraints, MediaStream};
use crate::models::question::QuestionBank;
use crate::models::status::Polled;
use crate::models::student::Student;
use crate::services::answer_store::ScoreReport;
use crate::services::countdown::spawn_clock;
use crate::services::status_poller::{PollTarget, StatusPoller, StatusUpdate};
use crate::services::submission_writer::SubmissionWriter;
use crate::workflow::exam_session::{CommandOutcome, ExamSession, SessionCommand};
use crate::workflow::session_view::{Lifecycle, SessionView};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 事件队列容量
const EVENT_QUEUE_CAPACITY: usize = 64;

/// 时钟周期
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// 编排器处理的事件
#[derive(Debug)]
pub enum SessionEvent {
    /// 界面命令，处理结果通过 oneshot 返回
    Command(SessionCommand, oneshot::Sender<CommandOutcome>),
    /// 一次完成的轮询
    Polled(Polled<StatusUpdate>),
    /// 摄像头打开完成（成功或失败）
    CameraOpened(AppResult<MediaStream>),
    /// 时钟前进一秒
    Tick,
    /// 结束会话
    Shutdown,
}

/// 界面持有的会话句柄
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// 发送命令并等待处理结果
    ///
    /// 会话已结束时返回 `Rejected(TornDown)`
    pub async fn send(&self, command: SessionCommand) -> CommandOutcome {
        let (reply, outcome) = oneshot::channel();
        if self
            .tx
            .send(SessionEvent::Command(command, reply))
            .await
            .is_err()
        {
            return CommandOutcome::Rejected(LifecycleError::TornDown);
        }
        outcome
            .await
            .unwrap_or(CommandOutcome::Rejected(LifecycleError::TornDown))
    }

    /// 当前视图
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// 订阅视图变化
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// 请求结束会话
    pub async fn shutdown(&self) {
        if self.tx.send(SessionEvent::Shutdown).await.is_err() {
            debug!("会话已结束，忽略 shutdown");
        }
    }
}

/// 会话结束报告
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub student: Student,
    pub lifecycle: Lifecycle,
    pub remaining_secs: u32,
    pub answered: usize,
    pub total: usize,
    pub score: Option<ScoreReport>,
    pub final_submitted: bool,
}

/// 考试会话编排器
pub struct SessionOrchestrator {
    config: Config,
    session: ExamSession,
    api: Arc<dyn DetectionApi>,
    camera: CameraManager,
    writer: SubmissionWriter,
    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
    view_tx: watch::Sender<SessionView>,
    /// 摄像头打开、开始监控调用与轮询器
    tasks: Vec<JoinHandle<()>>,
    clock: Option<JoinHandle<()>>,
    mounted: bool,
    stop_issued: bool,
}

impl SessionOrchestrator {
    /// 创建编排器
    ///
    /// 题库显式注入，测试可以替换为任意题目
    pub fn new(
        config: Config,
        bank: QuestionBank,
        student: Student,
        api: Arc<dyn DetectionApi>,
        device: Arc<dyn CameraDevice>,
    ) -> (Self, SessionHandle) {
        let session = ExamSession::new(
            bank,
            student,
            config.exam_duration_secs,
            config.freeze_clock_while_paused,
        );
        let constraints = CaptureConstraints {
            ideal_width: config.camera_width,
            ideal_height: config.camera_height,
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (view_tx, view_rx) = watch::channel(session.view());
        let handle = SessionHandle {
            tx: tx.clone(),
            view: view_rx,
        };

        let orchestrator = Self {
            writer: SubmissionWriter::new(&config.submission_file),
            camera: CameraManager::new(device, constraints),
            config,
            session,
            api,
            tx,
            rx,
            view_tx,
            tasks: Vec::new(),
            clock: None,
            mounted: false,
            stop_issued: false,
        };
        (orchestrator, handle)
    }

    /// 运行会话直到收到 Shutdown 或所有视图订阅者都已关闭
    pub async fn run(mut self) -> AppResult<SessionReport> {
        self.mount();
        self.publish();

        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(SessionEvent::Shutdown) | None => {
                        info!("🛑 收到结束请求");
                        break;
                    }
                    Some(event) => self.handle_event(event).await,
                },
                _ = self.view_tx.closed() => {
                    info!("🛑 界面已全部关闭，结束会话");
                    break;
                }
            }
            self.publish();
        }

        self.teardown().await;
        Ok(self.report())
    }

    /// 挂载：启动所有后台任务后立即返回
    ///
    /// 摄像头打开的结果以 `CameraOpened` 事件送回
    fn mount(&mut self) {
        self.mounted = true;

        if let Some(open) = self.camera.begin_acquire() {
            let tx = self.tx.clone();
            self.tasks.push(tokio::spawn(async move {
                let opened = open.await;
                // 发送失败时流随事件一起被丢弃，轨道随之停止
                if tx.send(SessionEvent::CameraOpened(opened)).await.is_err() {
                    debug!("会话已结束，丢弃摄像头");
                }
            }));
        }

        let api = self.api.clone();
        self.tasks.push(tokio::spawn(async move {
            match api.start_camera().await {
                Ok(_) => info!("📡 检测服务已开始监控"),
                Err(e) => warn!("⚠️ 通知检测服务开始监控失败: {}", e),
            }
        }));

        let pollers = [
            (PollTarget::ExamStatus, self.config.exam_status_interval()),
            (PollTarget::CameraStatus, self.config.camera_status_interval()),
            (PollTarget::CameraEvents, self.config.camera_events_interval()),
        ];
        for (target, period) in pollers {
            let poller =
                StatusPoller::new(self.api.clone(), target, period, self.config.request_timeout());
            self.tasks
                .push(poller.spawn(self.tx.clone(), SessionEvent::Polled));
        }

        self.clock = Some(spawn_clock(CLOCK_PERIOD, self.tx.clone(), || {
            SessionEvent::Tick
        }));

        info!(
            "🎬 会话已挂载: {} 道题, 时长 {}s",
            self.session.bank().len(),
            self.session.remaining_secs()
        );
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command, reply) => {
                let is_final = command == SessionCommand::FinalSubmit;
                let outcome = self.session.apply_command(command);
                if let CommandOutcome::Rejected(e) = outcome {
                    debug!("命令被拒绝: {}", e);
                }
                if is_final && outcome.is_applied() {
                    self.write_submission().await;
                }
                if reply.send(outcome).is_err() {
                    debug!("命令发送方已放弃等待结果");
                }
            }
            SessionEvent::Polled(polled) => {
                self.session.apply_polled(polled);
            }
            SessionEvent::CameraOpened(opened) => match self.camera.install(opened) {
                Ok(state) => self.session.set_camera_state(state),
                Err(e) => {
                    self.session.set_camera_state(self.camera.state());
                    self.session.set_camera_error(&e);
                }
            },
            SessionEvent::Tick => {
                self.session.tick();
            }
            SessionEvent::Shutdown => {}
        }

        if self.session.lifecycle() == Lifecycle::Submitted {
            self.stop_clock();
        }
    }

    /// 最终提交：写入提交记录
    async fn write_submission(&mut self) {
        let Some(score) = self.session.score() else {
            return;
        };
        let result = self
            .writer
            .write(
                self.session.student(),
                self.session.bank(),
                self.session.answers(),
                score,
                self.session.remaining_secs(),
            )
            .await;
        match result {
            Ok(()) => {
                info!("📨 提交记录已写入: {}", self.writer.path().display());
                self.session.mark_final_submit_done();
            }
            Err(e) => {
                error!("❌ 写入提交记录失败: {}", e);
                self.session.mark_final_submit_failed(&e);
            }
        }
    }

    /// 交卷后取消时钟，避免迟到的 tick
    fn stop_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.abort();
            debug!("⏹ 已交卷，取消倒计时时钟");
        }
    }

    /// 卸载：后台任务全部结束后，释放摄像头并停止监控
    ///
    /// 摄像头先于网络调用释放；停止监控最多等待 `request_timeout`
    async fn teardown(&mut self) {
        self.session.teardown();

        let mut handles: Vec<JoinHandle<()>> = self.tasks.drain(..).collect();
        handles.extend(self.clock.take());
        for handle in &handles {
            handle.abort();
        }
        let cancelled = join_all(handles)
            .await
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_cancelled()))
            .count();
        debug!("已取消 {} 个后台任务", cancelled);

        // 队列里尚未处理的摄像头结果随事件一起丢弃
        self.rx.close();
        while self.rx.try_recv().is_ok() {}

        self.camera.release();

        if !self.stop_issued {
            self.stop_issued = true;
            match stop_monitoring(self.api.as_ref(), self.config.request_timeout()).await {
                Ok(()) => info!("📡 检测服务已停止监控"),
                Err(e) => warn!("⚠️ 通知检测服务停止监控失败: {}", e),
            }
        }

        self.publish();
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }

    fn report(&self) -> SessionReport {
        let summary = self.session.summary();
        SessionReport {
            student: self.session.student().clone(),
            lifecycle: self.session.lifecycle(),
            remaining_secs: self.session.remaining_secs(),
            answered: summary.answered,
            total: summary.total,
            score: self.session.score(),
            final_submitted: self.session.is_final_submitted(),
        }
    }
}

/// 通知检测服务停止监控，超过 `limit` 视为失败
async fn stop_monitoring(api: &dyn DetectionApi, limit: Duration) -> AppResult<()> {
    match tokio::time::timeout(limit, api.stop_camera()).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(AppError::api_timeout("/api/stop_camera", limit)),
    }
}

impl Drop for SessionOrchestrator {
    fn drop(&mut self) {
        for handle in self.tasks.drain(..).chain(self.clock.take()) {
            handle.abort();
        }
        if self.mounted && !self.stop_issued {
            self.stop_issued = true;
            warn!("⚠️ 会话未正常卸载，兜底停止监控");
            let api = self.api.clone();
            let limit = self.config.request_timeout();
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Err(e) = stop_monitoring(api.as_ref(), limit).await {
                        warn!("⚠️ 兜底停止监控失败: {}", e);
                    }
                });
            }
        }
        // 摄像头由 CameraManager 的 Drop 释放
    }
}
