//! 状态轮询服务 - 业务能力层
//!
//! 只负责"定时拉取并上报"能力，不解释结果

use crate::clients::DetectionApi;
use crate::error::{AppError, AppResult};
use crate::models::status::{CameraEvent, CameraStatus, ExamStatus, Polled};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 轮询目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// 考试暂停状态
    ExamStatus,
    /// 摄像头检测状态
    CameraStatus,
    /// 近期摄像头事件（较慢的汇总视图）
    CameraEvents,
}

/// 一次成功轮询的内容
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Exam(ExamStatus),
    Camera(CameraStatus),
    Events(Vec<CameraEvent>),
}

impl PollTarget {
    pub fn name(self) -> &'static str {
        match self {
            PollTarget::ExamStatus => "exam_status",
            PollTarget::CameraStatus => "camera_status",
            PollTarget::CameraEvents => "camera_events",
        }
    }

    pub async fn fetch(self, api: &dyn DetectionApi) -> AppResult<StatusUpdate> {
        Ok(match self {
            PollTarget::ExamStatus => StatusUpdate::Exam(api.exam_status().await?),
            PollTarget::CameraStatus => StatusUpdate::Camera(api.camera_status().await?),
            PollTarget::CameraEvents => StatusUpdate::Events(api.camera_events().await?),
        })
    }
}

/// 状态轮询器
///
/// 职责：
/// - 按固定间隔发起请求，每次请求互相独立
/// - 不去重、不排序：结果按完成顺序投递（最后完成的生效）
/// - 失败只记日志，等待下一次轮询
/// - 单次请求超过 `fetch_timeout` 即按失败处理，在途请求数因此有上限
/// - 任务被取消时，所有在途请求一并取消
pub struct StatusPoller {
    api: Arc<dyn DetectionApi>,
    target: PollTarget,
    period: Duration,
    fetch_timeout: Duration,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn DetectionApi>,
        target: PollTarget,
        period: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            api,
            target,
            period,
            fetch_timeout,
        }
    }

    /// 启动轮询任务
    ///
    /// `wrap` 把结果包装成接收方的事件类型；接收方关闭后任务自行退出
    pub fn spawn<E, F>(self, tx: mpsc::Sender<E>, wrap: F) -> JoinHandle<()>
    where
        E: Send + 'static,
        F: Fn(Polled<StatusUpdate>) -> E + Send + Sync + 'static,
    {
        tokio::spawn(self.run(tx, Arc::new(wrap)))
    }

    async fn run<E, F>(self, tx: mpsc::Sender<E>, wrap: Arc<F>)
    where
        E: Send + 'static,
        F: Fn(Polled<StatusUpdate>) -> E + Send + Sync + 'static,
    {
        let target = self.target;
        let fetch_timeout = self.fetch_timeout;
        info!("🔄 开始轮询 {} (间隔 {:?})", target.name(), self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();
        let mut seq: u64 = 0;

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => {
                    seq += 1;
                    let api = self.api.clone();
                    let tx = tx.clone();
                    let wrap = wrap.clone();
                    let this_seq = seq;
                    in_flight.spawn(async move {
                        let fetched = timeout(fetch_timeout, target.fetch(api.as_ref()))
                            .await
                            .unwrap_or_else(|_| Err(AppError::api_timeout(target.name(), fetch_timeout)));
                        match fetched {
                            Ok(value) => {
                                let polled = Polled {
                                    seq: this_seq,
                                    fetched_at: Local::now(),
                                    value,
                                };
                                if tx.send(wrap(polled)).await.is_err() {
                                    debug!("[{}] 接收方已关闭，丢弃第 {} 次结果", target.name(), this_seq);
                                }
                            }
                            Err(e) => {
                                warn!("⚠️ [{}] 第 {} 次轮询失败，保留旧数据: {}", target.name(), this_seq, e);
                            }
                        }
                    });
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        in_flight.abort_all();
        info!("⏹ 停止轮询 {}", target.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names_match_endpoints() {
        assert_eq!(PollTarget::ExamStatus.name(), "exam_status");
        assert_eq!(PollTarget::CameraStatus.name(), "camera_status");
        assert_eq!(PollTarget::CameraEvents.name(), "camera_events");
    }
}
