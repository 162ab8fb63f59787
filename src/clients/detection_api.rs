use crate::error::AppResult;
use crate::models::status::{Ack, CameraEvent, CameraStatus, ExamStatus, SuspiciousActivity};
use async_trait::async_trait;

/// 外部检测服务的 REST 契约
///
/// 视频/音频分析都在服务端完成，客户端只读取结果
#[async_trait]
pub trait DetectionApi: Send + Sync {
    /// `GET /api/camera_status`
    async fn camera_status(&self) -> AppResult<CameraStatus>;

    /// `GET /api/camera_events`
    async fn camera_events(&self) -> AppResult<Vec<CameraEvent>>;

    /// `GET /api/exam_status`
    async fn exam_status(&self) -> AppResult<ExamStatus>;

    /// `GET /api/suspicious_activities`
    async fn suspicious_activities(&self) -> AppResult<Vec<SuspiciousActivity>>;

    /// `POST /api/start_camera`
    async fn start_camera(&self) -> AppResult<Ack>;

    /// `POST /api/stop_camera`
    async fn stop_camera(&self) -> AppResult<Ack>;

    /// `POST /api/resume_exam`
    async fn resume_exam(&self) -> AppResult<Ack>;
}
