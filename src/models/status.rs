//! 检测服务的数据结构
//!
//! 字段名与 REST 返回保持一致，未列出的字段一律忽略

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /api/camera_status`
///
/// 缺失的布尔字段解析为 `None`（未知），不等同于 `false`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraStatus {
    #[serde(default)]
    pub face_detected: Option<bool>,
    #[serde(default)]
    pub multiple_faces: Option<bool>,
    #[serde(default)]
    pub phone_detected: Option<bool>,
    #[serde(default)]
    pub looking_away: Option<bool>,
    #[serde(default)]
    pub voice_detected: Option<bool>,
    #[serde(default)]
    pub suspicious_events_count: Option<u32>,
}

/// `GET /api/exam_status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamStatus {
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub pause_reason: Vec<String>,
}

/// `GET /api/camera_events` 中的单个事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraEvent {
    pub event_type: String,
    pub timestamp: String,
}

/// `GET /api/suspicious_activities` 中的单条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousActivity {
    pub timestamp: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub should_pause: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub features: BTreeMap<String, serde_json::Value>,
}

impl SuspiciousActivity {
    /// 严重程度标签
    pub fn severity(&self) -> &'static str {
        if self.should_pause {
            "Critical"
        } else {
            "Warning"
        }
    }
}

impl std::fmt::Display for SuspiciousActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} 置信度: {:.1}% 原因: {}",
            self.severity(),
            self.timestamp,
            self.confidence * 100.0,
            if self.reasons.is_empty() {
                "-".to_string()
            } else {
                self.reasons.join("; ")
            }
        )
    }
}

/// POST 命令的确认
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(flatten)]
    pub body: BTreeMap<String, serde_json::Value>,
}

/// 最近一次成功轮询得到的检测快照
///
/// 每次成功轮询整体替换，不做字段合并
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProctoringSnapshot {
    pub face_detected: Option<bool>,
    pub multiple_faces: Option<bool>,
    pub phone_detected: Option<bool>,
    pub looking_away: Option<bool>,
    pub voice_detected: Option<bool>,
    pub suspicious_events_count: u32,
    /// `None` 表示尚未成功轮询过
    pub fetched_at: Option<DateTime<Local>>,
}

impl ProctoringSnapshot {
    pub fn from_status(status: CameraStatus, fetched_at: DateTime<Local>) -> Self {
        Self {
            face_detected: status.face_detected,
            multiple_faces: status.multiple_faces,
            phone_detected: status.phone_detected,
            looking_away: status.looking_away,
            voice_detected: status.voice_detected,
            suspicious_events_count: status.suspicious_events_count.unwrap_or(0),
            fetched_at: Some(fetched_at),
        }
    }
}

/// 服务端暂停状态的本地镜像
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseState {
    pub is_paused: bool,
    pub reasons: Vec<String>,
}

impl From<ExamStatus> for PauseState {
    fn from(status: ExamStatus) -> Self {
        Self {
            is_paused: status.is_paused,
            reasons: status.pause_reason,
        }
    }
}

/// 一次完成的轮询结果
#[derive(Debug, Clone)]
pub struct Polled<T> {
    /// 发起顺序编号，仅用于日志
    pub seq: u64,
    /// 完成时间
    pub fetched_at: DateTime<Local>,
    pub value: T,
}
