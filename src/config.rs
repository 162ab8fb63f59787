use crate::error::{AppResult, ConfigError};
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 检测服务地址
    pub api_base_url: String,
    /// 考试时长（秒）
    pub exam_duration_secs: u32,
    /// 考试暂停状态轮询间隔（毫秒）
    pub exam_status_poll_ms: u64,
    /// 摄像头检测状态轮询间隔（毫秒）
    pub camera_status_poll_ms: u64,
    /// 摄像头事件轮询间隔（毫秒）
    pub camera_events_poll_ms: u64,
    /// 单次检测服务请求的超时（毫秒），轮询与停止监控都受其约束
    pub request_timeout_ms: u64,
    // --- 摄像头配置 ---
    pub camera_device: String,
    pub camera_width: u32,
    pub camera_height: u32,
    /// 暂停期间是否冻结倒计时
    pub freeze_clock_while_paused: bool,
    /// 题库 TOML 文件，为空时使用内置题库
    pub question_bank_path: Option<String>,
    /// 最终提交记录文件
    pub submission_file: String,
    /// 考试口令
    pub exam_password: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            exam_duration_secs: 1800,
            exam_status_poll_ms: 1000,
            camera_status_poll_ms: 1000,
            camera_events_poll_ms: 5000,
            request_timeout_ms: 5000,
            camera_device: "/dev/video0".to_string(),
            camera_width: 1280,
            camera_height: 720,
            freeze_clock_while_paused: true,
            question_bank_path: None,
            submission_file: "submissions.txt".to_string(),
            exam_password: "Dragon".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            exam_duration_secs: parse_env("EXAM_DURATION_SECS").unwrap_or(default.exam_duration_secs),
            exam_status_poll_ms: parse_env("EXAM_STATUS_POLL_MS").unwrap_or(default.exam_status_poll_ms),
            camera_status_poll_ms: parse_env("CAMERA_STATUS_POLL_MS").unwrap_or(default.camera_status_poll_ms),
            camera_events_poll_ms: parse_env("CAMERA_EVENTS_POLL_MS").unwrap_or(default.camera_events_poll_ms),
            request_timeout_ms: parse_env("REQUEST_TIMEOUT_MS").unwrap_or(default.request_timeout_ms),
            camera_device: std::env::var("CAMERA_DEVICE").unwrap_or(default.camera_device),
            camera_width: parse_env("CAMERA_WIDTH").unwrap_or(default.camera_width),
            camera_height: parse_env("CAMERA_HEIGHT").unwrap_or(default.camera_height),
            freeze_clock_while_paused: parse_env("FREEZE_CLOCK_WHILE_PAUSED").unwrap_or(default.freeze_clock_while_paused),
            question_bank_path: std::env::var("QUESTION_BANK_PATH").ok().or(default.question_bank_path),
            submission_file: std::env::var("SUBMISSION_FILE").unwrap_or(default.submission_file),
            exam_password: std::env::var("EXAM_PASSWORD").unwrap_or(default.exam_password),
            verbose_logging: parse_env("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Empty { field: "api_base_url" }.into());
        }
        if self.exam_password.is_empty() {
            return Err(ConfigError::Empty { field: "exam_password" }.into());
        }
        let positive = [
            ("exam_duration_secs", u64::from(self.exam_duration_secs)),
            ("exam_status_poll_ms", self.exam_status_poll_ms),
            ("camera_status_poll_ms", self.camera_status_poll_ms),
            ("camera_events_poll_ms", self.camera_events_poll_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("camera_width", u64::from(self.camera_width)),
            ("camera_height", u64::from(self.camera_height)),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::MustBePositive { field }.into());
            }
        }
        Ok(())
    }

    pub fn exam_status_interval(&self) -> Duration {
        Duration::from_millis(self.exam_status_poll_ms)
    }

    pub fn camera_status_interval(&self) -> Duration {
        Duration::from_millis(self.camera_status_poll_ms)
    }

    pub fn camera_events_interval(&self) -> Duration {
        Duration::from_millis(self.camera_events_poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
