use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 摄像头设备错误
    #[error("设备错误: {0}")]
    Device(#[from] DeviceError),
    /// 检测服务调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 用户输入校验错误
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// 会话生命周期错误
    #[error("生命周期错误: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 摄像头设备错误
#[derive(Debug, Error)]
pub enum DeviceError {
    /// 用户或系统拒绝了摄像头权限
    #[error("摄像头权限被拒绝 ({device})")]
    PermissionDenied { device: String },
    /// 设备不存在或不可用
    #[error("摄像头不可用 ({device}): {reason}")]
    Unavailable { device: String, reason: String },
}

impl DeviceError {
    /// 展示给考生的持久提示
    pub fn notice(&self) -> &'static str {
        "Camera access denied. Please allow camera permissions."
    }
}

/// 检测服务 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 非 2xx 响应
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 请求超时
    #[error("API请求超时 ({endpoint}): {timeout_ms}ms 内无响应")]
    Timeout { endpoint: String, timeout_ms: u64 },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 用户输入校验错误
///
/// Display 文本直接展示给考生
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your full name")]
    MissingName,
    #[error("Please enter your registration number")]
    MissingRegistrationNumber,
    #[error("Registration number must start with RA followed by 13 digits (e.g., RA2211003011638)")]
    MalformedRegistrationNumber,
    #[error("Invalid password. Please try again.")]
    InvalidPassword,
    #[error("You must agree to the terms and conditions to proceed.")]
    TermsNotAccepted,
    #[error("Please type your name to confirm.")]
    MissingNameConfirmation,
    #[error("The name you entered doesn't match your login name.")]
    NameMismatch,
}

/// 会话生命周期错误
///
/// 不会从命令中抛出，只作为 `CommandOutcome::Rejected` 的原因返回
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// 考试已被服务端暂停
    #[error("考试已暂停，操作被拒绝")]
    Paused,
    /// 考试已提交
    #[error("考试已提交，操作被拒绝")]
    AlreadySubmitted,
    /// 考试尚未提交
    #[error("考试尚未提交，无法最终提交")]
    NotSubmitted,
    /// 会话已卸载
    #[error("会话已结束")]
    TornDown,
    /// 题目索引越界
    #[error("题目索引 {index} 超出范围 [0, {max_index}]")]
    IndexOutOfRange { index: usize, max_index: usize },
    /// 题型与操作不符
    #[error("题目 {index} 的题型不支持该作答方式")]
    WrongQuestionKind { index: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 数值必须大于零
    #[error("配置项 {field} 必须大于 0")]
    MustBePositive { field: &'static str },
    /// 必填项为空
    #[error("配置项 {field} 不能为空")]
    Empty { field: &'static str },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建非 2xx 响应错误
    pub fn api_bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        AppError::Api(ApiError::BadStatus {
            endpoint: endpoint.into(),
            status,
        })
    }

    /// 创建请求超时错误
    pub fn api_timeout(endpoint: impl Into<String>, timeout: std::time::Duration) -> Self {
        AppError::Api(ApiError::Timeout {
            endpoint: endpoint.into(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为可恢复的网络错误（保留旧快照，等待下一次轮询）
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Api(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_user_facing() {
        let err: AppError = ValidationError::MalformedRegistrationNumber.into();
        assert_eq!(
            err.to_string(),
            "Registration number must start with RA followed by 13 digits (e.g., RA2211003011638)"
        );
    }

    #[test]
    fn test_bad_status_is_network_error() {
        let err = AppError::api_bad_status("/api/exam_status", 503);
        assert!(err.is_network());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_timeout_is_network_error() {
        let err = AppError::api_timeout("camera_status", std::time::Duration::from_secs(5));
        assert!(err.is_network());
        assert!(err.to_string().contains("5000ms"));
    }
}
