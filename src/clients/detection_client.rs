/// 检测服务 API 客户端
///
/// 封装所有与检测服务相关的 HTTP 调用
use crate::clients::detection_api::DetectionApi;
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::status::{Ack, CameraEvent, CameraStatus, ExamStatus, SuspiciousActivity};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// 检测服务客户端
#[derive(Clone)]
pub struct DetectionClient {
    http: Client,
    base_url: String,
}

impl DetectionClient {
    /// 创建新的检测服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(&config.api_base_url, config.request_timeout())
    }

    /// 每个请求都受 `timeout` 约束，超时按请求失败处理
    pub fn with_base_url(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::api_request_failed(base_url, e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 发送请求并解析 JSON
    ///
    /// 非 2xx 响应视为失败；响应中多余的字段被忽略
    async fn call<T: DeserializeOwned>(&self, method: Method, endpoint: &str) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if method == Method::POST {
            request = request
                .header("Content-Type", "application/json")
                .body("{}");
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api_bad_status(endpoint, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            })
        })
    }
}

#[async_trait]
impl DetectionApi for DetectionClient {
    async fn camera_status(&self) -> AppResult<CameraStatus> {
        self.call(Method::GET, "/api/camera_status").await
    }

    async fn camera_events(&self) -> AppResult<Vec<CameraEvent>> {
        self.call(Method::GET, "/api/camera_events").await
    }

    async fn exam_status(&self) -> AppResult<ExamStatus> {
        self.call(Method::GET, "/api/exam_status").await
    }

    async fn suspicious_activities(&self) -> AppResult<Vec<SuspiciousActivity>> {
        self.call(Method::GET, "/api/suspicious_activities").await
    }

    async fn start_camera(&self) -> AppResult<Ack> {
        self.call(Method::POST, "/api/start_camera").await
    }

    async fn stop_camera(&self) -> AppResult<Ack> {
        self.call(Method::POST, "/api/stop_camera").await
    }

    async fn resume_exam(&self) -> AppResult<Ack> {
        self.call(Method::POST, "/api/resume_exam").await
    }
}
