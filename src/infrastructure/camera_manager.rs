//! 摄像头生命周期管理 - 基础设施层
//!
//! 持有唯一的采集流，只暴露"申请 / 释放"能力

use crate::error::{AppError, AppResult};
use crate::infrastructure::media::{CameraDevice, CaptureConstraints, MediaStream};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 摄像头权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// 尚未申请
    #[default]
    Pending,
    Granted,
    Denied,
}

/// 上报给编排层的摄像头状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraState {
    pub permission: Permission,
    pub active: bool,
}

/// 摄像头管理器
///
/// 职责：
/// - 唯一持有 MediaStream
/// - 每次挂载最多申请一次设备，重复调用无副作用
/// - 打开设备的过程与持有分离：`begin_acquire` 交出打开设备的 future，
///   调用方在别处等待，结果再交回 `install`
/// - `release` 幂等，Drop 时兜底释放
pub struct CameraManager {
    device: Arc<dyn CameraDevice>,
    constraints: CaptureConstraints,
    stream: Option<MediaStream>,
    state: CameraState,
    attempted: bool,
}

impl CameraManager {
    pub fn new(device: Arc<dyn CameraDevice>, constraints: CaptureConstraints) -> Self {
        Self {
            device,
            constraints,
            stream: None,
            state: CameraState::default(),
            attempted: false,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    /// 开始申请摄像头
    ///
    /// 已持有流或本次挂载已尝试过时返回 `None`
    pub fn begin_acquire(&mut self) -> Option<BoxFuture<'static, AppResult<MediaStream>>> {
        if self.stream.is_some() || self.attempted {
            debug!("摄像头已申请过，跳过: {}", self.device.name());
            return None;
        }
        self.attempted = true;

        let device = self.device.clone();
        let constraints = self.constraints.clone();
        Some(async move { device.open(&constraints).await }.boxed())
    }

    /// 接收打开设备的结果
    pub fn install(&mut self, opened: AppResult<MediaStream>) -> AppResult<CameraState> {
        match opened {
            Ok(stream) => {
                info!(
                    "📷 摄像头已就绪: {} ({}x{})",
                    self.device.name(),
                    stream.width,
                    stream.height
                );
                self.stream = Some(stream);
                self.state = CameraState {
                    permission: Permission::Granted,
                    active: true,
                };
                Ok(self.state)
            }
            Err(e) => {
                warn!("⚠️ 无法访问摄像头 {}: {}", self.device.name(), e);
                self.state = CameraState {
                    permission: Permission::Denied,
                    active: false,
                };
                Err(e)
            }
        }
    }

    /// 停止所有轨道并清空句柄；未持有时无操作
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let stopped = stream.stop_all();
            info!("📷 摄像头已释放: {} (停止 {} 条轨道)", stream.id, stopped);
            self.state.active = false;
        }
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

/// 把设备错误转换成考生可见的提示
pub fn camera_notice(error: &AppError) -> Option<&'static str> {
    match error {
        AppError::Device(e) => Some(e.notice()),
        _ => None,
    }
}
