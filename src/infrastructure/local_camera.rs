//! 本机视频设备节点（例如 `/dev/video0`）

use crate::error::{AppResult, DeviceError};
use crate::infrastructure::media::{
    CameraDevice, CaptureConstraints, MediaStream, MediaTrack, TrackKind,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// 通过设备节点打开的本地摄像头
///
/// 持有打开的文件句柄即视为占用设备，轨道停止时关闭
pub struct LocalCamera {
    device_path: PathBuf,
}

impl LocalCamera {
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }
}

#[async_trait]
impl CameraDevice for LocalCamera {
    async fn open(&self, constraints: &CaptureConstraints) -> AppResult<MediaStream> {
        let path = self.device_path.clone();
        let device = self.name();
        debug!(
            "打开摄像头 {}: {}x{} {:?}",
            device, constraints.ideal_width, constraints.ideal_height, constraints.facing
        );

        let opened = tokio::task::spawn_blocking(move || {
            std::fs::OpenOptions::new().read(true).write(true).open(path)
        })
        .await
        .map_err(|e| DeviceError::Unavailable {
            device: device.clone(),
            reason: e.to_string(),
        })?;

        let file = match opened {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(DeviceError::PermissionDenied { device }.into());
            }
            Err(e) => {
                return Err(DeviceError::Unavailable {
                    device,
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let track = MediaTrack::new(TrackKind::Video, device.clone()).with_device(file);
        Ok(MediaStream::new(
            format!("{}#{}", device, chrono::Local::now().timestamp_millis()),
            constraints.ideal_width,
            constraints.ideal_height,
            vec![track],
        ))
    }

    fn name(&self) -> String {
        self.device_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_missing_device_is_unavailable() {
        let camera = LocalCamera::new("/nonexistent/video-device");
        match camera.open(&CaptureConstraints::default()).await {
            Err(AppError::Device(DeviceError::Unavailable { device, .. })) => {
                assert_eq!(device, "/nonexistent/video-device")
            }
            other => panic!("unexpected: {:?}", other.map(|s| s.id.clone())),
        }
    }
}
