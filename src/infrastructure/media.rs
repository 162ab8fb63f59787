//! 本地采集设备抽象

use crate::error::AppResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 摄像头朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// 前置（面向考生）
    User,
    Environment,
}

/// 采集参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
    /// 声音检测在服务端完成，本组件不申请音轨
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: FacingMode::User,
            audio: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// 单条媒体轨道
///
/// `stop` 之后轨道不可恢复
#[derive(Debug)]
pub struct MediaTrack {
    pub kind: TrackKind,
    pub label: String,
    live: Arc<AtomicBool>,
    device: Option<std::fs::File>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            live: Arc::new(AtomicBool::new(true)),
            device: None,
        }
    }

    /// 绑定打开的设备句柄，轨道停止时释放
    pub fn with_device(mut self, device: std::fs::File) -> Self {
        self.device = Some(device);
        self
    }

    /// 外部观察轨道是否仍在运行
    pub fn liveness(&self) -> Arc<AtomicBool> {
        self.live.clone()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        self.device = None;
    }
}

/// 一次成功采集得到的流
///
/// 流被丢弃时所有轨道随之停止
#[derive(Debug)]
pub struct MediaStream {
    pub id: String,
    pub width: u32,
    pub height: u32,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, width: u32, height: u32, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            tracks,
        }
    }

    /// 停止所有轨道，返回本次停止的数量
    pub fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for track in self.tracks.iter_mut().filter(|t| t.is_live()) {
            track.stop();
            stopped += 1;
        }
        stopped
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// 本地采集设备
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// 申请设备。拒绝或不可用时返回 `DeviceError`
    async fn open(&self, constraints: &CaptureConstraints) -> AppResult<MediaStream>;

    /// 设备名称，仅用于日志
    fn name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_all_is_idempotent() {
        let track = MediaTrack::new(TrackKind::Video, "cam");
        let live = track.liveness();
        let mut stream = MediaStream::new("s1", 1280, 720, vec![track]);
        assert_eq!(stream.stop_all(), 1);
        assert!(!live.load(Ordering::SeqCst));
        assert_eq!(stream.stop_all(), 0);
    }

    #[test]
    fn test_dropped_stream_stops_tracks() {
        let track = MediaTrack::new(TrackKind::Video, "cam");
        let live = track.liveness();
        drop(MediaStream::new("s2", 640, 480, vec![track]));
        assert!(!live.load(Ordering::SeqCst));
    }
}
