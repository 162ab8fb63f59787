#![allow(dead_code)]

use async_trait::async_trait;
use exam_proctor::error::{AppError, AppResult, DeviceError};
use exam_proctor::infrastructure::{CameraDevice, CaptureConstraints, MediaStream, MediaTrack, TrackKind};
use exam_proctor::models::{
    Ack, CameraEvent, CameraStatus, ExamStatus, QuestionBank, Student, SuspiciousActivity,
};
use exam_proctor::{Config, DetectionApi};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 按脚本返回的检测服务
#[derive(Default)]
pub struct FakeDetectionApi {
    pub exam: Mutex<ExamStatus>,
    pub camera: Mutex<CameraStatus>,
    pub events: Mutex<Vec<CameraEvent>>,
    /// 优先于 `camera` 返回，每项带一个响应延迟
    pub camera_script: Mutex<VecDeque<(Duration, CameraStatus)>>,
    pub fail_camera: AtomicBool,
    /// 状态查询接收请求但永不响应
    pub hang_status: AtomicBool,
    /// 停止监控接收请求但永不响应
    pub hang_stop: AtomicBool,
    /// 当前未完成的状态查询数
    pub in_flight: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub resume_calls: AtomicUsize,
    pub camera_calls: AtomicUsize,
}

impl FakeDetectionApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_paused(&self, paused: bool, reasons: &[&str]) {
        *self.exam.lock().unwrap() = ExamStatus {
            is_paused: paused,
            pause_reason: reasons.iter().map(|r| r.to_string()).collect(),
        };
    }

    pub fn set_camera(&self, status: CameraStatus) {
        *self.camera.lock().unwrap() = status;
    }

    pub fn script_camera(&self, delay: Duration, status: CameraStatus) {
        self.camera_script.lock().unwrap().push_back((delay, status));
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn hang_if_stalled(&self) {
        if self.hang_status.load(Ordering::SeqCst) {
            let _pending = InFlight::enter(&self.in_flight);
            std::future::pending::<()>().await;
        }
    }
}

/// 请求被取消或完成时计数减一
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DetectionApi for FakeDetectionApi {
    async fn camera_status(&self) -> AppResult<CameraStatus> {
        self.camera_calls.fetch_add(1, Ordering::SeqCst);
        self.hang_if_stalled().await;
        let scripted = self.camera_script.lock().unwrap().pop_front();
        if let Some((delay, status)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(status);
        }
        if self.fail_camera.load(Ordering::SeqCst) {
            return Err(AppError::api_bad_status("/api/camera_status", 503));
        }
        Ok(self.camera.lock().unwrap().clone())
    }

    async fn camera_events(&self) -> AppResult<Vec<CameraEvent>> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn exam_status(&self) -> AppResult<ExamStatus> {
        self.hang_if_stalled().await;
        Ok(self.exam.lock().unwrap().clone())
    }

    async fn suspicious_activities(&self) -> AppResult<Vec<SuspiciousActivity>> {
        Ok(Vec::new())
    }

    async fn start_camera(&self) -> AppResult<Ack> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Ack::default())
    }

    async fn stop_camera(&self) -> AppResult<Ack> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_stop.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(Ack::default())
    }

    async fn resume_exam(&self) -> AppResult<Ack> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        self.set_paused(false, &[]);
        Ok(Ack::default())
    }
}

/// 记录轨道存活状态的假摄像头
#[derive(Default)]
pub struct FakeCamera {
    pub deny: bool,
    /// 打开设备的耗时
    pub open_delay: Duration,
    pub opens: AtomicUsize,
    pub tracks: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakeCamera {
    pub fn granted() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            deny: true,
            ..Default::default()
        })
    }

    pub fn slow(open_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            open_delay,
            ..Default::default()
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn any_track_live(&self) -> bool {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .any(|live| live.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn open(&self, constraints: &CaptureConstraints) -> AppResult<MediaStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.open_delay).await;
        if self.deny {
            return Err(DeviceError::PermissionDenied {
                device: "fake-camera".to_string(),
            }
            .into());
        }
        let track = MediaTrack::new(TrackKind::Video, "fake-camera");
        self.tracks.lock().unwrap().push(track.liveness());
        Ok(MediaStream::new(
            "fake-stream",
            constraints.ideal_width,
            constraints.ideal_height,
            vec![track],
        ))
    }

    fn name(&self) -> String {
        "fake-camera".to_string()
    }
}

pub fn student() -> Student {
    Student {
        name: "Asha Verma".to_string(),
        id: "RA2211003011638".to_string(),
    }
}

pub fn bank() -> QuestionBank {
    QuestionBank::builtin()
}

pub fn config(duration_secs: u32) -> Config {
    Config {
        exam_duration_secs: duration_secs,
        submission_file: std::env::temp_dir()
            .join(format!("exam_proctor_test_{}.txt", std::process::id()))
            .display()
            .to_string(),
        ..Default::default()
    }
}
