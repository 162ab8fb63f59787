pub mod camera_manager;
pub mod local_camera;
pub mod media;

pub use camera_manager::{camera_notice, CameraManager, CameraState, Permission};
pub use local_camera::LocalCamera;
pub use media::{CameraDevice, CaptureConstraints, FacingMode, MediaStream, MediaTrack, TrackKind};
