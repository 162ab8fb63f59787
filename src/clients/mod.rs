pub mod detection_api;
pub mod detection_client;

pub use detection_api::DetectionApi;
pub use detection_client::DetectionClient;
