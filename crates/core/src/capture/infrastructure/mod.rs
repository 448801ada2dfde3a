#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_camera;
pub mod scripted_camera;
