#[cfg(feature = "highgui")]
pub mod highgui_display;
pub mod recording_display;
