/// Title of the window the annotated frames are presented in.
pub const WINDOW_TITLE: &str = "Face Detector";

/// Default camera device index.
pub const CAMERA_INDEX: u32 = 0;

/// Key poll timeout between frames, in milliseconds.
pub const KEY_POLL_MS: u64 = 10;

pub const SCALE_FACTOR: f64 = 1.3;
pub const MIN_NEIGHBORS: u32 = 2;
/// Smallest detectable face as (width, height).
pub const MIN_FACE_SIZE: (u32, u32) = (40, 48);

/// Neighbor grouping tolerance, relative to rectangle size.
pub const GROUP_EPS: f64 = 0.2;

pub const OUTLINE_THICKNESS: u32 = 3;

/// Outline colors, cycled by detection order: white, red, green, blue.
pub const PALETTE: [[u8; 3]; 4] = [[255, 255, 255], [255, 0, 0], [0, 255, 0], [0, 0, 255]];

/// Progress lines are logged every this many frames.
pub const FRAME_LOG_INTERVAL: usize = 100;

pub const CASCADE_FILE_NAME: &str = "haarcascade_frontalface_alt.xml";

#[cfg(target_os = "macos")]
pub const DEFAULT_CASCADE_PATH: &str =
    "/opt/local/share/opencv/haarcascades/haarcascade_frontalface_alt.xml";
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEFAULT_CASCADE_PATH: &str =
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_alt.xml";
#[cfg(not(unix))]
pub const DEFAULT_CASCADE_PATH: &str = CASCADE_FILE_NAME;
