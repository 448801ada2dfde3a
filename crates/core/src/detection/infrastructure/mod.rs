pub mod cascade_face_detector;
pub mod haar_cascade;
pub mod integral_image;
#[cfg(feature = "objdetect")]
pub mod opencv_cascade_detector;
