use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::capture::domain::camera::Camera;
use crate::shared::frame::Frame;

/// Grabs frames from a live capture device through libavdevice.
///
/// The platform driver is picked at open time (v4l2, avfoundation or dshow)
/// and every decoded frame is converted to RGB24.
pub struct FfmpegCamera {
    input: Option<Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<scaling::Context>,
    stream_index: usize,
    frame_index: usize,
}

// Safety: FfmpegCamera is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn new() -> Self {
        Self {
            input: None,
            decoder: None,
            scaler: None,
            stream_index: 0,
            frame_index: 0,
        }
    }

    fn convert(&mut self, decoded: &Video) -> Result<Frame, Box<dyn std::error::Error>> {
        let (width, height) = (decoded.width(), decoded.height());
        let stale = self
            .scaler
            .as_ref()
            .map(|s| s.input().width != width || s.input().height != height)
            .unwrap_or(true);
        if stale {
            self.scaler = Some(scaling::Context::get(
                decoded.format(),
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )?);
        }
        let scaler = self.scaler.as_mut().ok_or("FfmpegCamera: no scaler")?;

        let mut rgb = Video::empty();
        scaler.run(decoded, &mut rgb)?;

        let frame = Frame::new(
            extract_rgb_pixels(&rgb, width, height),
            width,
            height,
            3,
            self.frame_index,
        );
        self.frame_index += 1;
        Ok(frame)
    }
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for FfmpegCamera {
    fn open(&mut self, index: u32) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let (driver, url) = device_url(index);
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == driver)
            .ok_or_else(|| format!("capture driver {driver} not available"))?;

        let mut options = ffmpeg_next::Dictionary::new();
        if driver == "avfoundation" {
            options.set("framerate", "30");
        }

        let input = ffmpeg_next::format::open_with(
            &url,
            &ffmpeg_next::format::Format::Input(format),
            options,
        )?
        .input();

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        log::info!(
            "Opened camera {url} via {driver} ({}x{})",
            decoder.width(),
            decoder.height()
        );

        self.stream_index = stream.index();
        self.decoder = Some(decoder);
        self.input = Some(input);
        self.frame_index = 0;
        Ok(())
    }

    fn query_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let (Some(input), Some(decoder)) = (self.input.as_mut(), self.decoder.as_mut()) else {
            return Err("FfmpegCamera: not opened".into());
        };

        let mut decoded = Video::empty();
        loop {
            if decoder.receive_frame(&mut decoded).is_ok() {
                break;
            }
            let Some((stream, packet)) = input.packets().next() else {
                return Ok(None);
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                log::debug!("Dropped camera packet: {e}");
            }
        }

        self.convert(&decoded).map(Some)
    }

    fn release(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Released camera after {} frames", self.frame_index);
        }
        self.decoder = None;
        self.scaler = None;
    }
}

/// Driver name and device URL for a camera index on this platform.
fn device_url(index: u32) -> (&'static str, String) {
    if cfg!(target_os = "macos") {
        ("avfoundation", index.to_string())
    } else if cfg!(target_os = "windows") {
        ("dshow", format!("video={index}"))
    } else {
        ("video4linux2", format!("/dev/video{index}"))
    }
}

/// Copies an RGB24 frame row by row, dropping stride padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_url_uses_index() {
        let (driver, url) = device_url(2);
        assert!(!driver.is_empty());
        assert!(url.contains('2'));
    }

    #[test]
    fn test_query_before_open_is_error() {
        let mut cam = FfmpegCamera::new();
        assert!(cam.query_frame().is_err());
    }

    #[test]
    fn test_release_without_open_is_noop() {
        let mut cam = FfmpegCamera::new();
        cam.release();
        assert!(cam.input.is_none());
    }
}
