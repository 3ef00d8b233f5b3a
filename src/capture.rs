use image::RgbImage;
use v4l::buffer::Type;
use v4l::format::FourCC;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Capture size requested from the driver. The driver may adjust it; the
/// dimensions reported back by `set_format` are the ones trusted.
const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open camera device {0}: {1}")]
    Open(usize, std::io::Error),

    #[error("failed to negotiate capture format: {0}")]
    Format(String),

    #[error("failed to start capture stream: {0}")]
    Stream(std::io::Error),

    #[error("failed to read frame: {0}")]
    Read(String),
}

/// An open V4L2 camera with a running mmap capture stream.
///
/// Dropping the camera tears down the stream and closes the device handle,
/// so release happens on `stop`, on window close, and on every other exit
/// path alike.
pub struct Camera {
    // Held so the device outlives the stream that maps its buffers.
    #[allow(dead_code)]
    device: Device,
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
}

impl Camera {
    /// Opens `/dev/video<index>` and starts streaming YUYV frames.
    pub fn open(index: usize) -> Result<Camera> {
        let device = Device::new(index).map_err(|e| CaptureError::Open(index, e))?;

        let mut fmt = device
            .format()
            .map_err(|e| CaptureError::Format(e.to_string()))?;
        fmt.width = CAPTURE_WIDTH;
        fmt.height = CAPTURE_HEIGHT;
        fmt.fourcc = FourCC::new(b"YUYV");
        let fmt = device
            .set_format(&fmt)
            .map_err(|e| CaptureError::Format(e.to_string()))?;
        if fmt.fourcc != FourCC::new(b"YUYV") {
            return Err(CaptureError::Format(format!(
                "driver refused YUYV, offered {}",
                fmt.fourcc
            )));
        }

        let stream =
            MmapStream::with_buffers(&device, Type::VideoCapture, 4).map_err(CaptureError::Stream)?;

        log::info!(
            "camera {} streaming {}x{} {}",
            index,
            fmt.width,
            fmt.height,
            fmt.fourcc
        );
        Ok(Camera {
            device,
            stream,
            width: fmt.width,
            height: fmt.height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pulls one buffer from the stream and converts it to RGB.
    pub fn read_frame(&mut self) -> Result<RgbImage> {
        let (data, _meta) = self
            .stream
            .next()
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let expected = (self.width * self.height * 2) as usize;
        if data.len() < expected {
            return Err(CaptureError::Read(format!(
                "truncated frame: {} bytes, expected {}",
                data.len(),
                expected
            )));
        }
        Ok(yuyv_to_rgb(data, self.width, self.height))
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("device", &"v4l::Device")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Owns the optional camera and keeps `start`/`stop` idempotent.
#[derive(Debug, Default)]
pub struct CaptureController {
    camera: Option<Camera>,
}

impl CaptureController {
    pub fn new() -> CaptureController {
        CaptureController { camera: None }
    }

    /// Acquires the device and starts streaming. No-op when already running.
    pub fn start(&mut self, index: usize) -> Result<()> {
        if self.camera.is_some() {
            return Ok(());
        }
        self.camera = Some(Camera::open(index)?);
        Ok(())
    }

    /// Stops streaming and releases the device. No-op when already stopped.
    pub fn stop(&mut self) {
        if self.camera.take().is_some() {
            log::info!("camera released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn read_frame(&mut self) -> Option<Result<RgbImage>> {
        self.camera.as_mut().map(Camera::read_frame)
    }
}

/// BT.601 YUYV 4:2:2 to packed RGB.
fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> RgbImage {
    let mut rgb = vec![0u8; (width * height * 3) as usize];
    for (i, chunk) in data
        .chunks_exact(4)
        .take((width * height / 2) as usize)
        .enumerate()
    {
        let [y0, u, y1, v] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let (r0, g0, b0) = yuv_to_rgb(y0, u, v);
        let (r1, g1, b1) = yuv_to_rgb(y1, u, v);
        let out = i * 6;
        rgb[out] = r0;
        rgb[out + 1] = g0;
        rgb[out + 2] = b0;
        rgb[out + 3] = r1;
        rgb[out + 4] = g1;
        rgb[out + 5] = b1;
    }
    RgbImage::from_raw(width, height, rgb).unwrap_or_else(|| RgbImage::new(width, height))
}

#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| x.clamp(0, 255) as u8;
    (
        clamp((298 * c + 409 * e + 128) >> 8),
        clamp((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp((298 * c + 516 * d + 128) >> 8),
    )
}
