use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use opencv::{imgproc, prelude::*, videoio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Connector, DeviceAddress, Frame, FrameSource, StreamConfig};
use crate::error::SourceError;
use crate::shared::constants::THREAD_JOIN_TIMEOUT_MS;
use crate::sync::join_within;
use crate::utils::logger;

/// Opens network video streams through OpenCV.
///
/// `url_template` may contain `{host}` and `{port}`.
pub struct StreamConnector {
    url_template: String,
}

impl StreamConnector {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self { url_template: url_template.into() }
    }

    pub fn url_for(&self, address: &DeviceAddress) -> String {
        self.url_template
            .replace("{host}", &address.host)
            .replace("{port}", &address.port.to_string())
    }
}

impl Connector for StreamConnector {
    fn connect(&self, address: &DeviceAddress) -> Result<Box<dyn FrameSource>, SourceError> {
        let url = self.url_for(address);
        let capture = open_capture(&url).map_err(|reason| SourceError::Connection {
            address: address.to_string(),
            reason,
        })?;
        logger::info(&format!("OpenCV stream opened: {}", url));

        Ok(Box::new(StreamCamera {
            url,
            capture: Some(capture),
            reader: None,
        }))
    }
}

fn open_capture(url: &str) -> Result<videoio::VideoCapture, String> {
    // CAP_ANY lets OpenCV pick FFmpeg/GStreamer for network URLs
    let capture =
        videoio::VideoCapture::from_file(url, videoio::CAP_ANY).map_err(|e| e.to_string())?;
    if !capture.is_opened().map_err(|e| e.to_string())? {
        return Err(format!("failed to open stream {}", url));
    }
    Ok(capture)
}

pub struct StreamCamera {
    url: String,
    capture: Option<videoio::VideoCapture>,
    reader: Option<CaptureReader>,
}

/// Background reader feeding decoded frames through a one-slot channel.
struct CaptureReader {
    stop: Arc<AtomicBool>,
    frames: Option<Receiver<Result<Frame, SourceError>>>,
    handle: Option<JoinHandle<videoio::VideoCapture>>,
}

impl CaptureReader {
    fn spawn(capture: videoio::VideoCapture) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || read_loop(capture, sender, stop_flag));
        Self {
            stop,
            frames: Some(receiver),
            handle: Some(handle),
        }
    }

    /// Stop reading and hand the capture back.
    ///
    /// A reader stuck inside `read` on a dead stream is detached after
    /// `THREAD_JOIN_TIMEOUT_MS` and its capture is lost.
    fn stop(mut self) -> Option<videoio::VideoCapture> {
        self.stop.store(true, Ordering::Relaxed);
        self.frames.take();
        let handle = self.handle.take()?;
        let capture = join_within(handle, Duration::from_millis(THREAD_JOIN_TIMEOUT_MS));
        if capture.is_none() {
            logger::warn("capture reader did not stop in time, detaching it");
        }
        capture
    }
}

fn read_loop(
    mut capture: videoio::VideoCapture,
    sender: Sender<Result<Frame, SourceError>>,
    stop: Arc<AtomicBool>,
) -> videoio::VideoCapture {
    logger::debug("capture reader started");
    let mut frames_read: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let outcome = decode_next(&mut capture);
        let failed = outcome.is_err();
        if sender.send(outcome).is_err() {
            break;
        }
        if failed {
            thread::sleep(Duration::from_millis(10));
        } else {
            frames_read += 1;
        }
    }
    logger::debug(&format!("capture reader exiting, frames read: {}", frames_read));
    capture
}

fn decode_next(capture: &mut videoio::VideoCapture) -> Result<Frame, SourceError> {
    let stream_error = |e: opencv::Error| SourceError::Stream(e.to_string());
    let mut frame = Mat::default();
    if !capture.read(&mut frame).map_err(stream_error)? || frame.empty() {
        return Err(SourceError::Stream("stream returned no frame".into()));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB).map_err(stream_error)?;
    if !rgb.is_continuous() {
        return Err(SourceError::Stream("frame is not continuous".into()));
    }
    let width = rgb.cols() as u32;
    let height = rgb.rows() as u32;
    let bytes = rgb.data_bytes().map_err(stream_error)?;
    Ok(Frame::rgb(bytes.to_vec(), width, height))
}

impl StreamCamera {
    fn apply_mode(
        capture: &mut videoio::VideoCapture,
        config: &StreamConfig,
    ) -> Result<(), SourceError> {
        let unsupported = |reason: String| SourceError::UnsupportedConfig {
            mode: config.label(),
            reason,
        };
        let (width, height) = config.resolution.dimensions();
        let requests = [
            (videoio::CAP_PROP_FRAME_WIDTH, width as f64),
            (videoio::CAP_PROP_FRAME_HEIGHT, height as f64),
            (videoio::CAP_PROP_FPS, config.target_fps as f64),
        ];
        for (prop, value) in requests {
            let accepted = capture.set(prop, value).map_err(|e| unsupported(e.to_string()))?;
            if !accepted {
                return Err(unsupported(format!("property {} = {} refused", prop, value)));
            }
        }

        let actual_w = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|e| unsupported(e.to_string()))?;
        let actual_h = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|e| unsupported(e.to_string()))?;
        if actual_w as u32 != width || actual_h as u32 != height {
            return Err(unsupported(format!(
                "device reports {}x{} instead of {}x{}",
                actual_w, actual_h, width, height
            )));
        }

        // some backends report 0 when the rate is unknown
        let actual_fps = capture
            .get(videoio::CAP_PROP_FPS)
            .map_err(|e| unsupported(e.to_string()))?;
        if actual_fps > 0.0 && (actual_fps - config.target_fps as f64).abs() > 0.5 {
            return Err(unsupported(format!(
                "device reports {:.2} fps instead of {}",
                actual_fps, config.target_fps
            )));
        }
        Ok(())
    }
}

impl FrameSource for StreamCamera {
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), SourceError> {
        self.release_stream();
        if self.capture.is_none() {
            logger::warn(&format!("reopening {} after losing the capture", self.url));
            self.capture = Some(open_capture(&self.url).map_err(SourceError::Stream)?);
        }
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| SourceError::Stream("no capture available".into()))?;
        Self::apply_mode(capture, config)?;

        if let Some(capture) = self.capture.take() {
            self.reader = Some(CaptureReader::spawn(capture));
        }
        logger::info(&format!("stream configured: {} on {}", config.label(), self.url));
        Ok(())
    }

    fn get_frame(&mut self, timeout: Duration) -> Result<Frame, SourceError> {
        let receiver = self
            .reader
            .as_ref()
            .and_then(|reader| reader.frames.as_ref())
            .ok_or_else(|| SourceError::Stream("no stream configured".into()))?;
        match receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(SourceError::FrameTimeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(SourceError::Stream("capture reader stopped".into()))
            }
        }
    }

    fn release_stream(&mut self) {
        if let Some(reader) = self.reader.take() {
            if let Some(capture) = reader.stop() {
                self.capture = Some(capture);
            }
        }
    }

    fn disconnect(&mut self) {
        self.release_stream();
        if let Some(mut capture) = self.capture.take() {
            let _ = capture.release();
        }
    }

    fn describe(&self) -> String {
        format!("OpenCV stream {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_template_substitution() {
        let connector = StreamConnector::new("rtsp://{host}:{port}/camera");
        let url = connector.url_for(&DeviceAddress::new("172.15.1.29", 8554));
        assert_eq!(url, "rtsp://172.15.1.29:8554/camera");
    }
}
