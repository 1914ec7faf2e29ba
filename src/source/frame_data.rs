use image::{DynamicImage, GrayImage, RgbImage};
use std::time::Duration;

/// Raw frame as delivered by a frame source.
///
/// Pixels are row-major, `channels` bytes per pixel (1 = grey, 3 = RGB).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl Frame {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self { buffer, width, height, channels }
    }

    pub fn gray(buffer: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(buffer, width, height, 1)
    }

    pub fn rgb(buffer: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(buffer, width, height, 3)
    }

    /// Solid frame filled with one grey level.
    pub fn filled(width: u32, height: u32, level: u8) -> Self {
        Self::gray(vec![level; (width * height) as usize], width, height)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Buffer length matches the declared shape.
    pub fn is_well_formed(&self) -> bool {
        self.buffer.len() == self.width as usize * self.height as usize * self.channels as usize
    }

    /// Luma view of the frame, or `None` if the buffer does not match its shape.
    pub fn to_gray(&self) -> Option<GrayImage> {
        if !self.is_well_formed() {
            return None;
        }
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, self.buffer.clone()),
            3 => RgbImage::from_raw(self.width, self.height, self.buffer.clone())
                .map(|rgb| DynamicImage::ImageRgb8(rgb).to_luma8()),
            _ => None,
        }
    }
}

/// One captured frame: the receipt time and, for the first frames of a run, the image.
#[derive(Clone, Debug)]
pub struct FrameSample {
    /// Monotonic time since the sampling run started.
    pub timestamp: Duration,
    pub frame: Option<Frame>,
}

impl FrameSample {
    pub fn new(timestamp: Duration, frame: Option<Frame>) -> Self {
        Self { timestamp, frame }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_frame_passes_through() {
        let frame = Frame::gray(vec![0, 64, 128, 255], 2, 2);
        let gray = frame.to_gray().unwrap();
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(gray.as_raw(), &vec![0, 64, 128, 255]);
    }

    #[test]
    fn rgb_white_and_black_map_to_extremes() {
        let frame = Frame::rgb(vec![255, 255, 255, 0, 0, 0], 2, 1);
        let gray = frame.to_gray().unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let frame = Frame::rgb(vec![0; 5], 2, 1);
        assert!(!frame.is_well_formed());
        assert!(frame.to_gray().is_none());
    }
}
