//! Device boundary: where frames come from.
//!
//! A [`Connector`] opens a [`FrameSource`] for a device address. The source is
//! then configured per benchmark mode and polled for frames, each fetch bounded
//! by a timeout. Everything above this module treats the device as opaque.

pub mod frame_data;
pub mod mode;
pub mod session;
pub mod simulated;
#[cfg(feature = "opencv")]
pub mod video;

#[cfg(test)]
pub mod mock;

use std::fmt;
use std::time::Duration;

use crate::error::SourceError;

pub use frame_data::{Frame, FrameSample};
pub use mode::{Resolution, StreamConfig};
pub use session::Session;

/// Host and port of the camera device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub host: String,
    pub port: u16,
}

impl DeviceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A live camera stream on a connected device.
pub trait FrameSource: Send {
    /// Switch the stream to `config`. Fails with `UnsupportedConfig` when the
    /// device rejects the mode.
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), SourceError>;

    /// Block until the next frame arrives or `timeout` elapses.
    fn get_frame(&mut self, timeout: Duration) -> Result<Frame, SourceError>;

    /// Stop the current stream, if any.
    fn release_stream(&mut self) {}

    /// Tear down the device link. Called exactly once by [`Session`].
    fn disconnect(&mut self) {}

    fn describe(&self) -> String;
}

/// Opens frame sources.
pub trait Connector {
    fn connect(&self, address: &DeviceAddress) -> Result<Box<dyn FrameSource>, SourceError>;
}

/// Which device backend the CLI drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// Synthetic camera running on this machine
    Simulated,
    /// Network video stream (needs the `opencv` feature)
    Stream,
}
