use super::{Connector, DeviceAddress, FrameSource, StreamConfig};
use crate::error::SourceError;
use crate::utils::logger;

/// Connected device with scoped lifetime.
///
/// The underlying source is released and disconnected when the session drops,
/// whichever way the run ends.
pub struct Session {
    address: DeviceAddress,
    source: Box<dyn FrameSource>,
    active: Option<StreamConfig>,
    closed: bool,
}

impl Session {
    pub fn open(connector: &dyn Connector, address: &DeviceAddress) -> Result<Self, SourceError> {
        logger::info(&format!("connecting to {}", address));
        let source = connector.connect(address)?;
        logger::info(&format!("connected: {}", source.describe()));
        Ok(Self {
            address: address.clone(),
            source,
            active: None,
            closed: false,
        })
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn active_config(&self) -> Option<StreamConfig> {
        self.active
    }

    /// Reuse the stream if it already runs `config`, otherwise resubscribe.
    pub fn configure(&mut self, config: &StreamConfig) -> Result<(), SourceError> {
        if self.active.as_ref() == Some(config) {
            return Ok(());
        }
        if self.active.take().is_some() {
            self.source.release_stream();
        }
        self.source.configure_stream(config)?;
        self.active = Some(*config);
        Ok(())
    }

    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    /// Release and disconnect now instead of at drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.active.take().is_some() {
            self.source.release_stream();
        }
        self.source.disconnect();
        self.closed = true;
        logger::info(&format!("disconnected from {}", self.address));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
