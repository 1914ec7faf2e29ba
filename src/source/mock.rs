//! Scripted frame source for tests. Never sleeps.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Connector, DeviceAddress, Frame, FrameSource, StreamConfig};
use crate::error::SourceError;

#[derive(Clone, Debug)]
pub enum Step {
    Deliver(Frame),
    Timeout,
    Fail(String),
}

#[derive(Default, Debug)]
struct Counters {
    configures: usize,
    releases: usize,
    disconnects: usize,
    frames: usize,
}

/// Shared call counters, cloned into every source a connector opens.
#[derive(Clone, Default, Debug)]
pub struct SourceLog(Arc<Mutex<Counters>>);

impl SourceLog {
    pub fn configures(&self) -> usize {
        self.0.lock().unwrap().configures
    }

    pub fn releases(&self) -> usize {
        self.0.lock().unwrap().releases
    }

    pub fn disconnects(&self) -> usize {
        self.0.lock().unwrap().disconnects
    }

    pub fn frames(&self) -> usize {
        self.0.lock().unwrap().frames
    }
}

pub struct ScriptedConnector {
    log: SourceLog,
    rejected: Vec<StreamConfig>,
    reachable: bool,
    script: Vec<Step>,
}

impl ScriptedConnector {
    pub fn new(log: SourceLog) -> Self {
        Self {
            log,
            rejected: Vec::new(),
            reachable: true,
            script: Vec::new(),
        }
    }

    pub fn rejecting(mut self, config: StreamConfig) -> Self {
        self.rejected.push(config);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Steps played back before the source falls back to plain grey frames.
    pub fn with_script(mut self, steps: Vec<Step>) -> Self {
        self.script = steps;
        self
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, address: &DeviceAddress) -> Result<Box<dyn FrameSource>, SourceError> {
        if !self.reachable {
            return Err(SourceError::Connection {
                address: address.to_string(),
                reason: "scripted: unreachable".into(),
            });
        }
        Ok(Box::new(ScriptedSource {
            log: self.log.clone(),
            rejected: self.rejected.clone(),
            script: self.script.iter().cloned().collect(),
            config: None,
        }))
    }
}

pub struct ScriptedSource {
    log: SourceLog,
    rejected: Vec<StreamConfig>,
    script: VecDeque<Step>,
    config: Option<StreamConfig>,
}

impl ScriptedSource {
    pub fn standalone(script: Vec<Step>, config: StreamConfig) -> Self {
        Self {
            log: SourceLog::default(),
            rejected: Vec::new(),
            script: script.into_iter().collect(),
            config: Some(config),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), SourceError> {
        self.log.0.lock().unwrap().configures += 1;
        if self.rejected.contains(config) {
            return Err(SourceError::UnsupportedConfig {
                mode: config.label(),
                reason: "scripted rejection".into(),
            });
        }
        self.config = Some(*config);
        Ok(())
    }

    fn get_frame(&mut self, timeout: Duration) -> Result<Frame, SourceError> {
        let Some(config) = self.config else {
            return Err(SourceError::Stream("no stream configured".into()));
        };
        match self.script.pop_front() {
            Some(Step::Deliver(frame)) => {
                self.log.0.lock().unwrap().frames += 1;
                Ok(frame)
            }
            Some(Step::Timeout) => Err(SourceError::FrameTimeout(timeout)),
            Some(Step::Fail(msg)) => Err(SourceError::Stream(msg)),
            None => {
                self.log.0.lock().unwrap().frames += 1;
                let (w, h) = config.resolution.dimensions();
                Ok(Frame::filled(w, h, 128))
            }
        }
    }

    fn release_stream(&mut self) {
        self.log.0.lock().unwrap().releases += 1;
        self.config = None;
    }

    fn disconnect(&mut self) {
        self.log.0.lock().unwrap().disconnects += 1;
    }

    fn describe(&self) -> String {
        "scripted test source".to_string()
    }
}
