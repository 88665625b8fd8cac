use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::document::DocumentRef;

/// Input from the host container
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEvent {
    Attach(DocumentRef),
    Detach,
    Resize { width: f64, height: f64 },
    Scroll(f64),
    /// Zoom factor, 1.0 = 100%
    Zoom(f64),
    /// 1-based page number
    GoToPage(usize),
    Measured { index: usize, height: f64 },
}

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<HostEvent>;
}

/// Simulated event source for testing and scripted runs
pub struct SimulatedEventSource {
    events: VecDeque<HostEvent>,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<HostEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Parse a YAML list of events, e.g. `- resize: {width: 800, height: 600}`.
    /// Unit events such as `- detach` are plain strings.
    pub fn from_yaml(script: &str) -> Result<Self> {
        let events: Vec<HostEvent> = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(script),
        )?;
        Ok(Self::new(events))
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> Result<HostEvent> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow!("simulated event source is exhausted"))
    }
}
