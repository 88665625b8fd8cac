//! Subscribable viewer events

use flume::{Receiver, Sender};

use super::state::LoadState;
use crate::layout::{ScrollRequest, VisibleWindow};

/// Change notification published to subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    WindowChanged(VisibleWindow),
    LoadStateChanged(LoadState),
    /// 1-based page number of the first visible slot
    CurrentPageChanged(usize),
    /// The container should move to this offset and report back via `on_scroll`
    ScrollRequested(ScrollRequest),
    /// A page's size could not be read; it keeps the placeholder
    PageWarning { index: usize, message: String },
    /// The metadata walk for the current document finished
    MetadataComplete { known: usize, failed: usize },
}

/// Fan-out list of event channels. Disconnected receivers are pruned on send.
#[derive(Default)]
pub struct Subscribers {
    senders: Vec<Sender<ViewerEvent>>,
}

impl Subscribers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ViewerEvent> {
        let (tx, rx) = flume::unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn emit(&mut self, event: ViewerEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
