//! Metadata loader - walks a document's pages on a worker thread
//!
//! Results travel back over a channel and are only applied when the owner
//! calls [`MetadataLoader::poll`], so every mutation of layout state stays on
//! the owning thread. Responses are tagged with a [`LoadId`]; anything from a
//! load other than the active one is dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::debug;

use super::request::{LoadId, LoadResponse};
use super::source::{DocumentRef, DocumentSource};
use crate::error::{DocumentLoadError, PageMetadataError};

/// Cooperative cancellation flag shared with a worker
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; all clones observe it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct ActiveLoad {
    id: LoadId,
    document: DocumentRef,
    cancel: CancellationToken,
    _handle: Option<JoinHandle<()>>,
}

/// Drives metadata walks for the attached document.
///
/// Starting a new load while one is running supersedes it: the old walk is
/// cancelled and its late responses are discarded.
pub struct MetadataLoader {
    source: Arc<dyn DocumentSource>,
    response_tx: Sender<LoadResponse>,
    response_rx: Receiver<LoadResponse>,
    next_load_id: u64,
    active: Option<ActiveLoad>,
}

impl MetadataLoader {
    #[must_use]
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        let (response_tx, response_rx) = flume::unbounded();
        Self {
            source,
            response_tx,
            response_rx,
            next_load_id: 1,
            active: None,
        }
    }

    /// Begin walking `document`, superseding any active load
    pub fn start(&mut self, document: DocumentRef) -> LoadId {
        self.cancel();

        let id = self.next_id();
        let cancel = CancellationToken::new();

        let source = Arc::clone(&self.source);
        let tx = self.response_tx.clone();
        let worker_doc = document.clone();
        let worker_cancel = cancel.clone();

        let handle = std::thread::Builder::new()
            .name(format!("scrollfolio-meta-{}", id.0))
            .spawn(move || metadata_worker(source.as_ref(), &worker_doc, id, &worker_cancel, &tx));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                let _ = self.response_tx.send(LoadResponse::OpenFailed {
                    id,
                    error: DocumentLoadError::generic(format!(
                        "failed to spawn metadata worker: {e}"
                    )),
                });
                None
            }
        };

        debug!("Started metadata load {} for {document}", id.0);
        self.active = Some(ActiveLoad {
            id,
            document,
            cancel,
            _handle: handle,
        });
        id
    }

    /// Cancel the active load, if any. Its pending responses will be dropped.
    pub fn cancel(&mut self) -> Option<LoadId> {
        let active = self.active.take()?;
        active.cancel.cancel();
        debug!("Cancelled metadata load {} for {}", active.id.0, active.document);
        Some(active.id)
    }

    #[must_use]
    pub fn active_id(&self) -> Option<LoadId> {
        self.active.as_ref().map(|a| a.id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    /// Drain every pending response belonging to the active load
    pub fn poll(&mut self) -> Vec<LoadResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.accept(response, &mut responses);
        }
        responses
    }

    /// Block up to `timeout` for at least one response from the active load,
    /// then drain whatever else is already queued
    pub fn wait(&mut self, timeout: Duration) -> Vec<LoadResponse> {
        let deadline = Instant::now() + timeout;
        let mut responses = vec![];

        while responses.is_empty() && self.active.is_some() {
            match self.response_rx.recv_deadline(deadline) {
                Ok(response) => self.accept(response, &mut responses),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }

        responses.extend(self.poll());
        responses
    }

    fn accept(&mut self, response: LoadResponse, out: &mut Vec<LoadResponse>) {
        let id = response.id();
        if self.active_id() != Some(id) {
            debug!("Dropping stale metadata response from load {}", id.0);
            return;
        }
        if response.is_terminal() {
            self.active = None;
        }
        out.push(response);
    }

    fn next_id(&mut self) -> LoadId {
        let id = LoadId::new(self.next_load_id);
        self.next_load_id += 1;
        id
    }
}

impl Drop for MetadataLoader {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Walk every page of `document` in index order
fn metadata_worker(
    source: &dyn DocumentSource,
    document: &DocumentRef,
    id: LoadId,
    cancel: &CancellationToken,
    responses: &Sender<LoadResponse>,
) {
    let opened = panic::catch_unwind(AssertUnwindSafe(|| source.open(document)))
        .unwrap_or_else(|payload| {
            Err(DocumentLoadError::generic(format!(
                "document source panicked opening {document}: {}",
                panic_detail(payload.as_ref())
            )))
        });

    let mut pages = match opened {
        Ok(pages) => pages,
        Err(error) => {
            let _ = responses.send(LoadResponse::OpenFailed { id, error });
            return;
        }
    };

    let page_count = pages.page_count();
    if responses
        .send(LoadResponse::Opened { id, page_count })
        .is_err()
    {
        return;
    }

    let mut failed = 0;
    for index in 0..page_count {
        if cancel.is_cancelled() {
            let _ = responses.send(LoadResponse::Cancelled(id));
            return;
        }

        let size = panic::catch_unwind(AssertUnwindSafe(|| pages.page_size(index)))
            .unwrap_or_else(|payload| {
                Err(PageMetadataError::Fetch {
                    index,
                    detail: format!("page source panicked: {}", panic_detail(payload.as_ref())),
                })
            });

        let response = match size {
            Ok(meta) if meta.is_usable() => LoadResponse::PageSize { id, index, meta },
            Ok(meta) => {
                failed += 1;
                LoadResponse::PageFailed {
                    id,
                    error: PageMetadataError::InvalidSize {
                        index,
                        width: meta.width,
                        height: meta.height,
                    },
                }
            }
            Err(error) => {
                failed += 1;
                debug!("Page metadata unavailable for {document}: {error}");
                LoadResponse::PageFailed { id, error }
            }
        };

        if responses.send(response).is_err() {
            return;
        }
    }

    let _ = responses.send(LoadResponse::Finished { id, failed });
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
