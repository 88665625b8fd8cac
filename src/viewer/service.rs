//! Viewer service - owns layout state and drives the metadata loader

use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::Receiver;
use log::{debug, error, info, warn};

use super::events::{Subscribers, ViewerEvent};
use super::renderer::{PageRenderer, RenderTarget};
use super::state::{Command, Effect, LoadState, ViewerState};
use crate::document::{DocumentRef, DocumentSource, LoadResponse, MetadataLoader};
use crate::error::NavigationError;
use crate::event_source::HostEvent;
use crate::layout::{
    Align, LayoutConfig, PageMetadataStore, ScrollRequest, Viewport, VisibleWindow, Virtualizer,
};

/// Virtualized paging engine for one scroll container.
///
/// All methods run on the owning thread. Metadata arrives through [`poll`]
/// (or [`wait_for_load`]), which applies every pending response before the
/// visible window is recomputed.
///
/// [`poll`]: Viewer::poll
/// [`wait_for_load`]: Viewer::wait_for_load
pub struct Viewer {
    state: ViewerState,
    config: LayoutConfig,
    store: PageMetadataStore,
    virtualizer: Virtualizer,
    loader: MetadataLoader,
    subscribers: Subscribers,
    window: VisibleWindow,
    current_page: usize,
    window_dirty: bool,
}

impl Viewer {
    #[must_use]
    pub fn new(source: Arc<dyn DocumentSource>, config: LayoutConfig) -> Self {
        let state = ViewerState::new(config);
        let store = PageMetadataStore::new(config.estimator.placeholder);

        let mut virtualizer = Virtualizer::new(config.estimator, config.measurement_cache_size);
        virtualizer.set_scale(state.scale, &store);
        virtualizer.set_available_width(
            config.estimator.available_width(state.viewport.width),
            &store,
        );

        Self {
            state,
            config,
            store,
            virtualizer,
            loader: MetadataLoader::new(source),
            subscribers: Subscribers::new(),
            window: VisibleWindow::default(),
            current_page: 0,
            window_dirty: false,
        }
    }

    /// Open `document`, replacing whatever is attached
    pub fn attach(&mut self, document: impl Into<DocumentRef>) {
        let document = document.into();
        info!("Attaching {document}");
        self.run(Command::Attach(document));
    }

    /// Drop the current document and cancel its metadata walk
    pub fn detach(&mut self) {
        if let Some(document) = &self.state.document {
            info!("Detaching {document}");
        }
        self.run(Command::Detach);
    }

    /// Set the zoom factor; clamped to the configured range
    pub fn set_zoom(&mut self, scale: f64) {
        self.run(Command::SetZoom(scale));
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            debug!("Ignoring viewport size {width}x{height}");
            return;
        }
        self.run(Command::SetViewportSize { width, height });
    }

    /// Scroll position reported by the container
    pub fn on_scroll(&mut self, offset: f64) {
        if !offset.is_finite() {
            debug!("Ignoring scroll offset {offset}");
            return;
        }
        self.run(Command::Scroll(offset.max(0.0)));
    }

    /// Jump to a 1-based page number.
    ///
    /// Emits [`ViewerEvent::ScrollRequested`]; the viewport only moves once the
    /// container reports the new offset through [`Viewer::on_scroll`].
    pub fn scroll_to_page(&mut self, page_number: usize) -> Result<ScrollRequest, NavigationError> {
        // Page 0 never exists; map it past the end so it reports OutOfRange
        let index = page_number.checked_sub(1).unwrap_or(usize::MAX);
        self.scroll_to_index(index, Align::Start)
    }

    pub fn scroll_to_index(
        &mut self,
        index: usize,
        align: Align,
    ) -> Result<ScrollRequest, NavigationError> {
        let request = self
            .virtualizer
            .scroll_to_index(index, align, &self.state.viewport)?;
        debug!(
            "Scroll requested to page {} at {:.1}",
            request.index + 1,
            request.offset
        );
        self.subscribers.emit(ViewerEvent::ScrollRequested(request));
        Ok(request)
    }

    /// Actual rendered height of a slot, reported by the renderer
    pub fn on_measured(&mut self, index: usize, height: f64) -> bool {
        let changed = self.virtualizer.measure_element(index, height);
        if changed {
            self.window_dirty = true;
            self.flush();
        }
        changed
    }

    /// Apply every pending loader response. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let responses = self.loader.poll();
        self.apply_responses(responses)
    }

    /// Block until the metadata walk finishes or `timeout` elapses.
    ///
    /// Returns true if no walk is in flight afterwards.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.loader.is_loading() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let responses = self.loader.wait(deadline - now);
            self.apply_responses(responses);
        }
        !self.loader.is_loading()
    }

    /// Route one host event to the matching call
    pub fn dispatch(&mut self, event: HostEvent) -> Result<Option<ScrollRequest>, NavigationError> {
        match event {
            HostEvent::Attach(document) => self.attach(document),
            HostEvent::Detach => self.detach(),
            HostEvent::Resize { width, height } => self.set_viewport_size(width, height),
            HostEvent::Scroll(offset) => self.on_scroll(offset),
            HostEvent::Zoom(scale) => self.set_zoom(scale),
            HostEvent::GoToPage(page) => return self.scroll_to_page(page).map(Some),
            HostEvent::Measured { index, height } => {
                self.on_measured(index, height);
            }
        }
        Ok(None)
    }

    pub fn subscribe(&mut self) -> Receiver<ViewerEvent> {
        self.subscribers.subscribe()
    }

    #[must_use]
    pub fn visible_window(&self) -> &VisibleWindow {
        &self.window
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.state.load_state
    }

    /// 1-based page at the top of the viewport, 0 when nothing is laid out
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.store.count()
    }

    #[must_use]
    pub fn document(&self) -> Option<&DocumentRef> {
        self.state.document.as_ref()
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.state.scale
    }

    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        (self.state.scale * 100.0).round() as u32
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    /// Height of the scroll content; never shorter than the viewport
    #[must_use]
    pub fn content_height(&self) -> f64 {
        self.window.total_size.max(self.state.viewport.height)
    }

    #[must_use]
    pub fn metadata(&self) -> &PageMetadataStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Exact start offset of a slot
    pub fn offset_of(&mut self, index: usize) -> Option<f64> {
        self.virtualizer.offset_of(index)
    }

    #[must_use]
    pub fn slot_size(&self, index: usize) -> Option<f64> {
        self.virtualizer.size_of(index)
    }

    /// Slots in the current window with the width to paint them at
    #[must_use]
    pub fn render_targets(&self) -> Vec<RenderTarget> {
        self.window
            .items
            .iter()
            .map(|item| RenderTarget {
                index: item.index,
                start: item.start,
                slot_size: item.size,
                target_width: self.virtualizer.render_width(item.index).unwrap_or_default(),
                measured: self.virtualizer.is_measured(item.index),
            })
            .collect()
    }

    /// Paint every slot in the current window
    pub fn render_window<R: PageRenderer>(&self, renderer: &mut R) -> Vec<R::Output> {
        self.render_targets()
            .iter()
            .map(|target| renderer.render_page(target))
            .collect()
    }

    fn run(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute(effects);
        self.flush();
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelLoad => {
                    self.loader.cancel();
                }
                Effect::StartLoad(document) => {
                    self.loader.start(document);
                }
                Effect::ResetDocument => {
                    self.store.reset(self.state.page_count);
                    self.virtualizer.reset(&self.store);
                    self.window_dirty = true;
                }
                Effect::Relayout => {
                    let width = self
                        .config
                        .estimator
                        .available_width(self.state.viewport.width);
                    self.virtualizer.set_scale(self.state.scale, &self.store);
                    self.virtualizer.set_available_width(width, &self.store);
                    self.window_dirty = true;
                }
                Effect::RefreshWindow => {
                    self.window_dirty = true;
                }
                Effect::NotifyLoadState => {
                    self.subscribers
                        .emit(ViewerEvent::LoadStateChanged(self.state.load_state.clone()));
                }
            }
        }
    }

    fn apply_responses(&mut self, responses: Vec<LoadResponse>) -> usize {
        let applied = responses.len();
        for response in responses {
            match response {
                LoadResponse::Opened { page_count, .. } => {
                    info!("Document ready with {page_count} pages");
                    let effects = self.state.apply(Command::DocumentOpened { page_count });
                    self.execute(effects);
                }
                LoadResponse::OpenFailed { error, .. } => {
                    error!("Failed to load document: {error}");
                    let effects = self.state.apply(Command::DocumentFailed(error.to_string()));
                    self.execute(effects);
                }
                LoadResponse::PageSize { index, meta, .. } => {
                    if self.store.set(index, meta)
                        && self.virtualizer.refresh_page(&self.store, index)
                    {
                        self.window_dirty = true;
                    }
                }
                LoadResponse::PageFailed { error, .. } => {
                    let index = error.index();
                    warn!("Keeping placeholder size for page {}: {error}", index + 1);
                    self.store.mark_failed(index);
                    self.subscribers.emit(ViewerEvent::PageWarning {
                        index,
                        message: error.to_string(),
                    });
                }
                LoadResponse::Finished { failed, .. } => {
                    let known = self.store.known_count();
                    info!("Page metadata complete: {known} known, {failed} failed");
                    self.subscribers.emit(ViewerEvent::MetadataComplete { known, failed });
                }
                LoadResponse::Cancelled(id) => {
                    debug!("Metadata load {} stopped early", id.0);
                }
            }
        }
        self.flush();
        applied
    }

    fn flush(&mut self) {
        if !self.window_dirty {
            return;
        }
        self.window_dirty = false;

        let window = self
            .virtualizer
            .compute_visible_window(&self.state.viewport, self.config.overscan);
        if window != self.window {
            self.window = window;
            self.subscribers.emit(ViewerEvent::WindowChanged(self.window.clone()));
        }

        let page = if self.window.is_empty() {
            0
        } else {
            self.window.first_visible + 1
        };
        if page != self.current_page {
            self.current_page = page;
            self.subscribers.emit(ViewerEvent::CurrentPageChanged(page));
        }
    }
}
