pub mod test_helpers {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::document::{DocumentManifest, MemorySource, PageEntry};
    use crate::event_source::{EventSource, HostEvent, SimulatedEventSource};
    use crate::layout::{LayoutConfig, ScrollRequest};
    use crate::viewer::{PageRenderer, RenderTarget, Viewer, ViewerEvent};

    pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

    /// Builder for in-memory documents with per-page sizes, latency and failures
    pub struct ManifestBuilder {
        manifest: DocumentManifest,
    }

    impl ManifestBuilder {
        /// `count` US-letter pages
        pub fn letter(count: usize) -> Self {
            Self::uniform(count, 612.0, 792.0)
        }

        pub fn uniform(count: usize, width: f64, height: f64) -> Self {
            Self {
                manifest: DocumentManifest::uniform(count, width, height),
            }
        }

        pub fn page(mut self, index: usize, width: f64, height: f64) -> Self {
            self.manifest.pages[index] = PageEntry::new(width, height);
            self
        }

        pub fn failing(mut self, index: usize, message: &str) -> Self {
            self.manifest.pages[index] = PageEntry::failing(message);
            self
        }

        /// Delay every page fetch by `ms`
        pub fn latency(mut self, ms: u64) -> Self {
            for page in &mut self.manifest.pages {
                page.latency_ms = ms;
            }
            self
        }

        pub fn build(self) -> DocumentManifest {
            self.manifest
        }
    }

    /// Viewer over a single in-memory document named `doc`, sized 960x800
    pub fn viewer_with(manifest: DocumentManifest) -> Viewer {
        let source = MemorySource::new().with_document("doc", manifest);
        let mut viewer = Viewer::new(Arc::new(source), LayoutConfig::default());
        viewer.set_viewport_size(960.0, 800.0);
        viewer
    }

    /// Attach `doc` and block until its metadata walk finishes
    pub fn attach_and_settle(viewer: &mut Viewer) {
        viewer.attach("doc");
        wait_until_settled(viewer);
    }

    pub fn wait_until_settled(viewer: &mut Viewer) {
        assert!(
            viewer.wait_for_load(LOAD_TIMEOUT),
            "metadata load did not finish within {LOAD_TIMEOUT:?}"
        );
    }

    /// Play every event and feed scroll requests back as the container would
    pub fn play(viewer: &mut Viewer, events: Vec<HostEvent>) -> Vec<ScrollRequest> {
        play_source(viewer, SimulatedEventSource::new(events))
    }

    /// Parse a YAML event script and play it
    pub fn play_script(viewer: &mut Viewer, script: &str) -> Vec<ScrollRequest> {
        let source = SimulatedEventSource::from_yaml(script).expect("event script should parse");
        play_source(viewer, source)
    }

    pub fn play_source(viewer: &mut Viewer, mut source: impl EventSource) -> Vec<ScrollRequest> {
        let mut requests = vec![];
        while source.poll(Duration::ZERO).unwrap_or(false) {
            let Ok(event) = source.read() else { break };
            let is_attach = matches!(event, HostEvent::Attach(_));
            if let Ok(Some(request)) = viewer.dispatch(event) {
                viewer.on_scroll(request.offset);
                requests.push(request);
            }
            if is_attach {
                wait_until_settled(viewer);
            }
        }
        requests
    }

    /// Collect everything a subscriber has received so far
    pub fn drain(events: &flume::Receiver<ViewerEvent>) -> Vec<ViewerEvent> {
        events.try_iter().collect()
    }

    /// Renderer that records targets and reports a fixed slot height back
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub rendered: Vec<RenderTarget>,
        pub slot_height: Option<f64>,
    }

    impl RecordingRenderer {
        pub fn with_slot_height(height: f64) -> Self {
            Self {
                rendered: vec![],
                slot_height: Some(height),
            }
        }

        pub fn indices(&self) -> Vec<usize> {
            self.rendered.iter().map(|t| t.index).collect()
        }
    }

    impl PageRenderer for RecordingRenderer {
        /// (index, measured slot height)
        type Output = (usize, Option<f64>);

        fn render_page(&mut self, target: &RenderTarget) -> Self::Output {
            self.rendered.push(*target);
            (target.index, self.slot_height)
        }
    }

    /// Render the window and report every measured height back to the viewer
    pub fn render_and_measure(viewer: &mut Viewer, renderer: &mut RecordingRenderer) {
        let outputs = viewer.render_window(renderer);
        for (index, height) in outputs {
            if let Some(height) = height {
                viewer.on_measured(index, height);
            }
        }
    }
}
