//! Viewer state management

use serde::Serialize;

use crate::document::DocumentRef;
use crate::layout::{LayoutConfig, Viewport};

/// Document lifecycle as seen by the host
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    /// Page count known; page sizes may still be arriving
    Ready,
    /// Terminal for the current document
    Failed(String),
}

/// Current viewer state for the attached document
#[derive(Clone, Debug)]
pub struct ViewerState {
    pub document: Option<DocumentRef>,
    pub load_state: LoadState,
    /// Written only by resize and scroll reports from the host
    pub viewport: Viewport,
    pub scale: f64,
    pub page_count: usize,
    config: LayoutConfig,
}

impl ViewerState {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            document: None,
            load_state: LoadState::Idle,
            viewport: Viewport::default(),
            scale: config.clamp_zoom(config.default_zoom),
            page_count: 0,
            config,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Attach(document) => {
                self.document = Some(document.clone());
                self.load_state = LoadState::Loading;
                self.page_count = 0;
                vec![
                    Effect::CancelLoad,
                    Effect::ResetDocument,
                    Effect::StartLoad(document),
                    Effect::NotifyLoadState,
                    Effect::RefreshWindow,
                ]
            }

            Command::Detach => {
                if self.document.is_none() && self.load_state == LoadState::Idle {
                    return vec![];
                }
                self.document = None;
                self.load_state = LoadState::Idle;
                self.page_count = 0;
                vec![
                    Effect::CancelLoad,
                    Effect::ResetDocument,
                    Effect::NotifyLoadState,
                    Effect::RefreshWindow,
                ]
            }

            Command::SetZoom(scale) => {
                let clamped = self.config.clamp_zoom(scale);
                if self.scale != clamped {
                    self.scale = clamped;
                    vec![Effect::Relayout, Effect::RefreshWindow]
                } else {
                    vec![]
                }
            }

            Command::SetViewportSize { width, height } => {
                let width_changed = self.viewport.width != width;
                let height_changed = self.viewport.height != height;
                self.viewport.width = width;
                self.viewport.height = height;

                match (width_changed, height_changed) {
                    (true, _) => vec![Effect::Relayout, Effect::RefreshWindow],
                    (false, true) => vec![Effect::RefreshWindow],
                    (false, false) => vec![],
                }
            }

            Command::Scroll(offset) => {
                if self.viewport.scroll_offset != offset {
                    self.viewport.scroll_offset = offset;
                    vec![Effect::RefreshWindow]
                } else {
                    vec![]
                }
            }

            Command::DocumentOpened { page_count } => {
                if self.load_state != LoadState::Loading {
                    return vec![];
                }
                self.page_count = page_count;
                self.load_state = LoadState::Ready;
                vec![
                    Effect::ResetDocument,
                    Effect::NotifyLoadState,
                    Effect::RefreshWindow,
                ]
            }

            Command::DocumentFailed(message) => {
                if self.load_state != LoadState::Loading {
                    return vec![];
                }
                self.page_count = 0;
                self.load_state = LoadState::Failed(message);
                vec![
                    Effect::ResetDocument,
                    Effect::NotifyLoadState,
                    Effect::RefreshWindow,
                ]
            }
        }
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// Attach a new document, replacing the current one
    Attach(DocumentRef),
    /// Drop the current document
    Detach,
    /// Set the zoom factor
    SetZoom(f64),
    /// Container was resized
    SetViewportSize { width: f64, height: f64 },
    /// Container scrolled
    Scroll(f64),
    /// Loader reported the page count
    DocumentOpened { page_count: usize },
    /// Loader could not open the document
    DocumentFailed(String),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Stop the in-flight metadata walk
    CancelLoad,
    /// Start walking a document
    StartLoad(DocumentRef),
    /// Resize the store to the current page count and drop measurements
    ResetDocument,
    /// Recompute every slot (zoom or column width changed)
    Relayout,
    /// Recompute the visible window
    RefreshWindow,
    /// Publish the load state
    NotifyLoadState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ViewerState {
        ViewerState::new(LayoutConfig::default())
    }

    #[test]
    fn attach_starts_loading() {
        let mut state = test_state();
        let doc = DocumentRef::from("report.yaml");

        let effects = state.apply(Command::Attach(doc.clone()));
        assert_eq!(state.load_state, LoadState::Loading);
        assert_eq!(
            effects,
            vec![
                Effect::CancelLoad,
                Effect::ResetDocument,
                Effect::StartLoad(doc),
                Effect::NotifyLoadState,
                Effect::RefreshWindow,
            ]
        );
    }

    #[test]
    fn opened_moves_to_ready_only_while_loading() {
        let mut state = test_state();
        assert!(state.apply(Command::DocumentOpened { page_count: 3 }).is_empty());
        assert_eq!(state.load_state, LoadState::Idle);

        let _ = state.apply(Command::Attach(DocumentRef::from("a")));
        let effects = state.apply(Command::DocumentOpened { page_count: 3 });
        assert_eq!(state.load_state, LoadState::Ready);
        assert_eq!(state.page_count, 3);
        assert!(effects.contains(&Effect::NotifyLoadState));
    }

    #[test]
    fn failure_is_terminal() {
        let mut state = test_state();
        let _ = state.apply(Command::Attach(DocumentRef::from("a")));
        let _ = state.apply(Command::DocumentFailed("no such file".into()));
        assert_eq!(state.load_state, LoadState::Failed("no such file".into()));

        assert!(state.apply(Command::DocumentOpened { page_count: 3 }).is_empty());
        assert!(matches!(state.load_state, LoadState::Failed(_)));
    }

    #[test]
    fn zoom_is_clamped_and_deduplicated() {
        let mut state = test_state();
        let effects = state.apply(Command::SetZoom(5.0));
        assert_eq!(state.scale, 2.0);
        assert_eq!(effects, vec![Effect::Relayout, Effect::RefreshWindow]);

        assert!(state.apply(Command::SetZoom(3.0)).is_empty());

        let _ = state.apply(Command::SetZoom(f64::NAN));
        assert_eq!(state.scale, 1.0);
    }

    #[test]
    fn height_change_does_not_relayout() {
        let mut state = test_state();
        let effects = state.apply(Command::SetViewportSize {
            width: 960.0,
            height: 600.0,
        });
        assert_eq!(effects, vec![Effect::RefreshWindow]);

        let effects = state.apply(Command::SetViewportSize {
            width: 1200.0,
            height: 600.0,
        });
        assert_eq!(effects, vec![Effect::Relayout, Effect::RefreshWindow]);

        assert!(state
            .apply(Command::SetViewportSize {
                width: 1200.0,
                height: 600.0
            })
            .is_empty());
    }

    #[test]
    fn detach_when_idle_is_noop() {
        let mut state = test_state();
        assert!(state.apply(Command::Detach).is_empty());

        let _ = state.apply(Command::Attach(DocumentRef::from("a")));
        let effects = state.apply(Command::Detach);
        assert_eq!(state.load_state, LoadState::Idle);
        assert_eq!(effects[0], Effect::CancelLoad);
    }
}
