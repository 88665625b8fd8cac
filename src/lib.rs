// Export modules for use in tests
pub mod document;
pub mod error;
pub mod event_source;
pub mod layout;
pub mod panic_handler;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use document::{DocumentRef, DocumentSource, LayoutFileSource, MemorySource};
pub use error::{DocumentLoadError, NavigationError, PageMetadataError};
pub use layout::{Align, LayoutConfig, PageMeta, ScrollRequest, Viewport, VisibleWindow};
pub use viewer::{LoadState, PageRenderer, RenderTarget, Viewer, ViewerEvent};
