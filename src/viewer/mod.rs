//! Host-facing viewer: attach/detach, zoom, scroll and navigation on top of
//! the layout engine, with subscribable change events.

mod events;
mod renderer;
mod service;
mod state;

pub use events::{Subscribers, ViewerEvent};
pub use renderer::{PageRenderer, RenderTarget};
pub use service::Viewer;
pub use state::{Command, Effect, LoadState, ViewerState};
