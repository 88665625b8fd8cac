//! Document access and background metadata loading

mod loader;
mod request;
mod source;

pub use loader::{CancellationToken, MetadataLoader};
pub use request::{LoadId, LoadResponse};
pub use source::{
    DocumentManifest, DocumentRef, DocumentSource, LayoutFileSource, MemorySource, PageEntry,
    PageSizes,
};
