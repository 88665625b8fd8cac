//! Document sources: where page counts and intrinsic page sizes come from

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DocumentLoadError, PageMetadataError};
use crate::layout::PageMeta;

/// Opaque reference to a document (path, URL, catalog key...)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Path> for DocumentRef {
    fn from(value: &Path) -> Self {
        Self(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for DocumentRef {
    fn from(value: PathBuf) -> Self {
        Self::from(value.as_path())
    }
}

/// Opens documents. Shared with the loader thread.
pub trait DocumentSource: Send + Sync {
    fn open(&self, document: &DocumentRef) -> Result<Box<dyn PageSizes>, DocumentLoadError>;
}

/// An opened document that can report page sizes one at a time.
///
/// `page_size` may be slow; the loader calls it off the owning thread.
pub trait PageSizes: Send {
    fn page_count(&self) -> usize;

    fn page_size(&mut self, index: usize) -> Result<PageMeta, PageMetadataError>;
}

/// One page in a [`DocumentManifest`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub width: f64,
    pub height: f64,
    /// Simulated fetch latency
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latency_ms: u64,
    /// If set, fetching this page fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl PageEntry {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            latency_ms: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(0.0, 0.0)
        }
    }
}

/// Page-size manifest describing a document's layout
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

impl DocumentManifest {
    /// `count` pages of the same size
    #[must_use]
    pub fn uniform(count: usize, width: f64, height: f64) -> Self {
        Self {
            title: None,
            pages: vec![PageEntry::new(width, height); count],
        }
    }

    /// Parse YAML or JSON, chosen by the file extension of `hint`
    pub fn parse(content: &str, hint: &Path) -> Result<Self, DocumentLoadError> {
        let is_json = hint
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(content).map_err(|e| DocumentLoadError::Malformed(e.to_string()))
        } else {
            serde_yaml::from_str(content).map_err(|e| DocumentLoadError::Malformed(e.to_string()))
        }
    }
}

/// Opened manifest handed to the loader
struct ManifestPages {
    pages: Vec<PageEntry>,
}

impl PageSizes for ManifestPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&mut self, index: usize) -> Result<PageMeta, PageMetadataError> {
        let entry = self
            .pages
            .get(index)
            .ok_or(PageMetadataError::OutOfRange { index })?;

        if entry.latency_ms > 0 {
            std::thread::sleep(Duration::from_millis(entry.latency_ms));
        }

        if let Some(detail) = &entry.error {
            return Err(PageMetadataError::Fetch {
                index,
                detail: detail.clone(),
            });
        }

        let meta = PageMeta::new(entry.width, entry.height);
        if !meta.is_usable() {
            return Err(PageMetadataError::InvalidSize {
                index,
                width: entry.width,
                height: entry.height,
            });
        }
        Ok(meta)
    }
}

/// Reads manifests from disk. Relative references resolve against `root`.
#[derive(Clone, Debug, Default)]
pub struct LayoutFileSource {
    root: Option<PathBuf>,
}

impl LayoutFileSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, document: &DocumentRef) -> PathBuf {
        let path = PathBuf::from(document.as_str());
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl DocumentSource for LayoutFileSource {
    fn open(&self, document: &DocumentRef) -> Result<Box<dyn PageSizes>, DocumentLoadError> {
        let path = self.resolve(document);
        if !path.exists() {
            return Err(DocumentLoadError::NotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|e| DocumentLoadError::Unreadable {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        let manifest = DocumentManifest::parse(&content, &path)?;
        debug!(
            "Opened manifest {path:?} with {} pages",
            manifest.pages.len()
        );

        Ok(Box::new(ManifestPages {
            pages: manifest.pages,
        }))
    }
}

/// In-memory documents keyed by reference
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    documents: HashMap<String, DocumentManifest>,
    open_latency: Duration,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(
        mut self,
        reference: impl Into<String>,
        manifest: DocumentManifest,
    ) -> Self {
        self.documents.insert(reference.into(), manifest);
        self
    }

    /// Delay every `open` call, to exercise the `Loading` state
    #[must_use]
    pub fn with_open_latency(mut self, latency: Duration) -> Self {
        self.open_latency = latency;
        self
    }
}

impl DocumentSource for MemorySource {
    fn open(&self, document: &DocumentRef) -> Result<Box<dyn PageSizes>, DocumentLoadError> {
        if !self.open_latency.is_zero() {
            std::thread::sleep(self.open_latency);
        }

        let manifest = self
            .documents
            .get(document.as_str())
            .ok_or_else(|| DocumentLoadError::NotFound(document.to_string()))?;

        Ok(Box::new(ManifestPages {
            pages: manifest.pages.clone(),
        }))
    }
}
