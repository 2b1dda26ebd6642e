//! Document loading for the regulation corpus.
//!
//! Scans a single directory (no recursion), extracts plain text from every
//! file whose extension has a registered extractor and silently skips the
//! rest. An extraction failure aborts the whole load.

pub(crate) mod pdf;
pub(crate) mod pptx;

pub use pdf::PdfExtractor;
pub use pptx::PptxExtractor;

use crate::error::{ArbitroError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Kind of source a document was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Slides,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Slides => write!(f, "slides"),
        }
    }
}

/// Plain text extracted from one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source: PathBuf,
    pub kind: DocumentKind,
}

impl Document {
    /// File name of the source, used as a human-readable title.
    pub fn title(&self) -> String {
        self.source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("documento")
            .to_string()
    }
}

/// Text extraction for one family of file types.
///
/// Extraction is blocking and runs on the blocking thread pool.
pub trait Extractor: Send + Sync {
    /// Lowercase extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&'static str];

    /// Kind assigned to documents produced by this extractor.
    fn kind(&self) -> DocumentKind;

    /// Extract the plain text of `path`.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Maps file extensions to extractors.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the PDF and PPTX extractors.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(Arc::new(PdfExtractor::new()))
            .with(Arc::new(PptxExtractor::new()))
    }

    /// Add an extractor. Later registrations win for a shared extension.
    pub fn with(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    /// Find the extractor for a path by its extension.
    pub fn find(&self, path: &Path) -> Option<Arc<dyn Extractor>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.extractors
            .iter()
            .find(|e| e.extensions().contains(&ext.as_str()))
            .cloned()
    }

    /// All extensions with a registered extractor.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .extractors
            .iter()
            .flat_map(|e| e.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }
}

/// Loads every supported document from a directory.
#[derive(Clone)]
pub struct DocumentLoader {
    registry: ExtractorRegistry,
}

impl DocumentLoader {
    /// Loader for PDF and PPTX files.
    pub fn new() -> Self {
        Self::with_registry(ExtractorRegistry::with_defaults())
    }

    pub fn with_registry(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// Load documents from `dir`, in file-name order.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn load(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_hidden(&entry.file_name().to_string_lossy()) {
                debug!("Skipping hidden file {}", path.display());
                continue;
            }
            if tokio::fs::metadata(&path).await?.is_file() {
                files.push(path);
            } else {
                debug!("Skipping non-file entry {}", path.display());
            }
        }
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            let Some(extractor) = self.registry.find(&path) else {
                debug!("Skipping unsupported file {}", path.display());
                continue;
            };

            let kind = extractor.kind();
            let text = tokio::task::spawn_blocking({
                let path = path.clone();
                move || extractor.extract(&path)
            })
            .await
            .map_err(|e| ArbitroError::Extraction {
                path: path.display().to_string(),
                reason: format!("extraction task failed: {}", e),
            })??;

            debug!("Extracted {} chars from {}", text.len(), path.display());
            documents.push(Document {
                text,
                source: path,
                kind,
            });
        }

        info!("Loaded {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }
}

/// Dotfiles, including macOS `._name` resource forks, and Office `~$name` lock files.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("~$")
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load PDF and PPTX documents from `dir`.
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    DocumentLoader::new().load(dir).await
}

/// Decode the XML entities that appear in Office text runs.
pub(crate) fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
