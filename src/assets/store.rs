use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::error::{CalheatError, CalheatResult};

/// Extensions probed by [`DirReferenceImages`], in order.
pub const REFERENCE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "svg"];

/// Encoded still image associated with a metric.
///
/// Bytes stay encoded until a renderer needs pixels; see [`crate::assets::decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Where the image came from (file path or caller-chosen URI).
    pub source: String,
    /// Encoded image bytes (PNG, JPEG, WebP or SVG).
    pub bytes: Arc<Vec<u8>>,
}

impl ReferenceImage {
    /// Wrap encoded bytes.
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            bytes: Arc::new(bytes),
        }
    }
}

/// Lookup of per-metric reference images.
///
/// `Ok(None)` means the metric has no image; that is never an error.
pub trait ReferenceImages: Sync {
    /// Find the reference image of `metric`.
    fn lookup(&self, metric: &str) -> CalheatResult<Option<ReferenceImage>>;
}

/// Lookup that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReferenceImages;

impl ReferenceImages for NoReferenceImages {
    fn lookup(&self, _metric: &str) -> CalheatResult<Option<ReferenceImage>> {
        Ok(None)
    }
}

/// Reference images held in memory, keyed by metric name.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReferenceImages {
    images: BTreeMap<String, ReferenceImage>,
}

impl InMemoryReferenceImages {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `image` with `metric`, replacing any previous one.
    pub fn insert(&mut self, metric: impl Into<String>, image: ReferenceImage) {
        self.images.insert(metric.into(), image);
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ReferenceImages for InMemoryReferenceImages {
    fn lookup(&self, metric: &str) -> CalheatResult<Option<ReferenceImage>> {
        Ok(self.images.get(metric).cloned())
    }
}

/// Reference images stored as `<root>/<metric>.<ext>` files.
///
/// Extensions are probed in [`REFERENCE_EXTENSIONS`] order; the first existing file wins.
#[derive(Clone, Debug)]
pub struct DirReferenceImages {
    root: PathBuf,
}

impl DirReferenceImages {
    /// Look up images below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being searched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ReferenceImages for DirReferenceImages {
    fn lookup(&self, metric: &str) -> CalheatResult<Option<ReferenceImage>> {
        let stem = match metric_file_stem(metric) {
            Ok(stem) => stem,
            Err(e) => {
                tracing::debug!(metric, error = %e, "metric name is not a usable file name");
                return Ok(None);
            }
        };

        for ext in REFERENCE_EXTENSIONS {
            let path = self.root.join(format!("{stem}.{ext}"));
            if !path.is_file() {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| {
                CalheatError::asset(format!("read reference image '{}': {e}", path.display()))
            })?;
            return Ok(Some(ReferenceImage::new(
                path.to_string_lossy().into_owned(),
                bytes,
            )));
        }
        Ok(None)
    }
}

/// Validate a metric name for use as a single file-name stem.
///
/// Rejects empty names, path separators and parent traversals.
pub fn metric_file_stem(metric: &str) -> CalheatResult<&str> {
    let stem = metric.trim();
    if stem.is_empty() {
        return Err(CalheatError::validation("metric name must be non-empty"));
    }
    if stem.contains(['/', '\\']) {
        return Err(CalheatError::validation(
            "metric name must not contain path separators",
        ));
    }
    if stem == "." || stem == ".." {
        return Err(CalheatError::validation(
            "metric name must not be '.' or '..'",
        ));
    }
    Ok(stem)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
