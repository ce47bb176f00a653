//! Preview resources for selected files.
//!
//! A preview is a view over the selected file's bytes. Whoever opens a
//! preview owns it and must release it once the file is replaced or the
//! session is reset.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::trace;

use crate::document::InvoiceFile;

/// Identifier of an open preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(u64);

/// How a preview should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Render the image itself.
    Image,
    /// Show name and size only (PDFs and anything else).
    Document,
}

/// An open preview.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub id: PreviewId,
    pub kind: PreviewKind,
    pub name: String,
    pub size: usize,
}

impl Preview {
    /// Size in kilobytes, one decimal place.
    pub fn size_kb(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}

/// Source of preview resources.
pub trait PreviewStore {
    /// Open a preview for the given file.
    fn open(&mut self, file: &InvoiceFile) -> Preview;

    /// Release a preview. Returns `false` if the id was not open.
    fn release(&mut self, id: PreviewId) -> bool;
}

/// Preview store keeping each live preview's bytes in memory.
#[derive(Debug, Default)]
pub struct MemoryPreviewStore {
    next_id: u64,
    live: HashMap<PreviewId, Bytes>,
    released: usize,
}

impl MemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of previews currently open.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of successful releases so far.
    pub fn released_count(&self) -> usize {
        self.released
    }

    /// Bytes behind an open preview.
    pub fn contents(&self, id: PreviewId) -> Option<&Bytes> {
        self.live.get(&id)
    }
}

impl PreviewStore for MemoryPreviewStore {
    fn open(&mut self, file: &InvoiceFile) -> Preview {
        self.next_id += 1;
        let id = PreviewId(self.next_id);
        self.live.insert(id, file.bytes().clone());
        trace!("Opened preview {:?} for {}", id, file.name());

        Preview {
            id,
            kind: if file.is_image() {
                PreviewKind::Image
            } else {
                PreviewKind::Document
            },
            name: file.name().to_string(),
            size: file.size(),
        }
    }

    fn release(&mut self, id: PreviewId) -> bool {
        if self.live.remove(&id).is_some() {
            self.released += 1;
            trace!("Released preview {:?}", id);
            true
        } else {
            false
        }
    }
}
