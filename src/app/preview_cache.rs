use std::num::NonZeroUsize;

use lru::LruCache;

use crate::backend::PagePreview;
use crate::error::{AppError, AppResult};
use crate::session::SigningSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    pub doc_id: u64,
    pub page: usize,
    pub zoom_milli: u32,
}

impl PreviewKey {
    pub fn new(doc_id: u64, page: usize, zoom: f32) -> Self {
        let zoom_milli = (zoom.max(0.0) * 1000.0).round() as u32;
        Self {
            doc_id,
            page,
            zoom_milli,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
}

/// Rendered page previews, so paging back and forth does not re-rasterize.
#[derive(Debug)]
pub struct PreviewCache {
    entries: LruCache<PreviewKey, PagePreview>,
    counters: CacheCounters,
}

impl PreviewCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            counters: CacheCounters::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counters(&self) -> CacheCounters {
        self.counters
    }

    /// Preview of the session's current page, rendered on a miss.
    pub fn current(&mut self, session: &SigningSession, zoom: f32) -> AppResult<&PagePreview> {
        let doc_id = session
            .doc_id()
            .ok_or_else(|| AppError::invalid_argument("no pdf loaded"))?;
        let key = PreviewKey::new(doc_id, session.page(), zoom);

        if self.entries.contains(&key) {
            self.counters.hits += 1;
        } else {
            self.counters.misses += 1;
            let preview = session.render_preview(zoom)?;
            self.entries.put(key, preview);
        }
        self.entries
            .get(&key)
            .ok_or_else(|| AppError::unsupported("preview cache lost a fresh entry"))
    }
}
