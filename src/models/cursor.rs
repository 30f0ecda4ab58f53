// src/models/cursor.rs

//! In-memory crawl position.

/// Position of an in-flight category crawl.
///
/// Lives only for the duration of one run; never persisted. A crawl cannot
/// be resumed from a cursor, only restarted from the first page.
#[derive(Debug, Clone)]
pub struct CrawlCursor {
    /// URL of the page about to be fetched
    pub page_url: String,

    /// Pages fetched so far in this category
    pub visited_pages: usize,

    /// Category being crawled
    pub category: String,
}

impl CrawlCursor {
    /// Cursor pointing at a category's first page.
    pub fn start(category: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            visited_pages: 0,
            category: category.into(),
        }
    }

    /// Advance to the next page URL.
    pub fn advance(&mut self, next_url: String) {
        self.page_url = next_url;
        self.visited_pages += 1;
    }
}
