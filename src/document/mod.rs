//! Document page-source collaborator
//!
//! The engine consumes only page counts and boundary checks, never pixels.
//! Marks and zones use 1-based page numbers everywhere; the renderer side of
//! this boundary is 0-based, and the translation happens here so 0-based
//! numbers never reach the registry.

use async_trait::async_trait;

use crate::error::{MarkupError, Result};

/// A rendered page image, opaque to the engine
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Paginated document collaborator
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Total number of pages
    fn total_pages(&self) -> u32;

    /// Render one page; `page_index` is 0-based on this side of the boundary
    async fn render_page(&self, page_index: usize, scale: f32) -> Result<RenderedPage>;
}

/// Translate a 1-based mark page to the renderer's 0-based index
pub fn render_index(page: u32) -> Result<usize> {
    if page == 0 {
        return Err(MarkupError::SourceLoad("page numbers are 1-based".to_string()));
    }
    Ok((page - 1) as usize)
}

/// Whether a 1-based page exists in the document
pub fn contains_page(source: &dyn PageSource, page: u32) -> bool {
    page >= 1 && page <= source.total_pages()
}

/// Render a 1-based page
pub async fn render(source: &dyn PageSource, page: u32, scale: f32) -> Result<RenderedPage> {
    if !contains_page(source, page) {
        return Err(MarkupError::SourceLoad(format!(
            "page {} outside document of {} pages",
            page,
            source.total_pages()
        )));
    }
    source.render_page(render_index(page)?, scale).await
}
