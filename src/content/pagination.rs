//! Listing pagination
//!
//! The listing starts from the first page fetched at build time. Each
//! "load more" follows the stored `next_page` locator once, appends the
//! returned posts after the ones already shown and replaces the locator
//! with the one the new page carries. Posts are never removed, reordered or
//! deduplicated.

use serde::Serialize;

use super::PostSummary;
use crate::cms::{ApiPage, ContentRepository};
use crate::error::{CmsError, CmsResult};

/// Posts shown so far and where to fetch more
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    #[serde(skip)]
    loading: bool,
}

impl PaginationState {
    pub fn new(posts: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self {
            posts,
            next_page,
            loading: false,
        }
    }

    /// Seed the listing from its first page
    pub fn from_page(page: ApiPage) -> CmsResult<Self> {
        let posts = summarize(page.results)?;
        Ok(Self::new(posts, page.next_page))
    }

    /// Continue a listing from a locator, with no posts shown yet
    pub fn resume(next_page: impl Into<String>) -> Self {
        Self::new(Vec::new(), Some(next_page.into()))
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<PostSummary> {
        self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Claim the locator of the next page.
    ///
    /// Returns `Ok(None)` when the listing is exhausted and
    /// `Err(LoadInProgress)` while an earlier load has not finished. Every
    /// successful claim must be followed by [`finish_load`](Self::finish_load)
    /// or [`abort_load`](Self::abort_load).
    pub fn begin_load(&mut self) -> CmsResult<Option<String>> {
        if self.loading {
            return Err(CmsError::LoadInProgress);
        }
        let Some(locator) = self.next_page.clone() else {
            return Ok(None);
        };
        self.loading = true;
        Ok(Some(locator))
    }

    /// Merge a fetched page. Returns the number of posts appended.
    ///
    /// A page with a malformed record is rejected as a whole and leaves the
    /// listing untouched.
    pub fn finish_load(&mut self, page: ApiPage) -> CmsResult<usize> {
        self.loading = false;
        let appended = summarize(page.results)?;
        let count = appended.len();
        self.posts.extend(appended);
        self.next_page = page.next_page;
        Ok(count)
    }

    /// Release a claim without changing the listing
    pub fn abort_load(&mut self) {
        self.loading = false;
    }

    /// Fetch and merge the next page. A no-op when there is no next page.
    pub async fn load_next_page(&mut self, repo: &dyn ContentRepository) -> CmsResult<usize> {
        let Some(locator) = self.begin_load()? else {
            return Ok(0);
        };

        match repo.fetch_page(&locator).await {
            Ok(page) => {
                let count = self.finish_load(page)?;
                tracing::debug!(
                    "Loaded {} more posts (more available: {})",
                    count,
                    self.has_more()
                );
                Ok(count)
            }
            Err(e) => {
                self.abort_load();
                Err(e)
            }
        }
    }
}

fn summarize(results: Vec<crate::cms::RawPost>) -> CmsResult<Vec<PostSummary>> {
    results.into_iter().map(PostSummary::from_raw).collect()
}
