//! Content repository access
//!
//! The blog reads every post through the [`ContentRepository`] trait. A
//! repository is constructed once per command and passed explicitly to
//! whatever needs it.

mod client;
mod memory;
mod types;

use async_trait::async_trait;

use crate::config::CmsConfig;
use crate::error::CmsResult;

pub use client::PrismicClient;
pub use memory::MemoryRepository;
pub use types::{ApiPage, ApiRef, ApiRoot, Banner, RawPost, RawPostData, RawSection};

/// Source of blog documents
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// First page of documents of a custom type
    async fn get_by_type(&self, doc_type: &str, page_size: usize) -> CmsResult<ApiPage>;

    /// A single document by its uid
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> CmsResult<RawPost>;

    /// Follow a `next_page` locator returned by an earlier page
    async fn fetch_page(&self, locator: &str) -> CmsResult<ApiPage>;
}

/// Build the repository described by the configuration: the fixture file
/// when one is set, the HTTP API otherwise.
pub fn connect(config: &CmsConfig) -> CmsResult<Box<dyn ContentRepository>> {
    match &config.fixture {
        Some(path) => Ok(Box::new(MemoryRepository::from_fixture(path)?)),
        None => {
            tracing::debug!("Using CMS endpoint {}", config.endpoint);
            Ok(Box::new(PrismicClient::new(config)?))
        }
    }
}
