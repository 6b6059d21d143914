//! In-memory content repository.
//!
//! Serves a fixed list of documents with the same paging contract as the
//! HTTP API. Backs offline builds (`cms.fixture`) and the test suite.

use async_trait::async_trait;
use std::path::Path;
use url::Url;

use super::types::{ApiPage, RawPost};
use super::ContentRepository;
use crate::error::{CmsError, CmsResult};

const LOCATOR_SCHEME: &str = "memory";

/// Repository over a list of documents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    posts: Vec<RawPost>,
}

impl MemoryRepository {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self { posts }
    }

    /// Load documents from a JSON file holding an array of raw posts
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> CmsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CmsError::Fixture {
            path: path.display().to_string(),
            source,
        })?;
        let posts: Vec<RawPost> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} documents from {:?}", posts.len(), path);
        Ok(Self::new(posts))
    }

    fn of_type<'a>(&'a self, doc_type: &'a str) -> impl Iterator<Item = &'a RawPost> + 'a {
        self.posts
            .iter()
            .filter(move |p| p.doc_type.as_deref().map_or(true, |t| t == doc_type))
    }

    /// Build one page of results, 1-based
    fn page(&self, doc_type: &str, page: usize, page_size: usize) -> ApiPage {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let matching: Vec<&RawPost> = self.of_type(doc_type).collect();
        let total = matching.len();
        let total_pages = total.div_ceil(page_size);

        let results = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        let locator = |n: usize| {
            format!(
                "{}://documents/search?type={}&page={}&pageSize={}",
                LOCATOR_SCHEME,
                crate::helpers::encode_segment(doc_type),
                n,
                page_size
            )
        };

        ApiPage {
            page,
            results_per_page: page_size,
            total_results_size: total,
            total_pages,
            next_page: (page < total_pages).then(|| locator(page + 1)),
            prev_page: (page > 1).then(|| locator(page - 1)),
            results,
        }
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn get_by_type(&self, doc_type: &str, page_size: usize) -> CmsResult<ApiPage> {
        Ok(self.page(doc_type, 1, page_size))
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> CmsResult<RawPost> {
        self.of_type(doc_type)
            .find(|p| p.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, locator: &str) -> CmsResult<ApiPage> {
        let invalid = || CmsError::InvalidLocator(locator.to_string());
        let url = Url::parse(locator).map_err(|_| invalid())?;
        if url.scheme() != LOCATOR_SCHEME {
            return Err(invalid());
        }

        let mut doc_type = None;
        let mut page = None;
        let mut page_size = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "type" => doc_type = Some(value.into_owned()),
                "page" => page = value.parse::<usize>().ok(),
                "pageSize" => page_size = value.parse::<usize>().ok(),
                _ => {}
            }
        }

        match (doc_type, page, page_size) {
            (Some(doc_type), Some(page), Some(page_size)) => {
                Ok(self.page(&doc_type, page, page_size))
            }
            _ => Err(invalid()),
        }
    }
}
