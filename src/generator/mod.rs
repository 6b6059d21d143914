//! Generator module - renders the listing and post pages with Tera templates

use anyhow::{bail, Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;
use walkdir::WalkDir;

use crate::cms::ContentRepository;
use crate::content::{PaginationState, PostDetail, PostSummary};
use crate::helpers::{encode_segment, html_escape, url_for, DateFormatter};
use crate::server::{FALLBACK_ROUTE, LOAD_MORE_ROUTE};
use crate::templates::{ConfigData, DetailData, LabelsData, SummaryData, TemplateRenderer};
use crate::Blog;

/// A post page as it can be served right now
#[derive(Debug, Clone, PartialEq)]
pub enum DetailPage {
    /// The page was generated and is on disk
    Ready(String),
    /// Not generated yet; the loading placeholder
    Fallback(String),
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    dates: DateFormatter,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            dates: DateFormatter::new(&blog.config),
        })
    }

    /// Generate the listing and every post known at build time
    pub async fn generate(&self, repo: &dyn ContentRepository) -> Result<()> {
        let cms = &self.blog.config.cms;
        fs::create_dir_all(&self.blog.public_dir)?;

        self.copy_static_assets()?;

        // Listing
        let first_page = repo
            .get_by_type(&cms.document_type, cms.page_size)
            .await
            .context("Failed to fetch the first listing page")?;
        let listing = PaginationState::from_page(first_page)?;
        let html = self.render_listing(&listing)?;
        write_page(&self.blog.public_dir.join("index.html"), &html)?;
        tracing::info!(
            "Generated listing with {} posts (more available: {})",
            listing.posts().len(),
            listing.has_more()
        );

        // Post pages known at build time; others are generated on first request
        let known = repo
            .get_by_type(&cms.document_type, cms.paths_page_size)
            .await
            .context("Failed to fetch posts to pre-render")?;
        let mut count = 0;
        for raw in known.results {
            let post = PostDetail::from_raw(raw)?;
            if let Err(e) = self.write_post(&post) {
                tracing::warn!("Skipping post {:?}: {}", post.uid, e);
                continue;
            }
            count += 1;
        }
        tracing::info!("Generated {} post pages", count);

        Ok(())
    }

    /// Fetch, render and store one post page
    pub async fn generate_post(&self, repo: &dyn ContentRepository, uid: &str) -> Result<String> {
        self.post_output_path(uid)?;
        let raw = repo
            .get_by_uid(&self.blog.config.cms.document_type, uid)
            .await?;
        let post = PostDetail::from_raw(raw)?;
        let html = self.write_post(&post)?;
        tracing::info!("Generated post on demand: {}", uid);
        Ok(html)
    }

    /// The generated page of a post, or the loading placeholder
    pub fn lookup_post(&self, uid: &str) -> Result<DetailPage> {
        let path = self.post_output_path(uid)?;
        if path.is_file() {
            Ok(DetailPage::Ready(fs::read_to_string(&path)?))
        } else {
            Ok(DetailPage::Fallback(self.render_fallback(uid)?))
        }
    }

    /// Render the listing page
    pub fn render_listing(&self, listing: &PaginationState) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("posts", &self.summaries(listing.posts()));
        context.insert("next_page", &listing.next_page().map(html_escape));
        context.insert("load_more_endpoint", &url_for(&self.blog.config, LOAD_MORE_ROUTE));
        self.renderer.render("index.html", &context)
    }

    /// Render listing entries alone, for appending to an existing listing
    pub fn render_post_list(&self, posts: &[PostSummary]) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("posts", &self.summaries(posts));
        self.renderer.render("partials/post_list.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert(
            "post",
            &DetailData::new(post, &self.blog.config, &self.dates),
        );
        self.renderer.render("post.html", &context)
    }

    /// Render the placeholder served while a post is generated on demand
    pub fn render_fallback(&self, uid: &str) -> Result<String> {
        let mut context = self.create_base_context();
        let resolve = format!("{}{}/", FALLBACK_ROUTE, encode_segment(uid));
        context.insert("resolve_url", &url_for(&self.blog.config, &resolve));
        self.renderer.render("fallback.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        let context = self.create_base_context();
        self.renderer.render("not_found.html", &context)
    }

    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &ConfigData::new(&self.blog.config));
        context.insert("labels", &LabelsData::new(&self.blog.config));
        context
    }

    fn summaries(&self, posts: &[PostSummary]) -> Vec<SummaryData> {
        posts
            .iter()
            .map(|p| SummaryData::new(p, &self.blog.config, &self.dates))
            .collect()
    }

    fn write_post(&self, post: &PostDetail) -> Result<String> {
        let output_path = self.post_output_path(&post.uid)?;
        let html = self.render_post(post)?;
        write_page(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(html)
    }

    /// `public/post/<uid>/index.html`; uids that could escape the output
    /// directory are rejected
    fn post_output_path(&self, uid: &str) -> Result<PathBuf> {
        if uid.is_empty()
            || uid == "."
            || uid == ".."
            || uid.contains(['/', '\\', '\0'])
        {
            bail!("Invalid post uid {:?}", uid);
        }
        Ok(self
            .blog
            .public_dir
            .join("post")
            .join(uid)
            .join("index.html"))
    }

    /// Copy the static directory (images, css) to the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}

fn write_page(output_path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(output_path, html)
        .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
    Ok(())
}
