//! Built-in blog templates using Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off: text values
//! are escaped when the context structs are built, which leaves the CMS body
//! markup as the only raw HTML that reaches a page.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{estimate_reading_minutes_at, PostDetail, PostSummary};
use crate::helpers::{full_url_for, html_escape, post_path, url_for, DateFormatter};
use crate::richtext::as_html;

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Paths and URLs must not be entity-encoded
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("fallback.html", include_str!("blog/fallback.html")),
            ("not_found.html", include_str!("blog/not_found.html")),
            // Partials
            (
                "partials/post_summary.html",
                include_str!("blog/partials/post_summary.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("blog/partials/post_list.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub language: String,
    pub root: String,
    pub generator: String,
}

impl ConfigData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: html_escape(&config.title),
            language: html_escape(&config.language),
            root: html_escape(&url_for(config, "/")),
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelsData {
    pub load_more: String,
    pub loading: String,
    pub load_failed: String,
    pub not_found: String,
}

impl LabelsData {
    pub fn new(config: &SiteConfig) -> Self {
        let labels = &config.labels;
        Self {
            load_more: html_escape(&labels.load_more),
            loading: html_escape(&labels.loading),
            load_failed: html_escape(&labels.load_failed),
            not_found: html_escape(&labels.not_found),
        }
    }
}

/// A listing entry
#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: Option<String>,
}

impl SummaryData {
    pub fn new(post: &PostSummary, config: &SiteConfig, dates: &DateFormatter) -> Self {
        Self {
            uid: html_escape(&post.uid),
            path: html_escape(&url_for(config, &post_path(&post.uid))),
            title: html_escape(&post.title),
            subtitle: html_escape(&post.subtitle),
            author: html_escape(&post.author),
            date: html_escape(&dates.format(post.first_publication_date.as_ref())),
            datetime: post.first_publication_date.map(|d| d.to_rfc3339()),
        }
    }
}

/// A post page
#[derive(Debug, Clone, Serialize)]
pub struct DetailData {
    pub uid: String,
    /// Absolute URL of the post, from the site `url`
    pub canonical: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub datetime: Option<String>,
    pub banner_url: Option<String>,
    pub reading_minutes: usize,
    pub reading_time: String,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub anchor: String,
    /// Trusted markup straight from the CMS
    pub html: String,
}

impl DetailData {
    pub fn new(post: &PostDetail, config: &SiteConfig, dates: &DateFormatter) -> Self {
        let reading_minutes =
            estimate_reading_minutes_at(&post.content, config.reading.words_per_minute);

        Self {
            uid: html_escape(&post.uid),
            canonical: html_escape(&full_url_for(config, &post_path(&post.uid))),
            title: html_escape(&post.title),
            author: html_escape(&post.author),
            date: html_escape(&dates.format(post.first_publication_date.as_ref())),
            datetime: post.first_publication_date.map(|d| d.to_rfc3339()),
            banner_url: post.banner_url.as_deref().map(html_escape),
            reading_minutes,
            reading_time: html_escape(&format!(
                "{} {}",
                reading_minutes, config.labels.reading_suffix
            )),
            sections: post
                .content
                .iter()
                .map(|section| SectionData {
                    heading: html_escape(&section.heading),
                    anchor: slug::slugify(&section.heading),
                    html: as_html(&section.body),
                })
                .collect(),
        }
    }
}
