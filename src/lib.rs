//! spacetraveling: a static blog generated from a headless CMS
//!
//! Posts are fetched from a Prismic repository (or a local JSON fixture),
//! rendered with embedded Tera templates and served by a small axum server
//! that pages through the listing and generates unknown posts on demand.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cms::ContentRepository;

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied as-is into the public directory
    pub static_dir: PathBuf,
}

impl Blog {
    /// Create a new blog from a directory, reading `_config.yml` when
    /// present and the `PRISMIC_*` environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env_overrides();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        }
    }

    /// Connect to the configured content repository. A relative fixture
    /// path is resolved against the base directory.
    pub fn repository(&self) -> Result<Box<dyn ContentRepository>> {
        let mut cms = self.config.cms.clone();
        if let Some(fixture) = &cms.fixture {
            cms.fixture = Some(self.base_dir.join(fixture).to_string_lossy().into_owned());
        }
        Ok(cms::connect(&cms)?)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
