//! Generate static files

use anyhow::Result;

use crate::cms::ContentRepository;
use crate::generator::Generator;
use crate::Blog;

/// Generate the site from the configured repository
pub async fn run(blog: &Blog) -> Result<()> {
    let repo = blog.repository()?;
    run_with(blog, repo.as_ref()).await
}

/// Generate the site from the given repository
pub async fn run_with(blog: &Blog, repo: &dyn ContentRepository) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    generator.generate(repo).await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
