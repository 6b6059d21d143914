//! List the posts of the repository

use anyhow::Result;

use crate::cms::ContentRepository;
use crate::content::{PaginationState, PostSummary};
use crate::helpers::DateFormatter;
use crate::Blog;

/// Print every post, following the listing pages to the end
pub async fn run(blog: &Blog) -> Result<()> {
    let repo = blog.repository()?;
    let posts = collect_posts(blog, repo.as_ref()).await?;

    let dates = DateFormatter::new(&blog.config);
    println!("Posts ({}):", posts.len());
    for post in posts {
        println!("{}", format_entry(&post, &dates));
    }

    Ok(())
}

/// Walk the listing the way the "load more" control does
pub async fn collect_posts(blog: &Blog, repo: &dyn ContentRepository) -> Result<Vec<PostSummary>> {
    let cms = &blog.config.cms;
    let first = repo.get_by_type(&cms.document_type, cms.page_size).await?;
    let mut listing = PaginationState::from_page(first)?;

    while listing.has_more() {
        listing.load_next_page(repo).await?;
    }

    Ok(listing.into_posts())
}

fn format_entry(post: &PostSummary, dates: &DateFormatter) -> String {
    let date = dates.format(post.first_publication_date.as_ref());
    if date.is_empty() {
        format!("  {} [{}]", post.title, post.uid)
    } else {
        format!("  {} - {} [{}]", date, post.title, post.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{MemoryRepository, RawPost};
    use crate::config::SiteConfig;
    use crate::helpers::parse_timestamp;

    fn raw(uid: &str) -> RawPost {
        RawPost {
            uid: Some(uid.to_string()),
            doc_type: Some("posts".to_string()),
            ..RawPost::default()
        }
    }

    #[tokio::test]
    async fn test_collects_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        let repo = MemoryRepository::new(vec![raw("a"), raw("b"), raw("c")]);

        let posts = collect_posts(&blog, &repo).await.unwrap();
        let uids: Vec<_> = posts.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_format_entry() {
        let config = SiteConfig::default();
        let dates = DateFormatter::new(&config);
        let mut post = PostSummary {
            uid: "hooks".to_string(),
            first_publication_date: parse_timestamp("2021-03-25T19:25:28+0000"),
            title: "Como utilizar Hooks".to_string(),
            subtitle: String::new(),
            author: String::new(),
        };
        assert_eq!(
            format_entry(&post, &dates),
            "  25 mar 2021 - Como utilizar Hooks [hooks]"
        );

        post.first_publication_date = None;
        assert_eq!(format_entry(&post, &dates), "  Como utilizar Hooks [hooks]");
    }
}
