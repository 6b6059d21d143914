//! Post view models

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::cms::{RawPost, RawSection};
use crate::error::{CmsError, CmsResult};
use crate::helpers::parse_timestamp;
use crate::richtext::RichTextBlock;

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Unique identifier, also the URL slug
    pub uid: String,

    /// First publication date
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Keep only the listing fields of a raw document
    pub fn from_raw(raw: RawPost) -> CmsResult<Self> {
        Ok(Self {
            first_publication_date: parse_publication_date(raw.first_publication_date.as_deref())?,
            uid: document_uid(raw.uid, raw.id),
            title: raw.data.title.unwrap_or_default(),
            subtitle: raw.data.subtitle.unwrap_or_default(),
            author: raw.data.author.unwrap_or_default(),
        })
    }
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<ContentSection>,
}

impl PostDetail {
    pub fn from_raw(raw: RawPost) -> CmsResult<Self> {
        Ok(Self {
            first_publication_date: parse_publication_date(raw.first_publication_date.as_deref())?,
            uid: document_uid(raw.uid, raw.id),
            title: raw.data.title.unwrap_or_default(),
            subtitle: raw.data.subtitle.unwrap_or_default(),
            author: raw.data.author.unwrap_or_default(),
            banner_url: raw.data.banner.and_then(|b| b.url),
            content: raw
                .data
                .content
                .into_iter()
                .map(ContentSection::from)
                .collect(),
        })
    }
}

/// A headed section of a post body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSection {
    /// Section heading; identifies the section within its post
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

impl ContentSection {
    pub fn new(heading: impl Into<String>, body: Vec<RichTextBlock>) -> Self {
        Self {
            heading: heading.into(),
            body,
        }
    }
}

impl From<RawSection> for ContentSection {
    fn from(raw: RawSection) -> Self {
        Self {
            heading: raw.heading.unwrap_or_default(),
            body: raw.body,
        }
    }
}

fn parse_publication_date(value: Option<&str>) -> CmsResult<Option<DateTime<FixedOffset>>> {
    match value {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| CmsError::InvalidTimestamp(s.to_string())),
    }
}

/// Documents without a uid fall back to their document id
fn document_uid(uid: Option<String>, id: Option<String>) -> String {
    uid.or_else(|| {
        tracing::warn!("Document {:?} has no uid, using its id", id);
        id.clone()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawPost {
        serde_json::from_str(
            r#"{
                "id": "YF0bXBIAACMAc5xg",
                "uid": "como-utilizar-hooks",
                "type": "posts",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": "2021-03-25T19:25:28+0000",
                "data": {
                    "title": "Como utilizar Hooks",
                    "subtitle": "Pensando em sincronização",
                    "author": "Joseph Oliveira",
                    "banner": {"url": "https://images.prismic.io/banner.png"},
                    "content": [
                        {"heading": "Proin et varius", "body": [{"type": "paragraph", "text": "Lorem ipsum", "spans": []}]},
                        {"heading": "Cras laoreet", "body": []}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_keeps_listing_fields() {
        let summary = PostSummary::from_raw(raw()).unwrap();
        assert_eq!(summary.uid, "como-utilizar-hooks");
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(summary.subtitle, "Pensando em sincronização");
        assert_eq!(summary.author, "Joseph Oliveira");
        assert_eq!(
            summary.first_publication_date.unwrap().to_rfc3339(),
            "2021-03-15T19:25:28+00:00"
        );
    }

    #[test]
    fn test_detail_maps_sections() {
        let detail = PostDetail::from_raw(raw()).unwrap();
        assert_eq!(
            detail.banner_url.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
        assert_eq!(detail.content.len(), 2);
        assert_eq!(detail.content[0].heading, "Proin et varius");
        assert_eq!(detail.content[0].body.len(), 1);
        assert!(detail.content[1].body.is_empty());
    }

    #[test]
    fn test_null_publication_date() {
        let mut post = raw();
        post.first_publication_date = None;
        assert!(PostSummary::from_raw(post)
            .unwrap()
            .first_publication_date
            .is_none());
    }

    #[test]
    fn test_invalid_publication_date() {
        let mut post = raw();
        post.first_publication_date = Some("not a date".to_string());
        assert!(matches!(
            PostSummary::from_raw(post),
            Err(CmsError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_missing_uid_falls_back_to_id() {
        let mut post = raw();
        post.uid = None;
        assert_eq!(
            PostSummary::from_raw(post).unwrap().uid,
            "YF0bXBIAACMAc5xg"
        );
    }
}
