//! HTTP client for the Prismic REST API.
//!
//! Resolves the master ref once, then issues document searches against it.
//! Page locators returned by the API (`next_page`) are fetched verbatim, but
//! only when they point back at the configured endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

use super::types::{ApiPage, ApiRoot, RawPost};
use super::ContentRepository;
use crate::config::CmsConfig;
use crate::error::{CmsError, CmsResult};

/// Prismic API client
pub struct PrismicClient {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client for the configured repository endpoint
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        let endpoint = Url::parse(config.endpoint.trim())
            .map_err(|_| CmsError::InvalidEndpoint(config.endpoint.clone()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CmsError::InvalidEndpoint(config.endpoint.clone()));
        }

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            access_token: config.access_token.clone(),
            master_ref: OnceCell::new(),
        })
    }

    /// Whether a page locator points at this client's repository
    pub fn owns_locator(&self, locator: &str) -> bool {
        let Ok(url) = Url::parse(locator) else {
            return false;
        };
        let prefix = self.endpoint.path().trim_end_matches('/');
        let path = url.path();
        url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default()
            && (path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/')))
    }

    /// Put the configured access token back on a stripped locator
    fn with_token(&self, url: &Url) -> Url {
        let mut url = Url::parse(&redact(url)).unwrap_or_else(|_| url.clone());
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    async fn master_ref(&self) -> CmsResult<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut url = self.endpoint.clone();
                if let Some(token) = &self.access_token {
                    url.query_pairs_mut().append_pair("access_token", token);
                }
                let root: ApiRoot = self.get_json(url).await?;
                let reference = root
                    .master_ref()
                    .map(str::to_string)
                    .ok_or(CmsError::MissingMasterRef)?;
                tracing::debug!("Resolved master ref {}", reference);
                Ok::<_, CmsError>(reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: &str, page_size: usize) -> CmsResult<ApiPage> {
        let reference = self.master_ref().await?;
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CmsError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["documents", "search"]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("ref", reference)
                .append_pair("q", predicate)
                .append_pair("pageSize", &page_size.max(1).to_string());
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }
        let page = self.get_json(url).await?;
        Ok(without_tokens(page))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> CmsResult<T> {
        tracing::debug!("GET {}", redact(&url));
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status,
                url: redact(&url),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ContentRepository for PrismicClient {
    async fn get_by_type(&self, doc_type: &str, page_size: usize) -> CmsResult<ApiPage> {
        let predicate = format!("[[at(document.type, \"{}\")]]", escape_literal(doc_type));
        self.search(&predicate, page_size).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> CmsResult<RawPost> {
        let predicate = format!(
            "[[at(my.{}.uid, \"{}\")]]",
            doc_type,
            escape_literal(uid)
        );
        let page = self.search(&predicate, 1).await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, locator: &str) -> CmsResult<ApiPage> {
        if !self.owns_locator(locator) {
            return Err(CmsError::InvalidLocator(locator.to_string()));
        }
        let url = Url::parse(locator).map_err(|_| CmsError::InvalidLocator(locator.to_string()))?;
        let page = self.get_json(self.with_token(&url)).await?;
        Ok(without_tokens(page))
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Page locators end up in public pages, so they never carry the token
fn without_tokens(mut page: ApiPage) -> ApiPage {
    let strip = |locator: String| match Url::parse(&locator) {
        Ok(url) => redact(&url),
        Err(_) => locator,
    };
    page.next_page = page.next_page.map(strip);
    page.prev_page = page.prev_page.map(strip);
    page
}

/// URL without its access token, for logs, error messages and locators
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> PrismicClient {
        let config = CmsConfig {
            endpoint: endpoint.to_string(),
            ..CmsConfig::default()
        };
        PrismicClient::new(&config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let config = CmsConfig::default();
        assert!(matches!(
            PrismicClient::new(&config),
            Err(CmsError::InvalidEndpoint(_))
        ));

        let config = CmsConfig {
            endpoint: "ftp://blog.example.com/api/v2".to_string(),
            ..CmsConfig::default()
        };
        assert!(PrismicClient::new(&config).is_err());
    }

    #[test]
    fn test_owns_locator() {
        let c = client("https://blog.cdn.prismic.io/api/v2");
        assert!(c.owns_locator(
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=X&page=2"
        ));
        assert!(!c.owns_locator("https://evil.example.com/api/v2/documents/search"));
        assert!(!c.owns_locator("http://blog.cdn.prismic.io/api/v2/documents/search"));
        assert!(!c.owns_locator("https://blog.cdn.prismic.io/other"));
        assert!(!c.owns_locator("https://blog.cdn.prismic.io/api/v2evil/documents/search"));
        assert!(c.owns_locator("https://blog.cdn.prismic.io/api/v2"));
        assert!(!c.owns_locator("not a url"));
    }

    #[tokio::test]
    async fn test_fetch_page_refuses_foreign_locator() {
        let c = client("https://blog.cdn.prismic.io/api/v2");
        let err = c
            .fetch_page("http://169.254.169.254/latest/meta-data")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::InvalidLocator(_)));
    }

    #[test]
    fn test_locators_drop_and_regain_token() {
        let page = without_tokens(ApiPage {
            next_page: Some(
                "https://blog.cdn.prismic.io/api/v2/documents/search?ref=R&page=2&access_token=secret"
                    .to_string(),
            ),
            prev_page: Some("not a url".to_string()),
            ..ApiPage::default()
        });
        let next = page.next_page.unwrap();
        assert_eq!(
            next,
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=R&page=2"
        );
        assert_eq!(page.prev_page.as_deref(), Some("not a url"));

        let config = CmsConfig {
            endpoint: "https://blog.cdn.prismic.io/api/v2".to_string(),
            access_token: Some("secret".to_string()),
            ..CmsConfig::default()
        };
        let c = PrismicClient::new(&config).unwrap();
        let url = c.with_token(&Url::parse(&next).unwrap());
        let tokens: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "access_token")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(tokens, vec!["secret"]);

        // no token configured
        let url = client("https://blog.cdn.prismic.io/api/v2").with_token(&Url::parse(&next).unwrap());
        assert_eq!(url.as_str(), next);
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn test_redact() {
        let url = Url::parse("https://x.io/api/v2?ref=R&access_token=secret").unwrap();
        assert_eq!(redact(&url), "https://x.io/api/v2?ref=R");

        let url = Url::parse("https://x.io/api/v2?access_token=secret").unwrap();
        assert_eq!(redact(&url), "https://x.io/api/v2");
    }
}
