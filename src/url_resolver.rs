use crate::config::RedirectConfig;
use reqwest::header::LOCATION;
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use url::Url;

const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// Outcome of following a URL's redirects.
///
/// `chain` always starts with the requested URL and is never empty. When
/// `error` is set, `final_url` is the last URL that was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectResult {
    pub final_url: String,
    pub chain: Vec<String>,
    pub error: Option<String>,
}

impl RedirectResult {
    /// Result for a URL that was not followed at all.
    pub fn unexpanded(url: &str) -> Self {
        Self {
            final_url: url.to_string(),
            chain: vec![url.to_string()],
            error: None,
        }
    }

    pub fn hops(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

/// Status and `Location` header of a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub status: u16,
    pub location: Option<String>,
}

/// Issues one body-less request without following redirects.
pub trait HopClient {
    fn head(&self, url: &str) -> impl Future<Output = anyhow::Result<Hop>>;
}

pub struct HttpHopClient {
    client: Client,
}

impl HttpHopClient {
    pub fn new(config: &RedirectConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

impl HopClient for HttpHopClient {
    async fn head(&self, url: &str) -> anyhow::Result<Hop> {
        let response = self.client.head(url).send().await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(Hop {
            status: response.status().as_u16(),
            location,
        })
    }
}

pub struct UrlResolver<H> {
    client: H,
    max_redirects: u8,
}

impl<H: HopClient> UrlResolver<H> {
    pub fn new(client: H, max_redirects: u8) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Follow redirects from `url`, at most `max_redirects` hops.
    ///
    /// Never fails: a network error or a bad `Location` stops expansion and
    /// is reported in `error`, keeping the chain reached so far.
    pub async fn expand(&self, url: &str) -> RedirectResult {
        let mut result = RedirectResult::unexpanded(url);
        let mut current_url = url.to_string();

        for _ in 0..self.max_redirects {
            let hop = match self.client.head(&current_url).await {
                Ok(hop) => hop,
                Err(e) => {
                    log::warn!("Redirect expansion stopped at {current_url}: {e}");
                    result.error = Some(e.to_string());
                    break;
                }
            };

            if !REDIRECT_CODES.contains(&hop.status) {
                break;
            }
            let Some(location) = hop.location else {
                log::debug!("Redirect status {} without Location at {current_url}", hop.status);
                break;
            };

            // Handle relative locations
            let next_url = match Url::parse(&current_url).and_then(|base| base.join(&location)) {
                Ok(next) => next.to_string(),
                Err(e) => {
                    log::warn!("Unresolvable redirect location '{location}' from {current_url}: {e}");
                    result.error = Some(format!("Invalid redirect location '{location}': {e}"));
                    break;
                }
            };

            log::debug!("Redirect {} {} -> {}", hop.status, current_url, next_url);
            result.chain.push(next_url.clone());
            current_url = next_url;
        }

        result.final_url = current_url;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves canned hops keyed by URL; unknown URLs answer 200.
    struct FakeHops {
        hops: HashMap<String, Result<Hop, String>>,
    }

    impl FakeHops {
        fn new(entries: &[(&str, Result<Hop, String>)]) -> Self {
            Self {
                hops: entries
                    .iter()
                    .map(|(url, hop)| (url.to_string(), hop.clone()))
                    .collect(),
            }
        }
    }

    impl HopClient for FakeHops {
        async fn head(&self, url: &str) -> anyhow::Result<Hop> {
            match self.hops.get(url) {
                Some(Ok(hop)) => Ok(hop.clone()),
                Some(Err(msg)) => Err(anyhow::anyhow!(msg.clone())),
                None => Ok(Hop {
                    status: 200,
                    location: None,
                }),
            }
        }
    }

    fn redirect(status: u16, location: &str) -> Result<Hop, String> {
        Ok(Hop {
            status,
            location: Some(location.to_string()),
        })
    }

    #[tokio::test]
    async fn test_non_redirecting_url_is_unchanged() {
        let resolver = UrlResolver::new(FakeHops::new(&[]), 4);
        let result = resolver.expand("http://example.com/").await;

        assert_eq!(result, RedirectResult::unexpanded("http://example.com/"));
        assert_eq!(result.hops(), 0);
    }

    #[tokio::test]
    async fn test_follows_absolute_and_relative_locations() {
        let resolver = UrlResolver::new(
            FakeHops::new(&[
                ("http://bit.ly/abc", redirect(301, "https://landing.example.com/start")),
                ("https://landing.example.com/start", redirect(302, "/final?x=1")),
            ]),
            4,
        );
        let result = resolver.expand("http://bit.ly/abc").await;

        assert_eq!(
            result.chain,
            vec![
                "http://bit.ly/abc",
                "https://landing.example.com/start",
                "https://landing.example.com/final?x=1",
            ]
        );
        assert_eq!(result.final_url, "https://landing.example.com/final?x=1");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_stops_at_hop_limit() {
        let resolver = UrlResolver::new(
            FakeHops::new(&[
                ("http://a.test/", redirect(307, "http://b.test/")),
                ("http://b.test/", redirect(307, "http://c.test/")),
                ("http://c.test/", redirect(307, "http://a.test/")),
            ]),
            4,
        );
        let result = resolver.expand("http://a.test/").await;

        assert_eq!(result.hops(), 4);
        assert_eq!(result.final_url, "http://b.test/");
        assert_eq!(result.chain.last().map(String::as_str), Some("http://b.test/"));
    }

    #[tokio::test]
    async fn test_non_redirect_status_and_missing_location_stop() {
        let resolver = UrlResolver::new(
            FakeHops::new(&[
                ("http://a.test/", redirect(200, "http://ignored.test/")),
                (
                    "http://b.test/",
                    Ok(Hop {
                        status: 302,
                        location: None,
                    }),
                ),
            ]),
            4,
        );

        assert_eq!(resolver.expand("http://a.test/").await.hops(), 0);
        assert_eq!(resolver.expand("http://b.test/").await.hops(), 0);
    }

    #[tokio::test]
    async fn test_network_error_keeps_partial_chain() {
        let resolver = UrlResolver::new(
            FakeHops::new(&[
                ("http://short.test/x", redirect(301, "http://mid.test/")),
                ("http://mid.test/", Err("connection reset".to_string())),
            ]),
            4,
        );
        let result = resolver.expand("http://short.test/x").await;

        assert_eq!(result.chain, vec!["http://short.test/x", "http://mid.test/"]);
        assert_eq!(result.final_url, "http://mid.test/");
        assert_eq!(result.error.as_deref(), Some("connection reset"));
    }

    #[tokio::test]
    async fn test_zero_hop_limit_never_requests() {
        let resolver = UrlResolver::new(
            FakeHops::new(&[("http://a.test/", redirect(301, "http://b.test/"))]),
            0,
        );
        assert_eq!(
            resolver.expand("http://a.test/").await,
            RedirectResult::unexpanded("http://a.test/")
        );
    }
}
