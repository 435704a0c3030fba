//! Sequential scraper engine.
//!
//! URLs are fetched one at a time in input order. A failure on one URL is
//! logged and recorded, never fatal: the URL simply contributes no text.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crawlqa_shared::{CrawlQaError, Result, ScrapeConfig};

use crate::extract::extract_paragraph_text;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-URL progress callbacks.
pub trait ScrapeProgress: Send + Sync {
    /// Called before a URL is fetched.
    fn scraping(&self, url: &str);
    /// Called when a URL is skipped because of an error.
    fn failed(&self, url: &str, error: &CrawlQaError);
}

/// No-op progress for headless/test usage.
pub struct SilentScrape;

impl ScrapeProgress for SilentScrape {
    fn scraping(&self, _url: &str) {}
    fn failed(&self, _url: &str, _error: &CrawlQaError) {}
}

// ---------------------------------------------------------------------------
// ScrapeResult
// ---------------------------------------------------------------------------

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// The URL as given by the caller.
    pub url: String,
    /// HTTP status code of the response.
    pub status_code: u16,
    /// Paragraph text joined with spaces.
    pub text: String,
}

/// Summary of a scrape over a URL list.
#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    /// Pages fetched, in the order of the input URLs.
    pub pages: Vec<ScrapedPage>,
    /// Skipped URLs with the error message (URL, message).
    pub failures: Vec<(String, String)>,
    /// Total wall-clock time.
    pub duration: Duration,
}

impl ScrapeResult {
    /// The extracted text of each fetched page, in order.
    pub fn texts(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.text.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// HTTP scraper holding one reusable client.
pub struct Scraper {
    client: Client,
}

impl Scraper {
    /// Create a scraper with the given configuration.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| CrawlQaError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch every URL in order and extract its paragraph text.
    ///
    /// Never fails as a whole; per-URL errors end up in
    /// [`ScrapeResult::failures`].
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn scrape_all<P>(&self, urls: &[String], progress: &P) -> ScrapeResult
    where
        P: ScrapeProgress + ?Sized,
    {
        let start = Instant::now();
        let mut result = ScrapeResult::default();

        for url in urls {
            debug!(%url, "scraping");
            progress.scraping(url);

            match self.scrape_one(url).await {
                Ok(page) => result.pages.push(page),
                Err(e) => {
                    warn!(%url, error = %e, "failed to scrape");
                    progress.failed(url, &e);
                    result.failures.push((url.clone(), e.to_string()));
                }
            }
        }

        result.duration = start.elapsed();
        info!(
            fetched = result.pages.len(),
            failed = result.failures.len(),
            elapsed_ms = result.duration.as_millis() as u64,
            "scrape finished"
        );
        result
    }

    /// Fetch a single URL and extract its paragraph text.
    pub async fn scrape_one(&self, url: &str) -> Result<ScrapedPage> {
        let parsed = Url::parse(url).map_err(|e| CrawlQaError::parse(format!("{url}: {e}")))?;

        debug!(%parsed, "fetching page");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| CrawlQaError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        // Error pages are parsed like any other page.
        if !status.is_success() {
            warn!(%url, %status, "non-success status, parsing body anyway");
        }

        let body = response
            .text()
            .await
            .map_err(|e| CrawlQaError::Network(format!("{url}: body read failed: {e}")))?;

        let text = extract_paragraph_text(&body);
        debug!(%url, body_len = body.len(), text_len = text.len(), "extracted paragraphs");

        Ok(ScrapedPage {
            url: url.to_string(),
            status_code: status.as_u16(),
            text,
        })
    }
}

#[cfg(test)]
mod scraper_tests {
    use std::sync::Mutex;

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ScrapeConfig {
        ScrapeConfig {
            timeout: Duration::from_millis(500),
            ..ScrapeConfig::default()
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ScrapeProgress for RecordingProgress {
        fn scraping(&self, url: &str) {
            self.events.lock().unwrap().push(format!("scraping {url}"));
        }

        fn failed(&self, url: &str, _error: &CrawlQaError) {
            self.events.lock().unwrap().push(format!("failed {url}"));
        }
    }

    /// An address nothing listens on: bind, read the port, drop the listener.
    fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/")
    }

    #[tokio::test]
    async fn scrapes_reachable_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><h1>About</h1><p>We build tools.</p><p>Since 2020.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let scraper = Scraper::new(&test_config()).unwrap();
        let page = scraper
            .scrape_one(&format!("{}/about", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.status_code, 200);
        assert_eq!(page.text, "We build tools. Since 2020.");
    }

    #[tokio::test]
    async fn unreachable_url_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>still here</p>"))
            .mount(&server)
            .await;

        let dead = unreachable_url();
        let ok = format!("{}/ok", server.uri());
        let urls = vec![dead.clone(), ok.clone()];

        let progress = RecordingProgress::default();
        let scraper = Scraper::new(&test_config()).unwrap();
        let result = scraper.scrape_all(&urls, &progress).await;

        assert_eq!(result.texts(), vec!["still here".to_string()]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].0, dead);

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                format!("scraping {dead}"),
                format!("failed {dead}"),
                format!("scraping {ok}"),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_url_is_skipped() {
        let scraper = Scraper::new(&test_config()).unwrap();
        let urls = vec!["not a url".to_string()];
        let result = scraper.scrape_all(&urls, &SilentScrape).await;

        assert!(result.pages.is_empty());
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].1.contains("parse error"));
    }

    #[tokio::test]
    async fn timeout_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>too late</p>")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let scraper = Scraper::new(&test_config()).unwrap();
        let urls = vec![format!("{}/slow", server.uri())];
        let result = scraper.scrape_all(&urls, &SilentScrape).await;

        assert!(result.pages.is_empty());
        assert_eq!(result.failures.len(), 1);
    }

    #[tokio::test]
    async fn error_status_is_still_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<p>Page not found.</p>"))
            .mount(&server)
            .await;

        let scraper = Scraper::new(&test_config()).unwrap();
        let urls = vec![format!("{}/missing", server.uri())];
        let result = scraper.scrape_all(&urls, &SilentScrape).await;

        assert!(result.failures.is_empty());
        assert_eq!(result.pages[0].status_code, 404);
        assert_eq!(result.pages[0].text, "Page not found.");
    }

    #[tokio::test]
    async fn preserves_url_order() {
        let server = MockServer::start().await;
        for (route, body) in [("/a", "<p>alpha</p>"), ("/b", "<p>beta</p>"), ("/c", "<div>none</div>")] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }

        let urls: Vec<String> = ["/b", "/c", "/a"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();

        let scraper = Scraper::new(&test_config()).unwrap();
        let result = scraper.scrape_all(&urls, &SilentScrape).await;

        assert_eq!(
            result.texts(),
            vec!["beta".to_string(), String::new(), "alpha".to_string()]
        );
    }
}
