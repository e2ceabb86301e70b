//! Fetch-and-process orchestration.
//!
//! [`Pipeline::process`] is the entry point a job queue calls: load the
//! record, fetch the URL, run extraction and sanitization, and write a
//! terminal status back. Every path ends in a status write; no failure
//! escapes to the host process.

use crate::extract::{ExtractConfig, extract_page};
use crate::sanitize::{SanitizeConfig, sanitize_fragment_with};

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, PageFetcher};
#[cfg(feature = "fetch")]
use crate::store::{RecordStore, RecordUpdate};
#[cfg(feature = "fetch")]
use crate::{LegibleError, Result};
#[cfg(feature = "fetch")]
use tracing::{debug, warn};
#[cfg(feature = "fetch")]
use url::Url;
#[cfg(feature = "fetch")]
use uuid::Uuid;

/// The cleaned output of the extract → sanitize composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPage {
    /// Best-guess title; empty if extraction found none.
    pub title: String,
    /// Sanitized, whitelist-conformant fragment.
    pub html_content: String,
}

/// Runs extraction and sanitization over a raw HTML document.
///
/// This is the pipeline body without the network edge; the CLI uses it
/// for file and stdin input.
pub fn clean_page(html: &str, extract: &ExtractConfig, sanitize: &SanitizeConfig) -> CleanedPage {
    let extracted = extract_page(html, extract);
    let html_content = sanitize_fragment_with(&extracted.content, sanitize);
    CleanedPage { title: extracted.title, html_content }
}

/// Fetch-and-process orchestrator.
///
/// States are `Pending` → `Completed` | `Failed`, one terminal transition
/// per invocation. Reprocessing a record re-enters the same machine and
/// overwrites the prior outcome; resetting the record to `Pending` is the
/// caller's write. Concurrent invocations for the same record are not
/// coordinated here.
#[cfg(feature = "fetch")]
pub struct Pipeline<S, F> {
    store: S,
    fetcher: F,
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub sanitize: SanitizeConfig,
}

#[cfg(feature = "fetch")]
impl<S: RecordStore, F: PageFetcher> Pipeline<S, F> {
    /// Creates a pipeline with default configuration.
    pub fn new(store: S, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            fetch: FetchConfig::default(),
            extract: ExtractConfig::default(),
            sanitize: SanitizeConfig::default(),
        }
    }

    /// The backing record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes one record: fetch, extract, sanitize, persist.
    ///
    /// The outcome is observable only through the record's
    /// `status`/`html_content`. If the record cannot be loaded the run is
    /// skipped with a warning; if the outcome cannot be persisted the
    /// write is dropped with a warning. Neither case propagates.
    pub async fn process(&self, record_id: Uuid, url: &str) {
        if let Err(err) = self.store.load(record_id) {
            warn!(%record_id, error = %err, "skipping pipeline run, record could not be loaded");
            return;
        }

        debug!(%record_id, url, "processing record");
        let update = match self.run(url).await {
            Ok(page) => {
                debug!(%record_id, title = %page.title, "pipeline completed");
                RecordUpdate::completed(page.title, page.html_content)
            }
            Err(err) => {
                debug!(%record_id, error = %err, "pipeline failed");
                RecordUpdate::failed(format!("Error: {err}"))
            }
        };

        if let Err(err) = self.store.update(record_id, update) {
            warn!(%record_id, error = %err, "failed to persist pipeline outcome");
        }
    }

    async fn run(&self, url: &str) -> Result<CleanedPage> {
        let target = Url::parse(url).map_err(|e| LegibleError::InvalidUrl(e.to_string()))?;

        let page = self.fetcher.fetch(&target, &self.fetch).await?;
        if page.status != 200 {
            return Err(LegibleError::UnexpectedStatus { status: page.status, reason: page.reason });
        }

        Ok(clean_page(&page.body, &self.extract, &self.sanitize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_page_composes_extract_and_sanitize() {
        let html = r#"
            <html><body>
                <nav><a href="/">home</a></nav>
                <article><h1>Title</h1><p class="lead">Body <a href="/x">link</a></p></article>
            </body></html>
        "#;
        let page = clean_page(html, &ExtractConfig::default(), &SanitizeConfig::default());

        assert_eq!(page.title, "Title");
        assert!(page.html_content.contains("<h1>Title</h1>"));
        assert!(page.html_content.contains("Body link"));
        assert!(!page.html_content.contains("<a"));
        assert!(!page.html_content.contains("class"));
        assert!(!page.html_content.contains("home"));
    }

    #[test]
    fn test_clean_page_empty_input() {
        let page = clean_page("", &ExtractConfig::default(), &SanitizeConfig::default());
        assert_eq!(page.title, "");
        assert_eq!(page.html_content, "");
    }

    #[cfg(feature = "fetch")]
    mod orchestration {
        use super::*;
        use crate::fetch::{FetchConfig, FetchedPage};
        use crate::store::{MemoryStore, RecordStatus};
        use async_trait::async_trait;

        struct StubFetcher {
            status: u16,
            reason: &'static str,
            body: &'static str,
        }

        #[async_trait]
        impl PageFetcher for StubFetcher {
            async fn fetch(&self, _url: &Url, _config: &FetchConfig) -> Result<FetchedPage> {
                Ok(FetchedPage {
                    status: self.status,
                    reason: self.reason.to_string(),
                    body: self.body.to_string(),
                })
            }
        }

        struct FailingFetcher;

        #[async_trait]
        impl PageFetcher for FailingFetcher {
            async fn fetch(&self, _url: &Url, _config: &FetchConfig) -> Result<FetchedPage> {
                Err(LegibleError::Timeout { timeout: 30 })
            }
        }

        fn block_on<T>(future: impl Future<Output = T>) -> T {
            tokio::runtime::Runtime::new().unwrap().block_on(future)
        }

        #[test]
        fn test_success_marks_completed() {
            let fetcher = StubFetcher {
                status: 200,
                reason: "OK",
                body: "<html><body><article><h1>T</h1><p>Body</p></article></body></html>",
            };
            let pipeline = Pipeline::new(MemoryStore::new(), fetcher);
            let record = pipeline.store().create("https://example.com/a").unwrap();

            block_on(pipeline.process(record.id, "https://example.com/a"));

            let loaded = pipeline.store().load(record.id).unwrap();
            assert_eq!(loaded.status, RecordStatus::Completed);
            assert_eq!(loaded.title, "T");
            assert!(loaded.html_content.contains("<p>Body</p>"));
        }

        #[test]
        fn test_non_200_marks_failed() {
            let fetcher = StubFetcher { status: 404, reason: "Not Found", body: "" };
            let pipeline = Pipeline::new(MemoryStore::new(), fetcher);
            let record = pipeline.store().create("https://example.com/a").unwrap();

            block_on(pipeline.process(record.id, "https://example.com/a"));

            let loaded = pipeline.store().load(record.id).unwrap();
            assert_eq!(loaded.status, RecordStatus::Failed);
            assert!(loaded.html_content.starts_with("Error:"));
            assert!(loaded.html_content.contains("Not Found"));
        }

        #[test]
        fn test_transport_error_marks_failed() {
            let pipeline = Pipeline::new(MemoryStore::new(), FailingFetcher);
            let record = pipeline.store().create("https://example.com/a").unwrap();

            block_on(pipeline.process(record.id, "https://example.com/a"));

            let loaded = pipeline.store().load(record.id).unwrap();
            assert_eq!(loaded.status, RecordStatus::Failed);
            assert!(loaded.html_content.contains("timed out"));
        }

        #[test]
        fn test_invalid_url_fails_without_fetch() {
            let fetcher = StubFetcher { status: 200, reason: "OK", body: "<p>never fetched</p>" };
            let pipeline = Pipeline::new(MemoryStore::new(), fetcher);
            let record = pipeline.store().create("not a url").unwrap();

            block_on(pipeline.process(record.id, "not a url"));

            let loaded = pipeline.store().load(record.id).unwrap();
            assert_eq!(loaded.status, RecordStatus::Failed);
            assert!(loaded.html_content.contains("Invalid URL"));
        }

        #[test]
        fn test_missing_record_is_skipped() {
            let fetcher = StubFetcher { status: 200, reason: "OK", body: "<p>x</p>" };
            let pipeline = Pipeline::new(MemoryStore::new(), fetcher);

            // Must not panic or create a record out of thin air.
            block_on(pipeline.process(Uuid::new_v4(), "https://example.com/a"));
        }

        #[test]
        fn test_reprocess_overwrites_outcome() {
            let fetcher = StubFetcher { status: 404, reason: "Not Found", body: "" };
            let pipeline = Pipeline::new(MemoryStore::new(), fetcher);
            let record = pipeline.store().create("https://example.com/a").unwrap();

            block_on(pipeline.process(record.id, "https://example.com/a"));
            assert_eq!(pipeline.store().load(record.id).unwrap().status, RecordStatus::Failed);

            let fetcher = StubFetcher {
                status: 200,
                reason: "OK",
                body: "<html><body><article><p>recovered</p></article></body></html>",
            };
            let pipeline = Pipeline::new(pipeline.store, fetcher);
            block_on(pipeline.process(record.id, "https://example.com/a"));

            let loaded = pipeline.store().load(record.id).unwrap();
            assert_eq!(loaded.status, RecordStatus::Completed);
            assert!(loaded.html_content.contains("recovered"));
        }
    }
}
