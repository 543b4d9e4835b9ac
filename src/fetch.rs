use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// Source of page bodies. Implemented over HTTP for real runs and by fakes in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let network = |e: reqwest::Error| ScrapeError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(network)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network)?;

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

/// How far into the body to look for a `<meta charset>` declaration.
const META_SNIFF_LEN: usize = 1024;

/// Decode with the header charset, else the page's `<meta>` charset, else UTF-8.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .or_else(|| {
            let head = &body[..body.len().min(META_SNIFF_LEN)];
            charset_label(&String::from_utf8_lossy(head))
        })
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!("Malformed {} sequences replaced while decoding", used.name());
    }
    text.into_owned()
}

/// Label following the first `charset=`, as in `text/html; charset=Shift_JIS`
/// or `<meta charset="shift_jis">`.
fn charset_label(s: &str) -> Option<String> {
    let lower = s.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let label: String = lower[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serves canned bodies keyed by URL and counts every request.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
        pub requested: std::sync::Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.pages.insert(url.into(), body.into());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| ScrapeError::Network {
                url: url.to_string(),
                reason: "HTTP status client error (404 Not Found)".to_string(),
            })
        }
    }
}
